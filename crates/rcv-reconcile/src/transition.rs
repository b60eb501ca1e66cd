//! Submit-for-review state machine, split around the remote call.
//!
//! [`begin_submit`] runs before the call: it enforces the busy guard, marks
//! the unit busy and hands back a snapshot of the record to send.
//! [`apply_outcome`] runs when the call resolves: it clears the busy flag and
//! moves the unit according to the outcome.
//!
//! | from                 | outcome              | to                                 |
//! |----------------------|----------------------|------------------------------------|
//! | NeedsReview          | success, fulfilled   | Complete                           |
//! | NeedsReview          | success, open qty    | NeedsSecondaryReview               |
//! | NeedsSecondaryReview | success, fulfilled   | Complete                           |
//! | NeedsSecondaryReview | success, open qty    | NeedsSecondaryReview               |
//! | any                  | business-rule error  | NeedsSecondaryReview               |
//! | any                  | technical error      | unchanged                          |
//! | Complete             | any                  | unchanged                          |
//!
//! A unit is Complete at resolve time only when a reload brought it back
//! settled while the submission was in flight. The outcome is then dropped.

use rcv_schemas::{UnitKey, UnitRecord};

use crate::buckets::BucketedCollection;
use crate::fulfillment::{is_fulfilled, remaining_qty, ExceptionBook};
use crate::types::{Bucket, ReconcileError, ReviewState};

/// Proof that a submission was started for one unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitTicket {
    pub key: UnitKey,
    pub from: ReviewState,
    /// Record to send to the service.
    pub record: UnitRecord,
}

/// How the remote update resolved, as classified by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The service accepted the update and returned the current record.
    Success(UnitRecord),
    /// The primary action went through but a dependent rule failed.
    BusinessRuleFailure { message: String },
    /// Nothing is assumed to have happened remotely.
    TechnicalFailure { message: String },
}

/// What the user should be told about a resolved submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionNotice {
    Received,
    /// Received, with quantity still open after exceptions.
    ReceivedWithOpenQty { remaining: Option<i64> },
    BusinessRuleError { message: String },
    TechnicalError { message: String },
    /// The unit was already complete when the outcome arrived.
    AlreadyComplete,
}

impl TransitionNotice {
    pub fn is_error(&self) -> bool {
        matches!(
            self,
            TransitionNotice::BusinessRuleError { .. } | TransitionNotice::TechnicalError { .. }
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionReport {
    pub key: UnitKey,
    pub from: ReviewState,
    pub to: ReviewState,
    pub notice: TransitionNotice,
}

impl TransitionReport {
    pub fn moved(&self) -> bool {
        self.from != self.to
    }

    pub fn completed(&self) -> bool {
        self.moved() && self.to == ReviewState::Complete
    }
}

/// Start a submission. At most one submission per unit is in flight.
///
/// Busy, complete and unclassified units are rejected and the collection is
/// not touched.
pub fn begin_submit(
    collection: &mut BucketedCollection,
    key: &UnitKey,
) -> Result<SubmitTicket, ReconcileError> {
    let from = collection.state_of(key);
    let unit = collection
        .get_mut(key)
        .ok_or_else(|| ReconcileError::UnitNotFound {
            key: key.clone(),
            bucket: Bucket::All,
        })?;

    if unit.busy {
        return Err(ReconcileError::UnitBusy { key: key.clone() });
    }
    let from = match from {
        None => return Err(ReconcileError::Unclassified { key: key.clone() }),
        Some(ReviewState::Complete) => {
            return Err(ReconcileError::AlreadyComplete { key: key.clone() })
        }
        Some(state) => state,
    };

    unit.busy = true;
    Ok(SubmitTicket {
        key: key.clone(),
        from,
        record: unit.record.clone(),
    })
}

/// Resolve a submission.
///
/// The unit's current bucket is used as the origin. On error the busy flag
/// is still cleared when the unit exists, so the user can retry.
pub fn apply_outcome(
    collection: &mut BucketedCollection,
    book: &ExceptionBook,
    ticket: &SubmitTicket,
    outcome: SubmitOutcome,
) -> Result<TransitionReport, ReconcileError> {
    let key = &ticket.key;
    {
        let unit = collection
            .get_mut(key)
            .ok_or_else(|| ReconcileError::UnitNotFound {
                key: key.clone(),
                bucket: Bucket::All,
            })?;
        unit.busy = false;
    }

    let from = collection
        .state_of(key)
        .ok_or_else(|| ReconcileError::Unclassified { key: key.clone() })?;
    if from == ReviewState::Complete {
        return Ok(TransitionReport {
            key: key.clone(),
            from,
            to: from,
            notice: TransitionNotice::AlreadyComplete,
        });
    }

    let (to, notice) = match outcome {
        SubmitOutcome::Success(record) => {
            if &record.key() != key {
                return Err(ReconcileError::RecordKeyMismatch {
                    expected: key.clone(),
                    found: record.key(),
                });
            }
            collection.replace_record(record)?;
            let unit = collection
                .get(key)
                .ok_or_else(|| ReconcileError::UnitNotFound {
                    key: key.clone(),
                    bucket: Bucket::All,
                })?;
            if is_fulfilled(unit, book) {
                (ReviewState::Complete, TransitionNotice::Received)
            } else {
                let remaining = remaining_qty(unit, book);
                (
                    ReviewState::NeedsSecondaryReview,
                    TransitionNotice::ReceivedWithOpenQty { remaining },
                )
            }
        }
        SubmitOutcome::BusinessRuleFailure { message } => (
            ReviewState::NeedsSecondaryReview,
            TransitionNotice::BusinessRuleError { message },
        ),
        SubmitOutcome::TechnicalFailure { message } => {
            (from, TransitionNotice::TechnicalError { message })
        }
    };

    if !from.can_move_to(to) {
        return Err(ReconcileError::IllegalTransition {
            key: key.clone(),
            from,
            to,
        });
    }

    if from != to {
        collection.move_unit(key, from.bucket(), to.bucket())?;
    }
    if !matches!(notice, TransitionNotice::TechnicalError { .. }) {
        if let Some(unit) = collection.get_mut(key) {
            unit.set_status_code(to.status_code());
        }
    }

    Ok(TransitionReport {
        key: key.clone(),
        from,
        to,
        notice,
    })
}

/// Move a parent unit to Complete because its children settled.
///
/// Returns `false` when it already was, or when a submission for it is in
/// flight; its outcome decides then. Unclassified units are refused.
pub fn escalate_to_complete(
    collection: &mut BucketedCollection,
    key: &UnitKey,
) -> Result<bool, ReconcileError> {
    let busy = collection
        .get(key)
        .map(|u| u.busy)
        .ok_or_else(|| ReconcileError::UnitNotFound {
            key: key.clone(),
            bucket: Bucket::All,
        })?;
    if busy {
        return Ok(false);
    }
    let from = collection
        .state_of(key)
        .ok_or_else(|| ReconcileError::Unclassified { key: key.clone() })?;
    if from == ReviewState::Complete {
        return Ok(false);
    }

    collection.move_unit(key, from.bucket(), Bucket::Complete)?;
    if let Some(unit) = collection.get_mut(key) {
        unit.set_status_code(ReviewState::Complete.status_code());
    }
    Ok(true)
}
