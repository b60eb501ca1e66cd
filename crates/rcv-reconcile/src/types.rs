use std::fmt;

use rcv_schemas::{UnitKey, UnitKind};
use serde::{Deserialize, Serialize};

/// Status code of a unit waiting for its first receiving confirmation.
pub const STATUS_NEEDS_REVIEW: &str = "N";
/// Status code of a unit waiting for its secondary confirmation.
pub const STATUS_NEEDS_SECONDARY_REVIEW: &str = "R";
/// Status code of a fully received unit.
pub const STATUS_COMPLETE: &str = "X";

/// Named partition of a unit collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Bucket {
    #[serde(rename = "all")]
    All,
    #[serde(rename = "needsReview")]
    NeedsReview,
    #[serde(rename = "needsSecondaryReview")]
    NeedsSecondaryReview,
    #[serde(rename = "complete")]
    Complete,
}

impl Bucket {
    /// Every bucket, "all" first.
    pub const ALL: [Bucket; 4] = [
        Bucket::All,
        Bucket::NeedsReview,
        Bucket::NeedsSecondaryReview,
        Bucket::Complete,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Bucket::All => "all",
            Bucket::NeedsReview => "needsReview",
            Bucket::NeedsSecondaryReview => "needsSecondaryReview",
            Bucket::Complete => "complete",
        }
    }

    /// Review state held by this bucket; `None` for "all".
    pub fn state(&self) -> Option<ReviewState> {
        match self {
            Bucket::All => None,
            Bucket::NeedsReview => Some(ReviewState::NeedsReview),
            Bucket::NeedsSecondaryReview => Some(ReviewState::NeedsSecondaryReview),
            Bucket::Complete => Some(ReviewState::Complete),
        }
    }
}

impl fmt::Display for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reconciliation state of one unit.
///
/// ```text
/// NeedsReview ──► NeedsSecondaryReview ──► Complete (terminal)
///      └──────────────────────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ReviewState {
    NeedsReview,
    NeedsSecondaryReview,
    Complete,
}

impl ReviewState {
    pub fn bucket(&self) -> Bucket {
        match self {
            ReviewState::NeedsReview => Bucket::NeedsReview,
            ReviewState::NeedsSecondaryReview => Bucket::NeedsSecondaryReview,
            ReviewState::Complete => Bucket::Complete,
        }
    }

    /// Status code written back to the record when a unit enters this state.
    pub fn status_code(&self) -> &'static str {
        match self {
            ReviewState::NeedsReview => STATUS_NEEDS_REVIEW,
            ReviewState::NeedsSecondaryReview => STATUS_NEEDS_SECONDARY_REVIEW,
            ReviewState::Complete => STATUS_COMPLETE,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ReviewState::Complete)
    }

    /// Staying put is always legal except for a terminal unit being reworked.
    pub fn can_move_to(&self, to: ReviewState) -> bool {
        use ReviewState::*;
        matches!(
            (self, to),
            (NeedsReview, NeedsReview)
                | (NeedsReview, NeedsSecondaryReview)
                | (NeedsReview, Complete)
                | (NeedsSecondaryReview, NeedsSecondaryReview)
                | (NeedsSecondaryReview, Complete)
        )
    }
}

/// Reconciliation faults. None of these is fatal to the process; the
/// collection is left unchanged whenever one is returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileError {
    /// Status code outside {N, R, X}. The unit stays in "all" only.
    UnknownStatusCode { key: UnitKey, code: String },
    /// Two records with the same key in one load; the load is rejected.
    DuplicateUnitId { key: UnitKey },
    /// A record of another kind was handed to a collection.
    KindMismatch {
        key: UnitKey,
        expected: UnitKind,
        found: UnitKind,
    },
    UnitNotFound { key: UnitKey, bucket: Bucket },
    /// Units are only moved between review buckets, never into or out of "all".
    NotMovable { bucket: Bucket },
    /// A submission for this unit is already in flight.
    UnitBusy { key: UnitKey },
    AlreadyComplete { key: UnitKey },
    /// The unit was excluded from review buckets at load time.
    Unclassified { key: UnitKey },
    IllegalTransition {
        key: UnitKey,
        from: ReviewState,
        to: ReviewState,
    },
    /// The service answered with a record for a different unit.
    RecordKeyMismatch { expected: UnitKey, found: UnitKey },
}

impl fmt::Display for ReconcileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReconcileError::UnknownStatusCode { key, code } => {
                write!(f, "unknown status code {code:?} on {key}")
            }
            ReconcileError::DuplicateUnitId { key } => write!(f, "duplicate unit id {key}"),
            ReconcileError::KindMismatch {
                key,
                expected,
                found,
            } => write!(f, "{key} is a {found}, collection holds {expected}"),
            ReconcileError::UnitNotFound { key, bucket } => {
                write!(f, "unit {key} not found in bucket {bucket}")
            }
            ReconcileError::NotMovable { bucket } => {
                write!(f, "bucket {bucket} is not a review bucket")
            }
            ReconcileError::UnitBusy { key } => write!(f, "unit {key} is in process"),
            ReconcileError::AlreadyComplete { key } => write!(f, "unit {key} is already complete"),
            ReconcileError::Unclassified { key } => {
                write!(f, "unit {key} has no review bucket")
            }
            ReconcileError::IllegalTransition { key, from, to } => {
                write!(f, "illegal transition for {key}: {from:?} -> {to:?}")
            }
            ReconcileError::RecordKeyMismatch { expected, found } => {
                write!(f, "expected record for {expected}, got {found}")
            }
        }
    }
}

impl std::error::Error for ReconcileError {}
