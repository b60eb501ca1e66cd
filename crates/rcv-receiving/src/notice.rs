//! User-visible notifications.
//!
//! The controller never renders anything; it emits [`Notice`]s through a
//! [`Notifier`] supplied by the UI layer (or the CLI).

use std::time::Duration;

use rcv_schemas::{ExceptionKey, UnitKey, UnitKind};
use serde::Serialize;

use crate::issue::IssueRejected;

/// How a notice should be surfaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Severity {
    /// Short-lived toast.
    Toast,
    /// Message box the user must dismiss.
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "notice", rename_all = "snake_case")]
pub enum Notice {
    Received {
        key: UnitKey,
    },
    ReceivedWithOpenQty {
        key: UnitKey,
        remaining: Option<i64>,
    },
    /// A submission for the unit is already in flight.
    InProcess {
        key: UnitKey,
    },
    /// Complete or unclassified units need no submission.
    NotRequired {
        key: UnitKey,
    },
    /// A submission resolved after a reload had already settled the unit.
    AlreadyComplete {
        key: UnitKey,
    },
    BusinessRuleError {
        key: UnitKey,
        message: String,
    },
    TechnicalError {
        key: UnitKey,
        message: String,
    },
    PurchaseOrderComplete {
        key: UnitKey,
    },
    WaybillComplete {
        store_id: String,
        waybill_nbr: String,
    },
    IssueSaved {
        key: ExceptionKey,
    },
    IssueRejected {
        reason: IssueRejected,
    },
    IssueFailed {
        key: ExceptionKey,
        message: String,
    },
    LoadFailed {
        kind: Option<UnitKind>,
        message: String,
    },
    CheckedIn {
        store_id: String,
        waybill_nbr: String,
        seal_match: bool,
        ref_number: Option<String>,
    },
    /// The shipment is no longer in transit.
    CheckInNotRequired {
        store_id: String,
        waybill_nbr: String,
    },
    CheckInFailed {
        store_id: String,
        waybill_nbr: String,
        message: String,
    },
}

impl Notice {
    pub fn severity(&self) -> Severity {
        match self {
            Notice::Received { .. }
            | Notice::ReceivedWithOpenQty { .. }
            | Notice::InProcess { .. }
            | Notice::NotRequired { .. }
            | Notice::AlreadyComplete { .. }
            | Notice::PurchaseOrderComplete { .. }
            | Notice::WaybillComplete { .. }
            | Notice::IssueSaved { .. }
            | Notice::IssueRejected { .. }
            | Notice::CheckedIn { .. }
            | Notice::CheckInNotRequired { .. } => Severity::Toast,
            Notice::BusinessRuleError { .. }
            | Notice::TechnicalError { .. }
            | Notice::IssueFailed { .. }
            | Notice::LoadFailed { .. }
            | Notice::CheckInFailed { .. } => Severity::Error,
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity() == Severity::Error
    }

    /// How long the notice stays up. `None` means until dismissed.
    pub fn display_duration(&self, toast_duration: Duration) -> Option<Duration> {
        match self.severity() {
            Severity::Toast => Some(toast_duration),
            Severity::Error => None,
        }
    }
}

/// Sink for notices. Called with the session lock released.
pub trait Notifier: Send + Sync {
    fn notify(&self, notice: Notice);
}

/// Writes notices to the log. Used by the CLI.
#[derive(Debug, Clone, Copy)]
pub struct TracingNotifier {
    toast_duration: Duration,
}

impl TracingNotifier {
    pub fn new(toast_duration: Duration) -> Self {
        Self { toast_duration }
    }
}

impl Notifier for TracingNotifier {
    fn notify(&self, notice: Notice) {
        match notice.display_duration(self.toast_duration) {
            Some(shown) => {
                tracing::info!(notice = ?notice, display_ms = shown.as_millis() as u64, "notice")
            }
            None => tracing::warn!(notice = ?notice, "error notice"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failures_are_errors_and_progress_is_toast() {
        let key = UnitKey::pallet("0012", "W100", "P1");
        assert_eq!(
            Notice::Received { key: key.clone() }.severity(),
            Severity::Toast
        );
        assert!(Notice::TechnicalError {
            key: key.clone(),
            message: "timeout".into()
        }
        .is_error());
        assert!(!Notice::InProcess { key }.is_error());
    }

    #[test]
    fn toasts_expire_and_errors_stay() {
        let toast = Duration::from_millis(800);
        let key = UnitKey::pallet("0012", "W100", "P1");
        assert_eq!(
            Notice::Received { key: key.clone() }.display_duration(toast),
            Some(toast)
        );
        assert_eq!(
            Notice::BusinessRuleError {
                key,
                message: "blocked".into()
            }
            .display_duration(toast),
            None
        );
    }
}
