//! rcv-receiving
//!
//! Waybill receiving screens on top of `rcv-reconcile`.
//!
//! This crate owns the remote service contract, the per-screen controller
//! (load, submit, escalate, scan, report issue), driver check-in and user
//! notices. It does not speak HTTP; `rcv-odata` and `rcv-service-mem`
//! implement the service.

pub mod check_in;
pub mod controller;
pub mod error_payload;
pub mod issue;
pub mod notice;
pub mod policy;
pub mod scan;
pub mod service;

pub use check_in::check_in_waybill;
pub use controller::{
    CollectionId, Escalation, ReceivingError, Submission, WaybillController, WaybillHeader,
    WaybillSnapshot,
};
pub use error_payload::{parse_error_payload, ErrorDetail};
pub use issue::{IssueDraft, IssueRejected};
pub use notice::{Notice, Notifier, Severity, TracingNotifier};
pub use policy::ReceivingPolicy;
pub use scan::{route_article_scan, route_waybill_scan, ScanRoute};
pub use service::{FailureClass, ReceivingService, RemoteError};
