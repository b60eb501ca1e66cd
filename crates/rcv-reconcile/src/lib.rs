//! rcv-reconcile
//!
//! Receiving status reconciliation:
//! - status codes classify units into review buckets
//! - a bucketed collection keeps every unit in exactly one review bucket
//! - remote submit outcomes drive an explicit per-unit state machine
//! - parent completion is derived from the emptiness of child review buckets
//!
//! Deterministic, pure logic. No IO. No service calls.

mod aggregate;
mod buckets;
mod classify;
mod fulfillment;
mod transition;
mod types;

pub use aggregate::{is_parent_complete, parent_status, ParentStatus};
pub use buckets::{BucketCounts, BucketedCollection, CollectionSnapshot, LoadReport};
pub use classify::{classify, classify_code};
pub use fulfillment::{is_fulfilled, remaining_qty, ExceptionBook};
pub use transition::{
    apply_outcome, begin_submit, escalate_to_complete, SubmitOutcome, SubmitTicket,
    TransitionNotice, TransitionReport,
};
pub use types::*;
