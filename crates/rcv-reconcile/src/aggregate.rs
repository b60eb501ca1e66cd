use serde::{Deserialize, Serialize};

use crate::buckets::BucketedCollection;

/// Derived status of a parent entity (waybill or purchase order).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParentStatus {
    Open,
    Complete,
}

/// True iff every supplied collection has empty NeedsReview and
/// NeedsSecondaryReview buckets. An empty slice is vacuously complete;
/// callers decide which siblings must be loaded first.
pub fn is_parent_complete(children: &[&BucketedCollection]) -> bool {
    children.iter().all(|c| c.is_settled())
}

pub fn parent_status(children: &[&BucketedCollection]) -> ParentStatus {
    if is_parent_complete(children) {
        ParentStatus::Complete
    } else {
        ParentStatus::Open
    }
}
