use std::collections::{BTreeMap, BTreeSet};

use rcv_schemas::{ReceivableUnit, UnitKey, UnitKind, UnitRecord};
use serde::Serialize;

use crate::classify::classify;
use crate::types::{Bucket, ReconcileError, ReviewState};

/// What a load kept out of the review buckets.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LoadReport {
    pub loaded: usize,
    /// Units present in "all" only, one `UnknownStatusCode` each.
    pub excluded: Vec<ReconcileError>,
}

impl LoadReport {
    pub fn is_clean(&self) -> bool {
        self.excluded.is_empty()
    }
}

/// Badge counts for one collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BucketCounts {
    pub all: usize,
    pub needs_review: usize,
    pub needs_secondary_review: usize,
    pub complete: usize,
}

/// Serializable view of a collection for list rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CollectionSnapshot {
    pub kind: UnitKind,
    pub counts: BucketCounts,
    pub buckets: BTreeMap<Bucket, Vec<ReceivableUnit>>,
}

/// A unit collection partitioned into review buckets.
///
/// "all" owns the units in load order. Each review bucket holds keys in the
/// order units entered it. Every unit in "all" whose status classified at
/// load time sits in exactly one review bucket; units with unknown codes sit
/// in none.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BucketedCollection {
    kind: UnitKind,
    all: Vec<ReceivableUnit>,
    needs_review: Vec<UnitKey>,
    needs_secondary_review: Vec<UnitKey>,
    complete: Vec<UnitKey>,
}

impl BucketedCollection {
    pub fn empty(kind: UnitKind) -> Self {
        Self {
            kind,
            all: Vec::new(),
            needs_review: Vec::new(),
            needs_secondary_review: Vec::new(),
            complete: Vec::new(),
        }
    }

    /// Partition `units` in one pass.
    ///
    /// A duplicate key or a unit of another kind rejects the whole load;
    /// nothing is returned half-built.
    pub fn load(
        kind: UnitKind,
        units: impl IntoIterator<Item = ReceivableUnit>,
    ) -> Result<(Self, LoadReport), ReconcileError> {
        let mut out = Self::empty(kind);
        let mut report = LoadReport::default();
        let mut seen = BTreeSet::new();

        for mut unit in units {
            if unit.kind() != kind {
                return Err(ReconcileError::KindMismatch {
                    key: unit.key.clone(),
                    expected: kind,
                    found: unit.kind(),
                });
            }
            if !seen.insert(unit.key.clone()) {
                return Err(ReconcileError::DuplicateUnitId { key: unit.key });
            }

            unit.busy = false;
            match classify(&unit) {
                Ok(state) => out.keys_mut(state.bucket()).push(unit.key.clone()),
                Err(err) => report.excluded.push(err),
            }
            out.all.push(unit);
        }

        report.loaded = out.all.len();
        Ok((out, report))
    }

    /// Convenience over [`BucketedCollection::load`] for raw records.
    pub fn load_records(
        kind: UnitKind,
        records: impl IntoIterator<Item = UnitRecord>,
    ) -> Result<(Self, LoadReport), ReconcileError> {
        Self::load(kind, records.into_iter().map(ReceivableUnit::from))
    }

    /// Mark busy every unit that was busy in `previous`, the collection this
    /// one replaces. Returns how many units stayed busy.
    pub fn keep_in_flight(&mut self, previous: &BucketedCollection) -> usize {
        let mut kept = 0;
        for unit in &mut self.all {
            if previous.get(&unit.key).is_some_and(|u| u.busy) {
                unit.busy = true;
                kept += 1;
            }
        }
        kept
    }

    pub fn kind(&self) -> UnitKind {
        self.kind
    }

    pub fn is_empty(&self) -> bool {
        self.all.is_empty()
    }

    /// Live length of `bucket`.
    pub fn count(&self, bucket: Bucket) -> usize {
        match bucket {
            Bucket::All => self.all.len(),
            Bucket::NeedsReview => self.needs_review.len(),
            Bucket::NeedsSecondaryReview => self.needs_secondary_review.len(),
            Bucket::Complete => self.complete.len(),
        }
    }

    pub fn counts(&self) -> BucketCounts {
        BucketCounts {
            all: self.count(Bucket::All),
            needs_review: self.count(Bucket::NeedsReview),
            needs_secondary_review: self.count(Bucket::NeedsSecondaryReview),
            complete: self.count(Bucket::Complete),
        }
    }

    /// No unit waits for review or secondary review.
    pub fn is_settled(&self) -> bool {
        self.needs_review.is_empty() && self.needs_secondary_review.is_empty()
    }

    pub fn get(&self, key: &UnitKey) -> Option<&ReceivableUnit> {
        self.all.iter().find(|u| &u.key == key)
    }

    pub(crate) fn get_mut(&mut self, key: &UnitKey) -> Option<&mut ReceivableUnit> {
        self.all.iter_mut().find(|u| &u.key == key)
    }

    pub fn contains(&self, key: &UnitKey) -> bool {
        self.get(key).is_some()
    }

    /// Review bucket currently holding `key`; `None` for unknown or
    /// unclassified units.
    pub fn bucket_of(&self, key: &UnitKey) -> Option<Bucket> {
        [
            Bucket::NeedsReview,
            Bucket::NeedsSecondaryReview,
            Bucket::Complete,
        ]
        .into_iter()
        .find(|b| self.keys(*b).contains(key))
    }

    pub fn state_of(&self, key: &UnitKey) -> Option<ReviewState> {
        self.bucket_of(key).and_then(|b| b.state())
    }

    /// Units of `bucket` in bucket order.
    pub fn units(&self, bucket: Bucket) -> Vec<&ReceivableUnit> {
        match bucket {
            Bucket::All => self.all.iter().collect(),
            _ => self.keys(bucket).iter().filter_map(|k| self.get(k)).collect(),
        }
    }

    /// First unit of `bucket` whose scannable label matches `label`.
    pub fn find_by_label(&self, bucket: Bucket, label: &str) -> Option<&ReceivableUnit> {
        self.units(bucket)
            .into_iter()
            .find(|u| u.key.label() == label)
    }

    /// First article of `bucket` with the given article number.
    pub fn find_by_article(&self, bucket: Bucket, article: &str) -> Option<&ReceivableUnit> {
        self.units(bucket)
            .into_iter()
            .find(|u| u.record.article() == Some(article))
    }

    /// Move `key` from one review bucket to another.
    ///
    /// Removal is stable. On error nothing changes.
    pub fn move_unit(
        &mut self,
        key: &UnitKey,
        from: Bucket,
        to: Bucket,
    ) -> Result<(), ReconcileError> {
        for b in [from, to] {
            if b == Bucket::All {
                return Err(ReconcileError::NotMovable { bucket: b });
            }
        }

        let source = self.keys_mut(from);
        let Some(pos) = source.iter().position(|k| k == key) else {
            return Err(ReconcileError::UnitNotFound {
                key: key.clone(),
                bucket: from,
            });
        };
        let moved = source.remove(pos);
        self.keys_mut(to).push(moved);
        Ok(())
    }

    /// Replace a unit's record, keeping its bucket and busy flag.
    pub fn replace_record(&mut self, record: UnitRecord) -> Result<(), ReconcileError> {
        let key = record.key();
        let unit = self
            .get_mut(&key)
            .ok_or_else(|| ReconcileError::UnitNotFound {
                key: key.clone(),
                bucket: Bucket::All,
            })?;
        unit.record = record;
        Ok(())
    }

    pub fn snapshot(&self) -> CollectionSnapshot {
        let buckets = Bucket::ALL
            .into_iter()
            .map(|b| (b, self.units(b).into_iter().cloned().collect()))
            .collect();
        CollectionSnapshot {
            kind: self.kind,
            counts: self.counts(),
            buckets,
        }
    }

    /// Every review-bucket key is in "all" exactly once and appears in at
    /// most one review bucket.
    pub fn is_consistent(&self) -> bool {
        let all: BTreeSet<&UnitKey> = self.all.iter().map(|u| &u.key).collect();
        if all.len() != self.all.len() {
            return false;
        }
        let mut placed = BTreeSet::new();
        [
            &self.needs_review,
            &self.needs_secondary_review,
            &self.complete,
        ]
        .into_iter()
        .flatten()
        .all(|k| all.contains(k) && placed.insert(k))
    }

    fn keys(&self, bucket: Bucket) -> &[UnitKey] {
        match bucket {
            Bucket::All => &[],
            Bucket::NeedsReview => &self.needs_review,
            Bucket::NeedsSecondaryReview => &self.needs_secondary_review,
            Bucket::Complete => &self.complete,
        }
    }

    // Callers never pass All; load and move_unit guard it.
    fn keys_mut(&mut self, bucket: Bucket) -> &mut Vec<UnitKey> {
        match bucket {
            Bucket::NeedsReview | Bucket::All => &mut self.needs_review,
            Bucket::NeedsSecondaryReview => &mut self.needs_secondary_review,
            Bucket::Complete => &mut self.complete,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rcv_schemas::{PalletHeader, PoHeader};

    fn pallet(id: &str, status: &str) -> ReceivableUnit {
        ReceivableUnit::from(UnitRecord::from(PalletHeader {
            store_id: "0012".into(),
            waybill_nbr: "W100".into(),
            pallet_id: id.into(),
            status: status.into(),
            open_qty: String::new(),
        }))
    }

    fn key(id: &str) -> UnitKey {
        UnitKey::pallet("0012", "W100", id)
    }

    fn labels(c: &BucketedCollection, b: Bucket) -> Vec<String> {
        c.units(b).iter().map(|u| u.key.label().to_string()).collect()
    }

    #[test]
    fn load_partitions_by_status() {
        let (c, report) = BucketedCollection::load(
            UnitKind::Pallet,
            vec![
                pallet("P1", "N"),
                pallet("P2", "R"),
                pallet("P3", "X"),
                pallet("P4", "N"),
            ],
        )
        .unwrap();

        assert!(report.is_clean());
        assert_eq!(report.loaded, 4);
        assert_eq!(labels(&c, Bucket::NeedsReview), vec!["P1", "P4"]);
        assert_eq!(labels(&c, Bucket::NeedsSecondaryReview), vec!["P2"]);
        assert_eq!(labels(&c, Bucket::Complete), vec!["P3"]);
        assert_eq!(c.count(Bucket::All), 4);
        assert!(c.is_consistent());
    }

    #[test]
    fn unknown_status_stays_in_all_only() {
        let (c, report) = BucketedCollection::load(
            UnitKind::Pallet,
            vec![pallet("P1", "N"), pallet("P2", "Q")],
        )
        .unwrap();

        assert_eq!(report.excluded.len(), 1);
        assert_eq!(c.count(Bucket::All), 2);
        assert_eq!(c.bucket_of(&key("P2")), None);
        assert!(c.contains(&key("P2")));
        assert!(c.is_consistent());
    }

    #[test]
    fn duplicate_key_rejects_load() {
        let err = BucketedCollection::load(
            UnitKind::Pallet,
            vec![pallet("P1", "N"), pallet("P1", "X")],
        )
        .unwrap_err();
        assert_eq!(err, ReconcileError::DuplicateUnitId { key: key("P1") });
    }

    #[test]
    fn wrong_kind_rejects_load() {
        let po = ReceivableUnit::from(UnitRecord::from(PoHeader {
            store_id: "0012".into(),
            waybill_nbr: "W100".into(),
            po_nbr: "4500001".into(),
            status: "N".into(),
            open_qty: String::new(),
        }));
        let err = BucketedCollection::load(UnitKind::Pallet, vec![po]).unwrap_err();
        assert!(matches!(err, ReconcileError::KindMismatch { .. }));
    }

    #[test]
    fn move_is_stable_and_counts_follow() {
        let (mut c, _) = BucketedCollection::load(
            UnitKind::Pallet,
            vec![pallet("P1", "N"), pallet("P2", "N"), pallet("P3", "N")],
        )
        .unwrap();

        c.move_unit(&key("P2"), Bucket::NeedsReview, Bucket::Complete)
            .unwrap();
        assert_eq!(labels(&c, Bucket::NeedsReview), vec!["P1", "P3"]);
        assert_eq!(c.count(Bucket::NeedsReview), 2);
        assert_eq!(c.count(Bucket::Complete), 1);
        assert_eq!(c.count(Bucket::All), 3);
        assert!(c.is_consistent());
    }

    #[test]
    fn move_from_wrong_bucket_changes_nothing() {
        let (mut c, _) =
            BucketedCollection::load(UnitKind::Pallet, vec![pallet("P1", "N")]).unwrap();
        let before = c.clone();

        let err = c
            .move_unit(&key("P1"), Bucket::NeedsSecondaryReview, Bucket::Complete)
            .unwrap_err();
        assert!(matches!(err, ReconcileError::UnitNotFound { .. }));
        assert_eq!(c, before);

        let err = c
            .move_unit(&key("P1"), Bucket::NeedsReview, Bucket::All)
            .unwrap_err();
        assert_eq!(err, ReconcileError::NotMovable { bucket: Bucket::All });
        assert_eq!(c, before);
    }

    #[test]
    fn snapshot_serializes_bucket_names() {
        let (c, _) = BucketedCollection::load(
            UnitKind::Pallet,
            vec![pallet("P1", "N"), pallet("P2", "X")],
        )
        .unwrap();
        let v = serde_json::to_value(c.snapshot()).unwrap();
        assert_eq!(v["counts"]["needsReview"], 1);
        assert_eq!(v["buckets"]["all"].as_array().unwrap().len(), 2);
        assert_eq!(v["buckets"]["complete"].as_array().unwrap().len(), 1);
        assert_eq!(v["buckets"]["needsSecondaryReview"].as_array().unwrap().len(), 0);
    }

    #[test]
    fn count_is_idempotent() {
        let (c, _) =
            BucketedCollection::load(UnitKind::Pallet, vec![pallet("P1", "R")]).unwrap();
        assert_eq!(c.counts(), c.counts());
    }

    #[test]
    fn reload_keeps_units_in_flight_busy() {
        let (mut old, _) =
            BucketedCollection::load(UnitKind::Pallet, vec![pallet("P1", "N"), pallet("P2", "N")])
                .unwrap();
        old.get_mut(&key("P1")).unwrap().busy = true;

        let (mut fresh, _) = BucketedCollection::load(
            UnitKind::Pallet,
            vec![pallet("P1", "X"), pallet("P2", "N"), pallet("P3", "N")],
        )
        .unwrap();
        assert!(!fresh.get(&key("P1")).unwrap().busy);

        assert_eq!(fresh.keep_in_flight(&old), 1);
        assert!(fresh.get(&key("P1")).unwrap().busy);
        assert!(!fresh.get(&key("P2")).unwrap().busy);
        assert!(!fresh.get(&key("P3")).unwrap().busy);
        assert_eq!(fresh.bucket_of(&key("P1")), Some(Bucket::Complete));
    }
}
