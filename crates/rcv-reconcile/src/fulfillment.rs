use std::collections::BTreeMap;

use rcv_schemas::{ExceptionKey, ExceptionRecord, ReceivableUnit};

/// Exception records of one waybill, keyed by normalized exception key.
///
/// Written only by issue reporting and exception loads; the transition
/// logic reads it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExceptionBook {
    records: BTreeMap<ExceptionKey, ExceptionRecord>,
}

impl ExceptionBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a service listing. Later records win on equal keys.
    pub fn from_records(records: impl IntoIterator<Item = ExceptionRecord>) -> Self {
        let mut book = Self::new();
        for r in records {
            book.upsert(r);
        }
        book
    }

    /// Insert or replace; returns the previous record for the key.
    pub fn upsert(&mut self, record: ExceptionRecord) -> Option<ExceptionRecord> {
        self.records.insert(record.key(), record)
    }

    pub fn get(&self, key: &ExceptionKey) -> Option<&ExceptionRecord> {
        self.records.get(key)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ExceptionRecord> {
        self.records.values()
    }

    /// Quantity the exception at `key` takes off the open quantity.
    pub fn exception_qty(&self, key: &ExceptionKey) -> i64 {
        self.get(key).map(ExceptionRecord::reducing_qty).unwrap_or(0)
    }

    /// Issues recorded against a purchase order or any of its items.
    pub fn issues_for_po(&self, po_nbr: &str) -> usize {
        self.records.keys().filter(|k| k.po_nbr == po_nbr).count()
    }
}

/// Open quantity left after exceptions; `None` when the unit's open
/// quantity is unparseable.
pub fn remaining_qty(unit: &ReceivableUnit, book: &ExceptionBook) -> Option<i64> {
    unit.open_qty()
        .map(|open| open.saturating_sub(book.exception_qty(&unit.exception_key)))
}

/// `openQty - exceptionQty <= 0`. A blank or garbled open quantity is never
/// fulfilled.
pub fn is_fulfilled(unit: &ReceivableUnit, book: &ExceptionBook) -> bool {
    matches!(remaining_qty(unit, book), Some(q) if q <= 0)
}
