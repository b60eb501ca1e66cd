//! Deterministic in-memory receiving service.
//!
//! Behavior:
//! - reads return records in insertion order, filtered by parent
//! - an update consumes the next scripted outcome for the unit; with no
//!   script the unit is received in full
//! - accepted updates are stored, so a reload sees them; refused updates
//!   leave the stored record untouched
//! - `hold_updates` parks every update until `release_updates` hands out
//!   permits, which lets tests act while a submission is in flight
//!
//! No randomness, no network IO.

use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

use rcv_receiving::{parse_error_payload, ReceivingService, RemoteError};
use rcv_schemas::{
    ExceptionKey, ExceptionRecord, ParentRef, UnitKey, UnitKind, UnitRecord, Waybill,
};
use tokio::sync::Semaphore;
use tracing::debug;

mod fixture;

pub use fixture::{ReceivingFixture, ScriptStep, ScriptedOutcome};

#[derive(Debug, Default)]
struct State {
    waybills: Vec<Waybill>,
    units: Vec<UnitRecord>,
    exceptions: BTreeMap<ExceptionKey, ExceptionRecord>,
    scripts: BTreeMap<UnitKey, VecDeque<ScriptedOutcome>>,
    unit_read_failures: BTreeMap<UnitKind, RemoteError>,
    exception_write_failure: Option<RemoteError>,
    waybill_write_failure: Option<RemoteError>,
}

#[derive(Debug)]
pub struct InMemoryReceivingService {
    state: Mutex<State>,
    update_calls: AtomicUsize,
    held: AtomicBool,
    gate: Semaphore,
}

fn not_found(what: impl std::fmt::Display) -> RemoteError {
    RemoteError::http(404, format!("{what} not found"), Vec::new())
}

impl Default for InMemoryReceivingService {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryReceivingService {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State::default()),
            update_calls: AtomicUsize::new(0),
            held: AtomicBool::new(false),
            gate: Semaphore::new(0),
        }
    }

    pub fn from_fixture(fixture: ReceivingFixture) -> Self {
        let svc = Self::new();
        svc.insert_waybill(fixture.waybill);
        for r in fixture.pallets {
            svc.insert_unit(r);
        }
        for r in fixture.purchase_orders {
            svc.insert_unit(r);
        }
        for r in fixture.articles {
            svc.insert_unit(r);
        }
        for e in fixture.exceptions {
            svc.insert_exception(e);
        }
        for step in fixture.script {
            svc.script(step.unit, step.outcome);
        }
        svc
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn insert_waybill(&self, waybill: Waybill) {
        let mut st = self.state();
        st.waybills
            .retain(|w| !(w.store_id == waybill.store_id && w.waybill_nbr == waybill.waybill_nbr));
        st.waybills.push(waybill);
    }

    /// Insert or replace a unit record. Replacing keeps its position.
    pub fn insert_unit(&self, record: impl Into<UnitRecord>) {
        let record = record.into();
        let key = record.key();
        let mut st = self.state();
        match st.units.iter_mut().find(|r| r.key() == key) {
            Some(slot) => *slot = record,
            None => st.units.push(record),
        }
    }

    /// Append without replacing; a service returning duplicate keys.
    pub fn append_unit(&self, record: impl Into<UnitRecord>) {
        self.state().units.push(record.into());
    }

    pub fn insert_exception(&self, record: ExceptionRecord) {
        self.state().exceptions.insert(record.key(), record);
    }

    /// Queue an outcome for the next update of `unit`.
    pub fn script(&self, unit: UnitKey, outcome: ScriptedOutcome) {
        self.state().scripts.entry(unit).or_default().push_back(outcome);
    }

    /// Fail every read of `kind` with `err` until cleared.
    pub fn fail_unit_reads(&self, kind: UnitKind, err: RemoteError) {
        self.state().unit_read_failures.insert(kind, err);
    }

    pub fn fail_exception_writes(&self, err: RemoteError) {
        self.state().exception_write_failure = Some(err);
    }

    pub fn fail_waybill_writes(&self, err: RemoteError) {
        self.state().waybill_write_failure = Some(err);
    }

    pub fn clear_failures(&self) {
        let mut st = self.state();
        st.unit_read_failures.clear();
        st.exception_write_failure = None;
        st.waybill_write_failure = None;
    }

    /// Park updates until permits are released.
    pub fn hold_updates(&self) {
        self.held.store(true, Ordering::SeqCst);
    }

    /// Let `n` parked (or future) updates through.
    pub fn release_updates(&self, n: usize) {
        self.gate.add_permits(n);
    }

    /// Updates received so far, including parked ones.
    pub fn update_calls(&self) -> usize {
        self.update_calls.load(Ordering::SeqCst)
    }

    pub fn stored_unit(&self, key: &UnitKey) -> Option<UnitRecord> {
        self.state().units.iter().find(|r| r.key() == *key).cloned()
    }

    pub fn stored_exceptions(&self) -> Vec<ExceptionRecord> {
        self.state().exceptions.values().cloned().collect()
    }

    async fn pass_gate(&self) -> Result<(), RemoteError> {
        if !self.held.load(Ordering::SeqCst) {
            return Ok(());
        }
        let permit = self
            .gate
            .acquire()
            .await
            .map_err(|e| RemoteError::transport(format!("update gate closed: {e}")))?;
        permit.forget();
        Ok(())
    }
}

/// Records shipped without an open quantity keep it blank on a full receive.
fn accept(mut record: UnitRecord, remaining: i64) -> UnitRecord {
    if remaining > 0 || !record.open_qty_raw().trim().is_empty() {
        record.set_open_qty_raw(remaining.max(0).to_string());
    }
    record.set_status(if remaining <= 0 { "X" } else { "R" });
    record
}

#[async_trait::async_trait]
impl ReceivingService for InMemoryReceivingService {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn read_waybill(
        &self,
        store_id: &str,
        waybill_nbr: &str,
    ) -> Result<Waybill, RemoteError> {
        self.state()
            .waybills
            .iter()
            .find(|w| w.store_id == store_id && w.waybill_nbr == waybill_nbr)
            .cloned()
            .ok_or_else(|| not_found(format!("waybill {store_id}/{waybill_nbr}")))
    }

    async fn read_units(
        &self,
        parent: &ParentRef,
        kind: UnitKind,
    ) -> Result<Vec<UnitRecord>, RemoteError> {
        let st = self.state();
        if let Some(err) = st.unit_read_failures.get(&kind) {
            return Err(err.clone());
        }
        Ok(st
            .units
            .iter()
            .filter(|r| r.kind() == kind && r.parent() == *parent)
            .cloned()
            .collect())
    }

    async fn update_waybill(&self, waybill: &Waybill) -> Result<Waybill, RemoteError> {
        let mut st = self.state();
        if let Some(err) = &st.waybill_write_failure {
            return Err(err.clone());
        }
        let slot = st
            .waybills
            .iter_mut()
            .find(|w| w.store_id == waybill.store_id && w.waybill_nbr == waybill.waybill_nbr)
            .ok_or_else(|| {
                not_found(format!(
                    "waybill {}/{}",
                    waybill.store_id, waybill.waybill_nbr
                ))
            })?;
        *slot = waybill.clone();
        Ok(waybill.clone())
    }

    async fn read_unit(&self, key: &UnitKey) -> Result<UnitRecord, RemoteError> {
        self.stored_unit(key).ok_or_else(|| not_found(key))
    }

    async fn update_unit(
        &self,
        key: &UnitKey,
        record: &UnitRecord,
    ) -> Result<UnitRecord, RemoteError> {
        self.update_calls.fetch_add(1, Ordering::SeqCst);
        self.pass_gate().await?;

        let mut st = self.state();
        let Some(pos) = st.units.iter().position(|r| r.key() == *key) else {
            return Err(not_found(key));
        };
        let outcome = st
            .scripts
            .get_mut(key)
            .and_then(VecDeque::pop_front)
            .unwrap_or(ScriptedOutcome::Receive);
        debug!(unit = %key, outcome = ?outcome, "memory update");

        let updated = match outcome {
            ScriptedOutcome::Receive => accept(record.clone(), 0),
            ScriptedOutcome::ReceivePartial { remaining } => accept(record.clone(), remaining),
            ScriptedOutcome::Fail {
                status,
                message,
                body,
            } => {
                let details = body.as_deref().map(parse_error_payload).unwrap_or_default();
                return Err(match status {
                    Some(code) => RemoteError::http(code, message, details),
                    None => RemoteError::transport(message),
                });
            }
        };
        st.units[pos] = updated.clone();
        Ok(updated)
    }

    async fn read_exceptions(
        &self,
        store_id: &str,
        waybill_nbr: &str,
    ) -> Result<Vec<ExceptionRecord>, RemoteError> {
        Ok(self
            .state()
            .exceptions
            .values()
            .filter(|e| e.store_id == store_id && e.waybill_nbr == waybill_nbr)
            .cloned()
            .collect())
    }

    async fn upsert_exception(
        &self,
        record: &ExceptionRecord,
    ) -> Result<ExceptionRecord, RemoteError> {
        let mut st = self.state();
        if let Some(err) = &st.exception_write_failure {
            return Err(err.clone());
        }
        st.exceptions.insert(record.key(), record.clone());
        Ok(record.clone())
    }
}
