//! Per-screen waybill controller.
//!
//! Owns the bucketed collections of one waybill for the lifetime of the
//! screen. All mutation happens under one async mutex and never across a
//! remote call: a submission marks the unit busy, releases the lock, awaits
//! the service, then re-locks to apply the outcome. Spawned submissions hold
//! only a weak handle, so a completion arriving after [`WaybillController::close`]
//! (or after the controller is dropped) is discarded.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Weak};

use rcv_reconcile::{
    apply_outcome, begin_submit, escalate_to_complete, is_parent_complete, BucketCounts,
    BucketedCollection, CollectionSnapshot, ExceptionBook, LoadReport, ReconcileError,
    SubmitOutcome, SubmitTicket, TransitionNotice, TransitionReport,
};
use rcv_schemas::format::{format_date_time, DisplayLocale};
use rcv_schemas::{
    ExceptionRecord, ParentRef, ReceivableUnit, UnitKey, UnitKind, UnitRef, Waybill,
};
use serde::Serialize;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::issue::{IssueDraft, IssueRejected};
use crate::notice::{Notice, Notifier};
use crate::policy::ReceivingPolicy;
use crate::scan::{route_article_scan, route_waybill_scan, ScanRoute};
use crate::service::{FailureClass, ReceivingService, RemoteError};

#[derive(Debug)]
pub enum ReceivingError {
    /// The screen was closed.
    Closed,
    /// The collection holding the unit has not been loaded.
    NotLoaded(CollectionId),
    Reconcile(ReconcileError),
    Remote(RemoteError),
    Issue(IssueRejected),
    /// Check-in was asked for a shipment that is not in transit.
    NotInTransit { entry_status: String },
}

impl fmt::Display for ReceivingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReceivingError::Closed => f.write_str("waybill screen is closed"),
            ReceivingError::NotLoaded(id) => write!(f, "{id} not loaded"),
            ReceivingError::Reconcile(e) => write!(f, "reconcile: {e}"),
            ReceivingError::Remote(e) => write!(f, "remote: {e}"),
            ReceivingError::Issue(e) => write!(f, "issue rejected: {e}"),
            ReceivingError::NotInTransit { entry_status } => {
                write!(f, "waybill is not in transit (entry status {entry_status:?})")
            }
        }
    }
}

impl std::error::Error for ReceivingError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ReceivingError::Reconcile(e) => Some(e),
            ReceivingError::Remote(e) => Some(e),
            ReceivingError::Issue(e) => Some(e),
            ReceivingError::Closed
            | ReceivingError::NotLoaded(_)
            | ReceivingError::NotInTransit { .. } => None,
        }
    }
}

impl From<ReconcileError> for ReceivingError {
    fn from(e: ReconcileError) -> Self {
        ReceivingError::Reconcile(e)
    }
}

/// One collection of the screen.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(tag = "collection", rename_all = "snake_case")]
pub enum CollectionId {
    Pallets,
    PurchaseOrders,
    Articles { po_nbr: String },
}

impl CollectionId {
    pub fn of(key: &UnitKey) -> Self {
        match &key.unit {
            UnitRef::Pallet { .. } => CollectionId::Pallets,
            UnitRef::PurchaseOrder { .. } => CollectionId::PurchaseOrders,
            UnitRef::Article { po_nbr, .. } => CollectionId::Articles {
                po_nbr: po_nbr.clone(),
            },
        }
    }

    pub fn kind(&self) -> UnitKind {
        match self {
            CollectionId::Pallets => UnitKind::Pallet,
            CollectionId::PurchaseOrders => UnitKind::PurchaseOrder,
            CollectionId::Articles { .. } => UnitKind::Article,
        }
    }
}

impl fmt::Display for CollectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CollectionId::Pallets => f.write_str("pallets"),
            CollectionId::PurchaseOrders => f.write_str("purchase orders"),
            CollectionId::Articles { po_nbr } => write!(f, "articles of PO {po_nbr}"),
        }
    }
}

/// Parent status changes caused by one collection change.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Escalation {
    /// PO moved to Complete because its articles settled.
    pub purchase_order: Option<UnitKey>,
    /// Waybill marked received.
    pub waybill: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    Applied {
        report: TransitionReport,
        escalation: Escalation,
    },
    /// The screen went away before the service answered.
    Discarded { key: UnitKey },
}

impl Submission {
    pub fn report(&self) -> Option<&TransitionReport> {
        match self {
            Submission::Applied { report, .. } => Some(report),
            Submission::Discarded { .. } => None,
        }
    }
}

/// Waybill header lines as the device shows them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WaybillHeader {
    pub stage: String,
    pub scheduled: String,
    pub arrived: String,
}

impl WaybillHeader {
    pub fn new(waybill: &Waybill, locale: DisplayLocale) -> Self {
        let at = locale.at_sign();
        Self {
            stage: waybill.stage_label().to_string(),
            scheduled: format_date_time(waybill.scheduled_at, locale, false, at),
            arrived: format_date_time(waybill.arrived_at, locale, true, at),
        }
    }
}

/// Serializable view of the whole screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WaybillSnapshot {
    pub waybill: Waybill,
    pub header: WaybillHeader,
    pub complete: bool,
    pub pallets: Option<CollectionSnapshot>,
    pub purchase_orders: Option<CollectionSnapshot>,
    pub articles: BTreeMap<String, CollectionSnapshot>,
    pub exceptions: Vec<ExceptionRecord>,
}

struct Session {
    waybill: Waybill,
    pallets: Option<BucketedCollection>,
    purchase_orders: Option<BucketedCollection>,
    articles: BTreeMap<String, BucketedCollection>,
    exceptions: ExceptionBook,
}

impl Session {
    fn collection(&self, id: &CollectionId) -> Option<&BucketedCollection> {
        match id {
            CollectionId::Pallets => self.pallets.as_ref(),
            CollectionId::PurchaseOrders => self.purchase_orders.as_ref(),
            CollectionId::Articles { po_nbr } => self.articles.get(po_nbr),
        }
    }

    fn collection_mut(&mut self, id: &CollectionId) -> Option<&mut BucketedCollection> {
        match id {
            CollectionId::Pallets => self.pallets.as_mut(),
            CollectionId::PurchaseOrders => self.purchase_orders.as_mut(),
            CollectionId::Articles { po_nbr } => self.articles.get_mut(po_nbr),
        }
    }

    /// Replace a collection. Units with a submission in flight stay busy.
    fn install(&mut self, id: CollectionId, mut collection: BucketedCollection) {
        if let Some(previous) = self.collection(&id) {
            let kept = collection.keep_in_flight(previous);
            if kept > 0 {
                debug!(collection = %id, kept, "in-flight units stay busy across reload");
            }
        }
        match id {
            CollectionId::Pallets => self.pallets = Some(collection),
            CollectionId::PurchaseOrders => self.purchase_orders = Some(collection),
            CollectionId::Articles { po_nbr } => {
                self.articles.insert(po_nbr, collection);
            }
        }
    }

    /// Resolve a submission. `Ok(None)` when the collection or the unit is
    /// gone.
    fn resolve(
        &mut self,
        ticket: &SubmitTicket,
        outcome: SubmitOutcome,
    ) -> Result<Option<TransitionReport>, ReconcileError> {
        let book = &self.exceptions;
        let collection = match &ticket.key.unit {
            UnitRef::Pallet { .. } => self.pallets.as_mut(),
            UnitRef::PurchaseOrder { .. } => self.purchase_orders.as_mut(),
            UnitRef::Article { po_nbr, .. } => self.articles.get_mut(po_nbr),
        };
        match collection {
            Some(c) if c.contains(&ticket.key) => {
                apply_outcome(c, book, ticket, outcome).map(Some)
            }
            _ => Ok(None),
        }
    }

    /// Re-evaluate parent status after a change that touched `po_nbr` (its
    /// articles or the PO itself), or only the waybill when `None`.
    ///
    /// A PO completes when its (non-empty) article collection settles and no
    /// submission for it is in flight. The waybill completes when both the
    /// pallet and the PO collections are loaded and settled.
    fn escalate(&mut self, po_nbr: Option<&str>) -> Escalation {
        let mut out = Escalation::default();

        if let Some(po_nbr) = po_nbr {
            let settled = self
                .articles
                .get(po_nbr)
                .map(|a| !a.is_empty() && a.is_settled())
                .unwrap_or(false);
            let po_key = UnitKey::purchase_order(
                self.waybill.store_id.clone(),
                self.waybill.waybill_nbr.clone(),
                po_nbr,
            );
            if let (true, Some(pos)) = (settled, self.purchase_orders.as_mut()) {
                if pos.contains(&po_key) {
                    match escalate_to_complete(pos, &po_key) {
                        Ok(true) => out.purchase_order = Some(po_key),
                        Ok(false) => {}
                        Err(err) => warn!(po = %po_key, error = %err, "PO escalation skipped"),
                    }
                }
            }
        }

        if let (Some(pallets), Some(pos)) = (&self.pallets, &self.purchase_orders) {
            if is_parent_complete(&[pallets, pos]) && self.waybill.mark_complete() {
                out.waybill = true;
            }
        }
        out
    }

    fn snapshot(&self, locale: DisplayLocale) -> WaybillSnapshot {
        WaybillSnapshot {
            waybill: self.waybill.clone(),
            header: WaybillHeader::new(&self.waybill, locale),
            complete: self.waybill.is_complete(),
            pallets: self.pallets.as_ref().map(BucketedCollection::snapshot),
            purchase_orders: self
                .purchase_orders
                .as_ref()
                .map(BucketedCollection::snapshot),
            articles: self
                .articles
                .iter()
                .map(|(po, c)| (po.clone(), c.snapshot()))
                .collect(),
            exceptions: self.exceptions.iter().cloned().collect(),
        }
    }
}

/// PO whose completion a change to `key` can affect.
fn touched_po(key: &UnitKey) -> Option<&str> {
    match &key.unit {
        UnitRef::Pallet { .. } => None,
        UnitRef::PurchaseOrder { po_nbr } | UnitRef::Article { po_nbr, .. } => {
            Some(po_nbr.as_str())
        }
    }
}

type SharedSession = Arc<Mutex<Option<Session>>>;

#[derive(Clone)]
struct Core {
    service: Arc<dyn ReceivingService>,
    notifier: Arc<dyn Notifier>,
    policy: ReceivingPolicy,
}

impl Core {
    fn escalation_notices(&self, waybill: &Waybill, escalation: &Escalation) {
        if let Some(key) = &escalation.purchase_order {
            info!(po = %key, "purchase order complete");
            self.notifier
                .notify(Notice::PurchaseOrderComplete { key: key.clone() });
        }
        if escalation.waybill {
            info!(
                store_id = %waybill.store_id,
                waybill_nbr = %waybill.waybill_nbr,
                "waybill received"
            );
            self.notifier.notify(Notice::WaybillComplete {
                store_id: waybill.store_id.clone(),
                waybill_nbr: waybill.waybill_nbr.clone(),
            });
        }
    }

    fn rejection_notice(&self, key: &UnitKey, err: &ReconcileError) {
        let notice = match err {
            ReconcileError::UnitBusy { .. } => Notice::InProcess { key: key.clone() },
            ReconcileError::AlreadyComplete { .. } | ReconcileError::Unclassified { .. } => {
                Notice::NotRequired { key: key.clone() }
            }
            _ => return,
        };
        info!(unit = %key, reason = %err, "submission refused");
        self.notifier.notify(notice);
    }

    fn transition_notice(&self, report: &TransitionReport) {
        let key = report.key.clone();
        let notice = match &report.notice {
            TransitionNotice::Received => Notice::Received { key },
            TransitionNotice::ReceivedWithOpenQty { remaining } => Notice::ReceivedWithOpenQty {
                key,
                remaining: *remaining,
            },
            TransitionNotice::BusinessRuleError { message } => Notice::BusinessRuleError {
                key,
                message: message.clone(),
            },
            TransitionNotice::TechnicalError { message } => Notice::TechnicalError {
                key,
                message: message.clone(),
            },
            TransitionNotice::AlreadyComplete => Notice::AlreadyComplete { key },
        };
        self.notifier.notify(notice);
    }

    fn classify(&self, err: RemoteError) -> SubmitOutcome {
        let message = err.user_message();
        match err.classify(self.policy.business_rule_status_ceiling) {
            FailureClass::BusinessRule => SubmitOutcome::BusinessRuleFailure { message },
            FailureClass::Technical => SubmitOutcome::TechnicalFailure { message },
        }
    }
}

async fn run_submission(
    core: Core,
    session: Weak<Mutex<Option<Session>>>,
    key: UnitKey,
) -> Result<Submission, ReceivingError> {
    let id = CollectionId::of(&key);

    let ticket = {
        let Some(strong) = session.upgrade() else {
            return Err(ReceivingError::Closed);
        };
        let mut guard = strong.lock().await;
        let s = guard.as_mut().ok_or(ReceivingError::Closed)?;
        let collection = s
            .collection_mut(&id)
            .ok_or_else(|| ReceivingError::NotLoaded(id.clone()))?;
        match begin_submit(collection, &key) {
            Ok(ticket) => ticket,
            Err(err) => {
                drop(guard);
                core.rejection_notice(&key, &err);
                return Err(err.into());
            }
        }
    };

    let submission_id = Uuid::new_v4();
    info!(
        unit = %key,
        submission_id = %submission_id,
        from = ?ticket.from,
        service = core.service.name(),
        "submitting unit for review"
    );

    let outcome = match core.service.update_unit(&key, &ticket.record).await {
        Ok(record) => SubmitOutcome::Success(record),
        Err(err) => {
            warn!(
                unit = %key,
                submission_id = %submission_id,
                status = ?err.status_code,
                error = %err,
                "submission failed"
            );
            core.classify(err)
        }
    };

    let Some(strong) = session.upgrade() else {
        debug!(unit = %key, submission_id = %submission_id, "screen dropped; completion discarded");
        return Ok(Submission::Discarded { key });
    };
    let (report, escalation, waybill) = {
        let mut guard = strong.lock().await;
        let Some(s) = guard.as_mut() else {
            debug!(unit = %key, submission_id = %submission_id, "screen closed; completion discarded");
            return Ok(Submission::Discarded { key });
        };
        let Some(report) = s.resolve(&ticket, outcome)? else {
            debug!(unit = %key, submission_id = %submission_id, "collection gone; completion discarded");
            return Ok(Submission::Discarded { key });
        };
        let escalation = s.escalate(touched_po(&key));
        (report, escalation, s.waybill.clone())
    };

    info!(
        unit = %key,
        submission_id = %submission_id,
        from = ?report.from,
        to = ?report.to,
        "submission resolved"
    );
    core.transition_notice(&report);
    core.escalation_notices(&waybill, &escalation);

    Ok(Submission::Applied { report, escalation })
}

/// Controller for one open waybill screen.
pub struct WaybillController {
    core: Core,
    store_id: String,
    waybill_nbr: String,
    session: SharedSession,
}

impl WaybillController {
    /// Read the waybill and its exceptions, then load the primary collection
    /// and, after the configured delay, the secondary one.
    ///
    /// Only a failed waybill read fails the open; collection and exception
    /// load failures are notified and leave that part unloaded.
    pub async fn open(
        service: Arc<dyn ReceivingService>,
        notifier: Arc<dyn Notifier>,
        policy: ReceivingPolicy,
        store_id: &str,
        waybill_nbr: &str,
    ) -> Result<Self, ReceivingError> {
        let waybill = service
            .read_waybill(store_id, waybill_nbr)
            .await
            .map_err(ReceivingError::Remote)?;
        info!(
            store_id,
            waybill_nbr,
            seal = %waybill.seal,
            action_code = %waybill.action_code,
            "waybill opened"
        );

        let pallet_driven = waybill.is_pallet_driven();
        let controller = Self {
            core: Core {
                service,
                notifier,
                policy,
            },
            store_id: waybill.store_id.clone(),
            waybill_nbr: waybill.waybill_nbr.clone(),
            session: Arc::new(Mutex::new(Some(Session {
                waybill,
                pallets: None,
                purchase_orders: None,
                articles: BTreeMap::new(),
                exceptions: ExceptionBook::new(),
            }))),
        };

        if let Err(err) = controller.load_exceptions().await {
            debug!(error = %err, "opened without exceptions");
        }

        let (primary, secondary) = if pallet_driven {
            (CollectionId::Pallets, CollectionId::PurchaseOrders)
        } else {
            (CollectionId::PurchaseOrders, CollectionId::Pallets)
        };
        if let Err(err) = controller.load(primary).await {
            debug!(error = %err, "primary collection not loaded");
        }
        let delay = controller.core.policy.secondary_load_delay;
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        if let Err(err) = controller.load(secondary).await {
            debug!(error = %err, "secondary collection not loaded");
        }

        Ok(controller)
    }

    pub fn store_id(&self) -> &str {
        &self.store_id
    }

    pub fn waybill_nbr(&self) -> &str {
        &self.waybill_nbr
    }

    pub async fn load_pallets(&self) -> Result<LoadReport, ReceivingError> {
        self.load(CollectionId::Pallets).await
    }

    pub async fn load_purchase_orders(&self) -> Result<LoadReport, ReceivingError> {
        self.load(CollectionId::PurchaseOrders).await
    }

    pub async fn load_articles(&self, po_nbr: &str) -> Result<LoadReport, ReceivingError> {
        self.load(CollectionId::Articles {
            po_nbr: po_nbr.to_string(),
        })
        .await
    }

    /// Re-read a collection and replace it atomically.
    ///
    /// A read failure or an integrity fault keeps the previous collection.
    pub async fn load(&self, id: CollectionId) -> Result<LoadReport, ReceivingError> {
        let kind = id.kind();
        let parent = match &id {
            CollectionId::Articles { po_nbr } => ParentRef::PurchaseOrder {
                store_id: self.store_id.clone(),
                waybill_nbr: self.waybill_nbr.clone(),
                po_nbr: po_nbr.clone(),
            },
            _ => ParentRef::waybill(&self.store_id, &self.waybill_nbr),
        };
        self.ensure_open().await?;

        let records = match self.core.service.read_units(&parent, kind).await {
            Ok(records) => records,
            Err(err) => {
                warn!(collection = %id, error = %err, "collection read failed");
                self.core.notifier.notify(Notice::LoadFailed {
                    kind: Some(kind),
                    message: err.user_message(),
                });
                return Err(ReceivingError::Remote(err));
            }
        };

        let (collection, report) = match BucketedCollection::load_records(kind, records) {
            Ok(loaded) => loaded,
            Err(err) => {
                warn!(collection = %id, error = %err, "collection rejected");
                self.core.notifier.notify(Notice::LoadFailed {
                    kind: Some(kind),
                    message: err.to_string(),
                });
                return Err(err.into());
            }
        };
        for excluded in &report.excluded {
            warn!(collection = %id, error = %excluded, "unit kept out of review buckets");
        }

        let (escalation, waybill) = {
            let mut guard = self.session.lock().await;
            let s = guard.as_mut().ok_or(ReceivingError::Closed)?;
            s.install(id.clone(), collection);
            let po_nbr = match &id {
                CollectionId::Articles { po_nbr } => Some(po_nbr.as_str()),
                _ => None,
            };
            (s.escalate(po_nbr), s.waybill.clone())
        };
        info!(
            collection = %id,
            loaded = report.loaded,
            excluded = report.excluded.len(),
            "collection loaded"
        );
        self.core.escalation_notices(&waybill, &escalation);
        Ok(report)
    }

    /// Re-read the waybill's exception records. Returns how many were read.
    pub async fn load_exceptions(&self) -> Result<usize, ReceivingError> {
        self.ensure_open().await?;
        let records = match self
            .core
            .service
            .read_exceptions(&self.store_id, &self.waybill_nbr)
            .await
        {
            Ok(records) => records,
            Err(err) => {
                warn!(error = %err, "exception read failed");
                self.core.notifier.notify(Notice::LoadFailed {
                    kind: None,
                    message: err.user_message(),
                });
                return Err(ReceivingError::Remote(err));
            }
        };
        let book = ExceptionBook::from_records(records);
        let count = book.len();

        let mut guard = self.session.lock().await;
        let s = guard.as_mut().ok_or(ReceivingError::Closed)?;
        s.exceptions = book;
        debug!(count, "exceptions loaded");
        Ok(count)
    }

    /// Submit a unit for review and wait for the outcome.
    pub async fn submit(&self, key: &UnitKey) -> Result<Submission, ReceivingError> {
        run_submission(
            self.core.clone(),
            Arc::downgrade(&self.session),
            key.clone(),
        )
        .await
    }

    /// Submit on the runtime without waiting. Requires a tokio runtime.
    pub fn submit_detached(&self, key: UnitKey) -> JoinHandle<Result<Submission, ReceivingError>> {
        tokio::spawn(run_submission(
            self.core.clone(),
            Arc::downgrade(&self.session),
            key,
        ))
    }

    /// Route a barcode scanned on the waybill screen.
    pub async fn scan(&self, query: &str) -> Result<ScanRoute, ReceivingError> {
        let guard = self.session.lock().await;
        let s = guard.as_ref().ok_or(ReceivingError::Closed)?;
        let id = if s.waybill.is_pallet_driven() {
            CollectionId::Pallets
        } else {
            CollectionId::PurchaseOrders
        };
        let primary = s
            .collection(&id)
            .ok_or_else(|| ReceivingError::NotLoaded(id.clone()))?;
        Ok(route_waybill_scan(&s.waybill, primary, query.trim()))
    }

    /// Route an article scanned on a PO screen.
    pub async fn scan_article(
        &self,
        po_nbr: &str,
        article: &str,
    ) -> Result<ScanRoute, ReceivingError> {
        let guard = self.session.lock().await;
        let s = guard.as_ref().ok_or(ReceivingError::Closed)?;
        let id = CollectionId::Articles {
            po_nbr: po_nbr.to_string(),
        };
        let articles = s
            .collection(&id)
            .ok_or_else(|| ReceivingError::NotLoaded(id.clone()))?;
        Ok(route_article_scan(articles, article.trim()))
    }

    /// Validate and save an issue against a loaded unit.
    pub async fn report_issue(&self, draft: IssueDraft) -> Result<ExceptionRecord, ReceivingError> {
        let exception_key = {
            let guard = self.session.lock().await;
            let s = guard.as_ref().ok_or(ReceivingError::Closed)?;
            let id = CollectionId::of(&draft.unit);
            let collection = s
                .collection(&id)
                .ok_or_else(|| ReceivingError::NotLoaded(id.clone()))?;
            collection
                .get(&draft.unit)
                .map(|u| u.exception_key.clone())
                .ok_or_else(|| ReconcileError::UnitNotFound {
                    key: draft.unit.clone(),
                    bucket: rcv_reconcile::Bucket::All,
                })?
        };

        let record = match draft.into_record(&exception_key) {
            Ok(record) => record,
            Err(reason) => {
                info!(key = %exception_key, reason = %reason, "issue refused");
                self.core.notifier.notify(Notice::IssueRejected {
                    reason: reason.clone(),
                });
                return Err(ReceivingError::Issue(reason));
            }
        };

        let saved = match self.core.service.upsert_exception(&record).await {
            Ok(saved) => saved,
            Err(err) => {
                warn!(key = %exception_key, error = %err, "issue save failed");
                self.core.notifier.notify(Notice::IssueFailed {
                    key: exception_key,
                    message: err.user_message(),
                });
                return Err(ReceivingError::Remote(err));
            }
        };

        {
            let mut guard = self.session.lock().await;
            let s = guard.as_mut().ok_or(ReceivingError::Closed)?;
            s.exceptions.upsert(saved.clone());
        }
        info!(key = %exception_key, type_code = %saved.type_code, "issue saved");
        self.core
            .notifier
            .notify(Notice::IssueSaved { key: exception_key });
        Ok(saved)
    }

    pub async fn counts(&self, id: &CollectionId) -> Result<BucketCounts, ReceivingError> {
        let guard = self.session.lock().await;
        let s = guard.as_ref().ok_or(ReceivingError::Closed)?;
        s.collection(id)
            .map(BucketedCollection::counts)
            .ok_or_else(|| ReceivingError::NotLoaded(id.clone()))
    }

    pub async fn unit(&self, key: &UnitKey) -> Option<ReceivableUnit> {
        let guard = self.session.lock().await;
        guard
            .as_ref()?
            .collection(&CollectionId::of(key))?
            .get(key)
            .cloned()
    }

    pub async fn waybill(&self) -> Result<Waybill, ReceivingError> {
        let guard = self.session.lock().await;
        guard
            .as_ref()
            .map(|s| s.waybill.clone())
            .ok_or(ReceivingError::Closed)
    }

    /// Issues recorded against a PO and its items.
    pub async fn issue_count_for_po(&self, po_nbr: &str) -> Result<usize, ReceivingError> {
        let guard = self.session.lock().await;
        let s = guard.as_ref().ok_or(ReceivingError::Closed)?;
        Ok(s.exceptions.issues_for_po(po_nbr))
    }

    pub async fn snapshot(&self) -> Result<WaybillSnapshot, ReceivingError> {
        let guard = self.session.lock().await;
        let locale = self.core.policy.locale;
        guard
            .as_ref()
            .map(|s| s.snapshot(locale))
            .ok_or(ReceivingError::Closed)
    }

    pub async fn is_open(&self) -> bool {
        self.session.lock().await.is_some()
    }

    /// Tear the screen down. In-flight submissions resolve as discarded.
    pub async fn close(&self) {
        let mut guard = self.session.lock().await;
        if guard.take().is_some() {
            info!(
                store_id = %self.store_id,
                waybill_nbr = %self.waybill_nbr,
                "waybill closed"
            );
        }
    }

    async fn ensure_open(&self) -> Result<(), ReceivingError> {
        if self.is_open().await {
            Ok(())
        } else {
            Err(ReceivingError::Closed)
        }
    }
}
