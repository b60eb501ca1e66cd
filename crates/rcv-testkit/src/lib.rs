//! Shared helpers for receiving scenario tests.
//!
//! Records are built for one store and waybill ([`STORE`], [`WAYBILL`]) so
//! scenarios only spell out what differs.

use std::sync::{Arc, Mutex};

use rcv_receiving::{
    Notice, Notifier, ReceivingError, ReceivingPolicy, ReceivingService, WaybillController,
};
use rcv_schemas::{ExceptionKey, ExceptionRecord, PalletHeader, PoHeader, PoItem, UnitKey, Waybill};
use rcv_service_mem::InMemoryReceivingService;

pub const STORE: &str = "0012";
pub const WAYBILL: &str = "W100";

/// Keeps every notice in arrival order.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    notices: Mutex<Vec<Notice>>,
}

impl RecordingNotifier {
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn notices(&self) -> Vec<Notice> {
        self.notices
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .clone()
    }

    /// Drain what was recorded so far.
    pub fn take(&self) -> Vec<Notice> {
        std::mem::take(&mut *self.notices.lock().unwrap_or_else(|p| p.into_inner()))
    }

    pub fn count(&self, pred: impl Fn(&Notice) -> bool) -> usize {
        self.notices().iter().filter(|n| pred(n)).count()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notice: Notice) {
        self.notices
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .push(notice);
    }
}

/// `seal = true` makes pallets the primary collection.
pub fn waybill(sealed: bool) -> Waybill {
    Waybill {
        store_id: STORE.into(),
        waybill_nbr: WAYBILL.into(),
        seal: if sealed { "X".into() } else { String::new() },
        entry_status: String::new(),
        action_code: "01".into(),
        carrier: "ACME".into(),
        scheduled_at: None,
        arrived_at: None,
        ..Waybill::default()
    }
}

pub fn pallet(pallet_id: &str, status: &str, open_qty: &str) -> PalletHeader {
    PalletHeader {
        store_id: STORE.into(),
        waybill_nbr: WAYBILL.into(),
        pallet_id: pallet_id.into(),
        status: status.into(),
        open_qty: open_qty.into(),
    }
}

pub fn purchase_order(po_nbr: &str, status: &str, open_qty: &str) -> PoHeader {
    PoHeader {
        store_id: STORE.into(),
        waybill_nbr: WAYBILL.into(),
        po_nbr: po_nbr.into(),
        status: status.into(),
        open_qty: open_qty.into(),
    }
}

pub fn article(po_nbr: &str, item_id: &str, article: &str, status: &str, open_qty: &str) -> PoItem {
    PoItem {
        store_id: STORE.into(),
        waybill_nbr: WAYBILL.into(),
        po_nbr: po_nbr.into(),
        item_id: item_id.into(),
        article: article.into(),
        pallet_id: String::new(),
        status: status.into(),
        open_qty: open_qty.into(),
    }
}

/// Exception against `key` (normally a unit's exception key).
pub fn exception(key: &ExceptionKey, type_code: &str, qty: &str) -> ExceptionRecord {
    ExceptionRecord {
        store_id: key.store_id.clone(),
        waybill_nbr: key.waybill_nbr.clone(),
        pallet: key.pallet.clone(),
        po_nbr: key.po_nbr.clone(),
        item_id: key.item_id.clone(),
        article: key.article.clone(),
        type_code: type_code.into(),
        qty: qty.into(),
        text: "reported at the dock".into(),
    }
}

pub fn pallet_key(pallet_id: &str) -> UnitKey {
    UnitKey::pallet(STORE, WAYBILL, pallet_id)
}

pub fn po_key(po_nbr: &str) -> UnitKey {
    UnitKey::purchase_order(STORE, WAYBILL, po_nbr)
}

pub fn article_key(po_nbr: &str, item_id: &str) -> UnitKey {
    UnitKey::article(STORE, WAYBILL, po_nbr, item_id)
}

/// Open the test waybill without load delays.
pub async fn open(
    svc: &Arc<InMemoryReceivingService>,
    notifier: &Arc<RecordingNotifier>,
) -> Result<WaybillController, ReceivingError> {
    let service: Arc<dyn ReceivingService> = svc.clone();
    let notifier: Arc<dyn Notifier> = notifier.clone();
    WaybillController::open(
        service,
        notifier,
        ReceivingPolicy::immediate(),
        STORE,
        WAYBILL,
    )
    .await
}

/// Yield until the service has seen `n` updates.
pub async fn wait_for_updates(svc: &InMemoryReceivingService, n: usize) {
    while svc.update_calls() < n {
        tokio::task::yield_now().await;
    }
}
