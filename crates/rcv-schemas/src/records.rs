//! Receivable records exactly as the receiving service ships them.
//!
//! Field names follow the service's PascalCase properties so fixtures and
//! HTTP payloads deserialize without a mapping layer.

use serde::{Deserialize, Serialize};

use crate::format::parse_qty;
use crate::keys::{ExceptionKey, ParentRef, UnitKey, UnitKind};

/// Shape shared by every receivable record kind.
///
/// One implementation per entity; the reconciliation logic is written once
/// against this trait (through [`UnitRecord`]) instead of per entity.
pub trait ReceivableRecord {
    const KIND: UnitKind;
    /// Name of the property carrying the receiving status code.
    const STATUS_FIELD: &'static str;
    /// The service reports a per-unit open quantity for this kind. When it
    /// does not, a blank quantity means nothing is left open.
    const TRACKS_OPEN_QTY: bool;

    fn key(&self) -> UnitKey;
    fn parent(&self) -> ParentRef;
    fn exception_key(&self) -> ExceptionKey;
    fn status(&self) -> &str;
    fn set_status(&mut self, code: &str);
    /// Raw open quantity string.
    fn open_qty_raw(&self) -> &str;
    fn set_open_qty_raw(&mut self, raw: String);

    /// `None` when the quantity cannot be read; such a unit is never
    /// fulfilled.
    fn open_qty(&self) -> Option<i64> {
        let raw = self.open_qty_raw();
        if !Self::TRACKS_OPEN_QTY && raw.trim().is_empty() {
            return Some(0);
        }
        parse_qty(raw)
    }
}

/// Pallet header (`PalletHeaderSet`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PalletHeader {
    #[serde(rename = "StoreID")]
    pub store_id: String,
    #[serde(rename = "WayBillNbr")]
    pub waybill_nbr: String,
    #[serde(rename = "PalletID")]
    pub pallet_id: String,
    #[serde(rename = "PalletStatus")]
    pub status: String,
    #[serde(rename = "OpenQty", default)]
    pub open_qty: String,
}

impl ReceivableRecord for PalletHeader {
    const KIND: UnitKind = UnitKind::Pallet;
    const STATUS_FIELD: &'static str = "PalletStatus";
    const TRACKS_OPEN_QTY: bool = false;

    fn key(&self) -> UnitKey {
        UnitKey::pallet(&self.store_id, &self.waybill_nbr, &self.pallet_id)
    }

    fn parent(&self) -> ParentRef {
        ParentRef::waybill(&self.store_id, &self.waybill_nbr)
    }

    fn exception_key(&self) -> ExceptionKey {
        ExceptionKey::new(
            &self.store_id,
            &self.waybill_nbr,
            Some(self.pallet_id.as_str()),
            None,
            None,
            None,
        )
    }

    fn status(&self) -> &str {
        &self.status
    }

    fn set_status(&mut self, code: &str) {
        self.status = code.to_string();
    }

    fn open_qty_raw(&self) -> &str {
        &self.open_qty
    }

    fn set_open_qty_raw(&mut self, raw: String) {
        self.open_qty = raw;
    }
}

/// Purchase order header (`POHeaderSet`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoHeader {
    #[serde(rename = "StoreID")]
    pub store_id: String,
    #[serde(rename = "WayBillNbr")]
    pub waybill_nbr: String,
    #[serde(rename = "PONbr")]
    pub po_nbr: String,
    #[serde(rename = "POStatus")]
    pub status: String,
    #[serde(rename = "OpenQty", default)]
    pub open_qty: String,
}

impl ReceivableRecord for PoHeader {
    const KIND: UnitKind = UnitKind::PurchaseOrder;
    const STATUS_FIELD: &'static str = "POStatus";
    const TRACKS_OPEN_QTY: bool = false;

    fn key(&self) -> UnitKey {
        UnitKey::purchase_order(&self.store_id, &self.waybill_nbr, &self.po_nbr)
    }

    fn parent(&self) -> ParentRef {
        ParentRef::waybill(&self.store_id, &self.waybill_nbr)
    }

    fn exception_key(&self) -> ExceptionKey {
        ExceptionKey::new(
            &self.store_id,
            &self.waybill_nbr,
            None,
            Some(self.po_nbr.as_str()),
            None,
            None,
        )
    }

    fn status(&self) -> &str {
        &self.status
    }

    fn set_status(&mut self, code: &str) {
        self.status = code.to_string();
    }

    fn open_qty_raw(&self) -> &str {
        &self.open_qty
    }

    fn set_open_qty_raw(&mut self, raw: String) {
        self.open_qty = raw;
    }
}

/// Purchase order item, shown on the device as an article (`POItemSet`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoItem {
    #[serde(rename = "StoreID")]
    pub store_id: String,
    #[serde(rename = "WayBillNbr")]
    pub waybill_nbr: String,
    #[serde(rename = "PONbr")]
    pub po_nbr: String,
    #[serde(rename = "ItemID")]
    pub item_id: String,
    #[serde(rename = "Article")]
    pub article: String,
    #[serde(rename = "PalletID", default)]
    pub pallet_id: String,
    #[serde(rename = "ItemStatus")]
    pub status: String,
    #[serde(rename = "OpenQty", default)]
    pub open_qty: String,
}

impl ReceivableRecord for PoItem {
    const KIND: UnitKind = UnitKind::Article;
    const STATUS_FIELD: &'static str = "ItemStatus";
    const TRACKS_OPEN_QTY: bool = true;

    fn key(&self) -> UnitKey {
        UnitKey::article(&self.store_id, &self.waybill_nbr, &self.po_nbr, &self.item_id)
    }

    fn parent(&self) -> ParentRef {
        ParentRef::PurchaseOrder {
            store_id: self.store_id.clone(),
            waybill_nbr: self.waybill_nbr.clone(),
            po_nbr: self.po_nbr.clone(),
        }
    }

    fn exception_key(&self) -> ExceptionKey {
        ExceptionKey::new(
            &self.store_id,
            &self.waybill_nbr,
            Some(self.pallet_id.as_str()),
            Some(self.po_nbr.as_str()),
            Some(self.item_id.as_str()),
            Some(self.article.as_str()),
        )
    }

    fn status(&self) -> &str {
        &self.status
    }

    fn set_status(&mut self, code: &str) {
        self.status = code.to_string();
    }

    fn open_qty_raw(&self) -> &str {
        &self.open_qty
    }

    fn set_open_qty_raw(&mut self, raw: String) {
        self.open_qty = raw;
    }
}

/// Any receivable record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "record", rename_all = "snake_case")]
pub enum UnitRecord {
    Pallet(PalletHeader),
    PurchaseOrder(PoHeader),
    Article(PoItem),
}

macro_rules! dispatch {
    ($self:expr, $rec:ident => $body:expr) => {
        match $self {
            UnitRecord::Pallet($rec) => $body,
            UnitRecord::PurchaseOrder($rec) => $body,
            UnitRecord::Article($rec) => $body,
        }
    };
}

impl UnitRecord {
    pub fn kind(&self) -> UnitKind {
        match self {
            UnitRecord::Pallet(_) => PalletHeader::KIND,
            UnitRecord::PurchaseOrder(_) => PoHeader::KIND,
            UnitRecord::Article(_) => PoItem::KIND,
        }
    }

    pub fn status_field(&self) -> &'static str {
        match self {
            UnitRecord::Pallet(_) => PalletHeader::STATUS_FIELD,
            UnitRecord::PurchaseOrder(_) => PoHeader::STATUS_FIELD,
            UnitRecord::Article(_) => PoItem::STATUS_FIELD,
        }
    }

    pub fn key(&self) -> UnitKey {
        dispatch!(self, r => r.key())
    }

    pub fn parent(&self) -> ParentRef {
        dispatch!(self, r => r.parent())
    }

    pub fn exception_key(&self) -> ExceptionKey {
        dispatch!(self, r => r.exception_key())
    }

    pub fn status(&self) -> &str {
        dispatch!(self, r => r.status())
    }

    pub fn set_status(&mut self, code: &str) {
        dispatch!(self, r => r.set_status(code))
    }

    pub fn open_qty(&self) -> Option<i64> {
        dispatch!(self, r => r.open_qty())
    }

    pub fn open_qty_raw(&self) -> &str {
        dispatch!(self, r => r.open_qty_raw())
    }

    pub fn set_open_qty_raw(&mut self, raw: String) {
        dispatch!(self, r => r.set_open_qty_raw(raw))
    }

    /// Article number for PO items.
    pub fn article(&self) -> Option<&str> {
        match self {
            UnitRecord::Article(item) => Some(&item.article),
            _ => None,
        }
    }
}

impl From<PalletHeader> for UnitRecord {
    fn from(r: PalletHeader) -> Self {
        UnitRecord::Pallet(r)
    }
}

impl From<PoHeader> for UnitRecord {
    fn from(r: PoHeader) -> Self {
        UnitRecord::PurchaseOrder(r)
    }
}

impl From<PoItem> for UnitRecord {
    fn from(r: PoItem) -> Self {
        UnitRecord::Article(r)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pallet_deserializes_from_service_payload() {
        let raw = r#"{"StoreID":"0012","WayBillNbr":"W100","PalletID":"P1","PalletStatus":"N"}"#;
        let p: PalletHeader = serde_json::from_str(raw).unwrap();
        assert_eq!(p.key(), UnitKey::pallet("0012", "W100", "P1"));
        assert_eq!(p.status(), "N");
        assert_eq!(p.open_qty_raw(), "");
        assert_eq!(p.open_qty(), Some(0), "headers without OpenQty have nothing open");
    }

    #[test]
    fn blank_open_qty_is_zero_for_headers_only() {
        let po: PoHeader = serde_json::from_str(
            r#"{"StoreID":"0012","WayBillNbr":"W100","PONbr":"4500001","POStatus":"N"}"#,
        )
        .unwrap();
        assert_eq!(po.open_qty(), Some(0));
        assert_eq!(UnitRecord::from(po.clone()).open_qty(), Some(0));

        let mut garbled = po;
        garbled.open_qty = "n/a".into();
        assert_eq!(garbled.open_qty(), None);

        let item: PoItem = serde_json::from_str(
            r#"{"StoreID":"0012","WayBillNbr":"W100","PONbr":"4500001",
                "ItemID":"00010","Article":"1000123","ItemStatus":"N"}"#,
        )
        .unwrap();
        assert_eq!(item.open_qty(), None, "an article without OpenQty is unknown");
    }

    #[test]
    fn article_exception_key_includes_pallet_and_article() {
        let item = PoItem {
            store_id: "12".into(),
            waybill_nbr: "W100".into(),
            po_nbr: "4500001".into(),
            item_id: "10".into(),
            article: "1000123".into(),
            pallet_id: String::new(),
            status: "R".into(),
            open_qty: "4.000".into(),
        };
        let k = item.exception_key();
        assert_eq!(k.store_id, "0012");
        assert_eq!(k.pallet, "");
        assert_eq!(k.item_id, "00010");
        assert_eq!(k.article, "1000123");
        assert_eq!(item.open_qty(), Some(4));
    }

    #[test]
    fn unit_record_dispatches_status_writes() {
        let mut r = UnitRecord::from(PoHeader {
            store_id: "0012".into(),
            waybill_nbr: "W100".into(),
            po_nbr: "4500001".into(),
            status: "N".into(),
            open_qty: "3".into(),
        });
        r.set_status("X");
        assert_eq!(r.status(), "X");
        assert_eq!(r.status_field(), "POStatus");
        assert_eq!(r.kind(), UnitKind::PurchaseOrder);
    }
}
