use std::fmt;

use serde::{Deserialize, Serialize};

use crate::format::{
    add_leading_zeros, placeholder_to_empty, ITEM_ID_WIDTH, STORE_ID_WIDTH,
};

/// The three kinds of receivable unit a waybill can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitKind {
    Pallet,
    PurchaseOrder,
    Article,
}

impl UnitKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnitKind::Pallet => "pallet",
            UnitKind::PurchaseOrder => "purchase_order",
            UnitKind::Article => "article",
        }
    }

    /// OData entity set holding records of this kind.
    pub fn entity_set(&self) -> &'static str {
        match self {
            UnitKind::Pallet => "PalletHeaderSet",
            UnitKind::PurchaseOrder => "POHeaderSet",
            UnitKind::Article => "POItemSet",
        }
    }
}

impl fmt::Display for UnitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unit-specific part of a [`UnitKey`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum UnitRef {
    Pallet { pallet_id: String },
    PurchaseOrder { po_nbr: String },
    Article { po_nbr: String, item_id: String },
}

/// Composite identity of a receivable unit.
///
/// Unique within a collection; two records with equal keys in one load are
/// a data-integrity fault.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UnitKey {
    pub store_id: String,
    pub waybill_nbr: String,
    pub unit: UnitRef,
}

impl UnitKey {
    pub fn pallet(
        store_id: impl Into<String>,
        waybill_nbr: impl Into<String>,
        pallet_id: impl Into<String>,
    ) -> Self {
        Self {
            store_id: store_id.into(),
            waybill_nbr: waybill_nbr.into(),
            unit: UnitRef::Pallet {
                pallet_id: pallet_id.into(),
            },
        }
    }

    pub fn purchase_order(
        store_id: impl Into<String>,
        waybill_nbr: impl Into<String>,
        po_nbr: impl Into<String>,
    ) -> Self {
        Self {
            store_id: store_id.into(),
            waybill_nbr: waybill_nbr.into(),
            unit: UnitRef::PurchaseOrder {
                po_nbr: po_nbr.into(),
            },
        }
    }

    pub fn article(
        store_id: impl Into<String>,
        waybill_nbr: impl Into<String>,
        po_nbr: impl Into<String>,
        item_id: impl Into<String>,
    ) -> Self {
        Self {
            store_id: store_id.into(),
            waybill_nbr: waybill_nbr.into(),
            unit: UnitRef::Article {
                po_nbr: po_nbr.into(),
                item_id: item_id.into(),
            },
        }
    }

    pub fn kind(&self) -> UnitKind {
        match self.unit {
            UnitRef::Pallet { .. } => UnitKind::Pallet,
            UnitRef::PurchaseOrder { .. } => UnitKind::PurchaseOrder,
            UnitRef::Article { .. } => UnitKind::Article,
        }
    }

    /// The identifier a user scans or reads on screen.
    pub fn label(&self) -> &str {
        match &self.unit {
            UnitRef::Pallet { pallet_id } => pallet_id,
            UnitRef::PurchaseOrder { po_nbr } => po_nbr,
            UnitRef::Article { item_id, .. } => item_id,
        }
    }

    /// PO number for purchase orders and their articles.
    pub fn po_nbr(&self) -> Option<&str> {
        match &self.unit {
            UnitRef::PurchaseOrder { po_nbr } | UnitRef::Article { po_nbr, .. } => Some(po_nbr),
            UnitRef::Pallet { .. } => None,
        }
    }

    /// Key properties in the order the service declares them.
    pub fn key_fields(&self) -> Vec<(&'static str, String)> {
        let mut fields = vec![
            ("StoreID", self.store_id.clone()),
            ("WayBillNbr", self.waybill_nbr.clone()),
        ];
        match &self.unit {
            UnitRef::Pallet { pallet_id } => fields.push(("PalletID", pallet_id.clone())),
            UnitRef::PurchaseOrder { po_nbr } => fields.push(("PONbr", po_nbr.clone())),
            UnitRef::Article { po_nbr, item_id } => {
                fields.push(("PONbr", po_nbr.clone()));
                fields.push(("ItemID", item_id.clone()));
            }
        }
        fields
    }
}

impl fmt::Display for UnitKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.unit {
            UnitRef::Pallet { pallet_id } => {
                write!(f, "{}/{}/pallet:{}", self.store_id, self.waybill_nbr, pallet_id)
            }
            UnitRef::PurchaseOrder { po_nbr } => {
                write!(f, "{}/{}/po:{}", self.store_id, self.waybill_nbr, po_nbr)
            }
            UnitRef::Article { po_nbr, item_id } => write!(
                f,
                "{}/{}/po:{}/item:{}",
                self.store_id, self.waybill_nbr, po_nbr, item_id
            ),
        }
    }
}

/// Parent entity of a receivable unit.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ParentRef {
    Waybill {
        store_id: String,
        waybill_nbr: String,
    },
    PurchaseOrder {
        store_id: String,
        waybill_nbr: String,
        po_nbr: String,
    },
}

impl ParentRef {
    pub fn waybill(store_id: impl Into<String>, waybill_nbr: impl Into<String>) -> Self {
        ParentRef::Waybill {
            store_id: store_id.into(),
            waybill_nbr: waybill_nbr.into(),
        }
    }

    pub fn store_id(&self) -> &str {
        match self {
            ParentRef::Waybill { store_id, .. } | ParentRef::PurchaseOrder { store_id, .. } => {
                store_id
            }
        }
    }

    pub fn waybill_nbr(&self) -> &str {
        match self {
            ParentRef::Waybill { waybill_nbr, .. }
            | ParentRef::PurchaseOrder { waybill_nbr, .. } => waybill_nbr,
        }
    }

    /// The parent as a unit key, when the parent is itself receivable.
    pub fn as_unit_key(&self) -> Option<UnitKey> {
        match self {
            ParentRef::Waybill { .. } => None,
            ParentRef::PurchaseOrder {
                store_id,
                waybill_nbr,
                po_nbr,
            } => Some(UnitKey::purchase_order(
                store_id.clone(),
                waybill_nbr.clone(),
                po_nbr.clone(),
            )),
        }
    }
}

/// Lookup key of an exception (issue) record.
///
/// Always built through [`ExceptionKey::new`] so padding and placeholder
/// rules are applied identically on write and on lookup.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ExceptionKey {
    pub store_id: String,
    pub waybill_nbr: String,
    pub pallet: String,
    pub po_nbr: String,
    pub item_id: String,
    pub article: String,
}

impl ExceptionKey {
    pub fn new(
        store_id: &str,
        waybill_nbr: &str,
        pallet: Option<&str>,
        po_nbr: Option<&str>,
        item_id: Option<&str>,
        article: Option<&str>,
    ) -> Self {
        Self {
            store_id: add_leading_zeros(store_id, STORE_ID_WIDTH),
            waybill_nbr: waybill_nbr.to_string(),
            pallet: placeholder_to_empty(pallet),
            po_nbr: placeholder_to_empty(po_nbr),
            item_id: add_leading_zeros(&placeholder_to_empty(item_id), ITEM_ID_WIDTH),
            article: placeholder_to_empty(article),
        }
    }
}

impl fmt::Display for ExceptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}/{}/{}/{}",
            self.store_id, self.waybill_nbr, self.pallet, self.po_nbr, self.item_id, self.article
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_display_is_stable() {
        let k = UnitKey::article("0012", "W100", "4500001", "00010");
        assert_eq!(k.to_string(), "0012/W100/po:4500001/item:00010");
        assert_eq!(k.kind(), UnitKind::Article);
        assert_eq!(k.label(), "00010");
        assert_eq!(k.po_nbr(), Some("4500001"));
    }

    #[test]
    fn key_fields_follow_entity_shape() {
        let k = UnitKey::pallet("0012", "W100", "P1");
        let names: Vec<&str> = k.key_fields().iter().map(|(n, _)| *n).collect();
        assert_eq!(names, vec!["StoreID", "WayBillNbr", "PalletID"]);

        let k = UnitKey::article("0012", "W100", "4500001", "00010");
        let names: Vec<&str> = k.key_fields().iter().map(|(n, _)| *n).collect();
        assert_eq!(names, vec!["StoreID", "WayBillNbr", "PONbr", "ItemID"]);
    }

    #[test]
    fn exception_key_normalizes_padding_and_placeholders() {
        let a = ExceptionKey::new("12", "W100", Some("X"), Some("4500001"), Some("10"), None);
        assert_eq!(a.store_id, "0012");
        assert_eq!(a.pallet, "");
        assert_eq!(a.item_id, "00010");
        assert_eq!(a.article, "");

        let b = ExceptionKey::new("0012", "W100", None, Some("4500001"), Some("00010"), Some("X"));
        assert_eq!(a, b);
    }

    #[test]
    fn article_parent_maps_back_to_po_key() {
        let parent = ParentRef::PurchaseOrder {
            store_id: "0012".into(),
            waybill_nbr: "W100".into(),
            po_nbr: "4500001".into(),
        };
        assert_eq!(
            parent.as_unit_key(),
            Some(UnitKey::purchase_order("0012", "W100", "4500001"))
        );
        assert_eq!(ParentRef::waybill("0012", "W100").as_unit_key(), None);
    }
}
