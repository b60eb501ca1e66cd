use serde::{Deserialize, Serialize};

use crate::format::parse_qty;
use crate::keys::ExceptionKey;

/// Exception (issue) type, keyed by the service's type code.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ExceptionType {
    Damaged,
    Shortage,
    Overage,
    Other(String),
}

impl ExceptionType {
    pub const DAMAGED_CODE: &'static str = "1--";
    pub const SHORTAGE_CODE: &'static str = "402";
    pub const OVERAGE_CODE: &'static str = "403";

    pub fn from_code(code: &str) -> Self {
        match code {
            Self::DAMAGED_CODE => ExceptionType::Damaged,
            Self::SHORTAGE_CODE => ExceptionType::Shortage,
            Self::OVERAGE_CODE => ExceptionType::Overage,
            other => ExceptionType::Other(other.to_string()),
        }
    }

    pub fn code(&self) -> &str {
        match self {
            ExceptionType::Damaged => Self::DAMAGED_CODE,
            ExceptionType::Shortage => Self::SHORTAGE_CODE,
            ExceptionType::Overage => Self::OVERAGE_CODE,
            ExceptionType::Other(code) => code,
        }
    }

    /// A quantity must be captured when reporting this type.
    pub fn is_qty_bearing(&self) -> bool {
        matches!(
            self,
            ExceptionType::Damaged | ExceptionType::Shortage | ExceptionType::Overage
        )
    }

    /// The recorded quantity counts against the unit's open quantity.
    ///
    /// Damaged is quantity-bearing but deliberately not included here.
    pub fn reduces_open_qty(&self) -> bool {
        matches!(self, ExceptionType::Shortage | ExceptionType::Overage)
    }
}

/// Exception record (`ExceptionSet`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExceptionRecord {
    #[serde(rename = "StoreID")]
    pub store_id: String,
    #[serde(rename = "WayBillNbr")]
    pub waybill_nbr: String,
    #[serde(rename = "Pallet", default)]
    pub pallet: String,
    #[serde(rename = "PONbr", default)]
    pub po_nbr: String,
    #[serde(rename = "ItemID", default)]
    pub item_id: String,
    #[serde(rename = "Article", default)]
    pub article: String,
    #[serde(rename = "Type")]
    pub type_code: String,
    #[serde(rename = "Qty", default)]
    pub qty: String,
    #[serde(rename = "Text", default)]
    pub text: String,
}

impl ExceptionRecord {
    /// Normalized lookup key; the stored fields may be unpadded.
    pub fn key(&self) -> ExceptionKey {
        ExceptionKey::new(
            &self.store_id,
            &self.waybill_nbr,
            Some(self.pallet.as_str()),
            Some(self.po_nbr.as_str()),
            Some(self.item_id.as_str()),
            Some(self.article.as_str()),
        )
    }

    pub fn exception_type(&self) -> ExceptionType {
        ExceptionType::from_code(&self.type_code)
    }

    pub fn qty_value(&self) -> Option<i64> {
        parse_qty(&self.qty)
    }

    /// Quantity this record subtracts from the unit's open quantity.
    ///
    /// Non-zero only for Shortage/Overage records with a positive quantity.
    pub fn reducing_qty(&self) -> i64 {
        if !self.exception_type().reduces_open_qty() {
            return 0;
        }
        match self.qty_value() {
            Some(q) if q > 0 => q,
            _ => 0,
        }
    }
}
