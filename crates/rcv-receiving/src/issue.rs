use std::fmt;

use rcv_schemas::format::parse_qty;
use rcv_schemas::{ExceptionKey, ExceptionRecord, ExceptionType, UnitKey};
use serde::{Deserialize, Serialize};

/// A report-issue form as the user filled it in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueDraft {
    /// Unit the issue is reported against.
    pub unit: UnitKey,
    pub type_code: String,
    #[serde(default)]
    pub qty: String,
    #[serde(default)]
    pub text: String,
}

/// Why a draft was refused before reaching the service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum IssueRejected {
    TypeRequired,
    TextRequired,
    /// Quantity-bearing types need a positive numeric quantity.
    QtyRequired { type_code: String },
}

impl fmt::Display for IssueRejected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IssueRejected::TypeRequired => f.write_str("issue type is required"),
            IssueRejected::TextRequired => f.write_str("issue text is required"),
            IssueRejected::QtyRequired { type_code } => {
                write!(f, "a quantity above zero is required for issue type {type_code}")
            }
        }
    }
}

impl std::error::Error for IssueRejected {}

impl IssueDraft {
    /// Check the draft and return the quantity string to store.
    ///
    /// Non quantity-bearing types store `"0"`. Quantities must be digits and
    /// dots only, with a non-zero integer part.
    pub fn validate(&self) -> Result<String, IssueRejected> {
        let type_code = self.type_code.trim();
        if type_code.is_empty() {
            return Err(IssueRejected::TypeRequired);
        }
        if self.text.trim().is_empty() {
            return Err(IssueRejected::TextRequired);
        }

        if !ExceptionType::from_code(type_code).is_qty_bearing() {
            return Ok("0".to_string());
        }

        let qty = self.qty.trim();
        let well_formed = !qty.is_empty() && qty.chars().all(|c| c.is_ascii_digit() || c == '.');
        let positive = matches!(parse_qty(qty), Some(q) if q > 0);
        let normalized = qty.parse::<f64>().ok().map(|v| v.to_string());
        match normalized {
            Some(n) if well_formed && positive => Ok(n),
            _ => Err(IssueRejected::QtyRequired {
                type_code: type_code.to_string(),
            }),
        }
    }

    /// Build the record to upsert. `key` is the unit's exception key.
    pub fn into_record(self, key: &ExceptionKey) -> Result<ExceptionRecord, IssueRejected> {
        let qty = self.validate()?;
        Ok(ExceptionRecord {
            store_id: key.store_id.clone(),
            waybill_nbr: key.waybill_nbr.clone(),
            pallet: key.pallet.clone(),
            po_nbr: key.po_nbr.clone(),
            item_id: key.item_id.clone(),
            article: key.article.clone(),
            type_code: self.type_code.trim().to_string(),
            qty,
            text: self.text.trim().to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(type_code: &str, qty: &str, text: &str) -> IssueDraft {
        IssueDraft {
            unit: UnitKey::article("0012", "W100", "4500001", "00010"),
            type_code: type_code.into(),
            qty: qty.into(),
            text: text.into(),
        }
    }

    #[test]
    fn type_and_text_are_required() {
        assert_eq!(draft("", "1", "t").validate(), Err(IssueRejected::TypeRequired));
        assert_eq!(draft("402", "1", "  ").validate(), Err(IssueRejected::TextRequired));
    }

    #[test]
    fn qty_bearing_types_need_positive_qty() {
        for code in ["1--", "402", "403"] {
            for bad in ["", "0", "0.5", "-2", "abc", "1e3"] {
                assert!(
                    matches!(
                        draft(code, bad, "box crushed").validate(),
                        Err(IssueRejected::QtyRequired { .. })
                    ),
                    "{code} with qty {bad:?} must be refused"
                );
            }
            assert_eq!(draft(code, "3", "short").validate().unwrap(), "3");
        }
        assert_eq!(draft("402", "2.500", "x").validate().unwrap(), "2.5");
    }

    #[test]
    fn other_types_store_zero() {
        assert_eq!(draft("900", "", "wrong carrier").validate().unwrap(), "0");
    }

    #[test]
    fn record_takes_the_unit_exception_key() {
        let key = ExceptionKey::new("12", "W100", None, Some("4500001"), Some("10"), Some("1000123"));
        let rec = draft("402", "2", "short").into_record(&key).unwrap();
        assert_eq!(rec.key(), key);
        assert_eq!(rec.reducing_qty(), 2);
    }
}
