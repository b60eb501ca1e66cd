use rcv_schemas::ReceivableUnit;

use crate::types::{
    ReconcileError, ReviewState, STATUS_COMPLETE, STATUS_NEEDS_REVIEW,
    STATUS_NEEDS_SECONDARY_REVIEW,
};

/// Map a raw status code to a review state. Codes are matched exactly.
pub fn classify_code(code: &str) -> Option<ReviewState> {
    match code {
        STATUS_NEEDS_REVIEW => Some(ReviewState::NeedsReview),
        STATUS_NEEDS_SECONDARY_REVIEW => Some(ReviewState::NeedsSecondaryReview),
        STATUS_COMPLETE => Some(ReviewState::Complete),
        _ => None,
    }
}

/// Classify a unit by its status code.
///
/// Unknown codes are an integrity fault and never default to a bucket.
pub fn classify(unit: &ReceivableUnit) -> Result<ReviewState, ReconcileError> {
    classify_code(unit.status_code()).ok_or_else(|| ReconcileError::UnknownStatusCode {
        key: unit.key.clone(),
        code: unit.status_code().to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rcv_schemas::{PalletHeader, UnitRecord};

    fn pallet(status: &str) -> ReceivableUnit {
        ReceivableUnit::from(UnitRecord::from(PalletHeader {
            store_id: "0012".into(),
            waybill_nbr: "W100".into(),
            pallet_id: "P1".into(),
            status: status.into(),
            open_qty: String::new(),
        }))
    }

    #[test]
    fn known_codes_map_to_states() {
        assert_eq!(classify(&pallet("N")).unwrap(), ReviewState::NeedsReview);
        assert_eq!(
            classify(&pallet("R")).unwrap(),
            ReviewState::NeedsSecondaryReview
        );
        assert_eq!(classify(&pallet("X")).unwrap(), ReviewState::Complete);
    }

    #[test]
    fn unknown_code_is_an_error() {
        for code in ["", "n", "C", "XX"] {
            let err = classify(&pallet(code)).unwrap_err();
            assert!(
                matches!(err, ReconcileError::UnknownStatusCode { code: ref c, .. } if c == code),
                "code {code:?} must not classify"
            );
        }
    }
}
