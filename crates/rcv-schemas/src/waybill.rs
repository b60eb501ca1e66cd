use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::keys::ParentRef;

/// Waybill action code: shipment is waiting for RGR.
pub const ACTION_RGR: &str = "01";
/// Waybill action code: returns.
pub const ACTION_RETURNS: &str = "02";
/// Waybill action code: shipment is waiting for DGR. Written by driver
/// check-in.
pub const ACTION_DGR: &str = "03";
/// Waybill action code: everything received.
pub const ACTION_DONE: &str = "04";

/// Entry status written when every unit of the waybill is received.
pub const ENTRY_STATUS_COMPLETE: &str = "C";
/// Entry status of a shipment still on the road; the driver has not checked in.
pub const ENTRY_STATUS_IN_TRANSIT: &str = "I";
/// Entry status written by driver check-in.
pub const ENTRY_STATUS_PENDING: &str = "P";

/// Boolean flag as the service ships it.
const FLAG_SET: &str = "X";

fn flag(value: bool) -> String {
    let raw = if value { FLAG_SET } else { "" };
    raw.to_string()
}

/// What the driver reports when the truck arrives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriverCheckIn {
    pub arrived_at: DateTime<Utc>,
    /// Seal number read off the trailer at the dock.
    pub seal_nbr_site: String,
    pub seal_intact: bool,
    pub seal_decertify: bool,
    /// Reference handed back to the driver, if the dock issued one.
    #[serde(default)]
    pub ref_number: Option<String>,
}

/// Shipment document (`BOLSet`), root parent of pallets and purchase orders.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Waybill {
    #[serde(rename = "StoreID")]
    pub store_id: String,
    #[serde(rename = "WayBillNbr")]
    pub waybill_nbr: String,
    /// `"X"` for a sealed, pallet-driven shipment.
    #[serde(rename = "Seal", default)]
    pub seal: String,
    #[serde(rename = "EntryStatus", default)]
    pub entry_status: String,
    #[serde(rename = "ActionCode", default)]
    pub action_code: String,
    #[serde(rename = "Carrier", default)]
    pub carrier: String,
    #[serde(rename = "ScheduledDate", default, with = "crate::format::service_date")]
    pub scheduled_at: Option<DateTime<Utc>>,
    #[serde(rename = "ArrivedDate", default, with = "crate::format::service_date")]
    pub arrived_at: Option<DateTime<Utc>>,
    /// Seal number the warehouse expects on the trailer.
    #[serde(rename = "SealNbrWms", default)]
    pub seal_nbr_wms: String,
    #[serde(rename = "SealNbrSite", default)]
    pub seal_nbr_site: String,
    /// `"X"` when the seal read at the dock matched the expected one.
    #[serde(rename = "SealMatch", default)]
    pub seal_match: String,
    #[serde(rename = "SealIntact", default)]
    pub seal_intact: String,
    #[serde(rename = "SealDecertify", default)]
    pub seal_decertify: String,
    #[serde(rename = "ArrivedTimeStamp", default, with = "crate::format::service_date")]
    pub checked_in_at: Option<DateTime<Utc>>,
}

impl Waybill {
    /// Pallets are the primary collection of a sealed shipment; purchase
    /// orders are primary otherwise.
    pub fn is_pallet_driven(&self) -> bool {
        self.seal == "X"
    }

    pub fn is_complete(&self) -> bool {
        self.entry_status == ENTRY_STATUS_COMPLETE && self.action_code == ACTION_DONE
    }

    /// Write the completion status. Returns `true` if anything changed.
    pub fn mark_complete(&mut self) -> bool {
        if self.is_complete() {
            return false;
        }
        self.entry_status = ENTRY_STATUS_COMPLETE.to_string();
        self.action_code = ACTION_DONE.to_string();
        true
    }

    pub fn needs_check_in(&self) -> bool {
        self.entry_status == ENTRY_STATUS_IN_TRANSIT
    }

    /// Record the driver's arrival. Returns `false`, changing nothing, when
    /// the shipment is not waiting for check-in.
    pub fn check_in(&mut self, check_in: &DriverCheckIn) -> bool {
        if !self.needs_check_in() {
            return false;
        }
        self.entry_status = ENTRY_STATUS_PENDING.to_string();
        self.action_code = ACTION_DGR.to_string();
        self.checked_in_at = Some(check_in.arrived_at);
        self.seal_nbr_site = check_in.seal_nbr_site.clone();
        self.seal_match = flag(check_in.seal_nbr_site == self.seal_nbr_wms);
        self.seal_intact = flag(check_in.seal_intact);
        self.seal_decertify = flag(check_in.seal_decertify);
        true
    }

    pub fn seal_matches(&self) -> bool {
        self.seal_match == FLAG_SET
    }

    pub fn as_parent(&self) -> ParentRef {
        ParentRef::waybill(&self.store_id, &self.waybill_nbr)
    }

    /// Header label for the current action code.
    pub fn stage_label(&self) -> &'static str {
        match self.action_code.as_str() {
            ACTION_RGR => "Waiting for RGR",
            ACTION_RETURNS => "Returns",
            ACTION_DGR => "Waiting for DGR",
            ACTION_DONE => "Received",
            _ => "",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn deserializes_with_defaults_and_completes_once() {
        let raw = r#"{"StoreID":"0012","WayBillNbr":"W100","Seal":"X","ActionCode":"01"}"#;
        let mut wb: Waybill = serde_json::from_str(raw).unwrap();
        assert!(wb.is_pallet_driven());
        assert!(!wb.is_complete());
        assert_eq!(wb.stage_label(), "Waiting for RGR");
        assert!(wb.scheduled_at.is_none());

        assert!(wb.mark_complete());
        assert_eq!(wb.entry_status, "C");
        assert_eq!(wb.action_code, "04");
        assert!(!wb.mark_complete());
    }

    fn arrival(seal: &str) -> DriverCheckIn {
        DriverCheckIn {
            arrived_at: Utc.with_ymd_and_hms(2024, 3, 7, 6, 30, 0).unwrap(),
            seal_nbr_site: seal.into(),
            seal_intact: true,
            seal_decertify: false,
            ref_number: None,
        }
    }

    #[test]
    fn check_in_moves_in_transit_shipment_to_pending() {
        let raw = r#"{"StoreID":"0012","WayBillNbr":"W100","EntryStatus":"I",
                      "ActionCode":"01","SealNbrWms":"S-778"}"#;
        let mut wb: Waybill = serde_json::from_str(raw).unwrap();
        assert!(wb.needs_check_in());

        assert!(wb.check_in(&arrival("S-778")));
        assert_eq!(wb.entry_status, "P");
        assert_eq!(wb.action_code, "03");
        assert_eq!(wb.stage_label(), "Waiting for DGR");
        assert!(wb.seal_matches());
        assert_eq!(wb.seal_intact, "X");
        assert_eq!(wb.seal_decertify, "");
        assert!(wb.checked_in_at.is_some());

        assert!(!wb.check_in(&arrival("S-778")), "only once");
    }

    #[test]
    fn mismatched_seal_is_flagged_blank() {
        let mut wb = Waybill {
            entry_status: ENTRY_STATUS_IN_TRANSIT.into(),
            seal_nbr_wms: "S-778".into(),
            ..Waybill::default()
        };
        assert!(wb.check_in(&arrival("S-779")));
        assert_eq!(wb.seal_match, "");
        assert_eq!(wb.seal_nbr_site, "S-779");
    }

    #[test]
    fn arrived_shipment_is_not_checked_in_again() {
        let mut wb = Waybill {
            entry_status: ENTRY_STATUS_PENDING.into(),
            action_code: ACTION_RGR.into(),
            ..Waybill::default()
        };
        assert!(!wb.needs_check_in());
        assert!(!wb.check_in(&arrival("")));
        assert_eq!(wb.action_code, "01");
    }
}
