//! Scenario: driver check-in of an in-transit shipment
//!
//! # Invariants under test
//!
//! 1. Check-in moves an in-transit waybill to pending with action code "03",
//!    records the arrival and flags whether the seal matched; the service
//!    holds the written header.
//! 2. A shipment that is not in transit is refused without a write.
//! 3. A failed write is an error notice and leaves the service untouched.

use std::sync::Arc;

use chrono::{TimeZone, Utc};
use rcv_receiving::{check_in_waybill, Notice, ReceivingError, ReceivingService, RemoteError};
use rcv_schemas::{DriverCheckIn, Waybill, ENTRY_STATUS_IN_TRANSIT};
use rcv_service_mem::InMemoryReceivingService;
use rcv_testkit::*;

fn in_transit() -> Waybill {
    Waybill {
        entry_status: ENTRY_STATUS_IN_TRANSIT.into(),
        seal_nbr_wms: "S-778".into(),
        ..waybill(true)
    }
}

fn arrival(seal: &str, ref_number: Option<&str>) -> DriverCheckIn {
    DriverCheckIn {
        arrived_at: Utc.with_ymd_and_hms(2024, 3, 7, 6, 30, 0).unwrap(),
        seal_nbr_site: seal.into(),
        seal_intact: true,
        seal_decertify: false,
        ref_number: ref_number.map(str::to_string),
    }
}

#[tokio::test]
async fn check_in_writes_pending_header() {
    let svc = Arc::new(InMemoryReceivingService::new());
    svc.insert_waybill(in_transit());
    let notifier = RecordingNotifier::shared();

    let saved = check_in_waybill(
        svc.as_ref(),
        notifier.as_ref(),
        STORE,
        WAYBILL,
        &arrival("S-778", Some("R-42")),
    )
    .await
    .unwrap();

    assert_eq!(saved.entry_status, "P");
    assert_eq!(saved.action_code, "03");
    assert!(saved.seal_matches());
    assert_eq!(saved.seal_intact, "X");

    let stored = svc.read_waybill(STORE, WAYBILL).await.unwrap();
    assert_eq!(stored, saved);
    assert!(!stored.needs_check_in());
    assert_eq!(
        notifier.notices(),
        vec![Notice::CheckedIn {
            store_id: STORE.into(),
            waybill_nbr: WAYBILL.into(),
            seal_match: true,
            ref_number: Some("R-42".into()),
        }]
    );

    // The screen opens normally afterwards.
    let ctl = open(&svc, &notifier).await.unwrap();
    assert_eq!(ctl.waybill().await.unwrap().stage_label(), "Waiting for DGR");
}

#[tokio::test]
async fn wrong_seal_is_recorded_as_mismatch() {
    let svc = Arc::new(InMemoryReceivingService::new());
    svc.insert_waybill(in_transit());
    let notifier = RecordingNotifier::shared();

    let saved = check_in_waybill(
        svc.as_ref(),
        notifier.as_ref(),
        STORE,
        WAYBILL,
        &arrival("S-000", None),
    )
    .await
    .unwrap();
    assert!(!saved.seal_matches());
    assert_eq!(saved.seal_nbr_site, "S-000");
    assert!(notifier.notices().contains(&Notice::CheckedIn {
        store_id: STORE.into(),
        waybill_nbr: WAYBILL.into(),
        seal_match: false,
        ref_number: None,
    }));
}

#[tokio::test]
async fn arrived_shipment_is_refused() {
    let svc = Arc::new(InMemoryReceivingService::new());
    svc.insert_waybill(waybill(true));
    svc.fail_waybill_writes(RemoteError::http(500, "must not be called", Vec::new()));
    let notifier = RecordingNotifier::shared();

    let res = check_in_waybill(
        svc.as_ref(),
        notifier.as_ref(),
        STORE,
        WAYBILL,
        &arrival("S-778", None),
    )
    .await;
    assert!(matches!(res, Err(ReceivingError::NotInTransit { .. })), "got {res:?}");
    assert_eq!(
        notifier.count(|n| matches!(n, Notice::CheckInNotRequired { .. })),
        1
    );
    assert_eq!(svc.read_waybill(STORE, WAYBILL).await.unwrap(), waybill(true));
}

#[tokio::test]
async fn failed_write_keeps_shipment_in_transit() {
    let svc = Arc::new(InMemoryReceivingService::new());
    svc.insert_waybill(in_transit());
    svc.fail_waybill_writes(RemoteError::http(503, "Service Unavailable", Vec::new()));
    let notifier = RecordingNotifier::shared();

    let res = check_in_waybill(
        svc.as_ref(),
        notifier.as_ref(),
        STORE,
        WAYBILL,
        &arrival("S-778", None),
    )
    .await;
    assert!(matches!(res, Err(ReceivingError::Remote(_))), "got {res:?}");
    assert_eq!(notifier.count(Notice::is_error), 1);
    assert!(svc.read_waybill(STORE, WAYBILL).await.unwrap().needs_check_in());
}
