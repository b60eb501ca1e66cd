//! Scenario: reloads and escalation while a submission is in flight
//!
//! # Invariants under test
//!
//! 1. Reloading a collection keeps a unit with a submission in flight busy;
//!    a second submit is refused and never reaches the service.
//! 2. When the reload already shows the unit complete, the late outcome is
//!    dropped with an "already complete" notice instead of an error.
//! 3. A PO with a submission in flight is not escalated when its articles
//!    settle; once its own outcome lands the escalation runs.

use std::sync::Arc;

use rcv_reconcile::{ReconcileError, ReviewState, TransitionNotice};
use rcv_receiving::{CollectionId, Notice, ReceivingError, Submission};
use rcv_service_mem::{InMemoryReceivingService, ScriptedOutcome};
use rcv_testkit::*;

#[tokio::test]
async fn reload_does_not_reopen_an_in_flight_unit() {
    let svc = Arc::new(InMemoryReceivingService::new());
    svc.insert_waybill(waybill(true));
    svc.insert_unit(pallet("P1", "N", "4"));
    svc.insert_unit(pallet("P2", "N", "1"));
    svc.hold_updates();

    let notifier = RecordingNotifier::shared();
    let ctl = open(&svc, &notifier).await.unwrap();
    let key = pallet_key("P1");

    let first = ctl.submit_detached(key.clone());
    wait_for_updates(&svc, 1).await;

    ctl.load_pallets().await.unwrap();
    assert!(ctl.unit(&key).await.unwrap().busy, "reload must keep P1 busy");
    assert!(!ctl.unit(&pallet_key("P2")).await.unwrap().busy);

    let second = ctl.submit(&key).await;
    assert!(
        matches!(
            second,
            Err(ReceivingError::Reconcile(ReconcileError::UnitBusy { .. }))
        ),
        "got {second:?}"
    );
    assert_eq!(svc.update_calls(), 1);
    assert_eq!(notifier.count(|n| matches!(n, Notice::InProcess { .. })), 1);

    svc.release_updates(1);
    let resolved = first.await.unwrap().unwrap();
    assert_eq!(resolved.report().unwrap().to, ReviewState::Complete);
    let unit = ctl.unit(&key).await.unwrap();
    assert!(!unit.busy);
    assert_eq!(unit.status_code(), "X");
}

#[tokio::test]
async fn outcome_after_reload_shows_unit_complete_is_dropped() {
    let svc = Arc::new(InMemoryReceivingService::new());
    svc.insert_waybill(waybill(true));
    svc.insert_unit(pallet("P1", "N", "4"));
    svc.hold_updates();

    let notifier = RecordingNotifier::shared();
    let ctl = open(&svc, &notifier).await.unwrap();
    let key = pallet_key("P1");

    let first = ctl.submit_detached(key.clone());
    wait_for_updates(&svc, 1).await;

    // Received from another device meanwhile.
    svc.insert_unit(pallet("P1", "X", "0"));
    ctl.load_pallets().await.unwrap();
    let unit = ctl.unit(&key).await.unwrap();
    assert!(unit.busy);
    assert_eq!(unit.status_code(), "X");

    svc.release_updates(1);
    let resolved = first.await.unwrap().unwrap();
    let report = resolved.report().unwrap();
    assert_eq!(report.notice, TransitionNotice::AlreadyComplete);
    assert!(!report.moved());

    assert!(!ctl.unit(&key).await.unwrap().busy);
    assert_eq!(
        notifier.count(|n| *n == Notice::AlreadyComplete { key: key.clone() }),
        1
    );
    assert_eq!(notifier.count(Notice::is_error), 0);
    let counts = ctl.counts(&CollectionId::Pallets).await.unwrap();
    assert_eq!(counts.complete, 1);
}

#[tokio::test]
async fn busy_po_waits_for_its_own_outcome_before_escalating() {
    let svc = Arc::new(InMemoryReceivingService::new());
    svc.insert_waybill(waybill(false));
    svc.insert_unit(purchase_order("4500001", "N", "5"));
    svc.insert_unit(article("4500001", "00010", "1000123", "N", "2"));
    svc.script(
        po_key("4500001"),
        ScriptedOutcome::ReceivePartial { remaining: 3 },
    );

    let notifier = RecordingNotifier::shared();
    let ctl = open(&svc, &notifier).await.unwrap();
    ctl.load_articles("4500001").await.unwrap();
    svc.hold_updates();

    let po_submit = ctl.submit_detached(po_key("4500001"));
    wait_for_updates(&svc, 1).await;

    // The article was received elsewhere; the reload settles the PO's list.
    svc.insert_unit(article("4500001", "00010", "1000123", "X", "0"));
    ctl.load_articles("4500001").await.unwrap();

    let po = ctl.unit(&po_key("4500001")).await.unwrap();
    assert!(po.busy);
    assert_eq!(po.status_code(), "N", "busy PO must not be escalated");
    assert_eq!(
        notifier.count(|n| matches!(n, Notice::PurchaseOrderComplete { .. })),
        0
    );

    svc.release_updates(1);
    match po_submit.await.unwrap().unwrap() {
        Submission::Applied { report, escalation } => {
            assert_eq!(report.from, ReviewState::NeedsReview);
            assert_eq!(report.to, ReviewState::NeedsSecondaryReview);
            assert_eq!(escalation.purchase_order, Some(po_key("4500001")));
        }
        other => panic!("expected applied submission, got {other:?}"),
    }

    let po = ctl.unit(&po_key("4500001")).await.unwrap();
    assert!(!po.busy);
    assert_eq!(po.status_code(), "X");
    assert_eq!(
        notifier.count(|n| matches!(n, Notice::PurchaseOrderComplete { .. })),
        1
    );
}
