//! Scenario: completion arriving after the screen is gone
//!
//! # Invariants under test
//!
//! 1. A detached submission that resolves after `close()` is discarded: no
//!    notice, no panic, no state resurrected.
//! 2. The same holds when the controller is dropped instead of closed.
//! 3. Every operation on a closed screen reports `Closed`.

use std::sync::Arc;

use rcv_receiving::{CollectionId, ReceivingError, Submission};
use rcv_service_mem::InMemoryReceivingService;
use rcv_testkit::*;

fn service() -> Arc<InMemoryReceivingService> {
    let svc = Arc::new(InMemoryReceivingService::new());
    svc.insert_waybill(waybill(true));
    svc.insert_unit(pallet("P1", "N", "4"));
    svc.hold_updates();
    svc
}

#[tokio::test]
async fn completion_after_close_is_a_no_op() {
    let svc = service();
    let notifier = RecordingNotifier::shared();
    let ctl = open(&svc, &notifier).await.unwrap();
    notifier.take();

    let pending = ctl.submit_detached(pallet_key("P1"));
    wait_for_updates(&svc, 1).await;

    ctl.close().await;
    assert!(!ctl.is_open().await);

    svc.release_updates(1);
    let outcome = pending.await.unwrap().unwrap();
    assert_eq!(
        outcome,
        Submission::Discarded {
            key: pallet_key("P1")
        }
    );
    assert!(notifier.notices().is_empty(), "closed screen must stay silent");
    assert!(ctl.unit(&pallet_key("P1")).await.is_none());
}

#[tokio::test]
async fn completion_after_drop_is_a_no_op() {
    let svc = service();
    let notifier = RecordingNotifier::shared();
    let ctl = open(&svc, &notifier).await.unwrap();
    notifier.take();

    let pending = ctl.submit_detached(pallet_key("P1"));
    wait_for_updates(&svc, 1).await;
    drop(ctl);

    svc.release_updates(1);
    let outcome = pending.await.unwrap().unwrap();
    assert!(matches!(outcome, Submission::Discarded { .. }));
    assert!(notifier.notices().is_empty());
}

#[tokio::test]
async fn closed_screen_refuses_work() {
    let svc = service();
    let notifier = RecordingNotifier::shared();
    let ctl = open(&svc, &notifier).await.unwrap();
    ctl.close().await;

    assert!(matches!(
        ctl.submit(&pallet_key("P1")).await,
        Err(ReceivingError::Closed)
    ));
    assert!(matches!(
        ctl.load_pallets().await,
        Err(ReceivingError::Closed)
    ));
    assert!(matches!(
        ctl.counts(&CollectionId::Pallets).await,
        Err(ReceivingError::Closed)
    ));
    assert!(matches!(ctl.scan("P1").await, Err(ReceivingError::Closed)));
    assert_eq!(svc.update_calls(), 0);
}
