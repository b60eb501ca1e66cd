use rcv_reconcile::*;
use rcv_schemas::{PalletHeader, PoHeader, UnitKey, UnitKind, UnitRecord};

fn po(nbr: &str, status: &str, open_qty: &str) -> UnitRecord {
    UnitRecord::from(PoHeader {
        store_id: "0012".into(),
        waybill_nbr: "W100".into(),
        po_nbr: nbr.into(),
        status: status.into(),
        open_qty: open_qty.into(),
    })
}

fn pallet(id: &str, status: &str) -> UnitRecord {
    UnitRecord::from(PalletHeader {
        store_id: "0012".into(),
        waybill_nbr: "W100".into(),
        pallet_id: id.into(),
        status: status.into(),
        open_qty: "0".into(),
    })
}

#[test]
fn scenario_waybill_completes_only_when_both_siblings_settle() {
    let (mut pallets, _) =
        BucketedCollection::load_records(UnitKind::Pallet, vec![pallet("P1", "N")]).unwrap();
    let (mut pos, _) = BucketedCollection::load_records(
        UnitKind::PurchaseOrder,
        vec![po("4500001", "N", "5")],
    )
    .unwrap();
    let book = ExceptionBook::new();

    let key = UnitKey::pallet("0012", "W100", "P1");
    let ticket = begin_submit(&mut pallets, &key).unwrap();
    apply_outcome(
        &mut pallets,
        &book,
        &ticket,
        SubmitOutcome::Success(pallet("P1", "N")),
    )
    .unwrap();

    assert!(pallets.is_settled());
    assert!(
        !is_parent_complete(&[&pallets, &pos]),
        "POs still need review"
    );

    let key = UnitKey::purchase_order("0012", "W100", "4500001");
    let ticket = begin_submit(&mut pos, &key).unwrap();
    apply_outcome(
        &mut pos,
        &book,
        &ticket,
        SubmitOutcome::BusinessRuleFailure {
            message: "DGR failed".into(),
        },
    )
    .unwrap();
    assert!(!is_parent_complete(&[&pallets, &pos]));

    let ticket = begin_submit(&mut pos, &key).unwrap();
    let report = apply_outcome(
        &mut pos,
        &book,
        &ticket,
        SubmitOutcome::Success(po("4500001", "R", "0")),
    )
    .unwrap();
    assert_eq!(report.from, ReviewState::NeedsSecondaryReview);
    assert!(report.completed());
    assert!(is_parent_complete(&[&pallets, &pos]));
}

#[test]
fn scenario_technical_failure_after_business_failure_keeps_secondary_review() {
    let (mut pos, _) = BucketedCollection::load_records(
        UnitKind::PurchaseOrder,
        vec![po("4500001", "R", "5")],
    )
    .unwrap();
    let key = UnitKey::purchase_order("0012", "W100", "4500001");

    let ticket = begin_submit(&mut pos, &key).unwrap();
    let report = apply_outcome(
        &mut pos,
        &ExceptionBook::new(),
        &ticket,
        SubmitOutcome::TechnicalFailure {
            message: "connection reset".into(),
        },
    )
    .unwrap();

    assert_eq!(report.to, ReviewState::NeedsSecondaryReview);
    assert_eq!(
        report.notice,
        TransitionNotice::TechnicalError {
            message: "connection reset".into()
        }
    );
    assert_eq!(pos.count(Bucket::NeedsSecondaryReview), 1);
    assert!(!pos.get(&key).unwrap().busy);
    assert!(begin_submit(&mut pos, &key).is_ok(), "user can retry");
}
