//! Scenario: `rcv check-in` against a fixture-backed waybill
//!
//! # Invariants under test
//!
//! 1. An in-transit waybill is written as pending with action code "03";
//!    the seal flag reflects the seal read at the dock.
//! 2. The driver's reference number is echoed back.
//! 3. A waybill that already arrived is refused.

use std::path::PathBuf;

use assert_cmd::Command;
use predicates::prelude::*;

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn check_in(waybill: &str, fixture_name: &str) -> Command {
    let mut cmd = Command::cargo_bin("rcv").unwrap();
    cmd.env("RUST_LOG", "warn")
        .args(["check-in", "--store", "0012", "--waybill", waybill, "--fixture"])
        .arg(fixture(fixture_name));
    cmd
}

#[test]
fn in_transit_waybill_becomes_pending() {
    check_in("W300", "waybill_in_transit.json")
        .args([
            "--seal",
            "S-778",
            "--seal-intact",
            "--arrived-at",
            "2024-03-07T06:30:00Z",
            "--ref",
            "R-42",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "entry_status=P action_code=03 seal_match=true",
        ))
        .stdout(predicate::str::contains("ref_number=R-42"));
}

#[test]
fn wrong_seal_is_not_a_match() {
    check_in("W300", "waybill_in_transit.json")
        .args(["--seal", "S-000"])
        .assert()
        .success()
        .stdout(predicate::str::contains("seal_match=false"))
        .stdout(predicate::str::contains("ref_number").not());
}

#[test]
fn arrived_waybill_is_refused() {
    check_in("W100", "waybill_sealed.json")
        .args(["--seal", "S-778"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not in transit"));
}
