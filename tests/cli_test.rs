use assert_cmd::cargo_bin;
use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::io::Write;
use std::process::Command;

mod common;

fn payout_engine() -> Command {
    let mut cmd = Command::new(cargo_bin!("payout-engine"));
    cmd.env_remove("RUST_LOG")
        .env_remove("PAYOUT_DB_PATH")
        .env_remove("PAYOUT_MOCK_FAILURE_RATE")
        .env_remove("PAYOUT_MOCK_LATENCY_MS");
    cmd
}

#[test]
fn test_cli_end_to_end() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = payout_engine();
    cmd.args([
        "run",
        "--recipients",
        "tests/fixtures/recipients.csv",
        "--event-id",
        "LIQ-TEST-001",
        "--total-amount",
        "800000",
        "--payout-date",
        "2024-12-15",
        "--failure-rate",
        "0",
        "--latency-ms",
        "0",
        "--seed",
        "7",
    ]);

    cmd.assert()
        .success()
        .stdout(predicate::str::contains(
            "payout_id,recipient_id,recipient_name,country,amount,currency,rail,rail_currency,status,skip_reason,payment_order_id",
        ))
        .stdout(predicate::str::contains(
            ",INV-001,John Smith,US,100000.00,USD,CCD,USD,completed,,po_ach_",
        ))
        .stdout(predicate::str::contains(
            ",INV-010,Hans Mueller,DE,100000.00,USD,sepa,EUR,completed,,po_cross_border_",
        ))
        .stdout(predicate::str::contains(
            ",INV-052,Omar Al-Rashid,AE,100000.00,USD,wire,USD,completed,,po_wire_",
        ))
        .stdout(predicate::str::contains(
            ",INV-060,Ghost Investor,US,100000.00,USD,,,skipped,missing_external_account,",
        ))
        .stdout(predicate::str::contains(
            ",INV-061,Crypto Only,US,100000.00,USD,,,skipped,invalid_method,",
        ))
        .stderr(predicate::str::contains("created=6 skipped=2 failed=0"));

    Ok(())
}

#[test]
fn test_cli_missing_event_fails_run_not_process() {
    let mut cmd = payout_engine();
    cmd.args(["run", "--event-id", "LIQ-NOPE", "--latency-ms", "0"]);

    cmd.assert()
        .success()
        .stderr(predicate::str::contains("Failed"))
        .stdout(predicate::str::contains("po_").not());
}

#[test]
fn test_cli_skips_unreadable_recipient_rows() {
    let mut csv = tempfile::NamedTempFile::new().unwrap();
    writeln!(csv, "id,name,country,payment_method,external_account_id,has_us_bank_account").unwrap();
    writeln!(csv, "INV-001,Good Row,US,ACH,ext_1,0").unwrap();
    writeln!(csv, "INV-002,Bad Flag,US,ACH,ext_2,maybe").unwrap();
    writeln!(csv, "INV-003,Also Good,GB,ACH,ext_3,0").unwrap();

    let mut cmd = payout_engine();
    cmd.arg("run")
        .arg("--recipients")
        .arg(csv.path())
        .args(["--event-id", "LIQ-1", "--total-amount", "100"])
        .args(["--failure-rate", "0", "--latency-ms", "0"]);

    cmd.assert()
        .success()
        .stderr(predicate::str::contains("skipping unreadable recipient row"))
        .stdout(predicate::str::contains(",INV-001,Good Row,US,50.00,"))
        .stdout(predicate::str::contains(",INV-003,Also Good,GB,50.00,USD,bacs,GBP,completed,"))
        .stdout(predicate::str::contains("INV-002").not());
}

#[test]
fn test_cli_bulk_run_completes_every_recipient() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bulk.csv");
    common::generate_recipients_csv(&path, 500).expect("Failed to generate CSV");

    let output = payout_engine()
        .arg("run")
        .arg("--recipients")
        .arg(&path)
        .args(["--event-id", "LIQ-BULK", "--total-amount", "1000000"])
        .args(["--failure-rate", "0", "--latency-ms", "0"])
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    // header + one row per recipient
    assert_eq!(stdout.lines().count(), 501);
    assert_eq!(stdout.matches(",2000.00,USD,CCD,USD,completed,,po_ach_").count(), 500);
}

#[test]
fn test_cli_payouts_requires_a_scope() {
    payout_engine()
        .arg("payouts")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--event-id"));
}

#[test]
fn test_cli_trace_unknown_payout() {
    payout_engine()
        .args(["trace", "6f1c1c1e-9d51-4e4b-8d5c-1b9f5a4f0d11"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Payout not found"));
}

#[test]
fn test_cli_query_without_db_path_notes_empty_store() {
    payout_engine()
        .arg("runs")
        .assert()
        .success()
        .stderr(predicate::str::contains("No --db-path given"))
        .stdout(predicate::str::contains("[]"));
}

#[test]
fn test_cli_run_without_db_path_has_no_note() {
    payout_engine()
        .args(["run", "--event-id", "LIQ-NOPE", "--latency-ms", "0"])
        .assert()
        .success()
        .stderr(predicate::str::contains("No --db-path given").not());
}
