//! Integration tests for the sms-txn-engine CLI.
//!
//! These tests run the actual binary against the message files in tests/data.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::io::Write;

/// Get path to test data file
fn test_data_path(filename: &str) -> String {
    format!("tests/data/{}", filename)
}

/// Run the binary with the given arguments and return stdout
fn run_engine(args: &[&str]) -> String {
    let mut cmd = Command::cargo_bin("sms-txn-engine").unwrap();
    let assert = cmd.args(args).assert().success();
    String::from_utf8(assert.get_output().stdout.clone()).unwrap()
}

/// Drop the generated id and timestamp columns so rows can be compared.
fn stable_columns(csv: &str) -> Vec<String> {
    let mut reader = csv::Reader::from_reader(csv.as_bytes());
    let header = reader.headers().unwrap().clone();
    let mut lines = vec![header.iter().skip(2).collect::<Vec<_>>().join(",")];
    for record in reader.records() {
        let record = record.unwrap();
        lines.push(record.iter().skip(2).collect::<Vec<_>>().join(","));
    }
    lines
}

fn expected_lines(filename: &str) -> Vec<String> {
    fs::read_to_string(test_data_path(filename))
        .unwrap()
        .lines()
        .map(|l| l.trim().to_string())
        .filter(|l| !l.is_empty())
        .collect()
}

#[test]
fn test_messages_to_csv() {
    let output = run_engine(&[&test_data_path("messages.txt"), "--format", "csv"]);
    assert_eq!(stable_columns(&output), expected_lines("expected_messages.csv"));
}

#[test]
fn test_messages_to_json() {
    let output = run_engine(&[&test_data_path("messages.txt")]);
    let value: serde_json::Value = serde_json::from_str(&output).unwrap();
    let records = value.as_array().unwrap();

    assert_eq!(records.len(), 3);
    assert_eq!(records[0]["source"], "CBE");
    assert_eq!(records[0]["direction"], "debit");
    assert_eq!(records[0]["amount"], "2450.00");
    assert_eq!(records[0]["status"], "pending");
    assert!(records[0]["category"].is_null());
    assert!(records[0]["raw_text"]
        .as_str()
        .unwrap()
        .starts_with("Dear Customer"));
    assert_eq!(records[2]["source"], "Telebirr");
    assert_eq!(records[2]["fee"], "2.00");
    assert_eq!(records[2]["vat"], "0.30");
}

#[test]
fn test_unrecognized_input_yields_empty_output() {
    let output = run_engine(&[&test_data_path("unrecognized.txt")]);
    let value: serde_json::Value = serde_json::from_str(&output).unwrap();
    assert_eq!(value.as_array().unwrap().len(), 0);
}

#[test]
fn test_per_line_split() {
    let output = run_engine(&[
        &test_data_path("per_line.txt"),
        "--split",
        "line",
        "--format",
        "csv",
    ]);
    let lines = stable_columns(&output);

    assert_eq!(lines.len(), 5);
    assert_eq!(
        lines[1],
        "BOA,credit,5000.00,ETB,Kebede Alemu,100***45,,FT99AB,,,pending,"
    );
    assert_eq!(
        lines[2],
        "Dashen,debit,750.00,ETB,Unknown Counterparty,1234***,,ab-12/x,,,pending,"
    );
    assert_eq!(
        lines[3],
        "Bunna,debit,1200.00,ETB,Unknown Counterparty,300***1,,,,,pending,"
    );
    // Recognized source without an amount is kept at zero by default.
    assert_eq!(
        lines[4],
        "Dashen,debit,0.00,ETB,Unknown Counterparty,,,,,,pending,"
    );
}

#[test]
fn test_no_record_policy_drops_amountless_messages() {
    let output = run_engine(&[
        &test_data_path("per_line.txt"),
        "--split",
        "line",
        "--format",
        "csv",
        "--on-amount-missing",
        "no-record",
    ]);
    let lines = stable_columns(&output);
    assert_eq!(lines.len(), 4);
    assert!(lines.iter().all(|l| !l.contains(",0.00,")));
}

#[test]
fn test_reads_stdin() {
    let mut cmd = Command::cargo_bin("sms-txn-engine").unwrap();
    cmd.args(["--split", "line", "--format", "csv"])
        .write_stdin("telebirr: You have received ETB 75.50 from Hana on 01/03/2024\n")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Telebirr,credit,75.50,ETB,Hana,,,,,,pending",
        ));
}

#[test]
fn test_reads_temp_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        "Commercial Bank of Ethiopia: You have transfered ETB 1,000 to Dawit on 02/02/2024"
    )
    .unwrap();

    let output = run_engine(&[file.path().to_str().unwrap(), "--format", "csv"]);
    assert!(output.contains(",CBE,debit,1000.00,ETB,Dawit,"));
}

#[test]
fn test_missing_file_error() {
    let mut cmd = Command::cargo_bin("sms-txn-engine").unwrap();
    cmd.arg("nonexistent.txt")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error"));
}

#[test]
fn test_invalid_policy_rejected() {
    let mut cmd = Command::cargo_bin("sms-txn-engine").unwrap();
    cmd.args([&test_data_path("messages.txt"), "--on-amount-missing", "maybe"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown amount policy"));
}

#[test]
fn test_output_has_correct_header() {
    let output = run_engine(&[&test_data_path("messages.txt"), "--format", "csv"]);
    assert!(output.starts_with(
        "id,timestamp,source,direction,amount,currency,counterparty,account,balance,reference,vat,fee,status,subject\n"
    ));
}

// ==================== EMAIL INPUT ====================

#[test]
fn test_eml_directory_to_csv() {
    let output = run_engine(&[
        &test_data_path("eml"),
        "--input-format",
        "eml",
        "--format",
        "csv",
    ]);
    let lines = stable_columns(&output);

    // cbe_debit.eml, newsletter.eml (unrecognized), telebirr_credit.eml
    assert_eq!(lines.len(), 3);
    assert_eq!(
        lines[1],
        "CBE,debit,2450.00,ETB,Ethio Telecom,1***234,10000.00,,,,pending,CBE Transaction Alert"
    );
    assert_eq!(
        lines[2],
        "Telebirr,credit,1500.00,ETB,Hana Girma,,,DC45KL9,,,pending,telebirr receipt"
    );
}

#[test]
fn test_eml_single_file_to_json() {
    let output = run_engine(&[&test_data_path("eml/cbe_debit.eml"), "--input-format", "eml"]);
    let value: serde_json::Value = serde_json::from_str(&output).unwrap();
    let records = value.as_array().unwrap();

    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["subject"], "CBE Transaction Alert");
    // The attached statement is not read as the notification.
    assert!(!records[0]["raw_text"].as_str().unwrap().contains("Statement"));
}

#[test]
fn test_eml_from_stdin() {
    let raw = fs::read(test_data_path("eml/telebirr_credit.eml")).unwrap();
    let mut cmd = Command::cargo_bin("sms-txn-engine").unwrap();
    cmd.args(["--input-format", "eml", "--format", "csv"])
        .write_stdin(raw)
        .assert()
        .success()
        .stdout(predicate::str::contains(
            ",Telebirr,credit,1500.00,ETB,Hana Girma,",
        ));
}

#[test]
fn test_eml_rejects_non_email_file() {
    let mut cmd = Command::cargo_bin("sms-txn-engine").unwrap();
    cmd.args([&test_data_path("messages.txt"), "--input-format", "eml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No .eml files"));
}
