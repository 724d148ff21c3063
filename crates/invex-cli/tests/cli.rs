use std::fs;
use std::path::Path;

use assert_cmd::Command;
use calamine::{DataType, Reader, Xlsx, open_workbook};
use predicates::prelude::*;
use pretty_assertions::assert_eq;
use tempfile::TempDir;

const INVOICE: &str = "ACME Supplies Ltd
TAX INVOICE
Invoice No: INV-2024-017
Invoice Date: 15/03/2024

Description            Qty   Amount
Paper A4 (box)          10   $450.00
Toner cartridge          2   $800.00

Subtotal                     $1,250.00
VAT (15%)                      $187.50
Total Due                    $1,437.50
";

const UNLABELED: &str = "Item A   100.00
Item B   9500.00
Item C   250.50
";

/// Command with the config directory pointed into the temp dir.
fn invex(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("invex").unwrap();
    cmd.env("XDG_CONFIG_HOME", dir.path().join("config"));
    cmd
}

fn write(dir: &Path, name: &str, content: &str) {
    fs::write(dir.join(name), content).unwrap();
}

fn pattern(dir: &TempDir) -> String {
    format!("{}/*.txt", dir.path().display())
}

#[test]
fn test_batch_csv_preserves_sorted_order() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "b.txt", UNLABELED);
    write(dir.path(), "a.txt", INVOICE);

    let output = invex(&dir)
        .args(["batch", &pattern(&dir)])
        .output()
        .unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(
        lines,
        vec![
            "filename,invoice_number,invoice_date,subtotal,vat_amount,total_amount",
            "a.txt,INV-2024-017,15/03/2024,1250.00,187.50,1437.50",
            "b.txt,,,,,9500.00",
        ]
    );
}

#[test]
fn test_batch_keeps_row_for_empty_document() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "a.txt", INVOICE);
    write(dir.path(), "b.txt", "   \n");

    invex(&dir)
        .args(["batch", &pattern(&dir)])
        .assert()
        .success()
        .stdout(predicate::str::contains("b.txt,,,,,\n"))
        .stderr(predicate::str::contains("no text extracted"));
}

#[test]
fn test_batch_applies_overrides() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "a.txt", INVOICE);
    write(dir.path(), "b.txt", UNLABELED);
    write(
        dir.path(),
        "edits.json",
        r#"[{"row": 0, "column": "invoice_number", "value": "EDITED-1"}]"#,
    );

    invex(&dir)
        .args([
            "batch",
            &pattern(&dir),
            "--override",
            "1:total_amount=12.00",
            "--overrides-file",
            dir.path().join("edits.json").to_str().unwrap(),
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "a.txt,EDITED-1,15/03/2024,1250.00,187.50,1437.50",
        ))
        .stdout(predicate::str::contains("b.txt,,,,,12.00"));
}

#[test]
fn test_batch_rejects_malformed_override() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "a.txt", INVOICE);

    invex(&dir)
        .args(["batch", &pattern(&dir), "--override", "total_amount=1"])
        .assert()
        .failure();
}

#[test]
fn test_batch_json_to_file() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "a.txt", INVOICE);
    write(dir.path(), "b.txt", UNLABELED);
    let out = dir.path().join("out.json");

    invex(&dir)
        .args(["batch", &pattern(&dir), "--format", "json", "--output"])
        .arg(&out)
        .assert()
        .success();

    let content = fs::read_to_string(&out).unwrap();
    let rows: serde_json::Value = serde_json::from_str(&content).unwrap();
    assert_eq!(rows.as_array().unwrap().len(), 2);
    assert_eq!(rows[0]["total_amount"], "1437.50");
    assert_eq!(rows[1]["invoice_number"], "");
}

#[test]
fn test_batch_xlsx_workbook() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "a.txt", INVOICE);
    write(dir.path(), "b.txt", UNLABELED);
    let out = dir.path().join("invoices.xlsx");

    invex(&dir)
        .args(["batch", &pattern(&dir), "--format", "xlsx", "--output"])
        .arg(&out)
        .assert()
        .success();

    let mut workbook: Xlsx<_> = open_workbook(&out).unwrap();
    let range = workbook.worksheet_range("invoices").unwrap().unwrap();
    let cell = |row: u32, col: u32| match range.get_value((row, col)) {
        Some(DataType::String(s)) => s.clone(),
        _ => String::new(),
    };

    assert_eq!(cell(0, 1), "invoice_number");
    assert_eq!(cell(1, 0), "a.txt");
    assert_eq!(cell(1, 3), "1250.00");
    assert_eq!(cell(1, 5), "1437.50");
    assert_eq!(cell(2, 0), "b.txt");
    assert_eq!(cell(2, 1), "");
    assert_eq!(cell(2, 5), "9500.00");
}

#[test]
fn test_batch_xlsx_needs_output_file() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "a.txt", INVOICE);

    invex(&dir)
        .args(["batch", &pattern(&dir), "--format", "xlsx"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--output"));
}

#[test]
fn test_batch_without_matches_fails() {
    let dir = TempDir::new().unwrap();

    invex(&dir)
        .args(["batch", &pattern(&dir)])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No matching files found"));
}

#[test]
fn test_process_json() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "a.txt", INVOICE);

    invex(&dir)
        .args(["process"])
        .arg(dir.path().join("a.txt"))
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""filename": "a.txt""#))
        .stdout(predicate::str::contains(r#""invoice_number": "INV-2024-017""#))
        .stdout(predicate::str::contains(r#""total_amount": "1437.50""#));
}

#[test]
fn test_process_json_keeps_absent_columns() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "b.txt", UNLABELED);

    let output = invex(&dir)
        .args(["process"])
        .arg(dir.path().join("b.txt"))
        .output()
        .unwrap();

    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["invoice_number"], "");
    assert_eq!(value["invoice_date"], "");
    assert_eq!(value["subtotal"], "");
    assert_eq!(value["vat_amount"], "");
    assert_eq!(value["total_amount"], "9500.00");
}

#[test]
fn test_process_text_reports_fallback() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "b.txt", UNLABELED);

    invex(&dir)
        .args(["process", "--format", "text"])
        .arg(dir.path().join("b.txt"))
        .assert()
        .success()
        .stdout(predicate::str::contains("total_amount:   9500.00"))
        .stderr(predicate::str::contains("inferred from largest amount"));
}

#[test]
fn test_process_unsupported_extension() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "a.docx", INVOICE);

    invex(&dir)
        .args(["process"])
        .arg(dir.path().join("a.docx"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unsupported file format"));
}

#[test]
fn test_config_set_then_get() {
    let dir = TempDir::new().unwrap();

    invex(&dir)
        .args(["config", "set", "extraction.normalize_dates", "true"])
        .assert()
        .success();

    invex(&dir)
        .args(["config", "get", "extraction.normalize_dates"])
        .assert()
        .success()
        .stdout(predicate::str::diff("true\n"));
}

#[test]
fn test_config_set_rejects_bad_pattern() {
    let dir = TempDir::new().unwrap();

    invex(&dir)
        .args(["config", "set", "patterns.date_shapes", r#"["(\\d+"]"#])
        .assert()
        .failure();
}

#[test]
fn test_saved_config_drives_batch() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "a.txt", INVOICE);

    invex(&dir)
        .args(["config", "set", "extraction.normalize_dates", "true"])
        .assert()
        .success();

    invex(&dir)
        .args(["batch", &pattern(&dir)])
        .assert()
        .success()
        .stdout(predicate::str::contains("a.txt,INV-2024-017,2024-03-15,"));
}
