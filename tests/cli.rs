use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use rust_xlsxwriter::{ExcelDateTime, Format, Workbook};

type Row<'a> = (&'a str, (u16, u8, u8), &'a str, f64);

const ACTUALS: &[Row] = &[
    ("Sales", (2024, 1, 10), "Revenue", 1000.0),
    ("Sales", (2024, 1, 10), "COGS", -400.0),
    ("Sales", (2024, 1, 10), "OpEx", -300.0),
    ("Sales", (2024, 2, 10), "Revenue", 1200.0),
    ("Sales", (2024, 2, 10), "COGS", -500.0),
    ("Ops", (2024, 2, 12), "OpEx", -80.0),
];

const BUDGET: &[Row] = &[
    ("Sales", (2024, 1, 10), "Revenue", 900.0),
    ("Sales", (2024, 1, 10), "COGS", -350.0),
    ("Sales", (2024, 1, 10), "OpEx", -320.0),
    ("Ops", (2024, 2, 10), "OpEx", -100.0),
];

fn write_fixture(dir: &Path) -> PathBuf {
    let path = dir.join("kpi.xlsx");
    let mut workbook = Workbook::new();
    let date_format = Format::new().set_num_format("yyyy-mm-dd");
    for (name, rows) in [("Actuals", ACTUALS), ("Budget", BUDGET)] {
        let sheet = workbook.add_worksheet();
        sheet.set_name(name).unwrap();
        for (col, title) in ["Department", "Date", "Account", "Amount"].iter().enumerate() {
            sheet.write(0, col as u16, *title).unwrap();
        }
        for (i, (dept, (y, m, d), account, amount)) in rows.iter().enumerate() {
            let row = i as u32 + 1;
            let date = ExcelDateTime::from_ymd(*y, *m, *d).unwrap();
            sheet.write(row, 0, *dept).unwrap();
            sheet.write_datetime_with_format(row, 1, &date, &date_format).unwrap();
            sheet.write(row, 2, *account).unwrap();
            sheet.write(row, 3, *amount).unwrap();
        }
    }
    workbook.save(&path).unwrap();
    path
}

fn finance_kpi(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("finance-kpi").unwrap();
    cmd.env("HOME", home).env("NO_COLOR", "1");
    cmd
}

#[test]
fn summary_prints_kpis_and_insights() {
    let dir = tempfile::tempdir().unwrap();
    let file = write_fixture(dir.path());
    finance_kpi(dir.path())
        .args(["summary", "--file"])
        .arg(&file)
        .args(["--dept", "Sales", "--to", "2024-01-31"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Department: Sales"))
        .stdout(predicate::str::contains("Net income finished $70 above budget."));
}

#[test]
fn summary_json_is_machine_readable() {
    let dir = tempfile::tempdir().unwrap();
    let file = write_fixture(dir.path());
    let output = finance_kpi(dir.path())
        .args(["summary", "--json", "--file"])
        .arg(&file)
        .output()
        .unwrap();
    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["department"], "All");
    assert_eq!(json["kpi_lines"].as_array().unwrap().len(), 5);
}

#[test]
fn trend_reports_cost_center() {
    let dir = tempfile::tempdir().unwrap();
    let file = write_fixture(dir.path());
    finance_kpi(dir.path())
        .args(["trend", "--dept", "Ops", "--file"])
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::contains("cost center"));
}

#[test]
fn variance_rejects_month_outside_selection() {
    let dir = tempfile::tempdir().unwrap();
    let file = write_fixture(dir.path());
    finance_kpi(dir.path())
        .args(["variance", "--month", "2023-12", "--file"])
        .arg(&file)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Something went wrong."))
        .stderr(predicate::str::contains("2023-12"));
}

#[test]
fn departments_lists_actuals_departments() {
    let dir = tempfile::tempdir().unwrap();
    let file = write_fixture(dir.path());
    finance_kpi(dir.path())
        .args(["departments", "--file"])
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::contains("Ops").and(predicate::str::contains("Sales")));
}

#[test]
fn export_writes_workbook() {
    let dir = tempfile::tempdir().unwrap();
    let file = write_fixture(dir.path());
    let out = dir.path().join("out");
    finance_kpi(dir.path())
        .args(["export", "--xlsx-only", "--file"])
        .arg(&file)
        .arg("--output-dir")
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("finance_kpi_export.xlsx"));
    assert!(out.join("finance_kpi_export.xlsx").exists());
    assert!(!out.join("finance_kpi_export.pdf").exists());
}

#[test]
fn missing_file_is_reported_verbatim() {
    let dir = tempfile::tempdir().unwrap();
    finance_kpi(dir.path())
        .args(["summary", "--file"])
        .arg(dir.path().join("nope.xlsx"))
        .assert()
        .failure()
        .stderr(predicate::str::starts_with("Error: "))
        .stderr(predicate::str::contains("Something went wrong.").not());
}

#[test]
fn config_persists_settings() {
    let dir = tempfile::tempdir().unwrap();
    finance_kpi(dir.path())
        .args(["config", "--export-dir", "/tmp/kpi-out"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Settings saved."));
    let saved = dir.path().join(".config/finance-kpi/settings.json");
    let content = std::fs::read_to_string(saved).unwrap();
    assert!(content.contains("/tmp/kpi-out"));
}
