use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::SystemTime;

use calamine::{Data, Reader};
use chrono::{NaiveDate, TimeDelta};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;

use crate::error::{KpiError, Result};
use crate::models::{Account, DataSet, Record};

pub const ACTUALS_SHEET: &str = "Actuals";
pub const BUDGET_SHEET: &str = "Budget";

const COLUMNS: [&str; 4] = ["Department", "Date", "Account", "Amount"];

// ---------------------------------------------------------------------------
// Cell helpers
// ---------------------------------------------------------------------------

/// `None` for serials that are not finite or land outside chrono's date range.
pub fn excel_serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() {
        return None;
    }
    // Excel epoch is 1899-12-30 (accounting for the 1900 leap year bug)
    let base = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    base.checked_add_signed(TimeDelta::try_days(serial.floor() as i64)?)
}

/// Accepts `YYYY-MM-DD`, optionally followed by a time part.
pub fn parse_iso_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    let day = raw.get(..10)?;
    NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
}

fn cell_date(cell: &Data) -> Option<NaiveDate> {
    match cell {
        Data::DateTime(dt) => excel_serial_to_date(dt.as_f64()),
        Data::Float(f) => excel_serial_to_date(*f),
        Data::Int(i) => excel_serial_to_date(*i as f64),
        Data::DateTimeIso(s) | Data::String(s) => parse_iso_date(s),
        _ => None,
    }
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::String(s) => s.trim().to_string(),
        Data::Empty => String::new(),
        other => other.to_string(),
    }
}

fn cell_amount(cell: &Data) -> std::result::Result<Decimal, String> {
    match cell {
        Data::Empty => Ok(Decimal::ZERO),
        Data::Float(f) => Decimal::from_f64(*f).ok_or_else(|| format!("{f} is out of range")),
        Data::Int(i) => Ok(Decimal::from(*i)),
        Data::String(s) if s.trim().is_empty() => Ok(Decimal::ZERO),
        Data::String(s) => s
            .trim()
            .replace([',', '$'], "")
            .parse::<Decimal>()
            .map_err(|_| format!("'{s}' is not a number")),
        other => Err(format!("unexpected cell {other:?}")),
    }
}

// ---------------------------------------------------------------------------
// Sheet parsing
// ---------------------------------------------------------------------------

fn parse_sheet(range: &calamine::Range<Data>, sheet: &str) -> Result<Vec<Record>> {
    let mut rows = range.rows();
    let header = rows
        .next()
        .ok_or_else(|| KpiError::DataLoad(format!("Sheet '{sheet}' is empty")))?;

    let mut idx = [0usize; 4];
    for (slot, name) in idx.iter_mut().zip(COLUMNS) {
        *slot = header
            .iter()
            .position(|c| cell_text(c) == name)
            .ok_or_else(|| {
                KpiError::DataLoad(format!("Sheet '{sheet}' is missing the '{name}' column"))
            })?;
    }
    let [dept_col, date_col, account_col, amount_col] = idx;

    let mut records = Vec::new();
    for (n, row) in rows.enumerate() {
        // 1-based sheet row, after the header
        let line = n + 2;
        if row.iter().all(|c| matches!(c, Data::Empty)) {
            continue;
        }
        let get = |col: usize| row.get(col).unwrap_or(&Data::Empty);

        let Some(date) = cell_date(get(date_col)) else {
            log::warn!("{sheet} row {line}: skipping row without a usable date");
            continue;
        };
        let amount = cell_amount(get(amount_col)).map_err(|e| {
            KpiError::DataLoad(format!("Sheet '{sheet}' row {line}: invalid Amount, {e}"))
        })?;

        records.push(Record {
            department: cell_text(get(dept_col)),
            date,
            account: Account::parse(&cell_text(get(account_col))),
            amount,
        });
    }
    log::debug!("{sheet}: loaded {} rows", records.len());
    Ok(records)
}

/// Read the Actuals and Budget sheets of a workbook.
pub fn load(path: &Path) -> Result<DataSet> {
    if !path.exists() {
        return Err(KpiError::DataLoad(format!(
            "Data file not found: {}",
            path.display()
        )));
    }
    let mut workbook = calamine::open_workbook_auto(path).map_err(|e| {
        KpiError::DataLoad(format!("Failed to open {}: {e}", path.display()))
    })?;

    let mut read = |sheet: &str| -> Result<Vec<Record>> {
        if !workbook.sheet_names().iter().any(|name| name == sheet) {
            return Err(KpiError::DataLoad(format!(
                "Worksheet named '{sheet}' not found in {}",
                path.display()
            )));
        }
        let range = workbook
            .worksheet_range(sheet)
            .map_err(|e| KpiError::DataLoad(format!("Failed to read sheet '{sheet}': {e}")))?;
        parse_sheet(&range, sheet)
    };

    let actuals = read(ACTUALS_SHEET)?;
    let budget = read(BUDGET_SHEET)?;
    Ok(DataSet { actuals, budget })
}

// ---------------------------------------------------------------------------
// Memoized load
// ---------------------------------------------------------------------------

struct CachedLoad {
    path: PathBuf,
    modified: Option<SystemTime>,
    data: Rc<DataSet>,
}

/// Remembers the last workbook read. Reloads when the path changes or the
/// file's modification time moves.
#[derive(Default)]
pub struct DataCache {
    entry: Option<CachedLoad>,
}

fn modified_time(path: &Path) -> Option<SystemTime> {
    std::fs::metadata(path).and_then(|m| m.modified()).ok()
}

impl DataCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&mut self, path: &Path) -> Result<Rc<DataSet>> {
        let modified = modified_time(path);
        if let Some(entry) = &self.entry {
            if entry.path == path && entry.modified == modified && modified.is_some() {
                log::debug!("cache hit for {}", path.display());
                return Ok(Rc::clone(&entry.data));
            }
        }
        log::debug!("loading {}", path.display());
        let data = Rc::new(load(path)?);
        self.entry = Some(CachedLoad {
            path: path.to_path_buf(),
            modified,
            data: Rc::clone(&data),
        });
        Ok(data)
    }

    pub fn invalidate(&mut self) {
        self.entry = None;
    }
}
