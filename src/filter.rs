use std::collections::BTreeSet;

use chrono::NaiveDate;

use crate::models::{Department, Month, Record};

/// Rows matching the department and falling within `start..=end`.
/// An inverted range matches nothing.
pub fn filter(
    table: &[Record],
    department: &Department,
    start: NaiveDate,
    end: NaiveDate,
) -> Vec<Record> {
    table
        .iter()
        .filter(|r| department.matches(&r.department) && r.date >= start && r.date <= end)
        .cloned()
        .collect()
}

pub fn by_department(table: &[Record], department: &Department) -> Vec<Record> {
    table
        .iter()
        .filter(|r| department.matches(&r.department))
        .cloned()
        .collect()
}

pub fn in_month(table: &[Record], month: Month) -> Vec<Record> {
    table
        .iter()
        .filter(|r| month.contains(r.date))
        .cloned()
        .collect()
}

/// Sorted, de-duplicated, non-empty department names.
pub fn departments(table: &[Record]) -> Vec<String> {
    table
        .iter()
        .filter(|r| !r.department.is_empty())
        .map(|r| r.department.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

pub fn date_extent(table: &[Record]) -> Option<(NaiveDate, NaiveDate)> {
    let min = table.iter().map(|r| r.date).min()?;
    let max = table.iter().map(|r| r.date).max()?;
    Some((min, max))
}

/// Resolve a requested range against the data extent: missing bounds take the
/// extent ends, given bounds are clamped into it.
pub fn clamp_range(
    extent: (NaiveDate, NaiveDate),
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> (NaiveDate, NaiveDate) {
    let (lo, hi) = extent;
    let start = start.unwrap_or(lo).clamp(lo, hi);
    let end = end.unwrap_or(hi).clamp(lo, hi);
    (start, end)
}
