use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::{Serialize, Serializer};

use crate::error::KpiError;

/// Ledger category of a row. Expense categories carry negative amounts.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Account {
    Revenue,
    Cogs,
    Opex,
    /// Unrecognized label, kept so the row survives filtering and export.
    Other(String),
}

impl Account {
    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            "Revenue" => Account::Revenue,
            "COGS" => Account::Cogs,
            "OpEx" => Account::Opex,
            other => Account::Other(other.to_string()),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Account::Revenue => "Revenue",
            Account::Cogs => "COGS",
            Account::Opex => "OpEx",
            Account::Other(s) => s,
        }
    }
}

impl fmt::Display for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for Account {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Record {
    pub department: String,
    pub date: NaiveDate,
    pub account: Account,
    pub amount: Decimal,
}

impl Record {
    pub fn month(&self) -> Month {
        Month::of(self.date)
    }
}

/// Both source tables as read from the workbook.
#[derive(Debug, Clone, Default)]
pub struct DataSet {
    pub actuals: Vec<Record>,
    pub budget: Vec<Record>,
}

/// Department predicate. `All` passes every row through.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Department {
    #[default]
    All,
    Named(String),
}

impl Department {
    pub fn from_choice(choice: &str) -> Self {
        if choice == "All" {
            Department::All
        } else {
            Department::Named(choice.to_string())
        }
    }

    pub fn matches(&self, dept: &str) -> bool {
        match self {
            Department::All => true,
            Department::Named(name) => name == dept,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Department::All => "All",
            Department::Named(name) => name,
        }
    }
}

impl fmt::Display for Department {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A calendar month, ordered chronologically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Month {
    pub year: i32,
    pub month: u32,
}

impl Month {
    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn succ(self) -> Self {
        if self.month == 12 {
            Self { year: self.year + 1, month: 1 }
        } else {
            Self { year: self.year, month: self.month + 1 }
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date.year() == self.year && date.month() == self.month
    }

    /// Every month from `start` to `end`, both included.
    pub fn range(start: Month, end: Month) -> Vec<Month> {
        let mut out = Vec::new();
        let mut m = start;
        while m <= end {
            out.push(m);
            m = m.succ();
        }
        out
    }

    pub fn short_label(&self) -> &'static str {
        const NAMES: [&str; 12] = [
            "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
        ];
        NAMES[(self.month.clamp(1, 12) - 1) as usize]
    }
}

impl fmt::Display for Month {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for Month {
    type Err = KpiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bad = || KpiError::InvalidArgument(format!("month must be YYYY-MM, got '{s}'"));
        let (y, m) = s.trim().split_once('-').ok_or_else(bad)?;
        let year: i32 = y.parse().map_err(|_| bad())?;
        let month: u32 = m.parse().map_err(|_| bad())?;
        if !(1..=12).contains(&month) {
            return Err(bad());
        }
        Ok(Self { year, month })
    }
}

impl Serialize for Month {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_account_parse() {
        assert_eq!(Account::parse("Revenue"), Account::Revenue);
        assert_eq!(Account::parse(" COGS "), Account::Cogs);
        assert_eq!(Account::parse("OpEx"), Account::Opex);
        assert_eq!(Account::parse("Capex"), Account::Other("Capex".into()));
        assert_eq!(Account::Cogs.to_string(), "COGS");
    }

    #[test]
    fn test_department_matches() {
        assert!(Department::All.matches("Sales"));
        assert!(Department::from_choice("Sales").matches("Sales"));
        assert!(!Department::from_choice("Sales").matches("sales"));
        assert_eq!(Department::from_choice("All"), Department::All);
    }

    #[test]
    fn test_month_succ_wraps_year() {
        let dec = Month { year: 2024, month: 12 };
        assert_eq!(dec.succ(), Month { year: 2025, month: 1 });
    }

    #[test]
    fn test_month_range_is_inclusive() {
        let months = Month::range(
            Month { year: 2024, month: 11 },
            Month { year: 2025, month: 2 },
        );
        let labels: Vec<String> = months.iter().map(|m| m.to_string()).collect();
        assert_eq!(labels, vec!["2024-11", "2024-12", "2025-01", "2025-02"]);
    }

    #[test]
    fn test_month_parse() {
        assert_eq!("2025-03".parse::<Month>().unwrap(), Month { year: 2025, month: 3 });
        assert!("2025-13".parse::<Month>().is_err());
        assert!("March".parse::<Month>().is_err());
    }
}
