use chrono::Datelike;
use rust_decimal::prelude::ToPrimitive;
use rust_xlsxwriter::{ExcelDateTime, Format, FormatAlign, Workbook};

use crate::error::Result;
use crate::kpi::KpiLine;
use crate::models::Record;
use crate::pipeline::DashboardState;

pub const XLSX_FILE_NAME: &str = "finance_kpi_export.xlsx";
pub const PDF_FILE_NAME: &str = "finance_kpi_export.pdf";
pub const ACTUALS_EXPORT_SHEET: &str = "Actuals_Filtered";
pub const BUDGET_EXPORT_SHEET: &str = "Budget_Filtered";
pub const SUMMARY_TITLE: &str = "Finance KPI Dashboard - Executive Summary";

// ---------------------------------------------------------------------------
// Spreadsheet
// ---------------------------------------------------------------------------

fn write_sheet(
    workbook: &mut Workbook,
    name: &str,
    rows: &[Record],
    header: &Format,
    date: &Format,
    amount: &Format,
) -> Result<()> {
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(name)?;
    for (col, title) in ["Department", "Date", "Account", "Amount"].iter().enumerate() {
        worksheet.write_with_format(0, col as u16, *title, header)?;
    }
    for (i, r) in rows.iter().enumerate() {
        let row = i as u32 + 1;
        worksheet.write(row, 0, r.department.as_str())?;
        let day = ExcelDateTime::from_ymd(
            r.date.year() as u16,
            r.date.month() as u8,
            r.date.day() as u8,
        )?;
        worksheet.write_datetime_with_format(row, 1, &day, date)?;
        worksheet.write(row, 2, r.account.label())?;
        worksheet.write_with_format(row, 3, r.amount.to_f64().unwrap_or_default(), amount)?;
    }
    worksheet.set_column_width(0, 18)?;
    worksheet.set_column_width(1, 12)?;
    worksheet.set_column_width(3, 14)?;
    Ok(())
}

/// Workbook with the two filtered tables on their own sheets, no index column.
pub fn filtered_workbook(actuals: &[Record], budget: &[Record]) -> Result<Vec<u8>> {
    let mut workbook = Workbook::new();
    let header = Format::new().set_bold().set_align(FormatAlign::Center);
    let date = Format::new().set_num_format("yyyy-mm-dd");
    let amount = Format::new().set_num_format("#,##0.00");

    write_sheet(&mut workbook, ACTUALS_EXPORT_SHEET, actuals, &header, &date, &amount)?;
    write_sheet(&mut workbook, BUDGET_EXPORT_SHEET, budget, &header, &date, &amount)?;

    Ok(workbook.save_to_buffer()?)
}

// ---------------------------------------------------------------------------
// Summary document
// ---------------------------------------------------------------------------

/// Everything the executive summary prints, already formatted.
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryDocument {
    pub title: String,
    pub department: String,
    pub date_range: String,
    pub waterfall_month: Option<String>,
    pub kpis: Vec<KpiLine>,
    pub insights: String,
}

impl SummaryDocument {
    pub fn from_state(state: &DashboardState) -> Self {
        Self {
            title: SUMMARY_TITLE.to_string(),
            department: state.department.clone(),
            date_range: state.range_label(),
            waterfall_month: state.waterfall.as_ref().map(|w| w.month.to_string()),
            kpis: state.kpi_lines.clone(),
            insights: state.insights_text(),
        }
    }
}

pub enum ExportOutcome {
    Ready(Vec<u8>),
    /// The PDF renderer is not compiled in.
    Unavailable,
}

pub const fn pdf_available() -> bool {
    cfg!(feature = "pdf")
}

pub fn summary_pdf(doc: &SummaryDocument) -> Result<ExportOutcome> {
    #[cfg(feature = "pdf")]
    {
        crate::pdf::render_summary(doc).map(ExportOutcome::Ready)
    }
    #[cfg(not(feature = "pdf"))]
    {
        let _ = doc;
        Ok(ExportOutcome::Unavailable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kpi::tests::{example_actuals, example_budget, row};
    use crate::models::{Account, DataSet};
    use rust_decimal_macros::dec;
    use crate::pipeline::{recompute, Selection};
    use calamine::{Data, Reader, Xlsx};
    use std::io::Cursor;

    #[test]
    fn test_filtered_workbook_mirrors_rows() {
        let actuals = example_actuals();
        let budget = &example_budget()[..2];
        let bytes = filtered_workbook(&actuals, budget).unwrap();

        let mut wb: Xlsx<_> = Xlsx::new(Cursor::new(bytes)).unwrap();
        assert_eq!(
            wb.sheet_names(),
            vec![ACTUALS_EXPORT_SHEET.to_string(), BUDGET_EXPORT_SHEET.to_string()]
        );

        let range = wb.worksheet_range(ACTUALS_EXPORT_SHEET).unwrap();
        let rows: Vec<_> = range.rows().collect();
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[0].len(), 4);
        assert_eq!(rows[0][0], Data::String("Department".into()));
        assert_eq!(rows[1][2], Data::String("Revenue".into()));
        assert_eq!(rows[2][3], Data::Float(-400.0));

        let range = wb.worksheet_range(BUDGET_EXPORT_SHEET).unwrap();
        assert_eq!(range.rows().count(), 3);
    }

    #[test]
    fn test_filtered_workbook_keeps_unrecognized_accounts() {
        let mut actuals = example_actuals();
        actuals.push(row("A", (2024, 1, 12), Account::Other("Depreciation".into()), dec!(-75)));
        let bytes = filtered_workbook(&actuals, &[]).unwrap();

        let mut wb: Xlsx<_> = Xlsx::new(Cursor::new(bytes)).unwrap();
        let range = wb.worksheet_range(ACTUALS_EXPORT_SHEET).unwrap();
        let rows: Vec<_> = range.rows().collect();
        assert_eq!(rows.len(), 5);
        assert_eq!(rows[4][2], Data::String("Depreciation".into()));
        assert_eq!(rows[4][3], Data::Float(-75.0));
    }

    #[test]
    fn test_filtered_workbook_with_empty_views() {
        let bytes = filtered_workbook(&[], &[]).unwrap();
        let mut wb: Xlsx<_> = Xlsx::new(Cursor::new(bytes)).unwrap();
        let range = wb.worksheet_range(BUDGET_EXPORT_SHEET).unwrap();
        assert_eq!(range.rows().count(), 1);
    }

    #[test]
    fn test_summary_document_from_state() {
        let data = DataSet {
            actuals: example_actuals(),
            budget: example_budget(),
        };
        let state = recompute(&data, &Selection::default()).unwrap();
        let doc = SummaryDocument::from_state(&state);
        assert_eq!(doc.department, "All");
        assert_eq!(doc.date_range, "2024-01-10 to 2024-01-10");
        assert_eq!(doc.waterfall_month.as_deref(), Some("2024-01"));
        assert_eq!(doc.kpis.len(), 5);
        assert!(doc.insights.starts_with("Net income finished $70 above budget."));
    }

    #[test]
    fn test_summary_pdf_matches_capability() {
        let doc = SummaryDocument {
            title: SUMMARY_TITLE.into(),
            department: "All".into(),
            date_range: "2024-01-01 to 2024-12-31".into(),
            waterfall_month: None,
            kpis: Vec::new(),
            insights: "Net income finished in line with budget.".into(),
        };
        match summary_pdf(&doc).unwrap() {
            ExportOutcome::Ready(bytes) => {
                assert!(pdf_available());
                assert!(bytes.starts_with(b"%PDF"));
            }
            ExportOutcome::Unavailable => assert!(!pdf_available()),
        }
    }
}
