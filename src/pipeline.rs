//! One full recomputation pass: filter both tables, then derive KPIs,
//! insights and chart series from the filtered views. Called once per user
//! interaction; nothing is carried over between passes.

use chrono::NaiveDate;
use serde::Serialize;

use crate::charts::{self, BudgetActualPoint, TrendPoint, Waterfall};
use crate::error::{KpiError, Result};
use crate::filter;
use crate::insights;
use crate::kpi::{self, KpiLine, KpiSnapshot, Variance};
use crate::models::{DataSet, Department, Month, Record};

/// What the user picked. Missing bounds default to the data extent; a missing
/// month defaults to the latest month with actuals.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selection {
    pub department: Department,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub month: Option<Month>,
}

/// Non-fatal conditions the views should surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Warning {
    /// No actual rows in the selected department and range.
    EmptySelection,
    /// Built without the PDF renderer.
    ExportCapabilityUnavailable,
}

impl Warning {
    pub fn message(&self) -> &'static str {
        match self {
            Warning::EmptySelection => "No data available for the selected filters.",
            Warning::ExportCapabilityUnavailable => {
                "PDF export is unavailable in this build. Use the Excel export instead."
            }
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardState {
    pub department: String,
    /// Resolved range; `None` when the department has no actuals at all.
    pub range: Option<(NaiveDate, NaiveDate)>,
    /// Full date extent of the department's actuals, for clamping controls.
    pub extent: Option<(NaiveDate, NaiveDate)>,
    #[serde(skip)]
    pub actuals: Vec<Record>,
    #[serde(skip)]
    pub budget: Vec<Record>,
    pub actual: KpiSnapshot,
    pub planned: KpiSnapshot,
    pub variance: Variance,
    pub has_revenue: bool,
    pub has_cogs: bool,
    pub kpi_lines: Vec<KpiLine>,
    pub insights: Vec<String>,
    pub trend: Vec<TrendPoint>,
    pub revenue_bva: Vec<BudgetActualPoint>,
    pub months: Vec<Month>,
    pub waterfall: Option<Waterfall>,
    pub warnings: Vec<Warning>,
}

impl DashboardState {
    pub fn insights_text(&self) -> String {
        insights::paragraph(&self.insights)
    }

    pub fn range_label(&self) -> String {
        match self.range {
            Some((start, end)) => format!("{start} to {end}"),
            None => "no data".to_string(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.warnings.contains(&Warning::EmptySelection)
    }
}

pub fn recompute(data: &DataSet, selection: &Selection) -> Result<DashboardState> {
    let dept = &selection.department;
    let extent = filter::date_extent(&filter::by_department(&data.actuals, dept));

    let (range, actuals, budget) = match extent {
        Some(extent) => {
            let (start, end) = filter::clamp_range(extent, selection.start, selection.end);
            (
                Some((start, end)),
                filter::filter(&data.actuals, dept, start, end),
                filter::filter(&data.budget, dept, start, end),
            )
        }
        None => (None, Vec::new(), Vec::new()),
    };

    let mut warnings = Vec::new();
    if actuals.is_empty() {
        warnings.push(Warning::EmptySelection);
    }
    if !crate::export::pdf_available() {
        warnings.push(Warning::ExportCapabilityUnavailable);
    }

    let has_revenue = kpi::has_revenue(&actuals);
    let actual = kpi::summarize(&actuals);
    let planned = kpi::summarize(&budget);
    let variance = Variance::between(&actual, &planned);

    let months = charts::month_options(&actuals);
    let waterfall_month = match selection.month {
        Some(m) if months.contains(&m) => Some(m),
        Some(m) => {
            let available: Vec<String> = months.iter().map(|m| m.to_string()).collect();
            return Err(KpiError::InvalidArgument(format!(
                "no actuals for {m} in this selection (available: {})",
                if available.is_empty() { "none".to_string() } else { available.join(", ") }
            )));
        }
        None => months.last().copied(),
    };

    let (trend, revenue_bva) = if has_revenue {
        (
            charts::monthly_trend(&actuals),
            charts::revenue_budget_vs_actual(&actuals, &budget),
        )
    } else {
        (Vec::new(), Vec::new())
    };

    Ok(DashboardState {
        department: dept.label().to_string(),
        range,
        extent,
        kpi_lines: kpi::kpi_lines(&actual, &variance, has_revenue),
        insights: insights::insights(&actual, &planned, has_revenue),
        waterfall: waterfall_month.map(|m| charts::waterfall(&actuals, &budget, m)),
        has_cogs: kpi::has_cogs(&actuals),
        has_revenue,
        trend,
        revenue_bva,
        months,
        actual,
        planned,
        variance,
        actuals,
        budget,
        warnings,
    })
}
