//! Chart series derived from filtered views.
//!
//! Monthly series are continuous: every month between the first and last
//! observed month appears, zero-filled where no rows exist. The waterfall
//! bridges budget net income to actual net income for one month and always
//! balances exactly because amounts are decimal.

use std::collections::{BTreeMap, BTreeSet};

use rust_decimal::Decimal;
use serde::Serialize;

use crate::filter::in_month;
use crate::kpi::{margin_ratio, summarize};
use crate::models::{Account, Month, Record};

fn monthly_sums(view: &[Record], account: &Account) -> BTreeMap<Month, Decimal> {
    let mut sums: BTreeMap<Month, Decimal> = BTreeMap::new();
    for r in view.iter().filter(|r| &r.account == account) {
        *sums.entry(r.month()).or_default() += r.amount;
    }
    sums
}

/// Continuous month axis covering the keys of every series given.
fn month_axis(series: &[&BTreeMap<Month, Decimal>]) -> Vec<Month> {
    let first = series.iter().filter_map(|s| s.keys().next()).min();
    let last = series.iter().filter_map(|s| s.keys().next_back()).max();
    match (first, last) {
        (Some(&first), Some(&last)) => Month::range(first, last),
        _ => Vec::new(),
    }
}

// ---------------------------------------------------------------------------
// Trend
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendPoint {
    pub month: Month,
    pub revenue: Decimal,
    pub cogs: Decimal,
    pub gross_margin: Decimal,
    pub gross_margin_pct: Decimal,
}

pub fn monthly_trend(actuals: &[Record]) -> Vec<TrendPoint> {
    let revenue = monthly_sums(actuals, &Account::Revenue);
    let cogs = monthly_sums(actuals, &Account::Cogs);
    month_axis(&[&revenue, &cogs])
        .into_iter()
        .map(|month| {
            let rev = revenue.get(&month).copied().unwrap_or_default();
            let cost = cogs.get(&month).copied().unwrap_or_default();
            let gm = rev + cost;
            TrendPoint {
                month,
                revenue: rev,
                cogs: cost,
                gross_margin: gm,
                gross_margin_pct: margin_ratio(gm, rev),
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Revenue: budget vs actual
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BudgetActualPoint {
    pub month: Month,
    pub actual: Decimal,
    pub budget: Decimal,
}

pub fn revenue_budget_vs_actual(actuals: &[Record], budget: &[Record]) -> Vec<BudgetActualPoint> {
    let act = monthly_sums(actuals, &Account::Revenue);
    let bud = monthly_sums(budget, &Account::Revenue);
    month_axis(&[&act, &bud])
        .into_iter()
        .map(|month| BudgetActualPoint {
            month,
            actual: act.get(&month).copied().unwrap_or_default(),
            budget: bud.get(&month).copied().unwrap_or_default(),
        })
        .collect()
}

/// Months present in the filtered actuals, oldest first.
pub fn month_options(actuals: &[Record]) -> Vec<Month> {
    actuals
        .iter()
        .map(Record::month)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

// ---------------------------------------------------------------------------
// Net income waterfall
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Measure {
    Absolute,
    Relative,
    Total,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WaterfallStep {
    pub label: &'static str,
    pub measure: Measure,
    pub value: Decimal,
    /// Bar top after this step is applied.
    pub running: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Waterfall {
    pub month: Month,
    pub budget_ni: Decimal,
    pub revenue_variance: Decimal,
    pub cogs_impact: Decimal,
    pub opex_impact: Decimal,
    pub actual_ni: Decimal,
}

impl Waterfall {
    pub fn variance(&self) -> Decimal {
        self.actual_ni - self.budget_ni
    }

    /// Budget NI plus the three relative steps lands on actual NI.
    pub fn is_balanced(&self) -> bool {
        self.budget_ni + self.revenue_variance + self.cogs_impact + self.opex_impact
            == self.actual_ni
    }

    pub fn steps(&self) -> Vec<WaterfallStep> {
        let mut running = self.budget_ni;
        let mut steps = vec![WaterfallStep {
            label: "Budget NI",
            measure: Measure::Absolute,
            value: self.budget_ni,
            running,
        }];
        for (label, value) in [
            ("Revenue", self.revenue_variance),
            ("COGS", self.cogs_impact),
            ("OpEx", self.opex_impact),
        ] {
            running += value;
            steps.push(WaterfallStep {
                label,
                measure: Measure::Relative,
                value,
                running,
            });
        }
        steps.push(WaterfallStep {
            label: "Actual NI",
            measure: Measure::Total,
            value: self.actual_ni,
            running: self.actual_ni,
        });
        steps
    }
}

/// Actual minus budget spend, as positive cost magnitudes.
fn cost_overrun(actual: Decimal, budget: Decimal) -> Decimal {
    (-actual) - (-budget)
}

pub fn waterfall(actuals: &[Record], budget: &[Record], month: Month) -> Waterfall {
    let act = summarize(&in_month(actuals, month));
    let bud = summarize(&in_month(budget, month));
    Waterfall {
        month,
        budget_ni: bud.net_income,
        revenue_variance: act.revenue - bud.revenue,
        // inverted variance of the cost magnitude; costs are stored negative
        cogs_impact: -(cost_overrun(act.cogs, bud.cogs)),
        opex_impact: -(cost_overrun(act.opex, bud.opex)),
        actual_ni: act.net_income,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kpi::tests::{example_actuals, example_budget, row};
    use rust_decimal_macros::dec;

    fn m(year: i32, month: u32) -> Month {
        Month { year, month }
    }

    #[test]
    fn test_trend_fills_gaps() {
        let view = vec![
            row("A", (2024, 1, 5), Account::Revenue, dec!(100)),
            row("A", (2024, 1, 6), Account::Cogs, dec!(-40)),
            row("A", (2024, 4, 2), Account::Cogs, dec!(-10)),
            row("A", (2024, 3, 2), Account::Opex, dec!(-999)),
        ];
        let trend = monthly_trend(&view);
        let months: Vec<Month> = trend.iter().map(|p| p.month).collect();
        assert_eq!(months, vec![m(2024, 1), m(2024, 2), m(2024, 3), m(2024, 4)]);
        assert_eq!(trend[0].gross_margin, dec!(60));
        assert_eq!(trend[0].gross_margin_pct, dec!(0.6));
        assert_eq!(trend[1].revenue, dec!(0));
        assert_eq!(trend[1].gross_margin_pct, dec!(0));
        assert_eq!(trend[3].gross_margin, dec!(-10));
        assert_eq!(trend[3].gross_margin_pct, dec!(0));
    }

    #[test]
    fn test_trend_spans_year_boundary() {
        let view = vec![
            row("A", (2023, 11, 30), Account::Revenue, dec!(1)),
            row("A", (2024, 2, 1), Account::Revenue, dec!(1)),
        ];
        assert_eq!(monthly_trend(&view).len(), 4);
    }

    #[test]
    fn test_trend_empty() {
        assert!(monthly_trend(&[]).is_empty());
    }

    #[test]
    fn test_revenue_bva_aligns_and_zero_fills() {
        let actuals = vec![
            row("A", (2024, 1, 5), Account::Revenue, dec!(100)),
            row("A", (2024, 3, 5), Account::Revenue, dec!(300)),
        ];
        let budget = vec![
            row("A", (2024, 2, 1), Account::Revenue, dec!(200)),
            row("A", (2024, 2, 1), Account::Opex, dec!(-50)),
        ];
        let bva = revenue_budget_vs_actual(&actuals, &budget);
        assert_eq!(bva.len(), 3);
        assert_eq!(bva[0], BudgetActualPoint { month: m(2024, 1), actual: dec!(100), budget: dec!(0) });
        assert_eq!(bva[1], BudgetActualPoint { month: m(2024, 2), actual: dec!(0), budget: dec!(200) });
        assert_eq!(bva[2].actual, dec!(300));
    }

    #[test]
    fn test_month_options_sorted_distinct() {
        let view = vec![
            row("A", (2024, 3, 5), Account::Revenue, dec!(1)),
            row("A", (2024, 1, 5), Account::Revenue, dec!(1)),
            row("A", (2024, 3, 9), Account::Opex, dec!(1)),
        ];
        assert_eq!(month_options(&view), vec![m(2024, 1), m(2024, 3)]);
    }

    #[test]
    fn test_waterfall_example() {
        let wf = waterfall(&example_actuals(), &example_budget(), m(2024, 1));
        assert_eq!(wf.budget_ni, dec!(230));
        assert_eq!(wf.revenue_variance, dec!(100));
        assert_eq!(wf.cogs_impact, dec!(-50));
        assert_eq!(wf.opex_impact, dec!(20));
        assert_eq!(wf.actual_ni, dec!(300));
        assert_eq!(wf.variance(), dec!(70));
        assert!(wf.is_balanced());

        let steps = wf.steps();
        assert_eq!(steps.len(), 5);
        assert_eq!(steps[0].measure, Measure::Absolute);
        assert_eq!(steps[3].running, dec!(300));
        assert_eq!(steps[4].measure, Measure::Total);
        assert_eq!(steps[4].value, steps[3].running);
    }

    #[test]
    fn test_waterfall_balances_with_fractional_amounts() {
        let actuals = vec![
            row("A", (2024, 5, 1), Account::Revenue, dec!(0.1)),
            row("A", (2024, 5, 2), Account::Revenue, dec!(0.2)),
            row("A", (2024, 5, 3), Account::Cogs, dec!(-0.3)),
            row("A", (2024, 5, 4), Account::Opex, dec!(-1234.567)),
            row("A", (2024, 6, 4), Account::Opex, dec!(-5)),
        ];
        let budget = vec![
            row("A", (2024, 5, 1), Account::Revenue, dec!(0.7)),
            row("A", (2024, 5, 1), Account::Opex, dec!(-1000.01)),
        ];
        let wf = waterfall(&actuals, &budget, m(2024, 5));
        assert!(wf.is_balanced());
        assert_eq!(wf.actual_ni, dec!(-1234.567));
    }

    #[test]
    fn test_waterfall_month_without_budget() {
        let wf = waterfall(&example_actuals(), &[], m(2024, 1));
        assert_eq!(wf.budget_ni, dec!(0));
        assert!(wf.is_balanced());
    }
}
