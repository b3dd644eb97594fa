use rust_decimal::Decimal;
use serde::Serialize;

use crate::fmt::{dollars, pct, pp};
use crate::models::{Account, Record};

/// Category totals and derived figures for one side (actual or budget).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct KpiSnapshot {
    pub revenue: Decimal,
    pub cogs: Decimal,
    pub opex: Decimal,
    pub gross_margin: Decimal,
    /// Ratio, not percent. Zero when revenue is zero.
    pub gross_margin_pct: Decimal,
    pub net_income: Decimal,
}

pub fn sum_account(view: &[Record], account: &Account) -> Decimal {
    view.iter()
        .filter(|r| &r.account == account)
        .map(|r| r.amount)
        .sum()
}

/// Guarded gross margin ratio: 0 when revenue is 0.
pub fn margin_ratio(gross_margin: Decimal, revenue: Decimal) -> Decimal {
    if revenue.is_zero() {
        return Decimal::ZERO;
    }
    gross_margin.checked_div(revenue).unwrap_or(Decimal::ZERO)
}

pub fn summarize(view: &[Record]) -> KpiSnapshot {
    let revenue = sum_account(view, &Account::Revenue);
    let cogs = sum_account(view, &Account::Cogs);
    let opex = sum_account(view, &Account::Opex);
    let gross_margin = revenue + cogs;
    KpiSnapshot {
        revenue,
        cogs,
        opex,
        gross_margin,
        gross_margin_pct: margin_ratio(gross_margin, revenue),
        net_income: gross_margin + opex,
    }
}

pub fn has_revenue(view: &[Record]) -> bool {
    view.iter().any(|r| r.account == Account::Revenue)
}

pub fn has_cogs(view: &[Record]) -> bool {
    view.iter().any(|r| r.account == Account::Cogs)
}

/// Actual minus budget for every KPI.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Variance {
    pub revenue: Decimal,
    pub cogs: Decimal,
    pub opex: Decimal,
    pub gross_margin: Decimal,
    /// Percentage points.
    pub gross_margin_pp: Decimal,
    pub net_income: Decimal,
    /// OpEx variance with the sign flipped: an underrun is positive.
    pub opex_savings: Decimal,
}

impl Variance {
    pub fn between(actual: &KpiSnapshot, budget: &KpiSnapshot) -> Self {
        let opex = actual.opex - budget.opex;
        Self {
            revenue: actual.revenue - budget.revenue,
            cogs: actual.cogs - budget.cogs,
            opex,
            gross_margin: actual.gross_margin - budget.gross_margin,
            gross_margin_pp: (actual.gross_margin_pct - budget.gross_margin_pct)
                * Decimal::ONE_HUNDRED,
            net_income: actual.net_income - budget.net_income,
            opex_savings: -opex,
        }
    }
}

/// One display row: `name: value (Δ delta)`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KpiLine {
    pub name: &'static str,
    pub value: String,
    pub delta: String,
    /// Sign of the delta from the reader's point of view (savings positive).
    #[serde(skip)]
    pub favorable: Option<bool>,
}

fn tone(delta: Decimal) -> Option<bool> {
    if delta.is_zero() {
        None
    } else {
        Some(delta > Decimal::ZERO)
    }
}

/// The five headline KPIs formatted for display. Revenue-dependent lines read
/// "$0"/"N/A" when the selection has no revenue rows.
pub fn kpi_lines(actual: &KpiSnapshot, variance: &Variance, has_revenue: bool) -> Vec<KpiLine> {
    let mut lines = Vec::with_capacity(5);
    if has_revenue {
        lines.push(KpiLine {
            name: "Revenue",
            value: dollars(actual.revenue),
            delta: dollars(variance.revenue),
            favorable: tone(variance.revenue),
        });
        lines.push(KpiLine {
            name: "Gross Margin",
            value: dollars(actual.gross_margin),
            delta: dollars(variance.gross_margin),
            favorable: tone(variance.gross_margin),
        });
        lines.push(KpiLine {
            name: "Gross Margin %",
            value: pct(actual.gross_margin_pct),
            delta: pp(variance.gross_margin_pp),
            favorable: tone(variance.gross_margin_pp),
        });
    } else {
        for name in ["Revenue", "Gross Margin"] {
            lines.push(KpiLine {
                name,
                value: "$0".into(),
                delta: "$0".into(),
                favorable: None,
            });
        }
        lines.push(KpiLine {
            name: "Gross Margin %",
            value: "N/A".into(),
            delta: "N/A".into(),
            favorable: None,
        });
    }
    lines.push(KpiLine {
        name: "Operating Expenses",
        value: dollars(actual.opex),
        delta: dollars(variance.opex_savings),
        favorable: tone(variance.opex_savings),
    });
    lines.push(KpiLine {
        name: "Net Income",
        value: dollars(actual.net_income),
        delta: dollars(variance.net_income),
        favorable: tone(variance.net_income),
    });
    lines
}
