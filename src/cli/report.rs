use colored::Colorize;
use comfy_table::{Cell, Table};

use crate::charts::Measure;
use crate::cli::{compute, FilterArgs};
use crate::error::Result;
use crate::filter::departments;
use crate::fmt::{dollars, money, number, pct};
use crate::kpi::KpiLine;
use crate::loader::DataCache;
use crate::models::Record;
use crate::pipeline::{DashboardState, Warning};
use crate::tui::wrap_text;

const COST_CENTER_TREND: &str = "This selection is a cost center (no revenue). \
Trends for Revenue and Gross Margin are not applicable.";

fn heading(title: &str, state: &DashboardState) -> String {
    format!(
        "{}\nDepartment: {} | Range: {}",
        title.bold(),
        state.department,
        state.range_label()
    )
}

fn warning_lines(state: &DashboardState) -> String {
    state
        .warnings
        .iter()
        .filter(|w| **w != Warning::ExportCapabilityUnavailable)
        .map(|w| format!("{}\n", w.message().yellow()))
        .collect()
}

fn delta_cell(line: &KpiLine) -> Cell {
    match line.favorable {
        Some(true) => Cell::new(line.delta.as_str().green()),
        Some(false) => Cell::new(line.delta.as_str().red()),
        None => Cell::new(&line.delta),
    }
}

pub fn format_summary(state: &DashboardState) -> String {
    let mut table = Table::new();
    table.set_header(vec!["KPI", "Actual", "\u{0394} vs Budget"]);
    for line in &state.kpi_lines {
        table.add_row(vec![Cell::new(line.name), Cell::new(&line.value), delta_cell(line)]);
    }

    let (insights, _) = wrap_text(&state.insights_text(), 80);
    format!(
        "{}\n{}{table}\n\n{}\n{insights}",
        heading("Finance KPI Dashboard", state),
        warning_lines(state),
        "Key Insights".bold(),
    )
}

pub fn format_trend(state: &DashboardState) -> String {
    let title = heading("Monthly Trend", state);
    if state.is_empty() {
        return format!("{title}\n{}", warning_lines(state));
    }
    if !state.has_revenue {
        return format!("{title}\n{COST_CENTER_TREND}");
    }

    // the COGS column appears only when the selection has COGS rows
    let mut table = Table::new();
    if state.has_cogs {
        table.set_header(vec!["Month", "Revenue", "COGS", "Gross Margin", "GM %"]);
    } else {
        table.set_header(vec!["Month", "Revenue", "Gross Margin", "GM %"]);
    }
    for point in &state.trend {
        let mut cells = vec![Cell::new(point.month), Cell::new(dollars(point.revenue))];
        if state.has_cogs {
            cells.push(Cell::new(dollars(point.cogs)));
        }
        cells.push(Cell::new(dollars(point.gross_margin)));
        cells.push(Cell::new(pct(point.gross_margin_pct)));
        table.add_row(cells);
    }
    let note = if state.has_cogs {
        String::new()
    } else {
        "\nNo COGS recorded for this selection.".to_string()
    };
    format!("{title}\n{table}{note}")
}

pub fn format_variance(state: &DashboardState) -> String {
    let mut out = heading("Budget vs Actual", state);
    out.push('\n');
    if state.is_empty() {
        out.push_str(&warning_lines(state));
        return out;
    }

    if state.has_revenue {
        let mut table = Table::new();
        table.set_header(vec!["Month", "Actual Revenue", "Budget Revenue", "Variance"]);
        for point in &state.revenue_bva {
            let diff = point.actual - point.budget;
            let diff_cell = if diff.is_sign_negative() && !diff.is_zero() {
                Cell::new(dollars(diff).red())
            } else {
                Cell::new(dollars(diff))
            };
            table.add_row(vec![
                Cell::new(point.month),
                Cell::new(dollars(point.actual)),
                Cell::new(dollars(point.budget)),
                diff_cell,
            ]);
        }
        out.push_str(&format!("{}\n{table}\n\n", "Revenue: Budget vs Actual".bold()));
    }

    let Some(waterfall) = &state.waterfall else {
        return out;
    };
    out.push_str(&format!(
        "{}\nMonth: {} | Budget NI: {} | Actual NI: {} | Variance: {}\n",
        "Net Income Waterfall".bold(),
        waterfall.month,
        dollars(waterfall.budget_ni),
        dollars(waterfall.actual_ni),
        dollars(waterfall.variance()),
    ));

    let mut table = Table::new();
    table.set_header(vec!["Step", "Amount", "Running"]);
    for step in waterfall.steps() {
        let label = match step.measure {
            Measure::Relative => Cell::new(format!("  {}", step.label)),
            _ => Cell::new(step.label.bold()),
        };
        let amount = match step.measure {
            Measure::Relative if step.value.is_sign_negative() && !step.value.is_zero() => {
                Cell::new(dollars(step.value).red())
            }
            Measure::Relative if !step.value.is_zero() => {
                Cell::new(format!("+{}", dollars(step.value)).green())
            }
            _ => Cell::new(dollars(step.value)),
        };
        table.add_row(vec![label, amount, Cell::new(dollars(step.running))]);
    }
    out.push_str(&table.to_string());
    out
}

fn rows_table(title: &str, rows: &[Record], limit: usize) -> String {
    let mut table = Table::new();
    table.set_header(vec!["Department", "Date", "Account", "Amount"]);
    for r in rows.iter().take(limit) {
        table.add_row(vec![
            Cell::new(&r.department),
            Cell::new(r.date),
            Cell::new(r.account.label()),
            Cell::new(money(r.amount)),
        ]);
    }
    let shown = rows.len().min(limit);
    format!(
        "{} (showing {} of {} rows)\n{table}",
        title.bold(),
        number(shown),
        number(rows.len())
    )
}

pub fn format_data(state: &DashboardState, limit: usize) -> String {
    format!(
        "{}\n{}\n\n{}",
        heading("Filtered Data", state),
        rows_table("Actuals", &state.actuals, limit),
        rows_table("Budget", &state.budget, limit),
    )
}

pub fn format_departments(names: &[String]) -> String {
    if names.is_empty() {
        return "No departments found.".to_string();
    }
    let mut table = Table::new();
    table.set_header(vec!["Department"]);
    for name in names {
        table.add_row(vec![name]);
    }
    format!("{}\n{table}", "Departments".bold())
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

pub fn summary(filters: FilterArgs, json: bool) -> Result<()> {
    let (_, state) = compute(&filters, None)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&state)?);
    } else {
        println!("{}", format_summary(&state));
    }
    Ok(())
}

pub fn trend(filters: FilterArgs) -> Result<()> {
    let (_, state) = compute(&filters, None)?;
    println!("{}", format_trend(&state));
    Ok(())
}

pub fn variance(filters: FilterArgs, month: Option<String>) -> Result<()> {
    let (_, state) = compute(&filters, month.as_deref())?;
    println!("{}", format_variance(&state));
    Ok(())
}

pub fn data(filters: FilterArgs, limit: usize) -> Result<()> {
    let (_, state) = compute(&filters, None)?;
    println!("{}", format_data(&state, limit));
    Ok(())
}

pub fn list_departments(file: Option<String>) -> Result<()> {
    let filters = FilterArgs {
        file,
        ..FilterArgs::default()
    };
    let data = DataCache::new().get(&filters.data_path())?;
    println!("{}", format_departments(&departments(&data.actuals)));
    Ok(())
}
