use std::path::PathBuf;
use std::rc::Rc;

use chrono::{Months, NaiveDate};
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Bar, BarChart, BarGroup, Block, Borders, Cell, Paragraph, Row, Table, Tabs, Wrap},
    Frame,
};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::charts::Measure;
use crate::cli::{export_dir, FilterArgs};
use crate::error::{KpiError, Result};
use crate::filter::departments;
use crate::fmt::{dollars, money, number, pct};
use crate::loader::DataCache;
use crate::models::{DataSet, Department, Month};
use crate::pipeline::{recompute, DashboardState, Selection, Warning};
use crate::tui::{
    delta_span, money_span, BOLD, FOOTER_STYLE, HEADER_STYLE, SELECTED_STYLE,
};

const TAB_TITLES: [&str; 3] = ["Trends", "Variance", "Data & Export"];

const HINTS: &str = " \u{2190}/\u{2192}=department  Tab=view  [ ]=start  { }=end  \
\u{2191}/\u{2193}=month/scroll  x=xlsx  p=pdf  r=reload  q=quit";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tab {
    Trends,
    Variance,
    Data,
}

impl Tab {
    fn index(self) -> usize {
        match self {
            Tab::Trends => 0,
            Tab::Variance => 1,
            Tab::Data => 2,
        }
    }

    fn next(self) -> Self {
        match self {
            Tab::Trends => Tab::Variance,
            Tab::Variance => Tab::Data,
            Tab::Data => Tab::Trends,
        }
    }

    fn prev(self) -> Self {
        match self {
            Tab::Trends => Tab::Data,
            Tab::Variance => Tab::Trends,
            Tab::Data => Tab::Variance,
        }
    }
}

struct Dashboard {
    path: PathBuf,
    export_dir: PathBuf,
    cache: DataCache,
    data: Rc<DataSet>,
    /// "All" followed by the departments present in Actuals.
    departments: Vec<String>,
    dept_idx: usize,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    month: Option<Month>,
    tab: Tab,
    scroll: usize,
    state: Option<DashboardState>,
    status: Option<String>,
}

impl Dashboard {
    fn new(path: PathBuf, export_dir: PathBuf, cache: DataCache, data: Rc<DataSet>) -> Self {
        let mut dash = Self {
            path,
            export_dir,
            cache,
            data,
            departments: Vec::new(),
            dept_idx: 0,
            start: None,
            end: None,
            month: None,
            tab: Tab::Trends,
            scroll: 0,
            state: None,
            status: None,
        };
        dash.sync_departments();
        dash
    }

    fn sync_departments(&mut self) {
        let current = self.departments.get(self.dept_idx).cloned();
        let mut names = vec![Department::All.label().to_string()];
        names.extend(departments(&self.data.actuals));
        self.dept_idx = current
            .and_then(|c| names.iter().position(|n| *n == c))
            .unwrap_or(0);
        self.departments = names;
    }

    fn selection(&self) -> Selection {
        let dept = self
            .departments
            .get(self.dept_idx)
            .map(|d| Department::from_choice(d))
            .unwrap_or_default();
        Selection {
            department: dept,
            start: self.start,
            end: self.end,
            month: self.month,
        }
    }

    /// Rerun the pipeline. On failure the previous state stays on screen.
    fn refresh(&mut self) {
        let mut result = recompute(&self.data, &self.selection());
        if result.is_err() && self.month.is_some() {
            // the picked month fell outside the new range
            self.month = None;
            result = recompute(&self.data, &self.selection());
        }
        match result {
            Ok(state) => {
                if let Some((start, end)) = state.range {
                    self.start = Some(start);
                    self.end = Some(end);
                }
                self.scroll = self.scroll.min(state.actuals.len().saturating_sub(1));
                self.state = Some(state);
            }
            Err(e) => self.status = Some(format!("Error: {e}")),
        }
    }

    fn reload(&mut self) {
        self.cache.invalidate();
        match self.cache.get(&self.path) {
            Ok(data) => {
                self.data = data;
                self.sync_departments();
                self.refresh();
                self.status = Some(format!("Reloaded {}", self.path.display()));
            }
            Err(e) => self.status = Some(format!("Error: {e}")),
        }
    }

    fn cycle_department(&mut self, forward: bool) {
        let n = self.departments.len().max(1);
        self.dept_idx = if forward {
            (self.dept_idx + 1) % n
        } else {
            (self.dept_idx + n - 1) % n
        };
        self.start = None;
        self.end = None;
        self.month = None;
        self.scroll = 0;
        self.refresh();
    }

    fn shift_date(&mut self, which_end: bool, forward: bool) {
        let (Some(start), Some(end)) = (self.start, self.end) else {
            self.status = Some(Warning::EmptySelection.message().to_string());
            return;
        };
        let base = if which_end { end } else { start };
        let moved = if forward {
            base.checked_add_months(Months::new(1))
        } else {
            base.checked_sub_months(Months::new(1))
        };
        let Some(moved) = moved else { return };
        if (!which_end && moved > end) || (which_end && moved < start) {
            self.status = Some("Start date must stay on or before the end date.".to_string());
            return;
        }
        if which_end {
            self.end = Some(moved);
        } else {
            self.start = Some(moved);
        }
        self.refresh();
    }

    fn step_month(&mut self, forward: bool) {
        let Some(state) = &self.state else { return };
        let Some(current) = state.waterfall.as_ref().map(|w| w.month) else {
            return;
        };
        let Some(pos) = state.months.iter().position(|m| *m == current) else {
            return;
        };
        let next = if forward {
            state.months.get(pos + 1)
        } else {
            pos.checked_sub(1).and_then(|p| state.months.get(p))
        };
        if let Some(m) = next.copied() {
            self.month = Some(m);
            self.refresh();
        }
    }

    fn scroll_rows(&mut self, forward: bool) {
        let len = self.state.as_ref().map(|s| s.actuals.len()).unwrap_or(0);
        if forward {
            if self.scroll + 1 < len {
                self.scroll += 1;
            }
        } else {
            self.scroll = self.scroll.saturating_sub(1);
        }
    }

    fn export(&mut self, pdf: bool) {
        let Some(state) = &self.state else { return };
        let result = if pdf {
            super::export::write_pdf(state, &self.export_dir).map(|written| match written {
                Some(path) => format!("Wrote {path}"),
                None => Warning::ExportCapabilityUnavailable.message().to_string(),
            })
        } else {
            super::export::write_xlsx(state, &self.export_dir).map(|path| format!("Wrote {path}"))
        };
        self.status = Some(result.unwrap_or_else(|e| format!("Export failed: {e}")));
    }

    /// Returns true when the dashboard should close.
    fn handle_key(&mut self, code: KeyCode) -> bool {
        self.status = None;
        match code {
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Left => self.cycle_department(false),
            KeyCode::Right => self.cycle_department(true),
            KeyCode::Tab => self.tab = self.tab.next(),
            KeyCode::BackTab => self.tab = self.tab.prev(),
            KeyCode::Char('[') => self.shift_date(false, false),
            KeyCode::Char(']') => self.shift_date(false, true),
            KeyCode::Char('{') => self.shift_date(true, false),
            KeyCode::Char('}') => self.shift_date(true, true),
            KeyCode::Up => match self.tab {
                Tab::Variance => self.step_month(false),
                Tab::Data => self.scroll_rows(false),
                Tab::Trends => {}
            },
            KeyCode::Down => match self.tab {
                Tab::Variance => self.step_month(true),
                Tab::Data => self.scroll_rows(true),
                Tab::Trends => {}
            },
            KeyCode::Char('x') => self.export(false),
            KeyCode::Char('p') => self.export(true),
            KeyCode::Char('r') => self.reload(),
            _ => {}
        }
        false
    }

    // -----------------------------------------------------------------------
    // Drawing
    // -----------------------------------------------------------------------

    fn draw(&self, frame: &mut Frame) {
        let area = frame.area();
        let [header_area, sep, kpi_area, insight_area, tabs_area, content_area, hints_area] =
            Layout::vertical([
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Length(4),
                Constraint::Length(4),
                Constraint::Length(1),
                Constraint::Fill(1),
                Constraint::Length(1),
            ])
            .areas(area);

        let dept = self
            .departments
            .get(self.dept_idx)
            .map(String::as_str)
            .unwrap_or("All");
        let range = self
            .state
            .as_ref()
            .map(|s| s.range_label())
            .unwrap_or_else(|| "no data".to_string());
        frame.render_widget(
            Paragraph::new(format!(
                " Finance KPI Dashboard   Department: < {dept} >   Range: {range}"
            ))
            .style(HEADER_STYLE),
            header_area,
        );
        let sep_line = "\u{2501}".repeat(area.width as usize);
        frame.render_widget(
            Paragraph::new(sep_line.as_str()).style(Style::default().fg(Color::DarkGray)),
            sep,
        );

        if let Some(state) = &self.state {
            self.draw_kpis(frame, state, kpi_area);
            let mut lines = vec![Line::from(Span::styled(" Key Insights", BOLD))];
            if state.is_empty() {
                lines.push(Line::from(format!(" {}", Warning::EmptySelection.message())));
            } else {
                lines.push(Line::from(format!(" {}", state.insights_text())));
            }
            frame.render_widget(
                Paragraph::new(lines).wrap(Wrap { trim: true }),
                insight_area,
            );

            let tabs = Tabs::new(TAB_TITLES.to_vec())
                .select(self.tab.index())
                .style(FOOTER_STYLE)
                .highlight_style(SELECTED_STYLE);
            frame.render_widget(tabs, tabs_area);

            match self.tab {
                Tab::Trends => self.draw_trends(frame, state, content_area),
                Tab::Variance => self.draw_variance(frame, state, content_area),
                Tab::Data => self.draw_data(frame, state, content_area),
            }
        }

        match &self.status {
            Some(msg) => frame.render_widget(
                Paragraph::new(format!(" {msg}")).style(Style::default().fg(Color::Yellow)),
                hints_area,
            ),
            None => frame.render_widget(Paragraph::new(HINTS).style(FOOTER_STYLE), hints_area),
        }
    }

    fn draw_kpis(&self, frame: &mut Frame, state: &DashboardState, area: Rect) {
        let cols = Layout::horizontal([Constraint::Ratio(1, 5); 5]).split(area);
        for (line, col) in state.kpi_lines.iter().zip(cols.iter()) {
            let block = Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::DarkGray));
            let text = vec![
                Line::from(Span::styled(line.name, BOLD)),
                Line::from(vec![
                    Span::raw(format!("{}  ", line.value)),
                    delta_span(&format!("\u{0394} {}", line.delta), line.favorable),
                ]),
            ];
            frame.render_widget(Paragraph::new(text).block(block), *col);
        }
    }

    fn empty_message(frame: &mut Frame, text: &str, area: Rect) {
        frame.render_widget(
            Paragraph::new(format!(" {text}"))
                .style(FOOTER_STYLE)
                .wrap(Wrap { trim: true }),
            area,
        );
    }

    fn draw_trends(&self, frame: &mut Frame, state: &DashboardState, area: Rect) {
        if state.is_empty() {
            return Self::empty_message(frame, Warning::EmptySelection.message(), area);
        }
        if !state.has_revenue {
            return Self::empty_message(
                frame,
                "This selection is a cost center (no revenue). \
                 Trends for Revenue and Gross Margin are not applicable.",
                area,
            );
        }

        let [chart_area, margin_area] =
            Layout::horizontal([Constraint::Percentage(65), Constraint::Percentage(35)])
                .areas(area);

        let bars: Vec<Bar> = state
            .trend
            .iter()
            .map(|p| {
                Bar::default()
                    .value(bar_value(p.revenue))
                    .text_value(String::new())
                    .label(Line::from(p.month.short_label()))
                    .style(Style::default().fg(Color::Rgb(80, 220, 100)))
            })
            .collect();
        let chart = BarChart::default()
            .block(
                Block::default()
                    .title("Monthly Revenue")
                    .title_style(Style::default().add_modifier(Modifier::BOLD)),
            )
            .bar_width(3)
            .bar_gap(1)
            .data(BarGroup::default().bars(&bars));
        frame.render_widget(chart, chart_area);

        let mut lines = vec![Line::from(Span::styled(" Gross Margin", BOLD))];
        for p in &state.trend {
            lines.push(Line::from(vec![
                Span::raw(format!(" {}  ", p.month)),
                money_span(p.gross_margin),
                Span::styled(format!("  {}", pct(p.gross_margin_pct)), FOOTER_STYLE),
            ]));
        }
        frame.render_widget(Paragraph::new(lines), margin_area);
    }

    fn draw_variance(&self, frame: &mut Frame, state: &DashboardState, area: Rect) {
        if state.is_empty() {
            return Self::empty_message(frame, Warning::EmptySelection.message(), area);
        }
        let [chart_area, waterfall_area] =
            Layout::horizontal([Constraint::Percentage(55), Constraint::Percentage(45)])
                .areas(area);

        if state.has_revenue {
            let actual_style = Style::default().fg(Color::Rgb(80, 220, 100));
            let budget_style = Style::default().fg(Color::Rgb(100, 140, 220));
            let groups: Vec<BarGroup> = state
                .revenue_bva
                .iter()
                .map(|p| {
                    let bars = vec![
                        Bar::default()
                            .value(bar_value(p.actual))
                            .text_value(String::new())
                            .style(actual_style),
                        Bar::default()
                            .value(bar_value(p.budget))
                            .text_value(String::new())
                            .style(budget_style),
                    ];
                    BarGroup::default()
                        .label(Line::from(p.month.short_label()))
                        .bars(&bars)
                })
                .collect();
            let block = Block::default()
                .title(Line::from(vec![
                    Span::styled("Revenue: ", BOLD),
                    Span::styled("Actual", actual_style),
                    Span::raw(" vs "),
                    Span::styled("Budget", budget_style),
                ]))
                .borders(Borders::NONE);
            let mut chart = BarChart::default()
                .block(block)
                .bar_width(2)
                .bar_gap(0)
                .group_gap(1);
            for group in &groups {
                chart = chart.data(group.clone());
            }
            frame.render_widget(chart, chart_area);
        } else {
            Self::empty_message(frame, "No revenue in this selection.", chart_area);
        }

        let Some(wf) = &state.waterfall else {
            return;
        };
        let mut lines = vec![
            Line::from(Span::styled(
                format!(" Net Income Waterfall ({})  \u{2191}/\u{2193}=month", wf.month),
                BOLD,
            )),
            Line::from(Span::styled(
                format!(
                    " Budget NI: {} | Actual NI: {} | Variance: {}",
                    dollars(wf.budget_ni),
                    dollars(wf.actual_ni),
                    dollars(wf.variance())
                ),
                FOOTER_STYLE,
            )),
            Line::from(""),
        ];
        for step in wf.steps() {
            let label = match step.measure {
                Measure::Relative => Span::raw(format!("   {:<10}", step.label)),
                _ => Span::styled(format!(" {:<11}", step.label), BOLD),
            };
            lines.push(Line::from(vec![
                label,
                money_span(step.value),
                Span::styled(format!("  \u{2192} {}", dollars(step.running)), FOOTER_STYLE),
            ]));
        }
        frame.render_widget(Paragraph::new(lines), waterfall_area);
    }

    fn draw_data(&self, frame: &mut Frame, state: &DashboardState, area: Rect) {
        let [caption_area, table_area] =
            Layout::vertical([Constraint::Length(1), Constraint::Fill(1)]).areas(area);
        frame.render_widget(
            Paragraph::new(format!(
                " Actuals: {} rows   Budget: {} rows   x=export Excel  p=export PDF  -> {}",
                number(state.actuals.len()),
                number(state.budget.len()),
                self.export_dir.display()
            ))
            .style(FOOTER_STYLE),
            caption_area,
        );

        let rows: Vec<Row> = state
            .actuals
            .iter()
            .skip(self.scroll)
            .map(|r| {
                Row::new(vec![
                    Cell::from(r.department.clone()),
                    Cell::from(r.date.to_string()),
                    Cell::from(r.account.label().to_string()),
                    Cell::from(money(r.amount)),
                ])
            })
            .collect();
        let widths = [
            Constraint::Length(20),
            Constraint::Length(12),
            Constraint::Length(12),
            Constraint::Length(16),
        ];
        let table = Table::new(rows, widths)
            .header(Row::new(vec!["Department", "Date", "Account", "Amount"]).style(HEADER_STYLE));
        frame.render_widget(table, table_area);
    }
}

fn bar_value(amount: Decimal) -> u64 {
    amount.max(Decimal::ZERO).round().to_u64().unwrap_or(0)
}

pub fn run(filters: FilterArgs) -> Result<()> {
    let path = filters.data_path();
    let mut cache = DataCache::new();
    // load before touching the terminal so load errors print normally
    let data = cache.get(&path)?;
    let mut dashboard = Dashboard::new(path, export_dir(None), cache, data);
    if filters.dept != Department::All.label() {
        match dashboard.departments.iter().position(|d| *d == filters.dept) {
            Some(idx) => dashboard.dept_idx = idx,
            None => {
                return Err(KpiError::InvalidArgument(format!(
                    "unknown department '{}'",
                    filters.dept
                )))
            }
        }
    }
    dashboard.start = filters.from_date;
    dashboard.end = filters.to_date;
    dashboard.refresh();

    let hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        ratatui::restore();
        hook(info);
    }));

    let mut terminal = ratatui::init();
    let result: Result<()> = loop {
        if let Err(e) = terminal.draw(|frame| dashboard.draw(frame)) {
            break Err(e.into());
        }
        match event::read() {
            Err(e) => break Err(e.into()),
            Ok(Event::Key(key)) => {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c')
                {
                    break Ok(());
                }
                if dashboard.handle_key(key.code) {
                    break Ok(());
                }
            }
            _ => {}
        }
    };
    drop(terminal);
    ratatui::restore();
    result
}
