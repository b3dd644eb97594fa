pub mod config;
pub mod dashboard;
pub mod export;
pub mod report;

use std::path::PathBuf;
use std::rc::Rc;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};

use crate::error::Result;
use crate::loader::DataCache;
use crate::models::{DataSet, Department, Month};
use crate::pipeline::{recompute, DashboardState, Selection};
use crate::settings::{expand_path, load_settings};

#[derive(Parser)]
#[command(
    name = "finance-kpi",
    about = "Actuals vs budget KPI dashboard with variance charts and exports."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Data source and filters shared by every view.
#[derive(Args, Debug, Clone)]
pub struct FilterArgs {
    /// Workbook with Actuals and Budget sheets (default: from settings)
    #[arg(long)]
    pub file: Option<String>,
    /// Department name, or "All"
    #[arg(long, default_value = "All")]
    pub dept: String,
    /// Start date: YYYY-MM-DD (default: earliest actual)
    #[arg(long = "from")]
    pub from_date: Option<NaiveDate>,
    /// End date: YYYY-MM-DD (default: latest actual)
    #[arg(long = "to")]
    pub to_date: Option<NaiveDate>,
}

impl Default for FilterArgs {
    fn default() -> Self {
        Self {
            file: None,
            dept: Department::All.label().to_string(),
            from_date: None,
            to_date: None,
        }
    }
}

impl FilterArgs {
    pub fn data_path(&self) -> PathBuf {
        match &self.file {
            Some(f) => expand_path(f),
            None => expand_path(&load_settings().data_file),
        }
    }

    pub fn selection(&self, month: Option<&str>) -> Result<Selection> {
        let month = month.map(str::parse::<Month>).transpose()?;
        Ok(Selection {
            department: Department::from_choice(&self.dept),
            start: self.from_date,
            end: self.to_date,
            month,
        })
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Interactive dashboard (default).
    Dashboard {
        #[command(flatten)]
        filters: FilterArgs,
    },
    /// KPI table and insights for the selection.
    Summary {
        #[command(flatten)]
        filters: FilterArgs,
        /// Print the computed dashboard state as JSON
        #[arg(long)]
        json: bool,
    },
    /// Monthly revenue and gross margin trend.
    Trend {
        #[command(flatten)]
        filters: FilterArgs,
    },
    /// Revenue budget vs actual and the net income waterfall.
    Variance {
        #[command(flatten)]
        filters: FilterArgs,
        /// Waterfall month: YYYY-MM (default: latest month with actuals)
        #[arg(long)]
        month: Option<String>,
    },
    /// Preview the filtered rows.
    Data {
        #[command(flatten)]
        filters: FilterArgs,
        /// Maximum rows per table
        #[arg(long, default_value = "50")]
        limit: usize,
    },
    /// List departments in the Actuals sheet.
    Departments {
        #[arg(long)]
        file: Option<String>,
    },
    /// Export filtered data to Excel and the executive summary to PDF.
    Export {
        #[command(flatten)]
        filters: FilterArgs,
        /// Waterfall month shown in the summary: YYYY-MM
        #[arg(long)]
        month: Option<String>,
        /// Output directory (default: from settings)
        #[arg(long = "output-dir")]
        output_dir: Option<String>,
        /// Skip the PDF summary
        #[arg(long = "xlsx-only")]
        xlsx_only: bool,
    },
    /// Show or update settings.
    Config {
        /// Default workbook path
        #[arg(long = "data-file")]
        data_file: Option<String>,
        /// Default export directory
        #[arg(long = "export-dir")]
        export_dir: Option<String>,
    },
}

/// Load the workbook and run one full recomputation for the filters.
pub(crate) fn compute(
    filters: &FilterArgs,
    month: Option<&str>,
) -> Result<(Rc<DataSet>, DashboardState)> {
    let selection = filters.selection(month)?;
    let data = DataCache::new().get(&filters.data_path())?;
    let state = recompute(&data, &selection)?;
    Ok((data, state))
}

pub fn export_dir(output_dir: Option<String>) -> PathBuf {
    match output_dir {
        Some(dir) => expand_path(&dir),
        None => expand_path(&load_settings().export_dir),
    }
}
