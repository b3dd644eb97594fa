mod charts;
mod cli;
mod error;
mod export;
mod filter;
mod fmt;
mod insights;
mod kpi;
mod loader;
mod models;
mod pdf;
mod pipeline;
mod settings;
mod tui;

use clap::Parser;
use env_logger::Env;

use cli::{Cli, Commands};

fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    let result = match cli.command {
        None => cli::dashboard::run(cli::FilterArgs::default()),
        Some(Commands::Dashboard { filters }) => cli::dashboard::run(filters),
        Some(Commands::Summary { filters, json }) => cli::report::summary(filters, json),
        Some(Commands::Trend { filters }) => cli::report::trend(filters),
        Some(Commands::Variance { filters, month }) => cli::report::variance(filters, month),
        Some(Commands::Data { filters, limit }) => cli::report::data(filters, limit),
        Some(Commands::Departments { file }) => cli::report::list_departments(file),
        Some(Commands::Export {
            filters,
            month,
            output_dir,
            xlsx_only,
        }) => cli::export::run(filters, month, output_dir, xlsx_only).map(|_| ()),
        Some(Commands::Config {
            data_file,
            export_dir,
        }) => cli::config::run(data_file, export_dir),
    };

    if let Err(e) = result {
        if e.is_data_load() {
            eprintln!("Error: {e}");
        } else {
            log::debug!("{e:?}");
            eprintln!("Something went wrong.\n{e}");
        }
        std::process::exit(1);
    }
}
