use std::path::{Path, PathBuf};

use crate::cli::{compute, export_dir, FilterArgs};
use crate::error::Result;
use crate::export::{
    filtered_workbook, summary_pdf, ExportOutcome, SummaryDocument, PDF_FILE_NAME,
    XLSX_FILE_NAME,
};
use crate::pipeline::{DashboardState, Warning};

fn write_file(bytes: &[u8], path: &Path) -> Result<String> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, bytes)?;
    log::info!("wrote {} bytes to {}", bytes.len(), path.display());
    Ok(path.display().to_string())
}

/// Filtered Actuals and Budget views as one workbook. Returns the written path.
pub fn write_xlsx(state: &DashboardState, dir: &Path) -> Result<String> {
    let bytes = filtered_workbook(&state.actuals, &state.budget)?;
    write_file(&bytes, &dir.join(XLSX_FILE_NAME))
}

/// Executive summary PDF. `None` when this build has no PDF renderer.
pub fn write_pdf(state: &DashboardState, dir: &Path) -> Result<Option<String>> {
    match summary_pdf(&SummaryDocument::from_state(state))? {
        ExportOutcome::Ready(bytes) => write_file(&bytes, &dir.join(PDF_FILE_NAME)).map(Some),
        ExportOutcome::Unavailable => Ok(None),
    }
}

pub fn run(
    filters: FilterArgs,
    month: Option<String>,
    output_dir: Option<String>,
    xlsx_only: bool,
) -> Result<Vec<String>> {
    let (_, state) = compute(&filters, month.as_deref())?;
    let dir: PathBuf = export_dir(output_dir);
    if state.is_empty() {
        eprintln!("{}", Warning::EmptySelection.message());
    }

    let mut written = vec![write_xlsx(&state, &dir)?];
    println!("Wrote {}", written[0]);

    if !xlsx_only {
        match write_pdf(&state, &dir)? {
            Some(path) => {
                println!("Wrote {path}");
                written.push(path);
            }
            None => eprintln!("{}", Warning::ExportCapabilityUnavailable.message()),
        }
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kpi::tests::{example_actuals, example_budget};
    use crate::models::DataSet;
    use crate::pipeline::{recompute, Selection};

    fn state() -> DashboardState {
        let data = DataSet {
            actuals: example_actuals(),
            budget: example_budget(),
        };
        recompute(&data, &Selection::default()).unwrap()
    }

    #[test]
    fn test_write_xlsx_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("exports");
        let path = write_xlsx(&state(), &out).unwrap();
        assert!(path.ends_with(XLSX_FILE_NAME));
        assert!(out.join(XLSX_FILE_NAME).exists());
    }

    #[test]
    fn test_write_pdf_follows_capability() {
        let dir = tempfile::tempdir().unwrap();
        let written = write_pdf(&state(), dir.path()).unwrap();
        assert_eq!(written.is_some(), crate::export::pdf_available());
        assert_eq!(dir.path().join(PDF_FILE_NAME).exists(), written.is_some());
    }
}
