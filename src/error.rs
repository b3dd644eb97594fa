use thiserror::Error;

#[derive(Error, Debug)]
pub enum KpiError {
    /// Missing file, sheet or column. Fatal for the whole run.
    #[error("{0}")]
    DataLoad(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Excel export error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    #[error("PDF error: {0}")]
    Pdf(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Settings error: {0}")]
    Settings(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("{0}")]
    Other(String),
}

impl KpiError {
    pub fn is_data_load(&self) -> bool {
        matches!(self, KpiError::DataLoad(_))
    }
}

pub type Result<T> = std::result::Result<T, KpiError>;
