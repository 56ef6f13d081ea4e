use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Missing columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error("Unsupported file type: {0}")]
    UnsupportedFormat(String),

    #[error("No header row found in the uploaded file")]
    EmptySheet,

    #[error("No data uploaded yet")]
    NoData,

    #[error("Report error: {0}")]
    Report(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Workbook error: {0}")]
    Workbook(#[from] calamine::Error),

    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),
}

pub type Result<T> = std::result::Result<T, EngineError>;
