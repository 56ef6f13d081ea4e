//! Spreadsheet ingestion.
//!
//! Uploads arrive as a file name plus raw bytes. The file name decides the
//! decoding (delimited text or Excel workbook); both paths feed the same
//! cell model and frame builder, so the rest of the engine only ever sees a
//! polars `DataFrame`.

mod delimited;
mod frame_builder;
mod workbook;

pub use frame_builder::Cell;

use crate::error::{EngineError, Result};
use polars::prelude::*;
use std::path::Path;
use tracing::info;

/// Columns every funnel export must carry. Validation failure lists all of
/// the absent names and nothing is loaded.
pub const REQUIRED_FUNNEL_COLUMNS: [&str; 4] = [
    "Dealer Location",
    "Sales Manager",
    "Sales Consultant",
    "Enquiry Type",
];

enum FileKind {
    Delimited,
    Workbook,
}

fn sniff_kind(file_name: &str) -> Result<FileKind> {
    let extension = Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();
    match extension.as_str() {
        "csv" | "tsv" | "txt" => Ok(FileKind::Delimited),
        "xlsx" | "xlsm" | "xlsb" | "xls" => Ok(FileKind::Workbook),
        _ => Err(EngineError::UnsupportedFormat(file_name.to_string())),
    }
}

/// Parse an uploaded spreadsheet into a frame. No column validation.
pub fn load_table(file_name: &str, bytes: &[u8]) -> Result<DataFrame> {
    let frame = match sniff_kind(file_name)? {
        FileKind::Delimited => delimited::read(bytes)?,
        FileKind::Workbook => workbook::read(bytes)?,
    };
    info!(
        file = file_name,
        rows = frame.height(),
        columns = frame.width(),
        "table parsed"
    );
    Ok(frame)
}

/// Parse a funnel export and validate the required column set.
pub fn load_funnel_table(file_name: &str, bytes: &[u8]) -> Result<DataFrame> {
    let frame = load_table(file_name, bytes)?;
    validate_columns(&frame, &REQUIRED_FUNNEL_COLUMNS)?;
    Ok(frame)
}

/// Convenience for callers holding a file on disk rather than an upload.
pub fn load_table_from_path(path: &Path) -> Result<DataFrame> {
    let bytes = std::fs::read(path)?;
    load_table(&path.to_string_lossy(), &bytes)
}

/// Check that every required column is present; the error lists all missing
/// names at once so the user fixes the export in one round trip.
pub fn validate_columns(frame: &DataFrame, required: &[&str]) -> Result<()> {
    let present = frame.get_column_names();
    let missing: Vec<String> = required
        .iter()
        .filter(|name| !present.contains(*name))
        .map(|name| name.to_string())
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(EngineError::MissingColumns(missing))
    }
}
