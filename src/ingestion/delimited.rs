//! Delimited-text ingestion (CSV/TSV exports).

use crate::error::{EngineError, Result};
use crate::ingestion::frame_builder::{build_frame, Cell};
use csv::ReaderBuilder;
use polars::prelude::DataFrame;

pub fn read(bytes: &[u8]) -> Result<DataFrame> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .delimiter(sniff_delimiter(bytes))
        .from_reader(bytes);

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|header| header.trim().to_string())
        .collect();
    if headers.iter().all(|header| header.is_empty()) {
        return Err(EngineError::EmptySheet);
    }

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let row: Vec<Cell> = (0..headers.len())
            .map(|index| coerce(record.get(index).unwrap_or("")))
            .collect();
        rows.push(row);
    }

    build_frame(&headers, rows)
}

// Exports show up comma-, tab-, or semicolon-separated depending on the
// dealer management system's locale; the header line settles it.
fn sniff_delimiter(bytes: &[u8]) -> u8 {
    let first_line = bytes.split(|byte| *byte == b'\n').next().unwrap_or(&[]);
    for candidate in [b',', b'\t', b';'] {
        if first_line.contains(&candidate) {
            return candidate;
        }
    }
    b','
}

fn coerce(raw: &str) -> Cell {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Cell::Null;
    }
    if trimmed.eq_ignore_ascii_case("true") {
        return Cell::Bool(true);
    }
    if trimmed.eq_ignore_ascii_case("false") {
        return Cell::Bool(false);
    }
    if let Ok(number) = trimmed.parse::<f64>() {
        return Cell::Number(number);
    }
    Cell::Text(trimmed.to_string())
}
