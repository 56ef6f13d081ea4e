//! Excel workbook ingestion via calamine.
//!
//! Only the first worksheet is read; its first row is the header row.

use crate::error::{EngineError, Result};
use crate::ingestion::frame_builder::{build_frame, Cell};
use calamine::{open_workbook_auto_from_rs, Data, Reader};
use polars::prelude::DataFrame;
use std::io::Cursor;

pub fn read(bytes: &[u8]) -> Result<DataFrame> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or(EngineError::EmptySheet)??;

    let mut rows_iter = range.rows();
    let header_row = rows_iter.next().ok_or(EngineError::EmptySheet)?;
    let headers: Vec<String> = header_row.iter().map(header_text).collect();
    if headers.iter().all(|header| header.is_empty()) {
        return Err(EngineError::EmptySheet);
    }

    let rows: Vec<Vec<Cell>> = rows_iter
        .map(|row| {
            (0..headers.len())
                .map(|index| coerce(row.get(index).unwrap_or(&Data::Empty)))
                .collect()
        })
        .collect();

    build_frame(&headers, rows)
}

fn header_text(cell: &Data) -> String {
    match cell {
        Data::String(text) => text.trim().to_string(),
        Data::Empty => String::new(),
        other => other.to_string().trim().to_string(),
    }
}

fn coerce(cell: &Data) -> Cell {
    match cell {
        Data::Empty | Data::Error(_) => Cell::Null,
        Data::Bool(value) => Cell::Bool(*value),
        Data::Int(value) => Cell::Number(*value as f64),
        Data::Float(value) => Cell::Number(*value),
        Data::String(text) => text_cell(text),
        Data::DateTime(value) => Cell::Number(value.as_f64()),
        Data::DateTimeIso(text) => Cell::Text(text.clone()),
        Data::DurationIso(text) => Cell::Text(text.clone()),
    }
}

fn text_cell(raw: &str) -> Cell {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        Cell::Null
    } else {
        Cell::Text(trimmed.to_string())
    }
}
