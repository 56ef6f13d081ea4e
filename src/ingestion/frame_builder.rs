//! Shared cell model and frame construction for both ingestion paths.

use crate::error::Result;
use polars::prelude::*;

/// A single parsed spreadsheet cell, before column typing.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
}

impl Cell {
    fn as_number(&self) -> Option<f64> {
        match self {
            Cell::Number(value) => Some(*value),
            _ => None,
        }
    }

    fn as_bool(&self) -> Option<bool> {
        match self {
            Cell::Bool(value) => Some(*value),
            _ => None,
        }
    }

    fn as_text(&self) -> Option<String> {
        match self {
            Cell::Null => None,
            Cell::Bool(value) => Some(value.to_string()),
            Cell::Number(value) => Some(format_number(*value)),
            Cell::Text(value) => Some(value.clone()),
        }
    }
}

// Whole numbers print without a trailing ".0" so mixed columns keep the
// spreadsheet's visible form.
fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}

/// Elect a dtype per column and assemble the frame. A column whose non-null
/// cells are all numeric becomes Float64, all-boolean becomes Boolean, and
/// anything mixed (or fully null) falls back to String.
pub fn build_frame(headers: &[String], rows: Vec<Vec<Cell>>) -> Result<DataFrame> {
    let mut columns = Vec::with_capacity(headers.len());
    for (index, name) in headers.iter().enumerate() {
        let cells: Vec<Cell> = rows
            .iter()
            .map(|row| row.get(index).cloned().unwrap_or(Cell::Null))
            .collect();
        columns.push(build_series(name, &cells));
    }
    Ok(DataFrame::new(columns)?)
}

fn build_series(name: &str, cells: &[Cell]) -> Series {
    let mut saw_value = false;
    let mut all_numbers = true;
    let mut all_bools = true;
    for cell in cells {
        match cell {
            Cell::Null => {}
            Cell::Number(_) => {
                saw_value = true;
                all_bools = false;
            }
            Cell::Bool(_) => {
                saw_value = true;
                all_numbers = false;
            }
            Cell::Text(_) => {
                saw_value = true;
                all_numbers = false;
                all_bools = false;
            }
        }
    }

    if saw_value && all_numbers {
        let values: Vec<Option<f64>> = cells.iter().map(Cell::as_number).collect();
        Series::new(name, values)
    } else if saw_value && all_bools {
        let values: Vec<Option<bool>> = cells.iter().map(Cell::as_bool).collect();
        Series::new(name, values)
    } else {
        let values: Vec<Option<String>> = cells.iter().map(Cell::as_text).collect();
        Series::new(name, values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(names: &[&str]) -> Vec<String> {
        names.iter().map(|name| name.to_string()).collect()
    }

    #[test]
    fn numeric_columns_become_float64() {
        let frame = build_frame(
            &headers(&["n"]),
            vec![vec![Cell::Number(1.0)], vec![Cell::Null], vec![Cell::Number(2.5)]],
        )
        .unwrap();
        assert_eq!(frame.column("n").unwrap().dtype(), &DataType::Float64);
        assert_eq!(frame.height(), 3);
    }

    #[test]
    fn boolean_columns_become_boolean() {
        let frame = build_frame(
            &headers(&["b"]),
            vec![vec![Cell::Bool(true)], vec![Cell::Bool(false)]],
        )
        .unwrap();
        assert_eq!(frame.column("b").unwrap().dtype(), &DataType::Boolean);
    }

    #[test]
    fn mixed_columns_fall_back_to_string() {
        let frame = build_frame(
            &headers(&["m"]),
            vec![vec![Cell::Number(12.0)], vec![Cell::Text("Astra".to_string())]],
        )
        .unwrap();
        let column = frame.column("m").unwrap();
        assert_eq!(column.dtype(), &DataType::String);
        let values = column.str().unwrap();
        assert_eq!(values.get(0), Some("12"));
    }

    #[test]
    fn short_rows_pad_with_nulls() {
        let frame = build_frame(
            &headers(&["a", "b"]),
            vec![vec![Cell::Text("x".to_string())]],
        )
        .unwrap();
        assert_eq!(frame.column("b").unwrap().null_count(), 1);
    }
}
