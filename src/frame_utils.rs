//! Safe column access over uploaded frames.
//!
//! Uploaded spreadsheets routinely miss columns, so every report funnels its
//! column reads through these helpers: absent numeric columns read as zero,
//! absent categorical columns produce empty option lists, and only a missing
//! grouping column is an error.

use crate::error::{EngineError, Result};
use itertools::Itertools;
use polars::prelude::*;
use std::collections::HashMap;

/// Column-wise sum of a numeric metric column. Absent or non-numeric columns
/// contribute zero rather than failing the report.
pub fn metric_sum(df: &DataFrame, name: &str) -> f64 {
    let column = match df.column(name) {
        Ok(column) => column,
        Err(_) => return 0.0,
    };
    let cast = match column.cast(&DataType::Float64) {
        Ok(cast) => cast,
        Err(_) => return 0.0,
    };
    match cast.f64() {
        Ok(values) => values.sum().unwrap_or(0.0),
        Err(_) => 0.0,
    }
}

/// Distinct non-null values of a column in first-occurrence order. An absent
/// column yields an empty list.
pub fn distinct_non_null(df: &DataFrame, name: &str) -> Vec<String> {
    let cast = match df.column(name).and_then(|c| c.cast(&DataType::String)) {
        Ok(cast) => cast,
        Err(_) => return Vec::new(),
    };
    let values = match cast.str() {
        Ok(values) => values,
        Err(_) => return Vec::new(),
    };
    values
        .into_iter()
        .flatten()
        .map(|value| value.to_string())
        .unique()
        .collect()
}

/// Rows where `name == value`.
pub fn filter_eq(df: &DataFrame, name: &str, value: &str) -> Result<DataFrame> {
    Ok(df
        .clone()
        .lazy()
        .filter(col(name).eq(lit(value)))
        .collect()?)
}

/// Rows whose numeric value in `name` is one of `allowed`.
pub fn filter_num_in(df: &DataFrame, name: &str, allowed: &[f64]) -> Result<DataFrame> {
    let expr = allowed
        .iter()
        .map(|value| col(name).cast(DataType::Float64).eq(lit(*value)))
        .reduce(|a, b| a.or(b))
        .ok_or_else(|| EngineError::Report("empty filter value set".to_string()))?;
    Ok(df.clone().lazy().filter(expr).collect()?)
}

/// Group rows by `key` and sum each of `metrics` per group.
///
/// Groups appear in first-occurrence order and a group whose sums are all
/// zero is still present. Rows with a null key are skipped. Absent metric
/// columns contribute zeros; an absent key column is an error.
pub fn group_metric_sums(
    df: &DataFrame,
    key: &str,
    metrics: &[&str],
) -> Result<Vec<(String, Vec<f64>)>> {
    let key_column = df
        .column(key)
        .map_err(|_| missing_column(key))?
        .cast(&DataType::String)?;
    let keys = key_column.str()?;

    let metric_columns: Vec<Option<Float64Chunked>> = metrics
        .iter()
        .map(|metric| {
            df.column(metric)
                .ok()
                .and_then(|column| column.cast(&DataType::Float64).ok())
                .and_then(|cast| cast.f64().ok().cloned())
        })
        .collect();

    let mut order: Vec<String> = Vec::new();
    let mut sums: HashMap<String, Vec<f64>> = HashMap::new();
    for i in 0..df.height() {
        let group = match keys.get(i) {
            Some(group) => group,
            None => continue,
        };
        if !sums.contains_key(group) {
            order.push(group.to_string());
            sums.insert(group.to_string(), vec![0.0; metrics.len()]);
        }
        if let Some(entry) = sums.get_mut(group) {
            for (j, metric) in metric_columns.iter().enumerate() {
                if let Some(values) = metric {
                    entry[j] += values.get(i).unwrap_or(0.0);
                }
            }
        }
    }

    Ok(order
        .into_iter()
        .map(|group| {
            let values = sums.remove(&group).unwrap_or_default();
            (group, values)
        })
        .collect())
}

/// Row count per distinct non-null value of `key`, in first-occurrence order.
pub fn group_row_counts(df: &DataFrame, key: &str) -> Result<Vec<(String, u32)>> {
    let key_column = df
        .column(key)
        .map_err(|_| missing_column(key))?
        .cast(&DataType::String)?;
    let keys = key_column.str()?;

    let mut order: Vec<String> = Vec::new();
    let mut counts: HashMap<String, u32> = HashMap::new();
    for value in keys.into_iter().flatten() {
        if !counts.contains_key(value) {
            order.push(value.to_string());
        }
        *counts.entry(value.to_string()).or_insert(0) += 1;
    }

    Ok(order
        .into_iter()
        .map(|value| {
            let count = counts.remove(&value).unwrap_or(0);
            (value, count)
        })
        .collect())
}

/// Value counts sorted by descending count; ties keep first-occurrence order.
pub fn value_counts(df: &DataFrame, name: &str) -> Result<Vec<(String, u32)>> {
    let mut counts = group_row_counts(df, name)?;
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    Ok(counts)
}

/// Share of `part` in `total` as a percentage; 0.0 when the total is zero.
pub fn percent(part: f64, total: f64) -> f64 {
    if total == 0.0 {
        0.0
    } else {
        part / total * 100.0
    }
}

fn missing_column(name: &str) -> EngineError {
    EngineError::Report(format!("column '{}' not present in the uploaded table", name))
}
