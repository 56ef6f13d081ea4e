//! The follow-up surface: three reports over the separately uploaded
//! follow-up table.

use crate::error::{EngineError, Result};
use crate::filter::{Selection, CONSULTANT, LOCATION, MANAGER};
use crate::frame_utils::{filter_eq, filter_num_in, group_row_counts, percent, value_counts};
use crate::reports::{ChartKind, NamedSeries, ReportResult, ReportSlot, SeriesData};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::warn;

const VEHICLE_MODEL: &str = "Existing vehicle Latest1";
const PRODUCT_FAMILY: &str = "Product Family";
// The source system misspells "Interested"; the column name is part of its
// export contract.
const INTERESTED: &str = "Intrested In Exchange";
const FOLLOWUP_COUNT: &str = "Completed Followup Count";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FollowupReportKind {
    ExistingVehicle,
    ProductFamily,
    #[default]
    FollowupTracks,
}

impl FollowupReportKind {
    pub fn label(&self) -> &'static str {
        match self {
            FollowupReportKind::ExistingVehicle => "existing-vehicle",
            FollowupReportKind::ProductFamily => "product-family",
            FollowupReportKind::FollowupTracks => "followup-tracks",
        }
    }
}

impl std::fmt::Display for FollowupReportKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl std::str::FromStr for FollowupReportKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('_', "-").as_str() {
            "existing-vehicle" | "vehicle" => Ok(FollowupReportKind::ExistingVehicle),
            "product-family" | "family" => Ok(FollowupReportKind::ProductFamily),
            "followup-tracks" | "followup" => Ok(FollowupReportKind::FollowupTracks),
            other => Err(format!("unknown follow-up report kind: {other}")),
        }
    }
}

/// Run one follow-up report; a failure becomes an error slot.
pub fn generate(
    kind: FollowupReportKind,
    table: &DataFrame,
    selection: &Selection,
) -> ReportSlot<FollowupReportKind> {
    let outcome = match kind {
        FollowupReportKind::ExistingVehicle => existing_vehicle(table),
        FollowupReportKind::ProductFamily => product_family(table),
        FollowupReportKind::FollowupTracks => followup_tracks(table, selection),
    };
    match outcome {
        Ok(report) => ReportSlot::ok(kind, report),
        Err(err) => {
            warn!(report = kind.label(), error = %err, "report generation failed");
            ReportSlot::failed(kind, err.to_string())
        }
    }
}

/// Value counts of the customers' current vehicle model, most frequent first.
pub fn existing_vehicle(table: &DataFrame) -> Result<ReportResult> {
    let counts = value_counts(table, VEHICLE_MODEL)?;
    let total: u32 = counts.iter().map(|(_, count)| count).sum();
    let summary = match counts.first() {
        Some((top, _)) => format!(
            "{} customers interested in an exchange across {} vehicle models. \
             The most common existing vehicle model is '{}'.",
            total,
            counts.len(),
            top,
        ),
        None => "No data available for the current selection".to_string(),
    };

    let (labels, values): (Vec<String>, Vec<f64>) = counts
        .into_iter()
        .map(|(label, count)| (label, count as f64))
        .unzip();

    Ok(ReportResult {
        chart: ChartKind::Bar,
        title: "Number of Interested Customers by Existing Vehicle Model".to_string(),
        series: SeriesData::Flat { labels, values },
        summary,
    })
}

/// Per product family: total enquiries vs enquiries interested in an
/// exchange.
pub fn product_family(table: &DataFrame) -> Result<ReportResult> {
    let totals = group_row_counts(table, PRODUCT_FAMILY)?;
    let interested = group_row_counts(&interested_rows(table)?, PRODUCT_FAMILY)?;
    let interested_by_family: HashMap<&str, u32> = interested
        .iter()
        .map(|(family, count)| (family.as_str(), *count))
        .collect();

    let labels: Vec<String> = totals.iter().map(|(family, _)| family.clone()).collect();
    let total_values: Vec<f64> = totals.iter().map(|(_, count)| *count as f64).collect();
    let interested_values: Vec<f64> = totals
        .iter()
        .map(|(family, _)| *interested_by_family.get(family.as_str()).unwrap_or(&0) as f64)
        .collect();

    let total_enquiries: u32 = totals.iter().map(|(_, count)| count).sum();
    let interested_enquiries: u32 = interested.iter().map(|(_, count)| count).sum();
    let summary = match top_by_count(&totals) {
        Some(top) => format!(
            "Out of {} total enquiries, {} showed interest in an exchange. \
             The product family with the most enquiries is '{}'.",
            total_enquiries, interested_enquiries, top,
        ),
        None => "No data available for the current selection".to_string(),
    };

    Ok(ReportResult {
        chart: ChartKind::GroupedBar,
        title: "Total Enquiries and Interested Enquiries by Product Family".to_string(),
        series: SeriesData::Grouped {
            labels,
            groups: vec![
                NamedSeries {
                    name: "Total Enquiries".to_string(),
                    values: total_values,
                },
                NamedSeries {
                    name: "Interested Enquiries".to_string(),
                    values: interested_values,
                },
            ],
        },
        summary,
    })
}

/// Follow-up progress per group: customers not yet followed up (count 0) vs
/// followed up once (count 1), grouped by the most specific active filter
/// dimension.
pub fn followup_tracks(table: &DataFrame, selection: &Selection) -> Result<ReportResult> {
    if table.column(FOLLOWUP_COUNT).is_err() {
        return Err(EngineError::Report(format!(
            "column '{}' not found in the data",
            FOLLOWUP_COUNT
        )));
    }

    let mut rows = table.clone();
    if let Some(location) = &selection.location {
        rows = filter_eq(&rows, LOCATION, location)?;
    }
    if let Some(manager) = &selection.manager {
        rows = filter_eq(&rows, MANAGER, manager)?;
    }
    if let Some(consultant) = &selection.consultant {
        rows = filter_eq(&rows, CONSULTANT, consultant)?;
    }

    // Call rate over every filtered row, before the {0, 1} restriction.
    let total_rows = rows.height();
    let called_at_least_once = count_at_least(&rows, FOLLOWUP_COUNT, 1.0);
    let not_called = count_at_least(&rows, FOLLOWUP_COUNT, 0.0) - called_at_least_once;
    let call_rate = percent(called_at_least_once as f64, total_rows as f64);

    let dimension = if selection.consultant.is_some() {
        CONSULTANT
    } else if selection.manager.is_some() {
        MANAGER
    } else if selection.location.is_some() {
        LOCATION
    } else {
        CONSULTANT
    };

    let tracked = filter_num_in(&rows, FOLLOWUP_COUNT, &[0.0, 1.0])?;
    let (labels, pending, done) = status_counts(&tracked, dimension)?;
    let totals: Vec<f64> = pending
        .iter()
        .zip(&done)
        .map(|(pending, done)| pending + done)
        .collect();

    let title = match &selection.consultant {
        Some(consultant) => format!("Followup Tracks for {consultant}"),
        None => format!("Followup Tracks by {dimension}"),
    };
    let summary = format!(
        "Out of {} total followups, {} have been called at least once and {} \
         have not been called yet, giving a call rate of {:.2}%.",
        total_rows, called_at_least_once, not_called, call_rate,
    );

    Ok(ReportResult {
        chart: ChartKind::GroupedBar,
        title,
        series: SeriesData::Grouped {
            labels,
            groups: vec![
                NamedSeries {
                    name: "Not Followed Up".to_string(),
                    values: pending,
                },
                NamedSeries {
                    name: "Followed Up".to_string(),
                    values: done,
                },
                NamedSeries {
                    name: "Total".to_string(),
                    values: totals,
                },
            ],
        },
        summary,
    })
}

fn interested_rows(table: &DataFrame) -> Result<DataFrame> {
    if table.column(INTERESTED).is_err() {
        return Err(EngineError::Report(format!(
            "column '{}' not present in the uploaded table",
            INTERESTED
        )));
    }
    Ok(table
        .clone()
        .lazy()
        .filter(col(INTERESTED).cast(DataType::Boolean).eq(lit(true)))
        .collect()?)
}

fn count_at_least(df: &DataFrame, name: &str, threshold: f64) -> u32 {
    let cast = match df.column(name).and_then(|c| c.cast(&DataType::Float64)) {
        Ok(cast) => cast,
        Err(_) => return 0,
    };
    let values = match cast.f64() {
        Ok(values) => values,
        Err(_) => return 0,
    };
    values
        .into_iter()
        .flatten()
        .filter(|value| *value >= threshold)
        .count() as u32
}

/// Per-group counts of follow-up status 0 and 1, first-occurrence order.
fn status_counts(df: &DataFrame, dimension: &str) -> Result<(Vec<String>, Vec<f64>, Vec<f64>)> {
    let key_column = df
        .column(dimension)
        .map_err(|_| {
            EngineError::Report(format!(
                "column '{}' not present in the uploaded table",
                dimension
            ))
        })?
        .cast(&DataType::String)?;
    let keys = key_column.str()?;
    let status_column = df.column(FOLLOWUP_COUNT)?.cast(&DataType::Float64)?;
    let statuses = status_column.f64()?;

    let mut order: Vec<String> = Vec::new();
    let mut counts: HashMap<String, (f64, f64)> = HashMap::new();
    for i in 0..df.height() {
        let group = match keys.get(i) {
            Some(group) => group,
            None => continue,
        };
        let status = match statuses.get(i) {
            Some(status) => status,
            None => continue,
        };
        if !counts.contains_key(group) {
            order.push(group.to_string());
        }
        let entry = counts.entry(group.to_string()).or_insert((0.0, 0.0));
        if status == 0.0 {
            entry.0 += 1.0;
        } else {
            entry.1 += 1.0;
        }
    }

    let mut pending = Vec::with_capacity(order.len());
    let mut done = Vec::with_capacity(order.len());
    for group in &order {
        let entry = counts.get(group).copied().unwrap_or((0.0, 0.0));
        pending.push(entry.0);
        done.push(entry.1);
    }
    Ok((order, pending, done))
}

fn top_by_count(counts: &[(String, u32)]) -> Option<&str> {
    let mut best: Option<(&str, u32)> = None;
    for (name, count) in counts {
        match best {
            Some((_, best_count)) if *count <= best_count => {}
            _ => best = Some((name, *count)),
        }
    }
    best.map(|(name, _)| name)
}
