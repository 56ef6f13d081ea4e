//! The funnel surface: eight reports over the filtered ETBR table.

use crate::error::{EngineError, Result};
use crate::filter::CONSULTANT;
use crate::frame_utils::{filter_eq, group_metric_sums, metric_sum, percent};
use crate::reports::{ChartKind, NamedSeries, ReportContext, ReportKind, ReportResult, SeriesData};
use polars::prelude::DataFrame;

pub const MTD_METRICS: [&str; 4] = ["ENQUIRY MTD", "TD MTD", "BOOKING MTD", "RETAIL MTD"];
const METRIC_BASES: [&str; 4] = ["ENQUIRY", "TD", "BOOKING", "RETAIL"];
const METRIC_ABBREVIATIONS: [&str; 4] = ["E", "T", "B", "R"];
const METRIC_DISPLAY: [&str; 4] = ["Enquiries", "Test Drives", "Bookings", "Retails"];

const ENQUIRY_TYPE: &str = "Enquiry Type";
const ENQUIRY_SOURCE: &str = "Enquiry Source";
const MODEL: &str = "Model";
const WALK_IN: &str = "Walk-in";

pub fn generate(kind: ReportKind, rows: &DataFrame, ctx: &ReportContext) -> Result<ReportResult> {
    match kind {
        ReportKind::Etbr => etbr_report(rows, ctx),
        ReportKind::LmtdVsMtd => lmtd_vs_mtd(rows, ctx),
        ReportKind::ModelEtbr => model_etbr(rows, ctx),
        ReportKind::EnquiryTypeEtbr => enquiry_type_etbr(rows, ctx),
        ReportKind::EnquirySourceEtbr => enquiry_source_etbr(rows, ctx),
        ReportKind::TeamEtbr => team_etbr(rows, ctx),
        ReportKind::TeamEnquiryType => team_enquiry_type(rows, ctx),
        ReportKind::WalkInEtbr => walk_in_etbr(rows, ctx),
        ReportKind::All => Err(EngineError::Report(
            "'all' expands to the full report list; run it through reports::generate".to_string(),
        )),
    }
}

fn etbr_report(rows: &DataFrame, ctx: &ReportContext) -> Result<ReportResult> {
    let mut values: Vec<f64> = MTD_METRICS
        .iter()
        .map(|metric| metric_sum(rows, metric))
        .collect();
    if ctx.location.is_none() {
        // The upstream export duplicates every record per location pairing;
        // the all-locations view halves the sums to undo the double count.
        for value in values.iter_mut() {
            *value /= 2.0;
        }
    }

    let total: f64 = values.iter().sum();
    let summary = format!(
        "Distribution of Enquiry, Test Drive, Booking, and Retail for the month to date.\n\
         Total ETBR: {:.0}\n{}",
        total,
        metric_share_lines(&values, total),
    );

    Ok(ReportResult {
        chart: ChartKind::Pie,
        title: ctx.title("ETBR Report"),
        series: SeriesData::Flat {
            labels: string_labels(&MTD_METRICS),
            values,
        },
        summary,
    })
}

fn lmtd_vs_mtd(rows: &DataFrame, ctx: &ReportContext) -> Result<ReportResult> {
    let mut mtd: Vec<f64> = METRIC_BASES
        .iter()
        .map(|base| metric_sum(rows, &format!("{base} MTD")))
        .collect();
    let mut lmtd: Vec<f64> = METRIC_BASES
        .iter()
        .map(|base| metric_sum(rows, &format!("{base} LMTD")))
        .collect();
    if ctx.location.is_none() {
        // Same duplication rule as the ETBR pie; both periods are halved.
        for value in mtd.iter_mut().chain(lmtd.iter_mut()) {
            *value /= 2.0;
        }
    }

    let mtd_total: f64 = mtd.iter().sum();
    let lmtd_total: f64 = lmtd.iter().sum();
    let change_text = match percent_change(mtd_total, lmtd_total) {
        Some(change) => format!("{change:.1}%"),
        None => "N/A".to_string(),
    };
    let summary = format!(
        "Month to date vs last month to date across the four funnel metrics.\n\
         Total MTD: {mtd_total:.0}\nTotal LMTD: {lmtd_total:.0}\nPercent change: {change_text}",
    );

    Ok(ReportResult {
        chart: ChartKind::GroupedBar,
        title: ctx.title("LMTD vs MTD ETBR"),
        series: SeriesData::Grouped {
            labels: string_labels(&METRIC_BASES),
            groups: vec![
                NamedSeries {
                    name: "MTD".to_string(),
                    values: mtd,
                },
                NamedSeries {
                    name: "LMTD".to_string(),
                    values: lmtd,
                },
            ],
        },
        summary,
    })
}

fn model_etbr(rows: &DataFrame, ctx: &ReportContext) -> Result<ReportResult> {
    let sums = group_metric_sums(rows, MODEL, &MTD_METRICS)?;
    let summary = match top_group(&sums) {
        Some((model, total)) => format!(
            "Model performance across the four funnel metrics for the month to date.\n\
             Top performing model: {model}\nTotal value for top model: {total:.0}",
        ),
        None => "No data available for the current selection".to_string(),
    };
    let (labels, groups) = metric_groups(&sums, &MTD_METRICS);

    Ok(ReportResult {
        chart: ChartKind::GroupedBar,
        title: ctx.title("MODEL ETBR"),
        series: SeriesData::Grouped { labels, groups },
        summary,
    })
}

fn enquiry_type_etbr(rows: &DataFrame, ctx: &ReportContext) -> Result<ReportResult> {
    let sums = group_metric_sums(rows, ENQUIRY_TYPE, &MTD_METRICS)?;
    let summary = match top_group(&sums) {
        Some((enquiry_type, total)) => format!(
            "Distribution of enquiry types across the E/T/B/R metrics.\n\
             Top performing Enquiry Type: {enquiry_type}\n\
             Total value for top Enquiry Type: {total:.0}",
        ),
        None => "No data available for the current selection".to_string(),
    };
    let (labels, groups) = metric_groups(&sums, &METRIC_ABBREVIATIONS);

    Ok(ReportResult {
        chart: ChartKind::Sunburst,
        title: ctx.title("Enquiry Type vs ETBR Report"),
        series: SeriesData::Grouped { labels, groups },
        summary,
    })
}

fn enquiry_source_etbr(rows: &DataFrame, ctx: &ReportContext) -> Result<ReportResult> {
    let sums = group_metric_sums(rows, ENQUIRY_SOURCE, &MTD_METRICS)?;
    let summary = match top_group(&sums) {
        Some((source, total)) => format!(
            "How enquiry sources contribute to the funnel metrics.\n\
             Top performing Enquiry Source: {source}\n\
             Total value for top Enquiry Source: {total:.0}",
        ),
        None => "No data available for the current selection".to_string(),
    };
    let (labels, groups) = category_groups(sums);

    Ok(ReportResult {
        chart: ChartKind::StackedBar,
        title: ctx.location_title("Enquiry Source vs ETBR"),
        series: SeriesData::Grouped { labels, groups },
        summary,
    })
}

fn team_etbr(rows: &DataFrame, ctx: &ReportContext) -> Result<ReportResult> {
    let sums = group_metric_sums(rows, CONSULTANT, &MTD_METRICS)?;
    let summary = match top_group(&sums) {
        Some((consultant, total)) => format!(
            "Per-consultant performance across the funnel metrics.\n\
             Top performing Sales Consultant: {consultant}\n\
             Total value for top Sales Consultant: {total:.0}",
        ),
        None => "No data available for the current selection".to_string(),
    };
    let (labels, groups) = category_groups(sums);

    Ok(ReportResult {
        chart: ChartKind::StackedBar,
        title: ctx.location_title("Team vs Enquiry, Booking, Test Drive, Retail"),
        series: SeriesData::Grouped { labels, groups },
        summary,
    })
}

fn team_enquiry_type(rows: &DataFrame, ctx: &ReportContext) -> Result<ReportResult> {
    let sums = group_metric_sums(rows, ENQUIRY_TYPE, &MTD_METRICS)?;
    let summary = match top_group(&sums) {
        Some((enquiry_type, total)) => format!(
            "How enquiry types perform across the funnel metrics.\n\
             Top performing Enquiry Type: {enquiry_type}\n\
             Total value for top Enquiry Type: {total:.0}",
        ),
        None => "No data available for the current selection".to_string(),
    };
    let (labels, groups) = metric_groups(&sums, &MTD_METRICS);

    Ok(ReportResult {
        chart: ChartKind::GroupedBar,
        title: ctx.title("Team vs Enquiry Type ETBR Report"),
        series: SeriesData::Grouped { labels, groups },
        summary,
    })
}

fn walk_in_etbr(rows: &DataFrame, ctx: &ReportContext) -> Result<ReportResult> {
    let walk_ins = filter_eq(rows, ENQUIRY_TYPE, WALK_IN)?;
    let values: Vec<f64> = MTD_METRICS
        .iter()
        .map(|metric| metric_sum(&walk_ins, metric))
        .collect();

    let total: f64 = values.iter().sum();
    let summary = format!(
        "Distribution of walk-in enquiries across the funnel metrics.\n\
         Total Walk-in ETBR: {:.0}\n{}",
        total,
        metric_share_lines(&values, total),
    );

    Ok(ReportResult {
        chart: ChartKind::Pie,
        title: ctx.title("Walk In Report"),
        series: SeriesData::Flat {
            labels: string_labels(&MTD_METRICS),
            values,
        },
        summary,
    })
}

/// `(current - previous) / previous * 100`; `None` when there is no previous
/// period to compare against.
pub fn percent_change(current: f64, previous: f64) -> Option<f64> {
    if previous == 0.0 {
        None
    } else {
        Some((current - previous) / previous * 100.0)
    }
}

fn metric_share_lines(values: &[f64], total: f64) -> String {
    METRIC_DISPLAY
        .iter()
        .zip(values)
        .map(|(name, value)| format!("{}: {:.0} ({:.1}%)", name, value, percent(*value, total)))
        .collect::<Vec<_>>()
        .join("\n")
}

fn string_labels(labels: &[&str]) -> Vec<String> {
    labels.iter().map(|label| label.to_string()).collect()
}

/// Labels are the group names; one series per metric. Grouped-bar layout.
fn metric_groups(
    sums: &[(String, Vec<f64>)],
    series_names: &[&str],
) -> (Vec<String>, Vec<NamedSeries>) {
    let labels: Vec<String> = sums.iter().map(|(group, _)| group.clone()).collect();
    let groups = series_names
        .iter()
        .enumerate()
        .map(|(j, name)| NamedSeries {
            name: name.to_string(),
            values: sums.iter().map(|(_, values)| values[j]).collect(),
        })
        .collect();
    (labels, groups)
}

/// Labels are the four metrics; one series per category. Stacked-bar layout.
fn category_groups(sums: Vec<(String, Vec<f64>)>) -> (Vec<String>, Vec<NamedSeries>) {
    let labels = string_labels(&MTD_METRICS);
    let groups = sums
        .into_iter()
        .map(|(name, values)| NamedSeries { name, values })
        .collect();
    (labels, groups)
}

/// The group with the highest combined total; first occurrence wins ties.
fn top_group(sums: &[(String, Vec<f64>)]) -> Option<(&str, f64)> {
    let mut best: Option<(&str, f64)> = None;
    for (name, values) in sums {
        let total: f64 = values.iter().sum();
        match best {
            Some((_, best_total)) if total <= best_total => {}
            _ => best = Some((name, total)),
        }
    }
    best
}
