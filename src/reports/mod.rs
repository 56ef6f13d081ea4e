//! Report generation: the funnel surface (ETBR charts) and the follow-up
//! surface, both emitting chart-ready series plus a text summary.

pub mod followup;
pub mod funnel;

use crate::error::Result;
use polars::prelude::DataFrame;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// The funnel-surface report selector.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReportKind {
    Etbr,
    LmtdVsMtd,
    ModelEtbr,
    EnquiryTypeEtbr,
    EnquirySourceEtbr,
    TeamEtbr,
    TeamEnquiryType,
    WalkInEtbr,
    #[default]
    All,
}

/// The eight concrete funnel reports, in presentation order.
pub const FUNNEL_REPORTS: [ReportKind; 8] = [
    ReportKind::Etbr,
    ReportKind::LmtdVsMtd,
    ReportKind::ModelEtbr,
    ReportKind::EnquiryTypeEtbr,
    ReportKind::EnquirySourceEtbr,
    ReportKind::TeamEtbr,
    ReportKind::TeamEnquiryType,
    ReportKind::WalkInEtbr,
];

impl ReportKind {
    pub fn label(&self) -> &'static str {
        match self {
            ReportKind::Etbr => "etbr",
            ReportKind::LmtdVsMtd => "lmtd-vs-mtd",
            ReportKind::ModelEtbr => "model-etbr",
            ReportKind::EnquiryTypeEtbr => "enquiry-type-etbr",
            ReportKind::EnquirySourceEtbr => "enquiry-source-etbr",
            ReportKind::TeamEtbr => "team-etbr",
            ReportKind::TeamEnquiryType => "team-enquiry-type",
            ReportKind::WalkInEtbr => "walk-in-etbr",
            ReportKind::All => "all",
        }
    }
}

impl std::fmt::Display for ReportKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl std::str::FromStr for ReportKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('_', "-").as_str() {
            "etbr" => Ok(ReportKind::Etbr),
            "lmtd-vs-mtd" | "lmtd" => Ok(ReportKind::LmtdVsMtd),
            "model-etbr" | "model" => Ok(ReportKind::ModelEtbr),
            "enquiry-type-etbr" | "enquiry-type" => Ok(ReportKind::EnquiryTypeEtbr),
            "enquiry-source-etbr" | "enquiry-source" => Ok(ReportKind::EnquirySourceEtbr),
            "team-etbr" | "team" => Ok(ReportKind::TeamEtbr),
            "team-enquiry-type" => Ok(ReportKind::TeamEnquiryType),
            "walk-in-etbr" | "walk-in" => Ok(ReportKind::WalkInEtbr),
            "all" => Ok(ReportKind::All),
            other => Err(format!("unknown report kind: {other}")),
        }
    }
}

/// How the rendering layer should draw a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    Pie,
    Bar,
    GroupedBar,
    StackedBar,
    Sunburst,
}

/// A named series inside a grouped result; `values[i]` belongs to the i-th
/// label of the surrounding [`SeriesData::Grouped`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedSeries {
    pub name: String,
    pub values: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "shape")]
pub enum SeriesData {
    Flat {
        labels: Vec<String>,
        values: Vec<f64>,
    },
    Grouped {
        labels: Vec<String>,
        groups: Vec<NamedSeries>,
    },
}

/// One chart-ready report: the rendering layer owns the visual treatment,
/// this struct carries everything it needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportResult {
    pub chart: ChartKind,
    pub title: String,
    pub series: SeriesData,
    pub summary: String,
}

/// Outcome of one generator run. A failed generator carries its message here
/// instead of aborting the surrounding batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportSlot<K> {
    pub kind: K,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<ReportResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<K> ReportSlot<K> {
    pub fn ok(kind: K, report: ReportResult) -> Self {
        Self {
            kind,
            report: Some(report),
            error: None,
        }
    }

    pub fn failed(kind: K, error: impl Into<String>) -> Self {
        Self {
            kind,
            report: None,
            error: Some(error.into()),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.report.is_some()
    }
}

/// Active filters, for titles and summaries. The consultant here is the
/// effective one (post cascade validation), not the raw selection.
#[derive(Debug, Clone, Default)]
pub struct ReportContext {
    pub location: Option<String>,
    pub manager: Option<String>,
    pub consultant: Option<String>,
}

impl ReportContext {
    pub fn location_label(&self) -> &str {
        self.location.as_deref().unwrap_or("All Locations")
    }

    /// `"{base} for {location}, {manager}, {consultant}"` with unset parts
    /// omitted.
    pub fn title(&self, base: &str) -> String {
        let mut title = format!("{} for {}", base, self.location_label());
        if let Some(manager) = &self.manager {
            title.push_str(", ");
            title.push_str(manager);
        }
        if let Some(consultant) = &self.consultant {
            title.push_str(", ");
            title.push_str(consultant);
        }
        title
    }

    /// Title naming only the location; two of the funnel charts historically
    /// drop the manager/consultant suffix.
    pub fn location_title(&self, base: &str) -> String {
        format!("{} for {}", base, self.location_label())
    }
}

/// Run the selected report(s) over the filtered rows. `All` expands to the
/// eight funnel reports in order; a failing generator becomes an error slot
/// and the rest of the batch still runs.
pub fn generate(
    kind: ReportKind,
    rows: &DataFrame,
    ctx: &ReportContext,
) -> Vec<ReportSlot<ReportKind>> {
    match kind {
        ReportKind::All => FUNNEL_REPORTS
            .iter()
            .map(|kind| slot(*kind, rows, ctx))
            .collect(),
        single => vec![slot(single, rows, ctx)],
    }
}

/// Run one funnel report, propagating its error to the caller.
pub fn single(kind: ReportKind, rows: &DataFrame, ctx: &ReportContext) -> Result<ReportResult> {
    funnel::generate(kind, rows, ctx)
}

fn slot(kind: ReportKind, rows: &DataFrame, ctx: &ReportContext) -> ReportSlot<ReportKind> {
    match funnel::generate(kind, rows, ctx) {
        Ok(report) => ReportSlot::ok(kind, report),
        Err(err) => {
            warn!(report = kind.label(), error = %err, "report generation failed");
            ReportSlot::failed(kind, err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn titles_append_set_filters_in_order() {
        let ctx = ReportContext {
            location: Some("Pune".to_string()),
            manager: Some("Anil".to_string()),
            consultant: None,
        };
        assert_eq!(ctx.title("ETBR Report"), "ETBR Report for Pune, Anil");
        assert_eq!(ctx.location_title("Team vs ETBR"), "Team vs ETBR for Pune");
    }

    #[test]
    fn unset_location_reads_all_locations() {
        let ctx = ReportContext::default();
        assert_eq!(ctx.title("ETBR Report"), "ETBR Report for All Locations");
    }

    #[test]
    fn report_kinds_round_trip_through_from_str() {
        for kind in FUNNEL_REPORTS {
            assert_eq!(kind.label().parse::<ReportKind>().unwrap(), kind);
        }
        assert!("holographic".parse::<ReportKind>().is_err());
    }
}
