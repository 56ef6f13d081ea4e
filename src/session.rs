//! Session-scoped dashboard state.
//!
//! One `DashboardSession` per user session: it owns the uploaded tables and
//! the current selections, and every view is recomputed from them in full.
//! Tables are replaced wholesale on upload and never mutated in place; a
//! failed upload leaves the previous table untouched. Nothing here is shared
//! across sessions.

use crate::error::{EngineError, Result};
use crate::filter::{cascade, Selection};
use crate::frame_utils::distinct_non_null;
use crate::ingestion;
use crate::reports::followup::{self, FollowupReportKind};
use crate::reports::{self, ReportContext, ReportKind, ReportSlot};
use polars::prelude::DataFrame;
use serde::Serialize;
use tracing::info;

#[derive(Debug, Default)]
pub struct DashboardSession {
    funnel_table: Option<DataFrame>,
    followup_table: Option<DataFrame>,
    selection: Selection,
    report: ReportKind,
    followup_selection: Selection,
}

/// One recomputation of the funnel surface: the dropdown option lists, the
/// (possibly corrected) selection, and the report slots.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardView {
    pub locations: Vec<String>,
    pub managers: Vec<String>,
    pub consultants: Vec<String>,
    pub selection: Selection,
    pub reports: Vec<ReportSlot<ReportKind>>,
}

/// One recomputation of the follow-up surface.
#[derive(Debug, Clone, Serialize)]
pub struct FollowupView {
    pub locations: Vec<String>,
    pub managers: Vec<String>,
    pub consultants: Vec<String>,
    pub selection: Selection,
    pub report: ReportSlot<FollowupReportKind>,
}

impl DashboardSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse and store a funnel export. The previous table survives a failed
    /// parse or validation.
    pub fn upload_funnel(&mut self, file_name: &str, bytes: &[u8]) -> Result<usize> {
        let frame = ingestion::load_funnel_table(file_name, bytes)?;
        let rows = frame.height();
        info!(file = file_name, rows, "funnel table stored");
        self.funnel_table = Some(frame);
        Ok(rows)
    }

    /// Parse and store a follow-up export. No up-front column validation;
    /// its reports fail per report instead.
    pub fn upload_followup(&mut self, file_name: &str, bytes: &[u8]) -> Result<usize> {
        let frame = ingestion::load_table(file_name, bytes)?;
        let rows = frame.height();
        info!(file = file_name, rows, "follow-up table stored");
        self.followup_table = Some(frame);
        Ok(rows)
    }

    /// Store an already-built funnel table, applying the same required-column
    /// validation as an upload.
    pub fn set_funnel_table(&mut self, table: DataFrame) -> Result<()> {
        ingestion::validate_columns(&table, &ingestion::REQUIRED_FUNNEL_COLUMNS)?;
        self.funnel_table = Some(table);
        Ok(())
    }

    pub fn set_followup_table(&mut self, table: DataFrame) {
        self.followup_table = Some(table);
    }

    pub fn select_location(&mut self, location: Option<String>) {
        self.selection.location = location;
    }

    pub fn select_manager(&mut self, manager: Option<String>) {
        self.selection.manager = manager;
    }

    pub fn select_consultant(&mut self, consultant: Option<String>) {
        self.selection.consultant = consultant;
    }

    pub fn select_report(&mut self, report: ReportKind) {
        self.report = report;
    }

    pub fn select_followup_location(&mut self, location: Option<String>) {
        self.followup_selection.location = location;
    }

    pub fn select_followup_manager(&mut self, manager: Option<String>) {
        self.followup_selection.manager = manager;
    }

    pub fn select_followup_consultant(&mut self, consultant: Option<String>) {
        self.followup_selection.consultant = consultant;
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Recompute the funnel surface from the stored table: cascade, option
    /// lists, and the selected report(s). A consultant invalidated by the
    /// cascade is cleared from the session's selection.
    pub fn recompute(&mut self) -> Result<DashboardView> {
        let table = self.funnel_table.as_ref().ok_or(EngineError::NoData)?;
        let out = cascade(table, &self.selection)?;

        if self.selection.consultant.is_some() && out.effective_consultant.is_none() {
            info!(
                consultant = self.selection.consultant.as_deref().unwrap_or(""),
                "consultant selection cleared by the filter cascade"
            );
        }
        self.selection.consultant = out.effective_consultant.clone();

        let ctx = ReportContext {
            location: self.selection.location.clone(),
            manager: self.selection.manager.clone(),
            consultant: out.effective_consultant,
        };
        let slots = reports::generate(self.report, &out.rows, &ctx);

        Ok(DashboardView {
            locations: out.locations,
            managers: out.managers,
            consultants: out.consultants,
            selection: self.selection.clone(),
            reports: slots,
        })
    }

    /// Recompute the follow-up surface. The cascade supplies the dropdown
    /// option lists and validates the consultant; the generator applies the
    /// filters itself.
    pub fn followup_view(&mut self, kind: FollowupReportKind) -> Result<FollowupView> {
        let table = self.followup_table.as_ref().ok_or(EngineError::NoData)?;
        let out = cascade(table, &self.followup_selection)?;
        self.followup_selection.consultant = out.effective_consultant;

        let report = followup::generate(kind, table, &self.followup_selection);

        Ok(FollowupView {
            locations: out.locations,
            managers: out.managers,
            consultants: out.consultants,
            selection: self.followup_selection.clone(),
            report,
        })
    }

    /// Distinct non-null values of a stored funnel column, for embedding
    /// layers that render their own widgets.
    pub fn funnel_column_values(&self, name: &str) -> Vec<String> {
        match &self.funnel_table {
            Some(table) => distinct_non_null(table, name),
            None => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::*;

    fn funnel_csv() -> &'static str {
        "Dealer Location,Sales Manager,Sales Consultant,Enquiry Type,ENQUIRY MTD\n\
         Pune,Anil,Ravi,Walk-in,10\n\
         Mumbai,Sunita,Priya,Digital,20\n"
    }

    #[test]
    fn recompute_without_an_upload_is_an_error() {
        let mut session = DashboardSession::new();
        assert!(matches!(session.recompute(), Err(EngineError::NoData)));
    }

    #[test]
    fn failed_upload_keeps_the_previous_table() {
        let mut session = DashboardSession::new();
        session.upload_funnel("etbr.csv", funnel_csv().as_bytes()).unwrap();

        let err = session.upload_funnel("broken.csv", b"Model\nAstra\n");
        assert!(err.is_err());

        let err = session.upload_funnel("etbr.pdf", b"%PDF-");
        assert!(matches!(err, Err(EngineError::UnsupportedFormat(_))));

        let view = session.recompute().unwrap();
        assert_eq!(view.locations, vec!["Pune", "Mumbai"]);
    }

    #[test]
    fn stale_consultant_is_cleared_from_the_session() {
        let mut session = DashboardSession::new();
        session.upload_funnel("etbr.csv", funnel_csv().as_bytes()).unwrap();
        session.select_consultant(Some("Ravi".to_string()));
        session.select_location(Some("Mumbai".to_string()));

        let view = session.recompute().unwrap();
        assert_eq!(view.selection.consultant, None);
        assert_eq!(session.selection().consultant, None);
        assert_eq!(view.consultants, vec!["Priya"]);
    }

    #[test]
    fn default_report_kind_runs_the_full_batch() {
        let mut session = DashboardSession::new();
        session.upload_funnel("etbr.csv", funnel_csv().as_bytes()).unwrap();
        let view = session.recompute().unwrap();
        assert_eq!(view.reports.len(), 8);
    }

    #[test]
    fn set_funnel_table_validates_columns() {
        let mut session = DashboardSession::new();
        let table = df!["Model" => ["Astra"]].unwrap();
        assert!(matches!(
            session.set_funnel_table(table),
            Err(EngineError::MissingColumns(_))
        ));
    }

    #[test]
    fn followup_upload_skips_required_column_validation() {
        let mut session = DashboardSession::new();
        let rows = session
            .upload_followup("followup.csv", b"Product Family\nHatch\n")
            .unwrap();
        assert_eq!(rows, 1);
    }

    #[test]
    fn followup_view_runs_against_the_second_table() {
        let mut session = DashboardSession::new();
        let table = df![
            "Dealer Location" => ["Pune", "Pune", "Pune"],
            "Sales Manager" => ["Anil", "Anil", "Anil"],
            "Sales Consultant" => ["Ravi", "Ravi", "Ravi"],
            "Completed Followup Count" => [0.0, 0.0, 1.0]
        ]
        .unwrap();
        session.set_followup_table(table);
        session.select_followup_consultant(Some("Ravi".to_string()));

        let view = session.followup_view(FollowupReportKind::FollowupTracks).unwrap();
        assert!(view.report.is_ok());
        let report = view.report.report.unwrap();
        assert!(report.summary.contains("call rate of 33.33%"));
    }
}
