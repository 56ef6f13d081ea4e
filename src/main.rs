use anyhow::Result;
use clap::{Parser, Subcommand};
use etbr_engine::reports::followup::FollowupReportKind;
use etbr_engine::reports::ReportKind;
use etbr_engine::session::DashboardSession;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Parser)]
#[command(name = "etbr-engine")]
#[command(about = "ETBR dashboard engine: load a dealership export, filter it, and emit chart-ready report series")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Funnel reports over an ETBR export
    Funnel {
        /// Spreadsheet to load (.csv, .tsv, .xlsx, .xls)
        file: PathBuf,

        /// Report to run (etbr, lmtd-vs-mtd, model-etbr, enquiry-type-etbr,
        /// enquiry-source-etbr, team-etbr, team-enquiry-type, walk-in-etbr,
        /// all)
        #[arg(long, default_value = "all")]
        report: ReportKind,

        #[arg(long)]
        location: Option<String>,

        #[arg(long)]
        manager: Option<String>,

        #[arg(long)]
        consultant: Option<String>,
    },
    /// Follow-up reports over a follow-up export
    Followup {
        /// Spreadsheet to load (.csv, .tsv, .xlsx, .xls)
        file: PathBuf,

        /// Report to run (existing-vehicle, product-family, followup-tracks)
        #[arg(long, default_value = "followup-tracks")]
        report: FollowupReportKind,

        #[arg(long)]
        location: Option<String>,

        #[arg(long)]
        manager: Option<String>,

        #[arg(long)]
        consultant: Option<String>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    match args.command {
        Command::Funnel {
            file,
            report,
            location,
            manager,
            consultant,
        } => {
            let mut session = DashboardSession::new();
            let rows = session.upload_funnel(&file_label(&file), &std::fs::read(&file)?)?;
            info!(rows, "funnel table loaded");

            session.select_location(location);
            session.select_manager(manager);
            session.select_consultant(consultant);
            session.select_report(report);

            let view = session.recompute()?;
            println!("{}", serde_json::to_string_pretty(&view)?);
        }
        Command::Followup {
            file,
            report,
            location,
            manager,
            consultant,
        } => {
            let mut session = DashboardSession::new();
            let rows = session.upload_followup(&file_label(&file), &std::fs::read(&file)?)?;
            info!(rows, "follow-up table loaded");

            session.select_followup_location(location);
            session.select_followup_manager(manager);
            session.select_followup_consultant(consultant);

            let view = session.followup_view(report)?;
            println!("{}", serde_json::to_string_pretty(&view)?);
        }
    }

    Ok(())
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("upload")
        .to_string()
}
