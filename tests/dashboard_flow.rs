use etbr_engine::reports::followup::FollowupReportKind;
use etbr_engine::reports::{ReportKind, SeriesData};
use etbr_engine::session::DashboardSession;
use std::fs;
use std::path::PathBuf;

const FUNNEL_CSV: &str = "\
Dealer Location,Sales Manager,Sales Consultant,Enquiry Type,Enquiry Source,Model,ENQUIRY MTD,TD MTD,BOOKING MTD,RETAIL MTD,ENQUIRY LMTD,TD LMTD,BOOKING LMTD,RETAIL LMTD
Pune,Anil,Ravi,Walk-in,Hoarding,Astra,10,2,1,1,8,1,1,0
Pune,Anil,Meera,Digital,Website,Corsa,6,2,1,0,6,2,0,0
Mumbai,Sunita,Priya,Walk-in,Website,Astra,20,4,2,1,12,2,1,1
Mumbai,Sunita,Arjun,Tele-in,Hoarding,Vectra,4,0,0,0,4,1,0,0
";

const FOLLOWUP_CSV: &str = "\
Dealer Location,Sales Manager,Sales Consultant,Existing vehicle Latest1,Product Family,Intrested In Exchange,Completed Followup Count
Pune,Anil,Ravi,Swift,Hatch,true,0
Pune,Anil,Ravi,Swift,Hatch,false,0
Pune,Anil,Ravi,i20,Sedan,true,1
Mumbai,Sunita,Priya,Swift,Hatch,false,2
";

fn write_fixture(name: &str, contents: &str) -> PathBuf {
    let dir = std::env::temp_dir().join("etbr_engine_test");
    fs::create_dir_all(&dir).unwrap();
    let path = dir.join(name);
    fs::write(&path, contents).unwrap();
    path
}

fn loaded_session() -> DashboardSession {
    let path = write_fixture("funnel.csv", FUNNEL_CSV);
    let bytes = fs::read(&path).unwrap();
    let mut session = DashboardSession::new();
    let rows = session.upload_funnel("funnel.csv", &bytes).unwrap();
    assert_eq!(rows, 4);
    session
}

#[test]
fn full_funnel_flow_from_upload_to_reports() {
    let mut session = loaded_session();
    session.select_report(ReportKind::All);

    let view = session.recompute().unwrap();
    assert_eq!(view.locations, vec!["Pune", "Mumbai"]);
    assert_eq!(view.managers, vec!["Anil", "Sunita"]);
    assert_eq!(view.consultants, vec!["Ravi", "Meera", "Priya", "Arjun"]);
    assert_eq!(view.reports.len(), 8);
    assert!(view.reports.iter().all(|slot| slot.is_ok()));

    // With no location selected every ETBR pie value is halved:
    // enquiries (10 + 6 + 20 + 4) / 2 = 20.
    let etbr = view.reports[0].report.as_ref().unwrap();
    match &etbr.series {
        SeriesData::Flat { values, .. } => assert_eq!(values[0], 20.0),
        _ => panic!("expected a flat series"),
    }
    assert_eq!(etbr.title, "ETBR Report for All Locations");
}

#[test]
fn selecting_a_location_stops_the_halving_and_narrows_options() {
    let mut session = loaded_session();
    session.select_report(ReportKind::Etbr);
    session.select_location(Some("Mumbai".to_string()));

    let view = session.recompute().unwrap();
    assert_eq!(view.managers, vec!["Sunita"]);
    assert_eq!(view.consultants, vec!["Priya", "Arjun"]);

    let etbr = view.reports[0].report.as_ref().unwrap();
    match &etbr.series {
        SeriesData::Flat { values, .. } => {
            assert_eq!(values, &[24.0, 4.0, 2.0, 1.0]);
        }
        _ => panic!("expected a flat series"),
    }
    assert_eq!(etbr.title, "ETBR Report for Mumbai");
}

#[test]
fn switching_location_clears_a_stale_consultant() {
    let mut session = loaded_session();
    session.select_report(ReportKind::Etbr);
    session.select_location(Some("Pune".to_string()));
    session.select_consultant(Some("Ravi".to_string()));
    session.recompute().unwrap();

    session.select_location(Some("Mumbai".to_string()));
    let view = session.recompute().unwrap();
    assert_eq!(view.selection.consultant, None);

    // The report now covers all of Mumbai, not Ravi's empty slice.
    let etbr = view.reports[0].report.as_ref().unwrap();
    match &etbr.series {
        SeriesData::Flat { values, .. } => assert_eq!(values[0], 24.0),
        _ => panic!("expected a flat series"),
    }
}

#[test]
fn walk_in_report_ignores_other_enquiry_types() {
    let mut session = loaded_session();
    session.select_report(ReportKind::WalkInEtbr);

    let view = session.recompute().unwrap();
    let report = view.reports[0].report.as_ref().unwrap();
    match &report.series {
        // Walk-ins: Pune/Ravi + Mumbai/Priya, never halved.
        SeriesData::Flat { values, .. } => assert_eq!(values, &[30.0, 6.0, 3.0, 2.0]),
        _ => panic!("expected a flat series"),
    }
}

#[test]
fn lmtd_report_summarises_percent_change() {
    let mut session = loaded_session();
    session.select_report(ReportKind::LmtdVsMtd);
    session.select_location(Some("Pune".to_string()));

    let view = session.recompute().unwrap();
    let report = view.reports[0].report.as_ref().unwrap();
    // Pune MTD total 23 vs LMTD total 18 → +27.8%.
    assert!(report.summary.contains("Total MTD: 23"));
    assert!(report.summary.contains("Total LMTD: 18"));
    assert!(report.summary.contains("Percent change: 27.8%"));
}

#[test]
fn followup_surface_flow() {
    let path = write_fixture("followup.csv", FOLLOWUP_CSV);
    let table = etbr_engine::ingestion::load_table_from_path(&path).unwrap();
    let mut session = DashboardSession::new();
    session.set_followup_table(table);

    session.select_followup_consultant(Some("Ravi".to_string()));
    let view = session.followup_view(FollowupReportKind::FollowupTracks).unwrap();
    assert_eq!(view.locations, vec!["Pune", "Mumbai"]);
    let report = view.report.report.as_ref().unwrap();
    assert!(report.summary.contains("call rate of 33.33%"));

    let vehicles = session.followup_view(FollowupReportKind::ExistingVehicle).unwrap();
    let report = vehicles.report.report.as_ref().unwrap();
    match &report.series {
        SeriesData::Flat { labels, .. } => assert_eq!(labels[0], "Swift"),
        _ => panic!("expected a flat series"),
    }
}

#[test]
fn uploading_a_bad_file_reports_missing_columns_and_keeps_state() {
    let mut session = loaded_session();
    session.select_report(ReportKind::Etbr);

    let err = session
        .upload_funnel("broken.csv", b"Model,ENQUIRY MTD\nAstra,1\n")
        .unwrap_err();
    assert!(err.to_string().contains("Sales Manager"));

    // The earlier table still answers queries.
    let view = session.recompute().unwrap();
    assert!(view.reports[0].is_ok());
}
