mod common;

use rusqlite::Connection;
use std::fs;
use tempfile::TempDir;

use common::{HRUS, monthly_run};
use swat_extract::ExtractError;
use swat_extract::catalog;
use swat_extract::config::UnitType;
use swat_extract::validation::{Agreement, ValidationMode, Validator};

#[test]
fn correlation_report_has_one_line_per_id_and_column() {
    let run = monthly_run();
    let out = TempDir::new().unwrap();
    let mut validator =
        Validator::from_folder(run.path(), ValidationMode::Correlation, out.path()).unwrap();

    let results = validator.compare_all().unwrap();
    assert_eq!(results.len(), 1);
    let (unit, mean) = results[0];
    assert_eq!(unit, UnitType::Hru);
    assert!((mean.unwrap() - 1.0).abs() < 1e-9);

    let report = fs::read_to_string(out.path().join("HRU_validation.csv")).unwrap();
    let lines: Vec<&str> = report.lines().collect();
    assert_eq!(lines.len(), catalog::column_count(UnitType::Hru) * HRUS as usize);
    assert_eq!(lines[0], "HRU,1,PRECIPmm,1.0000");
    assert!(lines.iter().all(|l| l.ends_with(",1.0000")));
    validator.close();
}

#[test]
fn single_series_agreement() {
    let run = monthly_run();
    let out = TempDir::new().unwrap();
    let mut validator =
        Validator::from_folder(run.path(), ValidationMode::Correlation, out.path()).unwrap();
    let Agreement::R2(r2) = validator.compare_series(UnitType::Hru, 2, "ETmm").unwrap() else {
        panic!("expected an R2");
    };
    assert!((r2 - 1.0).abs() < 1e-9);
}

#[test]
fn reconcile_report_covers_all_ids_at_once() {
    let run = monthly_run();
    let out = TempDir::new().unwrap();
    let mut validator =
        Validator::from_folder(run.path(), ValidationMode::Reconcile, out.path()).unwrap();
    validator.compare_all().unwrap();

    let report = fs::read_to_string(out.path().join("HRU_monthly_validation.csv")).unwrap();
    let lines: Vec<&str> = report.lines().collect();
    assert_eq!(lines.len(), catalog::column_count(UnitType::Hru));
    assert_eq!(lines[1], "HRU,all,SNOFALLmm,1.0000");
    assert!(lines.iter().all(|l| l.starts_with("HRU,all,")));
}

#[test]
fn reconcile_refuses_different_row_counts() {
    let run = monthly_run();
    {
        let conn = Connection::open(run.path().join("result_627_monthly.db3")).unwrap();
        conn.execute("DELETE FROM hru WHERE YR = 2009 AND MO = 12", []).unwrap();
    }
    let out = TempDir::new().unwrap();
    let mut validator =
        Validator::from_folder(run.path(), ValidationMode::Reconcile, out.path()).unwrap();
    let err = validator.reconcile_column(UnitType::Hru, "ETmm").unwrap_err();
    assert!(matches!(
        err,
        ExtractError::RowCountMismatch {
            reference: 595,
            candidate: 600
        }
    ));
}

#[test]
fn missing_database_fails_setup() {
    let run = monthly_run();
    fs::remove_file(run.path().join("result_627_monthly.db3")).unwrap();
    let out = TempDir::new().unwrap();
    let err = Validator::from_folder(run.path(), ValidationMode::Correlation, out.path())
        .err()
        .unwrap();
    assert!(matches!(err, ExtractError::MissingDatabase { .. }));
}
