// SPDX-License-Identifier: MIT
// Copyright (c) 2026 aof contributors

use super::*;
use tempfile::tempdir;

fn agent(id: &str, name: &str) -> RosterAgent {
    RosterAgent { id: id.to_string(), name: name.to_string() }
}

#[test]
fn clean_roster_produces_an_empty_report_and_exit_code_zero() {
    let declared = vec![agent("main", "Main"), agent("dev", "Dev")];
    let live = declared.clone();
    let report = compare(&declared, &live);
    assert!(report.is_clean());
    assert_eq!(report.exit_code(), 0);
}

#[test]
fn missing_and_extra_are_partitioned_and_drive_exit_code_one() {
    let declared = vec![agent("main", "Main"), agent("dev", "Dev")];
    let live = vec![agent("main", "Main"), agent("extra", "Extra")];
    let report = compare(&declared, &live);
    assert_eq!(report.missing, vec!["dev".to_string()]);
    assert_eq!(report.extra, vec!["extra".to_string()]);
    assert!(report.mismatch.is_empty());
    assert_eq!(report.exit_code(), 1);
}

#[test]
fn same_id_different_name_is_a_mismatch_not_missing_or_extra() {
    let declared = vec![agent("main", "Main")];
    let live = vec![agent("main", "Principal")];
    let report = compare(&declared, &live);
    assert!(report.missing.is_empty());
    assert!(report.extra.is_empty());
    assert_eq!(report.mismatch, vec![Mismatch { id: "main".to_string(), declared_name: "Main".to_string(), live_name: "Principal".to_string() }]);
}

#[tokio::test]
async fn fixture_source_reads_the_declared_json_shape() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("roster.json");
    std::fs::write(&path, r#"[{"id":"main","name":"Main"}]"#).unwrap();
    let source = FixtureRosterSource::new(&path);
    let live = source.fetch().await.unwrap();
    assert_eq!(live, vec![agent("main", "Main")]);
}

#[tokio::test]
async fn fixture_source_missing_file_is_a_hard_error() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("missing.json");
    let source = FixtureRosterSource::new(&path);
    assert!(source.fetch().await.is_err());
}

#[tokio::test]
async fn detect_surfaces_a_fetch_error_rather_than_an_empty_report() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("missing.json");
    let source = FixtureRosterSource::new(&path);
    let err = detect(&[agent("main", "Main")], &source).await.unwrap_err();
    assert!(matches!(err, OpsError::RosterSource(..)));
}

#[tokio::test]
async fn end_to_end_drift_report_matches_the_documented_scenario() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("roster.json");
    std::fs::write(&path, r#"[{"id":"main","name":"Main"},{"id":"extra","name":"Extra"}]"#).unwrap();
    let declared = vec![agent("main", "Main"), agent("dev", "Dev")];
    let source = FixtureRosterSource::new(&path);
    let report = detect(&declared, &source).await.unwrap();
    assert_eq!(report.missing, vec!["dev".to_string()]);
    assert_eq!(report.extra, vec!["extra".to_string()]);
    assert!(report.mismatch.is_empty());
    assert_eq!(report.exit_code(), 1);
}
