// SPDX-License-Identifier: MIT
// Copyright (c) 2026 aof contributors

use super::*;
use tempfile::tempdir;

fn write_roster(dir: &Path, name: &str, agents: &[(&str, &str)]) -> String {
    let path = dir.join(name);
    let json = serde_json::to_string(
        &agents.iter().map(|(id, name)| RosterAgent { id: id.to_string(), name: name.to_string() }).collect::<Vec<_>>(),
    )
    .unwrap();
    std::fs::write(&path, json).unwrap();
    path.to_string_lossy().into_owned()
}

#[tokio::test]
async fn drift_is_clean_when_rosters_match() {
    let dir = tempdir().unwrap();
    let chart = write_roster(dir.path(), "declared.json", &[("a1", "Alice")]);
    let live = write_roster(dir.path(), "live.json", &[("a1", "Alice")]);

    let result = drift_cmd(dir.path(), chart, RosterSourceKind::Fixture, Some(live), None, vec![], OutputFormat::Json).await;
    assert!(result.is_ok());
}

#[tokio::test]
async fn drift_reports_an_expected_failure_when_rosters_diverge() {
    let dir = tempdir().unwrap();
    let chart = write_roster(dir.path(), "declared.json", &[("a1", "Alice"), ("a2", "Bob")]);
    let live = write_roster(dir.path(), "live.json", &[("a1", "Alice"), ("a3", "Carol")]);

    let err = drift_cmd(dir.path(), chart, RosterSourceKind::Fixture, Some(live), None, vec![], OutputFormat::Json).await.unwrap_err();
    assert!(matches!(err, CliError::Expected(_)));
}

#[tokio::test]
async fn fixture_source_requires_the_fixture_flag() {
    let dir = tempdir().unwrap();
    let chart = write_roster(dir.path(), "declared.json", &[("a1", "Alice")]);

    let err = drift_cmd(dir.path(), chart, RosterSourceKind::Fixture, None, None, vec![], OutputFormat::Text).await.unwrap_err();
    assert!(matches!(err, CliError::Usage(_)));
}
