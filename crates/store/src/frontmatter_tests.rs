// SPDX-License-Identifier: MIT
// Copyright (c) 2026 aof contributors

use super::*;
use aof_core::test_support::TaskBuilder;

#[test]
fn round_trips_task_with_body() {
    let task = TaskBuilder::new("TASK-2026-07-30-001")
        .title("Deploy")
        .body("## Instructions\n\nDo the thing.\n")
        .build();
    let rendered = render_task(&task).unwrap();
    assert!(rendered.starts_with("---\n"));
    let parsed = parse_task(&rendered).unwrap();
    assert_eq!(parsed.id, task.id);
    assert_eq!(parsed.title, task.title);
    assert_eq!(parsed.body.trim(), "## Instructions\n\nDo the thing.".trim());
}

#[test]
fn round_trips_task_with_empty_body() {
    let task = TaskBuilder::new("TASK-2026-07-30-002").title("No body").build();
    let rendered = render_task(&task).unwrap();
    let parsed = parse_task(&rendered).unwrap();
    assert_eq!(parsed.body, "");
}

#[test]
fn missing_open_fence_is_rejected() {
    let err = parse_task("title: Deploy\n---\n").unwrap_err();
    assert!(matches!(err, FrontmatterError::MissingOpenFence));
}

#[test]
fn missing_close_fence_is_rejected() {
    let err = parse_task("---\ntitle: Deploy\n").unwrap_err();
    assert!(matches!(err, FrontmatterError::MissingCloseFence));
}

#[test]
fn invalid_yaml_is_rejected() {
    let raw = "---\nid: [unterminated\n---\nbody\n";
    let err = parse_task(raw).unwrap_err();
    assert!(matches!(err, FrontmatterError::InvalidYaml(_)));
}

#[test]
fn unknown_frontmatter_keys_round_trip_through_metadata() {
    let raw = "---\nid: TASK-2026-07-30-003\nproject: demo\ntitle: Test\nstatus: backlog\ncreatedAt: 1970-01-01T00:00:00Z\nupdatedAt: 1970-01-01T00:00:00Z\nlastTransitionAt: 1970-01-01T00:00:00Z\ncreatedBy: tester\nsomeFutureKey: kept\n---\nbody text\n";
    let task = parse_task(raw).unwrap();
    assert_eq!(task.metadata.0.get("someFutureKey").and_then(|v| v.as_str()), Some("kept"));
    let rendered = render_task(&task).unwrap();
    assert!(rendered.contains("someFutureKey"));
}
