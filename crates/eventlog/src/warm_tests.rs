// SPDX-License-Identifier: MIT
// Copyright (c) 2026 aof contributors

use super::*;
use aof_core::{EventKind, TaskId};
use std::fs;

fn write_cold(dir: &Path, date: &str, lines: &[Event]) {
    let events_dir = dir.join("events");
    fs::create_dir_all(&events_dir).expect("mkdir");
    let mut body = String::new();
    for line in lines {
        body.push_str(&serde_json::to_string(line).expect("encode"));
        body.push('\n');
    }
    fs::write(events_dir.join(format!("{date}.jsonl")), body).expect("write");
}

fn event(id: u64, task: &str, to: &str) -> Event {
    let kind = EventKind::TaskTransitioned { from: "ready".to_string(), to: to.to_string(), reason: None };
    let mut e = Event::new(&kind, "scheduler", Some(TaskId::from(task)));
    e.event_id = id;
    e.timestamp = chrono::DateTime::parse_from_rfc3339("2026-01-01T00:00:00Z").unwrap().with_timezone(&chrono::Utc);
    e
}

#[test]
fn second_run_with_no_new_events_is_unchanged() {
    let dir = tempfile::tempdir().expect("tempdir");
    write_cold(dir.path(), "2026-01-01", &[event(1, "TASK-2026-01-01-001", "done")]);
    let agg = WarmAggregator::new(dir.path(), vec![Box::new(StatusSummaryRule::new())]);

    let first = agg.run();
    assert_eq!(first[0].1.as_ref().expect("ok"), &RunOutcome::Updated);

    let second = agg.run();
    assert_eq!(second[0].1.as_ref().expect("ok"), &RunOutcome::Unchanged);
}

#[test]
fn oversized_document_is_rejected_without_aborting_other_rules() {
    let dir = tempfile::tempdir().expect("tempdir");
    write_cold(dir.path(), "2026-01-01", &[event(1, "TASK-2026-01-01-001", "done")]);

    struct HugeRule;
    impl WarmRule for HugeRule {
        fn id(&self) -> &str {
            "huge"
        }
        fn output_path(&self) -> &str {
            "huge.md"
        }
        fn filter(&self, _event: &Event) -> bool {
            true
        }
        fn ingest(&self, _new_events: &[Event]) -> String {
            "x".repeat(MAX_WARM_DOC_BYTES + 1)
        }
    }

    let agg = WarmAggregator::new(dir.path(), vec![Box::new(HugeRule), Box::new(StatusSummaryRule::new())]);
    let results = agg.run();
    assert_eq!(results[0].1.as_ref().expect("ok"), &RunOutcome::Rejected);
    assert_eq!(results[1].1.as_ref().expect("ok"), &RunOutcome::Updated);
}

#[test]
fn recent_completions_orders_newest_first_and_caps() {
    let dir = tempfile::tempdir().expect("tempdir");
    write_cold(
        dir.path(),
        "2026-01-01",
        &[event(1, "TASK-2026-01-01-001", "done"), event(2, "TASK-2026-01-01-002", "done")],
    );
    let agg = WarmAggregator::new(dir.path(), vec![Box::new(RecentCompletionsRule::new(1))]);
    agg.run();
    let doc = fs::read_to_string(dir.path().join("warm/recent-completions.md")).expect("read");
    assert!(doc.contains("TASK-2026-01-01-002"));
    assert!(!doc.contains("TASK-2026-01-01-001"));
}
