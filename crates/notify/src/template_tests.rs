// SPDX-License-Identifier: MIT
// Copyright (c) 2026 aof contributors

use super::*;
use serde_json::json;

#[test]
fn substitutes_task_id_actor_and_payload_fields() {
    let rendered = render(
        "{actor} moved {taskId} {from} -> {to}",
        Some("TASK-2026-07-30-001"),
        "scheduler",
        &json!({"from": "review", "to": "done"}),
    );
    assert_eq!(rendered, "scheduler moved TASK-2026-07-30-001 review -> done");
}

#[test]
fn missing_task_id_renders_a_dash() {
    let rendered = render("task: {taskId}", None, "murmur", &json!({}));
    assert_eq!(rendered, "task: -");
}

#[test]
fn unmatched_placeholders_are_left_untouched() {
    let rendered = render("{unknownField} stays", None, "actor", &json!({}));
    assert_eq!(rendered, "{unknownField} stays");
}
