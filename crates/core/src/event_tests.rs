// SPDX-License-Identifier: MIT
// Copyright (c) 2026 aof contributors

use super::*;

#[test]
fn task_created_payload_has_no_enum_wrapper() {
    let kind = EventKind::TaskCreated { project: "demo".into(), title: "Deploy".into() };
    assert_eq!(kind.type_tag(), "task.created");
    let payload = kind.to_payload();
    assert_eq!(payload["project"], "demo");
    assert_eq!(payload["title"], "Deploy");
    assert!(payload.get("TaskCreated").is_none());
}

#[test]
fn unit_variant_payload_is_empty_object() {
    let payload = EventKind::TaskUnblocked.to_payload();
    assert_eq!(payload, serde_json::json!({}));
}

#[test]
fn custom_payload_round_trips_verbatim() {
    let payload = serde_json::json!({"anything": [1, 2, 3]});
    let kind = EventKind::Custom { event_type: "vendor.thing".into(), payload: payload.clone() };
    assert_eq!(kind.type_tag(), "vendor.thing");
    assert_eq!(kind.to_payload(), payload);
}

#[test]
fn event_envelope_serializes_flat() {
    let kind = EventKind::LeaseExpired { lease_id: "lse-1".into(), agent_id: "agent-1".into() };
    let mut event = Event::new(&kind, "scheduler", Some(TaskId::from("TASK-2026-07-30-001")));
    event.event_id = 7;
    let json = serde_json::to_value(&event).unwrap();
    assert_eq!(json["eventId"], 7);
    assert_eq!(json["type"], "lease.expired");
    assert_eq!(json["taskId"], "TASK-2026-07-30-001");
    assert_eq!(json["payload"]["leaseId"], "lse-1");
}

#[test]
fn unknown_type_tag_round_trips_through_custom() {
    let json = serde_json::json!({
        "eventId": 1,
        "type": "some.future.event",
        "timestamp": "2026-01-01T00:00:00Z",
        "actor": "external",
        "payload": {"x": 1}
    });
    let event: Event = serde_json::from_value(json).unwrap();
    assert_eq!(event.event_type, "some.future.event");
    assert_eq!(event.payload["x"], 1);
}
