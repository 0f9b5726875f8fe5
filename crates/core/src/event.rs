// SPDX-License-Identifier: MIT
// Copyright (c) 2026 aof contributors

//! Event envelope and the known event-kind catalog.
//!
//! Mirrors the teacher's `Event` design (`#[serde(tag = "type")]` with a
//! catch-all for forward compatibility) but keeps the wire shape spec.md §3
//! demands: a flat envelope of `{eventId, type, timestamp, actor, taskId,
//! payload}` rather than an internally-tagged enum. `EventKind` is the typed
//! half used by producers inside this workspace; `payload` is what actually
//! gets written to the JSONL log and is reconstructed from `EventKind` on
//! write. An event read back whose `type` isn't recognized deserializes to
//! `EventKind::Custom` with the payload preserved verbatim.

use crate::ids::TaskId;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The append-only envelope written to the event log, one per JSONL line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub event_id: u64,
    #[serde(rename = "type")]
    pub event_type: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub actor: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<TaskId>,
    #[serde(default)]
    pub payload: Value,
}

impl Event {
    /// Build an envelope from a typed kind. `event_id` is assigned by the
    /// logger at append time, so it's left at `0` here as a placeholder.
    pub fn new(kind: &EventKind, actor: impl Into<String>, task_id: Option<TaskId>) -> Self {
        Self {
            event_id: 0,
            event_type: kind.type_tag().to_string(),
            timestamp: chrono::DateTime::<chrono::Utc>::UNIX_EPOCH,
            actor: actor.into(),
            task_id,
            payload: kind.to_payload(),
        }
    }
}

/// Known, typed event shapes. Producers build one of these; the envelope's
/// `payload` is always the JSON rendering of the variant's fields (never the
/// enum tag itself — the tag lives in `Event::event_type`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EventKind {
    TaskCreated { project: String, title: String },
    TaskTransitioned { from: String, to: String, reason: Option<String> },
    TaskBlocked { reason: String },
    TaskUnblocked,
    DependencyAdded { blocker: TaskId },
    DependencyRemoved { blocker: TaskId },
    LeaseAcquired { lease_id: String, agent_id: String, expires_at: chrono::DateTime<chrono::Utc> },
    LeaseRenewed { lease_id: String, renewal_count: u32 },
    LeaseReleased { lease_id: String },
    LeaseExpired { lease_id: String, agent_id: String },
    GateTransitioned { gate: String, outcome: String },
    WarmDocUpdated { rule_id: String, path: String },
    NotificationSent { channel: String, event_type: String },
    NotificationSuppressed { channel: String, event_type: String },
    MurmurTriggered { team: String, trigger: String, review_task_id: TaskId },
    DriftDetected { missing: usize, extra: usize, mismatch: usize },
    /// Fallback for payloads produced outside this crate's known catalog, or
    /// read back with an unrecognized `type` tag.
    Custom { event_type: String, payload: Value },
}

impl EventKind {
    pub fn type_tag(&self) -> &str {
        match self {
            EventKind::TaskCreated { .. } => "task.created",
            EventKind::TaskTransitioned { .. } => "task.transitioned",
            EventKind::TaskBlocked { .. } => "task.blocked",
            EventKind::TaskUnblocked => "task.unblocked",
            EventKind::DependencyAdded { .. } => "task.dependency_added",
            EventKind::DependencyRemoved { .. } => "task.dependency_removed",
            EventKind::LeaseAcquired { .. } => "lease.acquired",
            EventKind::LeaseRenewed { .. } => "lease.renewed",
            EventKind::LeaseReleased { .. } => "lease.released",
            EventKind::LeaseExpired { .. } => "lease.expired",
            EventKind::GateTransitioned { .. } => "gate.transitioned",
            EventKind::WarmDocUpdated { .. } => "warm.updated",
            EventKind::NotificationSent { .. } => "notification.sent",
            EventKind::NotificationSuppressed { .. } => "notification.suppressed",
            EventKind::MurmurTriggered { .. } => "murmur.triggered",
            EventKind::DriftDetected { .. } => "drift.detected",
            EventKind::Custom { event_type, .. } => event_type,
        }
    }

    /// Render this kind's fields as the JSON object that belongs in
    /// `Event::payload` (i.e. without the enum's own tag/variant-name key).
    pub fn to_payload(&self) -> Value {
        match self {
            EventKind::Custom { payload, .. } => payload.clone(),
            EventKind::TaskUnblocked => Value::Object(serde_json::Map::new()),
            other => {
                // Unit-less variants serialize externally-tagged as
                // `{"VariantName": {..fields..}}`; strip that one wrapper level.
                let tagged = serde_json::to_value(other).unwrap_or(Value::Null);
                match tagged {
                    Value::Object(map) => {
                        map.into_values().next().unwrap_or(Value::Object(serde_json::Map::new()))
                    }
                    other => other,
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
