// SPDX-License-Identifier: MIT
// Copyright (c) 2026 aof contributors

//! The task state machine: status, routing, leases, and gate state.
//!
//! This module defines the pure data shapes and the lifecycle legality
//! table from the spec. File I/O, locking, and side effects live in
//! `aof-store`; this crate only knows about values.

use crate::ids::{LeaseId, TaskId};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Task lifecycle status. Serializes as the lowercase-hyphenated spec name
/// (`in-progress`, not `InProgress`) since this is also the task's parent
/// directory name under `tasks/<status>/`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskStatus {
    Backlog,
    Ready,
    InProgress,
    Review,
    Blocked,
    Done,
    Cancelled,
    Deadletter,
}

crate::simple_display! {
    TaskStatus {
        Backlog => "backlog",
        Ready => "ready",
        InProgress => "in-progress",
        Review => "review",
        Blocked => "blocked",
        Done => "done",
        Cancelled => "cancelled",
        Deadletter => "deadletter",
    }
}

impl TaskStatus {
    pub const ALL: [TaskStatus; 8] = [
        TaskStatus::Backlog,
        TaskStatus::Ready,
        TaskStatus::InProgress,
        TaskStatus::Review,
        TaskStatus::Blocked,
        TaskStatus::Done,
        TaskStatus::Cancelled,
        TaskStatus::Deadletter,
    ];

    /// Directory name under `tasks/` this status lives in. Identical to
    /// `Display` today, kept distinct because the two mean different things
    /// (serialization tag vs. filesystem path component).
    pub fn dir_name(self) -> &'static str {
        match self {
            TaskStatus::Backlog => "backlog",
            TaskStatus::Ready => "ready",
            TaskStatus::InProgress => "in-progress",
            TaskStatus::Review => "review",
            TaskStatus::Blocked => "blocked",
            TaskStatus::Done => "done",
            TaskStatus::Cancelled => "cancelled",
            TaskStatus::Deadletter => "deadletter",
        }
    }

    pub fn from_dir_name(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|st| st.dir_name() == s)
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, TaskStatus::Done | TaskStatus::Cancelled | TaskStatus::Deadletter)
    }
}

/// True iff `from -> to` is a permitted transition per spec.md §3.
///
/// `from == to` is intentionally `true` (re-stating the current status is a
/// no-op per the idempotence law in spec.md §8), except for terminal
/// states, which reject every transition including the identity one — a
/// terminal task's frontmatter must never be rewritten by a transition call.
pub fn transition_allowed(from: TaskStatus, to: TaskStatus) -> bool {
    use TaskStatus::*;
    if from.is_terminal() {
        return false;
    }
    if from == to {
        return true;
    }
    match (from, to) {
        (Backlog, Ready) => true,
        (Ready, InProgress) => true,
        (InProgress, Review) => true,
        (Review, Done) => true,
        (Review, InProgress) => true, // gate rejection
        (Blocked, Ready) => true,
        (_, Blocked) => true,    // any non-terminal -> blocked
        (_, Cancelled) => true,  // any non-terminal -> cancelled
        (InProgress, Deadletter) => true,
        _ => false,
    }
}

/// Task priority, ordered `High > Normal > Low` for scheduler tie-breaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Normal,
    High,
}

impl Default for Priority {
    fn default() -> Self {
        Priority::Normal
    }
}

/// Routing metadata: who/what this task is meant for.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Routing {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workflow: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent: Option<String>,
}

impl Routing {
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}

/// A TTL-bounded exclusive assignment of a task to an executor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lease {
    pub lease_id: LeaseId,
    pub agent_id: String,
    pub acquired_at: chrono::DateTime<chrono::Utc>,
    pub expires_at: chrono::DateTime<chrono::Utc>,
    #[serde(default)]
    pub renewal_count: u32,
}

impl Lease {
    pub fn is_expired(&self, now: chrono::DateTime<chrono::Utc>) -> bool {
        now > self.expires_at
    }
}

/// Outcome of a single gate decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GateOutcome {
    Approved,
    Rejected,
    Skipped,
    Blocked,
}

/// One completed (or auto-skipped) gate decision, appended to `gate_history`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GateHistoryEntry {
    pub gate: String,
    pub outcome: GateOutcome,
    pub at: chrono::DateTime<chrono::Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

/// Current position of a task within its workflow's gate sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GateState {
    pub current: String,
    pub entered: chrono::DateTime<chrono::Utc>,
}

/// Free-form metadata bag. Known keys (`block_reason`, `review_required`)
/// get typed accessors; everything else round-trips verbatim, per the
/// "preserve unknown fields" design note.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Metadata(#[serde(flatten)] pub IndexMap<String, serde_yaml::Value>);

impl Metadata {
    pub fn block_reason(&self) -> Option<&str> {
        self.0.get("blockReason").and_then(|v| v.as_str())
    }

    pub fn set_block_reason(&mut self, reason: impl Into<String>) {
        self.0.insert("blockReason".to_string(), serde_yaml::Value::String(reason.into()));
    }

    pub fn clear_block_reason(&mut self) {
        self.0.shift_remove("blockReason");
    }

    pub fn review_required(&self) -> bool {
        self.0.get("reviewRequired").and_then(|v| v.as_bool()).unwrap_or(false)
    }

    /// The status a blocked task should return to on `unblock`, stashed by
    /// `TaskStore::block` per the `block(r); unblock()` law in spec.md §8.
    pub fn pre_block_status(&self) -> Option<TaskStatus> {
        self.0
            .get("_preBlockStatus")
            .and_then(|v| v.as_str())
            .and_then(TaskStatus::from_dir_name)
    }

    pub fn set_pre_block_status(&mut self, status: TaskStatus) {
        self.0.insert(
            "_preBlockStatus".to_string(),
            serde_yaml::Value::String(status.dir_name().to_string()),
        );
    }

    pub fn clear_pre_block_status(&mut self) {
        self.0.shift_remove("_preBlockStatus");
    }

    /// Count of consecutive lease expiries (no intervening successful
    /// dispatch) on this task, used by the scheduler's deadletter rule
    /// (spec §4.4: "three consecutive expiries ... move it to deadletter").
    pub fn lease_expiry_streak(&self) -> u32 {
        self.0.get("_leaseExpiryStreak").and_then(|v| v.as_u64()).unwrap_or(0) as u32
    }

    pub fn set_lease_expiry_streak(&mut self, n: u32) {
        self.0.insert("_leaseExpiryStreak".to_string(), serde_yaml::Value::Number(n.into()));
    }

    pub fn clear_lease_expiry_streak(&mut self) {
        self.0.shift_remove("_leaseExpiryStreak");
    }
}

/// A task's full frontmatter record plus its free-form Markdown body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    pub project: String,
    pub title: String,
    pub status: TaskStatus,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub routing: Routing,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
    pub last_transition_at: chrono::DateTime<chrono::Utc>,
    pub created_by: String,
    #[serde(default)]
    pub depends_on: BTreeSet<TaskId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lease: Option<Lease>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gate: Option<GateState>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub gate_history: Vec<GateHistoryEntry>,
    #[serde(default)]
    pub metadata: Metadata,
    /// Body text after the frontmatter fence. Never touched by serde; kept
    /// out of the frontmatter struct and reattached by the vault I/O layer.
    #[serde(skip)]
    pub body: String,
}

/// Case-insensitive `## Instructions` / `## Guidance` section extraction.
///
/// Instructions are contract; guidance is advisory (spec.md §3). Returns
/// `(instructions, guidance)`, each `None` if the section is absent.
pub fn split_body_sections(body: &str) -> (Option<String>, Option<String>) {
    let mut instructions = None;
    let mut guidance = None;
    let lines: Vec<&str> = body.lines().collect();
    let mut i = 0;
    while i < lines.len() {
        let line = lines[i].trim();
        if let Some(heading) = line.strip_prefix("## ") {
            let heading_lc = heading.trim().to_lowercase();
            if heading_lc == "instructions" || heading_lc == "guidance" {
                let start = i + 1;
                let end = lines[start..]
                    .iter()
                    .position(|l| l.trim_start().starts_with("## "))
                    .map(|rel| start + rel)
                    .unwrap_or(lines.len());
                let section = lines[start..end].join("\n").trim().to_string();
                if heading_lc == "instructions" {
                    instructions = Some(section);
                } else {
                    guidance = Some(section);
                }
                i = end;
                continue;
            }
        }
        i += 1;
    }
    (instructions, guidance)
}

#[cfg(test)]
#[path = "task_tests.rs"]
mod tests;
