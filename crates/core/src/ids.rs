// SPDX-License-Identifier: MIT
// Copyright (c) 2026 aof contributors

//! Identifier types for tasks, leases, and projects.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

crate::define_id! {
    /// Unique identifier for a lease.
    pub struct LeaseId("lse-");
}

crate::define_id! {
    /// Unique identifier for a gate/workflow decision record (used by notification dedupe keys, etc).
    pub struct AgentRunId("run-");
}

/// A task identifier of the form `TASK-YYYY-MM-DD-NNN`.
///
/// `NNN` is a per-day, per-project monotonic sequence assigned by
/// [`crate::task::TaskIdGen`]; this type only models the shape and parsing of
/// the identifier, not its allocation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(pub String);

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TaskIdParseError {
    #[error("task id {0:?} does not match TASK-YYYY-MM-DD-NNN")]
    Malformed(String),
}

impl TaskId {
    /// Build an id from a date and sequence number, e.g. `TASK-2026-07-30-001`.
    pub fn from_parts(date: NaiveDate, seq: u32) -> Self {
        Self(format!("TASK-{}-{:03}", date.format("%Y-%m-%d"), seq))
    }

    pub fn parse(s: impl Into<String>) -> Result<Self, TaskIdParseError> {
        let s = s.into();
        let rest = s.strip_prefix("TASK-").ok_or_else(|| TaskIdParseError::Malformed(s.clone()))?;
        let parts: Vec<&str> = rest.split('-').collect();
        if parts.len() != 4 {
            return Err(TaskIdParseError::Malformed(s));
        }
        let (y, m, d, n) = (parts[0], parts[1], parts[2], parts[3]);
        let valid = y.len() == 4
            && m.len() == 2
            && d.len() == 2
            && n.len() == 3
            && y.chars().all(|c| c.is_ascii_digit())
            && m.chars().all(|c| c.is_ascii_digit())
            && d.chars().all(|c| c.is_ascii_digit())
            && n.chars().all(|c| c.is_ascii_digit());
        if !valid {
            return Err(TaskIdParseError::Malformed(s));
        }
        Ok(Self(s))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True if `prefix` is a prefix of this id's string form (used by
    /// `getByPrefix` ambiguity resolution).
    pub fn starts_with(&self, prefix: &str) -> bool {
        self.0.starts_with(prefix)
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for TaskId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for TaskId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl AsRef<str> for TaskId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::borrow::Borrow<str> for TaskId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Project identifier: `^[a-z0-9][a-z0-9-]{1,63}$`, with `_inbox` reserved.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectId(pub String);

pub const INBOX_PROJECT_ID: &str = "_inbox";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ProjectIdError {
    #[error("project id {0:?} must match ^[a-z0-9][a-z0-9-]{{1,63}}$ (or be `_inbox`)")]
    Invalid(String),
}

impl ProjectId {
    pub fn parse(s: impl Into<String>) -> Result<Self, ProjectIdError> {
        let s = s.into();
        if s == INBOX_PROJECT_ID {
            return Ok(Self(s));
        }
        let bytes = s.as_bytes();
        let len_ok = (2..=64).contains(&bytes.len());
        let first_ok = bytes.first().is_some_and(|b| b.is_ascii_lowercase() || b.is_ascii_digit());
        let rest_ok = bytes.iter().all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || *b == b'-');
        if len_ok && first_ok && rest_ok {
            Ok(Self(s))
        } else {
            Err(ProjectIdError::Invalid(s))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_inbox(&self) -> bool {
        self.0 == INBOX_PROJECT_ID
    }
}

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Monotonically increasing per-log-file event id.
pub type EventId = u64;

/// Next-sequence allocator for `TaskId`s, scoped to (project, date).
///
/// Sequence numbers reset daily, matching the `NNN` field's meaning; the
/// store is responsible for seeding this from existing files on load so
/// restarts do not reuse ids (see `aof-store`).
#[derive(Debug, Default)]
pub struct TaskIdGen {
    counters: std::collections::HashMap<(ProjectId, NaiveDate), u32>,
}

impl TaskIdGen {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `seq` has already been used for `(project, date)`, so the
    /// next `next()` call allocates strictly above it. Used to seed the
    /// generator from on-disk task ids at startup.
    pub fn observe(&mut self, project: ProjectId, date: NaiveDate, seq: u32) {
        let entry = self.counters.entry((project, date)).or_insert(0);
        if seq > *entry {
            *entry = seq;
        }
    }

    pub fn next(&mut self, project: ProjectId, now: DateTime<Utc>) -> TaskId {
        let date = now.date_naive();
        let counter = self.counters.entry((project, date)).or_insert(0);
        *counter += 1;
        TaskId::from_parts(date, *counter)
    }
}

#[cfg(test)]
#[path = "ids_tests.rs"]
mod tests;
