// SPDX-License-Identifier: MIT
// Copyright (c) 2026 aof contributors

//! Per-team review-cycle trigger evaluator (spec.md §4.9). Persisted state
//! lives at `.murmur/<team>.json`, one file per team, written
//! write-temp-then-rename like every other vault file.
//!
//! Grounded in the teacher's cron handler
//! (`oj_engine::runtime::handlers::cron`): a per-entity record holding
//! accumulated counters plus a "currently running" guard, advanced through
//! explicit started/stopped lifecycle calls rather than free-form mutation.

use std::fs;
use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use aof_core::{Clock, Task, TaskId, TaskStatus};
use aof_store::TaskStore;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex as AsyncMutex;

use crate::error::OpsError;

/// Default ceiling on how long a review may stay in flight before Murmur
/// considers it abandoned and clears the guard (spec.md §4.9).
pub const DEFAULT_REVIEW_TIMEOUT: chrono::Duration = chrono::Duration::minutes(30);

/// A single trigger condition, evaluated in order with first-fire-wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MurmurTrigger {
    QueueEmpty,
    CompletionBatch { threshold: u32 },
    FailureBatch { threshold: u32 },
    Interval { interval_ms: i64 },
}

/// Persisted per-team Murmur state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MurmurState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_review_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub completions_since_last_review: u32,
    #[serde(default)]
    pub failures_since_last_review: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_review_task_id: Option<TaskId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_triggered_by: Option<String>,
    /// When the in-flight review started, for the stale-review timeout.
    /// Not named in spec.md's state shape but required to implement its
    /// "elapsed since reviewStartedAt" stale-review rule.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub review_started_at: Option<DateTime<Utc>>,
}

/// Result of a `tick()` call that found a trigger ready to fire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MurmurFire {
    pub trigger: MurmurTrigger,
}

pub struct MurmurController<C: Clock> {
    store: Arc<TaskStore<C>>,
    clock: C,
    murmur_dir: PathBuf,
    review_timeout: chrono::Duration,
    locks: DashMap<String, Arc<AsyncMutex<()>>>,
}

impl<C: Clock> MurmurController<C> {
    pub fn new(store: Arc<TaskStore<C>>, clock: C) -> Self {
        let murmur_dir = store.paths().murmur_dir();
        Self { store, clock, murmur_dir, review_timeout: DEFAULT_REVIEW_TIMEOUT, locks: DashMap::new() }
    }

    pub fn with_review_timeout(mut self, timeout: chrono::Duration) -> Self {
        self.review_timeout = timeout;
        self
    }

    /// Bump the completion counter, e.g. when a task for `team` reaches `done`.
    pub async fn record_completion(&self, team: &str) -> Result<(), OpsError> {
        self.with_team_lock(team, |state| state.completions_since_last_review += 1).await
    }

    /// Bump the failure counter, e.g. when a task for `team` deadletters.
    pub async fn record_failure(&self, team: &str) -> Result<(), OpsError> {
        self.with_team_lock(team, |state| state.failures_since_last_review += 1).await
    }

    /// Evaluate `triggers` in order against `team`'s current state and the
    /// live task counts. Returns the first trigger that fires, or `None` if
    /// a review is already in flight or nothing matched. Does not itself
    /// start a review; callers create the review task and call
    /// [`Self::start_review`] once they have its id.
    pub async fn tick(&self, team: &str, triggers: &[MurmurTrigger]) -> Result<Option<MurmurFire>, OpsError> {
        let lock = self.lock_for(team);
        let _guard = lock.lock().await;

        let mut state = self.load_state(team)?;
        if self.clear_stale_review(&mut state) {
            self.save_state(team, &state)?;
        }
        if state.current_review_task_id.is_some() {
            return Ok(None);
        }

        let now = self.clock.utc_now();
        let counts = self.store.count_by_status();
        for trigger in triggers {
            let fires = match *trigger {
                MurmurTrigger::QueueEmpty => {
                    count_of(&counts, TaskStatus::Ready) == 0 && count_of(&counts, TaskStatus::InProgress) == 0
                }
                MurmurTrigger::CompletionBatch { threshold } => state.completions_since_last_review >= threshold,
                MurmurTrigger::FailureBatch { threshold } => state.failures_since_last_review >= threshold,
                MurmurTrigger::Interval { interval_ms } => match state.last_review_at {
                    None => true,
                    Some(last) => (now - last).num_milliseconds() >= interval_ms,
                },
            };
            if fires {
                return Ok(Some(MurmurFire { trigger: *trigger }));
            }
        }
        Ok(None)
    }

    /// Record that `task_id` is now `team`'s in-flight review, guarding
    /// further triggers from firing until [`Self::complete_review`].
    pub async fn start_review(&self, team: &str, task_id: TaskId, triggered_by: impl Into<String>) -> Result<(), OpsError> {
        let now = self.clock.utc_now();
        self.with_team_lock(team, move |state| {
            state.current_review_task_id = Some(task_id);
            state.review_started_at = Some(now);
            state.last_triggered_by = Some(triggered_by.into());
        })
        .await
    }

    /// Close out `team`'s in-flight review: clear the guard, reset the
    /// completion/failure counters, and stamp `lastReviewAt`.
    pub async fn complete_review(&self, team: &str) -> Result<(), OpsError> {
        let now = self.clock.utc_now();
        self.with_team_lock(team, move |state| {
            state.current_review_task_id = None;
            state.review_started_at = None;
            state.last_triggered_by = None;
            state.completions_since_last_review = 0;
            state.failures_since_last_review = 0;
            state.last_review_at = Some(now);
        })
        .await
    }

    pub fn state(&self, team: &str) -> Result<MurmurState, OpsError> {
        self.load_state(team)
    }

    /// Clears `currentReviewTaskId` in-place when the referenced task is
    /// missing, terminal, or has been in flight past `review_timeout`.
    /// Returns whether anything changed.
    fn clear_stale_review(&self, state: &mut MurmurState) -> bool {
        let Some(task_id) = state.current_review_task_id.clone() else { return false };
        let stale = match self.store.get(&task_id) {
            None => true,
            Some(task) => is_terminal(&task) || self.past_timeout(state.review_started_at),
        };
        if stale {
            state.current_review_task_id = None;
            state.review_started_at = None;
            state.last_triggered_by = None;
        }
        stale
    }

    fn past_timeout(&self, started_at: Option<DateTime<Utc>>) -> bool {
        match started_at {
            None => false,
            Some(started) => self.clock.utc_now() - started >= self.review_timeout,
        }
    }

    async fn with_team_lock(&self, team: &str, f: impl FnOnce(&mut MurmurState) + Send) -> Result<(), OpsError> {
        let lock = self.lock_for(team);
        let _guard = lock.lock().await;
        let mut state = self.load_state(team)?;
        f(&mut state);
        self.save_state(team, &state)
    }

    fn lock_for(&self, team: &str) -> Arc<AsyncMutex<()>> {
        self.locks.entry(team.to_string()).or_insert_with(|| Arc::new(AsyncMutex::new(()))).clone()
    }

    fn state_path(&self, team: &str) -> PathBuf {
        self.murmur_dir.join(format!("{team}.json"))
    }

    fn load_state(&self, team: &str) -> Result<MurmurState, OpsError> {
        let path = self.state_path(team);
        match fs::read_to_string(&path) {
            Ok(raw) => serde_json::from_str(&raw)
                .map_err(|source| OpsError::StateDecode { path: path.display().to_string(), source }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(MurmurState::default()),
            Err(source) => Err(OpsError::Io { path: path.display().to_string(), source }),
        }
    }

    fn save_state(&self, team: &str, state: &MurmurState) -> Result<(), OpsError> {
        let path = self.state_path(team);
        write_json_atomic(&path, state)
    }
}

fn is_terminal(task: &Task) -> bool {
    task.status.is_terminal()
}

fn count_of(counts: &std::collections::HashMap<TaskStatus, usize>, status: TaskStatus) -> usize {
    counts.get(&status).copied().unwrap_or(0)
}

fn write_json_atomic(path: &Path, value: &impl Serialize) -> Result<(), OpsError> {
    // Allow expect here as callers always pass state_path(team), which always has a parent
    #[allow(clippy::expect_used)]
    let parent = path.parent().expect("murmur state path always has a parent");
    fs::create_dir_all(parent).map_err(|source| OpsError::Io { path: parent.display().to_string(), source })?;
    let rendered = serde_json::to_string_pretty(value)
        .map_err(|source| OpsError::StateDecode { path: path.display().to_string(), source })?;
    let tmp_path = parent.join(format!(".{}.tmp-{}", file_name(path), std::process::id()));
    {
        let mut f = fs::File::create(&tmp_path).map_err(|source| OpsError::Io { path: tmp_path.display().to_string(), source })?;
        f.write_all(rendered.as_bytes()).map_err(|source| OpsError::Io { path: tmp_path.display().to_string(), source })?;
        f.sync_all().map_err(|source| OpsError::Io { path: tmp_path.display().to_string(), source })?;
    }
    fs::rename(&tmp_path, path).map_err(|source| OpsError::Io { path: path.display().to_string(), source })?;
    Ok(())
}

fn file_name(path: &Path) -> String {
    path.file_name().map(|n| n.to_string_lossy().to_string()).unwrap_or_default()
}

#[cfg(test)]
#[path = "murmur_tests.rs"]
mod tests;
