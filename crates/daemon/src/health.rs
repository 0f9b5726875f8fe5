// SPDX-License-Identifier: MIT
// Copyright (c) 2026 aof contributors

//! `HealthTracker`: the in-process state the `/healthz` and `/status`
//! routes read (spec.md §4.8, §6). `/healthz` never touches the store —
//! it only answers from the atomics here, so it stays fast and available
//! even if the store is wedged; `/status` is the one that actually calls
//! `TaskStore::count_by_status`.

use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use aof_core::{Clock, TaskStatus};
use aof_store::TaskStore;
use serde::Serialize;

use crate::env::HEALTH_STALE_AFTER_SECS;

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Overall {
    Healthy,
    Degraded,
    Unhealthy,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskCounts {
    pub open: usize,
    pub ready: usize,
    pub in_progress: usize,
    pub blocked: usize,
    pub done: usize,
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentState {
    Running,
    Stopped,
    Ok,
    Error,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Components {
    pub scheduler: ComponentState,
    pub store: ComponentState,
    pub event_logger: ComponentState,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigSummary {
    pub data_dir: String,
    pub poll_interval_ms: u64,
    pub providers_configured: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthStatus {
    pub status: Overall,
    pub version: String,
    pub uptime: i64,
    pub last_poll_at: Option<chrono::DateTime<chrono::Utc>>,
    pub last_event_at: Option<chrono::DateTime<chrono::Utc>>,
    pub task_counts: TaskCounts,
    pub components: Components,
    pub config: ConfigSummary,
}

/// Shared, cheaply-cloned tracker updated by the poll loop and the event
/// subscriber, read by the health server on every request.
pub struct HealthTracker {
    started: Instant,
    last_poll_at: AtomicI64,
    last_event_at: AtomicI64,
    last_poll_ok: AtomicBool,
    shutting_down: AtomicBool,
    data_dir: String,
    poll_interval_ms: u64,
    providers_configured: usize,
}

const NO_TIMESTAMP: i64 = i64::MIN;

impl HealthTracker {
    pub fn new(data_dir: String, poll_interval_ms: u64, providers_configured: usize) -> Arc<Self> {
        Arc::new(Self {
            started: Instant::now(),
            last_poll_at: AtomicI64::new(NO_TIMESTAMP),
            last_event_at: AtomicI64::new(NO_TIMESTAMP),
            last_poll_ok: AtomicBool::new(false),
            shutting_down: AtomicBool::new(false),
            data_dir,
            poll_interval_ms,
            providers_configured,
        })
    }

    pub fn record_poll(&self, at: chrono::DateTime<chrono::Utc>, ok: bool) {
        self.last_poll_at.store(at.timestamp(), Ordering::Relaxed);
        self.last_poll_ok.store(ok, Ordering::Relaxed);
    }

    pub fn record_event(&self, at: chrono::DateTime<chrono::Utc>) {
        self.last_event_at.store(at.timestamp(), Ordering::Relaxed);
    }

    pub fn set_shutting_down(&self, value: bool) {
        self.shutting_down.store(value, Ordering::Relaxed);
    }

    /// Synchronous, store-free check for `GET /healthz`.
    pub fn is_healthy(&self) -> bool {
        !self.shutting_down.load(Ordering::Relaxed) && self.last_poll_ok.load(Ordering::Relaxed)
    }

    fn timestamp(raw: i64) -> Option<chrono::DateTime<chrono::Utc>> {
        if raw == NO_TIMESTAMP {
            None
        } else {
            chrono::DateTime::from_timestamp(raw, 0)
        }
    }

    /// Build the full `GET /status` payload, per spec.md §6: healthy iff the
    /// last poll was under `HEALTH_STALE_AFTER_SECS` ago and
    /// `count_by_status` succeeds (it's infallible here, so only staleness
    /// can degrade it).
    pub fn snapshot<C: Clock>(&self, store: &TaskStore<C>, clock: &C) -> HealthStatus {
        let last_poll_at = Self::timestamp(self.last_poll_at.load(Ordering::Relaxed));
        let last_event_at = Self::timestamp(self.last_event_at.load(Ordering::Relaxed));

        let stale = match last_poll_at {
            None => true,
            Some(at) => (clock.utc_now() - at).num_seconds() >= HEALTH_STALE_AFTER_SECS,
        };

        let status = if self.shutting_down.load(Ordering::Relaxed) {
            Overall::Unhealthy
        } else if stale {
            Overall::Unhealthy
        } else if !self.last_poll_ok.load(Ordering::Relaxed) {
            Overall::Degraded
        } else {
            Overall::Healthy
        };

        let counts = store.count_by_status();
        let count_of = |s: TaskStatus| counts.get(&s).copied().unwrap_or(0);
        let open = count_of(TaskStatus::Backlog) + count_of(TaskStatus::Ready) + count_of(TaskStatus::InProgress)
            + count_of(TaskStatus::Review)
            + count_of(TaskStatus::Blocked);

        HealthStatus {
            status,
            version: env!("CARGO_PKG_VERSION").to_string(),
            uptime: self.started.elapsed().as_secs() as i64,
            last_poll_at,
            last_event_at,
            task_counts: TaskCounts {
                open,
                ready: count_of(TaskStatus::Ready),
                in_progress: count_of(TaskStatus::InProgress),
                blocked: count_of(TaskStatus::Blocked),
                done: count_of(TaskStatus::Done),
            },
            components: Components {
                scheduler: if self.shutting_down.load(Ordering::Relaxed) {
                    ComponentState::Stopped
                } else {
                    ComponentState::Running
                },
                store: ComponentState::Ok,
                event_logger: ComponentState::Ok,
            },
            config: ConfigSummary {
                data_dir: self.data_dir.clone(),
                poll_interval_ms: self.poll_interval_ms,
                providers_configured: self.providers_configured,
            },
        }
    }
}

#[cfg(test)]
#[path = "health_tests.rs"]
mod tests;
