// SPDX-License-Identifier: MIT
// Copyright (c) 2026 aof contributors

//! Result shapes for a single scheduler poll (spec §4.4).

use aof_core::{AgentRunId, TaskId};
use chrono::{DateTime, Utc};

/// One outcome recorded for a single candidate task during a poll.
#[derive(Debug, Clone, PartialEq)]
pub enum PollAction {
    Dispatched { task_id: TaskId, agent_run_id: Option<AgentRunId> },
    /// `dry_run` mode: what the scheduler would have dispatched.
    WouldDispatch { task_id: TaskId },
    SkippedUnresolvedDeps { task_id: TaskId },
    LeaseRenewed { task_id: TaskId },
    LeaseExpired { task_id: TaskId, deadlettered: bool },
    PlatformLimited { task_id: TaskId, message: String },
    AdapterError { task_id: TaskId, message: String },
}

impl PollAction {
    pub fn task_id(&self) -> &TaskId {
        match self {
            PollAction::Dispatched { task_id, .. }
            | PollAction::WouldDispatch { task_id }
            | PollAction::SkippedUnresolvedDeps { task_id }
            | PollAction::LeaseRenewed { task_id }
            | PollAction::LeaseExpired { task_id, .. }
            | PollAction::PlatformLimited { task_id, .. }
            | PollAction::AdapterError { task_id, .. } => task_id,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PollStats {
    pub ready_candidates: usize,
    pub in_progress_candidates: usize,
    pub dispatched: usize,
}

#[derive(Debug, Clone)]
pub struct PollResult {
    pub scanned_at: DateTime<Utc>,
    pub duration_ms: u64,
    pub actions: Vec<PollAction>,
    pub stats: PollStats,
}
