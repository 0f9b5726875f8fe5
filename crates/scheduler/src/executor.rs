// SPDX-License-Identifier: MIT
// Copyright (c) 2026 aof contributors

//! The executor contract (spec §6): the seam between the core scheduler and
//! whatever actually launches an agent process. Implementations live in
//! `aof-adapters`; this crate only owns the trait and its wire types.

use aof_core::{AgentRunId, TaskId};

use crate::error::AdapterError;

/// What the scheduler asks an executor to do with a `ready` task.
#[derive(Debug, Clone)]
pub struct DispatchAction {
    pub task_id: TaskId,
    pub project: String,
    pub agent: Option<String>,
    pub workflow: Option<String>,
}

/// What an executor reports back after accepting (or refusing) a dispatch.
#[derive(Debug, Clone)]
pub struct RunResult {
    pub accepted: bool,
    pub agent_run_id: Option<AgentRunId>,
    pub message: Option<String>,
}

#[async_trait::async_trait]
pub trait Executor: Send + Sync {
    async fn dispatch(&self, action: &DispatchAction) -> Result<RunResult, AdapterError>;
}
