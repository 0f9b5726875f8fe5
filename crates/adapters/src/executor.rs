// SPDX-License-Identifier: MIT
// Copyright (c) 2026 aof contributors

//! A process-spawning [`Executor`]: the one shipped implementation of the
//! dispatch seam spec.md §6 calls out as external. Grounded in the teacher's
//! `coop` adapter's spawn routine — dispatch a child process, return
//! accepted as soon as it's launched, and let a detached task reap its exit
//! so a slow or long-lived agent process never blocks the scheduler's poll
//! tick on its completion.

use std::collections::HashMap;
use std::path::PathBuf;
use std::process::Stdio;

use aof_core::AgentRunId;
use aof_scheduler::{AdapterError, DispatchAction, Executor, RunResult};
use tokio::process::Command;

use crate::error::ProcessExecutorError;

/// Fixed per-dispatch configuration: the command template and the
/// directory new agent workspaces are created under. Per-project/per-agent
/// overrides are out of scope here; the project manifest's `workflow` block
/// owns that routing before a `DispatchAction` ever reaches this executor.
#[derive(Debug, Clone)]
pub struct ProcessExecutorConfig {
    pub command: String,
    pub workspace_root: PathBuf,
    pub env: HashMap<String, String>,
}

/// Spawns `command` with the task id, project, agent, and workflow passed as
/// environment variables, under a per-task workspace directory. Accepts the
/// dispatch as soon as the process is spawned; the exit is awaited by a
/// detached reaper task and only logged, never fed back into the store —
/// completion is reported by the agent itself via the CLI, not by this
/// executor observing process exit.
pub struct ProcessExecutor {
    config: ProcessExecutorConfig,
}

impl ProcessExecutor {
    pub fn new(config: ProcessExecutorConfig) -> Self {
        Self { config }
    }

    async fn prepare_workspace(&self, task_id: &str) -> Result<PathBuf, ProcessExecutorError> {
        let workspace = self.config.workspace_root.join(task_id);
        tokio::fs::create_dir_all(&workspace).await.map_err(|source| ProcessExecutorError::Spawn {
            command: self.config.command.clone(),
            source,
        })?;
        Ok(workspace)
    }
}

#[async_trait::async_trait]
impl Executor for ProcessExecutor {
    async fn dispatch(&self, action: &DispatchAction) -> Result<RunResult, AdapterError> {
        let workspace = self.prepare_workspace(action.task_id.as_ref()).await?;

        let mut command = Command::new("sh");
        command
            .arg("-c")
            .arg(&self.config.command)
            .current_dir(&workspace)
            .env("AOF_TASK_ID", action.task_id.as_ref())
            .env("AOF_PROJECT", &action.project)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(agent) = &action.agent {
            command.env("AOF_AGENT", agent);
        }
        if let Some(workflow) = &action.workflow {
            command.env("AOF_WORKFLOW", workflow);
        }
        for (key, value) in &self.config.env {
            command.env(key, value);
        }

        let child = command.spawn().map_err(|source| ProcessExecutorError::Spawn {
            command: self.config.command.clone(),
            source,
        })?;

        let run_id = AgentRunId::new();
        let reaper_task_id = action.task_id.clone();
        let reaper_run_id = run_id.clone();
        tokio::spawn(async move {
            match child.wait_with_output().await {
                Ok(output) => {
                    tracing::info!(
                        task_id = %reaper_task_id,
                        run_id = %reaper_run_id,
                        exit_status = %output.status,
                        "dispatched process exited"
                    );
                }
                Err(error) => {
                    tracing::error!(
                        task_id = %reaper_task_id,
                        run_id = %reaper_run_id,
                        %error,
                        "failed to wait on dispatched process"
                    );
                }
            }
        });

        Ok(RunResult { accepted: true, agent_run_id: Some(run_id), message: None })
    }
}

#[cfg(test)]
#[path = "executor_tests.rs"]
mod tests;
