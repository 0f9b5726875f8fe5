// SPDX-License-Identifier: MIT
// Copyright (c) 2026 aof contributors

//! Resolves the vault root the same way every `aof` subcommand needs it,
//! and opens the subsystems a command reaches into directly (there is no
//! command/mutation RPC to a running `aofd`; only its read-only health
//! socket is documented, so the CLI operates on the vault the same way the
//! daemon does).

use std::path::{Path, PathBuf};
use std::sync::Arc;

use aof_core::{SystemClock, Task, TaskId};
use aof_eventlog::EventLogger;
use aof_store::{TaskStore, VaultPaths};

use crate::error::CliError;

pub fn resolve_root(given: Option<PathBuf>) -> Result<PathBuf, CliError> {
    if let Some(root) = given {
        return Ok(root);
    }
    std::env::var("AOF_ROOT").map(PathBuf::from).map_err(|_| CliError::MissingRoot)
}

pub struct Vault {
    pub store: Arc<TaskStore<SystemClock>>,
    pub eventlog: Arc<EventLogger<SystemClock>>,
    pub paths: VaultPaths,
}

impl Vault {
    pub fn open(root: &Path) -> Result<Self, CliError> {
        let paths = VaultPaths::new(root);
        let store = Arc::new(TaskStore::open(root, SystemClock)?);
        let eventlog = Arc::new(EventLogger::open(root, SystemClock));
        Ok(Self { store, eventlog, paths })
    }

    /// Resolve a user-typed id or unambiguous prefix to a task.
    pub fn resolve_task(&self, id_or_prefix: &str) -> Result<Task, CliError> {
        Ok(self.store.get_by_prefix(id_or_prefix)?)
    }
}

pub fn current_actor() -> String {
    std::env::var("AOF_ACTOR")
        .or_else(|_| std::env::var("USER"))
        .unwrap_or_else(|_| "cli".to_string())
}

pub fn parse_priority(s: &str) -> Result<aof_core::Priority, CliError> {
    match s.to_ascii_lowercase().as_str() {
        "low" => Ok(aof_core::Priority::Low),
        "normal" => Ok(aof_core::Priority::Normal),
        "high" => Ok(aof_core::Priority::High),
        other => Err(CliError::Usage(format!("unknown priority {other:?}, expected low|normal|high"))),
    }
}

pub fn priority_label(p: aof_core::Priority) -> &'static str {
    match p {
        aof_core::Priority::Low => "low",
        aof_core::Priority::Normal => "normal",
        aof_core::Priority::High => "high",
    }
}

pub fn parse_status(s: &str) -> Result<aof_core::TaskStatus, CliError> {
    aof_core::TaskStatus::from_dir_name(s)
        .ok_or_else(|| CliError::Usage(format!("unknown status {s:?}, expected one of: {}", status_names())))
}

fn status_names() -> String {
    aof_core::TaskStatus::ALL.iter().map(|s| s.dir_name()).collect::<Vec<_>>().join(", ")
}

pub fn parse_task_id(s: &str) -> Result<TaskId, CliError> {
    TaskId::parse(s).map_err(|e| CliError::Usage(e.to_string()))
}

#[cfg(test)]
#[path = "root_tests.rs"]
mod tests;
