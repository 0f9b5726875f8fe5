// SPDX-License-Identifier: MIT
// Copyright (c) 2026 aof contributors

use aof_core::{ErrorKind, HasErrorKind};
use aof_scheduler::AdapterError;

/// Failures local to this crate's executors, before they're mapped onto
/// [`AdapterError`] at the `Executor` trait boundary.
#[derive(Debug, thiserror::Error)]
pub enum ProcessExecutorError {
    #[error("failed to spawn {command}: {source}")]
    Spawn { command: String, source: std::io::Error },

    #[error("workspace directory does not exist: {0}")]
    MissingWorkspace(String),
}

impl HasErrorKind for ProcessExecutorError {
    fn error_kind(&self) -> ErrorKind {
        ErrorKind::AdapterError
    }
}

impl From<ProcessExecutorError> for AdapterError {
    fn from(e: ProcessExecutorError) -> Self {
        AdapterError::Other(e.to_string())
    }
}
