// SPDX-License-Identifier: MIT
// Copyright (c) 2026 aof contributors

use aof_core::{ErrorKind, HasErrorKind, TaskId};
use aof_store::TaskStoreError;

/// Failure returned across the `Executor` trait boundary (spec §7,
/// `AdapterError`): the scheduler isolates these per-task and never lets
/// one failing dispatch abort the rest of the poll.
#[derive(Debug, thiserror::Error, Clone)]
pub enum AdapterError {
    #[error("executor rejected dispatch for {task_id}: {message}")]
    Rejected { task_id: TaskId, message: String },

    #[error("executor reports external capacity exhausted: {message}")]
    PlatformLimit { message: String },

    #[error("executor adapter failed: {0}")]
    Other(String),
}

impl HasErrorKind for AdapterError {
    fn error_kind(&self) -> ErrorKind {
        match self {
            AdapterError::Rejected { .. } => ErrorKind::AdapterError,
            AdapterError::PlatformLimit { .. } => ErrorKind::PlatformLimit,
            AdapterError::Other(_) => ErrorKind::AdapterError,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SchedulerError {
    #[error(transparent)]
    Store(#[from] TaskStoreError),
    #[error(transparent)]
    Gate(#[from] aof_workflow::GateError),
}

impl HasErrorKind for SchedulerError {
    fn error_kind(&self) -> ErrorKind {
        match self {
            SchedulerError::Store(e) => e.error_kind(),
            SchedulerError::Gate(e) => e.error_kind(),
        }
    }
}
