// SPDX-License-Identifier: MIT
// Copyright (c) 2026 aof contributors

//! Failure modes for `TaskStore` operations.

use aof_core::{ErrorKind, HasErrorKind, TaskId, TaskStatus};

use crate::frontmatter::FrontmatterError;

#[derive(Debug, thiserror::Error)]
pub enum TaskStoreError {
    #[error("no task matches {0:?}")]
    NotFound(String),

    #[error("prefix {prefix:?} matches {count} tasks, expected exactly one")]
    AmbiguousPrefix { prefix: String, count: usize },

    #[error("transition {from} -> {to} is not permitted for {id}")]
    IllegalTransition { id: TaskId, from: TaskStatus, to: TaskStatus },

    #[error("task {id} is in a terminal state and cannot be mutated")]
    TerminalImmutable { id: TaskId },

    #[error("task {id} already has a non-expired lease held by a different agent")]
    LeaseConflict { id: TaskId },

    #[error("no lease {lease_id} held on task {id}")]
    NoSuchLease { id: TaskId, lease_id: String },

    #[error("adding {blocker} as a dependency of {id} would close a cycle")]
    CycleDetected { id: TaskId, blocker: TaskId },

    #[error("task file is malformed: {0}")]
    Parse(#[from] FrontmatterError),

    #[error("task {id} already exists")]
    AlreadyExists { id: TaskId },

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("io error at {path}: {source}")]
    Io { path: String, #[source] source: std::io::Error },
}

impl HasErrorKind for TaskStoreError {
    fn error_kind(&self) -> ErrorKind {
        match self {
            TaskStoreError::NotFound(_) => ErrorKind::NotFound,
            TaskStoreError::AmbiguousPrefix { .. } => ErrorKind::NotFound,
            TaskStoreError::IllegalTransition { .. } => ErrorKind::IllegalTransition,
            TaskStoreError::TerminalImmutable { .. } => ErrorKind::IllegalTransition,
            TaskStoreError::LeaseConflict { .. } => ErrorKind::LeaseConflict,
            TaskStoreError::NoSuchLease { .. } => ErrorKind::NotFound,
            TaskStoreError::CycleDetected { .. } => ErrorKind::CycleDetected,
            TaskStoreError::Parse(_) => ErrorKind::Validation,
            TaskStoreError::AlreadyExists { .. } => ErrorKind::Validation,
            TaskStoreError::Validation(_) => ErrorKind::Validation,
            TaskStoreError::Io { .. } => ErrorKind::FatalIo,
        }
    }
}
