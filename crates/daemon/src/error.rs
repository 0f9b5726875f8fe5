// SPDX-License-Identifier: MIT
// Copyright (c) 2026 aof contributors

use aof_core::{ErrorKind, HasErrorKind};

#[derive(Debug, thiserror::Error)]
pub enum DaemonError {
    #[error("no vault root given: pass --root <path> or set AOF_ROOT")]
    MissingRoot,

    #[error("--root given with no path value")]
    MissingRootValue,

    #[error("another daemon instance already holds the lock at {0}")]
    AlreadyRunning(String),

    #[error("failed to bind health socket at {path}: {source}")]
    BindFailed { path: String, source: std::io::Error },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Store(#[from] aof_store::TaskStoreError),

    #[error(transparent)]
    Scheduler(#[from] aof_scheduler::SchedulerError),
}

impl HasErrorKind for DaemonError {
    fn error_kind(&self) -> ErrorKind {
        match self {
            DaemonError::MissingRoot | DaemonError::MissingRootValue => ErrorKind::Validation,
            DaemonError::AlreadyRunning(_) => ErrorKind::LeaseConflict,
            DaemonError::BindFailed { .. } => ErrorKind::FatalIo,
            DaemonError::Io(_) => ErrorKind::TransientIo,
            DaemonError::Store(e) => e.error_kind(),
            DaemonError::Scheduler(e) => e.error_kind(),
        }
    }
}
