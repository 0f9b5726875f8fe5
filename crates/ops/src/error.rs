// SPDX-License-Identifier: MIT
// Copyright (c) 2026 aof contributors

//! Failure modes for Murmur, drift detection, and context assembly.

use aof_core::{ErrorKind, HasErrorKind};

#[derive(Debug, thiserror::Error)]
pub enum OpsError {
    #[error("io error at {path}: {source}")]
    Io { path: String, #[source] source: std::io::Error },

    #[error("murmur state at {path} could not be parsed: {source}")]
    StateDecode { path: String, #[source] source: serde_json::Error },

    #[error("roster source {0:?} could not be read: {1}")]
    RosterSource(String, String),

    #[error("context resolver could not satisfy reference {0:?}")]
    UnresolvedReference(String),

    #[error("context reference {0:?} escapes its base directory")]
    PathEscape(String),
}

impl HasErrorKind for OpsError {
    fn error_kind(&self) -> ErrorKind {
        match self {
            OpsError::Io { .. } => ErrorKind::FatalIo,
            OpsError::StateDecode { .. } => ErrorKind::Validation,
            OpsError::RosterSource(..) => ErrorKind::AdapterError,
            OpsError::UnresolvedReference(_) | OpsError::PathEscape(_) => ErrorKind::Validation,
        }
    }
}
