// SPDX-License-Identifier: MIT
// Copyright (c) 2026 aof contributors

//! Failure modes for [`crate::logger::EventLogger`].

use aof_core::{ErrorKind, HasErrorKind};

#[derive(Debug, thiserror::Error)]
pub enum EventLoggerError {
    #[error("io error at {path}: {source}")]
    Io { path: String, #[source] source: std::io::Error },

    #[error("event payload could not be serialized: {0}")]
    Encode(#[from] serde_json::Error),
}

impl HasErrorKind for EventLoggerError {
    fn error_kind(&self) -> ErrorKind {
        match self {
            EventLoggerError::Io { .. } => ErrorKind::FatalIo,
            EventLoggerError::Encode(_) => ErrorKind::Validation,
        }
    }
}
