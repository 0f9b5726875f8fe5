// SPDX-License-Identifier: MIT
// Copyright (c) 2026 aof contributors

use aof_core::{ErrorKind, HasErrorKind};

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("io error at {path}: {source}")]
    Io { path: String, #[source] source: std::io::Error },

    #[error("notification rules file did not parse: {0}")]
    RuleParse(#[from] serde_yaml::Error),

    #[error("notification rules file yielded zero valid rules")]
    EmptyRuleSet,

    #[error("unsupported notification-rules schema version {0}")]
    UnsupportedVersion(u32),

    #[error("channel send failed: {0}")]
    ChannelFailed(String),
}

impl HasErrorKind for NotifyError {
    fn error_kind(&self) -> ErrorKind {
        match self {
            NotifyError::Io { .. } => ErrorKind::FatalIo,
            NotifyError::RuleParse(_) | NotifyError::EmptyRuleSet | NotifyError::UnsupportedVersion(_) => {
                ErrorKind::Validation
            }
            NotifyError::ChannelFailed(_) => ErrorKind::AdapterError,
        }
    }
}
