// SPDX-License-Identifier: MIT
// Copyright (c) 2026 aof contributors

//! Every command boundary converges on [`ExitError`] so `main` has one
//! place that decides what gets printed and which exit code the process
//! returns, instead of scattering `std::process::exit` through the command
//! modules.

use aof_core::HasErrorKind;

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("no vault root given: pass --root <path> or set AOF_ROOT")]
    MissingRoot,

    #[error(transparent)]
    Store(#[from] aof_store::TaskStoreError),

    #[error(transparent)]
    Gate(#[from] aof_workflow::GateError),

    #[error(transparent)]
    Notify(#[from] aof_notify::NotifyError),

    #[error(transparent)]
    Ops(#[from] aof_ops::OpsError),

    #[error(transparent)]
    EventLog(#[from] aof_eventlog::EventLoggerError),

    #[error("project manifest for {project:?} could not be read: {source}")]
    ManifestIo { project: String, #[source] source: std::io::Error },

    #[error("project manifest for {project:?} is malformed: {source}")]
    ManifestParse { project: String, #[source] source: serde_yaml::Error },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Usage(String),

    #[error("{0}")]
    Expected(String),
}

impl CliError {
    fn exit_code(&self) -> i32 {
        match self {
            CliError::MissingRoot => 2,
            CliError::Usage(_) => 2,
            CliError::Expected(_) => 1,
            CliError::Store(e) => e.error_kind().cli_exit_code(),
            CliError::Gate(e) => e.error_kind().cli_exit_code(),
            CliError::Notify(e) => e.error_kind().cli_exit_code(),
            CliError::Ops(e) => e.error_kind().cli_exit_code(),
            CliError::EventLog(e) => e.error_kind().cli_exit_code(),
            CliError::ManifestIo { .. } | CliError::ManifestParse { .. } | CliError::Io(_) | CliError::Json(_) => 1,
        }
    }
}

/// Carries the process exit code alongside the message `main` prints.
#[derive(Debug)]
pub struct ExitError {
    pub code: i32,
    pub message: String,
}

impl ExitError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self { code, message: message.into() }
    }
}

impl From<CliError> for ExitError {
    fn from(e: CliError) -> Self {
        Self::new(e.exit_code(), e.to_string())
    }
}

impl std::fmt::Display for ExitError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}
