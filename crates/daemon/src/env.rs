// SPDX-License-Identifier: MIT
// Copyright (c) 2026 aof contributors

//! Centralized environment/argument resolution for the daemon binary,
//! grounded in the teacher's `oj-daemon::env` constant-module style
//! (`ipc_timeout`, `PROTOCOL_VERSION`) — one function per externally
//! configurable knob instead of a scattered `std::env::var` per call site.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::DaemonError;

pub const DEFAULT_POLL_INTERVAL_MS: u64 = 120_000;
pub const DEFAULT_TIMER_CHECK_MS: u64 = 1_000;
pub const HEALTH_STALE_AFTER_SECS: i64 = 5 * 60;

/// Resolve the vault root from `--root <path>` (checked first so an explicit
/// flag always wins) or `AOF_ROOT` (spec.md §6, "Host supervision").
pub fn resolve_root(args: &[String]) -> Result<PathBuf, DaemonError> {
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if arg == "--root" {
            return iter.next().map(PathBuf::from).ok_or(DaemonError::MissingRootValue);
        }
        if let Some(value) = arg.strip_prefix("--root=") {
            return Ok(PathBuf::from(value));
        }
    }
    std::env::var("AOF_ROOT").map(PathBuf::from).map_err(|_| DaemonError::MissingRoot)
}

pub fn poll_interval() -> Duration {
    std::env::var("AOF_POLL_INTERVAL_MS")
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .map(Duration::from_millis)
        .unwrap_or(Duration::from_millis(DEFAULT_POLL_INTERVAL_MS))
}

pub fn timer_check_interval() -> Duration {
    std::env::var("AOF_TIMER_CHECK_MS")
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .map(Duration::from_millis)
        .unwrap_or(Duration::from_millis(DEFAULT_TIMER_CHECK_MS))
}

/// Path convention that `launchd`/`systemd` service-file generators would
/// target for the supervised process's stdout (spec.md §6). Service-file
/// *generation* stays out of scope; only the path the generators would
/// target is implemented here, as a supplement to the ambient logging stack.
pub fn stdout_log_path(root: &std::path::Path) -> PathBuf {
    root.join("logs").join("daemon-stdout.log")
}

pub fn stderr_log_path(root: &std::path::Path) -> PathBuf {
    root.join("logs").join("daemon-stderr.log")
}

/// The daemon's own rotating diagnostic log, separate from the host
/// supervision convention above.
pub fn daemon_log_path(root: &std::path::Path) -> PathBuf {
    root.join("logs").join("daemon.log")
}
