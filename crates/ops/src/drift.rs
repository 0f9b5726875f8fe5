// SPDX-License-Identifier: MIT
// Copyright (c) 2026 aof contributors

//! Declared-vs-live roster comparison (spec.md §4.10).
//!
//! The `fixture`/`live` source split is grounded in the teacher's
//! `RuntimeRouter` (`oj-daemon::adapters::agent::router`): one trait with two
//! implementations selected by configuration, not a hardcoded branch.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::process::Command;

use crate::error::OpsError;

const LIVE_COMMAND_TIMEOUT: Duration = Duration::from_secs(10);

/// One roster entry, declared or observed live.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterAgent {
    pub id: String,
    pub name: String,
}

/// Supplies the live roster. Implementors are the two sources spec.md §4.10
/// names; selected at the CLI boundary by `--source=fixture|live`.
#[async_trait]
pub trait RosterSource: Send + Sync {
    async fn fetch(&self) -> Result<Vec<RosterAgent>, OpsError>;
}

/// Reads the live roster from a JSON file: `[{"id": ..., "name": ...}, ...]`.
pub struct FixtureRosterSource {
    path: PathBuf,
}

impl FixtureRosterSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl RosterSource for FixtureRosterSource {
    async fn fetch(&self) -> Result<Vec<RosterAgent>, OpsError> {
        let raw = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| OpsError::RosterSource(self.path.display().to_string(), e.to_string()))?;
        serde_json::from_str(&raw)
            .map_err(|e| OpsError::RosterSource(self.path.display().to_string(), e.to_string()))
    }
}

/// Runs an external command and parses its stdout as the same JSON shape
/// `FixtureRosterSource` reads from disk.
pub struct LiveRosterSource {
    program: String,
    args: Vec<String>,
}

impl LiveRosterSource {
    pub fn new(program: impl Into<String>, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self { program: program.into(), args: args.into_iter().map(Into::into).collect() }
    }
}

#[async_trait]
impl RosterSource for LiveRosterSource {
    async fn fetch(&self) -> Result<Vec<RosterAgent>, OpsError> {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        let output = tokio::time::timeout(LIVE_COMMAND_TIMEOUT, cmd.output())
            .await
            .map_err(|_| OpsError::RosterSource(self.program.clone(), "timed out".to_string()))?
            .map_err(|e| OpsError::RosterSource(self.program.clone(), e.to_string()))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(OpsError::RosterSource(self.program.clone(), stderr.trim().to_string()));
        }
        let stdout = String::from_utf8_lossy(&output.stdout);
        serde_json::from_str(&stdout).map_err(|e| OpsError::RosterSource(self.program.clone(), e.to_string()))
    }
}

/// One id present in both rosters under different names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mismatch {
    pub id: String,
    pub declared_name: String,
    pub live_name: String,
}

/// Declared-vs-live partition (spec.md §4.10).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriftReport {
    pub missing: Vec<String>,
    pub extra: Vec<String>,
    pub mismatch: Vec<Mismatch>,
}

impl DriftReport {
    pub fn is_clean(&self) -> bool {
        self.missing.is_empty() && self.extra.is_empty() && self.mismatch.is_empty()
    }

    /// 0 on clean, 1 on any drift, per spec.md §6's CLI exit code contract.
    pub fn exit_code(&self) -> i32 {
        if self.is_clean() { 0 } else { 1 }
    }
}

/// Compare `declared` against `live`, producing the missing/extra/mismatch
/// partition. Pure; does not fetch anything itself (see [`detect`]).
pub fn compare(declared: &[RosterAgent], live: &[RosterAgent]) -> DriftReport {
    let mut missing = Vec::new();
    let mut mismatch = Vec::new();
    for d in declared {
        match live.iter().find(|l| l.id == d.id) {
            None => missing.push(d.id.clone()),
            Some(l) if l.name != d.name => {
                mismatch.push(Mismatch { id: d.id.clone(), declared_name: d.name.clone(), live_name: l.name.clone() })
            }
            Some(_) => {}
        }
    }
    let extra = live.iter().filter(|l| !declared.iter().any(|d| d.id == l.id)).map(|l| l.id.clone()).collect();
    DriftReport { missing, extra, mismatch }
}

/// Fetch the live roster through `source` and compare it against `declared`.
/// A failed fetch is a hard error per spec.md §4.10 ("invalid/missing source
/// is a hard error"), not an empty-roster drift report.
pub async fn detect(declared: &[RosterAgent], source: &dyn RosterSource) -> Result<DriftReport, OpsError> {
    let live = source.fetch().await?;
    Ok(compare(declared, &live))
}

#[cfg(test)]
#[path = "drift_tests.rs"]
mod tests;
