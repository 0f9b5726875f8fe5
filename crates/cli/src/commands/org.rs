// SPDX-License-Identifier: MIT
// Copyright (c) 2026 aof contributors

//! `aof org drift` — compare a declared agent roster against a live one
//! (spec.md §4.10). The `fixture`/`live` split mirrors the teacher's
//! adapter-router pattern: one trait, picked by `--source` instead of a
//! hardcoded branch.

use std::path::Path;

use aof_core::EventKind;
use aof_eventlog::EventLogger;
use aof_ops::drift::{self, FixtureRosterSource, LiveRosterSource, RosterAgent, RosterSource};
use clap::{Args, Subcommand, ValueEnum};

use crate::error::{CliError, ExitError};
use crate::output::{format_or_json, OutputFormat};
use crate::root::current_actor;

#[derive(Args)]
pub struct OrgArgs {
    #[command(subcommand)]
    pub command: OrgCommand,
}

#[derive(Subcommand)]
pub enum OrgCommand {
    /// Compare a declared roster file against a live one
    Drift {
        /// JSON file of the declared roster: `[{"id":...,"name":...}, ...]`
        chart: String,
        #[arg(long, value_enum, default_value = "fixture")]
        source: RosterSourceKind,
        /// Live roster JSON file, required when `--source=fixture`
        #[arg(long)]
        fixture: Option<String>,
        /// External command whose stdout is the live roster JSON, required when `--source=live`
        #[arg(long = "live-cmd")]
        live_cmd: Option<String>,
        /// Repeatable argument passed to `--live-cmd`
        #[arg(long = "live-arg")]
        live_arg: Vec<String>,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum RosterSourceKind {
    Fixture,
    Live,
}

pub async fn run(args: OrgArgs, root: &Path, format: OutputFormat) -> Result<Option<String>, ExitError> {
    match args.command {
        OrgCommand::Drift { chart, source, fixture, live_cmd, live_arg } => {
            drift_cmd(root, chart, source, fixture, live_cmd, live_arg, format).await
        }
    }
    .map_err(Into::into)
}

async fn drift_cmd(
    root: &Path,
    chart: String,
    source: RosterSourceKind,
    fixture: Option<String>,
    live_cmd: Option<String>,
    live_arg: Vec<String>,
    format: OutputFormat,
) -> Result<Option<String>, CliError> {
    let declared = load_roster(&chart)?;
    let source: Box<dyn RosterSource> = match source {
        RosterSourceKind::Fixture => {
            let path = fixture.ok_or_else(|| CliError::Usage("--source=fixture requires --fixture <path>".to_string()))?;
            Box::new(FixtureRosterSource::new(path))
        }
        RosterSourceKind::Live => {
            let cmd = live_cmd.ok_or_else(|| CliError::Usage("--source=live requires --live-cmd <program>".to_string()))?;
            Box::new(LiveRosterSource::new(cmd, live_arg))
        }
    };

    let report = drift::detect(&declared, source.as_ref()).await?;

    let eventlog = EventLogger::open(root, aof_core::SystemClock);
    eventlog.append(
        EventKind::DriftDetected { missing: report.missing.len(), extra: report.extra.len(), mismatch: report.mismatch.len() },
        current_actor(),
        None,
    )?;

    format_or_json(format, &report, || {
        if report.is_clean() {
            println!("roster clean: {} agents", declared.len());
        } else {
            for id in &report.missing {
                println!("Missing: {id}");
            }
            for id in &report.extra {
                println!("Extra:   {id}");
            }
            for m in &report.mismatch {
                println!("Mismatch: {} declared={:?} live={:?}", m.id, m.declared_name, m.live_name);
            }
        }
    })
    .map_err(|e| CliError::Expected(e.to_string()))?;

    if report.is_clean() {
        Ok(None)
    } else {
        Err(CliError::Expected(format!("drift detected ({} missing, {} extra, {} mismatch)", report.missing.len(), report.extra.len(), report.mismatch.len())))
    }
}

fn load_roster(path: &str) -> Result<Vec<RosterAgent>, CliError> {
    let raw = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}

#[cfg(test)]
#[path = "org_tests.rs"]
mod tests;
