// SPDX-License-Identifier: MIT
// Copyright (c) 2026 aof contributors

//! `aof notifications test` — fire a synthetic event through the vault's
//! rule set and print whether it matched, without needing a running `aofd`.
//! Rule loading mirrors the daemon's own composition root
//! (`aof-daemon::daemon`): missing rules file means an empty rule set, not
//! an error.

use std::path::Path;

use aof_core::{Event, EventKind, SystemClock, TaskId};
use aof_notify::channel::{NotificationChannel, StdoutChannel};
use aof_notify::policy::NotificationPolicy;
use aof_notify::rule;
use clap::{Args, Subcommand};

use crate::error::CliError;
use crate::error::ExitError;
use crate::root::current_actor;

/// 10 minutes, the same default the daemon composition root uses.
const DEFAULT_DEDUPE_WINDOW_MS: i64 = 10 * 60 * 1000;

#[derive(Args)]
pub struct NotificationsArgs {
    #[command(subcommand)]
    pub command: NotificationsCommand,
}

#[derive(Subcommand)]
pub enum NotificationsCommand {
    /// Build a synthetic event and run it through the current rule set
    Test {
        /// Event type to synthesize, e.g. `task.blocked`, `drift.detected`
        #[arg(long, default_value = "task.created")]
        event: String,
        /// Task id to attach to the synthetic event, if any
        #[arg(long)]
        task_id: Option<String>,
    },
}

pub async fn run(args: NotificationsArgs, root: &Path) -> Result<Option<String>, ExitError> {
    match args.command {
        NotificationsCommand::Test { event, task_id } => test(root, event, task_id).await,
    }
    .map_err(Into::into)
}

async fn test(root: &Path, event_type: String, task_id: Option<String>) -> Result<Option<String>, CliError> {
    let paths = aof_store::VaultPaths::new(root);
    let rules = match std::fs::read_to_string(paths.notification_rules_file()) {
        Ok(raw) => rule::parse_rules(&raw)?,
        Err(_) => Vec::new(),
    };
    if rules.is_empty() {
        return Err(CliError::Expected("no notification rules configured for this vault".to_string()));
    }

    let task_id = task_id.map(TaskId::from);
    let kind = synthetic_event(&event_type, task_id.clone());
    let event = Event::new(&kind, current_actor(), task_id);

    let policy = NotificationPolicy::new(rules, DEFAULT_DEDUPE_WINDOW_MS, SystemClock);
    match policy.evaluate(&event) {
        Some(message) => {
            StdoutChannel.send(&message).await?;
            Ok(Some(format!("matched: {} -> {}", event.event_type, message.channel)))
        }
        None => Err(CliError::Expected(format!("no rule matched event type {event_type:?}"))),
    }
}

/// Curated subset of `EventKind` with fields a test invocation can fill in
/// without extra flags; anything else synthesizes as `Custom` so any event
/// type can still be tried against the rule set.
fn synthetic_event(event_type: &str, task_id: Option<TaskId>) -> EventKind {
    match event_type {
        "task.created" => EventKind::TaskCreated { project: "demo".to_string(), title: "Synthetic task".to_string() },
        "task.transitioned" => {
            EventKind::TaskTransitioned { from: "ready".to_string(), to: "in-progress".to_string(), reason: None }
        }
        "task.blocked" => EventKind::TaskBlocked { reason: "synthetic test".to_string() },
        "task.unblocked" => EventKind::TaskUnblocked,
        "lease.expired" => {
            EventKind::LeaseExpired { lease_id: "lease-test".to_string(), agent_id: "agent-test".to_string() }
        }
        "gate.transitioned" => EventKind::GateTransitioned { gate: "qa".to_string(), outcome: "approved".to_string() },
        "murmur.triggered" => EventKind::MurmurTriggered {
            team: "platform".to_string(),
            trigger: "stale-review".to_string(),
            review_task_id: task_id.unwrap_or_else(|| TaskId::from("TASK-2026-01-01-001")),
        },
        "drift.detected" => EventKind::DriftDetected { missing: 1, extra: 0, mismatch: 0 },
        other => EventKind::Custom { event_type: other.to_string(), payload: serde_json::Value::Object(Default::default()) },
    }
}

#[cfg(test)]
#[path = "notifications_tests.rs"]
mod tests;
