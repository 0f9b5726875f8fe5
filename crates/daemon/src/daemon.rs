// SPDX-License-Identifier: MIT
// Copyright (c) 2026 aof contributors

//! Composition root: wires every subsystem crate together into one running
//! process and drives the poll loop. Grounded in the teacher's
//! `lifecycle::startup`/`DaemonState` split — a `build()` that does all
//! fallible setup (lock file, directories, loading state) before anything
//! starts running, followed by a `run()` that only owns the event loop.

use std::collections::HashSet;
use std::fs::OpenOptions;
use std::io::Write as _;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use aof_adapters::{ProcessExecutor, ProcessExecutorConfig};
use aof_core::{SystemClock, TaskFilter};
use aof_eventlog::warm::{RecentCompletionsRule, StatusSummaryRule, WarmAggregator};
use aof_eventlog::EventLogger;
use aof_notify::{rule, NotificationChannel, NotificationPolicy, StdoutChannel};
use aof_ops::{MurmurController, MurmurTrigger};
use aof_scheduler::{Scheduler, SchedulerConfig};
use aof_store::TaskStore;
use fs2::FileExt as _;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::env;
use crate::error::DaemonError;
use crate::health::HealthTracker;
use crate::server::HealthServer;

/// Default trigger set evaluated for every project seen among open tasks.
/// Spec.md defines the trigger kinds but leaves per-team configuration to a
/// future roster source; until one exists every project gets the same
/// conservative defaults (queue drained, or a day since the last review).
fn default_murmur_triggers() -> Vec<MurmurTrigger> {
    vec![MurmurTrigger::QueueEmpty, MurmurTrigger::Interval { interval_ms: 24 * 60 * 60 * 1000 }]
}

pub struct Daemon {
    root: PathBuf,
    store: Arc<TaskStore<SystemClock>>,
    eventlog: Arc<EventLogger<SystemClock>>,
    scheduler: Scheduler<SystemClock>,
    murmur: Arc<MurmurController<SystemClock>>,
    warm: Arc<WarmAggregator>,
    tracker: Arc<HealthTracker>,
    poll_interval: Duration,
    _lock_file: std::fs::File,
}

impl Daemon {
    /// Acquires the single-instance lock, opens every subsystem against
    /// `root`, and wires the event subscriber. Fails fast before anything
    /// is left running if any step here fails.
    pub fn build(root: PathBuf) -> Result<(Self, HealthServer<SystemClock>), DaemonError> {
        std::fs::create_dir_all(&root)?;
        let paths = aof_store::VaultPaths::new(&root);
        std::fs::create_dir_all(paths.logs_dir())?;

        let lock_file = OpenOptions::new().write(true).create(true).truncate(false).open(paths.pid_path())?;
        lock_file
            .try_lock_exclusive()
            .map_err(|_| DaemonError::AlreadyRunning(paths.pid_path().display().to_string()))?;
        let mut lock_file = lock_file;
        lock_file.set_len(0)?;
        writeln!(lock_file, "{}", std::process::id())?;

        let clock = SystemClock;
        let store = Arc::new(TaskStore::open(&root, clock.clone())?);
        let eventlog = Arc::new(EventLogger::open(&root, clock.clone()));

        let rules = match std::fs::read_to_string(paths.notification_rules_file()) {
            Ok(raw) => rule::parse_rules(&raw).unwrap_or_else(|e| {
                warn!(error = %e, "notification rules file invalid at startup; starting with no rules");
                Vec::new()
            }),
            Err(_) => Vec::new(),
        };
        let notify_policy = Arc::new(NotificationPolicy::new(rules, 10 * 60 * 1000, clock.clone()));
        let channel: Arc<dyn NotificationChannel> = Arc::new(StdoutChannel);

        let murmur = Arc::new(MurmurController::new(Arc::clone(&store), clock.clone()));

        let warm = Arc::new(WarmAggregator::new(
            &root,
            vec![Box::new(RecentCompletionsRule::new(50)), Box::new(StatusSummaryRule::new())],
        ));

        let tracker = HealthTracker::new(root.display().to_string(), env::poll_interval().as_millis() as u64, 1);

        {
            let notify_policy = Arc::clone(&notify_policy);
            let channel = Arc::clone(&channel);
            let murmur = Arc::clone(&murmur);
            let store_for_events = Arc::clone(&store);
            let tracker = Arc::clone(&tracker);
            eventlog.on_event(move |event| {
                tracker.record_event(event.timestamp);
                if let Some(message) = notify_policy.evaluate(event) {
                    let channel = Arc::clone(&channel);
                    tokio::spawn(async move {
                        if let Err(e) = channel.send(&message).await {
                            warn!(error = %e, "notification delivery failed");
                        }
                    });
                }
                // Murmur's per-team counters are keyed by project, the
                // closest stand-in the data model has for "team" (there is
                // no separate team entity); the project is read back from
                // the transitioned task itself since the event payload only
                // carries `from`/`to`/`reason`.
                if event.event_type == "task.transitioned" {
                    let to = event.payload.get("to").and_then(|v| v.as_str()).map(str::to_string);
                    if let (Some(to), Some(task_id)) = (to, event.task_id.clone()) {
                        if let Some(project) = store_for_events.get(&task_id).map(|t| t.project) {
                            let murmur = Arc::clone(&murmur);
                            match to.as_str() {
                                "done" => {
                                    tokio::spawn(async move {
                                        let _ = murmur.record_completion(&project).await;
                                    });
                                }
                                "deadletter" => {
                                    tokio::spawn(async move {
                                        let _ = murmur.record_failure(&project).await;
                                    });
                                }
                                _ => {}
                            }
                        }
                    }
                }
            });
        }

        let executor = Arc::new(ProcessExecutor::new(ProcessExecutorConfig {
            command: std::env::var("AOF_DISPATCH_COMMAND").unwrap_or_else(|_| "true".to_string()),
            workspace_root: root.join("task-data"),
            env: Default::default(),
        }));
        let scheduler = Scheduler::new(
            Arc::clone(&store),
            Arc::clone(&eventlog),
            executor,
            clock.clone(),
            SchedulerConfig::default(),
        );

        let server = HealthServer::bind(paths.socket_path(), Arc::clone(&store), Arc::clone(&tracker), clock.clone())?;

        let daemon = Self {
            root,
            store,
            eventlog,
            scheduler,
            murmur,
            warm,
            tracker,
            poll_interval: env::poll_interval(),
            _lock_file: lock_file,
        };
        Ok((daemon, server))
    }

    pub fn tracker(&self) -> Arc<HealthTracker> {
        Arc::clone(&self.tracker)
    }

    /// Drives the poll loop until `shutdown` is cancelled. Each tick:
    /// schedules ready/in-progress work, then evaluates Murmur triggers for
    /// every project currently represented among open tasks.
    pub async fn run(self, shutdown: CancellationToken) {
        let mut ticker = tokio::time::interval(self.poll_interval);
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => {
                    let result = self.scheduler.poll().await;
                    self.tracker.record_poll(result.scanned_at, true);
                    info!(dispatched = result.stats.dispatched, ready = result.stats.ready_candidates, "poll complete");
                    self.tick_murmur().await;
                    self.tick_warm().await;
                }
            }
        }
        self.tracker.set_shutting_down(true);
        info!("daemon shutting down");
    }

    async fn tick_murmur(&self) {
        let tasks = self.store.list(&TaskFilter::default());
        let projects: HashSet<String> = tasks.into_iter().map(|t| t.project).collect();
        let triggers = default_murmur_triggers();
        for project in projects {
            match self.murmur.tick(&project, &triggers).await {
                Ok(Some(fire)) => {
                    info!(project = %project, trigger = ?fire.trigger, "murmur trigger fired");
                }
                Ok(None) => {}
                Err(e) => warn!(project = %project, error = %e, "murmur tick failed"),
            }
        }
    }

    /// Consumes new cold events into the warm tier. Grounded in spec.md §3's
    /// control-flow description ("asynchronously, WarmAggregator consumes
    /// new events and refreshes warm documents") — run once per poll tick,
    /// alongside Murmur, rather than off the event subscriber directly, so a
    /// burst of events in one tick is aggregated once instead of per-event.
    async fn tick_warm(&self) {
        for (rule_id, outcome) in self.warm.run() {
            match outcome {
                Ok(aof_eventlog::warm::RunOutcome::Updated) => {
                    info!(rule = %rule_id, "warm document updated");
                    let path = format!("warm/{}.md", rule_id);
                    if let Err(e) = self.eventlog.append(
                        aof_core::EventKind::WarmDocUpdated { rule_id: rule_id.clone(), path },
                        "aofd",
                        None,
                    ) {
                        warn!(rule = %rule_id, error = %e, "failed to log warm document update");
                    }
                }
                Ok(aof_eventlog::warm::RunOutcome::Unchanged) => {}
                Ok(aof_eventlog::warm::RunOutcome::Rejected) => {
                    warn!(rule = %rule_id, "warm document rejected: exceeds byte budget")
                }
                Err(e) => warn!(rule = %rule_id, error = %e, "warm aggregation failed"),
            }
        }
    }

    pub fn root(&self) -> &std::path::Path {
        &self.root
    }
}

#[cfg(test)]
#[path = "daemon_tests.rs"]
mod tests;
