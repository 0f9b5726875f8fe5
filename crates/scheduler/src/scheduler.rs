// SPDX-License-Identifier: MIT
// Copyright (c) 2026 aof contributors

//! `Scheduler`: one poll cycle over `ready`/`in-progress` tasks (spec §4.4).

use std::sync::Arc;
use std::time::Instant;

use aof_core::{Clock, EventKind, Priority, Task, TaskStatus};
use aof_eventlog::EventLogger;
use aof_store::{TaskFilter, TaskLockManager, TaskStore};

use crate::error::AdapterError;
use crate::executor::{DispatchAction, Executor};
use crate::poll::{PollAction, PollResult, PollStats};

#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    pub default_lease_ttl_ms: i64,
    pub max_lease_renewals: u32,
    pub dry_run: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self { default_lease_ttl_ms: 15 * 60 * 1000, max_lease_renewals: 2, dry_run: false }
    }
}

pub struct Scheduler<C: Clock> {
    store: Arc<TaskStore<C>>,
    eventlog: Arc<EventLogger<C>>,
    executor: Arc<dyn Executor>,
    clock: C,
    config: SchedulerConfig,
    locks: TaskLockManager,
}

impl<C: Clock> Scheduler<C> {
    pub fn new(
        store: Arc<TaskStore<C>>,
        eventlog: Arc<EventLogger<C>>,
        executor: Arc<dyn Executor>,
        clock: C,
        config: SchedulerConfig,
    ) -> Self {
        Self { store, eventlog, executor, clock, config, locks: TaskLockManager::new() }
    }

    pub async fn poll(&self) -> PollResult {
        let started = Instant::now();
        let scanned_at = self.clock.utc_now();
        let counts = self.store.count_by_status();
        let ready_count = counts.get(&TaskStatus::Ready).copied().unwrap_or(0);
        let in_progress_count = counts.get(&TaskStatus::InProgress).copied().unwrap_or(0);

        if ready_count == 0 && in_progress_count == 0 && !self.config.dry_run {
            return PollResult {
                scanned_at,
                duration_ms: elapsed_ms(started),
                actions: Vec::new(),
                stats: PollStats::default(),
            };
        }

        let mut ready = self.store.list(&TaskFilter { status: Some(TaskStatus::Ready), ..Default::default() });
        let mut in_progress =
            self.store.list(&TaskFilter { status: Some(TaskStatus::InProgress), ..Default::default() });
        sort_candidates(&mut ready);
        sort_candidates(&mut in_progress);

        let mut actions = Vec::new();
        let mut dispatched = 0usize;
        let mut platform_limited = false;

        for task in &ready {
            if platform_limited {
                break;
            }
            let id = task.id.clone();
            // Allow expect here as the closure's Result is Infallible; this can never be Err
            #[allow(clippy::expect_used)]
            let action = self
                .locks
                .with_lock(&id, || async { Ok::<_, std::convert::Infallible>(self.try_dispatch(task).await) })
                .await
                .expect("try_dispatch never errors");
            if matches!(action, PollAction::Dispatched { .. }) {
                dispatched += 1;
            }
            if matches!(action, PollAction::PlatformLimited { .. }) {
                platform_limited = true;
            }
            actions.push(action);
        }

        for task in &in_progress {
            let id = task.id.clone();
            // Allow expect here as the closure's Result is Infallible; this can never be Err
            #[allow(clippy::expect_used)]
            let lease_action = self
                .locks
                .with_lock(&id, || async { Ok::<_, std::convert::Infallible>(self.check_lease(task).await) })
                .await
                .expect("check_lease never errors");
            if let Some(action) = lease_action {
                actions.push(action);
            }
        }

        PollResult {
            scanned_at,
            duration_ms: elapsed_ms(started),
            actions,
            stats: PollStats { ready_candidates: ready.len(), in_progress_candidates: in_progress.len(), dispatched },
        }
    }

    async fn try_dispatch(&self, task: &Task) -> PollAction {
        if !self.dependencies_resolved(task) {
            return PollAction::SkippedUnresolvedDeps { task_id: task.id.clone() };
        }
        if self.config.dry_run {
            return PollAction::WouldDispatch { task_id: task.id.clone() };
        }

        let action = DispatchAction {
            task_id: task.id.clone(),
            project: task.project.clone(),
            agent: task.routing.agent.clone(),
            workflow: task.routing.workflow.clone(),
        };
        match self.executor.dispatch(&action).await {
            Ok(result) if result.accepted => {
                let from = task.status;
                match self.store.transition(&task.id, TaskStatus::InProgress, None).await {
                    Ok(_) => {
                        self.eventlog.append(
                            EventKind::TaskTransitioned { from: from.to_string(), to: TaskStatus::InProgress.to_string(), reason: None },
                            "scheduler",
                            Some(task.id.clone()),
                        ).ok();
                    }
                    Err(e) => return PollAction::AdapterError { task_id: task.id.clone(), message: e.to_string() },
                }
                let agent_id = task.routing.agent.clone().unwrap_or_else(|| "unassigned".to_string());
                let ttl = chrono::Duration::milliseconds(self.config.default_lease_ttl_ms);
                match self.store.lease_acquire(&task.id, &agent_id, ttl).await {
                    Ok(lease) => {
                        self.eventlog.append(
                            EventKind::LeaseAcquired {
                                lease_id: lease.lease_id.to_string(),
                                agent_id: agent_id.clone(),
                                expires_at: lease.expires_at,
                            },
                            "scheduler",
                            Some(task.id.clone()),
                        ).ok();
                        PollAction::Dispatched { task_id: task.id.clone(), agent_run_id: result.agent_run_id }
                    }
                    Err(e) => PollAction::AdapterError { task_id: task.id.clone(), message: e.to_string() },
                }
            }
            Ok(result) => PollAction::AdapterError {
                task_id: task.id.clone(),
                message: result.message.unwrap_or_else(|| "executor declined dispatch".to_string()),
            },
            Err(AdapterError::PlatformLimit { message }) => PollAction::PlatformLimited { task_id: task.id.clone(), message },
            Err(e) => PollAction::AdapterError { task_id: task.id.clone(), message: e.to_string() },
        }
    }

    async fn check_lease(&self, task: &Task) -> Option<PollAction> {
        let lease = task.lease.as_ref()?;
        let now = self.clock.utc_now();
        if !lease.is_expired(now) {
            return None;
        }
        if self.config.dry_run {
            return Some(PollAction::LeaseExpired { task_id: task.id.clone(), deadlettered: false });
        }

        let lease_id = lease.lease_id.clone();
        if lease.renewal_count < self.config.max_lease_renewals {
            let ttl = chrono::Duration::milliseconds(self.config.default_lease_ttl_ms);
            return match self.store.lease_renew(&task.id, &lease_id, ttl).await {
                Ok(renewed) => {
                    self.eventlog.append(
                        EventKind::LeaseRenewed { lease_id: renewed.lease_id.to_string(), renewal_count: renewed.renewal_count },
                        "scheduler",
                        Some(task.id.clone()),
                    ).ok();
                    Some(PollAction::LeaseRenewed { task_id: task.id.clone() })
                }
                Err(e) => Some(PollAction::AdapterError { task_id: task.id.clone(), message: e.to_string() }),
            };
        }

        match self.store.lease_give_up(&task.id).await {
            Ok(updated) => {
                self.eventlog.append(
                    EventKind::LeaseExpired { lease_id: lease_id.to_string(), agent_id: task.lease.as_ref().map(|l| l.agent_id.clone()).unwrap_or_default() },
                    "scheduler",
                    Some(task.id.clone()),
                ).ok();
                Some(PollAction::LeaseExpired { task_id: task.id.clone(), deadlettered: updated.status == TaskStatus::Deadletter })
            }
            Err(e) => Some(PollAction::AdapterError { task_id: task.id.clone(), message: e.to_string() }),
        }
    }

    fn dependencies_resolved(&self, task: &Task) -> bool {
        task.depends_on.iter().all(|dep| self.store.get(dep).map(|t| t.status == TaskStatus::Done).unwrap_or(false))
    }
}

/// Priority `high > normal > low`, then oldest `updatedAt` first.
fn sort_candidates(tasks: &mut [Task]) {
    tasks.sort_by(|a, b| priority_rank(b.priority).cmp(&priority_rank(a.priority)).then(a.updated_at.cmp(&b.updated_at)));
}

fn priority_rank(p: Priority) -> u8 {
    match p {
        Priority::High => 2,
        Priority::Normal => 1,
        Priority::Low => 0,
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    started.elapsed().as_millis() as u64
}

#[cfg(test)]
#[path = "scheduler_tests.rs"]
mod tests;
