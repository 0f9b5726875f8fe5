// SPDX-License-Identifier: MIT
// Copyright (c) 2026 aof contributors

//! `TaskStore`: the vault's task half (spec §4.1). A task's status always
//! matches its file's parent directory; every mutation either writes a new
//! file in place or moves it between status directories with
//! write-temp-then-rename-then-unlink.

use std::collections::{BTreeSet, HashMap};
use std::path::PathBuf;

use aof_core::{
    transition_allowed, Clock, GateHistoryEntry, GateOutcome, GateState, Lease, LeaseId, Priority,
    Routing, Task, TaskId, TaskIdGen, TaskStatus,
};
use indexmap::IndexMap;
use parking_lot::RwLock;
use sha2::{Digest as _, Sha256};

use crate::error::TaskStoreError;
use crate::frontmatter;
use crate::io;
use crate::lock::TaskLockManager;
use crate::paths::VaultPaths;

/// Input to `TaskStore::create`.
#[derive(Debug, Clone, Default)]
pub struct NewTask {
    pub project: String,
    pub title: String,
    pub priority: Priority,
    pub routing: Routing,
    pub created_by: String,
    pub depends_on: BTreeSet<TaskId>,
    pub body: String,
}

/// Filter predicate for `TaskStore::list`. An unset field matches everything.
#[derive(Debug, Clone, Default)]
pub struct TaskFilter {
    pub status: Option<TaskStatus>,
    pub agent: Option<String>,
    pub tags: Vec<String>,
}

impl TaskFilter {
    fn matches(&self, task: &Task) -> bool {
        if let Some(status) = self.status {
            if task.status != status {
                return false;
            }
        }
        if let Some(agent) = &self.agent {
            if task.routing.agent.as_deref() != Some(agent.as_str()) {
                return false;
            }
        }
        self.tags.iter().all(|t| task.routing.has_tag(t))
    }
}

struct Index {
    tasks: IndexMap<TaskId, Task>,
}

pub struct TaskStore<C: Clock> {
    paths: VaultPaths,
    clock: C,
    index: RwLock<Index>,
    id_gen: RwLock<TaskIdGen>,
    locks: TaskLockManager,
}

impl<C: Clock> TaskStore<C> {
    /// Load every task under `tasks/<status>/*.md`, repairing any id found in
    /// two status directories by keeping the newer `updatedAt` copy, and seed
    /// the id generator so restarts never reissue an id.
    pub fn open(root: impl Into<PathBuf>, clock: C) -> Result<Self, TaskStoreError> {
        let paths = VaultPaths::new(root);
        let mut by_id: IndexMap<TaskId, (TaskStatus, Task)> = IndexMap::new();
        let mut id_gen = TaskIdGen::new();

        for status in TaskStatus::ALL {
            let dir = paths.status_dir(status);
            if !dir.exists() {
                continue;
            }
            let entries = std::fs::read_dir(&dir).map_err(|e| TaskStoreError::Io {
                path: dir.display().to_string(),
                source: e,
            })?;
            for entry in entries {
                let entry = entry.map_err(|e| TaskStoreError::Io { path: dir.display().to_string(), source: e })?;
                let path = entry.path();
                if path.extension().and_then(|e| e.to_str()) != Some("md") {
                    continue;
                }
                let raw = std::fs::read_to_string(&path)
                    .map_err(|e| TaskStoreError::Io { path: path.display().to_string(), source: e })?;
                let task = frontmatter::parse_task(&raw)?;
                seed_id_gen(&mut id_gen, &task);

                match by_id.get(&task.id) {
                    None => {
                        by_id.insert(task.id.clone(), (status, task));
                    }
                    Some((prev_status, prev_task)) => {
                        tracing::warn!(
                            id = %task.id,
                            status_a = %prev_status,
                            status_b = %status,
                            "task id present in two status directories; repairing by keeping the newer updatedAt",
                        );
                        if task.updated_at > prev_task.updated_at {
                            let stale_path = paths.task_file(*prev_status, &task.id);
                            let _ = std::fs::remove_file(&stale_path);
                            by_id.insert(task.id.clone(), (status, task));
                        } else {
                            let _ = std::fs::remove_file(&path);
                        }
                    }
                }
            }
        }

        let tasks: IndexMap<TaskId, Task> = by_id.into_iter().map(|(id, (_, task))| (id, task)).collect();
        Ok(Self {
            paths,
            clock,
            index: RwLock::new(Index { tasks }),
            id_gen: RwLock::new(id_gen),
            locks: TaskLockManager::new(),
        })
    }

    pub fn paths(&self) -> &VaultPaths {
        &self.paths
    }

    pub fn get(&self, id: &TaskId) -> Option<Task> {
        self.index.read().tasks.get(id).cloned()
    }

    /// Resolve `prefix` to exactly one task. Zero matches is `NotFound`; more
    /// than one is `AmbiguousPrefix` (spec Open Question (a), resolved strict).
    pub fn get_by_prefix(&self, prefix: &str) -> Result<Task, TaskStoreError> {
        let index = self.index.read();
        let mut matches = index.tasks.values().filter(|t| t.id.starts_with(prefix));
        let first = matches.next().cloned();
        match first {
            None => Err(TaskStoreError::NotFound(prefix.to_string())),
            Some(task) => {
                let extra = matches.count();
                if extra > 0 {
                    Err(TaskStoreError::AmbiguousPrefix { prefix: prefix.to_string(), count: extra + 1 })
                } else {
                    Ok(task)
                }
            }
        }
    }

    pub fn list(&self, filter: &TaskFilter) -> Vec<Task> {
        self.index.read().tasks.values().filter(|t| filter.matches(t)).cloned().collect()
    }

    pub fn count_by_status(&self) -> HashMap<TaskStatus, usize> {
        let mut counts = HashMap::new();
        for task in self.index.read().tasks.values() {
            *counts.entry(task.status).or_insert(0) += 1;
        }
        counts
    }

    pub fn content_hash(task: &Task) -> String {
        format!("{:x}", Sha256::digest(task.body.as_bytes()))[..16].to_string()
    }

    pub async fn create(&self, init: NewTask) -> Result<Task, TaskStoreError> {
        if init.title.trim().is_empty() {
            return Err(TaskStoreError::Validation("title must not be empty".to_string()));
        }
        let project = aof_core::ProjectId::parse(init.project.clone())
            .map_err(|e| TaskStoreError::Validation(e.to_string()))?;
        let now = self.clock.utc_now();
        let id = self.id_gen.write().next(project, now);

        let task = Task {
            id: id.clone(),
            project: init.project,
            title: init.title,
            status: TaskStatus::Backlog,
            priority: init.priority,
            routing: init.routing,
            created_at: now,
            updated_at: now,
            last_transition_at: now,
            created_by: init.created_by,
            depends_on: init.depends_on,
            lease: None,
            gate: None,
            gate_history: Vec::new(),
            metadata: aof_core::Metadata::default(),
            body: init.body,
        };

        let path = self.paths.task_file(TaskStatus::Backlog, &id);
        let rendered = frontmatter::render_task(&task)?;
        io::write_atomic(&path, &rendered)?;
        self.index.write().tasks.insert(id, task.clone());
        Ok(task)
    }

    /// Validate and apply `id`'s transition to `to`, moving the task file
    /// between status directories if the status actually changes.
    pub async fn transition(
        &self,
        id: &TaskId,
        to: TaskStatus,
        reason: Option<String>,
    ) -> Result<Task, TaskStoreError> {
        let lock_key = id.clone();
        let id = id.clone();
        self.locks
            .with_lock(&lock_key, move || async move {
                let mut task = self.require(&id)?;
                let from = task.status;
                if from.is_terminal() {
                    return Err(TaskStoreError::TerminalImmutable { id });
                }
                if !transition_allowed(from, to) {
                    return Err(TaskStoreError::IllegalTransition { id, from, to });
                }

                let now = self.clock.utc_now();
                if from != to {
                    task.status = to;
                    task.last_transition_at = now;
                    if to == TaskStatus::Blocked {
                        task.metadata.set_pre_block_status(from);
                        if let Some(reason) = reason {
                            task.metadata.set_block_reason(reason);
                        }
                    } else if from == TaskStatus::Blocked {
                        task.metadata.clear_pre_block_status();
                        task.metadata.clear_block_reason();
                    }
                    if from == TaskStatus::InProgress && to == TaskStatus::Review {
                        // A clean completion breaks the consecutive-expiry streak
                        // the scheduler tracks for its deadletter rule.
                        task.metadata.clear_lease_expiry_streak();
                    }
                }
                task.updated_at = now;
                self.persist_move(&task, from, to)?;
                Ok(task)
            })
            .await
    }

    pub async fn block(&self, id: &TaskId, reason: impl Into<String>) -> Result<Task, TaskStoreError> {
        self.transition(id, TaskStatus::Blocked, Some(reason.into())).await
    }

    /// Returns the task to the status it held before `block`, defaulting to
    /// `ready` if none was recorded (the `block(r); unblock()` law, spec §8).
    pub async fn unblock(&self, id: &TaskId) -> Result<Task, TaskStoreError> {
        let target = self
            .get(id)
            .and_then(|t| t.metadata.pre_block_status())
            .unwrap_or(TaskStatus::Ready);
        self.transition(id, target, None).await
    }

    /// Record a gate outcome and, where the outcome moves the task out of
    /// `review`, transition accordingly. Does not decide the rejection
    /// target gate; `aof-workflow`'s `GateEngine` owns that and calls
    /// `transition`/`set_gate` separately.
    pub async fn record_gate_outcome(
        &self,
        id: &TaskId,
        gate: impl Into<String>,
        outcome: GateOutcome,
        notes: Option<String>,
    ) -> Result<Task, TaskStoreError> {
        let lock_key = id.clone();
        let id = id.clone();
        self.locks
            .with_lock(&lock_key, move || async move {
                let mut task = self.require(&id)?;
                if task.status.is_terminal() {
                    return Err(TaskStoreError::TerminalImmutable { id });
                }
                let now = self.clock.utc_now();
                task.gate_history.push(GateHistoryEntry {
                    gate: gate.into(),
                    outcome,
                    at: now,
                    notes,
                    agent: None,
                    summary: None,
                });
                task.updated_at = now;
                let from = task.status;
                self.persist_move(&task, from, from)?;
                Ok(task)
            })
            .await
    }

    pub async fn set_gate(&self, id: &TaskId, current: impl Into<String>) -> Result<Task, TaskStoreError> {
        let lock_key = id.clone();
        let id = id.clone();
        self.locks
            .with_lock(&lock_key, move || async move {
                let mut task = self.require(&id)?;
                if task.status.is_terminal() {
                    return Err(TaskStoreError::TerminalImmutable { id });
                }
                let now = self.clock.utc_now();
                task.gate = Some(GateState { current: current.into(), entered: now });
                task.updated_at = now;
                let from = task.status;
                self.persist_move(&task, from, from)?;
                Ok(task)
            })
            .await
    }

    /// Acquire or (same-agent) renew a lease on `id`. Fails with
    /// `LeaseConflict` if a non-expired lease is held by a different agent.
    pub async fn lease_acquire(
        &self,
        id: &TaskId,
        agent_id: &str,
        ttl: chrono::Duration,
    ) -> Result<Lease, TaskStoreError> {
        let lock_key = id.clone();
        let id_owned = id.clone();
        self.locks
            .with_lock(&lock_key, move || async move {
                let mut task = self.require(&id_owned)?;
                let now = self.clock.utc_now();
                if let Some(existing) = &task.lease {
                    if !existing.is_expired(now) && existing.agent_id != agent_id {
                        return Err(TaskStoreError::LeaseConflict { id: id_owned });
                    }
                }
                let renewal_count = match &task.lease {
                    Some(existing) if !existing.is_expired(now) && existing.agent_id == agent_id => {
                        existing.renewal_count + 1
                    }
                    _ => 0,
                };
                let lease = Lease {
                    lease_id: LeaseId::new(),
                    agent_id: agent_id.to_string(),
                    acquired_at: now,
                    expires_at: now + ttl,
                    renewal_count,
                };
                task.lease = Some(lease.clone());
                task.updated_at = now;
                let from = task.status;
                self.persist_move(&task, from, from)?;
                Ok(lease)
            })
            .await
    }

    pub async fn lease_renew(
        &self,
        id: &TaskId,
        lease_id: &LeaseId,
        ttl: chrono::Duration,
    ) -> Result<Lease, TaskStoreError> {
        let lock_key = id.clone();
        let id_owned = id.clone();
        self.locks
            .with_lock(&lock_key, move || async move {
                let mut task = self.require(&id_owned)?;
                let now = self.clock.utc_now();
                let lease = task
                    .lease
                    .as_mut()
                    .filter(|l| &l.lease_id == lease_id)
                    .ok_or_else(|| TaskStoreError::NoSuchLease {
                        id: id_owned.clone(),
                        lease_id: lease_id.to_string(),
                    })?;
                lease.expires_at = now + ttl;
                lease.renewal_count += 1;
                let renewed = lease.clone();
                task.updated_at = now;
                let from = task.status;
                self.persist_move(&task, from, from)?;
                Ok(renewed)
            })
            .await
    }

    pub async fn lease_release(&self, id: &TaskId, lease_id: &LeaseId) -> Result<Task, TaskStoreError> {
        let lock_key = id.clone();
        let id_owned = id.clone();
        self.locks
            .with_lock(&lock_key, move || async move {
                let mut task = self.require(&id_owned)?;
                let matches = task.lease.as_ref().is_some_and(|l| &l.lease_id == lease_id);
                if !matches {
                    return Err(TaskStoreError::NoSuchLease {
                        id: id_owned,
                        lease_id: lease_id.to_string(),
                    });
                }
                task.lease = None;
                task.updated_at = self.clock.utc_now();
                let from = task.status;
                self.persist_move(&task, from, from)?;
                Ok(task)
            })
            .await
    }

    /// Clear an expired lease and return the task to `ready`. The scheduler
    /// decides *when* a lease has expired (spec §4.4); the store only applies
    /// the resulting state change.
    pub async fn lease_expire(&self, id: &TaskId) -> Result<Task, TaskStoreError> {
        let lock_key = id.clone();
        let id_owned = id.clone();
        self.locks
            .with_lock(&lock_key, move || async move {
                let mut task = self.require(&id_owned)?;
                task.lease = None;
                let now = self.clock.utc_now();
                let from = task.status;
                if transition_allowed(from, TaskStatus::Ready) && from != TaskStatus::Ready {
                    task.status = TaskStatus::Ready;
                    task.last_transition_at = now;
                }
                task.updated_at = now;
                let to = task.status;
                self.persist_move(&task, from, to)?;
                Ok(task)
            })
            .await
    }

    /// Give up on an expired lease: clear it, bump the task's consecutive
    /// lease-expiry streak, and transition to `deadletter` once that streak
    /// reaches 3, or back to `ready` otherwise (spec §4.4).
    pub async fn lease_give_up(&self, id: &TaskId) -> Result<Task, TaskStoreError> {
        let lock_key = id.clone();
        let id_owned = id.clone();
        self.locks
            .with_lock(&lock_key, move || async move {
                let mut task = self.require(&id_owned)?;
                task.lease = None;
                let streak = task.metadata.lease_expiry_streak() + 1;
                task.metadata.set_lease_expiry_streak(streak);
                let now = self.clock.utc_now();
                let from = task.status;
                let target = if streak >= 3 { TaskStatus::Deadletter } else { TaskStatus::Ready };
                if transition_allowed(from, target) && from != target {
                    task.status = target;
                    task.last_transition_at = now;
                }
                task.updated_at = now;
                let to = task.status;
                self.persist_move(&task, from, to)?;
                Ok(task)
            })
            .await
    }

    /// Add `blocker` as a dependency of `id`. Rejects edges that would close
    /// a cycle via DFS over the in-memory `dependsOn` graph; never builds a
    /// graph that outlives this call (spec Design Notes, "Cyclic graphs").
    pub async fn add_dependency(&self, id: &TaskId, blocker: &TaskId) -> Result<Task, TaskStoreError> {
        let lock_key = id.clone();
        let id_owned = id.clone();
        let blocker = blocker.clone();
        self.locks
            .with_lock(&lock_key, move || async move {
                let mut task = self.require(&id_owned)?;
                if task.status.is_terminal() {
                    return Err(TaskStoreError::TerminalImmutable { id: id_owned });
                }
                if task.depends_on.contains(&blocker) {
                    return Ok(task); // idempotent
                }
                if self.reachable(&blocker, &id_owned) {
                    return Err(TaskStoreError::CycleDetected { id: id_owned, blocker });
                }
                task.depends_on.insert(blocker);
                task.updated_at = self.clock.utc_now();
                let from = task.status;
                self.persist_move(&task, from, from)?;
                Ok(task)
            })
            .await
    }

    pub async fn remove_dependency(&self, id: &TaskId, blocker: &TaskId) -> Result<Task, TaskStoreError> {
        let lock_key = id.clone();
        let id_owned = id.clone();
        let blocker = blocker.clone();
        self.locks
            .with_lock(&lock_key, move || async move {
                let mut task = self.require(&id_owned)?;
                if task.status.is_terminal() {
                    return Err(TaskStoreError::TerminalImmutable { id: id_owned });
                }
                task.depends_on.remove(&blocker);
                task.updated_at = self.clock.utc_now();
                let from = task.status;
                self.persist_move(&task, from, from)?;
                Ok(task)
            })
            .await
    }

    pub fn get_task_inputs(&self, id: &TaskId) -> Result<Vec<PathBuf>, TaskStoreError> {
        list_dir(&self.paths.task_inputs_dir(id))
    }

    pub fn get_task_outputs(&self, id: &TaskId) -> Result<Vec<PathBuf>, TaskStoreError> {
        list_dir(&self.paths.task_outputs_dir(id))
    }

    pub fn write_task_output(&self, id: &TaskId, filename: &str, contents: &[u8]) -> Result<PathBuf, TaskStoreError> {
        let dir = self.paths.task_outputs_dir(id);
        std::fs::create_dir_all(&dir).map_err(|e| TaskStoreError::Io { path: dir.display().to_string(), source: e })?;
        let path = dir.join(filename);
        let text = String::from_utf8_lossy(contents).into_owned();
        io::write_atomic(&path, &text)?;
        Ok(path)
    }

    fn require(&self, id: &TaskId) -> Result<Task, TaskStoreError> {
        self.get(id).ok_or_else(|| TaskStoreError::NotFound(id.to_string()))
    }

    /// True if `to` is reachable from `from` by following `dependsOn` edges.
    fn reachable(&self, from: &TaskId, to: &TaskId) -> bool {
        let index = self.index.read();
        let mut stack = vec![from.clone()];
        let mut visited = std::collections::HashSet::new();
        while let Some(current) = stack.pop() {
            if &current == to {
                return true;
            }
            if !visited.insert(current.clone()) {
                continue;
            }
            if let Some(task) = index.tasks.get(&current) {
                stack.extend(task.depends_on.iter().cloned());
            }
        }
        false
    }

    fn persist_move(&self, task: &Task, from: TaskStatus, to: TaskStatus) -> Result<(), TaskStoreError> {
        let rendered = frontmatter::render_task(task)?;
        let from_path = self.paths.task_file(from, &task.id);
        let to_path = self.paths.task_file(to, &task.id);
        io::move_atomic(&from_path, &to_path, &rendered)?;
        self.index.write().tasks.insert(task.id.clone(), task.clone());
        Ok(())
    }
}

fn list_dir(dir: &std::path::Path) -> Result<Vec<PathBuf>, TaskStoreError> {
    if !dir.exists() {
        return Ok(Vec::new());
    }
    let mut out = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(|e| TaskStoreError::Io { path: dir.display().to_string(), source: e })? {
        let entry = entry.map_err(|e| TaskStoreError::Io { path: dir.display().to_string(), source: e })?;
        out.push(entry.path());
    }
    out.sort();
    Ok(out)
}

/// Seed the id generator from an on-disk task so a restart never reissues
/// its `(project, date, seq)` slot.
fn seed_id_gen(gen: &mut TaskIdGen, task: &Task) {
    let Ok((date, seq)) = parse_task_id_parts(task.id.as_str()) else { return };
    if let Ok(project) = aof_core::ProjectId::parse(task.project.clone()) {
        gen.observe(project, date, seq);
    }
}

fn parse_task_id_parts(s: &str) -> Result<(chrono::NaiveDate, u32), ()> {
    let rest = s.strip_prefix("TASK-").ok_or(())?;
    let mut parts = rest.split('-');
    let (y, m, d, n) = (parts.next().ok_or(())?, parts.next().ok_or(())?, parts.next().ok_or(())?, parts.next().ok_or(())?);
    let date = chrono::NaiveDate::parse_from_str(&format!("{y}-{m}-{d}"), "%Y-%m-%d").map_err(|_| ())?;
    let seq: u32 = n.parse().map_err(|_| ())?;
    Ok((date, seq))
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
