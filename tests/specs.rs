// SPDX-License-Identifier: MIT
// Copyright (c) 2026 aof contributors

//! The six end-to-end scenarios, each against a fresh `tempfile`-backed
//! vault, driving the owning crates' public APIs directly. Mirrors the
//! teacher's split between crate-local unit tests and a top-level
//! `tests/` integration suite that exercises several crates together.

use std::sync::Arc;
use std::time::Duration as StdDuration;

use aof_core::{
    Clock, EventKind, FakeClock, GateDef, GateOutcome, RejectionStrategy, Routing, TaskStatus,
    WorkflowConfig,
};
use aof_eventlog::EventLogger;
use aof_notify::{rule::RuleMatch, Audience, NotificationPolicy, NotificationRule, Severity};
use aof_ops::drift;
use aof_scheduler::executor::{DispatchAction, Executor, RunResult};
use aof_scheduler::{Scheduler, SchedulerConfig};
use aof_store::{NewTask, TaskStore};
use aof_workflow::GateEngine;
use async_trait::async_trait;
use tempfile::tempdir;

fn new_task(project: &str, title: &str) -> NewTask {
    NewTask { project: project.to_string(), title: title.to_string(), created_by: "tester".to_string(), ..Default::default() }
}

struct AlwaysAccepts;

#[async_trait]
impl Executor for AlwaysAccepts {
    async fn dispatch(&self, _action: &DispatchAction) -> Result<RunResult, aof_scheduler::error::AdapterError> {
        Ok(RunResult { accepted: true, agent_run_id: Some(aof_core::AgentRunId::new()), message: None })
    }
}

/// Scenario 1: happy-path lifecycle, no workflow configured.
#[tokio::test]
async fn happy_path_lifecycle_reaches_done_with_four_transitions() {
    let dir = tempdir().unwrap();
    let clock = FakeClock::new();
    let store = TaskStore::open(dir.path(), clock.clone()).unwrap();
    let eventlog = EventLogger::open(dir.path(), clock.clone());

    let task = store.create(new_task("demo", "Deploy")).await.unwrap();
    eventlog.append(EventKind::TaskCreated { project: "demo".to_string(), title: "Deploy".to_string() }, "tester", Some(task.id.clone())).unwrap();

    let chain = [TaskStatus::Ready, TaskStatus::InProgress, TaskStatus::Review, TaskStatus::Done];
    let mut from = TaskStatus::Backlog;
    let mut events = 1; // task.created already appended
    for to in chain {
        let updated = store.transition(&task.id, to, None).await.unwrap();
        eventlog.append(
            EventKind::TaskTransitioned { from: from.to_string(), to: to.to_string(), reason: None },
            "tester",
            Some(task.id.clone()),
        ).unwrap();
        events += 1;
        from = updated.status;
    }

    assert_eq!(events, 5);
    let done = store.get(&task.id).unwrap();
    assert_eq!(done.status, TaskStatus::Done);
    assert!(done.gate_history.is_empty());
    assert!(dir.path().join("tasks/done").join(format!("{}.md", task.id)).exists());
}

fn skip_qa_workflow() -> WorkflowConfig {
    WorkflowConfig {
        gates: vec![
            GateDef { id: "implement".to_string(), role: "implementer".to_string(), can_reject: false, when: None, rejection_strategy: RejectionStrategy::Origin },
            GateDef { id: "code_review".to_string(), role: "reviewer".to_string(), can_reject: true, when: None, rejection_strategy: RejectionStrategy::Origin },
            GateDef {
                id: "qa_review".to_string(),
                role: "qa".to_string(),
                can_reject: true,
                when: Some("!tags.includes('skip-qa')".to_string()),
                rejection_strategy: RejectionStrategy::Origin,
            },
        ],
    }
}

/// Scenario 2: a rejection at `code_review` with `rejectionStrategy: origin`
/// bounces all the way back to the first gate, `implement`.
#[tokio::test]
async fn gate_rejection_bounces_to_origin() {
    let dir = tempdir().unwrap();
    let clock = FakeClock::new();
    let store = TaskStore::open(dir.path(), clock.clone()).unwrap();
    let engine = GateEngine::new();
    let workflow = skip_qa_workflow();

    let task = store.create(new_task("demo", "Ship it")).await.unwrap();
    store.transition(&task.id, TaskStatus::Ready, None).await.unwrap();
    store.transition(&task.id, TaskStatus::InProgress, None).await.unwrap();
    store.transition(&task.id, TaskStatus::Review, None).await.unwrap();

    let entered = engine.enter(&store, &task.id, &workflow, "tester").await.unwrap();
    assert_eq!(entered.task.gate.as_ref().unwrap().current, "implement");

    let approved = engine
        .handle_gate_transition(&store, &task.id, GateOutcome::Approved, &workflow, "tester", None)
        .await
        .unwrap();
    assert_eq!(approved.task.gate.as_ref().unwrap().current, "code_review");

    let rejected = engine
        .handle_gate_transition(&store, &task.id, GateOutcome::Rejected, &workflow, "tester", None)
        .await
        .unwrap();

    assert_eq!(rejected.task.gate.as_ref().unwrap().current, "implement");
    assert_eq!(rejected.task.status, TaskStatus::InProgress);
    let rejection_entry = rejected
        .task
        .gate_history
        .iter()
        .find(|e| e.gate == "code_review" && e.outcome == GateOutcome::Rejected);
    assert!(rejection_entry.is_some());
}

/// Scenario 3: a task tagged `skip-qa` auto-skips the `qa_review` gate and
/// lands on `done` once `code_review` approves.
#[tokio::test]
async fn skip_qa_tag_skips_the_qa_gate() {
    let dir = tempdir().unwrap();
    let clock = FakeClock::new();
    let store = TaskStore::open(dir.path(), clock.clone()).unwrap();
    let engine = GateEngine::new();
    let workflow = skip_qa_workflow();

    let mut init = new_task("demo", "Ship it");
    init.routing = Routing { tags: vec!["skip-qa".to_string()], ..Default::default() };
    let task = store.create(init).await.unwrap();
    store.transition(&task.id, TaskStatus::Ready, None).await.unwrap();
    store.transition(&task.id, TaskStatus::InProgress, None).await.unwrap();
    store.transition(&task.id, TaskStatus::Review, None).await.unwrap();

    engine.enter(&store, &task.id, &workflow, "tester").await.unwrap();
    // `implement` approved first, landing on `code_review`.
    engine
        .handle_gate_transition(&store, &task.id, GateOutcome::Approved, &workflow, "tester", None)
        .await
        .unwrap();
    // Approving `code_review` skips `qa_review` (inactive for this tag) and
    // reaches `done`.
    let final_state = engine
        .handle_gate_transition(&store, &task.id, GateOutcome::Approved, &workflow, "tester", None)
        .await
        .unwrap();

    assert_eq!(final_state.task.status, TaskStatus::Done);
    let skipped = final_state
        .task
        .gate_history
        .iter()
        .find(|e| e.gate == "qa_review" && e.outcome == GateOutcome::Skipped);
    assert!(skipped.is_some());
}

/// Scenario 4: a lease that outlives its TTL with no renewals budget is
/// given up: `lease.expired` fires, the task returns to `ready`, and the
/// lease is cleared.
#[tokio::test]
async fn lease_expiry_returns_the_task_to_ready() {
    let dir = tempdir().unwrap();
    let clock = FakeClock::new();
    let store = Arc::new(TaskStore::open(dir.path(), clock.clone()).unwrap());
    let eventlog = Arc::new(EventLogger::open(dir.path(), clock.clone()));
    let executor = Arc::new(AlwaysAccepts);
    let config = SchedulerConfig { default_lease_ttl_ms: 100, max_lease_renewals: 0, dry_run: false };
    let scheduler = Scheduler::new(store.clone(), eventlog, executor, clock.clone(), config);

    let task = store.create(new_task("demo", "Ship it")).await.unwrap();
    store.transition(&task.id, TaskStatus::Ready, None).await.unwrap();

    let first = scheduler.poll().await;
    assert_eq!(first.stats.dispatched, 1);
    assert!(store.get(&task.id).unwrap().lease.is_some());

    clock.advance(StdDuration::from_millis(200));
    scheduler.poll().await;

    let expired = store.get(&task.id).unwrap();
    assert_eq!(expired.status, TaskStatus::Ready);
    assert!(expired.lease.is_none());
}

/// Scenario 5: two `task.created` events for the same task 1s apart, inside
/// a 300s dedupe window, produce exactly one notification.
#[tokio::test]
async fn dedupe_suppresses_the_second_identical_event_inside_the_window() {
    let clock = FakeClock::new();
    let policy = NotificationPolicy::new(
        vec![NotificationRule {
            match_: RuleMatch { event_type: "task.created".to_string(), payload: None },
            severity: Some(Severity::Info),
            audience: vec![Audience::Agent],
            channel: "stdout".to_string(),
            template: "{actor} created {taskId}".to_string(),
            dedupe_window_ms: None,
            never_suppress: false,
        }],
        300_000,
        clock.clone(),
    );

    let kind = EventKind::TaskCreated { project: "demo".to_string(), title: "Deploy".to_string() };
    let task_id = aof_core::TaskId::from("TASK-2026-01-01-001");

    let mut first = aof_core::Event::new(&kind, "tester", Some(task_id.clone()));
    first.timestamp = clock.utc_now();
    assert!(policy.evaluate(&first).is_some());

    clock.advance(StdDuration::from_secs(1));
    let mut second = aof_core::Event::new(&kind, "tester", Some(task_id));
    second.timestamp = clock.utc_now();
    assert!(policy.evaluate(&second).is_none());
}

/// Scenario 6: a declared/live roster mismatch reports the missing and
/// extra ids and a non-clean exit code.
#[tokio::test]
async fn drift_report_flags_missing_and_extra_agents() {
    let declared = vec![
        aof_ops::RosterAgent { id: "main".to_string(), name: "Main".to_string() },
        aof_ops::RosterAgent { id: "dev".to_string(), name: "Dev".to_string() },
    ];
    let live = vec![
        aof_ops::RosterAgent { id: "main".to_string(), name: "Main".to_string() },
        aof_ops::RosterAgent { id: "extra".to_string(), name: "Extra".to_string() },
    ];

    let report = drift::compare(&declared, &live);

    assert_eq!(report.missing, vec!["dev".to_string()]);
    assert_eq!(report.extra, vec!["extra".to_string()]);
    assert!(report.mismatch.is_empty());
    assert!(!report.is_clean());
    assert_eq!(report.exit_code(), 1);
}
