// SPDX-License-Identifier: MIT
// Copyright (c) 2026 aof contributors

use super::*;
use aof_core::FakeClock;
use aof_store::{NewTask, TaskStore};
use std::time::Duration as StdDuration;
use tempfile::tempdir;

fn harness() -> (tempfile::TempDir, Arc<TaskStore<FakeClock>>, FakeClock) {
    let dir = tempdir().unwrap();
    let clock = FakeClock::new();
    let store = Arc::new(TaskStore::open(dir.path(), clock.clone()).unwrap());
    (dir, store, clock)
}

fn new_task() -> NewTask {
    NewTask { project: "demo".to_string(), title: "Task".to_string(), created_by: "tester".to_string(), ..Default::default() }
}

#[tokio::test]
async fn queue_empty_fires_when_there_is_nothing_ready_or_in_progress() {
    let (_dir, store, clock) = harness();
    let controller = MurmurController::new(store, clock);
    let fire = controller.tick("core", &[MurmurTrigger::QueueEmpty]).await.unwrap();
    assert_eq!(fire, Some(MurmurFire { trigger: MurmurTrigger::QueueEmpty }));
}

#[tokio::test]
async fn queue_empty_does_not_fire_while_a_task_is_ready() {
    let (_dir, store, clock) = harness();
    let task = store.create(new_task()).await.unwrap();
    store.transition(&task.id, aof_core::TaskStatus::Ready, None).await.unwrap();
    let controller = MurmurController::new(store, clock);
    let fire = controller.tick("core", &[MurmurTrigger::QueueEmpty]).await.unwrap();
    assert_eq!(fire, None);
}

#[tokio::test]
async fn completion_batch_fires_once_the_threshold_is_reached() {
    let (_dir, store, clock) = harness();
    let controller = MurmurController::new(store, clock);
    controller.record_completion("core").await.unwrap();
    let triggers = [MurmurTrigger::CompletionBatch { threshold: 2 }];
    assert_eq!(controller.tick("core", &triggers).await.unwrap(), None);
    controller.record_completion("core").await.unwrap();
    assert_eq!(
        controller.tick("core", &triggers).await.unwrap(),
        Some(MurmurFire { trigger: MurmurTrigger::CompletionBatch { threshold: 2 } })
    );
}

#[tokio::test]
async fn first_matching_trigger_wins_even_if_a_later_one_also_matches() {
    let (_dir, store, clock) = harness();
    let controller = MurmurController::new(store, clock);
    controller.record_completion("core").await.unwrap();
    controller.record_failure("core").await.unwrap();
    let triggers = [
        MurmurTrigger::CompletionBatch { threshold: 1 },
        MurmurTrigger::FailureBatch { threshold: 1 },
    ];
    let fire = controller.tick("core", &triggers).await.unwrap();
    assert_eq!(fire, Some(MurmurFire { trigger: MurmurTrigger::CompletionBatch { threshold: 1 } }));
}

#[tokio::test]
async fn interval_trigger_fires_once_elapsed_time_matches_or_exceeds_the_interval() {
    let (_dir, store, clock) = harness();
    let controller = MurmurController::new(store, clock.clone());
    let triggers = [MurmurTrigger::Interval { interval_ms: 1_000 }];
    assert_eq!(
        controller.tick("core", &triggers).await.unwrap(),
        Some(MurmurFire { trigger: triggers[0] }),
        "no previous review means the interval trigger fires immediately"
    );
    controller.complete_review("core").await.unwrap();
    assert_eq!(controller.tick("core", &triggers).await.unwrap(), None);
    clock.advance(StdDuration::from_millis(1_000));
    assert_eq!(controller.tick("core", &triggers).await.unwrap(), Some(MurmurFire { trigger: triggers[0] }));
}

#[tokio::test]
async fn no_trigger_fires_while_a_review_is_in_flight() {
    let (_dir, store, clock) = harness();
    let task = store.create(new_task()).await.unwrap();
    let controller = MurmurController::new(store, clock);
    controller.start_review("core", task.id.clone(), "queueEmpty").await.unwrap();
    let fire = controller.tick("core", &[MurmurTrigger::QueueEmpty]).await.unwrap();
    assert_eq!(fire, None);
}

#[tokio::test]
async fn stale_review_is_cleared_when_the_review_task_reaches_a_terminal_state() {
    let (_dir, store, clock) = harness();
    let task = store.create(new_task()).await.unwrap();
    let controller = MurmurController::new(store.clone(), clock);
    controller.start_review("core", task.id.clone(), "queueEmpty").await.unwrap();
    store.transition(&task.id, aof_core::TaskStatus::Cancelled, None).await.unwrap();

    let fire = controller.tick("core", &[MurmurTrigger::QueueEmpty]).await.unwrap();
    assert_eq!(fire, Some(MurmurFire { trigger: MurmurTrigger::QueueEmpty }));
    assert!(controller.state("core").unwrap().current_review_task_id.is_none());
}

#[tokio::test]
async fn stale_review_is_cleared_after_the_timeout_elapses() {
    let (_dir, store, clock) = harness();
    let task = store.create(new_task()).await.unwrap();
    let controller =
        MurmurController::new(store, clock.clone()).with_review_timeout(chrono::Duration::milliseconds(100));
    controller.start_review("core", task.id.clone(), "queueEmpty").await.unwrap();

    assert_eq!(controller.tick("core", &[MurmurTrigger::QueueEmpty]).await.unwrap(), None);
    clock.advance(StdDuration::from_millis(100));
    assert_eq!(
        controller.tick("core", &[MurmurTrigger::QueueEmpty]).await.unwrap(),
        Some(MurmurFire { trigger: MurmurTrigger::QueueEmpty })
    );
}

#[tokio::test]
async fn complete_review_resets_counters_and_stamps_last_review_at() {
    let (_dir, store, clock) = harness();
    let task = store.create(new_task()).await.unwrap();
    let controller = MurmurController::new(store, clock);
    controller.record_completion("core").await.unwrap();
    controller.record_failure("core").await.unwrap();
    controller.start_review("core", task.id, "manual").await.unwrap();
    controller.complete_review("core").await.unwrap();

    let state = controller.state("core").unwrap();
    assert_eq!(state.completions_since_last_review, 0);
    assert_eq!(state.failures_since_last_review, 0);
    assert!(state.current_review_task_id.is_none());
    assert!(state.last_review_at.is_some());
}
