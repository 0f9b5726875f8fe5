// SPDX-License-Identifier: MIT
// Copyright (c) 2026 aof contributors

use super::*;
use aof_core::TaskId;

fn action(task_id: &str) -> DispatchAction {
    DispatchAction { task_id: TaskId::from(task_id), project: "demo".to_string(), agent: None, workflow: None }
}

#[tokio::test]
async fn records_every_dispatch_it_receives() {
    let executor = FakeExecutor::new();
    executor.dispatch(&action("TASK-2026-01-01-001")).await.unwrap();
    executor.dispatch(&action("TASK-2026-01-01-002")).await.unwrap();
    assert_eq!(executor.call_count(), 2);
    assert_eq!(executor.calls()[0].action.task_id, TaskId::from("TASK-2026-01-01-001"));
}

#[tokio::test]
async fn defaults_to_accepting_every_dispatch() {
    let executor = FakeExecutor::new();
    let result = executor.dispatch(&action("TASK-2026-01-01-001")).await.unwrap();
    assert!(result.accepted);
}

#[tokio::test]
async fn reject_with_switches_subsequent_dispatches_to_rejected() {
    let executor = FakeExecutor::new();
    executor.reject_with("no capacity");
    let err = executor.dispatch(&action("TASK-2026-01-01-001")).await.unwrap_err();
    assert!(matches!(err, AdapterError::Rejected { message, .. } if message == "no capacity"));
}

#[tokio::test]
async fn platform_limit_surfaces_as_platform_limit_error() {
    let executor = FakeExecutor::new();
    executor.platform_limit("capacity exhausted");
    let err = executor.dispatch(&action("TASK-2026-01-01-001")).await.unwrap_err();
    assert!(matches!(err, AdapterError::PlatformLimit { .. }));
}
