// SPDX-License-Identifier: MIT
// Copyright (c) 2026 aof contributors

use super::*;
use aof_core::{FakeClock, GateDef, Routing, WorkflowConfig};
use aof_store::NewTask;

fn three_gate_workflow() -> WorkflowConfig {
    WorkflowConfig {
        gates: vec![
            GateDef { id: "implement".to_string(), role: "engineer".to_string(), can_reject: false, when: None, rejection_strategy: RejectionStrategy::Origin },
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

async fn task_in_review(store: &TaskStore<FakeClock>, tags: &[&str]) -> TaskId {
    let task = store
        .create(NewTask {
            project: "demo".to_string(),
            title: "Ship it".to_string(),
            routing: Routing { tags: tags.iter().map(|t| t.to_string()).collect(), ..Routing::default() },
            created_by: "tester".to_string(),
            ..Default::default()
        })
        .await
        .expect("create");
    store.transition(&task.id, TaskStatus::Ready, None).await.expect("ready");
    store.transition(&task.id, TaskStatus::InProgress, None).await.expect("in-progress");
    store.transition(&task.id, TaskStatus::Review, None).await.expect("review");
    task.id
}

#[tokio::test]
async fn gate_rejection_bounces_to_origin() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = TaskStore::open(dir.path(), FakeClock::new()).expect("open");
    let id = task_in_review(&store, &[]).await;
    let workflow = three_gate_workflow();
    let engine = GateEngine::new();

    engine.enter(&store, &id, &workflow, "scheduler").await.expect("enter");
    let transition = engine.handle_gate_transition(&store, &id, GateOutcome::Approved, &workflow, "reviewer", None).await.expect("approve implement");
    assert_eq!(transition.task.gate.as_ref().expect("gate").current, "code_review");

    let rejected = engine
        .handle_gate_transition(&store, &id, GateOutcome::Rejected, &workflow, "reviewer", Some("needs work".to_string()))
        .await
        .expect("reject");

    assert_eq!(rejected.task.gate.as_ref().expect("gate").current, "implement");
    assert_eq!(rejected.task.status, TaskStatus::InProgress);
    assert_eq!(rejected.task.gate_history.last().expect("history").outcome, GateOutcome::Rejected);
}

#[tokio::test]
async fn skip_qa_tag_skips_qa_gate_and_completes() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = TaskStore::open(dir.path(), FakeClock::new()).expect("open");
    let id = task_in_review(&store, &["skip-qa"]).await;
    let workflow = three_gate_workflow();
    let engine = GateEngine::new();

    engine.enter(&store, &id, &workflow, "scheduler").await.expect("enter");
    engine.handle_gate_transition(&store, &id, GateOutcome::Approved, &workflow, "engineer", None).await.expect("approve implement");
    let after_review = engine
        .handle_gate_transition(&store, &id, GateOutcome::Approved, &workflow, "reviewer", None)
        .await
        .expect("approve code review");

    assert_eq!(after_review.task.status, TaskStatus::Done);
    let qa_entry = after_review
        .task
        .gate_history
        .iter()
        .find(|e| e.gate == "qa_review")
        .expect("qa history entry");
    assert_eq!(qa_entry.outcome, GateOutcome::Skipped);
}

#[tokio::test]
async fn rejection_at_a_gate_that_cannot_reject_is_an_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = TaskStore::open(dir.path(), FakeClock::new()).expect("open");
    let id = task_in_review(&store, &[]).await;
    let workflow = three_gate_workflow();
    let engine = GateEngine::new();

    engine.enter(&store, &id, &workflow, "scheduler").await.expect("enter");
    let err = engine.handle_gate_transition(&store, &id, GateOutcome::Rejected, &workflow, "engineer", None).await;
    assert!(matches!(err, Err(GateError::RejectionNotAllowed { .. })));
}
