// SPDX-License-Identifier: MIT
// Copyright (c) 2026 aof contributors

//! `GateEngine`: the gated-workflow state machine (spec §4.3). Owns the
//! decision of which gate is active and where a rejection sends a task
//! back to; `aof-store` owns persisting the result.
//!
//! A task is never allowed to leave `review` except through this engine —
//! callers in `aof-scheduler` route gate decisions here rather than calling
//! `TaskStore::transition` directly.

use aof_core::{
    Clock, EventKind, GateOutcome, RejectionStrategy, Task, TaskId, TaskStatus, WorkflowConfig,
};
use aof_store::TaskStore;

use crate::error::GateError;
use crate::predicate;

/// Result of one gate decision: the task's new state plus the events the
/// caller should append to the event log.
pub struct GateTransition {
    pub task: Task,
    pub events: Vec<EventKind>,
}

#[derive(Default)]
pub struct GateEngine;

impl GateEngine {
    pub fn new() -> Self {
        Self
    }

    fn is_active(&self, task: &Task, gate: &aof_core::GateDef) -> Result<bool, GateError> {
        match &gate.when {
            None => Ok(true),
            Some(expr) => Ok(predicate::evaluate(expr, &task.routing, &task.metadata)?),
        }
    }

    /// First active gate at or after `from_idx`, skipping (and recording)
    /// inactive ones the caller should log skip events for. Returns the
    /// active gate's index, or `None` if every remaining gate is inactive.
    fn next_active_from(&self, task: &Task, workflow: &WorkflowConfig, from_idx: usize) -> Result<(Option<usize>, Vec<String>), GateError> {
        let mut skipped = Vec::new();
        for (idx, gate) in workflow.gates.iter().enumerate().skip(from_idx) {
            if self.is_active(task, gate)? {
                return Ok((Some(idx), skipped));
            }
            skipped.push(gate.id.clone());
        }
        Ok((None, skipped))
    }

    /// Called when a task first enters its workflow (moving into `review`
    /// for the first time). Sets `gate.current` to the first active gate,
    /// recording any leading inactive gates as skipped; if no gate is
    /// active at all, the task goes straight to `done`.
    pub async fn enter<C: Clock>(
        &self,
        store: &TaskStore<C>,
        task_id: &TaskId,
        workflow: &WorkflowConfig,
        actor: &str,
    ) -> Result<GateTransition, GateError> {
        let task = store.get(task_id).ok_or_else(|| GateError::NoWorkflow(task_id.clone()))?;
        let (first_active, skipped) = self.next_active_from(&task, workflow, 0)?;
        let mut events = Vec::new();

        let mut task = task;
        for gate in &skipped {
            task = store.record_gate_outcome(task_id, gate.clone(), GateOutcome::Skipped, None).await?;
            events.push(EventKind::GateTransitioned { gate: gate.clone(), outcome: "skipped".to_string() });
        }

        match first_active {
            Some(idx) => {
                let gate_id = workflow.gates[idx].id.clone();
                task = store.set_gate(task_id, gate_id.clone()).await?;
                events.push(EventKind::GateTransitioned { gate: gate_id, outcome: "entered".to_string() });
            }
            None => {
                task = store.transition(task_id, TaskStatus::Done, None).await?;
                events.push(EventKind::TaskTransitioned {
                    from: TaskStatus::Review.to_string(),
                    to: TaskStatus::Done.to_string(),
                    reason: Some("no active gates in workflow".to_string()),
                });
            }
        }
        let _ = actor;
        Ok(GateTransition { task, events })
    }

    /// Record a gate decision for a task currently sitting `in review` at
    /// `gate.current`, applying its consequences (spec §4.3 steps 3-6).
    pub async fn handle_gate_transition<C: Clock>(
        &self,
        store: &TaskStore<C>,
        task_id: &TaskId,
        outcome: GateOutcome,
        workflow: &WorkflowConfig,
        actor: &str,
        notes: Option<String>,
    ) -> Result<GateTransition, GateError> {
        let task = store.get(task_id).ok_or_else(|| GateError::NoWorkflow(task_id.clone()))?;
        if task.status != TaskStatus::Review {
            return Err(GateError::NotInReview { id: task_id.clone(), status: task.status });
        }
        let current_id = task
            .gate
            .as_ref()
            .map(|g| g.current.clone())
            .ok_or_else(|| GateError::NoWorkflow(task_id.clone()))?;
        let current_idx = workflow.index_of(&current_id).ok_or_else(|| GateError::UnknownGate(current_id.clone()))?;
        let current_gate = &workflow.gates[current_idx];

        let mut events = Vec::new();
        let mut task = store
            .record_gate_outcome(task_id, current_id.clone(), outcome, notes.clone())
            .await?;
        events.push(EventKind::GateTransitioned {
            gate: current_id.clone(),
            outcome: outcome_tag(outcome).to_string(),
        });

        match outcome {
            GateOutcome::Approved => {
                let (next, skipped) = self.next_active_from(&task, workflow, current_idx + 1)?;
                for gate in &skipped {
                    task = store.record_gate_outcome(task_id, gate.clone(), GateOutcome::Skipped, None).await?;
                    events.push(EventKind::GateTransitioned { gate: gate.clone(), outcome: "skipped".to_string() });
                }
                match next {
                    Some(idx) => {
                        let gate_id = workflow.gates[idx].id.clone();
                        task = store.set_gate(task_id, gate_id.clone()).await?;
                        events.push(EventKind::GateTransitioned { gate: gate_id, outcome: "entered".to_string() });
                    }
                    None => {
                        task = store.transition(task_id, TaskStatus::Done, None).await?;
                        events.push(EventKind::TaskTransitioned {
                            from: TaskStatus::Review.to_string(),
                            to: TaskStatus::Done.to_string(),
                            reason: None,
                        });
                    }
                }
            }
            GateOutcome::Rejected => {
                if !current_gate.can_reject {
                    return Err(GateError::RejectionNotAllowed { gate: current_id });
                }
                let target_idx = match current_gate.rejection_strategy {
                    RejectionStrategy::Origin => self.first_active_idx(&task, workflow)?,
                    RejectionStrategy::Previous => self.previous_active_idx(&task, workflow, current_idx)?,
                };
                let target_gate = workflow.gates[target_idx].id.clone();
                task = store.set_gate(task_id, target_gate.clone()).await?;
                task = store.transition(task_id, TaskStatus::InProgress, None).await?;
                events.push(EventKind::TaskTransitioned {
                    from: TaskStatus::Review.to_string(),
                    to: TaskStatus::InProgress.to_string(),
                    reason: Some(format!("rejected at gate {current_id}, bounced to {target_gate}")),
                });
            }
            GateOutcome::Blocked => {
                let reason = notes.unwrap_or_else(|| format!("blocked at gate {current_id}"));
                task = store.block(task_id, reason).await?;
                events.push(EventKind::TaskBlocked { reason: format!("blocked at gate {current_id}") });
            }
            GateOutcome::Skipped => {
                // Only produced internally by this engine's own traversal;
                // an external caller asking to "skip" a gate it's currently
                // sitting at is treated the same as approving past it.
                let (next, skipped) = self.next_active_from(&task, workflow, current_idx + 1)?;
                for gate in &skipped {
                    task = store.record_gate_outcome(task_id, gate.clone(), GateOutcome::Skipped, None).await?;
                    events.push(EventKind::GateTransitioned { gate: gate.clone(), outcome: "skipped".to_string() });
                }
                if let Some(idx) = next {
                    let gate_id = workflow.gates[idx].id.clone();
                    task = store.set_gate(task_id, gate_id.clone()).await?;
                    events.push(EventKind::GateTransitioned { gate: gate_id, outcome: "entered".to_string() });
                } else {
                    task = store.transition(task_id, TaskStatus::Done, None).await?;
                }
            }
        }

        let _ = actor;
        Ok(GateTransition { task, events })
    }

    fn first_active_idx(&self, task: &Task, workflow: &WorkflowConfig) -> Result<usize, GateError> {
        self.next_active_from(task, workflow, 0)?.0.ok_or_else(|| GateError::UnknownGate("<none active>".to_string()))
    }

    /// One active gate back from `current_idx`, per `rejectionStrategy:
    /// previous`. Falls back to the first active gate if there is no
    /// earlier active one.
    fn previous_active_idx(&self, task: &Task, workflow: &WorkflowConfig, current_idx: usize) -> Result<usize, GateError> {
        for idx in (0..current_idx).rev() {
            if self.is_active(task, &workflow.gates[idx])? {
                return Ok(idx);
            }
        }
        self.first_active_idx(task, workflow)
    }
}

fn outcome_tag(outcome: GateOutcome) -> &'static str {
    match outcome {
        GateOutcome::Approved => "approved",
        GateOutcome::Rejected => "rejected",
        GateOutcome::Skipped => "skipped",
        GateOutcome::Blocked => "blocked",
    }
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
