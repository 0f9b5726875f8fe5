// SPDX-License-Identifier: MIT
// Copyright (c) 2026 aof contributors

//! Shared test helpers for use across crates.
//!
//! Gated behind `#[cfg(any(test, feature = "test-support"))]`.

use crate::{Metadata, Priority, Routing, Task, TaskId, TaskStatus};
use std::collections::BTreeSet;

/// Builder for `Task` fixtures with sane defaults, for use in other crates'
/// tests (`aof-store`, `aof-workflow`, `aof-scheduler`, …).
pub struct TaskBuilder {
    task: Task,
}

impl TaskBuilder {
    pub fn new(id: impl Into<String>) -> Self {
        let now = chrono::DateTime::<chrono::Utc>::UNIX_EPOCH;
        Self {
            task: Task {
                id: TaskId::from(id.into()),
                project: "demo".to_string(),
                title: "Untitled".to_string(),
                status: TaskStatus::Backlog,
                priority: Priority::Normal,
                routing: Routing::default(),
                created_at: now,
                updated_at: now,
                last_transition_at: now,
                created_by: "tester".to_string(),
                depends_on: BTreeSet::new(),
                lease: None,
                gate: None,
                gate_history: Vec::new(),
                metadata: Metadata::default(),
                body: String::new(),
            },
        }
    }

    pub fn project(mut self, project: impl Into<String>) -> Self {
        self.task.project = project.into();
        self
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.task.title = title.into();
        self
    }

    pub fn status(mut self, status: TaskStatus) -> Self {
        self.task.status = status;
        self
    }

    pub fn priority(mut self, priority: Priority) -> Self {
        self.task.priority = priority;
        self
    }

    pub fn tags(mut self, tags: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.task.routing.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn workflow(mut self, workflow: impl Into<String>) -> Self {
        self.task.routing.workflow = Some(workflow.into());
        self
    }

    pub fn depends_on(mut self, ids: impl IntoIterator<Item = TaskId>) -> Self {
        self.task.depends_on = ids.into_iter().collect();
        self
    }

    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.task.body = body.into();
        self
    }

    pub fn build(self) -> Task {
        self.task
    }
}
