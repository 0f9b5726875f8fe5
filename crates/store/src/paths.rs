// SPDX-License-Identifier: MIT
// Copyright (c) 2026 aof contributors

//! Vault filesystem layout. The vault root is the single source of truth
//! (spec "Ownership"); everything here is pure path arithmetic, no I/O.

use aof_core::{TaskId, TaskStatus};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct VaultPaths {
    root: PathBuf,
}

impl VaultPaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn tasks_dir(&self) -> PathBuf {
        self.root.join("tasks")
    }

    pub fn status_dir(&self, status: TaskStatus) -> PathBuf {
        self.tasks_dir().join(status.dir_name())
    }

    pub fn task_file(&self, status: TaskStatus, id: &TaskId) -> PathBuf {
        self.status_dir(status).join(format!("{id}.md"))
    }

    /// Per-task artifact directory, deliberately outside `tasks/<status>/` so
    /// inputs/outputs survive a status transition without being moved.
    pub fn task_data_dir(&self, id: &TaskId) -> PathBuf {
        self.root.join("task-data").join(id.as_str())
    }

    pub fn task_inputs_dir(&self, id: &TaskId) -> PathBuf {
        self.task_data_dir(id).join("inputs")
    }

    pub fn task_outputs_dir(&self, id: &TaskId) -> PathBuf {
        self.task_data_dir(id).join("outputs")
    }

    pub fn projects_dir(&self) -> PathBuf {
        self.root.join("Projects")
    }

    pub fn project_manifest(&self, project_id: &str) -> PathBuf {
        self.projects_dir().join(project_id).join("project.yaml")
    }

    pub fn events_dir(&self) -> PathBuf {
        self.root.join("events")
    }

    pub fn cold_dir(&self) -> PathBuf {
        self.root.join("cold")
    }

    pub fn warm_dir(&self) -> PathBuf {
        self.root.join("warm")
    }

    pub fn murmur_dir(&self) -> PathBuf {
        self.root.join(".murmur")
    }

    pub fn org_dir(&self) -> PathBuf {
        self.root.join("org")
    }

    pub fn notification_rules_file(&self) -> PathBuf {
        self.org_dir().join("notification-rules.yaml")
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.root.join("logs")
    }

    /// Unix-domain socket the health service listens on (spec.md §6,
    /// "Health service").
    pub fn socket_path(&self) -> PathBuf {
        self.root.join("daemon.sock")
    }

    pub fn pid_path(&self) -> PathBuf {
        self.root.join("daemon.pid")
    }
}
