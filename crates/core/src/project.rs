// SPDX-License-Identifier: MIT
// Copyright (c) 2026 aof contributors

//! Project manifest (`project.yaml`) and the workflow/gate configuration it
//! carries for `aof-workflow`'s `GateEngine`.

use crate::ids::ProjectId;
use serde::{Deserialize, Serialize};

/// Strategy for handling a `rejected` gate outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RejectionStrategy {
    /// Bounce all the way back to the first active gate.
    Origin,
    /// Move one active gate back.
    Previous,
}

/// One gate in an ordered workflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GateDef {
    pub id: String,
    pub role: String,
    #[serde(default)]
    pub can_reject: bool,
    /// A small predicate over `tags`/`metadata`, e.g. `"!tags.includes('skip-qa')"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub when: Option<String>,
    #[serde(default = "default_rejection_strategy")]
    pub rejection_strategy: RejectionStrategy,
}

fn default_rejection_strategy() -> RejectionStrategy {
    RejectionStrategy::Origin
}

/// An ordered sequence of gates a task must pass through before `done`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkflowConfig {
    pub gates: Vec<GateDef>,
}

impl WorkflowConfig {
    pub fn gate(&self, id: &str) -> Option<&GateDef> {
        self.gates.iter().find(|g| g.id == id)
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.gates.iter().position(|g| g.id == id)
    }
}

/// `project.yaml` schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectManifest {
    pub id: ProjectId,
    pub title: String,
    pub status: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub owner: String,
    #[serde(default)]
    pub participants: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<ProjectId>,
    #[serde(default)]
    pub routing: serde_yaml::Value,
    #[serde(default)]
    pub memory: serde_yaml::Value,
    #[serde(default)]
    pub links: serde_yaml::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workflow: Option<WorkflowConfig>,
}

#[cfg(test)]
#[path = "project_tests.rs"]
mod tests;
