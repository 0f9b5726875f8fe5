// SPDX-License-Identifier: MIT
// Copyright (c) 2026 aof contributors

use super::*;

#[test]
fn manifest_without_workflow_has_no_gating() {
    let yaml = r#"
id: demo
title: Demo
status: active
type: team
owner: alice
"#;
    let manifest: ProjectManifest = serde_yaml::from_str(yaml).unwrap();
    assert!(manifest.workflow.is_none());
}

#[test]
fn workflow_gate_lookup_by_id() {
    let workflow = WorkflowConfig {
        gates: vec![
            GateDef {
                id: "implement".into(),
                role: "engineer".into(),
                can_reject: false,
                when: None,
                rejection_strategy: RejectionStrategy::Origin,
            },
            GateDef {
                id: "code_review".into(),
                role: "reviewer".into(),
                can_reject: true,
                when: None,
                rejection_strategy: RejectionStrategy::Origin,
            },
        ],
    };
    assert_eq!(workflow.index_of("code_review"), Some(1));
    assert!(workflow.gate("qa_review").is_none());
}
