// SPDX-License-Identifier: MIT
// Copyright (c) 2026 aof contributors

use aof_core::{ErrorKind, HasErrorKind, TaskId};
use aof_store::TaskStoreError;

use crate::predicate::PredicateError;

#[derive(Debug, thiserror::Error)]
pub enum GateError {
    #[error("task {0} has no workflow configured (routing.workflow is unset)")]
    NoWorkflow(TaskId),

    #[error("task {id} is not in review (status is {status})")]
    NotInReview { id: TaskId, status: aof_core::TaskStatus },

    #[error("gate {gate:?} does not allow rejection")]
    RejectionNotAllowed { gate: String },

    #[error("workflow references unknown gate {0:?}")]
    UnknownGate(String),

    #[error("gate predicate error: {0}")]
    Predicate(#[from] PredicateError),

    #[error(transparent)]
    Store(#[from] TaskStoreError),
}

impl HasErrorKind for GateError {
    fn error_kind(&self) -> ErrorKind {
        match self {
            GateError::NoWorkflow(_) => ErrorKind::Validation,
            GateError::NotInReview { .. } => ErrorKind::IllegalTransition,
            GateError::RejectionNotAllowed { .. } => ErrorKind::IllegalTransition,
            GateError::UnknownGate(_) => ErrorKind::Validation,
            GateError::Predicate(_) => ErrorKind::Validation,
            GateError::Store(e) => e.error_kind(),
        }
    }
}
