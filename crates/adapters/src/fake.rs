// SPDX-License-Identifier: MIT
// Copyright (c) 2026 aof contributors

//! A scriptable [`Executor`] double for scheduler/daemon tests, mirroring
//! the teacher's `FakeAgentAdapter` call-log pattern: every dispatch is
//! recorded, and the response is either a fixed canned result or a per-call
//! closure the test installs up front.

use std::sync::Arc;

use aof_scheduler::{AdapterError, DispatchAction, Executor, RunResult};
use parking_lot::Mutex;

/// One recorded `dispatch` call.
#[derive(Debug, Clone)]
pub struct RecordedDispatch {
    pub action: DispatchAction,
}

enum Response {
    Accept,
    Reject(String),
    PlatformLimit(String),
}

/// Records every dispatch it receives and answers from a configured,
/// repeatable response. Defaults to accepting every dispatch.
#[derive(Clone)]
pub struct FakeExecutor {
    calls: Arc<Mutex<Vec<RecordedDispatch>>>,
    response: Arc<Mutex<Response>>,
}

impl Default for FakeExecutor {
    fn default() -> Self {
        Self { calls: Arc::new(Mutex::new(Vec::new())), response: Arc::new(Mutex::new(Response::Accept)) }
    }
}

impl FakeExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// From the next dispatch onward, reject with [`AdapterError::Rejected`].
    pub fn reject_with(&self, message: impl Into<String>) {
        *self.response.lock() = Response::Reject(message.into());
    }

    /// From the next dispatch onward, fail with [`AdapterError::PlatformLimit`].
    pub fn platform_limit(&self, message: impl Into<String>) {
        *self.response.lock() = Response::PlatformLimit(message.into());
    }

    pub fn calls(&self) -> Vec<RecordedDispatch> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }
}

#[async_trait::async_trait]
impl Executor for FakeExecutor {
    async fn dispatch(&self, action: &DispatchAction) -> Result<RunResult, AdapterError> {
        self.calls.lock().push(RecordedDispatch { action: action.clone() });
        match &*self.response.lock() {
            Response::Accept => {
                Ok(RunResult { accepted: true, agent_run_id: Some(aof_core::AgentRunId::new()), message: None })
            }
            Response::Reject(message) => {
                Err(AdapterError::Rejected { task_id: action.task_id.clone(), message: message.clone() })
            }
            Response::PlatformLimit(message) => Err(AdapterError::PlatformLimit { message: message.clone() }),
        }
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
