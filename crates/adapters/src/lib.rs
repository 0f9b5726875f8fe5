// SPDX-License-Identifier: MIT
// Copyright (c) 2026 aof contributors

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! aof-adapters: the one shipped `Executor` implementation (a process
//! spawner) behind the scheduler's dispatch seam, grounded in the teacher's
//! `oj-daemon::adapters::agent` backends sitting behind one `AgentAdapter`
//! trait. Spec.md treats executor plugins as an external concern; this
//! crate is the concrete adapter the daemon wires in by default.

pub mod error;
pub mod executor;

#[cfg(any(test, feature = "test-support"))]
pub mod fake;

pub use error::ProcessExecutorError;
pub use executor::{ProcessExecutor, ProcessExecutorConfig};

#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeExecutor, RecordedDispatch};
