// SPDX-License-Identifier: MIT
// Copyright (c) 2026 aof contributors

//! `TaskLockManager`: the only serialization primitive the store and the
//! scheduler use (spec §4.2, §5). Distinct task ids run in parallel; a given
//! id's operations are strictly FIFO because `tokio::sync::Mutex` queues
//! waiters in arrival order.

use aof_core::TaskId;
use dashmap::DashMap;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Default)]
pub struct TaskLockManager {
    locks: DashMap<TaskId, Arc<Mutex<()>>>,
}

impl TaskLockManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serialize `f` against any other in-flight call for `id`. Errors from
    /// `f` propagate to the caller but never poison the lock for the next
    /// waiter.
    pub async fn with_lock<T, E, F, Fut>(&self, id: &TaskId, f: F) -> Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let entry = self.locks.entry(id.clone()).or_insert_with(|| Arc::new(Mutex::new(()))).clone();
        let guard = entry.lock().await;
        let result = f().await;
        drop(guard);
        // Drop the map entry once nobody else is waiting on it, so the map
        // doesn't grow unbounded over a long daemon lifetime.
        if Arc::strong_count(&entry) <= 2 {
            self.locks.remove_if(id, |_, v| Arc::strong_count(v) <= 1);
        }
        result
    }
}

#[cfg(test)]
#[path = "lock_tests.rs"]
mod tests;
