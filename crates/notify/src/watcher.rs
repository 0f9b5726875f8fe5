// SPDX-License-Identifier: MIT
// Copyright (c) 2026 aof contributors

//! Hot-reload of the notification-rules file (spec.md §4.7): watch for
//! writes, debounce, re-parse, and atomically swap the policy's rule list.
//! On a bad reload the previous rule list is kept and `on_error` fires.
//!
//! Grounded in the teacher's `notify::recommended_watcher` + channel-drain
//! idiom (`oj-cli::output::tail_file`), adapted from "wake on write" to
//! "wake, debounce, reload".

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use aof_core::Clock;
use notify::{Event as FsEvent, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::error::NotifyError;
use crate::policy::NotificationPolicy;
use crate::rule;

const DEBOUNCE: Duration = Duration::from_millis(200);

/// Spawn a background task that watches `path` and reloads `policy`'s rule
/// list on every debounced write. The returned `notify::RecommendedWatcher`
/// must be kept alive for the duration of the watch; dropping it stops the
/// file watch.
pub fn watch<C: Clock + 'static>(
    path: impl Into<PathBuf>,
    policy: Arc<NotificationPolicy<C>>,
    on_error: impl Fn(NotifyError) + Send + Sync + 'static,
) -> Result<notify::RecommendedWatcher, NotifyError> {
    let path = path.into();
    let (tx, mut rx) = mpsc::channel(16);

    let mut watcher = notify::recommended_watcher(move |res: Result<FsEvent, notify::Error>| {
        if res.is_ok() {
            let _ = tx.blocking_send(());
        }
    })
    .map_err(|e| NotifyError::ChannelFailed(e.to_string()))?;

    let watch_dir = parent_dir(&path);
    watcher
        .watch(&watch_dir, RecursiveMode::NonRecursive)
        .map_err(|e| NotifyError::ChannelFailed(e.to_string()))?;

    tokio::spawn(async move {
        while rx.recv().await.is_some() {
            // Drain any further events that arrive during the debounce
            // window so a burst of writes triggers one reload, not N.
            tokio::time::sleep(DEBOUNCE).await;
            while rx.try_recv().is_ok() {}
            reload(&path, &policy, &on_error);
        }
    });

    Ok(watcher)
}

fn reload<C: Clock>(path: &Path, policy: &NotificationPolicy<C>, on_error: &(impl Fn(NotifyError) + Send + Sync)) {
    match std::fs::read_to_string(path) {
        Ok(contents) => match rule::parse_rules(&contents) {
            Ok(rules) => policy.set_rules(rules),
            Err(e) => {
                tracing::warn!(error = %e, "notification rules reload failed; keeping previous rule list");
                on_error(e);
            }
        },
        Err(e) => {
            let err = NotifyError::Io { path: path.display().to_string(), source: e };
            tracing::warn!(error = %err, "could not read notification rules file for reload");
            on_error(err);
        }
    }
}

fn parent_dir(path: &Path) -> PathBuf {
    path.parent().map(Path::to_path_buf).unwrap_or_else(|| PathBuf::from("."))
}

#[cfg(test)]
#[path = "watcher_tests.rs"]
mod tests;
