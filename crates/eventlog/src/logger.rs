// SPDX-License-Identifier: MIT
// Copyright (c) 2026 aof contributors

//! `EventLogger`: one append-only JSONL file per UTC day, with a
//! best-effort `events/events.jsonl` symlink pointed at today's file.
//!
//! `eventId` is a monotonically increasing counter scoped to the daemon's
//! lifetime (it resets on every process start, per spec §4.5) rather than
//! being read back from disk — restart ordering is recovered from the log
//! itself (append order), not from id continuity.

use std::fs::OpenOptions;
use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use aof_core::{Clock, Event, EventKind, TaskId};
use parking_lot::RwLock;

use crate::error::EventLoggerError;

type Subscriber = Box<dyn Fn(&Event) + Send + Sync>;

/// Append-only daily-rotated event log under `<vault>/events/`.
pub struct EventLogger<C: Clock> {
    events_dir: PathBuf,
    clock: C,
    next_id: AtomicU64,
    subscribers: RwLock<Vec<Subscriber>>,
}

impl<C: Clock> EventLogger<C> {
    pub fn open(vault_root: impl Into<PathBuf>, clock: C) -> Self {
        Self {
            events_dir: vault_root.into().join("events"),
            clock,
            next_id: AtomicU64::new(1),
            subscribers: RwLock::new(Vec::new()),
        }
    }

    pub fn events_dir(&self) -> &Path {
        &self.events_dir
    }

    /// Register a callback fired, in registration order, after each
    /// successful append returns.
    pub fn on_event(&self, f: impl Fn(&Event) + Send + Sync + 'static) {
        self.subscribers.write().push(Box::new(f));
    }

    /// Append one event, assigning it the next `eventId` for this process.
    /// The line (JSON object + trailing newline) is composed in memory and
    /// written with a single append so the write is line-atomic.
    pub fn append(
        &self,
        kind: EventKind,
        actor: impl Into<String>,
        task_id: Option<TaskId>,
    ) -> Result<Event, EventLoggerError> {
        let mut event = Event::new(&kind, actor, task_id);
        event.event_id = self.next_id.fetch_add(1, Ordering::SeqCst);
        event.timestamp = self.clock.utc_now();

        let mut line = serde_json::to_string(&event)?;
        line.push('\n');

        let path = self.today_path(&event);
        self.append_line(&path, &line)?;
        self.refresh_symlink(&path);

        for sub in self.subscribers.read().iter() {
            sub(&event);
        }
        Ok(event)
    }

    fn today_path(&self, event: &Event) -> PathBuf {
        self.events_dir.join(format!("{}.jsonl", event.timestamp.date_naive()))
    }

    fn append_line(&self, path: &Path, line: &str) -> Result<(), EventLoggerError> {
        std::fs::create_dir_all(&self.events_dir)
            .map_err(|e| io_err(&self.events_dir, e))?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| io_err(path, e))?;
        file.write_all(line.as_bytes()).map_err(|e| io_err(path, e))?;
        Ok(())
    }

    /// Point `events/events.jsonl` at today's file. Best-effort: failures
    /// (e.g. an unsupported filesystem) are logged and otherwise ignored,
    /// per spec §4.5 ("absence is tolerated").
    fn refresh_symlink(&self, target: &Path) {
        let link = self.events_dir.join("events.jsonl");
        let tmp = self.events_dir.join(format!(".events.jsonl.tmp-{}", std::process::id()));
        let file_name = target.file_name().unwrap_or_default();

        #[cfg(unix)]
        {
            if let Err(e) = std::os::unix::fs::symlink(file_name, &tmp) {
                tracing::warn!(error = %e, "failed to stage events.jsonl symlink");
                return;
            }
            if let Err(e) = std::fs::rename(&tmp, &link) {
                tracing::warn!(error = %e, "failed to swap events.jsonl symlink");
                let _ = std::fs::remove_file(&tmp);
            }
        }
        #[cfg(not(unix))]
        {
            let _ = (link, tmp, file_name);
        }
    }
}

fn io_err(path: &Path, source: std::io::Error) -> EventLoggerError {
    EventLoggerError::Io { path: path.display().to_string(), source }
}

#[cfg(test)]
#[path = "logger_tests.rs"]
mod tests;
