// SPDX-License-Identifier: MIT
// Copyright (c) 2026 aof contributors

//! `WarmAggregator`: rule-driven, incremental reduction of cold JSONL events
//! into size-bounded Markdown documents under `warm/<rule-id>/...` (spec
//! §4.6). Each rule tracks its own high-water-mark and its own accumulated
//! rendering state; the aggregator's job is only to find new cold events,
//! hand them to the rule, and write the result if it changed.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use aof_core::{ErrorKind, Event, HasErrorKind};
use chrono::NaiveDate;
use parking_lot::Mutex;

/// Warm documents are capped at 150 KiB (spec §3, §4.6).
pub const MAX_WARM_DOC_BYTES: usize = 150 * 1024;

#[derive(Debug, thiserror::Error)]
pub enum AggregatorError {
    #[error("io error at {path}: {source}")]
    Io { path: String, #[source] source: std::io::Error },
    #[error("cold log line at {path}:{line} is not valid JSON: {source}")]
    MalformedLine { path: String, line: usize, #[source] source: serde_json::Error },
}

impl HasErrorKind for AggregatorError {
    fn error_kind(&self) -> ErrorKind {
        match self {
            AggregatorError::Io { .. } => ErrorKind::FatalIo,
            AggregatorError::MalformedLine { .. } => ErrorKind::Validation,
        }
    }
}

/// A rule consumes newly-observed events (in eventId order, within a single
/// call always from a single day's file) and renders the full current
/// document. Rules own whatever accumulator state they need to do that
/// incrementally; the aggregator never replays history into them.
pub trait WarmRule: Send + Sync {
    fn id(&self) -> &str;

    /// Path under `warm/`, e.g. `"status-summary.md"`.
    fn output_path(&self) -> &str;

    fn filter(&self, event: &Event) -> bool;

    /// Fold `new_events` (already filtered) into this rule's state and
    /// return the full rendered document text.
    fn ingest(&self, new_events: &[Event]) -> String;
}

/// Outcome of running one rule during a single `run()` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// No new cold events since the last run; nothing was rewritten.
    Unchanged,
    /// The rendered document changed and was written to disk.
    Updated,
    /// Rejected: the rendered document exceeded [`MAX_WARM_DOC_BYTES`]. The
    /// rule's high-water-mark still advances so the same event isn't
    /// reprocessed forever; the previous on-disk document (if any) is left
    /// untouched.
    Rejected,
}

struct Cursor {
    date: NaiveDate,
    event_id: u64,
}

impl Cursor {
    const EPOCH: Self = Cursor { date: NaiveDate::MIN, event_id: 0 };

    fn is_after(&self, date: NaiveDate, event_id: u64) -> bool {
        (date, event_id) > (self.date, self.event_id)
    }
}

pub struct WarmAggregator {
    events_dir: PathBuf,
    cold_dir: PathBuf,
    warm_dir: PathBuf,
    rules: Vec<Box<dyn WarmRule>>,
    cursors: Mutex<BTreeMap<String, Cursor>>,
}

impl WarmAggregator {
    pub fn new(vault_root: impl Into<PathBuf>, rules: Vec<Box<dyn WarmRule>>) -> Self {
        let root = vault_root.into();
        Self {
            events_dir: root.join("events"),
            cold_dir: root.join("cold"),
            warm_dir: root.join("warm"),
            rules,
            cursors: Mutex::new(BTreeMap::new()),
        }
    }

    /// Run every rule once. A failure in one rule (budget, malformed line)
    /// never aborts the others (spec §4.6, §7).
    pub fn run(&self) -> Vec<(String, Result<RunOutcome, AggregatorError>)> {
        let files = match self.sorted_cold_files() {
            Ok(files) => files,
            Err(e) => return self.rules.iter().map(|r| (r.id().to_string(), Err(clone_io_err(&e)))).collect(),
        };

        self.rules.iter().map(|rule| (rule.id().to_string(), self.run_one(rule.as_ref(), &files))).collect()
    }

    fn run_one(&self, rule: &dyn WarmRule, files: &[(NaiveDate, PathBuf)]) -> Result<RunOutcome, AggregatorError> {
        let start = {
            let mut cursors = self.cursors.lock();
            cursors.entry(rule.id().to_string()).or_insert(Cursor::EPOCH).date
        };

        let mut new_events = Vec::new();
        let mut max_seen: Option<(NaiveDate, u64)> = None;
        for (date, path) in files.iter().filter(|(d, _)| *d >= start) {
            for event in read_events(path)? {
                let after = {
                    let cursors = self.cursors.lock();
                    cursors.get(rule.id()).map(|c| c.is_after(*date, event.event_id)).unwrap_or(true)
                };
                if !after {
                    continue;
                }
                max_seen = Some(match max_seen {
                    Some((d, i)) if (d, i) >= (*date, event.event_id) => (d, i),
                    _ => (*date, event.event_id),
                });
                if rule.filter(&event) {
                    new_events.push(event);
                }
            }
        }

        if let Some((date, event_id)) = max_seen {
            self.cursors.lock().insert(rule.id().to_string(), Cursor { date, event_id });
        }

        let rendered = rule.ingest(&new_events);
        if rendered.len() > MAX_WARM_DOC_BYTES {
            return Ok(RunOutcome::Rejected);
        }

        let out_path = self.warm_dir.join(rule.output_path());
        if let Some(existing) = read_if_exists(&out_path)? {
            if existing == rendered {
                return Ok(RunOutcome::Unchanged);
            }
        } else if new_events.is_empty() && max_seen.is_none() {
            return Ok(RunOutcome::Unchanged);
        }

        write_warm_doc(&out_path, &rendered)?;
        Ok(RunOutcome::Updated)
    }

    fn sorted_cold_files(&self) -> Result<Vec<(NaiveDate, PathBuf)>, AggregatorError> {
        let mut files = BTreeMap::new();
        for dir in [&self.events_dir, &self.cold_dir] {
            if !dir.exists() {
                continue;
            }
            let entries = std::fs::read_dir(dir).map_err(|e| io_err(dir, e))?;
            for entry in entries {
                let entry = entry.map_err(|e| io_err(dir, e))?;
                let path = entry.path();
                if path.extension().and_then(|e| e.to_str()) != Some("jsonl") {
                    continue;
                }
                let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else { continue };
                let Ok(date) = NaiveDate::parse_from_str(stem, "%Y-%m-%d") else { continue };
                files.insert(date, path);
            }
        }
        Ok(files.into_iter().collect())
    }
}

fn read_events(path: &Path) -> Result<Vec<Event>, AggregatorError> {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(io_err(path, e)),
    };
    raw.lines()
        .enumerate()
        .filter(|(_, l)| !l.trim().is_empty())
        .map(|(i, line)| {
            serde_json::from_str(line).map_err(|e| AggregatorError::MalformedLine {
                path: path.display().to_string(),
                line: i + 1,
                source: e,
            })
        })
        .collect()
}

fn read_if_exists(path: &Path) -> Result<Option<String>, AggregatorError> {
    match std::fs::read_to_string(path) {
        Ok(s) => Ok(Some(s)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(io_err(path, e)),
    }
}

fn write_warm_doc(path: &Path, contents: &str) -> Result<(), AggregatorError> {
    // Allow expect here as out_path is always warm_dir.join(...), which always has a parent
    #[allow(clippy::expect_used)]
    let parent = path.parent().expect("warm doc path always has a parent");
    std::fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
    let tmp = parent.join(format!(".{}.tmp-{}", path.file_name().unwrap_or_default().to_string_lossy(), std::process::id()));
    std::fs::write(&tmp, contents).map_err(|e| io_err(&tmp, e))?;
    std::fs::rename(&tmp, path).map_err(|e| io_err(path, e))?;
    Ok(())
}

fn io_err(path: &Path, source: std::io::Error) -> AggregatorError {
    AggregatorError::Io { path: path.display().to_string(), source }
}

fn clone_io_err(e: &AggregatorError) -> AggregatorError {
    match e {
        AggregatorError::Io { path, source } => {
            AggregatorError::Io { path: path.clone(), source: std::io::Error::new(source.kind(), source.to_string()) }
        }
        other => io_err(Path::new(""), std::io::Error::other(other.to_string())),
    }
}

/// Built-in rule: renders the most recent `task.transitioned { to: "done" }`
/// events (newest first, capped) as a Markdown list.
pub struct RecentCompletionsRule {
    cap: usize,
    seen: Mutex<Vec<Event>>,
}

impl RecentCompletionsRule {
    pub fn new(cap: usize) -> Self {
        Self { cap, seen: Mutex::new(Vec::new()) }
    }
}

impl WarmRule for RecentCompletionsRule {
    fn id(&self) -> &str {
        "recent-completions"
    }

    fn output_path(&self) -> &str {
        "recent-completions.md"
    }

    fn filter(&self, event: &Event) -> bool {
        event.event_type == "task.transitioned" && event.payload.get("to").and_then(|v| v.as_str()) == Some("done")
    }

    fn ingest(&self, new_events: &[Event]) -> String {
        let mut seen = self.seen.lock();
        seen.extend_from_slice(new_events);
        seen.sort_by(|a, b| b.event_id.cmp(&a.event_id).then(a.timestamp.cmp(&b.timestamp).reverse()));
        seen.truncate(self.cap);

        let mut out = String::from("# Recent completions\n\n");
        for event in seen.iter() {
            let task_id = event.task_id.as_ref().map(|t| t.to_string()).unwrap_or_else(|| "?".to_string());
            out.push_str(&format!("- {} `{}`\n", event.timestamp.to_rfc3339(), task_id));
        }
        out
    }
}

/// Built-in rule: maintains a running tally of `task.transitioned` events by
/// target status.
pub struct StatusSummaryRule {
    counts: Mutex<BTreeMap<String, u64>>,
}

impl StatusSummaryRule {
    pub fn new() -> Self {
        Self { counts: Mutex::new(BTreeMap::new()) }
    }
}

impl Default for StatusSummaryRule {
    fn default() -> Self {
        Self::new()
    }
}

impl WarmRule for StatusSummaryRule {
    fn id(&self) -> &str {
        "status-summary"
    }

    fn output_path(&self) -> &str {
        "status-summary.md"
    }

    fn filter(&self, event: &Event) -> bool {
        event.event_type == "task.transitioned" || event.event_type == "task.created"
    }

    fn ingest(&self, new_events: &[Event]) -> String {
        let mut counts = self.counts.lock();
        for event in new_events {
            let status = if event.event_type == "task.created" {
                "backlog".to_string()
            } else {
                event.payload.get("to").and_then(|v| v.as_str()).unwrap_or("unknown").to_string()
            };
            *counts.entry(status).or_insert(0) += 1;
        }

        let mut out = String::from("# Status summary\n\n");
        for (status, n) in counts.iter() {
            out.push_str(&format!("- {status}: {n}\n"));
        }
        out
    }
}

#[cfg(test)]
#[path = "warm_tests.rs"]
mod tests;
