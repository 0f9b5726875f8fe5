// SPDX-License-Identifier: MIT
// Copyright (c) 2026 aof contributors

//! `NotificationPolicy`: rule matching, severity resolution, dedupe window,
//! and template rendering for one event (spec.md §4.7).

use std::collections::HashMap;

use aof_core::{Clock, Event, TaskId};
use parking_lot::{Mutex, RwLock};

use crate::channel::NotificationMessage;
use crate::rule::{NotificationRule, Severity};
use crate::template;

/// `(taskId ?? "global", eventType)`, the dedupe key spec.md §4.7 defines.
type DedupeKey = (String, String);

pub struct NotificationPolicy<C: Clock> {
    rules: RwLock<Vec<NotificationRule>>,
    default_dedupe_window_ms: i64,
    last_sent: Mutex<HashMap<DedupeKey, chrono::DateTime<chrono::Utc>>>,
    clock: C,
}

impl<C: Clock> NotificationPolicy<C> {
    pub fn new(rules: Vec<NotificationRule>, default_dedupe_window_ms: i64, clock: C) -> Self {
        Self { rules: RwLock::new(rules), default_dedupe_window_ms, last_sent: Mutex::new(HashMap::new()), clock }
    }

    /// Atomically replace the rule list (used by the hot-reload watcher).
    pub fn set_rules(&self, rules: Vec<NotificationRule>) {
        *self.rules.write() = rules;
    }

    pub fn rule_count(&self) -> usize {
        self.rules.read().len()
    }

    /// Evaluate `event` against the current rule list. Returns `None` if no
    /// rule matches or the match is suppressed by dedupe.
    pub fn evaluate(&self, event: &Event) -> Option<NotificationMessage> {
        let rules = self.rules.read();
        let rule = rules.iter().find(|r| r.matches(&event.event_type, &event.payload))?;
        let severity = rule.resolved_severity(&event.event_type);

        if !self.should_send(rule, severity, &event.task_id, &event.event_type) {
            return None;
        }

        let text = template::render(&rule.template, event.task_id.as_ref().map(TaskId::as_str), &event.actor, &event.payload);
        Some(NotificationMessage { channel: rule.channel.clone(), text, event_type: event.event_type.clone() })
    }

    fn should_send(&self, rule: &NotificationRule, severity: Severity, task_id: &Option<TaskId>, event_type: &str) -> bool {
        if rule.never_suppress || severity == Severity::Critical {
            return true;
        }
        let window_ms = rule.dedupe_window_ms.unwrap_or(self.default_dedupe_window_ms);
        if window_ms == 0 {
            return true;
        }
        let key = dedupe_key(task_id, event_type);
        let now = self.clock.utc_now();
        let mut last_sent = self.last_sent.lock();
        let suppressed = last_sent
            .get(&key)
            .is_some_and(|last| now - *last < chrono::Duration::milliseconds(window_ms));
        if suppressed {
            return false;
        }
        last_sent.insert(key, now);
        true
    }
}

fn dedupe_key(task_id: &Option<TaskId>, event_type: &str) -> DedupeKey {
    (task_id.as_ref().map(|id| id.as_str().to_string()).unwrap_or_else(|| "global".to_string()), event_type.to_string())
}

#[cfg(test)]
#[path = "policy_tests.rs"]
mod tests;
