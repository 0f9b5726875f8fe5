// SPDX-License-Identifier: MIT
// Copyright (c) 2026 aof contributors

//! The notification-rules schema (`<vault>/org/notification-rules.yaml`,
//! spec.md §6) and the pure rule-matching logic layered on top of it.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::NotifyError;

/// Event types always resolved to `critical` severity regardless of what
/// the matching rule declares (spec.md §4.7, "ALWAYS_CRITICAL membership").
/// Not configurable: these are the two event kinds whose whole point is to
/// interrupt someone (a runaway drift, or a task nobody is working on
/// anymore), so a misconfigured rules file can't quietly downgrade them.
pub const ALWAYS_CRITICAL: &[&str] = &["drift.detected", "lease.expired"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warn,
    Critical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Audience {
    Agent,
    TeamLead,
    Operator,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleMatch {
    pub event_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationRule {
    #[serde(rename = "match")]
    pub match_: RuleMatch,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<Severity>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub audience: Vec<Audience>,
    pub channel: String,
    pub template: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dedupe_window_ms: Option<i64>,
    #[serde(default)]
    pub never_suppress: bool,
}

impl NotificationRule {
    /// True if this rule's `match` fires for `event_type`/`payload`.
    pub fn matches(&self, event_type: &str, payload: &Value) -> bool {
        self.match_.event_type == event_type
            && self.match_.payload.as_ref().is_none_or(|want| is_json_subset(want, payload))
    }

    /// Severity this rule resolves to for an event of `event_type`, folding
    /// in `ALWAYS_CRITICAL` membership ahead of the rule's own declaration.
    pub fn resolved_severity(&self, event_type: &str) -> Severity {
        if ALWAYS_CRITICAL.contains(&event_type) {
            Severity::Critical
        } else {
            self.severity.unwrap_or(Severity::Info)
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
struct RawRuleSet {
    version: u32,
    #[serde(default)]
    rules: Vec<serde_yaml::Value>,
}

/// Parse and validate `<vault>/org/notification-rules.yaml`. The top-level
/// schema (missing `version`, not a mapping at all) is a hard failure; an
/// individual malformed rule entry is skipped with a `warn!`, per spec.md
/// §6 ("Invalid rules are skipped with a warning").
pub fn parse_rules(yaml: &str) -> Result<Vec<NotificationRule>, NotifyError> {
    let raw: RawRuleSet = serde_yaml::from_str(yaml)?;
    if raw.version != 1 {
        return Err(NotifyError::UnsupportedVersion(raw.version));
    }
    let mut rules = Vec::with_capacity(raw.rules.len());
    for (i, entry) in raw.rules.into_iter().enumerate() {
        match serde_yaml::from_value::<NotificationRule>(entry) {
            Ok(rule) => rules.push(rule),
            Err(e) => tracing::warn!(index = i, error = %e, "skipping invalid notification rule"),
        }
    }
    if rules.is_empty() {
        return Err(NotifyError::EmptyRuleSet);
    }
    Ok(rules)
}

fn is_json_subset(sub: &Value, sup: &Value) -> bool {
    match (sub, sup) {
        (Value::Object(sub_map), Value::Object(sup_map)) => sub_map
            .iter()
            .all(|(k, v)| sup_map.get(k).is_some_and(|sup_v| is_json_subset(v, sup_v))),
        _ => sub == sup,
    }
}

#[cfg(test)]
#[path = "rule_tests.rs"]
mod tests;
