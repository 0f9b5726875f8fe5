// SPDX-License-Identifier: MIT
// Copyright (c) 2026 aof contributors

//! `{taskId}`/`{actor}`/payload-field substitution for `NotificationRule::template`
//! (spec.md §4.7 step 4). Deliberately not a full templating engine: the
//! grammar is "replace a literal `{name}` token", nothing more.

use serde_json::Value;

pub fn render(template: &str, task_id: Option<&str>, actor: &str, payload: &Value) -> String {
    let mut out = template.replace("{taskId}", task_id.unwrap_or("-")).replace("{actor}", actor);
    if let Value::Object(fields) = payload {
        for (key, value) in fields {
            out = out.replace(&format!("{{{key}}}"), &scalar_to_string(value));
        }
    }
    out
}

fn scalar_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
#[path = "template_tests.rs"]
mod tests;
