// SPDX-License-Identifier: MIT
// Copyright (c) 2026 aof contributors

use super::*;
use crate::policy::NotificationPolicy;
use aof_core::SystemClock;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tempfile::tempdir;

const VALID_RULES: &str = "version: 1\nrules:\n  - match: {eventType: task.created}\n    channel: team-chat\n    template: \"created\"\n";
const VALID_RULES_V2: &str =
    "version: 1\nrules:\n  - match: {eventType: task.created}\n    channel: team-chat\n    template: \"created v2\"\n  - match: {eventType: task.blocked}\n    channel: team-chat\n    template: \"blocked\"\n";
const INVALID_RULES: &str = "not: valid: yaml: at: all\n";

async fn wait_until(mut check: impl FnMut() -> bool) -> bool {
    for _ in 0..50 {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    false
}

#[tokio::test]
async fn reloads_the_rule_list_on_file_write() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("notification-rules.yaml");
    std::fs::write(&path, VALID_RULES).unwrap();

    let policy = Arc::new(NotificationPolicy::new(rule::parse_rules(VALID_RULES).unwrap(), 300_000, SystemClock));
    let errors: Arc<Mutex<Vec<NotifyError>>> = Arc::new(Mutex::new(Vec::new()));
    let errors_clone = errors.clone();
    let _watcher = watch(&path, policy.clone(), move |e| errors_clone.lock().push(e)).unwrap();

    std::fs::write(&path, VALID_RULES_V2).unwrap();
    let ok = wait_until(|| policy.rule_count() == 2).await;

    assert!(ok, "rule list never reloaded to the new 2-rule document");
    assert!(errors.lock().is_empty());
}

#[tokio::test]
async fn bad_reload_keeps_the_previous_rule_list_and_calls_on_error() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("notification-rules.yaml");
    std::fs::write(&path, VALID_RULES).unwrap();

    let policy = Arc::new(NotificationPolicy::new(rule::parse_rules(VALID_RULES).unwrap(), 300_000, SystemClock));
    let errors: Arc<Mutex<Vec<NotifyError>>> = Arc::new(Mutex::new(Vec::new()));
    let errors_clone = errors.clone();
    let _watcher = watch(&path, policy.clone(), move |e| errors_clone.lock().push(e)).unwrap();

    std::fs::write(&path, INVALID_RULES).unwrap();
    let ok = wait_until(|| !errors.lock().is_empty()).await;

    assert!(ok, "on_error was never called for the invalid reload");
    assert_eq!(policy.rule_count(), 1);
}
