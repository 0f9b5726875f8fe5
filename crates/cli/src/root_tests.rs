// SPDX-License-Identifier: MIT
// Copyright (c) 2026 aof contributors

use super::*;
use serial_test::serial;

#[test]
#[serial]
fn resolve_root_prefers_the_explicit_flag_over_the_env_var() {
    std::env::set_var("AOF_ROOT", "/from/env");
    let root = resolve_root(Some(PathBuf::from("/from/flag"))).unwrap();
    assert_eq!(root, PathBuf::from("/from/flag"));
    std::env::remove_var("AOF_ROOT");
}

#[test]
#[serial]
fn resolve_root_falls_back_to_the_env_var() {
    std::env::remove_var("AOF_ROOT");
    std::env::set_var("AOF_ROOT", "/from/env");
    let root = resolve_root(None).unwrap();
    assert_eq!(root, PathBuf::from("/from/env"));
    std::env::remove_var("AOF_ROOT");
}

#[test]
#[serial]
fn resolve_root_fails_with_neither() {
    std::env::remove_var("AOF_ROOT");
    assert!(matches!(resolve_root(None), Err(CliError::MissingRoot)));
}

#[test]
fn parse_priority_accepts_any_case() {
    assert_eq!(parse_priority("HIGH").unwrap(), aof_core::Priority::High);
    assert_eq!(parse_priority("Normal").unwrap(), aof_core::Priority::Normal);
    assert!(parse_priority("urgent").is_err());
}

#[test]
fn parse_status_round_trips_every_dir_name() {
    for status in aof_core::TaskStatus::ALL {
        assert_eq!(parse_status(status.dir_name()).unwrap(), status);
    }
    assert!(parse_status("nonexistent").is_err());
}
