// SPDX-License-Identifier: MIT
// Copyright (c) 2026 aof contributors

use super::*;

#[test]
fn build_acquires_the_vault_lock_and_exposes_an_unhealthy_tracker() {
    let dir = tempfile::tempdir().unwrap();
    let (daemon, _server) = Daemon::build(dir.path().to_path_buf()).unwrap();
    assert_eq!(daemon.root(), dir.path());
    assert!(!daemon.tracker().is_healthy());
}

#[test]
fn a_second_build_against_the_same_root_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let (_daemon, _server) = Daemon::build(dir.path().to_path_buf()).unwrap();
    let second = Daemon::build(dir.path().to_path_buf());
    assert!(matches!(second, Err(DaemonError::AlreadyRunning(_))));
}

#[tokio::test]
async fn tick_murmur_is_a_no_op_against_an_empty_vault() {
    let dir = tempfile::tempdir().unwrap();
    let (daemon, _server) = Daemon::build(dir.path().to_path_buf()).unwrap();
    daemon.tick_murmur().await;
}
