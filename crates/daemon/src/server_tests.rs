// SPDX-License-Identifier: MIT
// Copyright (c) 2026 aof contributors

use super::*;
use aof_core::FakeClock;
use tokio::io::AsyncReadExt as _;

async fn send(socket_path: &Path, request: &str) -> String {
    let mut stream = UnixStream::connect(socket_path).await.unwrap();
    stream.write_all(request.as_bytes()).await.unwrap();
    stream.shutdown().await.unwrap();
    let mut buf = String::new();
    let mut reader = stream;
    reader.read_to_string(&mut buf).await.unwrap();
    buf
}

#[tokio::test]
async fn healthz_returns_200_once_a_poll_has_succeeded() {
    let dir = tempfile::tempdir().unwrap();
    let clock = FakeClock::new();
    let store = Arc::new(TaskStore::open(dir.path(), clock.clone()).unwrap());
    let tracker = HealthTracker::new(dir.path().display().to_string(), 1000, 0);
    tracker.record_poll(clock.utc_now(), true);

    let socket_path = dir.path().join("daemon.sock");
    let server = HealthServer::bind(socket_path.clone(), store, tracker, clock).unwrap();
    let shutdown = CancellationToken::new();
    let token = shutdown.clone();
    let handle = tokio::spawn(server.run(token));

    let response = send(&socket_path, "GET /healthz HTTP/1.1\r\nHost: x\r\n\r\n").await;
    assert!(response.starts_with("HTTP/1.1 200"));
    assert!(response.contains("\"status\":\"ok\""));

    shutdown.cancel();
    handle.await.unwrap();
}

#[tokio::test]
async fn healthz_returns_503_before_any_poll() {
    let dir = tempfile::tempdir().unwrap();
    let clock = FakeClock::new();
    let store = Arc::new(TaskStore::open(dir.path(), clock.clone()).unwrap());
    let tracker = HealthTracker::new(dir.path().display().to_string(), 1000, 0);

    let socket_path = dir.path().join("daemon.sock");
    let server = HealthServer::bind(socket_path.clone(), store, tracker, clock).unwrap();
    let shutdown = CancellationToken::new();
    let token = shutdown.clone();
    let handle = tokio::spawn(server.run(token));

    let response = send(&socket_path, "GET /healthz HTTP/1.1\r\n\r\n").await;
    assert!(response.starts_with("HTTP/1.1 503"));

    shutdown.cancel();
    handle.await.unwrap();
}

#[tokio::test]
async fn status_reports_task_counts() {
    let dir = tempfile::tempdir().unwrap();
    let clock = FakeClock::new();
    let store = Arc::new(TaskStore::open(dir.path(), clock.clone()).unwrap());
    let tracker = HealthTracker::new(dir.path().display().to_string(), 1000, 0);
    tracker.record_poll(clock.utc_now(), true);

    let socket_path = dir.path().join("daemon.sock");
    let server = HealthServer::bind(socket_path.clone(), store, tracker, clock).unwrap();
    let shutdown = CancellationToken::new();
    let token = shutdown.clone();
    let handle = tokio::spawn(server.run(token));

    let response = send(&socket_path, "GET /status HTTP/1.1\r\n\r\n").await;
    assert!(response.starts_with("HTTP/1.1 200"));
    assert!(response.contains("\"taskCounts\""));

    shutdown.cancel();
    handle.await.unwrap();
}

#[tokio::test]
async fn unknown_routes_return_404() {
    let dir = tempfile::tempdir().unwrap();
    let clock = FakeClock::new();
    let store = Arc::new(TaskStore::open(dir.path(), clock.clone()).unwrap());
    let tracker = HealthTracker::new(dir.path().display().to_string(), 1000, 0);

    let socket_path = dir.path().join("daemon.sock");
    let server = HealthServer::bind(socket_path.clone(), store, tracker, clock).unwrap();
    let shutdown = CancellationToken::new();
    let token = shutdown.clone();
    let handle = tokio::spawn(server.run(token));

    let response = send(&socket_path, "GET /nope HTTP/1.1\r\n\r\n").await;
    assert!(response.starts_with("HTTP/1.1 404"));

    shutdown.cancel();
    handle.await.unwrap();
}

#[test]
fn bind_unlinks_a_stale_socket_left_behind() {
    let dir = tempfile::tempdir().unwrap();
    let clock = FakeClock::new();
    let store = Arc::new(TaskStore::open(dir.path(), clock.clone()).unwrap());
    let tracker = HealthTracker::new(dir.path().display().to_string(), 1000, 0);
    let socket_path = dir.path().join("daemon.sock");
    std::fs::write(&socket_path, b"stale").unwrap();

    HealthServer::bind(socket_path, store, tracker, clock).unwrap();
}
