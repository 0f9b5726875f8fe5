// SPDX-License-Identifier: MIT
// Copyright (c) 2026 aof contributors

//! Health service: a Unix-domain-socket HTTP server exposing `GET /healthz`
//! and `GET /status` (spec.md §4.8, §6).
//!
//! No HTTP framework — neither the teacher nor the rest of the workspace
//! pulls one in for a two-route, request/response-per-connection surface,
//! so this reads and writes the wire bytes directly over
//! `tokio::net::UnixListener`, grounded in the teacher's own
//! `listener::handle_connection` accept loop (spawn one task per
//! connection, race it against the shutdown signal, log and move on).

use std::path::{Path, PathBuf};
use std::sync::Arc;

use aof_core::Clock;
use aof_store::TaskStore;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{UnixListener, UnixStream};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::error::DaemonError;
use crate::health::HealthTracker;

pub struct HealthServer<C: Clock> {
    listener: UnixListener,
    socket_path: PathBuf,
    store: Arc<TaskStore<C>>,
    tracker: Arc<HealthTracker>,
    clock: C,
}

impl<C: Clock + 'static> HealthServer<C> {
    /// Binds `socket_path`, unlinking any stale socket left behind by a
    /// previous, uncleanly-terminated process first.
    pub fn bind(
        socket_path: PathBuf,
        store: Arc<TaskStore<C>>,
        tracker: Arc<HealthTracker>,
        clock: C,
    ) -> Result<Self, DaemonError> {
        if socket_path.exists() {
            std::fs::remove_file(&socket_path)?;
        }
        let listener = UnixListener::bind(&socket_path).map_err(|source| DaemonError::BindFailed {
            path: socket_path.display().to_string(),
            source,
        })?;
        Ok(Self { listener, socket_path, store, tracker, clock })
    }

    /// Accept loop, one spawned task per connection, until `shutdown` fires.
    pub async fn run(self, shutdown: CancellationToken) {
        info!(path = %self.socket_path.display(), "health service listening");
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    debug!("health service accept loop stopping");
                    break;
                }
                result = self.listener.accept() => {
                    match result {
                        Ok((stream, _)) => {
                            let store = Arc::clone(&self.store);
                            let tracker = Arc::clone(&self.tracker);
                            let clock = self.clock.clone();
                            tokio::spawn(async move {
                                if let Err(e) = handle_connection(stream, &store, &tracker, &clock).await {
                                    warn!(error = %e, "health connection error");
                                }
                            });
                        }
                        Err(e) => error!(error = %e, "health socket accept error"),
                    }
                }
            }
        }
        let _ = std::fs::remove_file(&self.socket_path);
    }
}

async fn handle_connection<C: Clock>(
    mut stream: UnixStream,
    store: &TaskStore<C>,
    tracker: &HealthTracker,
    clock: &C,
) -> std::io::Result<()> {
    let request_line = read_request_line(&mut stream).await?;
    let Some(path) = parse_path(&request_line) else {
        return write_response(&mut stream, 400, "{\"error\":\"bad request\"}").await;
    };

    match path.as_str() {
        "/healthz" => {
            if tracker.is_healthy() {
                write_response(&mut stream, 200, "{\"status\":\"ok\"}").await
            } else {
                write_response(&mut stream, 503, "{\"status\":\"error\"}").await
            }
        }
        "/status" => {
            let snapshot = tracker.snapshot(store, clock);
            let body = serde_json::to_string(&snapshot).unwrap_or_else(|_| "{\"error\":\"encode\"}".to_string());
            let healthy = matches!(snapshot.status, crate::health::Overall::Healthy);
            write_response(&mut stream, if healthy { 200 } else { 503 }, &body).await
        }
        _ => write_response(&mut stream, 404, "{\"error\":\"not found\"}").await,
    }
}

/// Reads and discards headers up to the blank line, returning the request
/// line (`"GET /healthz HTTP/1.1"`). Bodies are never expected on these
/// routes, so nothing beyond the header block is read.
async fn read_request_line(stream: &mut UnixStream) -> std::io::Result<String> {
    let mut buf = Vec::with_capacity(512);
    let mut byte = [0u8; 1];
    loop {
        let n = stream.read(&mut byte).await?;
        if n == 0 {
            break;
        }
        buf.push(byte[0]);
        if buf.ends_with(b"\r\n\r\n") || buf.len() > 8192 {
            break;
        }
    }
    let text = String::from_utf8_lossy(&buf);
    Ok(text.lines().next().unwrap_or_default().to_string())
}

fn parse_path(request_line: &str) -> Option<String> {
    let mut parts = request_line.split_whitespace();
    let method = parts.next()?;
    if method != "GET" {
        return None;
    }
    parts.next().map(|p| p.to_string())
}

async fn write_response(stream: &mut UnixStream, status: u16, body: &str) -> std::io::Result<()> {
    let reason = match status {
        200 => "OK",
        400 => "Bad Request",
        404 => "Not Found",
        503 => "Service Unavailable",
        _ => "Error",
    };
    let response = format!(
        "HTTP/1.1 {status} {reason}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    );
    stream.write_all(response.as_bytes()).await?;
    stream.shutdown().await
}

pub fn unlink_stale_socket(path: &Path) -> std::io::Result<()> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
#[path = "server_tests.rs"]
mod tests;
