// SPDX-License-Identifier: MIT
// Copyright (c) 2026 aof contributors

//! `aof daemon` — start/stop/status plus adjunct service-file generation
//! (spec.md §6, "Host supervision"). There is no command RPC to a running
//! `aofd`, only its read-only health socket, so `start`/`stop` manage the
//! OS process directly rather than talking a control protocol, grounded in
//! the teacher's `find_ojd_binary`/`std::process::Command` pattern.

use std::io::{Read, Write};
use std::os::unix::net::UnixStream;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Args, Subcommand};

use crate::error::ExitError;
use crate::output::{format_or_json, OutputFormat};

#[derive(Args)]
pub struct DaemonArgs {
    #[command(subcommand)]
    pub command: DaemonCommand,
}

#[derive(Subcommand)]
pub enum DaemonCommand {
    /// Start `aofd` in the background against this vault
    Start,
    /// Stop the running `aofd` for this vault
    Stop,
    /// Query the health socket for liveness and task counts
    Status,
    /// Print a systemd unit pointing at this vault (writes nothing)
    Install,
    /// Print the `systemctl` commands to remove that unit
    Uninstall,
}

pub async fn run(args: DaemonArgs, root: &Path, format: OutputFormat) -> Result<Option<String>, ExitError> {
    match args.command {
        DaemonCommand::Start => start(root),
        DaemonCommand::Stop => stop(root),
        DaemonCommand::Status => status(root, format),
        DaemonCommand::Install => Ok(Some(install(root))),
        DaemonCommand::Uninstall => Ok(Some(uninstall())),
    }
}

fn start(root: &Path) -> Result<Option<String>, ExitError> {
    let paths = aof_store::VaultPaths::new(root);
    if socket_responds(&paths.socket_path()) {
        return Ok(Some(format!("aofd already running for {}", root.display())));
    }

    let binary = find_aofd_binary();
    let logs_dir = root.join("logs");
    std::fs::create_dir_all(&logs_dir).map_err(|e| ExitError::new(1, format!("could not create {}: {e}", logs_dir.display())))?;
    let stdout = std::fs::File::create(logs_dir.join("daemon-stdout.log"))
        .map_err(|e| ExitError::new(1, format!("could not open daemon-stdout.log: {e}")))?;
    let stderr = std::fs::File::create(logs_dir.join("daemon-stderr.log"))
        .map_err(|e| ExitError::new(1, format!("could not open daemon-stderr.log: {e}")))?;

    std::process::Command::new(&binary)
        .arg("--root")
        .arg(root)
        .stdin(std::process::Stdio::null())
        .stdout(stdout)
        .stderr(stderr)
        .spawn()
        .map_err(|e| ExitError::new(1, format!("could not spawn {}: {e}", binary.display())))?;

    for _ in 0..20 {
        if socket_responds(&paths.socket_path()) {
            return Ok(Some(format!("aofd started for {}", root.display())));
        }
        std::thread::sleep(Duration::from_millis(100));
    }
    Err(ExitError::new(1, "aofd did not come up within 2s (check logs/daemon-stderr.log)"))
}

fn stop(root: &Path) -> Result<Option<String>, ExitError> {
    let paths = aof_store::VaultPaths::new(root);
    let pid = match std::fs::read_to_string(paths.pid_path()) {
        Ok(raw) => raw.trim().parse::<u32>().ok(),
        Err(_) => None,
    };
    let Some(pid) = pid else {
        return Ok(Some(format!("aofd not running for {}", root.display())));
    };

    let status = std::process::Command::new("kill")
        .arg("-TERM")
        .arg(pid.to_string())
        .status()
        .map_err(|e| ExitError::new(1, format!("could not signal pid {pid}: {e}")))?;
    if !status.success() {
        return Ok(Some(format!("aofd not running for {}", root.display())));
    }
    Ok(Some(format!("aofd (pid {pid}) stopped")))
}

fn status(root: &Path, format: OutputFormat) -> Result<Option<String>, ExitError> {
    let paths = aof_store::VaultPaths::new(root);
    match read_status(&paths.socket_path()) {
        Some(body) => {
            let value: serde_json::Value = serde_json::from_str(&body)
                .map_err(|e| ExitError::new(1, format!("health socket returned malformed JSON: {e}")))?;
            format_or_json(format, &value, || {
                let status = value.get("status").and_then(|v| v.as_str()).unwrap_or("unknown");
                let uptime = value.get("uptime").and_then(|v| v.as_u64()).unwrap_or(0);
                println!("status: {status}");
                println!("uptime: {uptime}s");
                if let Some(counts) = value.get("taskCounts") {
                    println!("tasks:  {counts}");
                }
            })
            .map_err(|e| ExitError::new(1, e.to_string()))?;
            Ok(None)
        }
        None => Err(ExitError::new(1, format!("aofd not running for {}", root.display()))),
    }
}

fn install(root: &Path) -> String {
    let binary = find_aofd_binary();
    format!(
        "[Unit]\nDescription=aof orchestration daemon ({root})\nAfter=network.target\n\n\
         [Service]\nExecStart={binary} --root {root}\nStandardOutput=append:{root}/logs/daemon-stdout.log\n\
         StandardError=append:{root}/logs/daemon-stderr.log\nRestart=on-failure\n\n\
         [Install]\nWantedBy=multi-user.target\n",
        root = root.display(),
        binary = binary.display(),
    )
}

fn uninstall() -> String {
    "systemctl disable --now aofd.service\nrm /etc/systemd/system/aofd.service\nsystemctl daemon-reload".to_string()
}

/// Send a bare HTTP/1.x `GET /status` over the health socket and return the
/// response body, or `None` if nothing is listening.
fn read_status(socket_path: &Path) -> Option<String> {
    let mut stream = UnixStream::connect(socket_path).ok()?;
    stream.write_all(b"GET /status HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n").ok()?;
    let mut raw = String::new();
    stream.read_to_string(&mut raw).ok()?;
    let (_headers, body) = raw.split_once("\r\n\r\n")?;
    Some(body.to_string())
}

fn socket_responds(socket_path: &Path) -> bool {
    UnixStream::connect(socket_path).is_ok()
}

/// Look for `aofd` next to the running `aof` binary, falling back to `PATH`.
fn find_aofd_binary() -> PathBuf {
    if let Ok(exe) = std::env::current_exe() {
        if let Some(dir) = exe.parent() {
            let sibling = dir.join("aofd");
            if sibling.exists() {
                return sibling;
            }
        }
    }
    PathBuf::from("aofd")
}

#[cfg(test)]
#[path = "daemon_tests.rs"]
mod tests;
