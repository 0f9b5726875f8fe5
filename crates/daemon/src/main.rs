// SPDX-License-Identifier: MIT
// Copyright (c) 2026 aof contributors

//! `aofd`: background process owning the poll loop, event log, and health
//! service. Started and supervised by the `aof` CLI (spec.md §6); not meant
//! to be run interactively.

use tokio::signal::unix::{signal, SignalKind};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use aof_daemon::{env, Daemon};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = std::env::args().collect();
    if let Some(arg) = args.get(1) {
        match arg.as_str() {
            "--version" | "-V" => {
                println!("aofd {}", env!("CARGO_PKG_VERSION"));
                return Ok(());
            }
            "--help" | "-h" => {
                print_help();
                return Ok(());
            }
            _ => {}
        }
    }

    let root = match env::resolve_root(&args[1..]) {
        Ok(root) => root,
        Err(e) => {
            eprintln!("error: {e}");
            eprintln!("usage: aofd --root <vault> (or set AOF_ROOT)");
            std::process::exit(2);
        }
    };

    let log_path = env::daemon_log_path(&root);
    let _log_guard = setup_logging(&log_path)?;

    info!(root = %root.display(), "starting aofd");

    let (daemon, server) = match Daemon::build(root.clone()) {
        Ok(pair) => pair,
        Err(e) => {
            error!(error = %e, "failed to start daemon");
            eprintln!("error: {e}");
            std::process::exit(1);
        }
    };

    let tracker = daemon.tracker();
    let shutdown = CancellationToken::new();

    let server_shutdown = shutdown.clone();
    let server_task = tokio::spawn(server.run(server_shutdown));

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    let daemon_shutdown = shutdown.clone();
    let daemon_task = tokio::spawn(daemon.run(daemon_shutdown));

    tokio::select! {
        _ = sigterm.recv() => info!("received SIGTERM, shutting down"),
        _ = sigint.recv() => info!("received SIGINT, shutting down"),
    }

    tracker.set_shutting_down(true);
    shutdown.cancel();
    let _ = daemon_task.await;
    let _ = server_task.await;
    info!("aofd stopped");
    Ok(())
}

fn print_help() {
    println!("aofd {}", env!("CARGO_PKG_VERSION"));
    println!("Background process for the agent orchestration framework.");
    println!();
    println!("USAGE:");
    println!("    aofd --root <vault>");
    println!();
    println!("    The vault root may also be given via the AOF_ROOT environment");
    println!("    variable. aofd is normally started by the `aof daemon start`");
    println!("    CLI command rather than invoked directly.");
    println!();
    println!("OPTIONS:");
    println!("    -h, --help       Print help information");
    println!("    -V, --version    Print version information");
}

fn setup_logging(log_path: &std::path::Path) -> Result<tracing_appender::non_blocking::WorkerGuard, std::io::Error> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    if let Some(parent) = log_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let dir = log_path.parent().unwrap_or_else(|| std::path::Path::new("."));
    let file_name = log_path.file_name().unwrap_or_else(|| std::ffi::OsStr::new("daemon.log"));
    let file_appender = tracing_appender::rolling::never(dir, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry().with(filter).with(fmt::layer().with_writer(non_blocking)).init();

    Ok(guard)
}
