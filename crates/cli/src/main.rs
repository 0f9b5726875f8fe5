// SPDX-License-Identifier: MIT
// Copyright (c) 2026 aof contributors

//! `aof`: the vault-local CLI over `daemon`/`task`/`org`/`notifications`.
//! Every subcommand converges on [`error::ExitError`] so this file has the
//! only `std::process::exit` call in the crate.

mod commands;
mod error;
mod output;
mod root;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use error::ExitError;
use output::OutputFormat;

#[derive(Parser)]
#[command(name = "aof", about = "Agent orchestration over a plain-text vault")]
struct Cli {
    /// Vault root. Falls back to AOF_ROOT if not given.
    #[arg(long, global = true)]
    root: Option<PathBuf>,
    #[arg(long, value_enum, default_value = "text", global = true)]
    format: OutputFormat,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    Daemon(commands::daemon::DaemonArgs),
    Task(commands::task::TaskArgs),
    Org(commands::org::OrgArgs),
    Notifications(commands::notifications::NotificationsArgs),
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let outcome = run(cli).await;
    match outcome {
        Ok(Some(message)) => println!("✅ {message}"),
        Ok(None) => {}
        Err(e) => {
            eprintln!("❌ {e}");
            std::process::exit(e.code);
        }
    }
}

async fn run(cli: Cli) -> Result<Option<String>, ExitError> {
    let root = root::resolve_root(cli.root)?;
    match cli.command {
        Command::Daemon(args) => commands::daemon::run(args, &root, cli.format).await,
        Command::Task(args) => commands::task::run(args, &root, cli.format).await,
        Command::Org(args) => commands::org::run(args, &root, cli.format).await,
        Command::Notifications(args) => commands::notifications::run(args, &root).await,
    }
}
