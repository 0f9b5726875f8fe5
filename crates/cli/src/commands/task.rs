// SPDX-License-Identifier: MIT
// Copyright (c) 2026 aof contributors

//! `aof task` — create/update/block/unblock/dispatch/complete/list. No
//! control-plane RPC is documented between `aof` and a running `aofd`
//! (only the read-only health socket is), so these commands mutate the
//! vault directly through `aof-store`/`aof-workflow`, the same surface the
//! daemon itself uses, and append the matching events to the same log.

use std::collections::BTreeSet;
use std::path::Path;

use aof_core::{EventKind, Routing, TaskStatus};
use aof_store::NewTask;
use aof_workflow::GateEngine;
use clap::{Args, Subcommand};

use crate::error::{CliError, ExitError};
use crate::output::{handle_list, OutputFormat};
use crate::root::{current_actor, parse_priority, parse_status, priority_label, Vault};

#[derive(Args)]
pub struct TaskArgs {
    #[command(subcommand)]
    pub command: TaskCommand,
}

#[derive(Subcommand)]
pub enum TaskCommand {
    /// Create a new task in `backlog`
    Create {
        #[arg(long)]
        project: String,
        #[arg(long)]
        title: String,
        #[arg(long, default_value = "normal")]
        priority: String,
        #[arg(long)]
        agent: Option<String>,
        #[arg(long)]
        workflow: Option<String>,
        #[arg(long = "tag")]
        tags: Vec<String>,
        #[arg(long = "depends-on")]
        depends_on: Vec<String>,
        #[arg(long, default_value = "")]
        body: String,
        #[arg(long)]
        by: Option<String>,
    },
    /// Transition status and/or edit the dependency set
    Update {
        id: String,
        #[arg(long)]
        status: Option<String>,
        #[arg(long = "add-dep")]
        add_dep: Vec<String>,
        #[arg(long = "remove-dep")]
        remove_dep: Vec<String>,
    },
    /// Move a task to `blocked`
    Block {
        id: String,
        #[arg(long)]
        reason: String,
    },
    /// Return a blocked task to its prior status
    Unblock { id: String },
    /// Promote a `backlog`/`blocked` task to `ready`
    Dispatch { id: String },
    /// Move an in-progress task into review, entering its workflow's first gate
    Complete {
        id: String,
        #[arg(long)]
        actor: Option<String>,
    },
    /// List tasks, optionally filtered
    List {
        #[arg(long)]
        status: Option<String>,
        #[arg(long)]
        project: Option<String>,
        #[arg(long)]
        agent: Option<String>,
        #[arg(long = "tag")]
        tags: Vec<String>,
    },
}

pub async fn run(args: TaskArgs, root: &Path, format: OutputFormat) -> Result<Option<String>, ExitError> {
    let vault = Vault::open(root)?;
    match args.command {
        TaskCommand::Create { project, title, priority, agent, workflow, tags, depends_on, body, by } => {
            create(&vault, project, title, priority, agent, workflow, tags, depends_on, body, by).await
        }
        TaskCommand::Update { id, status, add_dep, remove_dep } => {
            update(&vault, id, status, add_dep, remove_dep).await
        }
        TaskCommand::Block { id, reason } => block(&vault, id, reason).await,
        TaskCommand::Unblock { id } => unblock(&vault, id).await,
        TaskCommand::Dispatch { id } => dispatch(&vault, id).await,
        TaskCommand::Complete { id, actor } => complete(&vault, root, id, actor).await,
        TaskCommand::List { status, project, agent, tags } => list(&vault, status, project, agent, tags, format),
    }
    .map_err(Into::into)
}

#[allow(clippy::too_many_arguments)]
async fn create(
    vault: &Vault,
    project: String,
    title: String,
    priority: String,
    agent: Option<String>,
    workflow: Option<String>,
    tags: Vec<String>,
    depends_on: Vec<String>,
    body: String,
    by: Option<String>,
) -> Result<Option<String>, CliError> {
    let priority = parse_priority(&priority)?;
    let mut deps = BTreeSet::new();
    for dep in depends_on {
        deps.insert(crate::root::parse_task_id(&dep)?);
    }
    let actor = by.unwrap_or_else(current_actor);
    let init = NewTask {
        project: project.clone(),
        title: title.clone(),
        priority,
        routing: Routing { role: None, workflow, tags, agent },
        created_by: actor.clone(),
        depends_on: deps,
        body,
    };
    let task = vault.store.create(init).await?;
    vault.eventlog.append(EventKind::TaskCreated { project, title }, actor, Some(task.id.clone()))?;
    Ok(Some(format!("created {} ({})", task.id, priority_label(task.priority))))
}

async fn update(
    vault: &Vault,
    id: String,
    status: Option<String>,
    add_dep: Vec<String>,
    remove_dep: Vec<String>,
) -> Result<Option<String>, CliError> {
    if status.is_none() && add_dep.is_empty() && remove_dep.is_empty() {
        return Err(CliError::Usage("task update requires --status, --add-dep, or --remove-dep".to_string()));
    }
    let task = vault.resolve_task(&id)?;
    let actor = current_actor();
    let mut summary = Vec::new();

    if let Some(status) = status {
        let to = parse_status(&status)?;
        let from = task.status;
        let updated = vault.store.transition(&task.id, to, None).await?;
        vault.eventlog.append(
            EventKind::TaskTransitioned { from: from.to_string(), to: updated.status.to_string(), reason: None },
            actor.clone(),
            Some(task.id.clone()),
        )?;
        summary.push(format!("{from} -> {}", updated.status));
    }
    for dep in &add_dep {
        let blocker = crate::root::parse_task_id(dep)?;
        vault.store.add_dependency(&task.id, &blocker).await?;
        vault.eventlog.append(EventKind::DependencyAdded { blocker: blocker.clone() }, actor.clone(), Some(task.id.clone()))?;
        summary.push(format!("+dep {blocker}"));
    }
    for dep in &remove_dep {
        let blocker = crate::root::parse_task_id(dep)?;
        vault.store.remove_dependency(&task.id, &blocker).await?;
        vault.eventlog.append(EventKind::DependencyRemoved { blocker: blocker.clone() }, actor.clone(), Some(task.id.clone()))?;
        summary.push(format!("-dep {blocker}"));
    }
    Ok(Some(format!("{} updated ({})", task.id, summary.join(", "))))
}

async fn block(vault: &Vault, id: String, reason: String) -> Result<Option<String>, CliError> {
    let task = vault.resolve_task(&id)?;
    vault.store.block(&task.id, reason.clone()).await?;
    vault.eventlog.append(EventKind::TaskBlocked { reason }, current_actor(), Some(task.id.clone()))?;
    Ok(Some(format!("{} blocked", task.id)))
}

async fn unblock(vault: &Vault, id: String) -> Result<Option<String>, CliError> {
    let task = vault.resolve_task(&id)?;
    let updated = vault.store.unblock(&task.id).await?;
    vault.eventlog.append(EventKind::TaskUnblocked, current_actor(), Some(task.id.clone()))?;
    Ok(Some(format!("{} unblocked -> {}", task.id, updated.status)))
}

async fn dispatch(vault: &Vault, id: String) -> Result<Option<String>, CliError> {
    let task = vault.resolve_task(&id)?;
    let from = task.status;
    let updated = vault.store.transition(&task.id, TaskStatus::Ready, None).await?;
    vault.eventlog.append(
        EventKind::TaskTransitioned { from: from.to_string(), to: updated.status.to_string(), reason: None },
        current_actor(),
        Some(task.id.clone()),
    )?;
    Ok(Some(format!("{} dispatched ({from} -> {})", task.id, updated.status)))
}

/// `InProgress -> Review` is always legal; `Review -> Done` is only legal
/// once there, so finishing a task always crosses `review` even when its
/// project has no workflow configured to gate it there.
async fn complete(vault: &Vault, root: &Path, id: String, actor: Option<String>) -> Result<Option<String>, CliError> {
    let task = vault.resolve_task(&id)?;
    if task.status != TaskStatus::InProgress {
        return Err(CliError::Expected(format!("{} is {}, not in-progress", task.id, task.status)));
    }
    let actor = actor.unwrap_or_else(current_actor);

    let in_review = vault.store.transition(&task.id, TaskStatus::Review, None).await?;
    vault.eventlog.append(
        EventKind::TaskTransitioned { from: TaskStatus::InProgress.to_string(), to: TaskStatus::Review.to_string(), reason: None },
        actor.clone(),
        Some(task.id.clone()),
    )?;

    let manifest = load_manifest(root, &task.project)?;
    match manifest.and_then(|m| m.workflow) {
        Some(workflow) => {
            let engine = GateEngine::new();
            let transition = engine.enter(&vault.store, &task.id, &workflow, &actor).await?;
            for event in transition.events {
                vault.eventlog.append(event, actor.clone(), Some(task.id.clone()))?;
            }
            match transition.task.gate {
                Some(gate) => Ok(Some(format!("{} entered review at gate {}", task.id, gate.current))),
                None => Ok(Some(format!("{} completed", task.id))),
            }
        }
        None => {
            let done = vault.store.transition(&task.id, TaskStatus::Done, None).await?;
            vault.eventlog.append(
                EventKind::TaskTransitioned {
                    from: TaskStatus::Review.to_string(),
                    to: TaskStatus::Done.to_string(),
                    reason: Some("no workflow configured for project".to_string()),
                },
                actor,
                Some(task.id.clone()),
            )?;
            let _ = in_review;
            Ok(Some(format!("{} completed (no workflow, done)", done.id)))
        }
    }
}

fn load_manifest(root: &Path, project: &str) -> Result<Option<aof_core::ProjectManifest>, CliError> {
    let paths = aof_store::VaultPaths::new(root);
    let path = paths.project_manifest(project);
    if !path.exists() {
        return Ok(None);
    }
    let raw = std::fs::read_to_string(&path).map_err(|source| CliError::ManifestIo { project: project.to_string(), source })?;
    let manifest: aof_core::ProjectManifest =
        serde_yaml::from_str(&raw).map_err(|source| CliError::ManifestParse { project: project.to_string(), source })?;
    Ok(Some(manifest))
}

fn list(
    vault: &Vault,
    status: Option<String>,
    project: Option<String>,
    agent: Option<String>,
    tags: Vec<String>,
    format: OutputFormat,
) -> Result<Option<String>, CliError> {
    let status = status.map(|s| parse_status(&s)).transpose()?;
    let filter = aof_store::TaskFilter { status, agent, tags };
    let mut tasks = vault.store.list(&filter);
    if let Some(project) = &project {
        tasks.retain(|t| &t.project == project);
    }
    tasks.sort_by(|a, b| a.id.cmp(&b.id));

    handle_list(format, &tasks, "no tasks match", |tasks| {
        for t in tasks {
            println!(
                "{:<20} {:<12} {:<10} {:<8} {}",
                t.id,
                t.project,
                t.status,
                priority_label(t.priority),
                t.title
            );
        }
    })
    .map_err(|e| CliError::Expected(e.to_string()))?;
    Ok(None)
}

#[cfg(test)]
#[path = "task_tests.rs"]
mod tests;
