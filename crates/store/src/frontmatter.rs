// SPDX-License-Identifier: MIT
// Copyright (c) 2026 aof contributors

//! Parsing and serialization of `---`-fenced YAML frontmatter over a
//! Markdown body.
//!
//! The parser never guesses: a missing closing fence or schema-invalid
//! frontmatter is a [`FrontmatterError`], not a best-effort partial task.

use aof_core::Task;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FrontmatterError {
    #[error("file does not start with a `---` frontmatter fence")]
    MissingOpenFence,
    #[error("frontmatter is missing its closing `---` fence")]
    MissingCloseFence,
    #[error("frontmatter YAML is invalid: {0}")]
    InvalidYaml(#[from] serde_yaml::Error),
}

/// Split a task file's raw contents into `(frontmatter_yaml, body)`.
fn split_fences(raw: &str) -> Result<(&str, &str), FrontmatterError> {
    let after_open = raw.strip_prefix("---\n").or_else(|| raw.strip_prefix("---\r\n"));
    let after_open = after_open.ok_or(FrontmatterError::MissingOpenFence)?;

    let close_pos = after_open
        .find("\n---\n")
        .or_else(|| after_open.find("\n---\r\n"))
        .or_else(|| {
            // Allow a file that is *only* frontmatter with no trailing newline
            // before EOF, e.g. "---\nfoo: bar\n---"
            after_open.strip_suffix("---").map(|s| s.len())
        })
        .ok_or(FrontmatterError::MissingCloseFence)?;

    let fm = &after_open[..close_pos];
    let rest_start = after_open[close_pos..]
        .find("---")
        .map(|p| close_pos + p + 3)
        .unwrap_or(after_open.len());
    let body = after_open.get(rest_start..).unwrap_or("");
    let body = body.strip_prefix('\n').unwrap_or(body);
    Ok((fm, body))
}

/// Parse a task file's raw contents into a [`Task`], attaching the body.
pub fn parse_task(raw: &str) -> Result<Task, FrontmatterError> {
    let (fm, body) = split_fences(raw)?;
    let mut task: Task = serde_yaml::from_str(fm)?;
    task.body = body.to_string();
    Ok(task)
}

/// Serialize a [`Task`] back into `---`-fenced frontmatter plus its body.
pub fn render_task(task: &Task) -> Result<String, FrontmatterError> {
    let fm = serde_yaml::to_string(task)?;
    let mut out = String::with_capacity(fm.len() + task.body.len() + 16);
    out.push_str("---\n");
    out.push_str(&fm);
    out.push_str("---\n");
    if !task.body.is_empty() {
        out.push('\n');
        out.push_str(&task.body);
        if !task.body.ends_with('\n') {
            out.push('\n');
        }
    }
    Ok(out)
}

#[cfg(test)]
#[path = "frontmatter_tests.rs"]
mod tests;
