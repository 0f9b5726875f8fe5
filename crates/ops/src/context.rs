// SPDX-License-Identifier: MIT
// Copyright (c) 2026 aof contributors

//! Context bundle assembly for a task about to be dispatched (spec.md
//! §4.11): a resolver chain turns a list of references into resolved
//! document bodies, then a budget policy classifies the total size.
//!
//! The path-containment check in [`FilesystemResolver`] is grounded in the
//! teacher's `workspace_fs` module's refusal to operate outside a workspace
//! root; the open-ended `resolvers: Vec<Box<dyn ContextResolver>>` chain is
//! grounded in `oj_engine::vars`'s variable-resolution-chain shape, widened
//! from "first resolver with a value wins" to a boxed trait object list so
//! new resolver kinds can be added without touching `ContextAssembler`.

use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::OpsError;

/// One resolved document in a context bundle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedDoc {
    pub reference: String,
    pub content: String,
}

/// The assembled set of resolved documents provided to an executor for one
/// task, plus its size accounting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextBundle {
    pub docs: Vec<ResolvedDoc>,
    pub total_chars: usize,
    pub estimated_tokens: usize,
}

/// One entry in the resolver chain. Returns `Ok(None)` to defer to the next
/// resolver when this reference isn't in the syntax this resolver owns;
/// returns `Err` when it does own the syntax but the reference is invalid.
#[async_trait]
pub trait ContextResolver: Send + Sync {
    async fn resolve(&self, reference: &str) -> Result<Option<String>, OpsError>;
}

/// Reads `reference` as a path relative to `base`. Refuses absolute paths
/// outright and any normalized path that escapes `base`.
pub struct FilesystemResolver {
    base: PathBuf,
}

impl FilesystemResolver {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }
}

#[async_trait]
impl ContextResolver for FilesystemResolver {
    async fn resolve(&self, reference: &str) -> Result<Option<String>, OpsError> {
        if reference.starts_with("skill:") {
            return Ok(None);
        }
        let rel = Path::new(reference);
        if rel.is_absolute() {
            return Err(OpsError::PathEscape(reference.to_string()));
        }
        if !is_contained(rel) {
            return Err(OpsError::PathEscape(reference.to_string()));
        }
        let full = self.base.join(rel);
        match tokio::fs::read_to_string(&full).await {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(OpsError::RosterSource(full.display().to_string(), e.to_string())),
        }
    }
}

/// True if a relative path never climbs above its starting directory via
/// `..` once normalized component-by-component.
fn is_contained(path: &Path) -> bool {
    let mut depth: i32 = 0;
    for component in path.components() {
        match component {
            Component::Normal(_) => depth += 1,
            Component::CurDir => {}
            Component::ParentDir => {
                depth -= 1;
                if depth < 0 {
                    return false;
                }
            }
            Component::RootDir | Component::Prefix(_) => return false,
        }
    }
    true
}

/// Looks `reference` up verbatim in a provided map of inline documents.
pub struct InlineResolver {
    docs: HashMap<String, String>,
}

impl InlineResolver {
    pub fn new(docs: HashMap<String, String>) -> Self {
        Self { docs }
    }
}

#[async_trait]
impl ContextResolver for InlineResolver {
    async fn resolve(&self, reference: &str) -> Result<Option<String>, OpsError> {
        Ok(self.docs.get(reference).cloned())
    }
}

#[derive(Debug, Deserialize)]
struct SkillManifest {
    entrypoint: String,
}

/// Resolves `skill:<name>` references by reading `<skills_dir>/<name>/skill.json`
/// for an `entrypoint` file, then reading that file's contents.
pub struct SkillResolver {
    skills_dir: PathBuf,
}

impl SkillResolver {
    pub fn new(skills_dir: impl Into<PathBuf>) -> Self {
        Self { skills_dir: skills_dir.into() }
    }
}

#[async_trait]
impl ContextResolver for SkillResolver {
    async fn resolve(&self, reference: &str) -> Result<Option<String>, OpsError> {
        let Some(name) = reference.strip_prefix("skill:") else { return Ok(None) };
        let skill_dir = self.skills_dir.join(name);
        let manifest_path = skill_dir.join("skill.json");
        let manifest_raw = tokio::fs::read_to_string(&manifest_path)
            .await
            .map_err(|_| OpsError::UnresolvedReference(reference.to_string()))?;
        let manifest: SkillManifest = serde_json::from_str(&manifest_raw)
            .map_err(|_| OpsError::UnresolvedReference(reference.to_string()))?;
        let entry_path = skill_dir.join(&manifest.entrypoint);
        let contents = tokio::fs::read_to_string(&entry_path)
            .await
            .map_err(|_| OpsError::UnresolvedReference(reference.to_string()))?;
        Ok(Some(contents))
    }
}

/// `{target, warn, critical}` size thresholds a bundle is evaluated against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BudgetPolicy {
    pub target: usize,
    pub warn: usize,
    pub critical: usize,
}

/// Half-open classification of a bundle's `total_chars` against a
/// [`BudgetPolicy`] (spec.md §4.11 / §8 boundary behaviors).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BudgetStatus {
    Ok,
    Warn,
    Critical,
    Over,
}

/// `ceil(chars / 4)`, the token estimate spec.md §4.11 specifies.
pub fn estimate_tokens(chars: usize) -> usize {
    chars.div_ceil(4)
}

/// Classify `total_chars` against `policy`. No policy configured means no
/// budget is enforced, so the bundle is always `Ok`.
pub fn evaluate_budget(total_chars: usize, policy: Option<&BudgetPolicy>) -> BudgetStatus {
    let Some(policy) = policy else { return BudgetStatus::Ok };
    if total_chars <= policy.target {
        BudgetStatus::Ok
    } else if total_chars <= policy.warn {
        BudgetStatus::Warn
    } else if total_chars <= policy.critical {
        BudgetStatus::Critical
    } else {
        BudgetStatus::Over
    }
}

/// Tries each resolver in order for every reference in a task's context
/// list, building the bundle an executor receives before dispatch.
pub struct ContextAssembler {
    resolvers: Vec<Box<dyn ContextResolver>>,
}

impl ContextAssembler {
    pub fn new(resolvers: Vec<Box<dyn ContextResolver>>) -> Self {
        Self { resolvers }
    }

    pub async fn assemble(&self, references: &[String]) -> Result<ContextBundle, OpsError> {
        let mut docs = Vec::with_capacity(references.len());
        for reference in references {
            let mut resolved = None;
            for resolver in &self.resolvers {
                if let Some(content) = resolver.resolve(reference).await? {
                    resolved = Some(content);
                    break;
                }
            }
            let content = resolved.ok_or_else(|| OpsError::UnresolvedReference(reference.clone()))?;
            docs.push(ResolvedDoc { reference: reference.clone(), content });
        }
        let total_chars: usize = docs.iter().map(|d| d.content.chars().count()).sum();
        Ok(ContextBundle { total_chars, estimated_tokens: estimate_tokens(total_chars), docs })
    }
}

#[cfg(test)]
#[path = "context_tests.rs"]
mod tests;
