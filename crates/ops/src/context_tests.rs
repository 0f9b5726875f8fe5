// SPDX-License-Identifier: MIT
// Copyright (c) 2026 aof contributors

use super::*;
use tempfile::tempdir;
use yare::parameterized;

#[tokio::test]
async fn filesystem_resolver_reads_a_relative_path_under_its_base() {
    let dir = tempdir().unwrap();
    std::fs::write(dir.path().join("notes.md"), "hello").unwrap();
    let assembler = ContextAssembler::new(vec![Box::new(FilesystemResolver::new(dir.path()))]);
    let bundle = assembler.assemble(&["notes.md".to_string()]).await.unwrap();
    assert_eq!(bundle.docs[0].content, "hello");
    assert_eq!(bundle.total_chars, 5);
}

#[tokio::test]
async fn filesystem_resolver_refuses_an_absolute_path() {
    let dir = tempdir().unwrap();
    let assembler = ContextAssembler::new(vec![Box::new(FilesystemResolver::new(dir.path()))]);
    let err = assembler.assemble(&["/etc/passwd".to_string()]).await.unwrap_err();
    assert!(matches!(err, OpsError::PathEscape(_)));
}

#[tokio::test]
async fn filesystem_resolver_refuses_a_path_that_escapes_its_base() {
    let dir = tempdir().unwrap();
    let assembler = ContextAssembler::new(vec![Box::new(FilesystemResolver::new(dir.path().join("sub")))]);
    let err = assembler.assemble(&["../secret.md".to_string()]).await.unwrap_err();
    assert!(matches!(err, OpsError::PathEscape(_)));
}

#[tokio::test]
async fn inline_resolver_looks_up_an_exact_key() {
    let mut docs = std::collections::HashMap::new();
    docs.insert("brief".to_string(), "do the thing".to_string());
    let assembler = ContextAssembler::new(vec![Box::new(InlineResolver::new(docs))]);
    let bundle = assembler.assemble(&["brief".to_string()]).await.unwrap();
    assert_eq!(bundle.docs[0].content, "do the thing");
}

#[tokio::test]
async fn skill_resolver_loads_the_manifest_entrypoint() {
    let dir = tempdir().unwrap();
    let skill_dir = dir.path().join("reviewer");
    std::fs::create_dir_all(&skill_dir).unwrap();
    std::fs::write(skill_dir.join("skill.json"), r#"{"entrypoint":"SKILL.md"}"#).unwrap();
    std::fs::write(skill_dir.join("SKILL.md"), "review carefully").unwrap();
    let assembler = ContextAssembler::new(vec![Box::new(SkillResolver::new(dir.path()))]);
    let bundle = assembler.assemble(&["skill:reviewer".to_string()]).await.unwrap();
    assert_eq!(bundle.docs[0].content, "review carefully");
}

#[tokio::test]
async fn chain_tries_resolvers_in_order_and_falls_through_on_a_miss() {
    let dir = tempdir().unwrap();
    let mut docs = std::collections::HashMap::new();
    docs.insert("brief".to_string(), "inline wins".to_string());
    let assembler =
        ContextAssembler::new(vec![Box::new(FilesystemResolver::new(dir.path())), Box::new(InlineResolver::new(docs))]);
    let bundle = assembler.assemble(&["brief".to_string()]).await.unwrap();
    assert_eq!(bundle.docs[0].content, "inline wins");
}

#[tokio::test]
async fn unresolved_reference_across_the_whole_chain_is_an_error() {
    let dir = tempdir().unwrap();
    let assembler = ContextAssembler::new(vec![Box::new(FilesystemResolver::new(dir.path()))]);
    let err = assembler.assemble(&["nope.md".to_string()]).await.unwrap_err();
    assert!(matches!(err, OpsError::UnresolvedReference(_)));
}

#[parameterized(
    at_target = { 100, BudgetStatus::Ok },
    just_under_warn = { 101, BudgetStatus::Warn },
    at_warn = { 150, BudgetStatus::Warn },
    at_critical = { 200, BudgetStatus::Critical },
    over = { 201, BudgetStatus::Over },
)]
fn budget_thresholds_are_half_open(chars: usize, expected: BudgetStatus) {
    let policy = BudgetPolicy { target: 100, warn: 150, critical: 200 };
    assert_eq!(evaluate_budget(chars, Some(&policy)), expected);
}

#[test]
fn no_policy_means_no_budget_is_enforced() {
    assert_eq!(evaluate_budget(1_000_000, None), BudgetStatus::Ok);
}

#[test]
fn estimate_tokens_rounds_up() {
    assert_eq!(estimate_tokens(0), 0);
    assert_eq!(estimate_tokens(1), 1);
    assert_eq!(estimate_tokens(4), 1);
    assert_eq!(estimate_tokens(5), 2);
}
