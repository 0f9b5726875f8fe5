// SPDX-License-Identifier: MIT
// Copyright (c) 2026 aof contributors

//! A tiny predicate language for a gate's `when:` condition (spec §4.3,
//! §9's workflow config notes): `tags.includes('x')`, `!tags.includes('x')`,
//! and `metadata.key == 'value'`. Parsed and evaluated in one pass — the
//! grammar is a handful of productions, not worth a tokenizer/AST split.

use aof_core::{Metadata, Routing};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PredicateError {
    #[error("unsupported gate predicate: {0:?}")]
    Unsupported(String),
    #[error("malformed string literal in predicate: {0:?}")]
    MalformedLiteral(String),
}

/// Evaluate a `when:` predicate against a task's tags and metadata. A gate
/// with no `when` is always active — this function is only called when one
/// is present.
pub fn evaluate(expr: &str, routing: &Routing, metadata: &Metadata) -> Result<bool, PredicateError> {
    let trimmed = expr.trim();
    if let Some(rest) = trimmed.strip_prefix('!') {
        return Ok(!evaluate(rest, routing, metadata)?);
    }
    if let Some(rest) = trimmed.strip_prefix("tags.includes(") {
        let arg = rest.strip_suffix(')').ok_or_else(|| PredicateError::Unsupported(trimmed.to_string()))?;
        let tag = string_literal(arg)?;
        return Ok(routing.has_tag(&tag));
    }
    if let Some(rest) = trimmed.strip_prefix("metadata.") {
        let (key, rhs) = rest
            .split_once("==")
            .ok_or_else(|| PredicateError::Unsupported(trimmed.to_string()))?;
        let key = key.trim();
        let expected = string_literal(rhs.trim())?;
        let actual = metadata.0.get(key).and_then(|v| v.as_str());
        return Ok(actual == Some(expected.as_str()));
    }
    Err(PredicateError::Unsupported(trimmed.to_string()))
}

fn string_literal(s: &str) -> Result<String, PredicateError> {
    let s = s.trim();
    let quoted = (s.starts_with('\'') && s.ends_with('\'')) || (s.starts_with('"') && s.ends_with('"'));
    if s.len() >= 2 && quoted {
        Ok(s[1..s.len() - 1].to_string())
    } else {
        Err(PredicateError::MalformedLiteral(s.to_string()))
    }
}

#[cfg(test)]
#[path = "predicate_tests.rs"]
mod tests;
