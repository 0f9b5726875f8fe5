// SPDX-License-Identifier: MIT
// Copyright (c) 2026 aof contributors

use super::*;
use aof_core::Routing;
use yare::parameterized;

fn routing_with_tags(tags: &[&str]) -> Routing {
    Routing { tags: tags.iter().map(|t| t.to_string()).collect(), ..Routing::default() }
}

#[parameterized(
    present = { &["skip-qa"], "tags.includes('skip-qa')", true },
    absent = { &["other"], "tags.includes('skip-qa')", false },
    negated_present = { &["skip-qa"], "!tags.includes('skip-qa')", false },
    negated_absent = { &["other"], "!tags.includes('skip-qa')", true },
)]
fn tag_predicates(tags: &[&str], expr: &str, expected: bool) {
    let routing = routing_with_tags(tags);
    let metadata = Metadata::default();
    assert_eq!(evaluate(expr, &routing, &metadata).expect("valid predicate"), expected);
}

#[test]
fn metadata_equality_predicate() {
    let routing = Routing::default();
    let mut metadata = Metadata::default();
    metadata.0.insert("region".to_string(), serde_yaml::Value::String("eu".to_string()));
    assert!(evaluate("metadata.region == 'eu'", &routing, &metadata).expect("valid"));
    assert!(!evaluate("metadata.region == 'us'", &routing, &metadata).expect("valid"));
}

#[test]
fn unsupported_expression_is_an_error() {
    let routing = Routing::default();
    let metadata = Metadata::default();
    assert!(evaluate("bogus.expr", &routing, &metadata).is_err());
}
