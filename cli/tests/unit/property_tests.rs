//! Property-based tests for dependency ordering and config validation.
//!
//! Uses `proptest` to verify invariants across many random inputs.

#![allow(clippy::expect_used)]

use std::collections::HashMap;

use proptest::prelude::*;
use rigup_cli::domain::config::{ConfigKey, RigupConfig, apply_setting, validate_config_key};
use rigup_cli::domain::error::DependencyError;
use rigup_cli::domain::resolver::{resolve, validate_dependencies};
use rigup_common::Tool;

use crate::mocks::tool;

fn named(name: &str, deps: Vec<String>) -> Tool {
    let mut t = tool(name, &[]);
    t.dependencies = deps;
    t
}

/// Random DAG over `t0..tN`: node `i` may only depend on nodes `< i`, then
/// the list is shuffled so input order says nothing about dependency order.
fn acyclic_tools() -> impl Strategy<Value = Vec<Tool>> {
    (1usize..12).prop_flat_map(|n| {
        prop::collection::vec(prop::collection::vec(any::<bool>(), n), n)
            .prop_map(move |edges| {
                (0..n)
                    .map(|i| {
                        let deps = (0..i)
                            .filter(|&j| edges[i][j])
                            .map(|j| format!("t{j}"))
                            .collect();
                        named(&format!("t{i}"), deps)
                    })
                    .collect::<Vec<_>>()
            })
            .prop_shuffle()
    })
}

// ============================================================================
// resolve() properties
// ============================================================================

proptest! {
    /// Every item appears exactly once and after all of its dependencies.
    #[test]
    fn prop_acyclic_sets_resolve_dependencies_first(tools in acyclic_tools()) {
        let order = resolve(&tools).expect("acyclic set resolves");
        prop_assert_eq!(order.len(), tools.len());

        let position: HashMap<&str, usize> = order
            .iter()
            .enumerate()
            .map(|(i, t)| (t.name.as_str(), i))
            .collect();
        prop_assert_eq!(position.len(), tools.len());
        for t in &order {
            for dep in &t.dependencies {
                prop_assert!(
                    position[dep.as_str()] < position[t.name.as_str()],
                    "{} resolved before its dependency {}", t.name, dep
                );
            }
        }
        prop_assert!(validate_dependencies(&tools).is_ok());
    }

    /// A ring of any length is reported as a cycle naming one of its members.
    #[test]
    fn prop_rings_are_cycles(len in 1usize..8) {
        let tools: Vec<Tool> = (0..len)
            .map(|i| named(&format!("r{i}"), vec![format!("r{}", (i + 1) % len)]))
            .collect();
        match resolve(&tools) {
            Err(DependencyError::Cycle { name }) => {
                prop_assert!(tools.iter().any(|t| t.name == name));
            }
            other => prop_assert!(false, "expected cycle, got {:?}", other.map(|o| o.len())),
        }
        prop_assert!(validate_dependencies(&tools).is_err());
    }

    /// Resolution is deterministic for the same input.
    #[test]
    fn prop_resolve_is_deterministic(tools in acyclic_tools()) {
        let names = |order: Vec<&Tool>| -> Vec<String> {
            order.iter().map(|t| t.name.clone()).collect()
        };
        let first = names(resolve(&tools).expect("resolves"));
        let second = names(resolve(&tools).expect("resolves"));
        prop_assert_eq!(first, second);
    }
}

#[test]
fn test_missing_dependency_names_requester() {
    let tools = vec![named("fzf", vec!["jq".to_string()])];
    assert_eq!(
        resolve(&tools).map(|o| o.len()),
        Err(DependencyError::Missing {
            dependency: "jq".to_string(),
            requester: "fzf".to_string(),
        })
    );
}

// ============================================================================
// validate_config_key() properties
// ============================================================================

proptest! {
    /// Any non-empty item name forms a valid override key in either namespace.
    #[test]
    fn prop_override_keys_accept_any_name(name in "[a-z][a-z0-9_-]{0,20}") {
        prop_assert_eq!(
            validate_config_key(&format!("tools.{name}.auto")).expect("tool key"),
            ConfigKey::ToolAuto(name.clone())
        );
        prop_assert_eq!(
            validate_config_key(&format!("environments.{name}.auto")).expect("environment key"),
            ConfigKey::EnvironmentAuto(name)
        );
    }

    /// Keys outside the known sections are rejected.
    #[test]
    fn prop_unknown_sections_rejected(section in "[a-z]{1,12}", name in "[a-z]{1,12}") {
        prop_assume!(section != "tools" && section != "environments" && section != "source");
        let key = format!("{section}.{name}.auto");
        prop_assert!(validate_config_key(&key).is_err());
    }

    /// Override values other than true/false/default never change the config.
    #[test]
    fn prop_invalid_override_values_rejected(value in "[a-zA-Z0-9]{1,10}") {
        prop_assume!(!["true", "false", "default"].contains(&value.as_str()));
        let mut config = RigupConfig::default();
        let key = ConfigKey::ToolAuto("jq".to_string());
        prop_assert!(apply_setting(&mut config, &key, &value).is_err());
        prop_assert_eq!(config, RigupConfig::default());
    }
}
