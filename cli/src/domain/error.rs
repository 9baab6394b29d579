//! Typed domain error enums.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `tokio`, `std::fs`, `std::process`, or `std::net`.
//! All error types implement `thiserror::Error` and convert to `anyhow::Error`
//! via the `?` operator.

use std::time::Duration;

use thiserror::Error;

use crate::domain::execution::{ExecutionResult, FailureCause};
use crate::domain::installable::{Action, ItemKind};

// ── Fetch errors ──────────────────────────────────────────────────────────────

/// Errors returned by content fetchers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("'{path}' was not found in the script source")]
    NotFound { path: String },

    #[error("could not fetch '{path}': {reason}")]
    Transport { path: String, reason: String },
}

// ── Installation errors ──────────────────────────────────────────────────────

/// Errors from a single install/uninstall/apply/restore action.
///
/// Failures that happen before a process runs carry no transcript; timeouts,
/// cancellations and non-zero exits carry everything captured so far.
#[derive(Debug, Error)]
pub enum InstallError {
    #[error("{kind} '{name}' has no {action} script")]
    ScriptNotDefined {
        name: String,
        kind: ItemKind,
        action: Action,
    },

    #[error("{action} {name}: {error}")]
    Fetch {
        name: String,
        action: Action,
        error: FetchError,
    },

    #[error("{action} {name}: cannot write script to scratch directory: {reason}")]
    ScriptMaterialization {
        name: String,
        action: Action,
        reason: String,
    },

    #[error("{action} {name}: cannot start script: {reason}")]
    ProcessStart {
        name: String,
        action: Action,
        reason: String,
    },

    #[error("{action} {name} timed out after {}s", timeout.as_secs())]
    Timeout {
        name: String,
        action: Action,
        timeout: Duration,
        result: Box<ExecutionResult>,
    },

    #[error("{action} {name} was cancelled")]
    Cancelled {
        name: String,
        action: Action,
        result: Box<ExecutionResult>,
    },

    #[error("{action} {name} failed with exit code {code}")]
    NonZeroExit {
        name: String,
        action: Action,
        code: i32,
        result: Box<ExecutionResult>,
    },
}

impl InstallError {
    /// The captured execution, when the script actually ran.
    #[must_use]
    pub fn result(&self) -> Option<&ExecutionResult> {
        match self {
            Self::Timeout { result, .. }
            | Self::Cancelled { result, .. }
            | Self::NonZeroExit { result, .. } => Some(result),
            _ => None,
        }
    }

    /// Convert into an `ExecutionResult`, synthesizing one for failures that
    /// happened before the script ran.
    #[must_use]
    pub fn into_result(self) -> ExecutionResult {
        match self {
            Self::Timeout { result, .. }
            | Self::Cancelled { result, .. }
            | Self::NonZeroExit { result, .. } => *result,
            Self::ScriptNotDefined { .. } => ExecutionResult::not_run(FailureCause::Fetch {
                reason: self.to_string(),
            }),
            Self::Fetch { ref error, .. } => ExecutionResult::not_run(FailureCause::Fetch {
                reason: error.to_string(),
            }),
            Self::ScriptMaterialization { reason, .. } => {
                ExecutionResult::not_run(FailureCause::Materialization { reason })
            }
            Self::ProcessStart { reason, .. } => {
                ExecutionResult::not_run(FailureCause::ProcessStart { reason })
            }
        }
    }
}

// ── Dependency errors ────────────────────────────────────────────────────────

/// Errors from dependency validation and resolution.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DependencyError {
    #[error("circular dependency detected involving '{name}'")]
    Cycle { name: String },

    #[error("dependency not found: '{requester}' requires '{dependency}'")]
    Missing {
        dependency: String,
        requester: String,
    },

    #[error("duplicate name '{name}'")]
    Duplicate { name: String },
}

// ── Batch errors ─────────────────────────────────────────────────────────────

/// Errors that abort a whole batch before or between scripts.
#[derive(Debug, Error)]
pub enum BatchError {
    #[error("could not load tool and environment lists: {0}")]
    Sources(String),

    #[error("{kind} dependencies cannot be resolved:\n{}", format_problems(.problems))]
    Dependencies {
        kind: ItemKind,
        problems: Vec<DependencyError>,
    },

    #[error("invalid batch transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },
}

fn format_problems(problems: &[DependencyError]) -> String {
    problems
        .iter()
        .map(|p| format!("  - {p}"))
        .collect::<Vec<_>>()
        .join("\n")
}

// ── Config errors ─────────────────────────────────────────────────────────────

/// Errors related to configuration key/value validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Unknown setting: {key}\n\nValid settings: {valid}")]
    UnknownKey { key: String, valid: String },

    #[error("Invalid value for {key}: {value}\n\nValid values: {valid}")]
    InvalidValue {
        key: String,
        value: String,
        valid: String,
    },
}
