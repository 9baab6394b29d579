//! Batch run state machine.
//!
//! `Idle → FetchingSources → ResolvingOrder → RunningTools →
//! RunningEnvironments → Complete`, with `Failed` reachable from every
//! non-terminal phase. Empty running phases are skipped.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;

use rigup_common::{Environment, Tool};
use serde::Serialize;

use crate::domain::error::{BatchError, InstallError};
use crate::domain::execution::ExecutionResult;
use crate::domain::installable::{Action, Installable, ItemKind};

/// What a batch does with the selected items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum BatchKind {
    /// Install tools not yet on `PATH` and apply environments.
    InstallAll,
    /// Re-run every selected tool's install script and re-apply environments.
    UpdateAll,
}

impl fmt::Display for BatchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::InstallAll => "install-all",
            Self::UpdateAll => "update-all",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchPhase {
    Idle,
    FetchingSources,
    ResolvingOrder,
    RunningTools,
    RunningEnvironments,
    Complete,
    Failed,
}

impl BatchPhase {
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Complete | Self::Failed)
    }

    /// Whether `self → next` is a legal transition.
    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        use BatchPhase::{
            Complete, Failed, FetchingSources, Idle, ResolvingOrder, RunningEnvironments,
            RunningTools,
        };
        if next == Failed {
            return !self.is_terminal();
        }
        matches!(
            (self, next),
            (Idle, FetchingSources)
                | (FetchingSources, ResolvingOrder)
                | (ResolvingOrder, RunningTools | RunningEnvironments | Complete)
                | (RunningTools, RunningEnvironments | Complete)
                | (RunningEnvironments, Complete)
        )
    }
}

impl fmt::Display for BatchPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Idle => "idle",
            Self::FetchingSources => "fetching sources",
            Self::ResolvingOrder => "resolving order",
            Self::RunningTools => "running tools",
            Self::RunningEnvironments => "running environments",
            Self::Complete => "complete",
            Self::Failed => "failed",
        })
    }
}

/// Result of one item in a batch, tagged by name and kind.
#[derive(Debug, Clone, Serialize)]
pub struct ItemResult {
    pub name: String,
    pub kind: ItemKind,
    pub action: Action,
    /// No script ran because the item was already present.
    pub skipped: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub result: ExecutionResult,
}

impl ItemResult {
    #[must_use]
    pub fn from_outcome(
        item: &(impl Installable + ?Sized),
        action: Action,
        outcome: Result<ExecutionResult, InstallError>,
    ) -> Self {
        let (error, result) = match outcome {
            Ok(result) => (None, result),
            Err(e) => (Some(e.to_string()), e.into_result()),
        };
        Self {
            name: item.name().to_string(),
            kind: item.kind(),
            action,
            skipped: false,
            error,
            result,
        }
    }

    #[must_use]
    pub fn skipped(item: &(impl Installable + ?Sized), action: Action, message: &str) -> Self {
        Self {
            name: item.name().to_string(),
            kind: item.kind(),
            action,
            skipped: true,
            error: None,
            result: ExecutionResult::skipped(message),
        }
    }

    #[must_use]
    pub fn succeeded(&self) -> bool {
        self.result.success
    }
}

/// Everything a finished batch produced.
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub kind: BatchKind,
    pub results: Vec<ItemResult>,
}

impl BatchReport {
    #[must_use]
    pub fn succeeded_count(&self) -> usize {
        self.results.iter().filter(|r| r.succeeded()).count()
    }

    pub fn failures(&self) -> impl Iterator<Item = &ItemResult> {
        self.results.iter().filter(|r| !r.succeeded())
    }

    #[must_use]
    pub fn all_succeeded(&self) -> bool {
        self.results.iter().all(ItemResult::succeeded)
    }
}

/// Next item for the orchestrator to run.
#[derive(Debug, Clone)]
pub enum PendingItem {
    Tool(Tool),
    Environment(Environment),
}

/// Working memory for one batch run.
#[derive(Debug)]
pub struct BatchState {
    kind: BatchKind,
    phase: BatchPhase,
    tools: Vec<Tool>,
    environments: Vec<Environment>,
    index: usize,
    results: Vec<ItemResult>,
}

impl BatchState {
    #[must_use]
    pub fn new(kind: BatchKind) -> Self {
        Self {
            kind,
            phase: BatchPhase::Idle,
            tools: Vec::new(),
            environments: Vec::new(),
            index: 0,
            results: Vec::new(),
        }
    }

    #[must_use]
    pub fn phase(&self) -> BatchPhase {
        self.phase
    }

    /// Move to `next`, rejecting transitions the state machine does not allow.
    ///
    /// # Errors
    ///
    /// Returns [`BatchError::InvalidTransition`] for illegal transitions.
    pub fn transition(&mut self, next: BatchPhase) -> Result<(), BatchError> {
        if !self.phase.can_transition_to(next) {
            return Err(BatchError::InvalidTransition {
                from: self.phase.to_string(),
                to: next.to_string(),
            });
        }
        self.phase = next;
        self.index = 0;
        Ok(())
    }

    /// Store the resolved orders and enter the first non-empty running phase.
    ///
    /// Returns the phase entered (`Complete` when nothing was selected).
    ///
    /// # Errors
    ///
    /// Returns [`BatchError::InvalidTransition`] unless the batch is resolving.
    pub fn begin(
        &mut self,
        tools: Vec<Tool>,
        environments: Vec<Environment>,
    ) -> Result<BatchPhase, BatchError> {
        if self.phase != BatchPhase::ResolvingOrder {
            return Err(BatchError::InvalidTransition {
                from: self.phase.to_string(),
                to: BatchPhase::RunningTools.to_string(),
            });
        }
        self.tools = tools;
        self.environments = environments;
        let next = if !self.tools.is_empty() {
            BatchPhase::RunningTools
        } else if !self.environments.is_empty() {
            BatchPhase::RunningEnvironments
        } else {
            BatchPhase::Complete
        };
        self.transition(next)?;
        Ok(next)
    }

    /// The item at the current position, if the batch is running.
    #[must_use]
    pub fn next_item(&self) -> Option<PendingItem> {
        match self.phase {
            BatchPhase::RunningTools => self.tools.get(self.index).cloned().map(PendingItem::Tool),
            BatchPhase::RunningEnvironments => self
                .environments
                .get(self.index)
                .cloned()
                .map(PendingItem::Environment),
            _ => None,
        }
    }

    /// `(1-based position, phase length)` of the current item.
    #[must_use]
    pub fn position(&self) -> (usize, usize) {
        let total = match self.phase {
            BatchPhase::RunningTools => self.tools.len(),
            BatchPhase::RunningEnvironments => self.environments.len(),
            _ => 0,
        };
        (self.index + 1, total)
    }

    /// Record the current item's result and advance, switching phase when the
    /// current list is exhausted. Returns the phase after advancing.
    ///
    /// # Errors
    ///
    /// Returns [`BatchError::InvalidTransition`] if no item is running.
    pub fn record(&mut self, result: ItemResult) -> Result<BatchPhase, BatchError> {
        let (_, total) = self.position();
        if !matches!(
            self.phase,
            BatchPhase::RunningTools | BatchPhase::RunningEnvironments
        ) || self.index >= total
        {
            return Err(BatchError::InvalidTransition {
                from: self.phase.to_string(),
                to: "record result".to_string(),
            });
        }
        self.results.push(result);
        self.index += 1;
        if self.index < total {
            return Ok(self.phase);
        }
        let next = if self.phase == BatchPhase::RunningTools && !self.environments.is_empty() {
            BatchPhase::RunningEnvironments
        } else {
            BatchPhase::Complete
        };
        self.transition(next)?;
        Ok(next)
    }

    /// Mark the batch failed. No-op once terminal.
    pub fn fail(&mut self) {
        if !self.phase.is_terminal() {
            self.phase = BatchPhase::Failed;
        }
    }

    /// Consume a completed batch into its report.
    ///
    /// # Errors
    ///
    /// Returns [`BatchError::InvalidTransition`] unless the batch is complete.
    pub fn into_report(self) -> Result<BatchReport, BatchError> {
        if self.phase != BatchPhase::Complete {
            return Err(BatchError::InvalidTransition {
                from: self.phase.to_string(),
                to: "report".to_string(),
            });
        }
        Ok(BatchReport {
            kind: self.kind,
            results: self.results,
        })
    }
}

/// Items a batch should run: those whose auto flag (or local override) is on,
/// plus everything they transitively depend on. Input order is preserved.
///
/// Dependency names that do not resolve are ignored here; the resolver
/// reports them.
#[must_use]
pub fn select_items<T: Installable + Clone>(
    items: &[T],
    overrides: &BTreeMap<String, bool>,
) -> Vec<T> {
    let by_name: HashMap<&str, &T> = items.iter().map(|i| (i.name(), i)).collect();
    let mut wanted: HashSet<&str> = HashSet::new();
    let mut stack: Vec<&str> = items
        .iter()
        .filter(|i| overrides.get(i.name()).copied().unwrap_or_else(|| i.auto_selected()))
        .map(Installable::name)
        .collect();
    while let Some(name) = stack.pop() {
        if !wanted.insert(name) {
            continue;
        }
        if let Some(item) = by_name.get(name) {
            stack.extend(item.dependencies().iter().map(String::as_str));
        }
    }
    items
        .iter()
        .filter(|i| wanted.contains(i.name()))
        .cloned()
        .collect()
}

/// Selected items whose local override is `false`. They can only be in the
/// selection because a selected item depends on them.
#[must_use]
pub fn vetoed_dependencies<'a, T: Installable>(
    selected: &'a [T],
    overrides: &BTreeMap<String, bool>,
) -> Vec<&'a str> {
    selected
        .iter()
        .map(Installable::name)
        .filter(|name| overrides.get(*name) == Some(&false))
        .collect()
}
