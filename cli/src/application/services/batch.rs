//! Application service: install-all / update-all batches.
//!
//! Drives the [`BatchState`] machine: fetch descriptors, select and order the
//! items, then run tools followed by environments, one at a time. Item
//! failures are recorded and the batch moves on; only source and dependency
//! errors abort it.

use std::collections::BTreeMap;

use chrono::Utc;
use rigup_common::{Environment, Tool};
use tokio::sync::mpsc::UnboundedSender;

use crate::application::ports::{
    ConfigStore, ContentFetcher, DescriptorSource, ProgramProbe, ScriptRunner, ScriptWorkspace,
};
use crate::application::services::config_service;
use crate::application::services::engine::InstallationEngine;
use crate::domain::batch::{
    BatchKind, BatchPhase, BatchReport, BatchState, ItemResult, PendingItem, select_items,
    vetoed_dependencies,
};
use crate::domain::config::Overrides;
use crate::domain::error::BatchError;
use crate::domain::installable::{Action, Installable, ItemKind};
use crate::domain::resolver::{resolve, validate_dependencies};

/// Progress notifications emitted while a batch runs.
#[derive(Debug, Clone)]
pub enum BatchEvent {
    Phase(BatchPhase),
    ItemCompleted {
        /// 1-based position within the current phase.
        index: usize,
        total: usize,
        result: ItemResult,
    },
    Finished(BatchReport),
    Failed(String),
}

/// Run a whole batch, reporting progress on `events`.
///
/// A closed receiver is ignored; the batch still runs to completion.
///
/// # Errors
///
/// Returns [`BatchError::Sources`] when descriptors cannot be loaded and
/// [`BatchError::Dependencies`] when the selected items cannot be ordered.
pub async fn run_batch<F, R, W, P>(
    engine: &InstallationEngine<F, R, W, P>,
    descriptors: &impl DescriptorSource,
    config_store: &impl ConfigStore,
    kind: BatchKind,
    events: &UnboundedSender<BatchEvent>,
) -> Result<BatchReport, BatchError>
where
    F: ContentFetcher,
    R: ScriptRunner,
    W: ScriptWorkspace,
    P: ProgramProbe,
{
    let mut state = BatchState::new(kind);
    match prepare(&mut state, descriptors, config_store, events).await {
        Ok((tools, environments)) => {
            let phase = state.begin(tools, environments)?;
            emit(events, BatchEvent::Phase(phase));
        }
        Err(e) => {
            state.fail();
            tracing::warn!(%kind, error = %e, "batch aborted");
            emit(events, BatchEvent::Phase(BatchPhase::Failed));
            emit(events, BatchEvent::Failed(e.to_string()));
            return Err(e);
        }
    }

    while let Some(item) = state.next_item() {
        let (index, total) = state.position();
        let result = match item {
            PendingItem::Tool(tool) => run_tool(engine, config_store, kind, &tool).await,
            PendingItem::Environment(env) => run_environment(engine, &env).await,
        };
        emit(
            events,
            BatchEvent::ItemCompleted {
                index,
                total,
                result: result.clone(),
            },
        );
        let before = state.phase();
        let after = state.record(result)?;
        if after != before {
            tracing::debug!(from = %before, to = %after, "batch phase changed");
            emit(events, BatchEvent::Phase(after));
        }
    }

    let report = state.into_report()?;
    tracing::info!(
        %kind,
        succeeded = report.succeeded_count(),
        total = report.results.len(),
        "batch complete"
    );
    emit(events, BatchEvent::Finished(report.clone()));
    Ok(report)
}

/// `Idle → FetchingSources → ResolvingOrder`, returning the ordered items.
async fn prepare(
    state: &mut BatchState,
    descriptors: &impl DescriptorSource,
    config_store: &impl ConfigStore,
    events: &UnboundedSender<BatchEvent>,
) -> Result<(Vec<Tool>, Vec<Environment>), BatchError> {
    state.transition(BatchPhase::FetchingSources)?;
    emit(events, BatchEvent::Phase(BatchPhase::FetchingSources));
    let tools = descriptors
        .tools()
        .await
        .map_err(|e| BatchError::Sources(format!("{e:#}")))?;
    let environments = descriptors
        .environments()
        .await
        .map_err(|e| BatchError::Sources(format!("{e:#}")))?;

    state.transition(BatchPhase::ResolvingOrder)?;
    emit(events, BatchEvent::Phase(BatchPhase::ResolvingOrder));
    let overrides = match config_store.load() {
        Ok(config) => config.overrides,
        Err(e) => {
            tracing::warn!(error = %format!("{e:#}"), "cannot read config, ignoring overrides");
            Overrides::default()
        }
    };

    let tools = ordered_selection(&tools, &overrides.tools, ItemKind::Tool)?;
    let environments =
        ordered_selection(&environments, &overrides.environments, ItemKind::Environment)?;
    tracing::debug!(
        tools = tools.len(),
        environments = environments.len(),
        "batch order resolved"
    );
    Ok((tools, environments))
}

/// Keep the selected items and their transitive dependencies, then validate
/// and resolve only that subset. Unselected items never fail a batch.
fn ordered_selection<T: Installable + Clone>(
    items: &[T],
    overrides: &BTreeMap<String, bool>,
    kind: ItemKind,
) -> Result<Vec<T>, BatchError> {
    let selected = select_items(items, overrides);
    for name in vetoed_dependencies(&selected, overrides) {
        tracing::warn!(
            %kind,
            name,
            "auto is disabled locally, but a selected item depends on it; running it anyway"
        );
    }
    validate_dependencies(&selected)
        .map_err(|problems| BatchError::Dependencies { kind, problems })?;
    let order = resolve(&selected).map_err(|e| BatchError::Dependencies {
        kind,
        problems: vec![e],
    })?;
    Ok(order.into_iter().cloned().collect())
}

async fn run_tool<F, R, W, P>(
    engine: &InstallationEngine<F, R, W, P>,
    config_store: &impl ConfigStore,
    kind: BatchKind,
    tool: &Tool,
) -> ItemResult
where
    F: ContentFetcher,
    R: ScriptRunner,
    W: ScriptWorkspace,
    P: ProgramProbe,
{
    if kind == BatchKind::InstallAll && engine.is_installed(tool) {
        tracing::debug!(tool = %tool.name, "already on PATH, skipping");
        return ItemResult::skipped(
            tool,
            Action::Install,
            &format!("{} is already installed", tool.name),
        );
    }
    let result = ItemResult::from_outcome(tool, Action::Install, engine.install_tool(tool).await);
    if result.succeeded()
        && !result.skipped
        && let Err(e) =
            config_service::record_success(config_store, &tool.name, Action::Install, Utc::now())
    {
        tracing::warn!(tool = %tool.name, error = %format!("{e:#}"), "cannot record history");
    }
    result
}

async fn run_environment<F, R, W, P>(
    engine: &InstallationEngine<F, R, W, P>,
    environment: &Environment,
) -> ItemResult
where
    F: ContentFetcher,
    R: ScriptRunner,
    W: ScriptWorkspace,
    P: ProgramProbe,
{
    ItemResult::from_outcome(
        environment,
        Action::Apply,
        engine.apply_environment(environment).await,
    )
}

fn emit(events: &UnboundedSender<BatchEvent>, event: BatchEvent) {
    // Receiver may be gone; the batch keeps running.
    let _ = events.send(event);
}
