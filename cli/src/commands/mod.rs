//! Command implementations

pub mod batch;
pub mod config;
pub mod environment;
pub mod list;
pub mod platform;
pub mod tool;
pub mod version;

use std::process::ExitCode;

use anyhow::{Context, Result};
use chrono::Utc;
use rigup_common::{Environment, Tool};

use crate::app::AppContext;
use crate::application::ports::DescriptorSource;
use crate::application::services::config_service;
use crate::domain::batch::ItemResult;
use crate::domain::error::InstallError;
use crate::domain::execution::ExecutionResult;
use crate::domain::installable::{Action, Installable, ItemKind};
use crate::output::progress;

/// Fetch the tool list and find `name` in it.
pub(crate) async fn find_tool(
    app: &AppContext,
    descriptors: &impl DescriptorSource,
    name: &str,
) -> Result<Tool> {
    let pb = progress::maybe_spinner(&app.output, "Fetching tool list...");
    let tools = descriptors.tools().await;
    if let Some(pb) = &pb {
        progress::finish_clear(pb);
    }
    let tools = tools.context("cannot fetch tool list")?;
    tools
        .into_iter()
        .find(|t| t.name == name)
        .with_context(|| {
            format!("unknown tool '{name}'\n\nRun `rigup list` to see published tools.")
        })
}

/// Fetch the environment list and find `name` in it.
pub(crate) async fn find_environment(
    app: &AppContext,
    descriptors: &impl DescriptorSource,
    name: &str,
) -> Result<Environment> {
    let pb = progress::maybe_spinner(&app.output, "Fetching environment list...");
    let environments = descriptors.environments().await;
    if let Some(pb) = &pb {
        progress::finish_clear(pb);
    }
    let environments = environments.context("cannot fetch environment list")?;
    environments
        .into_iter()
        .find(|e| e.name == name)
        .with_context(|| {
            format!(
                "unknown environment '{name}'\n\nRun `rigup list` to see published environments."
            )
        })
}

/// Render an action's outcome, record history for successful tool actions and
/// map the outcome to an exit code.
pub(crate) fn finish_action(
    app: &AppContext,
    item: &(impl Installable + ?Sized),
    action: Action,
    outcome: Result<ExecutionResult, InstallError>,
) -> Result<ExitCode> {
    let result = ItemResult::from_outcome(item, action, outcome);
    if result.succeeded()
        && item.kind() == ItemKind::Tool
        && let Err(e) =
            config_service::record_success(&app.config_store, item.name(), action, Utc::now())
    {
        tracing::warn!(error = %format!("{e:#}"), "cannot record history");
    }
    app.renderer().render_item_result(&result)?;
    Ok(if result.succeeded() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
