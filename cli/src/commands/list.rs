//! `rigup list`: published tools and environments with their effective
//! auto flags.

use std::collections::BTreeMap;
use std::process::ExitCode;

use anyhow::{Context, Result};

use crate::app::{AppContext, finish_engine};
use crate::application::ports::DescriptorSource;
use crate::application::services::config_service;
use crate::domain::config::Overrides;
use crate::domain::installable::Installable;
use crate::output::{ListEntry, progress};

/// Run the list command.
///
/// # Errors
///
/// Returns an error if either descriptor list cannot be fetched.
pub async fn run(app: &AppContext) -> Result<ExitCode> {
    let descriptors = app.descriptors()?;
    let pb = progress::maybe_spinner(&app.output, "Fetching tool and environment lists...");
    let (tools, environments) = tokio::join!(descriptors.tools(), descriptors.environments());
    if let Some(pb) = &pb {
        progress::finish_clear(pb);
    }
    let tools = tools.context("cannot fetch tool list")?;
    let environments = environments.context("cannot fetch environment list")?;

    let overrides = match config_service::load_config(&app.config_store) {
        Ok(config) => config.overrides,
        Err(e) => {
            tracing::warn!(error = %format!("{e:#}"), "ignoring unreadable config");
            Overrides::default()
        }
    };

    let engine = app.engine()?;
    let tool_entries = tools
        .iter()
        .map(|tool| {
            let mut entry = list_entry(tool, &overrides.tools);
            entry.installed = Some(engine.is_installed(tool));
            entry.description.clone_from(&tool.description);
            entry
        })
        .collect::<Vec<_>>();
    finish_engine(engine);

    let environment_entries = environments
        .iter()
        .map(|environment| {
            let mut entry = list_entry(environment, &overrides.environments);
            entry.description.clone_from(&environment.description);
            entry
        })
        .collect::<Vec<_>>();

    app.renderer().render_list(&tool_entries, &environment_entries)?;
    Ok(ExitCode::SUCCESS)
}

fn list_entry(item: &impl Installable, overrides: &BTreeMap<String, bool>) -> ListEntry {
    let overridden = overrides.get(item.name()).copied();
    ListEntry {
        name: item.name().to_string(),
        kind: item.kind(),
        auto: overridden.unwrap_or_else(|| item.auto_selected()),
        overridden: overridden.is_some(),
        installed: None,
        description: None,
        dependencies: item.dependencies().to_vec(),
    }
}
