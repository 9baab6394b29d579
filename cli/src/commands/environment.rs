//! `rigup apply` and `rigup restore`.

use std::process::ExitCode;

use anyhow::Result;

use crate::app::{AppContext, finish_engine};
use crate::commands::{find_environment, finish_action};
use crate::domain::installable::Action;

/// Run the environment's setup script.
///
/// # Errors
///
/// Returns an error if the environment cannot be found or the engine cannot
/// start.
pub async fn apply(app: &AppContext, name: &str) -> Result<ExitCode> {
    let environment = find_environment(app, &app.descriptors()?, name).await?;
    let engine = app.engine()?;
    app.output.step(&format!("Applying {name}..."));
    let outcome = engine.apply_environment(&environment).await;
    finish_engine(engine);
    finish_action(app, &environment, Action::Apply, outcome)
}

/// Run the environment's restore script after confirmation.
///
/// # Errors
///
/// Returns an error if the environment cannot be found, the prompt fails or
/// the engine cannot start.
pub async fn restore(app: &AppContext, name: &str) -> Result<ExitCode> {
    let environment = find_environment(app, &app.descriptors()?, name).await?;
    if !app.confirm(&format!("Restore {name} to its previous state?"), true)? {
        app.output.info("Restore cancelled.");
        return Ok(ExitCode::SUCCESS);
    }
    let engine = app.engine()?;
    app.output.step(&format!("Restoring {name}..."));
    let outcome = engine.restore_environment(&environment).await;
    finish_engine(engine);
    finish_action(app, &environment, Action::Restore, outcome)
}
