//! `rigup install`, `rigup uninstall` and `rigup verify`.

use std::process::ExitCode;

use anyhow::Result;

use crate::app::{AppContext, finish_engine};
use crate::commands::{find_tool, finish_action};
use crate::domain::installable::Action;

/// Run the tool's install script.
///
/// # Errors
///
/// Returns an error if the tool cannot be found or the engine cannot start.
pub async fn install(app: &AppContext, name: &str) -> Result<ExitCode> {
    let tool = find_tool(app, &app.descriptors()?, name).await?;
    let engine = app.engine()?;
    app.output.step(&format!("Installing {name}..."));
    let outcome = engine.install_tool(&tool).await;
    finish_engine(engine);
    finish_action(app, &tool, Action::Install, outcome)
}

/// Run the tool's uninstall script after confirmation.
///
/// # Errors
///
/// Returns an error if the tool cannot be found, the prompt fails or the
/// engine cannot start.
pub async fn uninstall(app: &AppContext, name: &str) -> Result<ExitCode> {
    let tool = find_tool(app, &app.descriptors()?, name).await?;
    if !app.confirm(&format!("Uninstall {name}?"), true)? {
        app.output.info("Uninstall cancelled.");
        return Ok(ExitCode::SUCCESS);
    }
    let engine = app.engine()?;
    app.output.step(&format!("Uninstalling {name}..."));
    let outcome = engine.uninstall_tool(&tool).await;
    finish_engine(engine);
    finish_action(app, &tool, Action::Uninstall, outcome)
}

/// Check that the tool is on `PATH` and print its version line.
///
/// # Errors
///
/// Returns an error if the tool cannot be found or the engine cannot start.
pub async fn verify(app: &AppContext, name: &str) -> Result<ExitCode> {
    let tool = find_tool(app, &app.descriptors()?, name).await?;
    let engine = app.engine()?;
    let (installed, message) = engine.verify_installation(&tool).await;
    finish_engine(engine);
    app.renderer().render_verify(name, installed, &message)?;
    Ok(if installed {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
