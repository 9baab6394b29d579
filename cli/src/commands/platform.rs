//! `rigup platform`

use std::process::ExitCode;

use anyhow::Result;

use crate::app::AppContext;
use crate::infra::platform::detect;

/// Print the detected OS, distribution and package manager.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn run(app: &AppContext) -> Result<ExitCode> {
    let platform = detect();
    app.renderer().render_platform(&platform)?;
    Ok(ExitCode::SUCCESS)
}
