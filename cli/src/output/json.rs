//! JSON output helpers.
//!
//! Every `--json` code path prints exactly one pretty-printed document to
//! stdout: the command's result, or an error object when the command fails.

use anyhow::{Context, Result};
use serde::Serialize;

use crate::domain::error::{BatchError, ConfigError, InstallError};

/// Renders values as pretty-printed JSON on stdout.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonRenderer;

impl JsonRenderer {
    /// Print `value` as a JSON document.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn render<T: Serialize + ?Sized>(self, value: &T) -> Result<()> {
        let text = serde_json::to_string_pretty(value).context("JSON serialization failed")?;
        println!("{text}");
        Ok(())
    }
}

/// Format a JSON error object.
///
/// Output (pretty-printed):
/// ```json
/// {
///   "error": true,
///   "message": "...",
///   "code": "..."
/// }
/// ```
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn format_error(message: &str, code: &str) -> Result<String> {
    let obj = serde_json::json!({
        "error": true,
        "message": message,
        "code": code,
    });
    serde_json::to_string_pretty(&obj).context("JSON serialization failed")
}

/// Stable machine-readable code for a command error.
#[must_use]
pub fn error_code(error: &anyhow::Error) -> &'static str {
    if error.downcast_ref::<InstallError>().is_some() {
        "install_failed"
    } else if let Some(batch) = error.downcast_ref::<BatchError>() {
        match batch {
            BatchError::Sources(_) => "sources_unavailable",
            BatchError::Dependencies { .. } => "dependency_error",
            BatchError::InvalidTransition { .. } => "internal_error",
        }
    } else if error.downcast_ref::<ConfigError>().is_some() {
        "invalid_config"
    } else {
        "error"
    }
}
