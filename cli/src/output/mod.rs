//! Output formatting module

pub mod human;
pub mod json;
pub mod progress;
pub mod sink;
pub mod styles;

use std::path::Path;

use anyhow::Result;
use console::Term;
use owo_colors::OwoColorize as _;
use serde::Serialize;

pub use human::HumanRenderer;
pub use json::JsonRenderer;
pub use sink::ConsoleSink;
pub use styles::Styles;

use crate::domain::batch::{BatchReport, ItemResult};
use crate::domain::config::RigupConfig;
use crate::domain::installable::ItemKind;
use crate::domain::platform::Platform;

/// Output context carrying styling and terminal state.
pub struct OutputContext {
    /// Stylesheet for colored output.
    pub styles: Styles,
    /// Whether stdout is a TTY.
    pub is_tty: bool,
    /// Whether to suppress non-error output.
    pub quiet: bool,
}

impl OutputContext {
    /// Create output context based on CLI flags and environment.
    #[must_use]
    pub fn new(no_color: bool, quiet: bool) -> Self {
        let is_tty = Term::stdout().is_term();
        let use_colors = !no_color && is_tty && std::env::var("NO_COLOR").is_err();

        Self {
            styles: Styles::for_terminal(use_colors),
            is_tty,
            quiet,
        }
    }

    /// Check if progress indicators should be shown.
    #[must_use]
    pub fn show_progress(&self) -> bool {
        self.is_tty && !self.quiet
    }

    /// Print a success message prefixed with `✓`. Suppressed when `quiet`.
    pub fn success(&self, msg: &str) {
        if !self.quiet {
            println!("  {} {msg}", "✓".style(self.styles.success));
        }
    }

    /// Print a warning message prefixed with `⚠`. Suppressed when `quiet`.
    pub fn warn(&self, msg: &str) {
        if !self.quiet {
            println!("  {} {msg}", "⚠".style(self.styles.warning));
        }
    }

    /// Print an error message prefixed with `✗` to stderr. Never suppressed.
    pub fn error(&self, msg: &str) {
        eprintln!("  {} {msg}", "✗".style(self.styles.error));
    }

    /// Print an info message prefixed with `ℹ`. Suppressed when `quiet`.
    pub fn info(&self, msg: &str) {
        if !self.quiet {
            println!("  {} {msg}", "ℹ".style(self.styles.info));
        }
    }

    /// Print an in-progress step prefixed with `→`. Suppressed when `quiet`.
    pub fn step(&self, msg: &str) {
        if !self.quiet {
            println!("  {} {msg}", "→".style(self.styles.info));
        }
    }

    /// Print a section header. Suppressed when `quiet`.
    pub fn header(&self, msg: &str) {
        if !self.quiet {
            println!("  {}", msg.style(self.styles.header));
        }
    }

    /// Print a key-value pair with the key dimmed. Suppressed when `quiet`.
    pub fn kv(&self, key: &str, value: &str) {
        if !self.quiet {
            println!("  {}  {value}", key.style(self.styles.dim));
        }
    }
}

/// One row of `rigup list`.
#[derive(Debug, Clone, Serialize)]
pub struct ListEntry {
    pub name: String,
    pub kind: ItemKind,
    /// Effective auto flag after local overrides.
    pub auto: bool,
    /// Whether a local override replaced the descriptor's flag.
    pub overridden: bool,
    /// PATH detection result; tools only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub installed: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub dependencies: Vec<String>,
}

/// Dispatches rendering to the human or JSON renderer.
pub enum Renderer<'a> {
    Human(HumanRenderer<'a>),
    Json(JsonRenderer),
}

impl Renderer<'_> {
    /// Render the outcome of a single action.
    ///
    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn render_item_result(&self, result: &ItemResult) -> Result<()> {
        match self {
            Self::Human(r) => {
                r.render_item_result(result);
                Ok(())
            }
            Self::Json(r) => r.render(result),
        }
    }

    /// Render a `verify` outcome.
    ///
    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn render_verify(&self, name: &str, installed: bool, message: &str) -> Result<()> {
        match self {
            Self::Human(r) => {
                r.render_verify(installed, message);
                Ok(())
            }
            Self::Json(r) => r.render(&serde_json::json!({
                "name": name,
                "installed": installed,
                "message": message,
            })),
        }
    }

    /// Render the summary of a finished batch.
    ///
    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn render_batch_report(&self, report: &BatchReport) -> Result<()> {
        match self {
            Self::Human(r) => {
                r.render_batch_report(report);
                Ok(())
            }
            Self::Json(r) => r.render(report),
        }
    }

    /// Render the tool and environment listing.
    ///
    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn render_list(&self, tools: &[ListEntry], environments: &[ListEntry]) -> Result<()> {
        match self {
            Self::Human(r) => {
                r.render_list(tools, environments);
                Ok(())
            }
            Self::Json(r) => r.render(&serde_json::json!({
                "tools": tools,
                "environments": environments,
            })),
        }
    }

    /// Render the detected platform.
    ///
    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn render_platform(&self, platform: &Platform) -> Result<()> {
        match self {
            Self::Human(r) => {
                r.render_platform(platform);
                Ok(())
            }
            Self::Json(r) => r.render(platform),
        }
    }

    /// Render the current configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn render_config(&self, config: &RigupConfig, path: &Path) -> Result<()> {
        match self {
            Self::Human(r) => {
                r.render_config(config, path);
                Ok(())
            }
            Self::Json(r) => r.render(&serde_json::json!({
                "path": path.display().to_string(),
                "config": config,
            })),
        }
    }

    /// Render the CLI version.
    ///
    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn render_version(&self, version: &str) -> Result<()> {
        match self {
            Self::Human(r) => {
                r.render_version(version);
                Ok(())
            }
            Self::Json(r) => r.render(&serde_json::json!({ "version": version })),
        }
    }
}
