//! Application context: unified state passed to every command handler.
//!
//! `AppContext` owns the output context, the config store and the flags, and
//! knows how to build the script source and the installation engine from
//! them. Adding a cross-cutting concern is a field change here; no command
//! signature changes.

use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;

use crate::application::services::config_service;
use crate::application::services::engine::InstallationEngine;
use crate::infra::command_runner::TokioCommandRunner;
use crate::infra::config::YamlConfigStore;
use crate::infra::descriptors::YamlDescriptorSource;
use crate::infra::fetcher::SourceFetcher;
use crate::infra::probe::SystemProbe;
use crate::infra::process_runner::TokioScriptRunner;
use crate::infra::scratch::TempScratch;
use crate::output::{ConsoleSink, HumanRenderer, JsonRenderer, OutputContext, Renderer};

/// Overrides the configured script source (directory path or http(s) URL).
pub const SOURCE_ENV: &str = "RIGUP_SOURCE";

/// The production engine wiring.
pub type Engine = InstallationEngine<
    SourceFetcher,
    TokioScriptRunner<ConsoleSink>,
    TempScratch,
    SystemProbe<TokioCommandRunner>,
>;

/// Output rendering mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Human-readable terminal output (default).
    Human,
    /// Machine-readable JSON output.
    Json,
}

/// Output rendering flags.
pub struct OutputFlags {
    /// Disable ANSI color output.
    pub no_color: bool,
    /// Suppress non-error output.
    pub quiet: bool,
    /// Enable JSON output mode.
    pub json: bool,
}

/// Behaviour flags.
pub struct BehaviourFlags {
    /// Skip interactive prompts (also set by `CI` / `RIGUP_YES` env vars).
    pub yes: bool,
}

/// Flags passed from the top-level CLI to `AppContext::new`.
pub struct AppFlags {
    /// Output rendering options.
    pub output: OutputFlags,
    /// Behaviour options.
    pub behaviour: BehaviourFlags,
}

/// Unified application context passed to every command handler.
pub struct AppContext {
    /// Terminal output context (colors, quiet mode).
    pub output: OutputContext,
    /// Output rendering mode (human vs JSON).
    pub mode: OutputMode,
    /// Configuration persistence.
    pub config_store: YamlConfigStore,
    /// When `true`, skip interactive prompts and use defaults.
    pub non_interactive: bool,
}

impl AppContext {
    /// Construct an `AppContext` from top-level CLI flags.
    #[must_use]
    pub fn new(flags: &AppFlags) -> Self {
        let ci_env = std::env::var("CI").is_ok() || std::env::var("RIGUP_YES").is_ok();
        let non_interactive = flags.behaviour.yes || ci_env;

        let mode = if flags.output.json {
            OutputMode::Json
        } else {
            OutputMode::Human
        };

        // Stdout carries exactly one JSON document in JSON mode.
        let quiet = flags.output.quiet || flags.output.json;

        Self {
            output: OutputContext::new(flags.output.no_color, quiet),
            mode,
            config_store: YamlConfigStore,
            non_interactive,
        }
    }

    /// Returns `true` when JSON output mode is active.
    #[must_use]
    pub fn is_json(&self) -> bool {
        self.mode == OutputMode::Json
    }

    /// Returns the appropriate `Renderer` variant for the current output mode.
    #[must_use]
    pub fn renderer(&self) -> Renderer<'_> {
        match self.mode {
            OutputMode::Human => Renderer::Human(HumanRenderer::new(&self.output)),
            OutputMode::Json => Renderer::Json(JsonRenderer),
        }
    }

    /// Human renderer, or `None` in JSON mode.
    #[must_use]
    pub fn human(&self) -> Option<HumanRenderer<'_>> {
        (!self.is_json()).then(|| HumanRenderer::new(&self.output))
    }

    /// Ask the user for confirmation.
    ///
    /// When `non_interactive` is `true` (CI, `--yes` flag, or `RIGUP_YES` env),
    /// returns `default` immediately without prompting.
    ///
    /// # Errors
    ///
    /// Returns an error if the terminal prompt fails (e.g. no TTY available).
    pub fn confirm(&self, prompt: &str, default: bool) -> Result<bool> {
        if self.non_interactive {
            return Ok(default);
        }
        let confirmed = dialoguer::Confirm::new()
            .with_prompt(prompt)
            .default(default)
            .interact()?;
        Ok(confirmed)
    }

    /// The script source: `RIGUP_SOURCE`, then `source.path`, then
    /// `source.url` (or the default URL).
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be read.
    pub fn source(&self) -> Result<SourceFetcher> {
        if let Ok(location) = std::env::var(SOURCE_ENV)
            && !location.trim().is_empty()
        {
            return Ok(SourceFetcher::from_location(location.trim()));
        }
        let config = config_service::load_config(&self.config_store)?;
        let fetcher = match &config.source.path {
            Some(path) => SourceFetcher::from_location(path),
            None => SourceFetcher::from_location(config.source.effective_url()),
        };
        Ok(fetcher)
    }

    /// Descriptor lists read from [`AppContext::source`].
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be read.
    pub fn descriptors(&self) -> Result<YamlDescriptorSource<SourceFetcher>> {
        let source = self.source()?;
        tracing::debug!(source = %source.describe(), "using script source");
        Ok(YamlDescriptorSource::new(source))
    }

    /// Build an engine with a fresh scratch directory. `Ctrl-C` cancels the
    /// running script.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be read or the scratch
    /// directory cannot be created.
    pub fn engine(&self) -> Result<Engine> {
        let fetcher = self.source()?;
        let mirror = !self.output.quiet && !self.is_json();
        let sink = ConsoleSink::new(mirror, self.output.styles.clone());
        let scratch = TempScratch::new().context("cannot prepare scratch directory")?;
        let engine = InstallationEngine::new(
            fetcher,
            TokioScriptRunner::new(sink),
            scratch,
            SystemProbe::new(TokioCommandRunner),
            crate::infra::platform::detect(),
        )
        .with_cancellation(cancel_on_ctrl_c());
        Ok(engine)
    }
}

/// Root token cancelled by the first `Ctrl-C`.
#[must_use]
pub fn cancel_on_ctrl_c() -> CancellationToken {
    let token = CancellationToken::new();
    let trigger = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("interrupt received, cancelling");
            trigger.cancel();
        }
    });
    token
}

/// Remove the engine's scratch directory, logging instead of failing.
pub fn finish_engine(engine: Engine) {
    if let Err(e) = engine.cleanup() {
        tracing::warn!(error = %format!("{e:#}"), "cannot remove scratch directory");
    }
}
