//! Human-readable terminal renderer.

use std::path::Path;
use std::time::Duration;

use owo_colors::OwoColorize as _;

use crate::domain::batch::{BatchReport, ItemResult};
use crate::domain::config::RigupConfig;
use crate::domain::platform::Platform;
use crate::output::{ListEntry, OutputContext};

/// How many history entries `config show` prints.
const HISTORY_SHOWN: usize = 10;

/// Renders domain types as human-readable terminal output using `OutputContext`.
pub struct HumanRenderer<'a> {
    ctx: &'a OutputContext,
}

impl<'a> HumanRenderer<'a> {
    /// Create a new `HumanRenderer` wrapping the given output context.
    #[must_use]
    pub fn new(ctx: &'a OutputContext) -> Self {
        Self { ctx }
    }

    /// Render the CLI version information.
    pub fn render_version(&self, version: &str) {
        println!("rigup {version}");
    }

    /// Render the outcome of one action. Failures go to stderr and are never
    /// suppressed.
    pub fn render_item_result(&self, result: &ItemResult) {
        if let Some(error) = &result.error {
            self.ctx.error(error);
            return;
        }
        if result.skipped {
            let note = result.result.transcript.first().map_or("skipped", |l| l.text.as_str());
            self.ctx.info(note);
            return;
        }
        self.ctx.success(&format!(
            "{} {} ({})",
            result.action,
            result.name,
            format_duration(result.result.duration)
        ));
    }

    /// Render the outcome of `rigup verify`.
    pub fn render_verify(&self, installed: bool, message: &str) {
        if installed {
            self.ctx.success(message);
        } else {
            self.ctx.error(message);
        }
    }

    /// Render one finished batch item as `[index/total] ...`.
    pub fn render_batch_item(&self, index: usize, total: usize, result: &ItemResult) {
        let position = format!("[{index}/{total}]");
        let position = position.style(self.ctx.styles.dim);
        if let Some(error) = &result.error {
            self.ctx.error(&format!("{position} {error}"));
        } else if result.skipped {
            self.ctx.info(&format!("{position} {} already installed", result.name));
        } else {
            self.ctx.success(&format!(
                "{position} {} {} ({})",
                result.action,
                result.name,
                format_duration(result.result.duration)
            ));
        }
    }

    /// Render the summary of a finished batch.
    pub fn render_batch_report(&self, report: &BatchReport) {
        if report.results.is_empty() {
            self.ctx.info("Nothing selected; enable items with `rigup config set`.");
            return;
        }
        println!();
        let total = report.results.len();
        let succeeded = report.succeeded_count();
        if succeeded == total {
            self.ctx
                .success(&format!("{} finished: {succeeded}/{total} succeeded", report.kind));
            return;
        }
        self.ctx.warn(&format!(
            "{} finished: {succeeded}/{total} succeeded",
            report.kind
        ));
        for failure in report.failures() {
            let reason = failure
                .error
                .clone()
                .or_else(|| failure.result.failure.as_ref().map(ToString::to_string))
                .unwrap_or_else(|| "failed".to_string());
            self.ctx.error(&format!("{} {}: {reason}", failure.kind, failure.name));
        }
    }

    /// Render the tool and environment listing.
    pub fn render_list(&self, tools: &[ListEntry], environments: &[ListEntry]) {
        self.render_section("Tools:", tools);
        println!();
        self.render_section("Environments:", environments);
    }

    fn render_section(&self, title: &str, entries: &[ListEntry]) {
        self.ctx.header(title);
        if entries.is_empty() {
            self.ctx.info("none published");
            return;
        }
        let width = entries.iter().map(|e| e.name.len()).max().unwrap_or(0);
        for entry in entries {
            let marker = match entry.installed {
                Some(true) => "✓".style(self.ctx.styles.success).to_string(),
                Some(false) => "·".style(self.ctx.styles.dim).to_string(),
                None => " ".to_string(),
            };
            let auto = match (entry.auto, entry.overridden) {
                (true, false) => "auto",
                (true, true) => "auto*",
                (false, false) => "",
                (false, true) => "off*",
            };
            println!(
                "  {marker} {:<width$}  {:<5}  {}",
                entry.name,
                auto.style(self.ctx.styles.info),
                entry.description.as_deref().unwrap_or("").style(self.ctx.styles.dim),
            );
        }
    }

    /// Render the detected platform.
    pub fn render_platform(&self, platform: &Platform) {
        self.ctx.kv("Platform:       ", platform.os());
        self.ctx.kv(
            "Distribution:   ",
            platform.distribution().unwrap_or("unknown"),
        );
        self.ctx.kv("Package manager:", platform.package_manager_label());
        self.ctx.kv("Script type:    ", platform.script_extension());
    }

    /// Render the current configuration.
    pub fn render_config(&self, config: &RigupConfig, path: &Path) {
        println!();
        println!(
            "  {}",
            format!("Configuration ({})", path.display()).style(self.ctx.styles.header)
        );
        println!();
        println!(
            "  {:<20} {}",
            "source.url:",
            config.source.url.as_deref().unwrap_or("(default)")
        );
        println!(
            "  {:<20} {}",
            "source.path:",
            config.source.path.as_deref().unwrap_or("(not set)")
        );
        for (name, auto) in &config.overrides.tools {
            println!("  {:<20} {auto}", format!("tools.{name}.auto:"));
        }
        for (name, auto) in &config.overrides.environments {
            println!("  {:<20} {auto}", format!("environments.{name}.auto:"));
        }
        if !config.history.is_empty() {
            println!();
            println!("  {}", "Recent activity:".style(self.ctx.styles.bold));
            for entry in config.history.iter().rev().take(HISTORY_SHOWN) {
                println!(
                    "    {}  {} {}",
                    entry.at.format("%Y-%m-%d %H:%M").style(self.ctx.styles.dim),
                    entry.action,
                    entry.name
                );
            }
        }
        println!();
        println!("  {}", "Environment:".style(self.ctx.styles.bold));
        for var in ["RIGUP_CONFIG", "RIGUP_SOURCE", "RIGUP_LOG", "NO_COLOR"] {
            println!(
                "    {:<18} {}",
                format!("{var}:"),
                std::env::var(var).unwrap_or_else(|_| "(not set)".to_string())
            );
        }
        println!();
    }
}

/// Format a duration as `850ms`, `12.3s` or `4m 05s`.
#[must_use]
pub fn format_duration(duration: Duration) -> String {
    let millis = duration.as_millis();
    if millis < 1000 {
        return format!("{millis}ms");
    }
    let secs = duration.as_secs();
    if secs < 60 {
        return format!("{}.{}s", secs, duration.subsec_millis() / 100);
    }
    format!("{}m {:02}s", secs / 60, secs % 60)
}
