//! CLI argument parsing with clap derive

use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::app::{AppContext, AppFlags, BehaviourFlags, OutputFlags};
use crate::commands;
use crate::domain::batch::BatchKind;

/// Install developer tools and shell environments from a script repository
#[derive(Parser)]
#[command(
    name = "rigup",
    version,
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress non-error output (script output is not mirrored)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output (any non-empty NO_COLOR also disables it)
    #[arg(
        long,
        global = true,
        env = "NO_COLOR",
        value_parser = clap::builder::FalseyValueParser::new()
    )]
    pub no_color: bool,

    /// Log debug events to stderr (overridden by RIGUP_LOG)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Skip confirmation prompts
    #[arg(short, long, global = true)]
    pub yes: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Install a tool
    Install {
        /// Tool name as published in tools.yaml
        tool: String,
    },

    /// Uninstall a tool
    Uninstall {
        /// Tool name as published in tools.yaml
        tool: String,
    },

    /// Apply a shell environment
    Apply {
        /// Environment name as published in environments.yaml
        environment: String,
    },

    /// Restore a shell environment to its previous state
    Restore {
        /// Environment name as published in environments.yaml
        environment: String,
    },

    /// Install every selected tool not yet on PATH, then apply every
    /// selected environment
    InstallAll,

    /// Re-run every selected tool's installer, then re-apply every selected
    /// environment
    UpdateAll,

    /// List published tools and environments
    List,

    /// Check that a tool is installed and show its version
    Verify {
        /// Tool name as published in tools.yaml
        tool: String,
    },

    /// Show the detected platform
    Platform,

    /// Manage configuration
    #[command(subcommand)]
    Config(commands::config::ConfigCommand),

    /// Show version
    Version,
}

impl Cli {
    /// Execute the CLI command.
    ///
    /// # Errors
    ///
    /// Returns an error if the command fails before producing a result.
    pub async fn run(self) -> Result<ExitCode> {
        let Cli {
            json,
            quiet,
            no_color,
            verbose: _,
            yes,
            command,
        } = self;
        let app = AppContext::new(&AppFlags {
            output: OutputFlags {
                no_color,
                quiet,
                json,
            },
            behaviour: BehaviourFlags { yes },
        });

        match command {
            Command::Install { tool } => commands::tool::install(&app, &tool).await,
            Command::Uninstall { tool } => commands::tool::uninstall(&app, &tool).await,
            Command::Verify { tool } => commands::tool::verify(&app, &tool).await,
            Command::Apply { environment } => {
                commands::environment::apply(&app, &environment).await
            }
            Command::Restore { environment } => {
                commands::environment::restore(&app, &environment).await
            }
            Command::InstallAll => commands::batch::run(&app, BatchKind::InstallAll).await,
            Command::UpdateAll => commands::batch::run(&app, BatchKind::UpdateAll).await,
            Command::List => commands::list::run(&app).await,
            Command::Platform => commands::platform::run(&app),
            Command::Config(cmd) => commands::config::run(&app, cmd),
            Command::Version => commands::version::run(&app),
        }
    }
}
