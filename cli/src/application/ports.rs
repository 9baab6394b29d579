//! Port trait definitions for the Application layer.
//!
//! Ports are the interfaces (contracts) that infrastructure must fulfill.
//! This file imports only from `crate::domain`; never from `crate::infra`,
//! `crate::commands`, or `crate::output`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::Output;
use std::time::Duration;

use anyhow::Result;
use rigup_common::{Environment, Tool};
use tokio_util::sync::CancellationToken;

use crate::domain::config::RigupConfig;
use crate::domain::error::FetchError;
use crate::domain::execution::{ExecutionResult, TranscriptLine};

// ── Content Source Ports ──────────────────────────────────────────────────────

/// Retrieves raw bytes by relative path from the configured script source.
#[allow(async_fn_in_trait)]
pub trait ContentFetcher {
    /// Fetch the content at `path`, relative to the source root.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::NotFound`] when the path does not exist and
    /// [`FetchError::Transport`] for every other failure.
    async fn fetch_content(&self, path: &str) -> Result<Vec<u8>, FetchError>;
}

/// Loads the tool and environment descriptor lists.
#[allow(async_fn_in_trait)]
pub trait DescriptorSource {
    /// All published tools, in source order.
    async fn tools(&self) -> Result<Vec<Tool>>;
    /// All published environments, in source order.
    async fn environments(&self) -> Result<Vec<Environment>>;
}

// ── Process Ports ─────────────────────────────────────────────────────────────

/// Parameters for one script run.
#[derive(Debug, Clone, Copy)]
pub struct RunRequest<'a> {
    /// Script file to execute with the platform shell.
    pub script: &'a Path,
    pub working_dir: &'a Path,
    /// Variables added to the inherited environment.
    pub env: &'a BTreeMap<String, String>,
    pub timeout: Duration,
    /// Cancelling this token kills the script and its process group.
    pub cancel: &'a CancellationToken,
}

/// Runs a script file and captures its tagged, ordered transcript.
#[allow(async_fn_in_trait)]
pub trait ScriptRunner {
    /// Run the script to completion, timeout or cancellation.
    ///
    /// Never fails: start failures, timeouts and cancellations are reported
    /// through [`ExecutionResult::failure`].
    async fn run(&self, request: &RunRequest<'_>) -> ExecutionResult;
}

/// Receives transcript lines as they are produced. Sync trait, called from
/// the runner's collection loop.
pub trait OutputSink {
    fn line(&self, line: &TranscriptLine);
}

/// Abstracts process execution so infrastructure can be swapped or mocked.
#[allow(async_fn_in_trait)]
pub trait CommandRunner {
    /// Run a program with a timeout and capture its output.
    ///
    /// # Errors
    ///
    /// Returns an error if the process cannot be spawned or exceeds `timeout`.
    /// On timeout, the child process must be killed (not left orphaned).
    async fn run_with_timeout(
        &self,
        program: &Path,
        args: &[&str],
        timeout: Duration,
    ) -> Result<Output>;
}

/// Looks up and queries installed executables.
#[allow(async_fn_in_trait)]
pub trait ProgramProbe {
    /// Absolute path of `name` on `PATH`, if present.
    fn find_in_path(&self, name: &str) -> Option<PathBuf>;
    /// Run `program` with `args`, killing it after `timeout`.
    ///
    /// # Errors
    ///
    /// Returns an error if the program cannot be started or times out.
    async fn query(&self, program: &Path, args: &[&str], timeout: Duration) -> Result<Output>;
}

// ── Filesystem Ports ──────────────────────────────────────────────────────────

/// Owns the per-engine scratch directory that fetched scripts are written to.
pub trait ScriptWorkspace {
    /// Guard for one materialized script. Dropping it deletes the file.
    type Script: AsRef<Path>;

    /// The scratch directory, exported to scripts as their temp directory.
    fn dir(&self) -> &Path;

    /// Write `content` to a fresh executable file named after `stem`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created or written.
    fn materialize(&self, stem: &str, extension: &str, content: &[u8]) -> Result<Self::Script>;

    /// Remove the scratch directory and everything in it.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be removed.
    fn cleanup(self) -> Result<()>
    where
        Self: Sized;
}

// ── Configuration Port ────────────────────────────────────────────────────────

/// Abstracts configuration persistence.
pub trait ConfigStore {
    /// Load the configuration, returning defaults when none is stored.
    ///
    /// # Errors
    ///
    /// Returns an error if the stored file cannot be read or parsed.
    fn load(&self) -> Result<RigupConfig>;
    /// Persist the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    fn save(&self, config: &RigupConfig) -> Result<()>;
    /// Location of the configuration file.
    ///
    /// # Errors
    ///
    /// Returns an error if the location cannot be determined.
    fn path(&self) -> Result<PathBuf>;
}
