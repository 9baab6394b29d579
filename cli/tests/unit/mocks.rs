//! Shared mock infrastructure for unit tests.
//!
//! Provides in-memory implementations of every application port so engine and
//! batch tests run without a network, a shell or a config file.

#![allow(clippy::expect_used, dead_code)]

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Output};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Result;
use rigup_cli::application::ports::{
    ConfigStore, ContentFetcher, DescriptorSource, ProgramProbe, RunRequest, ScriptRunner,
    ScriptWorkspace,
};
use rigup_cli::application::services::engine::InstallationEngine;
use rigup_cli::domain::config::RigupConfig;
use rigup_cli::domain::error::FetchError;
use rigup_cli::domain::execution::{ExecutionResult, FailureCause, Stream, TranscriptLine};
use rigup_cli::domain::platform::Platform;
use rigup_cli::infra::scratch::TempScratch;
use rigup_common::{Environment, Tool};

// ── Output helpers ────────────────────────────────────────────────────────────

#[cfg(unix)]
pub fn exit_status(code: i32) -> ExitStatus {
    use std::os::unix::process::ExitStatusExt;
    ExitStatus::from_raw(code << 8)
}

#[cfg(windows)]
pub fn exit_status(code: i32) -> ExitStatus {
    use std::os::windows::process::ExitStatusExt;
    #[allow(clippy::cast_sign_loss)]
    ExitStatus::from_raw(code as u32)
}

pub fn ok_output(stdout: &[u8]) -> Output {
    Output {
        status: exit_status(0),
        stdout: stdout.to_vec(),
        stderr: Vec::new(),
    }
}

// ── Descriptor builders ───────────────────────────────────────────────────────

pub fn tool(name: &str, deps: &[&str]) -> Tool {
    Tool {
        name: name.to_string(),
        folder: None,
        description: None,
        dependencies: deps.iter().map(|d| (*d).to_string()).collect(),
        install: None,
        uninstall: None,
        auto_install: true,
    }
}

pub fn environment(name: &str, deps: &[&str]) -> Environment {
    Environment {
        name: name.to_string(),
        folder: None,
        description: None,
        shell: "zsh".to_string(),
        dependencies: deps.iter().map(|d| (*d).to_string()).collect(),
        setup: None,
        restore: None,
        auto_apply: true,
    }
}

pub fn linux() -> Platform {
    Platform::new("linux", Some("ubuntu".into()), Some("apt".into()))
}

// ── Fetcher ───────────────────────────────────────────────────────────────────

/// Serves scripts from an in-memory map keyed by relative path.
#[derive(Default)]
pub struct MapFetcher {
    files: HashMap<String, Vec<u8>>,
    broken: HashSet<String>,
}

impl MapFetcher {
    pub fn with(mut self, path: &str, content: &str) -> Self {
        self.files.insert(path.to_string(), content.as_bytes().to_vec());
        self
    }

    /// Make `path` fail with a transport error.
    pub fn broken(mut self, path: &str) -> Self {
        self.broken.insert(path.to_string());
        self
    }
}

impl ContentFetcher for MapFetcher {
    async fn fetch_content(&self, path: &str) -> Result<Vec<u8>, FetchError> {
        if self.broken.contains(path) {
            return Err(FetchError::Transport {
                path: path.to_string(),
                reason: "connection reset".to_string(),
            });
        }
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| FetchError::NotFound {
                path: path.to_string(),
            })
    }
}

// ── Script runner ─────────────────────────────────────────────────────────────

/// One call to [`ScriptedRunner::run`].
#[derive(Debug, Clone)]
pub struct RecordedRun {
    pub script: PathBuf,
    pub content: String,
    pub env: BTreeMap<String, String>,
    pub working_dir: PathBuf,
    pub timeout: Duration,
}

/// Reads the materialized script and answers according to its first word:
///
/// | first word | outcome                         |
/// |------------|---------------------------------|
/// | `fail N`   | exit code `N` (default 1)       |
/// | `timeout`  | killed after the timeout        |
/// | `cancel`   | killed by cancellation          |
/// | `nostart`  | interpreter could not start     |
/// | `signal`   | terminated without an exit code |
/// | anything   | exit 0                          |
#[derive(Clone, Default)]
pub struct ScriptedRunner {
    runs: Arc<Mutex<Vec<RecordedRun>>>,
}

impl ScriptedRunner {
    pub fn runs(&self) -> Vec<RecordedRun> {
        self.runs.lock().expect("runs lock").clone()
    }

    pub fn run_count(&self) -> usize {
        self.runs.lock().expect("runs lock").len()
    }
}

impl ScriptRunner for ScriptedRunner {
    async fn run(&self, request: &RunRequest<'_>) -> ExecutionResult {
        let content = std::fs::read_to_string(request.script).unwrap_or_default();
        self.runs.lock().expect("runs lock").push(RecordedRun {
            script: request.script.to_path_buf(),
            content: content.clone(),
            env: request.env.clone(),
            working_dir: request.working_dir.to_path_buf(),
            timeout: request.timeout,
        });
        respond(&content, request.timeout)
    }
}

fn respond(content: &str, timeout: Duration) -> ExecutionResult {
    let echo = TranscriptLine::new(Stream::Stdout, content.trim());
    let elapsed = Duration::from_millis(3);
    let mut words = content.split_whitespace();
    match words.next() {
        Some("fail") => {
            let code = words.next().and_then(|w| w.parse().ok()).unwrap_or(1);
            let transcript = vec![echo, TranscriptLine::new(Stream::Stderr, "boom")];
            ExecutionResult::completed(Some(code), transcript, elapsed)
        }
        Some("timeout") => ExecutionResult::timed_out(timeout, None, vec![echo], timeout),
        Some("cancel") => ExecutionResult::cancelled(None, vec![echo], elapsed),
        Some("nostart") => ExecutionResult::not_run(FailureCause::ProcessStart {
            reason: "sh: not found".to_string(),
        }),
        Some("signal") => ExecutionResult::completed(None, vec![echo], elapsed),
        _ => ExecutionResult::completed(Some(0), vec![echo], elapsed),
    }
}

// ── Workspaces ────────────────────────────────────────────────────────────────

/// Workspace whose disk is always full.
pub struct FullDiskWorkspace {
    dir: PathBuf,
}

impl FullDiskWorkspace {
    pub fn new() -> Self {
        Self {
            dir: std::env::temp_dir(),
        }
    }
}

impl ScriptWorkspace for FullDiskWorkspace {
    type Script = PathBuf;

    fn dir(&self) -> &Path {
        &self.dir
    }

    fn materialize(&self, _stem: &str, _extension: &str, _content: &[u8]) -> Result<PathBuf> {
        anyhow::bail!("no space left on device")
    }

    fn cleanup(self) -> Result<()> {
        Ok(())
    }
}

// ── Program probe ─────────────────────────────────────────────────────────────

/// Pretends a fixed set of executables is on `PATH`.
#[derive(Default)]
pub struct FakeProbe {
    present: HashSet<String>,
    version: Option<Output>,
}

impl FakeProbe {
    pub fn with_binary(mut self, name: &str) -> Self {
        self.present.insert(name.to_string());
        self
    }

    pub fn with_version_output(mut self, output: Output) -> Self {
        self.version = Some(output);
        self
    }
}

impl ProgramProbe for FakeProbe {
    fn find_in_path(&self, name: &str) -> Option<PathBuf> {
        self.present
            .contains(name)
            .then(|| PathBuf::from("/usr/local/bin").join(name))
    }

    async fn query(&self, program: &Path, _args: &[&str], _timeout: Duration) -> Result<Output> {
        self.version
            .clone()
            .ok_or_else(|| anyhow::anyhow!("cannot run {}", program.display()))
    }
}

// ── Descriptors ───────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct StaticDescriptors {
    pub tools: Vec<Tool>,
    pub environments: Vec<Environment>,
    pub unreachable: bool,
}

impl DescriptorSource for StaticDescriptors {
    async fn tools(&self) -> Result<Vec<Tool>> {
        if self.unreachable {
            anyhow::bail!("could not fetch 'tools.yaml': connection refused");
        }
        Ok(self.tools.clone())
    }

    async fn environments(&self) -> Result<Vec<Environment>> {
        if self.unreachable {
            anyhow::bail!("could not fetch 'environments.yaml': connection refused");
        }
        Ok(self.environments.clone())
    }
}

// ── Config store ──────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct MemoryConfigStore {
    config: Mutex<RigupConfig>,
    pub corrupt: bool,
}

impl MemoryConfigStore {
    pub fn with_config(config: RigupConfig) -> Self {
        Self {
            config: Mutex::new(config),
            corrupt: false,
        }
    }

    pub fn corrupt() -> Self {
        Self {
            config: Mutex::new(RigupConfig::default()),
            corrupt: true,
        }
    }

    pub fn snapshot(&self) -> RigupConfig {
        self.config.lock().expect("config lock").clone()
    }
}

impl ConfigStore for MemoryConfigStore {
    fn load(&self) -> Result<RigupConfig> {
        if self.corrupt {
            anyhow::bail!("cannot parse config.yaml");
        }
        Ok(self.snapshot())
    }

    fn save(&self, config: &RigupConfig) -> Result<()> {
        if self.corrupt {
            anyhow::bail!("config.yaml is read-only");
        }
        *self.config.lock().expect("config lock") = config.clone();
        Ok(())
    }

    fn path(&self) -> Result<PathBuf> {
        Ok(PathBuf::from("/nonexistent/.rigup/config.yaml"))
    }
}

// ── Engine wiring ─────────────────────────────────────────────────────────────

pub type TestEngine = InstallationEngine<MapFetcher, ScriptedRunner, TempScratch, FakeProbe>;

/// Engine over a real scratch directory; the returned runner shares its
/// recordings with the one inside the engine.
pub fn engine(fetcher: MapFetcher, probe: FakeProbe) -> (TestEngine, ScriptedRunner) {
    let runner = ScriptedRunner::default();
    let engine = InstallationEngine::new(
        fetcher,
        runner.clone(),
        TempScratch::new().expect("scratch dir"),
        probe,
        linux(),
    );
    (engine, runner)
}
