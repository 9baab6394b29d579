//! Application service: the installation engine.
//!
//! One pipeline serves all four actions: resolve the script path, fetch it,
//! write it to the scratch directory, run it with the item's environment and
//! translate the outcome.

use std::path::Path;
use std::time::Duration;

use rigup_common::{Environment, Tool};
use tokio_util::sync::CancellationToken;

use crate::application::ports::{
    ContentFetcher, ProgramProbe, RunRequest, ScriptRunner, ScriptWorkspace,
};
use crate::domain::error::{FetchError, InstallError};
use crate::domain::execution::{ExecutionResult, FailureCause};
use crate::domain::installable::{
    Action, Installable, executable_name_variants, sanitize_file_stem, script_environment,
};
use crate::domain::platform::Platform;

/// Hard bound on a single install/uninstall/apply/restore script.
pub const SCRIPT_TIMEOUT: Duration = Duration::from_secs(600);

/// Bound on each version query made by [`InstallationEngine::verify_installation`].
pub const VERSION_QUERY_TIMEOUT: Duration = Duration::from_secs(5);

/// Arguments tried in order when asking a binary for its version.
const VERSION_ARGS: [&str; 4] = ["--version", "-v", "version", "--help"];

/// Runs lifecycle scripts for tools and environments.
///
/// Owns a private scratch directory for the lifetime of the engine; every
/// action writes its script there under a unique name.
pub struct InstallationEngine<F, R, W, P> {
    fetcher: F,
    runner: R,
    workspace: W,
    probe: P,
    platform: Platform,
    cancel: CancellationToken,
    timeout: Duration,
}

impl<F, R, W, P> InstallationEngine<F, R, W, P>
where
    F: ContentFetcher,
    R: ScriptRunner,
    W: ScriptWorkspace,
    P: ProgramProbe,
{
    pub fn new(fetcher: F, runner: R, workspace: W, probe: P, platform: Platform) -> Self {
        Self {
            fetcher,
            runner,
            workspace,
            probe,
            platform,
            cancel: CancellationToken::new(),
            timeout: SCRIPT_TIMEOUT,
        }
    }

    /// Use `cancel` as the root token for every script this engine runs.
    #[must_use]
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Replace [`SCRIPT_TIMEOUT`] for every script this engine runs.
    #[must_use]
    pub fn with_script_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn platform(&self) -> &Platform {
        &self.platform
    }

    pub fn scratch_dir(&self) -> &Path {
        self.workspace.dir()
    }

    /// Run the tool's install script.
    ///
    /// # Errors
    ///
    /// See [`InstallationEngine::execute`].
    pub async fn install_tool(&self, tool: &Tool) -> Result<ExecutionResult, InstallError> {
        self.execute(tool, Action::Install).await
    }

    /// Run the tool's uninstall script.
    ///
    /// # Errors
    ///
    /// See [`InstallationEngine::execute`].
    pub async fn uninstall_tool(&self, tool: &Tool) -> Result<ExecutionResult, InstallError> {
        self.execute(tool, Action::Uninstall).await
    }

    /// Run the environment's setup script.
    ///
    /// # Errors
    ///
    /// See [`InstallationEngine::execute`].
    pub async fn apply_environment(
        &self,
        environment: &Environment,
    ) -> Result<ExecutionResult, InstallError> {
        self.execute(environment, Action::Apply).await
    }

    /// Run the environment's restore script.
    ///
    /// # Errors
    ///
    /// See [`InstallationEngine::execute`].
    pub async fn restore_environment(
        &self,
        environment: &Environment,
    ) -> Result<ExecutionResult, InstallError> {
        self.execute(environment, Action::Restore).await
    }

    /// Run `action` for `item` through the full pipeline.
    ///
    /// # Errors
    ///
    /// Returns an [`InstallError`] for every unsuccessful outcome. Timeouts,
    /// cancellations and non-zero exits carry the captured transcript.
    pub async fn execute<T>(
        &self,
        item: &T,
        action: Action,
    ) -> Result<ExecutionResult, InstallError>
    where
        T: Installable + ?Sized,
    {
        let name = item.name().to_string();
        let extension = self.platform.script_extension();
        let path = item
            .script_path(action, extension)
            .filter(|p| !p.trim().is_empty())
            .ok_or_else(|| InstallError::ScriptNotDefined {
                name: name.clone(),
                kind: item.kind(),
                action,
            })?;

        if self.cancel.is_cancelled() {
            return Err(InstallError::Cancelled {
                name,
                action,
                result: Box::new(ExecutionResult::cancelled(None, Vec::new(), Duration::ZERO)),
            });
        }

        tracing::debug!(item = %name, %action, script = %path, "fetching script");
        let content = self
            .fetcher
            .fetch_content(&path)
            .await
            .map_err(|error| InstallError::Fetch {
                name: name.clone(),
                action,
                error,
            })?;

        let stem = format!("{}-{}", sanitize_file_stem(&name), action.script_stem());
        let script = self
            .workspace
            .materialize(&stem, extension, &content)
            .map_err(|e| InstallError::ScriptMaterialization {
                name: name.clone(),
                action,
                reason: format!("{e:#}"),
            })?;

        let scratch = self.workspace.dir().to_string_lossy().into_owned();
        let env = script_environment(item, &self.platform, &scratch);
        let request = RunRequest {
            script: script.as_ref(),
            working_dir: self.workspace.dir(),
            env: &env,
            timeout: self.timeout,
            cancel: &self.cancel,
        };
        let result = self.runner.run(&request).await;
        drop(script);

        tracing::info!(
            item = %name,
            %action,
            exit_code = result.exit_code,
            elapsed_ms = u64::try_from(result.duration.as_millis()).unwrap_or(u64::MAX),
            success = result.success,
            "script finished"
        );
        self.translate(name, action, &path, result)
    }

    fn translate(
        &self,
        name: String,
        action: Action,
        path: &str,
        result: ExecutionResult,
    ) -> Result<ExecutionResult, InstallError> {
        let Some(cause) = result.failure.clone() else {
            return Ok(result);
        };
        Err(match cause {
            FailureCause::ProcessStart { reason } => {
                InstallError::ProcessStart { name, action, reason }
            }
            FailureCause::Materialization { reason } => {
                InstallError::ScriptMaterialization { name, action, reason }
            }
            FailureCause::Fetch { reason } => InstallError::Fetch {
                name,
                action,
                error: FetchError::Transport {
                    path: path.to_string(),
                    reason,
                },
            },
            FailureCause::Timeout { .. } => InstallError::Timeout {
                name,
                action,
                timeout: self.timeout,
                result: Box::new(result),
            },
            FailureCause::Cancelled => InstallError::Cancelled {
                name,
                action,
                result: Box::new(result),
            },
            FailureCause::NonZeroExit { code } => InstallError::NonZeroExit {
                name,
                action,
                code,
                result: Box::new(result),
            },
            FailureCause::Terminated => InstallError::NonZeroExit {
                name,
                action,
                code: result.exit_code,
                result: Box::new(result),
            },
        })
    }

    /// Whether any executable name variant of `tool` is on `PATH`.
    ///
    /// A heuristic: a binary with a matching name may belong to something else.
    pub fn is_installed(&self, tool: &Tool) -> bool {
        self.locate(tool).is_some()
    }

    fn locate(&self, tool: &Tool) -> Option<std::path::PathBuf> {
        executable_name_variants(&tool.name, tool.folder_name())
            .iter()
            .find_map(|variant| self.probe.find_in_path(variant))
    }

    /// Check that `tool` is on `PATH` and report its version line.
    pub async fn verify_installation(&self, tool: &Tool) -> (bool, String) {
        let Some(binary) = self.locate(tool) else {
            return (false, format!("{} was not found in PATH", tool.name));
        };
        for arg in VERSION_ARGS {
            match self.probe.query(&binary, &[arg], VERSION_QUERY_TIMEOUT).await {
                Ok(output) if output.status.success() => {
                    if let Some(line) =
                        first_line(&output.stdout).or_else(|| first_line(&output.stderr))
                    {
                        return (true, line);
                    }
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::debug!(tool = %tool.name, arg, error = %e, "version query failed");
                }
            }
        }
        (true, format!("{} is present in PATH", tool.name))
    }

    /// Remove the scratch directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be removed.
    pub fn cleanup(self) -> anyhow::Result<()> {
        self.workspace.cleanup()
    }
}

fn first_line(bytes: &[u8]) -> Option<String> {
    String::from_utf8_lossy(bytes)
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .map(str::to_string)
}
