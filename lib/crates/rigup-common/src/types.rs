use serde::{Deserialize, Serialize};

/// A developer tool that can be installed or uninstalled by script.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Tool {
    /// Unique tool name (e.g. "ripgrep").
    pub name: String,
    /// Script folder under `tools/`. Defaults to `name` when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub folder: Option<String>,
    /// Human-readable description shown by `rigup list`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Names of other tools that must be installed first.
    #[serde(default)]
    pub dependencies: Vec<String>,
    /// Remote path of the install script, relative to the source root.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub install: Option<String>,
    /// Remote path of the uninstall script, relative to the source root.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uninstall: Option<String>,
    /// Included in `install-all` / `update-all` unless overridden locally.
    #[serde(default)]
    pub auto_install: bool,
}

/// A shell-environment configuration that can be applied or restored.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Environment {
    /// Unique environment name (e.g. "zsh-starship").
    pub name: String,
    /// Script folder under `environments/`. Defaults to `name` when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub folder: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Target shell identifier (e.g. "zsh", "bash", "pwsh").
    #[serde(default)]
    pub shell: String,
    /// Names of other environments that must be applied first.
    #[serde(default)]
    pub dependencies: Vec<String>,
    /// Remote path of the setup script.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub setup: Option<String>,
    /// Remote path of the restore script.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub restore: Option<String>,
    /// Included in `install-all` / `update-all` unless overridden locally.
    #[serde(default)]
    pub auto_apply: bool,
}

impl Tool {
    /// Script folder, falling back to the tool name.
    #[must_use]
    pub fn folder_name(&self) -> &str {
        self.folder.as_deref().unwrap_or(&self.name)
    }
}

impl Environment {
    /// Script folder, falling back to the environment name.
    #[must_use]
    pub fn folder_name(&self) -> &str {
        self.folder.as_deref().unwrap_or(&self.name)
    }
}

/// Contents of `tools.yaml` at the source root.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToolIndex {
    #[serde(default)]
    pub tools: Vec<Tool>,
}

/// Contents of `environments.yaml` at the source root.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EnvironmentIndex {
    #[serde(default)]
    pub environments: Vec<Environment>,
}
