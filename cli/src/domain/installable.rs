//! The shared lifecycle abstraction over tools and environments.
//!
//! Both variants flow through the same fetch → materialize → run → translate
//! pipeline; they differ only in which script slot an [`Action`] selects and
//! which variables end up in the script environment.

use std::collections::BTreeMap;
use std::fmt;

use rigup_common::{Environment, Tool};
use serde::{Deserialize, Serialize};

use crate::domain::platform::Platform;

pub const TOOL_NAME_VAR: &str = "TOOL_NAME";
pub const ENV_NAME_VAR: &str = "ENV_NAME";
pub const ENV_SHELL_VAR: &str = "ENV_SHELL";
pub const PLATFORM_VAR: &str = "PLATFORM";
pub const PACKAGE_MANAGER_VAR: &str = "PACKAGE_MANAGER";
pub const TEMP_DIR_VAR: &str = "TEMP_DIR";

/// Native temp-directory variables, all pointed at the scratch directory.
pub const NATIVE_TEMP_VARS: [&str; 3] = ["TMPDIR", "TEMP", "TMP"];

/// Which descriptor set an item belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Tool,
    Environment,
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Tool => "tool",
            Self::Environment => "environment",
        })
    }
}

/// A lifecycle action on an installable item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Install,
    Uninstall,
    Apply,
    Restore,
}

impl Action {
    /// Which item kind this action applies to.
    #[must_use]
    pub fn kind(self) -> ItemKind {
        match self {
            Self::Install | Self::Uninstall => ItemKind::Tool,
            Self::Apply | Self::Restore => ItemKind::Environment,
        }
    }

    /// File stem of the default script for this action.
    #[must_use]
    pub fn script_stem(self) -> &'static str {
        match self {
            Self::Install => "install",
            Self::Uninstall => "uninstall",
            Self::Apply => "setup",
            Self::Restore => "restore",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Install => "install",
            Self::Uninstall => "uninstall",
            Self::Apply => "apply",
            Self::Restore => "restore",
        })
    }
}

/// Common view of a tool or environment descriptor.
pub trait Installable {
    fn name(&self) -> &str;
    fn folder(&self) -> &str;
    fn dependencies(&self) -> &[String];
    fn kind(&self) -> ItemKind;
    /// The descriptor's own `auto_install` / `auto_apply` flag.
    fn auto_selected(&self) -> bool;
    /// Remote script path for `action`, or `None` when the action does not
    /// apply to this kind of item.
    fn script_path(&self, action: Action, extension: &str) -> Option<String>;
    /// Variables specific to this kind of item.
    fn identity_vars(&self) -> Vec<(&'static str, String)>;
}

impl Installable for Tool {
    fn name(&self) -> &str {
        &self.name
    }

    fn folder(&self) -> &str {
        self.folder_name()
    }

    fn dependencies(&self) -> &[String] {
        &self.dependencies
    }

    fn kind(&self) -> ItemKind {
        ItemKind::Tool
    }

    fn auto_selected(&self) -> bool {
        self.auto_install
    }

    fn script_path(&self, action: Action, extension: &str) -> Option<String> {
        let explicit = match action {
            Action::Install => self.install.as_deref(),
            Action::Uninstall => self.uninstall.as_deref(),
            Action::Apply | Action::Restore => return None,
        };
        Some(explicit.map_or_else(
            || default_script_path("tools", self.folder_name(), action, extension),
            str::to_owned,
        ))
    }

    fn identity_vars(&self) -> Vec<(&'static str, String)> {
        vec![(TOOL_NAME_VAR, self.name.clone())]
    }
}

impl Installable for Environment {
    fn name(&self) -> &str {
        &self.name
    }

    fn folder(&self) -> &str {
        self.folder_name()
    }

    fn dependencies(&self) -> &[String] {
        &self.dependencies
    }

    fn kind(&self) -> ItemKind {
        ItemKind::Environment
    }

    fn auto_selected(&self) -> bool {
        self.auto_apply
    }

    fn script_path(&self, action: Action, extension: &str) -> Option<String> {
        let explicit = match action {
            Action::Apply => self.setup.as_deref(),
            Action::Restore => self.restore.as_deref(),
            Action::Install | Action::Uninstall => return None,
        };
        Some(explicit.map_or_else(
            || default_script_path("environments", self.folder_name(), action, extension),
            str::to_owned,
        ))
    }

    fn identity_vars(&self) -> Vec<(&'static str, String)> {
        vec![
            (ENV_NAME_VAR, self.name.clone()),
            (ENV_SHELL_VAR, self.shell.clone()),
        ]
    }
}

fn default_script_path(root: &str, folder: &str, action: Action, extension: &str) -> String {
    format!("{root}/{folder}/{}.{extension}", action.script_stem())
}

/// Build the complete environment overlay for one script run.
#[must_use]
pub fn script_environment(
    item: &(impl Installable + ?Sized),
    platform: &Platform,
    scratch_dir: &str,
) -> BTreeMap<String, String> {
    let mut env: BTreeMap<String, String> = item
        .identity_vars()
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();
    env.insert(PLATFORM_VAR.to_string(), platform.os().to_string());
    env.insert(
        PACKAGE_MANAGER_VAR.to_string(),
        platform.package_manager_label().to_string(),
    );
    env.insert(TEMP_DIR_VAR.to_string(), scratch_dir.to_string());
    for var in NATIVE_TEMP_VARS {
        env.insert(var.to_string(), scratch_dir.to_string());
    }
    env
}

/// Executable names probed on `PATH` for a tool, primary name first.
#[must_use]
pub fn executable_name_variants(name: &str, folder: &str) -> Vec<String> {
    let lower = name.to_ascii_lowercase();
    let mut variants = vec![
        name.to_string(),
        lower.clone(),
        lower.replace('-', "_"),
        lower.replace('_', "-"),
        lower.replace(['-', '_', ' '], ""),
        folder.to_string(),
    ];
    let mut seen = std::collections::HashSet::new();
    variants.retain(|v| !v.is_empty() && seen.insert(v.clone()));
    variants
}

/// File-name-safe stem derived from an item name.
#[must_use]
pub fn sanitize_file_stem(name: &str) -> String {
    let stem: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    if stem.is_empty() { "script".to_string() } else { stem }
}
