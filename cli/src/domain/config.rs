//! Domain types and validators for rigup configuration.
//!
//! Pure functions only: no I/O, no async, no filesystem access.

use std::collections::BTreeMap;

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::error::ConfigError;
use crate::domain::installable::Action;

// ── Constants ────────────────────────────────────────────────────────────────

/// Script source used when neither a URL nor a local path is configured.
pub const DEFAULT_SOURCE_URL: &str =
    "https://raw.githubusercontent.com/rigup-dev/rigup-scripts/main";

/// Oldest history entries are dropped beyond this many.
pub const MAX_HISTORY: usize = 200;

pub const VALID_CONFIG_KEYS: &[&str] = &[
    "source.url",
    "source.path",
    "tools.<name>.auto",
    "environments.<name>.auto",
];
pub const VALID_OVERRIDE_VALUES: &[&str] = &["true", "false", "default"];

// ── Config schema ────────────────────────────────────────────────────────────

/// Top-level configuration stored in `~/.rigup/config.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RigupConfig {
    pub source: SourceConfig,
    pub overrides: Overrides,
    pub history: Vec<HistoryEntry>,
}

/// Where scripts and descriptor lists come from. A local path wins over a URL.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl SourceConfig {
    /// The URL to fetch from when no local path is set.
    #[must_use]
    pub fn effective_url(&self) -> &str {
        self.url.as_deref().unwrap_or(DEFAULT_SOURCE_URL)
    }
}

/// Local replacements for the descriptors' auto flags, keyed by item name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Overrides {
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub tools: BTreeMap<String, bool>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub environments: BTreeMap<String, bool>,
}

/// A successful action, recorded for `rigup config show`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub name: String,
    pub action: Action,
    pub at: DateTime<Utc>,
}

/// A parsed `config set` key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigKey {
    SourceUrl,
    SourcePath,
    ToolAuto(String),
    EnvironmentAuto(String),
}

// ── Validators ───────────────────────────────────────────────────────────────

/// Parses and validates a configuration key.
///
/// # Errors
///
/// Returns an error if the key does not match any of [`VALID_CONFIG_KEYS`].
pub fn validate_config_key(key: &str) -> Result<ConfigKey> {
    let parsed = match key {
        "source.url" => Some(ConfigKey::SourceUrl),
        "source.path" => Some(ConfigKey::SourcePath),
        _ => parse_override_key(key),
    };
    parsed.ok_or_else(|| {
        ConfigError::UnknownKey {
            key: key.to_string(),
            valid: VALID_CONFIG_KEYS.join(", "),
        }
        .into()
    })
}

fn parse_override_key(key: &str) -> Option<ConfigKey> {
    let (section, rest) = key.split_once('.')?;
    let name = rest.strip_suffix(".auto")?;
    if name.is_empty() {
        return None;
    }
    match section {
        "tools" => Some(ConfigKey::ToolAuto(name.to_string())),
        "environments" => Some(ConfigKey::EnvironmentAuto(name.to_string())),
        _ => None,
    }
}

/// Validates a configuration value for the given key.
///
/// # Errors
///
/// Returns an error if the value is not valid for the key.
pub fn validate_config_value(key: &ConfigKey, value: &str) -> Result<()> {
    match key {
        ConfigKey::SourceUrl => {
            if !(value.starts_with("https://") || value.starts_with("http://")) {
                return Err(ConfigError::InvalidValue {
                    key: "source.url".to_string(),
                    value: value.to_string(),
                    valid: "an http:// or https:// URL, or 'default'".to_string(),
                }
                .into());
            }
        }
        ConfigKey::SourcePath => {
            if value.trim().is_empty() {
                return Err(ConfigError::InvalidValue {
                    key: "source.path".to_string(),
                    value: value.to_string(),
                    valid: "a directory path, or 'default'".to_string(),
                }
                .into());
            }
        }
        ConfigKey::ToolAuto(name) | ConfigKey::EnvironmentAuto(name) => {
            if !VALID_OVERRIDE_VALUES.contains(&value) {
                let section = if matches!(key, ConfigKey::ToolAuto(_)) {
                    "tools"
                } else {
                    "environments"
                };
                return Err(ConfigError::InvalidValue {
                    key: format!("{section}.{name}.auto"),
                    value: value.to_string(),
                    valid: VALID_OVERRIDE_VALUES.join(", "),
                }
                .into());
            }
        }
    }
    Ok(())
}

/// Applies a validated setting. `default` clears the stored value.
///
/// # Errors
///
/// Returns an error if the value is not valid for the key.
pub fn apply_setting(config: &mut RigupConfig, key: &ConfigKey, value: &str) -> Result<()> {
    let clear = value == "default";
    if !clear {
        validate_config_value(key, value)?;
    }
    match key {
        ConfigKey::SourceUrl => config.source.url = (!clear).then(|| value.to_string()),
        ConfigKey::SourcePath => config.source.path = (!clear).then(|| value.to_string()),
        ConfigKey::ToolAuto(name) => set_override(&mut config.overrides.tools, name, value),
        ConfigKey::EnvironmentAuto(name) => {
            set_override(&mut config.overrides.environments, name, value);
        }
    }
    Ok(())
}

fn set_override(map: &mut BTreeMap<String, bool>, name: &str, value: &str) {
    match value {
        "true" => {
            map.insert(name.to_string(), true);
        }
        "false" => {
            map.insert(name.to_string(), false);
        }
        _ => {
            map.remove(name);
        }
    }
}

/// Appends a history entry, keeping at most [`MAX_HISTORY`] entries.
pub fn record_history(config: &mut RigupConfig, name: &str, action: Action, at: DateTime<Utc>) {
    config.history.push(HistoryEntry {
        name: name.to_string(),
        action,
        at,
    });
    if config.history.len() > MAX_HISTORY {
        let excess = config.history.len() - MAX_HISTORY;
        config.history.drain(..excess);
    }
}

// ── Unit tests ───────────────────────────────────────────────────────────────
