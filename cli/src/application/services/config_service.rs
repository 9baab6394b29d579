//! Application service: configuration use-cases.

use anyhow::Result;
use chrono::{DateTime, Utc};

use crate::application::ports::ConfigStore;
use crate::domain::config::{RigupConfig, apply_setting, record_history, validate_config_key};
use crate::domain::installable::Action;

/// Load configuration.
pub fn load_config(store: &impl ConfigStore) -> Result<RigupConfig> {
    store.load()
}

/// Validate and persist one `key = value` setting.
///
/// # Errors
///
/// Returns an error if the key or value is invalid, or the store fails.
pub fn set_value(store: &impl ConfigStore, key: &str, value: &str) -> Result<RigupConfig> {
    let key = validate_config_key(key)?;
    let mut config = store.load()?;
    apply_setting(&mut config, &key, value)?;
    store.save(&config)?;
    Ok(config)
}

/// Append a history entry for a successful action and persist it.
///
/// # Errors
///
/// Returns an error if the config cannot be loaded or saved.
pub fn record_success(
    store: &impl ConfigStore,
    name: &str,
    action: Action,
    at: DateTime<Utc>,
) -> Result<()> {
    let mut config = store.load()?;
    record_history(&mut config, name, action, at);
    store.save(&config)
}
