// src/config/validate.rs

use std::collections::{BTreeMap, HashSet};

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{CloudworkError, Result};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = crate::errors::CloudworkError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        let scripts = merge_scripts(&raw)?;
        Ok(ConfigFile::new_unchecked(raw, scripts))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    ensure_has_workers(cfg)?;
    validate_hosts(cfg)?;
    validate_transport(cfg)?;
    Ok(())
}

fn ensure_has_workers(cfg: &RawConfigFile) -> Result<()> {
    if cfg.workers.is_empty() {
        return Err(CloudworkError::ConfigError(
            "config must contain at least one [[workers]] entry".to_string(),
        ));
    }
    Ok(())
}

fn validate_hosts(cfg: &RawConfigFile) -> Result<()> {
    let mut seen = HashSet::new();
    for worker in cfg.workers.iter() {
        let host = worker.host.as_str();
        if host.trim().is_empty() {
            return Err(CloudworkError::ConfigError(
                "worker host must not be empty".to_string(),
            ));
        }
        if host.chars().any(char::is_whitespace) {
            return Err(CloudworkError::ConfigError(format!(
                "worker host '{}' must not contain whitespace",
                host
            )));
        }
        if !seen.insert(host) {
            return Err(CloudworkError::ConfigError(format!(
                "worker host '{}' is listed more than once",
                host
            )));
        }
    }
    Ok(())
}

fn validate_transport(cfg: &RawConfigFile) -> Result<()> {
    let t = &cfg.transport;
    if t.shell.trim().is_empty() || t.sync.trim().is_empty() {
        return Err(CloudworkError::ConfigError(
            "[transport].shell and [transport].sync must name a program".to_string(),
        ));
    }
    if t.remote_script_path.trim().is_empty() {
        return Err(CloudworkError::ConfigError(
            "[transport].remote_script_path must not be empty".to_string(),
        ));
    }
    Ok(())
}

/// Fold the top-level `setup` / `run` shorthands into the script table.
///
/// Defining the same name in both places is ambiguous and rejected.
fn merge_scripts(cfg: &RawConfigFile) -> Result<BTreeMap<String, String>> {
    let mut scripts = cfg.scripts.clone();
    for (name, body) in [("setup", &cfg.setup), ("run", &cfg.run)] {
        let Some(body) = body else { continue };
        if scripts.contains_key(name) {
            return Err(CloudworkError::ConfigError(format!(
                "script '{}' is defined both at top level and in [scripts]",
                name
            )));
        }
        scripts.insert(name.to_string(), body.clone());
    }
    Ok(scripts)
}
