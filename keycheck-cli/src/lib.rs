//! Library side of the `keycheck` binary.
//!
//! Loads the validator config from TOML, reads the snapshot saved by the
//! previous run, performs one check and writes back any fresh snapshot.
//! The validator itself never touches disk; this is the only place the
//! offline key is persisted.

use anyhow::{Context, Result};
use keycheck_license::{
    check, CheckResult, EnvironmentContext, HttpRemoteClient, ValidatorConfig,
};
use std::{fs, io, path::Path, path::PathBuf, sync::Arc, time::Duration};
use tracing::{debug, info};

/// Host attributes given on the command line.
#[derive(Debug, Clone, Default)]
pub struct EnvironmentOverrides {
    pub domain: Option<String>,
    pub ip_address: Option<String>,
    pub directory: Option<String>,
}

impl EnvironmentOverrides {
    /// Detects the environment and replaces any overridden attribute.
    pub fn resolve(self) -> EnvironmentContext {
        let detected = EnvironmentContext::detect();
        EnvironmentContext {
            domain: self.domain.unwrap_or(detected.domain),
            ip_address: self.ip_address.unwrap_or(detected.ip_address),
            directory: self.directory.unwrap_or(detected.directory),
        }
    }
}

/// Everything one run needs.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub config: PathBuf,
    pub license_key: String,
    pub state: PathBuf,
    pub environment: EnvironmentContext,
    pub timeout: Duration,
}

/// Reads a TOML validator config.
pub fn load_config(path: &Path) -> Result<ValidatorConfig> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    toml::from_str(&raw).with_context(|| format!("Failed to parse config file {}", path.display()))
}

/// Reads the saved offline key; a missing state file means none.
pub fn read_state(path: &Path) -> Result<String> {
    match fs::read_to_string(path) {
        Ok(state) => Ok(state.trim().to_string()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            debug!("No state file at {:?}", path);
            Ok(String::new())
        }
        Err(e) => Err(e).with_context(|| format!("Failed to read state file {}", path.display())),
    }
}

/// Saves an offline key for the next run.
pub fn write_state(path: &Path, offline_key: &str) -> Result<()> {
    fs::write(path, offline_key)
        .with_context(|| format!("Failed to write state file {}", path.display()))
}

/// Runs one license check and persists the fresh snapshot, if any.
pub async fn run(options: &RunOptions) -> Result<CheckResult> {
    let config = load_config(&options.config)?;
    let offline_key = read_state(&options.state)?;
    let client = HttpRemoteClient::with_timeout(options.timeout)?;

    let result = check(
        config,
        options.environment.clone(),
        Arc::new(client),
        &options.license_key,
        &offline_key,
    )
    .await;

    if let Some(offline_key) = &result.offline_key {
        write_state(&options.state, offline_key)?;
        info!("Saved offline key to {:?}", options.state);
    }

    Ok(result)
}
