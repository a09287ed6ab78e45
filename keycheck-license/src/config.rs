//! Validator configuration.
//!
//! [`ValidatorConfig`] is the raw, possibly incomplete input (deserializable
//! from JSON or TOML). [`ValidatorConfig::validate`] turns it into
//! [`Settings`] with defaults applied, or a local configuration error.

use crate::error::{LicenseError, LicenseResult};
use serde::{Deserialize, Serialize};

/// Whether offline snapshots are honoured when not configured.
pub const DEFAULT_ALLOW_OFFLINE: bool = true;

/// Days a fresh snapshot is trusted without calling home.
pub const DEFAULT_SLEEP_DAYS: u32 = 5;

/// Extra days past the sleep window a snapshot is served when the server is down.
pub const DEFAULT_OFFLINE_DAYS: u32 = 2;

/// Raw validator configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidatorConfig {
    /// Licensing server endpoint.
    #[serde(default, alias = "remote_url", skip_serializing_if = "Option::is_none")]
    pub remote_url: Option<String>,
    /// Product identity secret shared with the licensing server.
    #[serde(default, alias = "application_key", skip_serializing_if = "Option::is_none")]
    pub application_key: Option<String>,
    /// Whether an offline snapshot may stand in for a remote check.
    #[serde(default, alias = "allow_offline", skip_serializing_if = "Option::is_none")]
    pub allow_offline: Option<bool>,
    /// Minimum days between mandatory remote checks.
    #[serde(default, alias = "sleep_days", skip_serializing_if = "Option::is_none")]
    pub sleep_days: Option<u32>,
    /// Grace days after `sleep_days` while the server is unreachable.
    #[serde(default, alias = "offline_days", skip_serializing_if = "Option::is_none")]
    pub offline_days: Option<u32>,
}

impl ValidatorConfig {
    /// Creates a config with the two required values set.
    pub fn new(remote_url: impl Into<String>, application_key: impl Into<String>) -> Self {
        Self {
            remote_url: Some(remote_url.into()),
            application_key: Some(application_key.into()),
            ..Default::default()
        }
    }

    /// Sets whether offline snapshots are allowed.
    #[must_use]
    pub fn allow_offline(mut self, allow: bool) -> Self {
        self.allow_offline = Some(allow);
        self
    }

    /// Sets the sleep window in days.
    #[must_use]
    pub fn sleep_days(mut self, days: u32) -> Self {
        self.sleep_days = Some(days);
        self
    }

    /// Sets the grace window in days.
    #[must_use]
    pub fn offline_days(mut self, days: u32) -> Self {
        self.offline_days = Some(days);
        self
    }

    /// Returns true if no option was supplied at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Checks required values and applies defaults.
    ///
    /// # Errors
    ///
    /// Returns `LicenseError::Config` if the config is empty or the remote
    /// url or application key is missing or blank.
    pub fn validate(&self) -> LicenseResult<Settings> {
        if self.is_empty() {
            return Err(LicenseError::Config(
                "No configuration variables passed".to_string(),
            ));
        }

        let remote_url = non_empty(&self.remote_url).ok_or_else(|| {
            LicenseError::Config(
                "No remote url passed, cannot perform license check".to_string(),
            )
        })?;

        let application_key = non_empty(&self.application_key).ok_or_else(|| {
            LicenseError::Config(
                "No application key passed, cannot perform license check".to_string(),
            )
        })?;

        Ok(Settings {
            remote_url: remote_url.to_string(),
            application_key: application_key.to_string(),
            allow_offline: self.allow_offline.unwrap_or(DEFAULT_ALLOW_OFFLINE),
            sleep_days: self.sleep_days.unwrap_or(DEFAULT_SLEEP_DAYS),
            offline_days: self.offline_days.unwrap_or(DEFAULT_OFFLINE_DAYS),
        })
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}

/// Validated configuration with defaults applied.
#[derive(Clone, PartialEq, Eq)]
pub struct Settings {
    /// Licensing server endpoint.
    pub remote_url: String,
    /// Product identity secret.
    pub application_key: String,
    /// Whether offline snapshots are honoured.
    pub allow_offline: bool,
    /// Sleep window in days.
    pub sleep_days: u32,
    /// Grace window in days.
    pub offline_days: u32,
}

impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("remote_url", &self.remote_url)
            .field("application_key", &"[REDACTED]")
            .field("allow_offline", &self.allow_offline)
            .field("sleep_days", &self.sleep_days)
            .field("offline_days", &self.offline_days)
            .finish()
    }
}
