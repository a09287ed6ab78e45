//! The license validator.
//!
//! A [`Validator`] is built from a config, the host's environment context and
//! a remote client. `check_license` decides between trusting the offline
//! snapshot, asking the licensing server, and falling back to a stale
//! snapshot while the server is unreachable.

use crate::calendar::{self, days_before, format_check_date};
use crate::checksum::{generate_token, validation_hash};
use crate::config::{Settings, ValidatorConfig};
use crate::error::{LicenseError, LicenseResult};
use crate::fingerprint::EnvironmentContext;
use crate::remote::{RemoteCheckClient, RequestFields};
use crate::result::{CheckResult, ConstraintViolation, LicenseData, LicenseStatus};
use chrono::NaiveDate;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// A decoded offline snapshot.
#[derive(Debug)]
struct Snapshot {
    check_date: NaiveDate,
    result: CheckResult,
}

/// Validates one license on one host.
pub struct Validator {
    settings: Settings,
    environment: EnvironmentContext,
    client: Arc<dyn RemoteCheckClient>,
    license_key: Option<String>,
    offline_key: Option<String>,
}

impl Validator {
    /// Creates a validator.
    ///
    /// # Errors
    ///
    /// Returns `LicenseError::Config` if the config is empty or lacks the
    /// remote url or application key.
    pub fn new(
        config: ValidatorConfig,
        environment: EnvironmentContext,
        client: Arc<dyn RemoteCheckClient>,
    ) -> LicenseResult<Self> {
        let settings = config.validate()?;
        debug!(
            remote_url = %settings.remote_url,
            allow_offline = settings.allow_offline,
            sleep_days = settings.sleep_days,
            offline_days = settings.offline_days,
            "validator configured"
        );

        Ok(Self {
            settings,
            environment,
            client,
            license_key: None,
            offline_key: None,
        })
    }

    /// Sets the license key to check.
    ///
    /// # Errors
    ///
    /// Returns `LicenseError::MissingLicenseKey` if the key is empty.
    pub fn with_license_key(mut self, license_key: impl Into<String>) -> LicenseResult<Self> {
        let license_key = license_key.into();
        if license_key.trim().is_empty() {
            return Err(LicenseError::MissingLicenseKey);
        }
        self.license_key = Some(license_key);
        Ok(self)
    }

    /// Sets the offline snapshot saved from a previous check. Empty clears it.
    #[must_use]
    pub fn with_offline_key(mut self, offline_key: impl Into<String>) -> Self {
        let offline_key = offline_key.into();
        self.offline_key = (!offline_key.trim().is_empty()).then_some(offline_key);
        self
    }

    /// Returns the validated settings.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Returns the environment context checks are bound to.
    pub fn environment(&self) -> &EnvironmentContext {
        &self.environment
    }

    /// Checks the license as of today's local date.
    pub async fn check_license(&self) -> CheckResult {
        self.check_license_on(calendar::today()).await
    }

    /// Checks the license as of `today`.
    ///
    /// Never fails: local errors, unreachable servers and integrity failures
    /// are all reported through the returned [`CheckResult`].
    pub async fn check_license_on(&self, today: NaiveDate) -> CheckResult {
        match self.evaluate(today).await {
            Ok(result) => {
                info!(
                    status = %result.status,
                    remote_check = result.remote_check,
                    "license check complete"
                );
                result
            }
            Err(err) => {
                warn!(error = %err, scope = ?err.scope(), "license check failed");
                CheckResult::from(err)
            }
        }
    }

    async fn evaluate(&self, today: NaiveDate) -> LicenseResult<CheckResult> {
        let license_key = self
            .license_key
            .as_deref()
            .ok_or(LicenseError::MissingLicenseKey)?;

        let fingerprint_key = self
            .environment
            .fingerprint_key(&self.settings.application_key);

        if !self.settings.allow_offline {
            debug!("offline snapshots disabled");
            return self
                .remote_check(license_key, &fingerprint_key, today, None)
                .await;
        }

        let mut fallback = None;
        if let Some(mut snapshot) = self.open_snapshot(&fingerprint_key) {
            let local_expiry = days_before(today, self.settings.sleep_days);

            if snapshot.check_date > local_expiry {
                match self.snapshot_violation(&snapshot.result, today) {
                    None => {
                        debug!(check_date = %snapshot.check_date, "offline snapshot trusted");
                        return Ok(snapshot.result);
                    }
                    Some(violation) => {
                        debug!(%violation, "offline snapshot constraints failed");
                        snapshot.result.status = LicenseStatus::Invalid;
                    }
                }
            } else {
                debug!(check_date = %snapshot.check_date, "offline snapshot past sleep window");
            }

            fallback = Some(snapshot);
        }

        self.remote_check(license_key, &fingerprint_key, today, fallback)
            .await
    }

    /// Decodes the stored snapshot, treating any failure as no snapshot.
    fn open_snapshot(&self, fingerprint_key: &str) -> Option<Snapshot> {
        let blob = self.offline_key.as_deref()?;

        let decoded = match keycheck_crypto::decode(blob, fingerprint_key) {
            Ok(decoded) => decoded,
            Err(e) => {
                debug!(error = %e, "offline snapshot not decodable on this host");
                return None;
            }
        };

        let result: CheckResult = match serde_json::from_str(&decoded) {
            Ok(result) => result,
            Err(e) => {
                debug!(error = %e, "offline snapshot payload is not a check result");
                return None;
            }
        };

        let Some(check_date) = result.parsed_check_date() else {
            debug!("offline snapshot has no usable check date");
            return None;
        };

        Some(Snapshot { check_date, result })
    }

    fn snapshot_violation(
        &self,
        result: &CheckResult,
        today: NaiveDate,
    ) -> Option<ConstraintViolation> {
        match &result.license_data {
            Some(data) => data.violation(&self.environment, today),
            None => Some(ConstraintViolation::MissingLicenseData),
        }
    }

    async fn remote_check(
        &self,
        license_key: &str,
        fingerprint_key: &str,
        today: NaiveDate,
        fallback: Option<Snapshot>,
    ) -> LicenseResult<CheckResult> {
        let token = generate_token(license_key);
        let fields = RequestFields {
            license_check: true,
            validation_hash: validation_hash(&self.settings.application_key, &token),
            license_key: license_key.to_string(),
            domain: self.environment.domain.clone(),
            ip_address: self.environment.ip_address.clone(),
            directory: self.environment.directory.clone(),
            token,
        };

        let key_prefix: String = license_key.chars().take(8).collect();
        debug!(
            url = %self.settings.remote_url,
            %key_prefix,
            "performing remote license check"
        );
        let response = self.client.send(&self.settings.remote_url, &fields).await;

        if !response.is_ok() {
            let extended_expiry = days_before(
                today,
                self.settings
                    .sleep_days
                    .saturating_add(self.settings.offline_days),
            );

            if let Some(snapshot) = fallback.filter(|s| s.check_date > extended_expiry) {
                warn!(
                    response_code = response.response_code,
                    check_date = %snapshot.check_date,
                    "licensing server unreachable, serving offline snapshot"
                );
                return Ok(snapshot.result);
            }

            return Err(LicenseError::RemoteUnreachable {
                response_code: response.response_code,
            });
        }

        let data = response.data.ok_or(LicenseError::RemoteProtocol)?;
        let mut result: CheckResult = serde_json::from_value(data).map_err(|e| {
            debug!(error = %e, "licensing server response has no status");
            LicenseError::RemoteProtocol
        })?;

        if let Some(hash) = result.license_data.as_ref().and_then(LicenseData::hash)
            && hash != fields.validation_hash
        {
            return Err(LicenseError::Integrity);
        }

        if self.settings.allow_offline && result.is_active() {
            result.extra.remove("checkDate");
            result.check_date = Some(format_check_date(today));
            match seal_snapshot(&result, fingerprint_key) {
                Ok(offline_key) => result.offline_key = Some(offline_key),
                Err(e) => warn!(error = %e, "failed to generate offline snapshot"),
            }
        }

        result.remote_check = true;
        Ok(result)
    }
}

impl std::fmt::Debug for Validator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Validator")
            .field("settings", &self.settings)
            .field("environment", &self.environment)
            .field("has_license_key", &self.license_key.is_some())
            .field("has_offline_key", &self.offline_key.is_some())
            .finish_non_exhaustive()
    }
}

/// Serializes and encrypts a result for offline use.
fn seal_snapshot(result: &CheckResult, fingerprint_key: &str) -> LicenseResult<String> {
    let json = serde_json::to_string(result)?;
    Ok(keycheck_crypto::generate(&json, fingerprint_key)?)
}

/// Builds a validator and runs one check, reporting construction errors as
/// a local `error` result.
///
/// An empty `offline_key` means no snapshot.
pub async fn check(
    config: ValidatorConfig,
    environment: EnvironmentContext,
    client: Arc<dyn RemoteCheckClient>,
    license_key: &str,
    offline_key: &str,
) -> CheckResult {
    match Validator::new(config, environment, client)
        .and_then(|validator| validator.with_license_key(license_key))
    {
        Ok(validator) => validator.with_offline_key(offline_key).check_license().await,
        Err(err) => {
            warn!(error = %err, "license check not attempted");
            CheckResult::from(err)
        }
    }
}
