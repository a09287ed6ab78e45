//! License data and check results.
//!
//! These types mirror the JSON exchanged with the licensing server and stored
//! in offline snapshots. Unknown fields are kept in `extra` so a snapshot
//! round-trips without losing server-defined data.

use crate::calendar::{parse_check_date, parse_trial_expiry};
use crate::error::{ErrorScope, LicenseError};
use crate::fingerprint::EnvironmentContext;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Message returned when the server is unreachable and no snapshot applies.
pub const UNREACHABLE_MESSAGE: &str = "Unable to contact licensing server. Please contact support";

/// Message returned when the server's hash does not match the request.
pub const CHECKSUM_FAILED_MESSAGE: &str = "Checksum verification failed";

/// Status of a license check.
///
/// `Other` keeps server-defined statuses (`suspended`, `expired`, ...) verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum LicenseStatus {
    /// License is valid.
    Active,
    /// License is invalid, or the check could not establish validity.
    Invalid,
    /// A local or protocol error prevented the check.
    Error,
    /// Any other status reported by the server.
    Other(String),
}

impl LicenseStatus {
    /// Returns the wire form of the status.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Active => "active",
            Self::Invalid => "Invalid",
            Self::Error => "error",
            Self::Other(s) => s,
        }
    }

    /// Returns true if the license is active.
    #[must_use]
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active)
    }
}

impl From<String> for LicenseStatus {
    fn from(value: String) -> Self {
        match value.as_str() {
            "active" => Self::Active,
            "invalid" | "Invalid" => Self::Invalid,
            "error" => Self::Error,
            _ => Self::Other(value),
        }
    }
}

impl From<LicenseStatus> for String {
    fn from(status: LicenseStatus) -> Self {
        match status {
            LicenseStatus::Other(s) => s,
            other => other.as_str().to_string(),
        }
    }
}

impl fmt::Display for LicenseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Domains a license may run on: a comma-separated string or a list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AllowedDomains {
    /// A JSON array of domains.
    List(Vec<String>),
    /// A comma-separated string of domains.
    Joined(String),
}

impl AllowedDomains {
    /// Iterates the individual domains.
    pub fn iter(&self) -> Box<dyn Iterator<Item = &str> + '_> {
        match self {
            Self::List(list) => Box::new(list.iter().map(String::as_str)),
            Self::Joined(joined) => Box::new(
                joined
                    .split(',')
                    .map(str::trim)
                    .filter(|d| !d.is_empty()),
            ),
        }
    }

    /// Returns true if `domain` is in the allow-list.
    #[must_use]
    pub fn contains(&self, domain: &str) -> bool {
        self.iter().any(|d| d == domain)
    }
}

impl Default for AllowedDomains {
    fn default() -> Self {
        Self::Joined(String::new())
    }
}

/// Reason a snapshot's license data does not hold on this host today.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintViolation {
    /// Trial license past its expiry date.
    TrialExpired,
    /// Trial license without a readable expiry date.
    TrialExpiryUnreadable,
    /// Current domain is not in `allowedDomains`.
    DomainNotAllowed,
    /// Current IP differs from `allowedIPAddress`.
    IpAddressMismatch,
    /// Current directory differs from `allowedDirectory`.
    DirectoryMismatch,
    /// The snapshot carries no license data.
    MissingLicenseData,
}

impl fmt::Display for ConstraintViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            Self::TrialExpired => "trial expired",
            Self::TrialExpiryUnreadable => "trial expiry unreadable",
            Self::DomainNotAllowed => "domain not allowed",
            Self::IpAddressMismatch => "ip address mismatch",
            Self::DirectoryMismatch => "directory mismatch",
            Self::MissingLicenseData => "missing license data",
        };
        f.write_str(reason)
    }
}

/// License details returned by the server.
///
/// Kept as the raw JSON the server sent so a snapshot reproduces it exactly.
/// Accessors read fields leniently: missing, null or oddly typed values count
/// as absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LicenseData(Value);

impl LicenseData {
    /// Wraps a raw `licenseData` value.
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    /// Returns the raw value.
    pub fn as_value(&self) -> &Value {
        &self.0
    }

    /// Returns a field of the license data.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    fn str_field(&self, key: &str) -> &str {
        self.get(key).and_then(Value::as_str).unwrap_or_default()
    }

    /// Status as reported inside the license data.
    pub fn status(&self) -> Option<LicenseStatus> {
        self.get("status")
            .and_then(Value::as_str)
            .map(|s| LicenseStatus::from(s.to_string()))
    }

    /// Domains the license may run on.
    pub fn allowed_domains(&self) -> AllowedDomains {
        match self.get("allowedDomains") {
            Some(Value::String(joined)) => AllowedDomains::Joined(joined.clone()),
            Some(Value::Array(list)) => AllowedDomains::List(
                list.iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect(),
            ),
            _ => AllowedDomains::default(),
        }
    }

    /// IP address the license is bound to.
    pub fn allowed_ip_address(&self) -> &str {
        self.str_field("allowedIPAddress")
    }

    /// Directory the license is bound to.
    pub fn allowed_directory(&self) -> &str {
        self.str_field("allowedDirectory")
    }

    /// Whether this is a trial license.
    ///
    /// Accepts `true`/`false`, `0`/`1` and `"0"`/`"1"`/`"true"`.
    pub fn is_trial(&self) -> bool {
        match self.get("isTrial") {
            Some(Value::Bool(b)) => *b,
            Some(Value::Number(n)) => n.as_f64().is_some_and(|v| v != 0.0),
            Some(Value::String(s)) => matches!(s.trim(), "1" | "true" | "yes" | "on"),
            _ => false,
        }
    }

    /// Trial expiry date as sent, required when [`is_trial`](Self::is_trial).
    pub fn trial_expiry(&self) -> Option<&str> {
        self.get("trialExpiry").and_then(Value::as_str)
    }

    /// Server echo of the request's validation hash, if set.
    ///
    /// Non-string values are compared by their JSON text.
    pub fn hash(&self) -> Option<String> {
        match self.get("hash")? {
            Value::Null => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Checks the license constraints against the host and date.
    ///
    /// Returns the first violation found, in the order trial, domain,
    /// IP address, directory.
    #[must_use]
    pub fn violation(
        &self,
        environment: &EnvironmentContext,
        today: NaiveDate,
    ) -> Option<ConstraintViolation> {
        if !self.0.is_object() {
            return Some(ConstraintViolation::MissingLicenseData);
        }

        if self.is_trial() {
            match self.trial_expiry().and_then(parse_trial_expiry) {
                None => return Some(ConstraintViolation::TrialExpiryUnreadable),
                Some(expiry) if today > expiry => {
                    return Some(ConstraintViolation::TrialExpired);
                }
                Some(_) => {}
            }
        }

        if !self.allowed_domains().contains(&environment.domain) {
            return Some(ConstraintViolation::DomainNotAllowed);
        }

        if self.allowed_ip_address() != environment.ip_address {
            return Some(ConstraintViolation::IpAddressMismatch);
        }

        if self.allowed_directory() != environment.directory {
            return Some(ConstraintViolation::DirectoryMismatch);
        }

        None
    }
}

/// The outcome of a license check.
///
/// Remote results and snapshots are the server's JSON; locally produced
/// results only fill `status`, `scope`, `errors` and `message`.
///
/// Parsing only requires an object with a string `status`. A known field
/// whose value does not fit its type stays in `extra` untouched, so it is
/// written back exactly as received.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "Map<String, Value>")]
pub struct CheckResult {
    /// Overall status.
    pub status: LicenseStatus,
    /// Error scope, for `error` results.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<ErrorScope>,
    /// Error messages, for `error` results.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
    /// Human-readable explanation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Date of the remote check this result came from (`YYYYMMDD`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub check_date: Option<String>,
    /// License details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub license_data: Option<LicenseData>,
    /// Fresh snapshot for the caller to persist.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offline_key: Option<String>,
    /// True if this result came from the licensing server in this call.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub remote_check: bool,
    /// Fields this client does not interpret.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CheckResult {
    /// Creates a bare result with the given status.
    #[must_use]
    pub fn with_status(status: LicenseStatus) -> Self {
        Self {
            status,
            scope: None,
            errors: Vec::new(),
            message: None,
            check_date: None,
            license_data: None,
            offline_key: None,
            remote_check: false,
            extra: Map::new(),
        }
    }

    /// Creates an `error` result for the given scope.
    #[must_use]
    pub fn error(scope: ErrorScope, errors: Vec<String>) -> Self {
        Self {
            scope: Some(scope),
            errors,
            ..Self::with_status(LicenseStatus::Error)
        }
    }

    /// Creates an `Invalid` result with a message.
    #[must_use]
    pub fn invalid(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            ..Self::with_status(LicenseStatus::Invalid)
        }
    }

    /// Returns true if the license is active.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }

    /// Parses `check_date`, if present and well-formed.
    #[must_use]
    pub fn parsed_check_date(&self) -> Option<NaiveDate> {
        self.check_date.as_deref().and_then(parse_check_date)
    }
}

/// Removes `key` from `fields` if `convert` accepts its value.
fn take<T>(
    fields: &mut Map<String, Value>,
    key: &str,
    convert: impl FnOnce(&Value) -> Option<T>,
) -> Option<T> {
    let value = convert(fields.get(key)?)?;
    fields.remove(key);
    Some(value)
}

fn string_value(value: &Value) -> Option<String> {
    value.as_str().map(str::to_string)
}

impl TryFrom<Map<String, Value>> for CheckResult {
    type Error = String;

    fn try_from(mut fields: Map<String, Value>) -> Result<Self, Self::Error> {
        let status = match fields.remove("status") {
            Some(Value::String(status)) => LicenseStatus::from(status),
            Some(other) => return Err(format!("status must be a string, got {other}")),
            None => return Err("missing field `status`".to_string()),
        };

        let scope = take(&mut fields, "scope", |v| {
            serde_json::from_value(v.clone()).ok()
        });
        let errors = take(&mut fields, "errors", |v| {
            let list = v.as_array()?;
            let errors: Option<Vec<String>> = list.iter().map(string_value).collect();
            errors.filter(|e| !e.is_empty())
        })
        .unwrap_or_default();
        let message = take(&mut fields, "message", string_value);
        let license_data = take(&mut fields, "licenseData", |v| {
            (!v.is_null()).then(|| LicenseData::new(v.clone()))
        });

        // Client-owned fields: a check date may arrive as a bare number, and
        // whatever a server put in `offlineKey`/`remoteCheck` is replaced.
        let check_date = take(&mut fields, "checkDate", |v| match v {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) if n.is_u64() => Some(n.to_string()),
            _ => None,
        });
        let offline_key = fields
            .remove("offlineKey")
            .and_then(|v| string_value(&v));
        let remote_check = fields
            .remove("remoteCheck")
            .and_then(|v| v.as_bool())
            .unwrap_or(false);

        Ok(Self {
            status,
            scope,
            errors,
            message,
            check_date,
            license_data,
            offline_key,
            remote_check,
            extra: fields,
        })
    }
}

impl From<LicenseError> for CheckResult {
    fn from(err: LicenseError) -> Self {
        match err {
            LicenseError::RemoteUnreachable { .. } => Self::invalid(UNREACHABLE_MESSAGE),
            LicenseError::Integrity => Self::invalid(CHECKSUM_FAILED_MESSAGE),
            other => Self::error(other.scope(), vec![other.to_string()]),
        }
    }
}
