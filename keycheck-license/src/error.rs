//! Error types for the licensing module.

use keycheck_crypto::CryptoError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Where an error originated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorScope {
    /// Configuration or input problem on this host; no network was attempted.
    Local,
    /// The licensing server answered with something unusable.
    Remote,
}

/// Licensing-specific errors.
///
/// Display strings are the messages surfaced to callers in a `CheckResult`.
#[derive(Debug, Error)]
pub enum LicenseError {
    /// Missing or invalid validator configuration.
    #[error("{0}")]
    Config(String),

    /// No license key was supplied.
    #[error("No license key passed")]
    MissingLicenseKey,

    /// The licensing server could not be reached or answered non-200.
    #[error("Unable to contact licensing server. Please contact support")]
    RemoteUnreachable {
        /// HTTP status, or 0 for a transport failure.
        response_code: u16,
    },

    /// The licensing server answered 200 with a malformed body.
    #[error("Invalid license server response")]
    RemoteProtocol,

    /// The server's echoed hash did not match the request's validation hash.
    #[error("Checksum verification failed")]
    Integrity,

    /// The offline snapshot could not be generated or decoded.
    #[error("offline snapshot error: {0}")]
    Snapshot(#[from] CryptoError),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl LicenseError {
    /// Returns the scope this error is reported under.
    #[must_use]
    pub fn scope(&self) -> ErrorScope {
        match self {
            Self::RemoteUnreachable { .. } | Self::RemoteProtocol | Self::Integrity => {
                ErrorScope::Remote
            }
            Self::Config(_)
            | Self::MissingLicenseKey
            | Self::Snapshot(_)
            | Self::Serialization(_) => ErrorScope::Local,
        }
    }

    /// Returns true if the error was raised before any network access.
    #[must_use]
    pub fn is_local(&self) -> bool {
        self.scope() == ErrorScope::Local
    }
}

/// Result type for license operations.
pub type LicenseResult<T> = Result<T, LicenseError>;
