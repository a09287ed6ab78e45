//! Licensing server client.
//!
//! The validator depends on `Arc<dyn RemoteCheckClient>` and never sees the
//! transport. `HttpRemoteClient` posts the request form with reqwest; tests
//! substitute their own implementation.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

#[cfg(feature = "online")]
use crate::error::{LicenseError, LicenseResult};
#[cfg(feature = "online")]
use reqwest::Client;
#[cfg(feature = "online")]
use std::time::Duration;
#[cfg(feature = "online")]
use tracing::{debug, warn};

/// Form fields sent with every remote check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestFields {
    /// Always true; marks the request as a license check.
    pub license_check: bool,
    /// `sha256(applicationKey ++ token)`.
    pub validation_hash: String,
    /// The license key being checked.
    pub license_key: String,
    /// Current domain.
    pub domain: String,
    /// Current IP address.
    pub ip_address: String,
    /// Current install directory.
    pub directory: String,
    /// One-time token; omitted when empty.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub token: String,
}

/// What the licensing server answered.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteResponse {
    /// HTTP status, or 0 when the server could not be reached.
    pub response_code: u16,
    /// Parsed JSON body, or `None` if the body was not JSON.
    pub data: Option<Value>,
}

impl RemoteResponse {
    /// A response with the given status and body.
    pub fn new(response_code: u16, data: Option<Value>) -> Self {
        Self {
            response_code,
            data,
        }
    }

    /// The response for a transport failure or timeout.
    pub fn unreachable() -> Self {
        Self::new(0, None)
    }

    /// Returns true for HTTP 200.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.response_code == 200
    }
}

/// Transport used to reach the licensing server.
///
/// Implementations must bound the request with a timeout and report every
/// transport failure as `RemoteResponse::unreachable()`. No retries.
#[async_trait]
pub trait RemoteCheckClient: Send + Sync {
    /// Sends one check request to `url`.
    async fn send(&self, url: &str, fields: &RequestFields) -> RemoteResponse;
}

/// Default request timeout.
#[cfg(feature = "online")]
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// reqwest-backed client posting `application/x-www-form-urlencoded`.
#[cfg(feature = "online")]
#[derive(Debug, Clone)]
pub struct HttpRemoteClient {
    client: Client,
}

#[cfg(feature = "online")]
impl HttpRemoteClient {
    /// Creates a client with the default 30 second timeout.
    ///
    /// # Errors
    ///
    /// Returns `LicenseError::Config` if the TLS backend cannot be initialised.
    pub fn new() -> LicenseResult<Self> {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    /// Creates a client with a custom timeout.
    pub fn with_timeout(timeout: Duration) -> LicenseResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LicenseError::Config(format!("failed to create HTTP client: {e}")))?;

        Ok(Self { client })
    }
}

#[cfg(feature = "online")]
#[async_trait]
impl RemoteCheckClient for HttpRemoteClient {
    async fn send(&self, url: &str, fields: &RequestFields) -> RemoteResponse {
        let response = match self.client.post(url).form(fields).send().await {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, "licensing server unreachable");
                return RemoteResponse::unreachable();
            }
        };

        let status = response.status().as_u16();
        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                warn!(error = %e, status, "failed to read licensing server response");
                return RemoteResponse::unreachable();
            }
        };

        let data: Option<Value> = serde_json::from_str(&body).ok();
        if data.is_none() {
            debug!(status, len = body.len(), "licensing server response is not JSON");
        }

        RemoteResponse::new(status, data)
    }
}
