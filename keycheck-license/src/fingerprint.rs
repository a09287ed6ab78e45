//! Host fingerprinting for snapshot binding.
//!
//! The fingerprint is the `(domain, ipAddress, directory)` triple of the
//! install. It is matched against the allow-lists in a snapshot and, together
//! with the application key, hashed into the key that encrypts the snapshot.

use keycheck_crypto::sha256_concat_hex;
use serde::{Deserialize, Serialize};
use std::net::UdpSocket;

/// Address used only to pick the outbound interface; UDP connect sends nothing.
const ROUTE_PROBE_ADDR: &str = "192.0.2.1:80";

/// The host attributes a license is bound to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentContext {
    /// Domain (server name) the install answers on.
    pub domain: String,
    /// IP address of the install.
    pub ip_address: String,
    /// Install directory.
    pub directory: String,
}

impl EnvironmentContext {
    /// Creates a context from explicit values.
    pub fn new(
        domain: impl Into<String>,
        ip_address: impl Into<String>,
        directory: impl Into<String>,
    ) -> Self {
        Self {
            domain: domain.into(),
            ip_address: ip_address.into(),
            directory: directory.into(),
        }
    }

    /// Collects a best-effort context for the current process.
    ///
    /// Uses the hostname as domain, the address of the default outbound
    /// interface, and the current working directory. Deployments that serve
    /// a specific virtual host should build the context explicitly.
    #[must_use]
    pub fn detect() -> Self {
        Self {
            domain: get_hostname(),
            ip_address: get_local_ip(),
            directory: get_directory(),
        }
    }

    /// Derives the snapshot key for this host and application.
    ///
    /// Hashes `domain ++ directory ++ ipAddress ++ application_key`. Empty
    /// values are hashed like any other; any change yields a different key,
    /// which makes previously issued snapshots undecodable.
    #[must_use]
    pub fn fingerprint_key(&self, application_key: &str) -> String {
        sha256_concat_hex(&[
            &self.domain,
            &self.directory,
            &self.ip_address,
            application_key,
        ])
    }
}

/// Gets the machine hostname.
fn get_hostname() -> String {
    hostname::get()
        .ok()
        .and_then(|h| h.into_string().ok())
        .unwrap_or_else(|| "localhost".to_string())
}

/// Gets the address of the interface used for outbound traffic.
fn get_local_ip() -> String {
    UdpSocket::bind("0.0.0.0:0")
        .and_then(|socket| {
            socket.connect(ROUTE_PROBE_ADDR)?;
            socket.local_addr()
        })
        .map(|addr| addr.ip().to_string())
        .unwrap_or_else(|_| "127.0.0.1".to_string())
}

/// Gets the current working directory.
fn get_directory() -> String {
    std::env::current_dir()
        .map(|p| p.display().to_string())
        .unwrap_or_default()
}
