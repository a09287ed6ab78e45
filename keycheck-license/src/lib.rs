//! License validation for keycheck.
//!
//! This module handles:
//! - Validator configuration and local pre-flight errors
//! - Host fingerprinting for snapshot binding
//! - Offline snapshot trust within a sleep window
//! - Remote checks with checksum verification
//! - Stale snapshot fallback within a grace window
//!
//! # Design Principles
//!
//! - **Caller owns persistence**: the validator never writes to disk; the
//!   `offlineKey` returned on a successful remote check must be stored and
//!   passed back on the next run
//! - **Self-invalidating snapshots**: the snapshot key is derived from the
//!   host fingerprint and application key, so moving hosts forces a remote check
//! - **Structured outcomes**: every path ends in a [`CheckResult`]; nothing panics
//!
//! # Decision Flow
//!
//! 1. Local errors (config, license key) short-circuit without network access
//! 2. A decodable snapshot younger than `sleepDays` whose constraints match
//!    the host is returned as-is
//! 3. Otherwise the licensing server is asked; if it cannot be reached a
//!    snapshot younger than `sleepDays + offlineDays` is served instead

mod calendar;
mod checksum;
mod config;
mod error;
mod fingerprint;
mod remote;
mod result;
mod validator;

pub use calendar::{format_check_date, parse_check_date, parse_trial_expiry, CHECK_DATE_FORMAT};
pub use checksum::{generate_token, validation_hash};
pub use config::{
    Settings, ValidatorConfig, DEFAULT_ALLOW_OFFLINE, DEFAULT_OFFLINE_DAYS, DEFAULT_SLEEP_DAYS,
};
pub use error::{ErrorScope, LicenseError, LicenseResult};
pub use fingerprint::EnvironmentContext;
pub use remote::{RemoteCheckClient, RemoteResponse, RequestFields};
pub use result::{
    AllowedDomains, CheckResult, ConstraintViolation, LicenseData, LicenseStatus,
    CHECKSUM_FAILED_MESSAGE, UNREACHABLE_MESSAGE,
};
pub use validator::{check, Validator};

#[cfg(feature = "online")]
pub use remote::{HttpRemoteClient, DEFAULT_TIMEOUT};
