//! Shared test helpers for license tests.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{Days, NaiveDate};
use keycheck_license::{
    format_check_date, validation_hash, EnvironmentContext, RemoteCheckClient, RemoteResponse,
    RequestFields, ValidatorConfig,
};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};

pub const REMOTE_URL: &str = "https://licensing.example.com/modules/servers/licensing/verify.php";
pub const APP_KEY: &str = "app-key-7f3a";
pub const LICENSE_KEY: &str = "LB-TEST-0001-AAAA";

type Responder = Box<dyn Fn(&RequestFields) -> RemoteResponse + Send + Sync>;

/// Remote client that records every request and answers from a closure.
pub struct MockRemote {
    calls: Mutex<Vec<(String, RequestFields)>>,
    responder: Responder,
}

impl MockRemote {
    pub fn new(
        responder: impl Fn(&RequestFields) -> RemoteResponse + Send + Sync + 'static,
    ) -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
            responder: Box::new(responder),
        })
    }

    /// Answers like a server that cannot be reached.
    pub fn unreachable() -> Arc<Self> {
        Self::new(|_| RemoteResponse::unreachable())
    }

    /// Answers 200 with an active license for `test_env()` and a correct hash.
    pub fn active() -> Arc<Self> {
        Self::new(|fields| {
            RemoteResponse::new(200, Some(active_body(&expected_hash(fields))))
        })
    }

    /// Answers 200 with the given body.
    pub fn responding(body: Value) -> Arc<Self> {
        Self::new(move |_| RemoteResponse::new(200, Some(body.clone())))
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn last_call(&self) -> Option<(String, RequestFields)> {
        self.calls.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl RemoteCheckClient for MockRemote {
    async fn send(&self, url: &str, fields: &RequestFields) -> RemoteResponse {
        self.calls
            .lock()
            .unwrap()
            .push((url.to_string(), fields.clone()));
        (self.responder)(fields)
    }
}

pub fn test_env() -> EnvironmentContext {
    EnvironmentContext::new("example.com", "10.0.0.5", "/var/www/app")
}

pub fn test_config() -> ValidatorConfig {
    ValidatorConfig::new(REMOTE_URL, APP_KEY)
}

pub fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 15).unwrap()
}

pub fn days_ago(days: u64) -> NaiveDate {
    today().checked_sub_days(Days::new(days)).unwrap()
}

/// The hash a well-behaved server echoes for this request.
pub fn expected_hash(fields: &RequestFields) -> String {
    validation_hash(APP_KEY, &fields.token)
}

/// License data matching `test_env()`.
pub fn license_data() -> Value {
    json!({
        "status": "Active",
        "allowedDomains": "example.com,www.example.com",
        "allowedIPAddress": "10.0.0.5",
        "allowedDirectory": "/var/www/app",
        "isTrial": false,
        "productName": "Reports Pro",
    })
}

pub fn active_body(hash: &str) -> Value {
    let mut data = license_data();
    data["hash"] = Value::String(hash.to_string());
    json!({
        "status": "active",
        "licenseData": data,
        "registeredName": "Jane Doe",
    })
}

/// Snapshot payload as the validator would have stored it.
pub fn snapshot_payload(check_date: NaiveDate, license_data: Value) -> Value {
    json!({
        "status": "active",
        "licenseData": license_data,
        "registeredName": "Jane Doe",
        "checkDate": format_check_date(check_date),
    })
}

/// Encrypts a payload with the key of `env`.
pub fn seal(payload: &Value, env: &EnvironmentContext) -> String {
    keycheck_crypto::generate(&payload.to_string(), &env.fingerprint_key(APP_KEY)).unwrap()
}

/// A valid snapshot for `test_env()` dated `check_date`.
pub fn snapshot_dated(check_date: NaiveDate) -> String {
    seal(&snapshot_payload(check_date, license_data()), &test_env())
}
