//! Server diagnostics and connectivity checks.
//!
//! `diagnostics` is an ordinary two-tier call. The connectivity report is
//! different: each check is one timed attempt over the primary transport,
//! so a failing primary path shows up in the report instead of being hidden
//! by the fallback.

use chrono::{DateTime, Utc};
use reqwest::Method;
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::time::Instant;

use crate::api::client::{decode_json, ApiClient};
use crate::api::error::{ApiError, AttemptError};
use crate::api::models::Diagnostics;
use crate::api::transport::{ApiRequest, RawResponse};
use crate::api::{BLOGS_PATH, DEBUG_PATH};

/// Outcome of one connectivity check.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CheckResult {
    pub name: &'static str,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_ms: Option<u64>,
    pub message: String,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub details: BTreeMap<&'static str, Value>,
}

impl CheckResult {
    fn passed(name: &'static str, raw: &RawResponse, time_ms: u64, message: impl Into<String>) -> Self {
        Self {
            name,
            success: true,
            status: Some(raw.status),
            time_ms: Some(time_ms),
            message: message.into(),
            details: BTreeMap::new(),
        }
    }

    fn failed(name: &'static str, error: &AttemptError, time_ms: u64) -> Self {
        Self {
            name,
            success: false,
            status: error.status(),
            time_ms: Some(time_ms),
            message: error.to_string(),
            details: BTreeMap::new(),
        }
    }

    fn detail(mut self, key: &'static str, value: Value) -> Self {
        self.details.insert(key, value);
        self
    }
}

/// Timed results of every connectivity check, in the order they ran.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConnectivityReport {
    pub timestamp: DateTime<Utc>,
    pub checks: Vec<CheckResult>,
}

impl ConnectivityReport {
    pub fn all_passed(&self) -> bool {
        self.checks.iter().all(|check| check.success)
    }

    pub fn check(&self, name: &str) -> Option<&CheckResult> {
        self.checks.iter().find(|check| check.name == name)
    }
}

pub const CHECK_LIST_BLOGS: &str = "list_blogs";
pub const CHECK_PREFLIGHT: &str = "preflight";
pub const CHECK_TOKEN: &str = "token";
pub const CHECK_DIAGNOSTICS: &str = "diagnostics";

const PREFLIGHT_HEADERS: [&str; 3] = [
    "access-control-allow-origin",
    "access-control-allow-methods",
    "access-control-allow-headers",
];

impl ApiClient {
    /// Fetch the server's self-report.
    pub async fn diagnostics(&self) -> Result<Diagnostics, ApiError> {
        self.call_json("diagnostics", ApiRequest::get(DEBUG_PATH)).await
    }

    /// Run every connectivity check. `token` is the caller's stored token.
    pub async fn connectivity_report(&self, token: Option<&str>) -> ConnectivityReport {
        let checks = vec![
            self.check_list_blogs().await,
            self.check_preflight().await,
            check_token(token),
            self.check_diagnostics().await,
        ];
        let report = ConnectivityReport {
            timestamp: Utc::now(),
            checks,
        };

        let failed = report.checks.iter().filter(|check| !check.success).count();
        tracing::info!(checks = report.checks.len(), failed, "Connectivity checks finished");
        report
    }

    async fn timed(&self, request: &ApiRequest) -> (Result<RawResponse, AttemptError>, u64) {
        let started = Instant::now();
        let result = self
            .attempt(self.primary(), request, Ok::<RawResponse, AttemptError>)
            .await;
        (result, started.elapsed().as_millis() as u64)
    }

    async fn check_list_blogs(&self) -> CheckResult {
        let (result, time_ms) = self.timed(&ApiRequest::get(BLOGS_PATH)).await;
        let decoded = result.and_then(|raw| decode_json::<Vec<Value>>(raw.clone()).map(|blogs| (raw, blogs)));
        match decoded {
            Ok((raw, blogs)) => CheckResult::passed(
                CHECK_LIST_BLOGS,
                &raw,
                time_ms,
                format!("Found {} blogs", blogs.len()),
            )
            .detail("blog_count", json!(blogs.len())),
            Err(e) => CheckResult::failed(CHECK_LIST_BLOGS, &e, time_ms),
        }
    }

    async fn check_preflight(&self) -> CheckResult {
        let request = ApiRequest::new(Method::OPTIONS, BLOGS_PATH);
        let (result, time_ms) = self.timed(&request).await;
        match result {
            Ok(raw) if raw.is_success() => {
                let mut check = CheckResult::passed(CHECK_PREFLIGHT, &raw, time_ms, "CORS preflight answered");
                for name in PREFLIGHT_HEADERS {
                    let value = raw.header(name).map_or(Value::Null, |v| json!(v));
                    check = check.detail(name, value);
                }
                check
            }
            Ok(raw) => CheckResult::failed(
                CHECK_PREFLIGHT,
                &AttemptError::Status {
                    status: raw.status,
                    body: raw.text(),
                },
                time_ms,
            ),
            Err(e) => CheckResult::failed(CHECK_PREFLIGHT, &e, time_ms),
        }
    }

    async fn check_diagnostics(&self) -> CheckResult {
        let (result, time_ms) = self.timed(&ApiRequest::get(DEBUG_PATH)).await;
        let decoded = result.and_then(|raw| decode_json::<Diagnostics>(raw.clone()).map(|d| (raw, d)));
        match decoded {
            Ok((raw, diagnostics)) => {
                CheckResult::passed(CHECK_DIAGNOSTICS, &raw, time_ms, diagnostics.connectivity.message)
                    .detail("environment", json!(diagnostics.environment))
            }
            Err(e) => CheckResult::failed(CHECK_DIAGNOSTICS, &e, time_ms),
        }
    }
}

fn check_token(token: Option<&str>) -> CheckResult {
    let token = token.filter(|t| !t.is_empty());
    CheckResult {
        name: CHECK_TOKEN,
        success: token.is_some(),
        status: None,
        time_ms: None,
        message: match token {
            Some(_) => "Token found".to_string(),
            None => "No stored token".to_string(),
        },
        details: BTreeMap::from([
            ("token_exists", json!(token.is_some())),
            ("token_length", json!(token.map_or(0, str::len))),
        ]),
    }
}
