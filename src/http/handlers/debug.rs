//! `/api/debug` handler.

use axum::extract::{Json, State};
use axum::http::{HeaderMap, Method, Uri};
use chrono::Utc;
use std::collections::BTreeMap;

use crate::api::models::{Connectivity, Diagnostics, RequestEcho, ServerInfo};
use crate::http::server::AppState;

/// Headers never echoed back.
const REDACTED: [&str; 2] = ["authorization", "cookie"];

pub async fn diagnostics(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
) -> Json<Diagnostics> {
    let echoed = headers
        .iter()
        .filter(|(name, _)| !REDACTED.contains(&name.as_str()))
        .filter_map(|(name, value)| Some((name.to_string(), value.to_str().ok()?.to_string())))
        .collect();
    let query: BTreeMap<String, String> = uri
        .query()
        .map(|q| url::form_urlencoded::parse(q.as_bytes()).into_owned().collect())
        .unwrap_or_default();

    Json(Diagnostics {
        timestamp: Utc::now(),
        environment: state.environment.to_string(),
        request: RequestEcho {
            method: method.to_string(),
            url: uri.to_string(),
            headers: echoed,
            query,
        },
        server: ServerInfo {
            version: env!("CARGO_PKG_VERSION").to_string(),
            platform: format!("{}-{}", std::env::consts::OS, std::env::consts::ARCH),
            uptime_secs: state.started.elapsed().as_secs(),
            user_count: state.store.user_count(),
            blog_count: state.store.blog_count(),
        },
        connectivity: Connectivity {
            status: "ok".to_string(),
            message: "API is reachable".to_string(),
        },
    })
}
