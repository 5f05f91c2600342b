//! `/api/auth` handlers.

use axum::body::Bytes;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Json, State};
use axum::http::{header, HeaderMap, StatusCode};

use crate::api::models::{Registration, TokenResponse, User};
use crate::http::error::MockApiError;
use crate::http::handlers::{authenticate, json_body};
use crate::http::server::AppState;

/// Accepts a form body or a JSON object with `username` and `password`.
pub async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<TokenResponse>, MockApiError> {
    let (username, password) = parse_credentials(&headers, &body)
        .ok_or_else(|| MockApiError::BadRequest("Username and password are required".into()))?;

    match state.store.login(&username, &password) {
        Ok(token) => {
            tracing::debug!(username = %username, "Mock login succeeded");
            Ok(Json(token))
        }
        Err(e) => {
            tracing::debug!(username = %username, "Mock login rejected");
            Err(e)
        }
    }
}

fn parse_credentials(headers: &HeaderMap, body: &[u8]) -> Option<(String, String)> {
    let is_form = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("application/x-www-form-urlencoded"));

    let (username, password) = if is_form {
        let mut username = None;
        let mut password = None;
        for (key, value) in url::form_urlencoded::parse(body) {
            match key.as_ref() {
                "username" => username = Some(value.into_owned()),
                "password" => password = Some(value.into_owned()),
                _ => {}
            }
        }
        (username?, password?)
    } else {
        let value: serde_json::Value = serde_json::from_slice(body).ok()?;
        (
            value.get("username")?.as_str()?.to_string(),
            value.get("password")?.as_str()?.to_string(),
        )
    };

    if username.is_empty() || password.is_empty() {
        return None;
    }
    Some((username, password))
}

pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<Registration>, JsonRejection>,
) -> Result<(StatusCode, Json<User>), MockApiError> {
    let registration = json_body(payload)?;
    let user = state.store.register(&registration)?;
    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn me(State(state): State<AppState>, headers: HeaderMap) -> Result<Json<User>, MockApiError> {
    authenticate(&state.store, &headers).map(Json)
}
