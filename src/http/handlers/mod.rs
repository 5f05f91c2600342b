//! Route handlers for the mock API.

pub mod auth;
pub mod blogs;
pub mod debug;
pub mod users;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Json, Query};
use axum::http::{header, HeaderMap};

use crate::api::models::User;
use crate::http::error::MockApiError;
use crate::http::store::MockStore;

/// Resolve the bearer token in `headers` to a user.
pub(crate) fn authenticate(store: &MockStore, headers: &HeaderMap) -> Result<User, MockApiError> {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer ").or_else(|| v.strip_prefix("bearer ")))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| MockApiError::Unauthorized("Not authenticated".into()))?;

    store
        .user_for_token(token)
        .ok_or_else(|| MockApiError::Unauthorized("Could not validate credentials".into()))
}

pub(crate) fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, MockApiError> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| MockApiError::BadRequest(rejection.body_text()))
}

pub(crate) fn query_params<T>(query: Result<Query<T>, QueryRejection>) -> Result<T, MockApiError> {
    query
        .map(|Query(value)| value)
        .map_err(|rejection| MockApiError::BadRequest(rejection.body_text()))
}

pub async fn method_not_allowed() -> MockApiError {
    MockApiError::MethodNotAllowed
}

pub async fn not_found() -> MockApiError {
    MockApiError::NotFound("Not Found".into())
}
