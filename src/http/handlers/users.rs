//! `/api/users` handlers.

use axum::extract::rejection::QueryRejection;
use axum::extract::{Json, Path, Query, State};
use serde::Deserialize;

use crate::api::models::User;
use crate::http::error::MockApiError;
use crate::http::handlers::query_params;
use crate::http::server::AppState;
use crate::http::store::DEFAULT_LIMIT;

#[derive(Debug, Deserialize)]
pub struct UserQuery {
    pub username: Option<String>,
    #[serde(default)]
    pub skip: u32,
    pub limit: Option<u32>,
}

pub async fn list_users(
    State(state): State<AppState>,
    query: Result<Query<UserQuery>, QueryRejection>,
) -> Result<Json<Vec<User>>, MockApiError> {
    let query = query_params(query)?;
    let users = state.store.list_users(
        query.username.as_deref().filter(|u| !u.is_empty()),
        query.skip,
        query.limit.unwrap_or(DEFAULT_LIMIT),
    );
    Ok(Json(users))
}

pub async fn get_user(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<User>, MockApiError> {
    state
        .store
        .get_user(&id)
        .map(Json)
        .ok_or_else(|| MockApiError::NotFound("User not found".into()))
}
