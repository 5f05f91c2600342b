//! `/api/blogs` handlers.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Json, Path, Query, State};
use axum::http::{HeaderMap, StatusCode};

use crate::api::models::{Blog, BlogQuery, BlogUpdate, NewBlog};
use crate::http::error::MockApiError;
use crate::http::handlers::{authenticate, json_body, query_params};
use crate::http::server::AppState;

pub async fn list_blogs(
    State(state): State<AppState>,
    query: Result<Query<BlogQuery>, QueryRejection>,
) -> Result<Json<Vec<Blog>>, MockApiError> {
    let query = query_params(query)?;
    Ok(Json(state.store.list_blogs(&query)))
}

pub async fn get_blog(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<Blog>, MockApiError> {
    state.store.get_blog(&id).map(Json)
}

pub async fn create_blog(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<NewBlog>, JsonRejection>,
) -> Result<(StatusCode, Json<Blog>), MockApiError> {
    let user = authenticate(&state.store, &headers)?;
    let new_blog = json_body(payload)?;
    let blog = state.store.create_blog(&user, &new_blog)?;
    tracing::debug!(blog_id = %blog.id, author = %user.username, "Blog created");
    Ok((StatusCode::CREATED, Json(blog)))
}

pub async fn update_blog(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    payload: Result<Json<BlogUpdate>, JsonRejection>,
) -> Result<Json<Blog>, MockApiError> {
    let user = authenticate(&state.store, &headers)?;
    let update = json_body(payload)?;
    state.store.update_blog(&user, &id, &update).map(Json)
}

pub async fn delete_blog(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<StatusCode, MockApiError> {
    let user = authenticate(&state.store, &headers)?;
    state.store.delete_blog(&user, &id)?;
    tracing::debug!(blog_id = %id, "Blog deleted");
    Ok(StatusCode::NO_CONTENT)
}
