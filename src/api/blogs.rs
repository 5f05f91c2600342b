//! Blog resource operations.

use crate::api::client::{decode_json, encode_body, path_segment, ApiClient};
use crate::api::error::{ApiError, AttemptError};
use crate::api::models::{Blog, BlogQuery, BlogUpdate, NewBlog, User};
use crate::api::transport::{ApiRequest, Transport};
use crate::api::{BLOGS_PATH, USERS_PATH};
use crate::resilience::execute_with_fallback;

fn blog_path(id: &str) -> String {
    format!("{BLOGS_PATH}/{}", path_segment(id))
}

impl ApiClient {
    /// List blogs, newest first, with optional filters.
    pub async fn list_blogs(&self, query: &BlogQuery) -> Result<Vec<Blog>, ApiError> {
        let request = ApiRequest::get(BLOGS_PATH).query(query.to_pairs());
        self.call_json("list_blogs", request).await
    }

    pub async fn get_blog(&self, id: &str) -> Result<Blog, ApiError> {
        self.call_json("get_blog", ApiRequest::get(blog_path(id))).await
    }

    pub async fn create_blog(&self, token: Option<&str>, blog: &NewBlog) -> Result<Blog, ApiError> {
        let request = ApiRequest::post(BLOGS_PATH)
            .json(encode_body(blog)?)
            .bearer(token);
        self.call_json("create_blog", request).await
    }

    pub async fn update_blog(&self, token: Option<&str>, id: &str, update: &BlogUpdate) -> Result<Blog, ApiError> {
        let request = ApiRequest::put(blog_path(id))
            .json(encode_body(update)?)
            .bearer(token);
        self.call_json("update_blog", request).await
    }

    /// Delete a blog. The server answers `204` with no body.
    pub async fn delete_blog(&self, token: Option<&str>, id: &str) -> Result<(), ApiError> {
        let request = ApiRequest::delete(blog_path(id)).bearer(token);
        self.call_empty("delete_blog", request).await
    }

    /// Blogs written by `username`.
    ///
    /// Resolves the user id first; an unknown username yields an empty list.
    /// Both lookups run inside each tier.
    pub async fn user_blogs(&self, username: &str) -> Result<Vec<Blog>, ApiError> {
        execute_with_fallback(
            "user_blogs",
            || self.user_blogs_via(self.primary(), username),
            || self.user_blogs_via(self.secondary(), username),
        )
        .await
    }

    async fn user_blogs_via(&self, transport: &dyn Transport, username: &str) -> Result<Vec<Blog>, AttemptError> {
        let users_request = ApiRequest::get(USERS_PATH)
            .query(vec![("username".to_string(), username.to_string())]);
        let users: Vec<User> = self.attempt(transport, &users_request, decode_json).await?;

        let Some(user) = users.into_iter().next() else {
            tracing::debug!(username, "No user with that username");
            return Ok(Vec::new());
        };

        let blogs_request = ApiRequest::get(BLOGS_PATH).query(BlogQuery::by_author(user.id).to_pairs());
        self.attempt(transport, &blogs_request, decode_json).await
    }
}
