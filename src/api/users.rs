//! User directory lookups.

use crate::api::client::ApiClient;
use crate::api::error::ApiError;
use crate::api::models::User;
use crate::api::transport::ApiRequest;
use crate::api::USERS_PATH;

impl ApiClient {
    /// List users, optionally filtered by exact username.
    pub async fn list_users(&self, username: Option<&str>) -> Result<Vec<User>, ApiError> {
        let mut request = ApiRequest::get(USERS_PATH);
        if let Some(username) = username {
            request = request.query(vec![("username".to_string(), username.to_string())]);
        }
        self.call_json("list_users", request).await
    }
}
