//! Authentication operations.

use crate::api::client::{encode_body, ApiClient};
use crate::api::error::ApiError;
use crate::api::models::{Credentials, Registration, TokenResponse, User};
use crate::api::transport::ApiRequest;
use crate::api::{LOGIN_PATH, ME_PATH, REGISTER_PATH};

impl ApiClient {
    /// Exchange credentials for a bearer token.
    ///
    /// The primary path posts a form; the fallback re-sends it as JSON.
    pub async fn login(&self, credentials: &Credentials) -> Result<TokenResponse, ApiError> {
        let request = ApiRequest::post(LOGIN_PATH).form(vec![
            ("username".to_string(), credentials.username.clone()),
            ("password".to_string(), credentials.password.clone()),
        ]);
        self.call_json("login", request).await
    }

    /// Create an account. Does not log in.
    pub async fn register(&self, registration: &Registration) -> Result<User, ApiError> {
        let request = ApiRequest::post(REGISTER_PATH).json(encode_body(registration)?);
        self.call_json("register", request).await
    }

    /// Identity of the holder of `token`.
    pub async fn fetch_current_user(&self, token: &str) -> Result<User, ApiError> {
        let request = ApiRequest::get(ME_PATH).bearer(Some(token));
        self.call_json("fetch_current_user", request).await
    }
}
