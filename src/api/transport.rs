//! Transport paths used by the API client.
//!
//! # Responsibilities
//! - Describe one logical HTTP call independently of how it is sent
//! - Primary path: shared client with JSON default headers
//! - Fallback path: separate client, headers built explicitly per request
//!
//! # Design Decisions
//! - Transports never interpret status codes; decoding happens in the client
//! - The bearer token travels on the request, never as a client default

use futures_util::future::BoxFuture;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE, ORIGIN};
use reqwest::{Client, Method};
use std::fmt;

use crate::api::error::{AttemptError, BuildError};

/// Status, headers and undecoded body of a received response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl RawResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: body.into(),
        }
    }

    pub fn with_headers(mut self, headers: Vec<(String, String)>) -> Self {
        self.headers = headers;
        self
    }

    /// First value of `name`, compared case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Request body variants.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    Empty,
    Json(serde_json::Value),
    Form(Vec<(String, String)>),
}

/// One logical API call, independent of the transport that sends it.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: RequestBody,
    pub bearer: Option<String>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: RequestBody::Empty,
            bearer: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub fn query(mut self, pairs: Vec<(String, String)>) -> Self {
        self.query = pairs;
        self
    }

    pub fn json(mut self, value: serde_json::Value) -> Self {
        self.body = RequestBody::Json(value);
        self
    }

    pub fn form(mut self, fields: Vec<(String, String)>) -> Self {
        self.body = RequestBody::Form(fields);
        self
    }

    pub fn bearer(mut self, token: Option<&str>) -> Self {
        self.bearer = token.map(str::to_string);
        self
    }
}

/// A way of delivering an [`ApiRequest`].
pub trait Transport: Send + Sync + fmt::Debug {
    /// Name used in logs and metrics ("primary", "fallback", ...).
    fn name(&self) -> &'static str;

    /// Send the request and return the raw response.
    ///
    /// Only failures to obtain a response are errors here.
    fn send<'a>(&'a self, request: &'a ApiRequest) -> BoxFuture<'a, Result<RawResponse, AttemptError>>;
}

fn join_url(base_url: &str, path: &str) -> String {
    let base = base_url.trim_end_matches('/');
    if path.starts_with('/') {
        format!("{base}{path}")
    } else {
        format!("{base}/{path}")
    }
}

/// Header pairs with non-UTF-8 values skipped.
fn response_headers(headers: &HeaderMap) -> Vec<(String, String)> {
    headers
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|value| (name.as_str().to_string(), value.to_string()))
        })
        .collect()
}

/// Primary path: one long-lived client with JSON defaults.
#[derive(Debug, Clone)]
pub struct PrimaryTransport {
    client: Client,
    base_url: String,
}

impl PrimaryTransport {
    pub fn new(base_url: &str, user_agent: &str) -> Result<Self, BuildError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .default_headers(headers)
            .user_agent(user_agent.to_string())
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl Transport for PrimaryTransport {
    fn name(&self) -> &'static str {
        "primary"
    }

    fn send<'a>(&'a self, request: &'a ApiRequest) -> BoxFuture<'a, Result<RawResponse, AttemptError>> {
        Box::pin(async move {
            let mut builder = self
                .client
                .request(request.method.clone(), join_url(&self.base_url, &request.path));

            if !request.query.is_empty() {
                builder = builder.query(&request.query);
            }
            if let Some(token) = &request.bearer {
                builder = builder.bearer_auth(token);
            }
            builder = match &request.body {
                RequestBody::Empty => builder,
                RequestBody::Json(value) => builder.json(value),
                RequestBody::Form(fields) => builder.form(fields),
            };

            let response = builder.send().await?;
            let status = response.status().as_u16();
            let headers = response_headers(response.headers());
            let body = response.bytes().await?;
            Ok(RawResponse::new(status, body.to_vec()).with_headers(headers))
        })
    }
}

/// Fallback path: a bare client; every header is set per request.
///
/// Always speaks JSON, so form payloads are re-encoded as a JSON object.
#[derive(Debug, Clone)]
pub struct FallbackTransport {
    client: Client,
    base_url: String,
    origin: Option<HeaderValue>,
}

impl FallbackTransport {
    pub fn new(base_url: &str, origin: Option<&str>) -> Result<Self, BuildError> {
        let origin = origin
            .map(|o| HeaderValue::from_str(o).map_err(|_| BuildError::InvalidHeader("Origin")))
            .transpose()?;

        Ok(Self {
            client: Client::builder().build()?,
            base_url: base_url.trim_end_matches('/').to_string(),
            origin,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn headers(&self, request: &ApiRequest) -> Result<HeaderMap, AttemptError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        if !matches!(request.body, RequestBody::Empty) {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        }
        if let Some(origin) = &self.origin {
            headers.insert(ORIGIN, origin.clone());
        }
        if let Some(token) = &request.bearer {
            let value = HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|_| AttemptError::Transport("bearer token is not a valid header value".into()))?;
            headers.insert(AUTHORIZATION, value);
        }
        Ok(headers)
    }

    fn body(request: &ApiRequest) -> Result<Option<Vec<u8>>, AttemptError> {
        let value = match &request.body {
            RequestBody::Empty => return Ok(None),
            RequestBody::Json(value) => value.clone(),
            RequestBody::Form(fields) => serde_json::Value::Object(
                fields
                    .iter()
                    .map(|(k, v)| (k.clone(), serde_json::Value::String(v.clone())))
                    .collect(),
            ),
        };
        serde_json::to_vec(&value)
            .map(Some)
            .map_err(|e| AttemptError::Transport(format!("failed to encode request body: {e}")))
    }
}

impl Transport for FallbackTransport {
    fn name(&self) -> &'static str {
        "fallback"
    }

    fn send<'a>(&'a self, request: &'a ApiRequest) -> BoxFuture<'a, Result<RawResponse, AttemptError>> {
        Box::pin(async move {
            let mut url = url::Url::parse(&join_url(&self.base_url, &request.path))
                .map_err(|e| AttemptError::Transport(format!("invalid request URL: {e}")))?;
            if !request.query.is_empty() {
                url.query_pairs_mut().extend_pairs(request.query.iter());
            }

            let mut builder = self
                .client
                .request(request.method.clone(), url)
                .headers(self.headers(request)?);
            if let Some(body) = Self::body(request)? {
                builder = builder.body(body);
            }

            let response = builder.send().await?;
            let status = response.status().as_u16();
            let headers = response_headers(response.headers());
            let body = response.bytes().await?;
            Ok(RawResponse::new(status, body.to_vec()).with_headers(headers))
        })
    }
}
