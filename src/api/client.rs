//! The API client: two transports, one fallback policy.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

use crate::api::error::{ApiError, AttemptError, BuildError};
use crate::api::transport::{ApiRequest, FallbackTransport, PrimaryTransport, RawResponse, Transport};
use crate::config::ApiConfig;
use crate::resilience::{execute_with_fallback, with_timeout};

/// Default per-attempt deadline.
pub const DEFAULT_ATTEMPT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default `User-Agent` of the primary transport.
pub const DEFAULT_USER_AGENT: &str = concat!("qblog/", env!("CARGO_PKG_VERSION"));

/// Client for the blog API.
///
/// Stateless apart from its transports: cheap to clone and safe to share
/// across tasks. Authenticated operations take the bearer token explicitly.
#[derive(Debug, Clone)]
pub struct ApiClient {
    primary: Arc<dyn Transport>,
    secondary: Arc<dyn Transport>,
    attempt_timeout: Duration,
}

/// Builder for configuring an [`ApiClient`].
#[derive(Debug, Clone)]
pub struct ApiClientBuilder {
    base_url: String,
    fallback_base_url: Option<String>,
    origin: Option<String>,
    attempt_timeout: Duration,
    user_agent: String,
}

impl ApiClientBuilder {
    /// Create a new builder with the given base URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            fallback_base_url: None,
            origin: None,
            attempt_timeout: DEFAULT_ATTEMPT_TIMEOUT,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }

    /// Send fallback attempts to a different host. Defaults to the base URL.
    pub fn fallback_base_url(mut self, url: impl Into<String>) -> Self {
        self.fallback_base_url = Some(url.into());
        self
    }

    /// `Origin` header sent by the fallback transport.
    pub fn origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = Some(origin.into());
        self
    }

    pub fn attempt_timeout(mut self, timeout: Duration) -> Self {
        self.attempt_timeout = timeout;
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Build the client.
    pub fn build(self) -> Result<ApiClient, BuildError> {
        check_url(&self.base_url)?;
        let fallback_base = self.fallback_base_url.as_deref().unwrap_or(&self.base_url);
        check_url(fallback_base)?;

        let primary = PrimaryTransport::new(&self.base_url, &self.user_agent)?;
        let secondary = FallbackTransport::new(fallback_base, self.origin.as_deref())?;

        tracing::debug!(
            base_url = %self.base_url,
            fallback_base_url = %fallback_base,
            attempt_timeout_ms = self.attempt_timeout.as_millis() as u64,
            "API client configured"
        );

        Ok(ApiClient {
            primary: Arc::new(primary),
            secondary: Arc::new(secondary),
            attempt_timeout: self.attempt_timeout,
        })
    }
}

fn check_url(raw: &str) -> Result<(), BuildError> {
    let parsed = url::Url::parse(raw).map_err(|e| BuildError::InvalidUrl {
        url: raw.to_string(),
        reason: e.to_string(),
    })?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        other => Err(BuildError::InvalidUrl {
            url: raw.to_string(),
            reason: format!("unsupported scheme '{other}'"),
        }),
    }
}

impl ApiClient {
    /// Create a builder for advanced configuration.
    pub fn builder(base_url: impl Into<String>) -> ApiClientBuilder {
        ApiClientBuilder::new(base_url)
    }

    /// Build a client from the `[api]` config section.
    pub fn from_config(config: &ApiConfig) -> Result<Self, BuildError> {
        let mut builder = ApiClientBuilder::new(&config.base_url)
            .attempt_timeout(Duration::from_millis(config.attempt_timeout_ms))
            .user_agent(&config.user_agent);
        if let Some(url) = &config.fallback_base_url {
            builder = builder.fallback_base_url(url);
        }
        if let Some(origin) = &config.origin {
            builder = builder.origin(origin);
        }
        builder.build()
    }

    /// Assemble a client from arbitrary transports (fakes in tests).
    pub fn with_transports(primary: Arc<dyn Transport>, secondary: Arc<dyn Transport>) -> Self {
        Self {
            primary,
            secondary,
            attempt_timeout: DEFAULT_ATTEMPT_TIMEOUT,
        }
    }

    pub fn with_attempt_timeout(mut self, timeout: Duration) -> Self {
        self.attempt_timeout = timeout;
        self
    }

    pub fn attempt_timeout(&self) -> Duration {
        self.attempt_timeout
    }

    /// Run `request` through both tiers and decode a JSON body.
    pub(crate) async fn call_json<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        request: ApiRequest,
    ) -> Result<T, ApiError> {
        execute_with_fallback(
            operation,
            || self.attempt(self.primary.as_ref(), &request, decode_json::<T>),
            || self.attempt(self.secondary.as_ref(), &request, decode_json::<T>),
        )
        .await
    }

    /// Run `request` through both tiers, ignoring any success body.
    pub(crate) async fn call_empty(&self, operation: &'static str, request: ApiRequest) -> Result<(), ApiError> {
        execute_with_fallback(
            operation,
            || self.attempt(self.primary.as_ref(), &request, decode_empty),
            || self.attempt(self.secondary.as_ref(), &request, decode_empty),
        )
        .await
    }

    pub(crate) fn primary(&self) -> &dyn Transport {
        self.primary.as_ref()
    }

    pub(crate) fn secondary(&self) -> &dyn Transport {
        self.secondary.as_ref()
    }

    /// One timed attempt through one transport.
    pub(crate) async fn attempt<T>(
        &self,
        transport: &dyn Transport,
        request: &ApiRequest,
        decode: fn(RawResponse) -> Result<T, AttemptError>,
    ) -> Result<T, AttemptError> {
        tracing::trace!(
            transport = transport.name(),
            method = %request.method,
            path = %request.path,
            "Sending attempt"
        );
        let raw = with_timeout(self.attempt_timeout, transport.send(request)).await?;
        decode(raw)
    }
}

/// Decode a 2xx JSON body; non-2xx becomes [`AttemptError::Status`].
pub(crate) fn decode_json<T: DeserializeOwned>(raw: RawResponse) -> Result<T, AttemptError> {
    if !raw.is_success() {
        return Err(AttemptError::Status {
            status: raw.status,
            body: raw.text(),
        });
    }
    serde_json::from_slice(&raw.body).map_err(|e| AttemptError::Decode {
        status: raw.status,
        message: e.to_string(),
    })
}

/// Accept any 2xx response regardless of body.
pub(crate) fn decode_empty(raw: RawResponse) -> Result<(), AttemptError> {
    if raw.is_success() {
        Ok(())
    } else {
        Err(AttemptError::Status {
            status: raw.status,
            body: raw.text(),
        })
    }
}

pub(crate) fn encode_body<T: Serialize>(value: &T) -> Result<serde_json::Value, ApiError> {
    serde_json::to_value(value).map_err(|e| ApiError::Unknown {
        status: None,
        message: format!("failed to encode request body: {e}"),
    })
}

/// Percent-encode a single path segment.
pub(crate) fn path_segment(raw: &str) -> String {
    url::form_urlencoded::byte_serialize(raw.as_bytes()).collect()
}
