//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct QblogConfig {
    /// Outbound API client settings.
    pub api: ApiConfig,

    /// Client session persistence.
    pub session: SessionConfig,

    /// Mock API server settings.
    pub server: ServerConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// API client configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL of the blog API (e.g., "http://localhost:8000").
    pub base_url: String,

    /// Base URL for fallback attempts. Defaults to `base_url`.
    pub fallback_base_url: Option<String>,

    /// `Origin` header sent on fallback attempts.
    pub origin: Option<String>,

    /// Deadline for each individual attempt in milliseconds.
    pub attempt_timeout_ms: u64,

    /// `User-Agent` of the primary transport.
    pub user_agent: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            fallback_base_url: None,
            origin: Some("http://localhost:5173".to_string()),
            attempt_timeout_ms: 10_000,
            user_agent: crate::api::client::DEFAULT_USER_AGENT.to_string(),
        }
    }
}

/// Session persistence configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct SessionConfig {
    /// File holding the persisted token.
    pub token_path: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            token_path: ".qblog/session.json".to_string(),
        }
    }
}

/// Mock API server configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address (e.g., "127.0.0.1:8000").
    pub bind_address: String,

    /// Origin echoed in `Access-Control-Allow-Origin`.
    pub allowed_origin: String,

    /// Request timeout in seconds.
    pub request_timeout_secs: u64,

    /// Maximum accepted request body in bytes.
    pub max_body_bytes: usize,

    /// Label reported by the diagnostics endpoint.
    pub environment: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:8000".to_string(),
            allowed_origin: "http://localhost:5173".to_string(),
            request_timeout_secs: 30,
            max_body_bytes: 1024 * 1024, // 1MB
            environment: "development".to_string(),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable the Prometheus endpoint (qblog-api only).
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}
