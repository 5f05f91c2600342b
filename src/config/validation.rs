//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate URLs, socket addresses and value ranges
//!
//! # Design Decisions
//! - Returns all validation errors, not just the first
//! - Pure function: QblogConfig → Result<(), Vec<ValidationError>>

use std::net::SocketAddr;
use thiserror::Error;

use crate::config::schema::QblogConfig;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {reason}")]
pub struct ValidationError {
    pub field: &'static str,
    pub reason: String,
}

impl ValidationError {
    fn new(field: &'static str, reason: impl Into<String>) -> Self {
        Self {
            field,
            reason: reason.into(),
        }
    }
}

fn check_http_url(field: &'static str, raw: &str, errors: &mut Vec<ValidationError>) {
    match url::Url::parse(raw) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => {}
        Ok(url) => errors.push(ValidationError::new(
            field,
            format!("unsupported scheme '{}'", url.scheme()),
        )),
        Err(e) => errors.push(ValidationError::new(field, format!("invalid URL '{raw}': {e}"))),
    }
}

fn check_socket_addr(field: &'static str, raw: &str, errors: &mut Vec<ValidationError>) {
    if raw.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(field, format!("invalid socket address '{raw}'")));
    }
}

/// Validate a parsed configuration.
pub fn validate_config(config: &QblogConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    check_http_url("api.base_url", &config.api.base_url, &mut errors);
    if let Some(url) = &config.api.fallback_base_url {
        check_http_url("api.fallback_base_url", url, &mut errors);
    }
    if let Some(origin) = &config.api.origin {
        if origin.trim().is_empty() || origin.contains(['\r', '\n']) {
            errors.push(ValidationError::new("api.origin", "must be a non-empty header value"));
        }
    }
    if config.api.attempt_timeout_ms == 0 {
        errors.push(ValidationError::new("api.attempt_timeout_ms", "must be greater than 0"));
    }

    if config.session.token_path.trim().is_empty() {
        errors.push(ValidationError::new("session.token_path", "must not be empty"));
    }

    check_socket_addr("server.bind_address", &config.server.bind_address, &mut errors);
    if config.server.allowed_origin.trim().is_empty() {
        errors.push(ValidationError::new("server.allowed_origin", "must not be empty"));
    }
    if config.server.request_timeout_secs == 0 {
        errors.push(ValidationError::new("server.request_timeout_secs", "must be greater than 0"));
    }
    if config.server.max_body_bytes == 0 {
        errors.push(ValidationError::new("server.max_body_bytes", "must be greater than 0"));
    }
    if config.server.environment.trim().is_empty() {
        errors.push(ValidationError::new("server.environment", "must not be empty"));
    }

    if !LOG_LEVELS.contains(&config.observability.log_level.as_str()) {
        errors.push(ValidationError::new(
            "observability.log_level",
            format!("unknown level '{}'", config.observability.log_level),
        ));
    }
    if config.observability.metrics_enabled {
        check_socket_addr("observability.metrics_address", &config.observability.metrics_address, &mut errors);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert_eq!(validate_config(&QblogConfig::default()), Ok(()));
    }

    #[test]
    fn test_collects_every_error() {
        let mut config = QblogConfig::default();
        config.api.base_url = "localhost".to_string();
        config.api.fallback_base_url = Some("ftp://mirror".to_string());
        config.server.bind_address = "nowhere".to_string();
        config.observability.log_level = "loud".to_string();

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
        assert_eq!(
            fields,
            vec![
                "api.base_url",
                "api.fallback_base_url",
                "server.bind_address",
                "observability.log_level",
            ]
        );
    }

    #[test]
    fn test_metrics_address_checked_only_when_enabled() {
        let mut config = QblogConfig::default();
        config.observability.metrics_address = "bogus".to_string();
        assert!(validate_config(&config).is_ok());

        config.observability.metrics_enabled = true;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors[0].field, "observability.metrics_address");
    }
}
