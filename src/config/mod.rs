//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! qblog.toml (optional)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → QblogConfig (validated, immutable)
//!     → CLI flags override individual fields
//! ```
//!
//! # Design Decisions
//! - All fields have defaults to allow minimal (or no) config files
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, load_or_default, ConfigError};
pub use schema::{ApiConfig, ObservabilityConfig, QblogConfig, ServerConfig, SessionConfig};
pub use validation::{validate_config, ValidationError};
