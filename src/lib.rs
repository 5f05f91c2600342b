//! qblog: resilient client for the blog API, with a mock server.
//!
//! - `api`: typed operations, each run through a primary and a fallback transport
//! - `session`: login, register, logout and token restore
//! - `http`: in-memory mock of the blog API (used by `qblog-api` and tests)

// Client
pub mod api;
pub mod resilience;
pub mod session;

// Mock server
pub mod http;
pub mod lifecycle;

// Cross-cutting concerns
pub mod config;
pub mod observability;

pub use api::{ApiClient, ApiError};
pub use config::QblogConfig;
pub use http::MockApiServer;
pub use lifecycle::Shutdown;
pub use session::{AuthOutcome, Session, SessionState};
