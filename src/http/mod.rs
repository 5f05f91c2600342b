//! Mock blog API.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware stack)
//!     → cors.rs (preflight short-circuit, CORS headers on every response)
//!     → handlers/ (decode, authenticate, validate)
//!     → store.rs (in-memory users, blogs, tokens)
//!     → JSON body or {"detail": ...} error
//! ```

pub mod cors;
pub mod error;
pub mod handlers;
pub mod server;
pub mod store;

pub use error::{MockApiError, ServerError};
pub use server::{AppState, MockApiServer};
pub use store::MockStore;
