//! Blog API client.
//!
//! # Data Flow
//! ```text
//! caller (session, CLI)
//!     → blogs.rs / auth.rs / users.rs / diagnostics.rs (build ApiRequest)
//!     → client.rs (execute_with_fallback over two transports)
//!     → transport.rs (primary: JSON defaults; fallback: explicit headers)
//!     → decoded payload or ApiError
//! ```

pub mod auth;
pub mod blogs;
pub mod client;
pub mod diagnostics;
pub mod error;
pub mod models;
pub mod transport;
pub mod users;

pub use client::{ApiClient, ApiClientBuilder};
pub use error::{ApiError, AttemptError, BuildError};
pub use diagnostics::{CheckResult, ConnectivityReport};
pub use models::{
    Blog, BlogQuery, BlogUpdate, Connectivity, Credentials, Diagnostics, NewBlog, Registration, RequestEcho,
    ServerInfo, TokenResponse, User,
};
pub use transport::{ApiRequest, RawResponse, RequestBody, Transport};

pub const BLOGS_PATH: &str = "/api/blogs";
pub const USERS_PATH: &str = "/api/users";
pub const LOGIN_PATH: &str = "/api/auth/login";
pub const REGISTER_PATH: &str = "/api/auth/register";
pub const ME_PATH: &str = "/api/auth/me";
pub const DEBUG_PATH: &str = "/api/debug";
