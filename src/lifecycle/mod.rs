//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Ctrl+C / SIGTERM (shutdown.rs)
//!     → Shutdown::trigger
//!     → every subscriber (mock API server) stops accepting and drains
//! ```

pub mod shutdown;

pub use shutdown::Shutdown;
