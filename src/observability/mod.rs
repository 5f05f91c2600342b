//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events via `tracing`)
//!     → metrics.rs (counters via the `metrics` facade)
//!
//! Consumers:
//!     → stdout (tracing-subscriber fmt layer)
//!     → Prometheus scrape endpoint (qblog-api, optional)
//! ```
//!
//! # Design Decisions
//! - Structured fields (operation, tier, status) on every API log line
//! - Metric updates are no-ops until a recorder is installed

pub mod logging;
pub mod metrics;
