//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Logical API call:
//!     → fallback.rs (primary attempt)
//!         → timeouts.rs (per-attempt deadline)
//!     → on failure only: fallback.rs (secondary attempt)
//!         → timeouts.rs (per-attempt deadline)
//!     → first success, or the most specific failure
//! ```
//!
//! # Design Decisions
//! - Exactly two tiers; no retry loop, no backoff
//! - Secondary starts only after the primary failure is observed
//! - Every attempt has a deadline; dropping the call cancels it

pub mod fallback;
pub mod timeouts;

pub use fallback::{execute_with_fallback, Tier};
pub use timeouts::with_timeout;
