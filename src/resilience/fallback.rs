//! Two-tier execution: primary attempt, then a secondary attempt on failure.
//!
//! # State Transitions
//! ```text
//! primary ok                     → Ok(primary value)
//! primary err → secondary ok     → Ok(secondary value)
//! primary err → secondary err    → Err(most specific of the two)
//! ```

use std::fmt;
use std::future::Future;

use crate::api::error::{ApiError, AttemptError};
use crate::observability::metrics;

/// Which of the two attempts is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    Primary,
    Secondary,
}

impl Tier {
    pub fn as_str(self) -> &'static str {
        match self {
            Tier::Primary => "primary",
            Tier::Secondary => "secondary",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Execute one logical call with a single immediate fallback.
///
/// `secondary` is only constructed and awaited after `primary` has
/// resolved with an error; on primary success it is never called.
pub async fn execute_with_fallback<T, P, PFut, S, SFut>(
    operation: &'static str,
    primary: P,
    secondary: S,
) -> Result<T, ApiError>
where
    P: FnOnce() -> PFut,
    PFut: Future<Output = Result<T, AttemptError>>,
    S: FnOnce() -> SFut,
    SFut: Future<Output = Result<T, AttemptError>>,
{
    let primary_err = match primary().await {
        Ok(value) => {
            metrics::record_attempt(operation, Tier::Primary, "ok");
            tracing::debug!(operation, tier = %Tier::Primary, "API call succeeded");
            return Ok(value);
        }
        Err(err) => err,
    };

    metrics::record_attempt(operation, Tier::Primary, primary_err.label());
    tracing::warn!(
        operation,
        tier = %Tier::Primary,
        status = ?primary_err.status(),
        error = %primary_err,
        "Primary attempt failed, trying fallback"
    );

    match secondary().await {
        Ok(value) => {
            metrics::record_attempt(operation, Tier::Secondary, "ok");
            tracing::info!(operation, tier = %Tier::Secondary, "API call recovered by fallback");
            Ok(value)
        }
        Err(secondary_err) => {
            metrics::record_attempt(operation, Tier::Secondary, secondary_err.label());
            let chosen = AttemptError::most_specific(primary_err, secondary_err);
            let err = ApiError::from(chosen);
            tracing::error!(
                operation,
                status = ?err.status(),
                error = %err,
                "API call failed on both attempts"
            );
            Err(err)
        }
    }
}
