//! Per-attempt deadlines.

use std::future::Future;
use std::time::Duration;
use tokio::time::timeout;

use crate::api::error::AttemptError;

/// Run one attempt under `deadline`.
///
/// An expired deadline drops the attempt future, which aborts the in-flight
/// request, and reports [`AttemptError::Timeout`].
pub async fn with_timeout<T, F>(deadline: Duration, attempt: F) -> Result<T, AttemptError>
where
    F: Future<Output = Result<T, AttemptError>>,
{
    match timeout(deadline, attempt).await {
        Ok(result) => result,
        Err(_) => Err(AttemptError::Timeout(deadline)),
    }
}
