//! Timeout race for slow upstream calls.
//!
//! The raced future is spawned onto the runtime. When the timer wins, the
//! task is left running detached and its eventual output is dropped. Only
//! side-effect-free generation calls may be raced this way.

use std::future::Future;
use std::time::Duration;

use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TimeoutError {
    #[error("operation did not complete within {0:?}")]
    Elapsed(Duration),

    #[error("operation task aborted before completing")]
    Aborted,
}

/// Races `operation` against a timer of length `duration`.
pub async fn with_timeout<F, T>(operation: F, duration: Duration) -> Result<T, TimeoutError>
where
    F: Future<Output = T> + Send + 'static,
    T: Send + 'static,
{
    let handle = tokio::spawn(operation);

    match tokio::time::timeout(duration, handle).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(join_error)) => {
            warn!("Raced operation failed to complete: {join_error}");
            Err(TimeoutError::Aborted)
        }
        Err(_) => {
            warn!(
                "Operation exceeded {}ms, continuing without it",
                duration.as_millis()
            );
            Err(TimeoutError::Elapsed(duration))
        }
    }
}
