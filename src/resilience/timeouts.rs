//! Timeout enforcement.

use std::future::Future;
use std::time::Duration;

use thiserror::Error;

/// The deadline passed before the wrapped future finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("deadline of {0:?} elapsed")]
pub struct DeadlineElapsed(pub Duration);

/// Run `fut` to completion or fail after `limit`. The future is dropped
/// (and its I/O cancelled) when the deadline passes.
pub async fn enforce_deadline<F, T>(limit: Duration, fut: F) -> Result<T, DeadlineElapsed>
where
    F: Future<Output = T>,
{
    tokio::time::timeout(limit, fut)
        .await
        .map_err(|_| DeadlineElapsed(limit))
}
