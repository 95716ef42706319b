//! Store-boundary error type.

use std::time::Duration;

/// Failure of a persistent-store operation.
///
/// Both variants are retryable by the caller's own policy; the store
/// itself never retries.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The database rejected or dropped the operation.
    #[error("store unavailable: {0}")]
    Unavailable(#[from] sqlx::Error),

    /// The operation did not complete within the configured deadline.
    #[error("store operation timed out after {0:?}")]
    Timeout(Duration),
}
