//! Request deadlines for store calls.

use lh_error::{Result, StoreError};
use std::future::Future;
use std::time::Duration;

/// Runs a store operation under a deadline.
///
/// The deadline caps the whole call, including any retries the store makes
/// internally; stores that retry should size their attempts to fit in it.
/// A timeout is reported as [`StoreError::Timeout`], which classifies as
/// transient: the affected scope is retried on the next cycle.
pub async fn with_deadline<T, F>(operation: &str, deadline: Duration, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(deadline, fut).await {
        Ok(result) => result,
        Err(_) => Err(StoreError::Timeout {
            operation: operation.to_string(),
            after: deadline,
        }
        .into()),
    }
}
