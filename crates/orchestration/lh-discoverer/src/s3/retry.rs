//! Backoff for S3 list and range-read calls.
//!
//! A call is repeated while its failure classifies as transient. Requests S3
//! refuses outright surface as [`StoreError::Rejected`](lh_error::StoreError)
//! and are returned at once, as is a missing key.

use aws_sdk_s3::config::http::HttpResponse;
use aws_sdk_s3::error::{ProvideErrorMetadata, SdkError};
use lh_error::{ErrorCategory, Result, classify_error};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

/// Configuration for retry behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of retries before giving up.
    pub max_retries: u32,
    /// Initial backoff duration in milliseconds.
    pub initial_backoff_ms: u64,
    /// Maximum backoff duration in milliseconds.
    pub max_backoff_ms: u64,
    /// Add up to 25% random jitter to each backoff.
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_backoff_ms: 100,
            max_backoff_ms: 10000,
            jitter: true,
        }
    }
}

impl RetryConfig {
    /// Create a new retry configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum number of retries.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    fn capped_ms(&self, attempt: u32) -> u64 {
        self.initial_backoff_ms
            .saturating_mul(2u64.saturating_pow(attempt))
            .min(self.max_backoff_ms)
    }

    /// Calculate the backoff duration for a given attempt.
    pub fn backoff_duration(&self, attempt: u32) -> Duration {
        let capped_ms = self.capped_ms(attempt);

        let final_ms = if self.jitter {
            let jitter = rand::rng().random_range(0..=capped_ms / 4);
            capped_ms.saturating_add(jitter)
        } else {
            capped_ms
        };

        Duration::from_millis(final_ms)
    }

    /// Longest a single attempt may run so that all attempts and the sleeps
    /// between them fit in `deadline`. Never below one second.
    ///
    /// Callers wrap the whole retried call in `deadline`; sizing the attempts
    /// from it leaves room for the retries to actually happen.
    pub fn attempt_timeout(&self, deadline: Duration) -> Duration {
        let sleeps_ms: u64 = (0..self.max_retries)
            .map(|attempt| {
                let capped = self.capped_ms(attempt);
                if self.jitter {
                    capped.saturating_add(capped / 4)
                } else {
                    capped
                }
            })
            .fold(0, u64::saturating_add);

        let attempts = self.max_retries.saturating_add(1);
        let budget = deadline.saturating_sub(Duration::from_millis(sleeps_ms));
        (budget / attempts).max(Duration::from_secs(1))
    }
}

/// Whether S3 answered with a client error that repeating the request will
/// not fix. Throttling is not a rejection.
pub(crate) fn is_rejection<E>(error: &SdkError<E, HttpResponse>) -> bool
where
    E: ProvideErrorMetadata,
{
    let Some(response) = error.raw_response() else {
        return false;
    };
    let code = error.as_service_error().and_then(|e| e.code());
    rejects(response.status().as_u16(), code)
}

fn rejects(status: u16, code: Option<&str>) -> bool {
    if !(400..500).contains(&status) || status == 429 {
        return false;
    }
    // S3 reports these as 4xx but they clear on their own
    !matches!(code, Some("SlowDown" | "RequestTimeout" | "RequestTimeTooSkewed"))
}

/// Execute a store call, retrying transient failures with backoff.
///
/// # Arguments
///
/// * `config` - Retry configuration
/// * `operation_name` - Name of the operation for logging
/// * `operation` - The async operation to execute
///
/// # Returns
///
/// The result of the operation, the first non-transient error, or the last
/// error once retries are exhausted.
pub async fn with_retry<F, Fut, T>(
    config: &RetryConfig,
    operation_name: &str,
    mut operation: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt = 0;

    loop {
        let error = match operation().await {
            Ok(result) => return Ok(result),
            Err(e) => e,
        };

        let category = classify_error(&error);
        if category != ErrorCategory::Transient {
            debug!(
                operation = operation_name,
                attempt = attempt,
                category = ?category,
                error = %error,
                "Not retrying"
            );
            return Err(error);
        }

        if attempt >= config.max_retries {
            warn!(
                operation = operation_name,
                attempts = attempt + 1,
                error = %error,
                "Retries exhausted"
            );
            return Err(error);
        }

        let backoff = config.backoff_duration(attempt);
        warn!(
            operation = operation_name,
            attempt = attempt,
            error = %error,
            backoff_ms = backoff.as_millis(),
            "Transient store error, backing off"
        );
        sleep(backoff).await;
        attempt += 1;
    }
}
