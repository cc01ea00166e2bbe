//! Configuration types for the harvester.

use chrono::{DateTime, Utc};
use lh_discoverer::DEFAULT_LOOKBACK_DAYS;
use lh_reader::{DEFAULT_MAX_FETCH_BYTES, EscapeRule};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default time between the start of two poll cycles.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(30);

/// Default deadline for a single store or sink call.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Configuration for a harvester instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HarvesterConfig {
    /// Key prefix above the `yyyy/mm/dd/HH` buckets
    pub base_prefix: String,

    /// Time between the start of two poll cycles
    #[serde(with = "duration_secs")]
    pub poll_interval: Duration,

    /// Initial watermark when no checkpoint exists
    pub skip_until: Option<DateTime<Utc>>,

    /// Optional glob matched against object file names (e.g. `*.log`)
    pub key_pattern: Option<String>,

    /// Days within which per-day prefixes are listed instead of the base
    pub lookback_days: u32,

    /// Maximum size of a single range read
    pub max_fetch_bytes: u64,

    /// Deadline for each store or sink call
    #[serde(with = "duration_secs")]
    pub request_timeout: Duration,

    /// Escape markers undone before parsing
    pub escapes: Vec<EscapeRule>,
}

impl Default for HarvesterConfig {
    fn default() -> Self {
        Self {
            base_prefix: String::new(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            skip_until: None,
            key_pattern: None,
            lookback_days: DEFAULT_LOOKBACK_DAYS as u32,
            max_fetch_bytes: DEFAULT_MAX_FETCH_BYTES,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            escapes: vec![EscapeRule::default()],
        }
    }
}

impl HarvesterConfig {
    /// Create a configuration for the given base prefix with defaults.
    pub fn new(base_prefix: impl Into<String>) -> Self {
        Self {
            base_prefix: base_prefix.into(),
            ..Default::default()
        }
    }

    /// Set the poll interval.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Start from this watermark when no checkpoint exists.
    pub fn with_skip_until(mut self, skip_until: DateTime<Utc>) -> Self {
        self.skip_until = Some(skip_until);
        self
    }

    /// Only harvest objects whose file name matches `pattern`.
    pub fn with_key_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.key_pattern = Some(pattern.into());
        self
    }

    /// Set the per-day listing window.
    pub fn with_lookback_days(mut self, days: u32) -> Self {
        self.lookback_days = days;
        self
    }

    /// Set the maximum size of a single range read.
    pub fn with_max_fetch_bytes(mut self, bytes: u64) -> Self {
        self.max_fetch_bytes = bytes;
        self
    }

    /// Set the deadline for each store or sink call.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Replace the escape rules.
    pub fn with_escapes(mut self, escapes: Vec<EscapeRule>) -> Self {
        self.escapes = escapes;
        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.poll_interval.is_zero() {
            return Err("poll_interval must be greater than zero".to_string());
        }
        if self.request_timeout.is_zero() {
            return Err("request_timeout must be greater than zero".to_string());
        }
        if self.max_fetch_bytes == 0 {
            return Err("max_fetch_bytes must be at least 1".to_string());
        }
        if self
            .key_pattern
            .as_deref()
            .is_some_and(|pattern| pattern.trim().is_empty())
        {
            return Err("key_pattern must not be blank".to_string());
        }
        Ok(())
    }
}

/// Serde helper for Duration serialization as whole seconds.
mod duration_secs {
    use serde::{self, Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}
