//! Error types and classification for log-harvester.
//!
//! This crate provides:
//! - [`HarvestError`] - Top-level error enum for all harvest errors
//! - Domain-specific errors ([`StoreError`], [`RecordError`], [`SinkError`], [`CheckpointError`])
//! - [`ErrorCategory`] for deciding whether a failure is retried next cycle or dropped
//! - [`ProcessingStage`] naming where in a cycle an error occurred

use std::time::Duration;
use thiserror::Error;

/// Top-level error type for log-harvester.
#[derive(Error, Debug)]
pub enum HarvestError {
    /// Object store errors (listing, range reads, timeouts)
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Malformed log record
    #[error("Record error: {0}")]
    Record(#[from] RecordError),

    /// Event sink delivery errors
    #[error("Sink error: {0}")]
    Sink(#[from] SinkError),

    /// Checkpoint load/save errors
    #[error("Checkpoint error: {0}")]
    Checkpoint(#[from] CheckpointError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Object store errors.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Listing a prefix failed
    #[error("List failed for prefix '{prefix}': {message}")]
    List { prefix: String, message: String },

    /// Range read failed
    #[error("Read failed for '{identity}': {message}")]
    Read { identity: String, message: String },

    /// The call did not complete within the request deadline
    #[error("{operation} timed out after {after:?}")]
    Timeout { operation: String, after: Duration },

    /// The store refused the request and repeating it will not help
    ///
    /// Examples: access denied, missing bucket, unsatisfiable range
    #[error("{operation} rejected for '{target}': {message}")]
    Rejected {
        operation: String,
        target: String,
        message: String,
    },

    /// Object identity could not be parsed
    #[error("Invalid object URI: {0}")]
    InvalidUri(String),

    /// Object does not exist (anymore)
    #[error("Object not found: {0}")]
    NotFound(String),
}

/// Errors for a single log line that cannot be turned into an event.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecordError {
    /// Line has a different number of columns than the schema
    #[error("Column count mismatch: expected {expected}, found {actual}")]
    ColumnCount { expected: usize, actual: usize },

    /// Date/time columns could not be parsed
    #[error("Invalid timestamp '{0}'")]
    Timestamp(String),

    /// A numeric column holds a non-numeric value
    #[error("Invalid number '{value}' in field '{field}'")]
    Number { field: String, value: String },
}

/// Event sink errors.
#[derive(Error, Debug)]
pub enum SinkError {
    /// Event could not be delivered
    #[error("Delivery failed: {0}")]
    Delivery(String),

    /// Event could not be serialized
    #[error("Serialization failed: {0}")]
    Serialize(String),
}

/// Checkpoint persistence errors.
#[derive(Error, Debug)]
pub enum CheckpointError {
    /// I/O error reading or writing the checkpoint
    #[error("I/O error: {0}")]
    Io(String),

    /// Checkpoint contents could not be encoded or decoded
    #[error("Invalid checkpoint: {0}")]
    Format(String),
}

/// Error classification for the harvest loop.
///
/// Decides whether the affected scope is retried on the next cycle or the
/// offending input is dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Transient error - abandon the scope for this cycle, retry next cycle
    ///
    /// Examples: network timeout, S3 throttling, sink unavailable
    Transient,

    /// Malformed input - drop the single record and continue
    ///
    /// Examples: column count mismatch, bad timestamp
    Malformed,

    /// Permanent error - retrying will not help
    ///
    /// Examples: invalid configuration, object deleted, access denied
    Permanent,
}

/// Processing stage for error context.
///
/// Names the step of a harvest cycle an error is reported from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessingStage {
    /// Listing prefixes
    Listing,

    /// Range-reading newly appended bytes
    Fetching,

    /// Pushing events to the sink
    Delivery,

    /// Loading or saving the resume checkpoint
    Checkpoint,
}

impl std::fmt::Display for ProcessingStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Listing => write!(f, "Listing"),
            Self::Fetching => write!(f, "Fetching"),
            Self::Delivery => write!(f, "Delivery"),
            Self::Checkpoint => write!(f, "Checkpoint"),
        }
    }
}

/// Classifies an error to determine how the harvest loop reacts.
pub fn classify_error(error: &HarvestError) -> ErrorCategory {
    match error {
        HarvestError::Store(e) => classify_store_error(e),
        HarvestError::Record(_) => ErrorCategory::Malformed,
        HarvestError::Sink(e) => classify_sink_error(e),
        HarvestError::Checkpoint(_) => ErrorCategory::Transient,
        HarvestError::Config(_) => ErrorCategory::Permanent,
    }
}

fn classify_store_error(error: &StoreError) -> ErrorCategory {
    match error {
        StoreError::List { .. } => ErrorCategory::Transient,
        StoreError::Read { .. } => ErrorCategory::Transient,
        StoreError::Timeout { .. } => ErrorCategory::Transient,
        StoreError::Rejected { .. } => ErrorCategory::Permanent,
        StoreError::InvalidUri(_) => ErrorCategory::Permanent,
        StoreError::NotFound(_) => ErrorCategory::Permanent,
    }
}

fn classify_sink_error(error: &SinkError) -> ErrorCategory {
    match error {
        SinkError::Delivery(_) => ErrorCategory::Transient,
        SinkError::Serialize(_) => ErrorCategory::Permanent,
    }
}

/// Result type alias using HarvestError.
pub type Result<T> = std::result::Result<T, HarvestError>;
