//! Object snapshots taken at listing time.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A remote log segment as seen by one listing call.
///
/// Immutable: a later listing of the same identity produces a new `ObjectRef`
/// with updated size and modification time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectRef {
    /// Stable identity of the object (e.g., "s3://bucket/app/2024/01/01/00/seg.log")
    pub identity: String,

    /// Last modified timestamp, if the store reported one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<DateTime<Utc>>,

    /// Total size in bytes at listing time
    pub size: u64,
}

impl ObjectRef {
    /// Creates a new object snapshot.
    pub fn new(identity: impl Into<String>, last_modified: Option<DateTime<Utc>>, size: u64) -> Self {
        Self {
            identity: identity.into(),
            last_modified,
            size,
        }
    }

    /// Returns the key portion of the identity (everything after `scheme://bucket/`).
    pub fn key(&self) -> &str {
        match self.identity.split_once("://") {
            Some((_, rest)) => rest.split_once('/').map(|(_, key)| key).unwrap_or(""),
            None => &self.identity,
        }
    }

    /// Returns the file name portion of the key.
    pub fn file_name(&self) -> &str {
        let key = self.key();
        key.rsplit('/').next().unwrap_or(key)
    }
}
