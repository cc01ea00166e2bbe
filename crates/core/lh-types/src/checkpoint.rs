//! Resume checkpoint shape.

use crate::Watermark;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Persisted harvest position.
///
/// Watermark and per-object offsets are saved together; supplying both on
/// restart reproduces the exact resume point. Offsets are delivered offsets:
/// bytes of a trailing partial line are not counted, so they are re-read
/// after a restart.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResumeState {
    /// Modification time of the last fully processed object
    #[serde(default)]
    pub watermark: Watermark,

    /// Object identity -> bytes delivered
    #[serde(default)]
    pub offsets: BTreeMap<String, u64>,

    /// When this state was captured
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saved_at: Option<DateTime<Utc>>,
}

impl ResumeState {
    /// Creates a resume state from a watermark with no offsets.
    pub fn new(watermark: Watermark) -> Self {
        Self {
            watermark,
            ..Default::default()
        }
    }

    /// Sets the offset for one object.
    pub fn with_offset(mut self, identity: impl Into<String>, offset: u64) -> Self {
        self.offsets.insert(identity.into(), offset);
        self
    }
}
