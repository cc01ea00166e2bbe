//! Last-seen-modification watermark.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Modification-time boundary below which every object is fully processed.
///
/// `None` is the "beginning of time" sentinel. The watermark never moves
/// backwards: [`Watermark::advance`] keeps the maximum of the current value
/// and the candidate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Watermark(Option<DateTime<Utc>>);

impl Watermark {
    /// The "beginning of time" sentinel: nothing has been processed yet.
    pub const fn beginning() -> Self {
        Self(None)
    }

    /// A watermark at the given timestamp.
    pub const fn at(timestamp: DateTime<Utc>) -> Self {
        Self(Some(timestamp))
    }

    /// The watermark timestamp, or `None` for the sentinel.
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.0
    }

    /// True if this is the "beginning of time" sentinel.
    pub fn is_beginning(&self) -> bool {
        self.0.is_none()
    }

    /// True if an object modified at `modified` has already been incorporated.
    ///
    /// The bound is inclusive: objects exactly at the watermark are covered.
    pub fn covers(&self, modified: DateTime<Utc>) -> bool {
        match self.0 {
            Some(mark) => modified <= mark,
            None => false,
        }
    }

    /// Advance to `max(self, modified)`. Returns true if the watermark moved.
    pub fn advance(&mut self, modified: DateTime<Utc>) -> bool {
        if self.covers(modified) {
            return false;
        }
        self.0 = Some(modified);
        true
    }
}

impl From<Option<DateTime<Utc>>> for Watermark {
    fn from(value: Option<DateTime<Utc>>) -> Self {
        Self(value)
    }
}

impl std::fmt::Display for Watermark {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.0 {
            Some(ts) => write!(f, "{}", ts.to_rfc3339()),
            None => write!(f, "beginning-of-time"),
        }
    }
}
