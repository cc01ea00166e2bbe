//! Harvest position: watermark, per-object offsets and pending fragments.

use bytes::Bytes;
use lh_types::{ResumeState, Watermark};
use std::collections::{BTreeMap, HashMap};

/// Per-object count of bytes already consumed.
///
/// Offsets only move forward. Entries are never removed: log segments are
/// append-only and never shrink.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OffsetTracker {
    offsets: HashMap<String, u64>,
}

impl OffsetTracker {
    /// Create an empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bytes consumed for `identity`; 0 if the object was never seen.
    pub fn offset_for(&self, identity: &str) -> u64 {
        self.offsets.get(identity).copied().unwrap_or(0)
    }

    /// Record that `identity` has been consumed up to `offset`.
    ///
    /// A first sighting creates the entry even at offset 0. Returns false and
    /// leaves the entry unchanged if `offset` is behind the current value.
    pub fn record(&mut self, identity: &str, offset: u64) -> bool {
        match self.offsets.get_mut(identity) {
            Some(current) if *current > offset => false,
            Some(current) => {
                *current = offset;
                true
            }
            None => {
                self.offsets.insert(identity.to_string(), offset);
                true
            }
        }
    }

    /// True if the object has an entry.
    pub fn contains(&self, identity: &str) -> bool {
        self.offsets.contains_key(identity)
    }

    /// Number of tracked objects.
    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    /// True if no objects are tracked.
    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    /// Copy of all entries, sorted by identity.
    pub fn snapshot(&self) -> BTreeMap<String, u64> {
        self.offsets
            .iter()
            .map(|(id, offset)| (id.clone(), *offset))
            .collect()
    }

    /// Build a tracker from persisted entries.
    pub fn restore(offsets: BTreeMap<String, u64>) -> Self {
        Self {
            offsets: offsets.into_iter().collect(),
        }
    }
}

/// Everything the harvest loop mutates between cycles.
#[derive(Debug, Clone, Default)]
pub struct HarvestState {
    watermark: Watermark,
    offsets: OffsetTracker,
    fragments: HashMap<String, Bytes>,
}

impl HarvestState {
    /// Fresh state starting at `watermark`.
    pub fn new(watermark: Watermark) -> Self {
        Self {
            watermark,
            ..Default::default()
        }
    }

    /// Rebuild state from a checkpoint.
    ///
    /// Saved offsets exclude fragment bytes, so fragments start empty and the
    /// unterminated tail of each object is read again.
    pub fn from_resume(state: ResumeState) -> Self {
        Self {
            watermark: state.watermark,
            offsets: OffsetTracker::restore(state.offsets),
            fragments: HashMap::new(),
        }
    }

    /// Current watermark.
    pub fn watermark(&self) -> Watermark {
        self.watermark
    }

    /// Current offsets, including bytes held in fragments.
    pub fn offsets(&self) -> &OffsetTracker {
        &self.offsets
    }

    /// Pending fragment for `identity`, empty if none.
    pub fn fragment(&self, identity: &str) -> Bytes {
        self.fragments.get(identity).cloned().unwrap_or_default()
    }

    /// Commit a fully consumed and delivered read.
    ///
    /// # Arguments
    ///
    /// * `identity` - Object identity
    /// * `offset` - End of the fetched range
    /// * `fragment` - Unterminated tail carried into the next read
    pub fn commit(&mut self, identity: &str, offset: u64, fragment: Bytes) {
        if !self.offsets.record(identity, offset) {
            return;
        }
        if fragment.is_empty() {
            self.fragments.remove(identity);
        } else {
            self.fragments.insert(identity.to_string(), fragment);
        }
    }

    /// Move the watermark forward. Returns true if it moved.
    pub fn advance_watermark(&mut self, modified: chrono::DateTime<chrono::Utc>) -> bool {
        self.watermark.advance(modified)
    }

    /// Persistable view of this state.
    ///
    /// Offsets are reduced by pending fragment lengths so a restart re-reads
    /// the fragment bytes instead of losing them.
    pub fn resume_state(&self) -> ResumeState {
        let offsets = self
            .offsets
            .offsets
            .iter()
            .map(|(id, offset)| {
                let pending = self.fragments.get(id).map_or(0, |f| f.len() as u64);
                (id.clone(), offset.saturating_sub(pending))
            })
            .collect();

        ResumeState {
            watermark: self.watermark,
            offsets,
            saved_at: Some(chrono::Utc::now()),
        }
    }
}
