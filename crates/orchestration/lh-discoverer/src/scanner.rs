//! Candidate discovery across planned prefixes.

use lh_error::Result;
use lh_traits::{ObjectStore, with_deadline};
use lh_types::{ObjectRef, Watermark};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, trace, warn};

use crate::filter::{Filter, PatternFilter, WatermarkFilter};

/// Default deadline for a single listing call.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Outcome of one scan.
#[derive(Debug, Clone, Default)]
pub struct ScanResult {
    /// Candidates in ascending modification-time order
    pub candidates: Vec<ObjectRef>,

    /// Objects returned by the store across all prefixes
    pub listed: usize,

    /// Objects dropped by the watermark, key pattern or directory-marker check
    pub filtered: usize,

    /// Duplicate snapshots collapsed into a single candidate
    pub duplicates: usize,
}

/// Lists planned prefixes and produces the time-ordered candidate list.
///
/// Every prefix is listed recursively. A failure on any prefix fails the
/// whole scan so a cycle never works from a partial view of the store.
pub struct ObjectScanner<S: ObjectStore + ?Sized> {
    store: Arc<S>,
    key_filter: Option<PatternFilter>,
    request_timeout: Duration,
}

impl<S: ObjectStore + ?Sized> ObjectScanner<S> {
    /// Create a scanner over the given store.
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            key_filter: None,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Only keep objects whose file name matches `filter`.
    pub fn with_key_filter(mut self, filter: PatternFilter) -> Self {
        self.key_filter = Some(filter);
        self
    }

    /// Set the deadline for each listing call.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Scan `prefixes` for objects modified after `watermark`.
    ///
    /// # Arguments
    ///
    /// * `prefixes` - Prefixes from the planner, listed in order
    /// * `watermark` - Objects at or before this time are dropped
    ///
    /// # Returns
    ///
    /// Deduplicated candidates, stably sorted by modification time
    pub async fn scan(&self, prefixes: &[String], watermark: Watermark) -> Result<ScanResult> {
        let watermark_filter = WatermarkFilter::new(watermark);
        let mut result = ScanResult::default();
        let mut positions: HashMap<String, usize> = HashMap::new();

        debug!(
            store = %self.store.description(),
            prefixes = prefixes.len(),
            filter = %watermark_filter.description(),
            "Starting scan"
        );

        for prefix in prefixes {
            let listed = with_deadline("list", self.request_timeout, self.store.list(prefix, true))
                .await
                .inspect_err(|e| warn!(prefix = %prefix, error = %e, "Listing failed, abandoning scan"))?;

            trace!(prefix = %prefix, count = listed.len(), "Listed prefix");

            for obj in listed {
                result.listed += 1;

                if !self.is_candidate(&obj, &watermark_filter) {
                    result.filtered += 1;
                    trace!(identity = %obj.identity, "Filtered out");
                    continue;
                }

                match positions.get(&obj.identity) {
                    Some(&pos) => {
                        result.duplicates += 1;
                        if supersedes(&obj, &result.candidates[pos]) {
                            result.candidates[pos] = obj;
                        }
                    }
                    None => {
                        positions.insert(obj.identity.clone(), result.candidates.len());
                        result.candidates.push(obj);
                    }
                }
            }
        }

        result.candidates.sort_by_key(|obj| obj.last_modified);

        debug!(
            listed = result.listed,
            filtered = result.filtered,
            duplicates = result.duplicates,
            candidates = result.candidates.len(),
            "Scan completed"
        );

        Ok(result)
    }

    fn is_candidate(&self, obj: &ObjectRef, watermark_filter: &WatermarkFilter) -> bool {
        if obj.identity.ends_with('/') {
            return false;
        }
        if !watermark_filter.matches(obj) {
            return false;
        }
        self.key_filter.as_ref().is_none_or(|f| f.matches(obj))
    }
}

/// True if `candidate` is a newer snapshot than `current`.
fn supersedes(candidate: &ObjectRef, current: &ObjectRef) -> bool {
    (candidate.last_modified, candidate.size) > (current.last_modified, current.size)
}
