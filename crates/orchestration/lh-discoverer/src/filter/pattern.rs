//! Glob matching on object file names.

use glob::Pattern;
use lh_error::{HarvestError, Result};
use lh_types::ObjectRef;

use super::Filter;

/// A filter for matching object keys against glob patterns.
///
/// Matches against the file name portion of the key (after the last `/`),
/// so `*.log` matches segments in any hour bucket.
///
/// # Example
///
/// ```
/// use lh_discoverer::{Filter, PatternFilter};
/// use lh_types::ObjectRef;
///
/// let filter = PatternFilter::new("*.log").unwrap();
///
/// assert!(filter.matches(&ObjectRef::new("s3://b/app/2024/01/01/00/seg.log", None, 1)));
/// assert!(!filter.matches(&ObjectRef::new("s3://b/app/2024/01/01/00/seg.log.gz", None, 1)));
/// ```
#[derive(Debug, Clone)]
pub struct PatternFilter {
    pattern: String,
    compiled: Pattern,
}

impl PatternFilter {
    /// Create a new pattern filter.
    ///
    /// Returns an error if the pattern is invalid.
    pub fn new(pattern: &str) -> Result<Self> {
        let compiled = Pattern::new(pattern)
            .map_err(|e| HarvestError::Config(format!("Invalid glob pattern '{pattern}': {e}")))?;

        Ok(Self {
            pattern: pattern.to_string(),
            compiled,
        })
    }
}

impl Filter for PatternFilter {
    fn matches(&self, obj: &ObjectRef) -> bool {
        self.compiled.matches(obj.file_name())
    }

    fn description(&self) -> String {
        format!("pattern({})", self.pattern)
    }
}
