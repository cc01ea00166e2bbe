//! Statistics for harvest cycles.

use chrono::{DateTime, Duration, Utc};
use lh_discoverer::ScanResult;
use lh_types::Watermark;
use serde::{Deserialize, Serialize};

/// Statistics collected during one poll cycle.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CycleStats {
    /// When the cycle started
    pub started_at: Option<DateTime<Utc>>,

    /// When the cycle completed
    pub completed_at: Option<DateTime<Utc>>,

    /// Number of prefixes listed
    pub prefixes: usize,

    /// Objects returned by the store
    pub objects_listed: usize,

    /// Objects dropped by the watermark or key filters
    pub objects_filtered: usize,

    /// Candidates after deduplication
    pub candidates: usize,

    /// Candidates whose delta was fully consumed and delivered
    pub objects_processed: usize,

    /// Candidates skipped for this cycle after a fetch or sink failure
    pub objects_failed: usize,

    /// Candidates given up on after a permanent failure
    pub objects_dropped: usize,

    /// Events delivered to the sink
    pub events_emitted: u64,

    /// Lines that could not be parsed
    pub lines_malformed: u64,

    /// Blank and comment lines
    pub lines_skipped: u64,

    /// Bytes fetched from the store
    pub bytes_read: u64,

    /// Watermark at the end of the cycle
    pub watermark: Watermark,

    /// Errors encountered during the cycle
    pub errors: Vec<String>,
}

impl CycleStats {
    /// Create a new stats tracker with the current time as start time.
    pub fn new() -> Self {
        Self {
            started_at: Some(Utc::now()),
            ..Default::default()
        }
    }

    /// Mark the cycle as complete with the current time.
    pub fn complete(&mut self, watermark: Watermark) {
        self.watermark = watermark;
        self.completed_at = Some(Utc::now());
    }

    /// Record the outcome of the scan.
    pub fn record_scan(&mut self, scan: &ScanResult) {
        self.objects_listed += scan.listed;
        self.objects_filtered += scan.filtered;
        self.candidates += scan.candidates.len();
    }

    /// Record a fully processed object.
    pub fn record_object(&mut self, bytes_read: u64, events: u64, malformed: u64, skipped: u64) {
        self.objects_processed += 1;
        self.bytes_read += bytes_read;
        self.events_emitted += events;
        self.lines_malformed += malformed;
        self.lines_skipped += skipped;
    }

    /// Record an object skipped for this cycle.
    pub fn record_object_failure(&mut self, error: impl ToString) {
        self.objects_failed += 1;
        self.errors.push(error.to_string());
    }

    /// Record an object given up on for good.
    pub fn record_object_dropped(&mut self, error: impl ToString) {
        self.objects_dropped += 1;
        self.errors.push(error.to_string());
    }

    /// Record an error.
    pub fn record_error(&mut self, error: impl ToString) {
        self.errors.push(error.to_string());
    }

    /// Get the duration of the cycle.
    pub fn duration(&self) -> Option<Duration> {
        match (self.started_at, self.completed_at) {
            (Some(start), Some(end)) => Some(end - start),
            _ => None,
        }
    }

    /// Check if any errors occurred.
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Get the number of errors.
    pub fn error_count(&self) -> usize {
        self.errors.len()
    }
}

/// Totals across all cycles of one run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunStats {
    /// When the run started
    pub started_at: Option<DateTime<Utc>>,

    /// When the run stopped
    pub completed_at: Option<DateTime<Utc>>,

    /// Cycles completed
    pub cycles: u64,

    /// Cycles that recorded at least one error
    pub cycles_with_errors: u64,

    /// Objects fully processed
    pub objects_processed: u64,

    /// Object attempts skipped after a failure
    pub objects_failed: u64,

    /// Objects given up on after a permanent failure
    pub objects_dropped: u64,

    /// Events delivered
    pub events_emitted: u64,

    /// Malformed lines dropped
    pub lines_malformed: u64,

    /// Bytes fetched
    pub bytes_read: u64,

    /// Watermark after the last cycle
    pub watermark: Watermark,
}

impl RunStats {
    /// Create a new run tracker with the current time as start time.
    pub fn new() -> Self {
        Self {
            started_at: Some(Utc::now()),
            ..Default::default()
        }
    }

    /// Fold one cycle into the totals.
    pub fn record_cycle(&mut self, cycle: &CycleStats) {
        self.cycles += 1;
        if cycle.has_errors() {
            self.cycles_with_errors += 1;
        }
        self.objects_processed += cycle.objects_processed as u64;
        self.objects_failed += cycle.objects_failed as u64;
        self.objects_dropped += cycle.objects_dropped as u64;
        self.events_emitted += cycle.events_emitted;
        self.lines_malformed += cycle.lines_malformed;
        self.bytes_read += cycle.bytes_read;
        self.watermark = cycle.watermark;
    }

    /// Mark the run as complete with the current time.
    pub fn complete(&mut self) {
        self.completed_at = Some(Utc::now());
    }

    /// Calculate the throughput in events per second.
    pub fn events_per_second(&self) -> Option<f64> {
        let (start, end) = (self.started_at?, self.completed_at?);
        let secs = (end - start).num_milliseconds() as f64 / 1000.0;
        Some(if secs > 0.0 {
            self.events_emitted as f64 / secs
        } else {
            0.0
        })
    }
}
