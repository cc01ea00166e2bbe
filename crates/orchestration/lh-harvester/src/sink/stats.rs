//! Stats sink implementation.

use async_trait::async_trait;
use lh_error::Result;
use lh_traits::EventSink;
use lh_types::Event;
use std::sync::atomic::{AtomicU64, Ordering};

/// Sink that counts events without writing them anywhere.
///
/// Used for dry runs and throughput measurement.
#[derive(Debug, Default)]
pub struct StatsSink {
    events: AtomicU64,
    fields: AtomicU64,
    flushes: AtomicU64,
}

impl StatsSink {
    /// Create a new stats sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the current statistics.
    pub fn get_stats(&self) -> StatsReport {
        StatsReport {
            events: self.events.load(Ordering::Relaxed),
            fields: self.fields.load(Ordering::Relaxed),
            flushes: self.flushes.load(Ordering::Relaxed),
        }
    }
}

/// Statistics report from the stats sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatsReport {
    /// Events received
    pub events: u64,
    /// Fields across all events
    pub fields: u64,
    /// Flush calls
    pub flushes: u64,
}

#[async_trait]
impl EventSink for StatsSink {
    async fn push(&self, event: &Event) -> Result<()> {
        self.events.fetch_add(1, Ordering::Relaxed);
        self.fields
            .fetch_add(event.fields.len() as u64, Ordering::Relaxed);
        Ok(())
    }

    async fn flush(&self) -> Result<()> {
        self.flushes.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}
