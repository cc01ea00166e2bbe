//! Harvest loop for log-harvester.
//!
//! Drives the poll cycle: plan prefixes, scan candidates, fetch appended
//! bytes, parse records and deliver events, then advance the watermark and
//! save a checkpoint.

pub mod checkpoint;
pub mod config;
pub mod harvester;
pub mod sink;
pub mod state;
pub mod stats;

pub use checkpoint::FileCheckpointStore;
pub use config::{DEFAULT_POLL_INTERVAL, DEFAULT_REQUEST_TIMEOUT, HarvesterConfig};
pub use harvester::Harvester;
pub use sink::{OutputFormat, StatsReport, StatsSink, StdoutSink};
pub use state::{HarvestState, OffsetTracker};
pub use stats::{CycleStats, RunStats};
