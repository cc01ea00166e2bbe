//! Event sink implementations.
//!
//! - [`StdoutSink`] writes events as JSON Lines or pretty JSON
//! - [`StatsSink`] counts events without writing them

mod stats;
mod stdout;

pub use stats::{StatsReport, StatsSink};
pub use stdout::{OutputFormat, StdoutSink};
