//! Stdout sink implementation.

use async_trait::async_trait;
use lh_error::{Result, SinkError};
use lh_traits::EventSink;
use lh_types::Event;
use serde::{Deserialize, Serialize};
use std::io::{self, Write};

/// Output format for the stdout sink.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// JSON Lines (one JSON object per line)
    #[default]
    Jsonl,
    /// Pretty-printed JSON
    Json,
}

/// Sink that writes events to stdout.
///
/// Logging goes to stderr, so stdout carries nothing but events and can be
/// piped straight into a shipper.
pub struct StdoutSink {
    format: OutputFormat,
}

impl StdoutSink {
    /// Create a new stdout sink.
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Create a stdout sink with JSONL format.
    pub fn jsonl() -> Self {
        Self::new(OutputFormat::Jsonl)
    }

    /// Create a stdout sink with pretty JSON format.
    pub fn json() -> Self {
        Self::new(OutputFormat::Json)
    }

    /// Render one event in the configured format.
    pub fn render(&self, event: &Event) -> Result<String> {
        let rendered = match self.format {
            OutputFormat::Jsonl => serde_json::to_string(event),
            OutputFormat::Json => serde_json::to_string_pretty(event),
        };
        rendered.map_err(|e| SinkError::Serialize(e.to_string()).into())
    }
}

impl Default for StdoutSink {
    fn default() -> Self {
        Self::jsonl()
    }
}

#[async_trait]
impl EventSink for StdoutSink {
    async fn push(&self, event: &Event) -> Result<()> {
        let line = self.render(event)?;

        let stdout = io::stdout();
        let mut handle = stdout.lock();
        writeln!(handle, "{line}")
            .map_err(|e| SinkError::Delivery(format!("Failed to write to stdout: {e}")).into())
    }

    async fn flush(&self) -> Result<()> {
        io::stdout()
            .flush()
            .map_err(|e| SinkError::Delivery(format!("Failed to flush stdout: {e}")).into())
    }
}
