//! Common utilities for integration tests.

pub mod localstack;

pub use localstack::LocalStackTestContext;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use lh_error::{Result, SinkError};
use lh_traits::EventSink;
use lh_types::Event;
use parking_lot::Mutex;

/// Header line written at the top of every segment.
pub const HEADER: &str = "#Fields: date time s-sitename cs-method cs-uri-stem cs-uri-query s-port cs-username c-ip cs(User-Agent) cs(Cookie) cs(Referer) cs-host sc-status sc-substatus sc-win32-status sc-bytes cs-bytes time-taken\n";

/// Reference data line.
pub const DATA_LINE: &str =
    "2024-01-01 00:00:05 site1 GET /x - 80 - 1.2.3.4 - - - host 200 0 0 100 50 10\n";

/// A well-formed line stamped `00:00:<second>` requesting `uri`.
pub fn access_line(second: u32, uri: &str) -> String {
    format!(
        "2024-01-01 00:00:{second:02} site1 GET {uri} - 80 - 1.2.3.4 - - - host 200 0 0 100 50 10\n"
    )
}

/// `2024-01-01 00:<minute>:00 UTC`.
pub fn at_minute(minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, minute, 0).unwrap()
}

/// Sink that stores every event for inspection.
#[derive(Default)]
pub struct CollectingSink {
    events: Mutex<Vec<Event>>,
    flushes: Mutex<u64>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().clone()
    }

    pub fn uris(&self) -> Vec<String> {
        self.events
            .lock()
            .iter()
            .filter_map(|e| e.field("cs-uri-stem").and_then(|v| v.as_str()).map(String::from))
            .collect()
    }

    pub fn flushes(&self) -> u64 {
        *self.flushes.lock()
    }
}

#[async_trait]
impl EventSink for CollectingSink {
    async fn push(&self, event: &Event) -> Result<()> {
        self.events.lock().push(event.clone());
        Ok(())
    }

    async fn flush(&self) -> Result<()> {
        *self.flushes.lock() += 1;
        Ok(())
    }
}

/// Sink that accepts a fixed number of events, then rejects the rest.
pub struct FlakySink {
    inner: CollectingSink,
    remaining: Mutex<usize>,
}

impl FlakySink {
    pub fn accepting(count: usize) -> Self {
        Self {
            inner: CollectingSink::new(),
            remaining: Mutex::new(count),
        }
    }

    /// Accept `count` more events.
    pub fn allow(&self, count: usize) {
        *self.remaining.lock() = count;
    }

    pub fn events(&self) -> Vec<Event> {
        self.inner.events()
    }
}

#[async_trait]
impl EventSink for FlakySink {
    async fn push(&self, event: &Event) -> Result<()> {
        {
            let mut remaining = self.remaining.lock();
            if *remaining == 0 {
                return Err(SinkError::Delivery("downstream unavailable".to_string()).into());
            }
            *remaining -= 1;
        }
        self.inner.push(event).await
    }
}
