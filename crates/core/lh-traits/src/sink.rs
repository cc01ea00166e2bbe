//! Downstream event sink.

use async_trait::async_trait;
use lh_error::Result;
use lh_types::Event;

/// Trait for event destinations.
///
/// Events from one object are pushed in file order. No acknowledgement
/// contract is assumed beyond the returned `Result`: an `Err` means the
/// event was not delivered and the object's byte range will be retried.
#[async_trait]
pub trait EventSink: Send + Sync {
    /// Delivers a single event.
    async fn push(&self, event: &Event) -> Result<()>;

    /// Flushes any buffered events.
    async fn flush(&self) -> Result<()> {
        Ok(())
    }
}
