//! Resume checkpoint persistence hook.

use async_trait::async_trait;
use lh_error::Result;
use lh_types::ResumeState;

/// Trait for durable storage of the harvest position.
///
/// The harvest loop loads once at startup and saves after every cycle.
#[async_trait]
pub trait CheckpointStore: Send + Sync {
    /// Loads the last saved state, or `None` if nothing was saved yet.
    async fn load(&self) -> Result<Option<ResumeState>>;

    /// Saves the current state.
    async fn save(&self, state: &ResumeState) -> Result<()>;
}
