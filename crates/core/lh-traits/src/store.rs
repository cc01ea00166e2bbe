//! Object store capability.

use async_trait::async_trait;
use bytes::Bytes;
use lh_error::Result;
use lh_types::ObjectRef;

/// Trait for prefix-addressable object stores.
///
/// # Implementations
///
/// - S3 store: paginated `ListObjectsV2` and ranged `GetObject`
/// - Memory store: in-process objects for development and tests
///
/// Implementations report transient failures as
/// [`StoreError`](lh_error::StoreError) so the harvest loop can retry the
/// affected scope on the next cycle.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Lists objects whose key starts with `prefix`.
    ///
    /// # Arguments
    ///
    /// * `prefix` - Key prefix to list under
    /// * `recursive` - If false, only objects directly under `prefix` are returned
    ///
    /// # Returns
    ///
    /// Object snapshots in the order the store returned them
    async fn list(&self, prefix: &str, recursive: bool) -> Result<Vec<ObjectRef>>;

    /// Reads `length` bytes of an object starting at `offset`.
    ///
    /// # Arguments
    ///
    /// * `identity` - Object identity as returned by [`list`](ObjectStore::list)
    /// * `offset` - First byte to read
    /// * `length` - Number of bytes to read
    async fn range_read(&self, identity: &str, offset: u64, length: u64) -> Result<Bytes>;

    /// Short description for logging.
    fn description(&self) -> String;
}
