//! Range reads of newly appended bytes.

use bytes::{Bytes, BytesMut};
use lh_error::Result;
use lh_traits::{ObjectStore, with_deadline};
use lh_types::ObjectRef;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, trace};

/// Default upper bound for a single range read (8 MiB).
pub const DEFAULT_MAX_FETCH_BYTES: u64 = 8 * 1024 * 1024;

/// Default deadline for a single range read.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Reads the bytes of an object appended since a known offset.
///
/// The fetcher is stateless: it never records offsets itself. Large deltas
/// are read in chunks of at most `max_fetch_bytes`, each bounded by the
/// request timeout.
pub struct IncrementalFetcher<S: ObjectStore + ?Sized> {
    store: Arc<S>,
    max_fetch_bytes: u64,
    request_timeout: Duration,
}

impl<S: ObjectStore + ?Sized> IncrementalFetcher<S> {
    /// Create a fetcher over the given store.
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            max_fetch_bytes: DEFAULT_MAX_FETCH_BYTES,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Set the maximum size of a single range read. Zero is treated as one byte.
    pub fn with_max_fetch_bytes(mut self, max_fetch_bytes: u64) -> Self {
        self.max_fetch_bytes = max_fetch_bytes.max(1);
        self
    }

    /// Set the deadline for each range read.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Fetch `[from, obj.size)`.
    ///
    /// Returns an empty buffer without touching the store when `from` is at
    /// or past the listed size. If the store returns fewer bytes than asked
    /// for, the bytes read so far are returned; the caller advances by the
    /// returned length only.
    ///
    /// # Arguments
    ///
    /// * `obj` - Listing snapshot; its size bounds the read
    /// * `from` - First unread byte
    pub async fn fetch(&self, obj: &ObjectRef, from: u64) -> Result<Bytes> {
        if from >= obj.size {
            trace!(identity = %obj.identity, from = from, size = obj.size, "Nothing new to fetch");
            return Ok(Bytes::new());
        }

        let total = obj.size - from;
        if total <= self.max_fetch_bytes {
            let bytes = self.read_chunk(&obj.identity, from, total).await?;
            debug!(identity = %obj.identity, from = from, bytes = bytes.len(), "Fetched delta");
            return Ok(bytes);
        }

        let mut buffer = BytesMut::new();
        let mut position = from;

        while position < obj.size {
            let length = (obj.size - position).min(self.max_fetch_bytes);
            let chunk = self.read_chunk(&obj.identity, position, length).await?;
            let received = chunk.len() as u64;
            buffer.extend_from_slice(&chunk);
            position += received;

            if received < length {
                debug!(
                    identity = %obj.identity,
                    requested = length,
                    received = received,
                    "Short read, stopping at current position"
                );
                break;
            }
        }

        debug!(identity = %obj.identity, from = from, bytes = buffer.len(), "Fetched delta in chunks");
        Ok(buffer.freeze())
    }

    async fn read_chunk(&self, identity: &str, offset: u64, length: u64) -> Result<Bytes> {
        trace!(identity = identity, offset = offset, length = length, "Range read");
        let bytes = with_deadline(
            "range_read",
            self.request_timeout,
            self.store.range_read(identity, offset, length),
        )
        .await?;

        // Never hand back more than the listed size allows
        if bytes.len() as u64 > length {
            Ok(bytes.slice(..length as usize))
        } else {
            Ok(bytes)
        }
    }
}
