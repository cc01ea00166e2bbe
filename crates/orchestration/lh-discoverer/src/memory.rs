//! In-memory object store.
//!
//! Used for local development and tests. Objects carry explicit modification
//! times so time-bucketed listing can be exercised deterministically, and
//! failures can be injected per prefix or per object.

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use lh_error::{Result, StoreError};
use lh_traits::ObjectStore;
use lh_types::ObjectRef;
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::trace;

const SCHEME: &str = "mem://";

#[derive(Debug, Clone)]
struct MemoryObject {
    data: Vec<u8>,
    last_modified: Option<DateTime<Utc>>,
}

/// Object store backed by a sorted in-process map.
///
/// Identities have the form `mem://{bucket}/{key}`.
#[derive(Debug, Default)]
pub struct MemoryStore {
    bucket: String,
    objects: RwLock<BTreeMap<String, MemoryObject>>,
    failing_prefixes: RwLock<HashSet<String>>,
    failing_keys: RwLock<HashSet<String>>,
    list_calls: AtomicU64,
    read_calls: AtomicU64,
}

impl MemoryStore {
    /// Create an empty store for the given bucket name.
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            ..Default::default()
        }
    }

    /// The identity an object with `key` is listed under.
    pub fn identity(&self, key: &str) -> String {
        format!("{SCHEME}{}/{}", self.bucket, key)
    }

    /// Create or replace an object.
    pub fn put(&self, key: &str, data: impl Into<Vec<u8>>, last_modified: DateTime<Utc>) -> String {
        self.insert(key, data.into(), Some(last_modified))
    }

    /// Create or replace an object whose modification time is unknown.
    pub fn put_without_timestamp(&self, key: &str, data: impl Into<Vec<u8>>) -> String {
        self.insert(key, data.into(), None)
    }

    /// Append bytes to an object, creating it if needed.
    pub fn append(&self, key: &str, data: impl AsRef<[u8]>, last_modified: DateTime<Utc>) -> String {
        let mut objects = self.objects.write();
        let entry = objects.entry(key.to_string()).or_insert_with(|| MemoryObject {
            data: Vec::new(),
            last_modified: None,
        });
        entry.data.extend_from_slice(data.as_ref());
        entry.last_modified = Some(last_modified);
        self.identity(key)
    }

    /// Make every listing under `prefix` fail until [`clear_failures`](Self::clear_failures).
    pub fn fail_list(&self, prefix: &str) {
        self.failing_prefixes.write().insert(prefix.to_string());
    }

    /// Make every range read of `key` fail until [`clear_failures`](Self::clear_failures).
    pub fn fail_reads(&self, key: &str) {
        self.failing_keys.write().insert(key.to_string());
    }

    /// Remove all injected failures.
    pub fn clear_failures(&self) {
        self.failing_prefixes.write().clear();
        self.failing_keys.write().clear();
    }

    /// Number of `list` calls served.
    pub fn list_calls(&self) -> u64 {
        self.list_calls.load(Ordering::Relaxed)
    }

    /// Number of `range_read` calls served.
    pub fn read_calls(&self) -> u64 {
        self.read_calls.load(Ordering::Relaxed)
    }

    fn insert(&self, key: &str, data: Vec<u8>, last_modified: Option<DateTime<Utc>>) -> String {
        self.objects
            .write()
            .insert(key.to_string(), MemoryObject { data, last_modified });
        self.identity(key)
    }

    fn key_of<'a>(&self, identity: &'a str) -> Result<&'a str> {
        identity
            .strip_prefix(SCHEME)
            .and_then(|rest| rest.strip_prefix(self.bucket.as_str()))
            .and_then(|rest| rest.strip_prefix('/'))
            .ok_or_else(|| StoreError::InvalidUri(identity.to_string()).into())
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn list(&self, prefix: &str, recursive: bool) -> Result<Vec<ObjectRef>> {
        self.list_calls.fetch_add(1, Ordering::Relaxed);

        if self.failing_prefixes.read().contains(prefix) {
            return Err(StoreError::List {
                prefix: prefix.to_string(),
                message: "injected failure".to_string(),
            }
            .into());
        }

        let objects = self.objects.read();
        let listed: Vec<ObjectRef> = objects
            .range(prefix.to_string()..)
            .take_while(|(key, _)| key.starts_with(prefix))
            .filter(|(key, _)| recursive || !key[prefix.len()..].trim_start_matches('/').contains('/'))
            .map(|(key, obj)| ObjectRef::new(self.identity(key), obj.last_modified, obj.data.len() as u64))
            .collect();

        trace!(prefix = prefix, count = listed.len(), "Listed memory objects");
        Ok(listed)
    }

    async fn range_read(&self, identity: &str, offset: u64, length: u64) -> Result<Bytes> {
        self.read_calls.fetch_add(1, Ordering::Relaxed);
        let key = self.key_of(identity)?;

        if self.failing_keys.read().contains(key) {
            return Err(StoreError::Read {
                identity: identity.to_string(),
                message: "injected failure".to_string(),
            }
            .into());
        }

        let objects = self.objects.read();
        let obj = objects
            .get(key)
            .ok_or_else(|| StoreError::NotFound(identity.to_string()))?;

        let len = obj.data.len() as u64;
        let start = offset.min(len) as usize;
        let end = offset.saturating_add(length).min(len) as usize;
        Ok(Bytes::copy_from_slice(&obj.data[start..end]))
    }

    fn description(&self) -> String {
        format!("{SCHEME}{}", self.bucket)
    }
}
