//! [`ObjectStore`] implementation backed by S3.

use async_trait::async_trait;
use aws_sdk_s3::Client;
use aws_sdk_s3::error::DisplayErrorContext;
use bytes::Bytes;
use futures::{StreamExt, pin_mut};
use lh_error::{Result, StoreError};
use lh_traits::ObjectStore;
use lh_types::ObjectRef;
use tracing::{debug, trace};

use super::client::{S3Config, create_s3_client};
use super::list::list_objects;
use super::retry::{RetryConfig, is_rejection, with_retry};
use super::uri::parse_s3_uri;

/// S3-backed object store.
///
/// Listing uses paginated `ListObjectsV2`; reads use ranged `GetObject`.
/// Both go through [`with_retry`]. A missing key maps to
/// [`StoreError::NotFound`], other refused requests to
/// [`StoreError::Rejected`].
pub struct S3Store {
    client: Client,
    bucket: String,
    retry: RetryConfig,
}

impl S3Store {
    /// Create a store from an existing client.
    pub fn new(client: Client, bucket: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
            retry: RetryConfig::default(),
        }
    }

    /// Create a client from `config` and wrap it, retrying as `config` says.
    pub async fn from_config(config: &S3Config) -> Result<Self> {
        let client = create_s3_client(config).await?;
        Ok(Self::new(client, config.bucket.clone()).with_retry_config(config.retry.clone()))
    }

    /// Set the retry configuration.
    pub fn with_retry_config(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    async fn list_once(&self, prefix: &str, delimiter: Option<&str>) -> Result<Vec<ObjectRef>> {
        let stream = list_objects(&self.client, &self.bucket, prefix, delimiter);
        pin_mut!(stream);

        let mut objects = Vec::new();
        while let Some(obj) = stream.next().await {
            objects.push(obj?);
        }
        Ok(objects)
    }

    async fn get_range(&self, identity: &str, bucket: &str, key: &str, start: u64, end: u64) -> Result<Bytes> {
        trace!(identity = identity, start = start, end = end, "Downloading byte range from S3");

        let result = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .range(format!("bytes={start}-{end}"))
            .send()
            .await
            .map_err(|e| {
                if e.as_service_error().is_some_and(|se| se.is_no_such_key()) {
                    StoreError::NotFound(identity.to_string())
                } else if is_rejection(&e) {
                    StoreError::Rejected {
                        operation: "range_read".to_string(),
                        target: identity.to_string(),
                        message: DisplayErrorContext(&e).to_string(),
                    }
                } else {
                    StoreError::Read {
                        identity: identity.to_string(),
                        message: DisplayErrorContext(&e).to_string(),
                    }
                }
            })?;

        let bytes = result.body.collect().await.map_err(|e| StoreError::Read {
            identity: identity.to_string(),
            message: format!("Failed to read body: {e}"),
        })?;

        Ok(bytes.into_bytes())
    }
}

#[async_trait]
impl ObjectStore for S3Store {
    async fn list(&self, prefix: &str, recursive: bool) -> Result<Vec<ObjectRef>> {
        let delimiter = (!recursive).then_some("/");

        let objects = with_retry(&self.retry, "list_objects", move || self.list_once(prefix, delimiter)).await?;

        debug!(bucket = %self.bucket, prefix = prefix, count = objects.len(), "Listed S3 objects");
        Ok(objects)
    }

    async fn range_read(&self, identity: &str, offset: u64, length: u64) -> Result<Bytes> {
        if length == 0 {
            return Ok(Bytes::new());
        }

        let (bucket, key) = parse_s3_uri(identity)?;
        let (bucket, key) = (bucket.as_str(), key.as_str());
        let end = offset.saturating_add(length - 1);

        with_retry(&self.retry, "get_object_range", move || {
            self.get_range(identity, bucket, key, offset, end)
        })
        .await
    }

    fn description(&self) -> String {
        format!("s3://{}", self.bucket)
    }
}
