//! S3 object store adapter.
//!
//! - Client configuration with LocalStack support and per-attempt timeouts
//! - Paginated object listing with streaming
//! - Ranged reads addressed by `s3://bucket/key` identities
//! - Backoff for transient failures, immediate return for rejected requests

mod client;
mod list;
mod retry;
mod store;
mod uri;

pub use client::{S3Config, create_s3_client};
pub use list::list_objects;
pub use retry::{RetryConfig, with_retry};
pub use store::S3Store;
pub use uri::parse_s3_uri;
