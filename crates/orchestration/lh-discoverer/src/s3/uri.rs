//! `s3://bucket/key` identities.

use lh_error::{Result, StoreError};

/// Parse an S3 URI into bucket and key.
///
/// The key is taken verbatim from the URI, so keys containing characters
/// that URL syntax would percent-encode round-trip unchanged.
pub fn parse_s3_uri(uri: &str) -> Result<(String, String)> {
    let url = url::Url::parse(uri)
        .map_err(|e| StoreError::InvalidUri(format!("Invalid S3 URI '{uri}': {e}")))?;

    if url.scheme() != "s3" {
        return Err(StoreError::InvalidUri(format!("Expected s3:// URI, got: {uri}")).into());
    }

    let bucket = url
        .host_str()
        .filter(|b| !b.is_empty())
        .ok_or_else(|| StoreError::InvalidUri(format!("Missing bucket in S3 URI: {uri}")))?;

    let key = uri
        .strip_prefix("s3://")
        .and_then(|rest| rest.split_once('/'))
        .map(|(_, key)| key)
        .unwrap_or("");
    if key.is_empty() {
        return Err(StoreError::InvalidUri(format!("Missing key in S3 URI: {uri}")).into());
    }

    Ok((bucket.to_string(), key.to_string()))
}
