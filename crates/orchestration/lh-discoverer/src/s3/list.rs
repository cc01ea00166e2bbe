//! S3 object listing with pagination support.

use async_stream::try_stream;
use aws_sdk_s3::Client;
use aws_sdk_s3::error::DisplayErrorContext;
use chrono::DateTime;
use futures::Stream;
use lh_error::{Result, StoreError};
use lh_types::ObjectRef;

use super::retry::is_rejection;

/// List objects in an S3 bucket under a prefix.
///
/// Returns a stream of [`ObjectRef`] items with `s3://bucket/key` identities,
/// handling pagination automatically. Directory markers (keys ending with
/// `/`) are filtered out.
///
/// # Arguments
///
/// * `client` - The S3 client to use
/// * `bucket` - The bucket name to list
/// * `prefix` - Key prefix to list under
/// * `delimiter` - If set, keys containing the delimiter after the prefix are
///   rolled up and not returned
///
/// # Example
///
/// ```ignore
/// use futures::{StreamExt, pin_mut};
///
/// let stream = list_objects(&client, "logs", "app/2024/01/01", None);
/// pin_mut!(stream);
///
/// while let Some(result) = stream.next().await {
///     let obj = result?;
///     println!("Found: {} ({} bytes)", obj.identity, obj.size);
/// }
/// ```
pub fn list_objects<'a>(
    client: &'a Client,
    bucket: &'a str,
    prefix: &'a str,
    delimiter: Option<&'a str>,
) -> impl Stream<Item = Result<ObjectRef>> + 'a {
    try_stream! {
        let mut continuation_token: Option<String> = None;

        loop {
            let mut req = client.list_objects_v2().bucket(bucket);

            if !prefix.is_empty() {
                req = req.prefix(prefix);
            }

            if let Some(delimiter) = delimiter {
                req = req.delimiter(delimiter);
            }

            if let Some(ref token) = continuation_token {
                req = req.continuation_token(token);
            }

            let resp = req.send().await.map_err(|e| {
                let message = DisplayErrorContext(&e).to_string();
                if is_rejection(&e) {
                    StoreError::Rejected {
                        operation: "list_objects".to_string(),
                        target: format!("s3://{bucket}/{prefix}"),
                        message,
                    }
                } else {
                    StoreError::List {
                        prefix: prefix.to_string(),
                        message,
                    }
                }
            })?;

            for obj in resp.contents.unwrap_or_default() {
                let key = obj.key.unwrap_or_default();

                if key.is_empty() || key.ends_with('/') {
                    continue;
                }

                let last_modified = obj
                    .last_modified
                    .and_then(|t| DateTime::from_timestamp(t.secs(), t.subsec_nanos()));

                yield ObjectRef::new(
                    format!("s3://{bucket}/{key}"),
                    last_modified,
                    obj.size.unwrap_or(0).max(0) as u64,
                );
            }

            if resp.is_truncated == Some(true) {
                continuation_token = resp.next_continuation_token;
                if continuation_token.is_none() {
                    break;
                }
            } else {
                break;
            }
        }
    }
}
