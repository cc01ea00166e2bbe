//! S3 store tests using LocalStack.

use crate::common::{CollectingSink, DATA_LINE, HEADER, LocalStackTestContext, access_line};
use lh_discoverer::{S3Config, S3Store};
use lh_error::{ErrorCategory, HarvestError, StoreError, classify_error};
use lh_harvester::{Harvester, HarvesterConfig};
use lh_traits::ObjectStore;
use std::sync::Arc;
use std::time::Duration;

async fn store_for(ctx: &LocalStackTestContext, bucket: &str) -> Arc<S3Store> {
    let config = S3Config::new(bucket)
        .with_endpoint(&ctx.endpoint)
        .with_credentials("test", "test");
    Arc::new(S3Store::from_config(&config).await.unwrap())
}

#[tokio::test]
#[ignore = "requires LocalStack"]
async fn test_s3_list_and_range_read() {
    let ctx = LocalStackTestContext::new().await;
    if !ctx.is_available().await {
        eprintln!("LocalStack not available, skipping test");
        return;
    }

    let bucket = "lh-range-bucket";
    ctx.create_bucket(bucket).await.unwrap();
    ctx.empty_bucket(bucket).await.unwrap();
    ctx.put_segment(bucket, "app/2024/01/01/00/seg.log", DATA_LINE)
        .await
        .unwrap();
    ctx.put_segment(bucket, "other/seg.log", DATA_LINE).await.unwrap();

    let store = store_for(&ctx, bucket).await;
    let listed = store.list("app", true).await.unwrap();

    assert_eq!(listed.len(), 1);
    let obj = &listed[0];
    assert_eq!(obj.identity, format!("s3://{bucket}/app/2024/01/01/00/seg.log"));
    assert_eq!(obj.size, DATA_LINE.len() as u64);
    assert!(obj.last_modified.is_some());

    let bytes = store.range_read(&obj.identity, 20, 10).await.unwrap();
    assert_eq!(&bytes[..], &DATA_LINE.as_bytes()[20..30]);
}

#[tokio::test]
#[ignore = "requires LocalStack"]
async fn test_s3_harvest_reads_appended_bytes() {
    let ctx = LocalStackTestContext::new().await;
    if !ctx.is_available().await {
        eprintln!("LocalStack not available, skipping test");
        return;
    }

    let bucket = "lh-harvest-bucket";
    // Keyed under the current hour so the narrowed listing still covers it
    let key = chrono::Utc::now()
        .format("app/%Y/%m/%d/%H/seg.log")
        .to_string();
    let key = key.as_str();
    ctx.create_bucket(bucket).await.unwrap();
    ctx.empty_bucket(bucket).await.unwrap();
    ctx.put_segment(bucket, key, &format!("{HEADER}{DATA_LINE}"))
        .await
        .unwrap();

    let sink = Arc::new(CollectingSink::new());
    let mut harvester = Harvester::new(
        HarvesterConfig::new("app"),
        store_for(&ctx, bucket).await,
        sink.clone(),
    )
    .unwrap();

    let first = harvester.run_cycle().await;
    assert_eq!(first.events_emitted, 1);

    // S3 modification times have one-second resolution
    tokio::time::sleep(Duration::from_millis(1100)).await;
    let grown = format!("{HEADER}{DATA_LINE}{}", access_line(9, "/y"));
    ctx.put_segment(bucket, key, &grown).await.unwrap();

    let second = harvester.run_cycle().await;
    assert_eq!(second.events_emitted, 1);
    assert_eq!(second.bytes_read, access_line(9, "/y").len() as u64);
    assert_eq!(sink.uris(), vec!["/x", "/y"]);
}

#[tokio::test]
#[ignore = "requires LocalStack"]
async fn test_s3_missing_key_and_bucket_are_permanent() {
    let ctx = LocalStackTestContext::new().await;
    if !ctx.is_available().await {
        eprintln!("LocalStack not available, skipping test");
        return;
    }

    let bucket = "lh-missing-bucket";
    ctx.create_bucket(bucket).await.unwrap();
    ctx.empty_bucket(bucket).await.unwrap();

    let store = store_for(&ctx, bucket).await;
    let gone = store
        .range_read(&format!("s3://{bucket}/app/gone.log"), 0, 10)
        .await
        .unwrap_err();
    assert!(matches!(gone, HarvestError::Store(StoreError::NotFound(_))));
    assert_eq!(classify_error(&gone), ErrorCategory::Permanent);

    let absent = store_for(&ctx, "lh-bucket-that-was-never-created").await;
    let refused = absent.list("app", true).await.unwrap_err();
    assert!(matches!(refused, HarvestError::Store(StoreError::Rejected { .. })));
}
