//! Restart behaviour with a file checkpoint.

use crate::common::{CollectingSink, access_line, at_minute};
use lh_discoverer::MemoryStore;
use lh_harvester::{FileCheckpointStore, Harvester, HarvesterConfig};
use lh_traits::CheckpointStore;
use lh_types::Watermark;
use std::sync::Arc;

const SEGMENT: &str = "app/2024/01/01/00/seg.log";

fn harvester(
    store: &Arc<MemoryStore>,
    sink: &Arc<CollectingSink>,
    checkpoint: &Arc<FileCheckpointStore>,
) -> Harvester<MemoryStore> {
    Harvester::new(HarvesterConfig::new("app"), store.clone(), sink.clone())
        .unwrap()
        .with_checkpoint_store(checkpoint.clone())
}

#[tokio::test]
async fn test_restart_resumes_from_saved_offsets() {
    let dir = tempfile::tempdir().unwrap();
    let checkpoint = Arc::new(FileCheckpointStore::new(dir.path().join("state.json")));
    let store = Arc::new(MemoryStore::new("logs"));
    let sink = Arc::new(CollectingSink::new());

    let second_line = access_line(2, "/two");
    let (head, tail) = second_line.split_at(25);
    let id = store.put(
        SEGMENT,
        format!("{}{head}", access_line(1, "/one")),
        at_minute(1),
    );

    {
        let mut first = harvester(&store, &sink, &checkpoint);
        assert!(!first.load_checkpoint().await);
        first.run_cycle_at(at_minute(2)).await;
    }

    let saved = checkpoint.load().await.unwrap().unwrap();
    assert_eq!(saved.watermark, Watermark::at(at_minute(1)));
    assert_eq!(saved.offsets[&id], access_line(1, "/one").len() as u64);

    store.append(SEGMENT, tail, at_minute(3));

    let mut second = harvester(&store, &sink, &checkpoint);
    assert!(second.load_checkpoint().await);
    second.run_cycle_at(at_minute(4)).await;

    assert_eq!(sink.uris(), vec!["/one", "/two"]);
    assert_eq!(second.watermark(), Watermark::at(at_minute(3)));
}

#[tokio::test]
async fn test_checkpoint_overrides_skip_until() {
    let dir = tempfile::tempdir().unwrap();
    let checkpoint = Arc::new(FileCheckpointStore::new(dir.path().join("state.json")));
    let store = Arc::new(MemoryStore::new("logs"));
    let sink = Arc::new(CollectingSink::new());
    store.put(SEGMENT, access_line(1, "/a"), at_minute(5));

    {
        let mut first = harvester(&store, &sink, &checkpoint);
        first.run_cycle_at(at_minute(6)).await;
    }

    let config = HarvesterConfig::new("app").with_skip_until(at_minute(0));
    let mut second = Harvester::new(config, store.clone(), sink.clone())
        .unwrap()
        .with_checkpoint_store(checkpoint.clone());
    second.load_checkpoint().await;
    second.run_cycle_at(at_minute(7)).await;

    assert_eq!(second.watermark(), Watermark::at(at_minute(5)));
    assert_eq!(sink.events().len(), 1);
}

#[tokio::test]
async fn test_corrupt_checkpoint_falls_back_to_configured_start() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.json");
    std::fs::write(&path, b"not json").unwrap();

    let checkpoint = Arc::new(FileCheckpointStore::new(path));
    let store = Arc::new(MemoryStore::new("logs"));
    let sink = Arc::new(CollectingSink::new());
    store.put(SEGMENT, access_line(1, "/a"), at_minute(1));

    let mut harvester = harvester(&store, &sink, &checkpoint);
    assert!(!harvester.load_checkpoint().await);
    harvester.run_cycle_at(at_minute(2)).await;

    assert_eq!(sink.events().len(), 1);
    assert!(checkpoint.load().await.unwrap().is_some());
}
