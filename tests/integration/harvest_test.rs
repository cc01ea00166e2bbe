//! End-to-end harvest cycles against the in-memory store.

use crate::common::{
    CollectingSink, DATA_LINE, FlakySink, HEADER, access_line, at_minute,
};
use lh_discoverer::MemoryStore;
use lh_harvester::{Harvester, HarvesterConfig};
use lh_types::Watermark;
use serde_json::json;
use std::sync::Arc;

const SEGMENT: &str = "app/2024/01/01/00/seg.log";

fn harvester(store: &Arc<MemoryStore>, sink: Arc<CollectingSink>) -> Harvester<MemoryStore> {
    Harvester::new(HarvesterConfig::new("app"), store.clone(), sink).unwrap()
}

#[tokio::test]
async fn test_empty_object_records_zero_offset() {
    let store = Arc::new(MemoryStore::new("logs"));
    let sink = Arc::new(CollectingSink::new());
    let id = store.put(SEGMENT, "", at_minute(1));

    let mut harvester = harvester(&store, sink.clone());
    let stats = harvester.run_cycle_at(at_minute(2)).await;

    assert_eq!(stats.candidates, 1);
    assert_eq!(stats.bytes_read, 0);
    assert_eq!(stats.events_emitted, 0);
    assert!(sink.events().is_empty());
    assert_eq!(store.read_calls(), 0);
    assert!(harvester.state().offsets().contains(&id));
    assert_eq!(harvester.state().offsets().offset_for(&id), 0);
    assert_eq!(harvester.watermark(), Watermark::at(at_minute(1)));
}

#[tokio::test]
async fn test_grown_object_yields_one_event() {
    let store = Arc::new(MemoryStore::new("logs"));
    let sink = Arc::new(CollectingSink::new());
    let id = store.put(SEGMENT, "", at_minute(1));

    let mut harvester = harvester(&store, sink.clone());
    harvester.run_cycle_at(at_minute(2)).await;

    store.append(SEGMENT, format!("{HEADER}{DATA_LINE}"), at_minute(3));
    let stats = harvester.run_cycle_at(at_minute(4)).await;

    assert_eq!(stats.events_emitted, 1);
    assert_eq!(stats.lines_skipped, 1);

    let events = sink.events();
    assert_eq!(events.len(), 1);
    let event = &events[0];
    assert_eq!(event.timestamp.to_rfc3339(), "2024-01-01T00:00:05+00:00");
    assert_eq!(event.field("s-sitename"), Some(&json!("site1")));
    assert_eq!(event.field("cs-method"), Some(&json!("GET")));
    assert_eq!(event.field("cs-uri-stem"), Some(&json!("/x")));
    assert_eq!(event.field("s-port"), Some(&json!(80)));
    assert_eq!(event.field("sc-status"), Some(&json!(200)));
    assert_eq!(event.field("sc-bytes"), Some(&json!(100)));
    assert_eq!(event.field("cs-bytes"), Some(&json!(50)));
    assert_eq!(event.field("time-taken"), Some(&json!(10)));

    assert_eq!(
        harvester.state().offsets().offset_for(&id),
        (HEADER.len() + DATA_LINE.len()) as u64
    );
    assert_eq!(harvester.watermark(), Watermark::at(at_minute(3)));
}

#[tokio::test]
async fn test_partial_line_completed_by_next_fetch() {
    let store = Arc::new(MemoryStore::new("logs"));
    let sink = Arc::new(CollectingSink::new());
    let (head, tail) = DATA_LINE.split_at(30);

    store.put(SEGMENT, head, at_minute(1));
    let mut harvester = harvester(&store, sink.clone());
    let first = harvester.run_cycle_at(at_minute(2)).await;
    assert_eq!(first.events_emitted, 0);
    assert_eq!(first.lines_malformed, 0);

    store.append(SEGMENT, tail, at_minute(3));
    let second = harvester.run_cycle_at(at_minute(4)).await;

    assert_eq!(second.events_emitted, 1);
    assert_eq!(sink.uris(), vec!["/x"]);
    assert!(harvester.state().fragment(&store.identity(SEGMENT)).is_empty());
}

#[tokio::test]
async fn test_malformed_line_does_not_abort_object() {
    let store = Arc::new(MemoryStore::new("logs"));
    let sink = Arc::new(CollectingSink::new());
    let content = format!(
        "{}2024-01-01 00:00:06 site1 GET /bad\n{}",
        access_line(5, "/first"),
        access_line(7, "/last")
    );
    store.put(SEGMENT, content, at_minute(1));

    let mut harvester = harvester(&store, sink.clone());
    let stats = harvester.run_cycle_at(at_minute(2)).await;

    assert_eq!(stats.events_emitted, 2);
    assert_eq!(stats.lines_malformed, 1);
    assert_eq!(stats.objects_failed, 0);
    assert_eq!(sink.uris(), vec!["/first", "/last"]);
}

#[tokio::test]
async fn test_objects_processed_in_modification_order() {
    let store = Arc::new(MemoryStore::new("logs"));
    let sink = Arc::new(CollectingSink::new());
    store.put("app/2024/01/01/00/a.log", access_line(1, "/a"), at_minute(5));
    store.put("app/2024/01/01/00/b.log", access_line(2, "/b"), at_minute(2));
    store.put("app/2024/01/01/00/c.log", access_line(3, "/c"), at_minute(8));

    let mut harvester = harvester(&store, sink.clone());
    harvester.run_cycle_at(at_minute(10)).await;

    assert_eq!(sink.uris(), vec!["/b", "/a", "/c"]);
    assert_eq!(harvester.watermark(), Watermark::at(at_minute(8)));
    assert_eq!(sink.flushes(), 1);
}

#[tokio::test]
async fn test_key_pattern_and_escapes() {
    let store = Arc::new(MemoryStore::new("logs"));
    let sink = Arc::new(CollectingSink::new());
    store.put("app/2024/01/01/00/u_ex01.log", access_line(1, "/a~1b"), at_minute(1));
    store.put("app/2024/01/01/00/notes.txt", access_line(2, "/skip"), at_minute(1));

    let config = HarvesterConfig::new("app").with_key_pattern("u_ex*.log");
    let mut harvester = Harvester::new(config, store.clone(), sink.clone()).unwrap();
    let stats = harvester.run_cycle_at(at_minute(2)).await;

    assert_eq!(stats.candidates, 1);
    assert_eq!(sink.uris(), vec!["/a/b"]);
}

#[tokio::test]
async fn test_sink_failure_redelivers_whole_delta() {
    let store = Arc::new(MemoryStore::new("logs"));
    let sink = Arc::new(FlakySink::accepting(1));
    let id = store.put(
        SEGMENT,
        format!("{}{}", access_line(1, "/one"), access_line(2, "/two")),
        at_minute(1),
    );

    let mut harvester =
        Harvester::new(HarvesterConfig::new("app"), store.clone(), sink.clone()).unwrap();

    let failed = harvester.run_cycle_at(at_minute(2)).await;
    assert_eq!(failed.objects_failed, 1);
    assert_eq!(harvester.state().offsets().offset_for(&id), 0);
    assert!(harvester.watermark().is_beginning());

    sink.allow(10);
    let retried = harvester.run_cycle_at(at_minute(3)).await;
    assert_eq!(retried.events_emitted, 2);
    assert_eq!(sink.events().len(), 3);
    assert_eq!(harvester.watermark(), Watermark::at(at_minute(1)));
}

#[tokio::test]
async fn test_watermark_narrows_listing_to_current_hour() {
    let store = Arc::new(MemoryStore::new("logs"));
    let sink = Arc::new(CollectingSink::new());
    store.put(SEGMENT, access_line(1, "/a"), at_minute(1));

    let mut harvester = harvester(&store, sink.clone());
    let first = harvester.run_cycle_at(at_minute(2)).await;
    assert_eq!(first.prefixes, 1);

    // Only the current hour bucket is listed once the watermark is inside it
    store.put("app/2024/01/01/00/late.log", access_line(9, "/late"), at_minute(9));
    store.fail_list("app");
    let second = harvester.run_cycle_at(at_minute(10)).await;

    assert!(!second.has_errors());
    assert_eq!(sink.uris(), vec!["/a", "/late"]);
}
