// ItemIndex integration tests
// Drives the index worker against an in-memory feed

mod common;

use std::sync::Arc;

use tokio::sync::mpsc;

use common::{item, sample_items, MockFeedApi};
use tempfile::tempdir;
use zeitgeist::app::ZeitgeistError;
use zeitgeist::domain::ItemKind;
use zeitgeist::index::{IndexConfig, IndexEvent, ItemIndex};

fn spawn(api: &Arc<MockFeedApi>) -> ItemIndex {
    ItemIndex::spawn(api.clone(), &IndexConfig::default())
}

fn subscribe(index: &ItemIndex) -> mpsc::UnboundedReceiver<IndexEvent> {
    let (tx, rx) = mpsc::unbounded_channel::<IndexEvent>();
    index.subscribe(Arc::new(tx));
    rx
}

fn drain(events: &mut mpsc::UnboundedReceiver<IndexEvent>) -> Vec<IndexEvent> {
    let mut drained = Vec::new();
    while let Ok(event) = events.try_recv() {
        drained.push(event);
    }
    drained
}

fn merged_ids(event: &IndexEvent) -> Option<Vec<u64>> {
    match event {
        IndexEvent::Updated(Some(items)) => Some(items.iter().map(|item| item.id).collect()),
        _ => None,
    }
}

#[tokio::test]
async fn test_first_page_newest_first() {
    let api = Arc::new(MockFeedApi::new(sample_items(), 10));
    let index = spawn(&api);
    let mut events = subscribe(&index);

    index.query_first();
    index.flush().await.unwrap();

    // video 12 is hidden by default
    assert_eq!(index.view().positions(), &[14, 13, 11, 10]);
    assert_eq!(index.count(), 4);
    assert_eq!(index.get_by_position(0).id, 14);
    assert_eq!(index.get_by_position(3).id, 10);
    // hidden items are still held
    assert_eq!(index.get_by_id(12).unwrap().kind, ItemKind::Video);

    let events = drain(&mut events);
    assert_eq!(events.len(), 1);
    let mut ids = merged_ids(&events[0]).unwrap();
    ids.sort();
    assert_eq!(ids, vec![10, 11, 12, 13, 14]);
}

#[tokio::test]
async fn test_paging_uses_id_boundaries() {
    let items = (1..=10).map(|id| item(id, ItemKind::Image, &[])).collect();
    let api = Arc::new(MockFeedApi::new(items, 3));
    let index = spawn(&api);

    index.query_first();
    index.flush().await.unwrap();
    assert_eq!(index.view().positions(), &[10, 9, 8]);

    index.query_older();
    index.flush().await.unwrap();
    assert_eq!(index.view().positions(), &[10, 9, 8, 7, 6, 5]);

    api.insert(item(11, ItemKind::Image, &[]));
    api.insert(item(12, ItemKind::Image, &[]));
    index.query_newer();
    index.flush().await.unwrap();
    assert_eq!(index.view().positions(), &[12, 11, 10, 9, 8, 7, 6, 5]);

    assert_eq!(api.calls(), vec!["list", "list_before(8)", "list_after(10)"]);
}

#[tokio::test]
async fn test_paging_on_empty_index_starts_at_first_page() {
    let api = Arc::new(MockFeedApi::new(sample_items(), 10));
    let index = spawn(&api);

    index.query_older();
    index.flush().await.unwrap();

    assert_eq!(api.calls(), vec!["list"]);
    assert_eq!(index.count(), 4);
}

#[tokio::test]
async fn test_query_older_ignored_while_loading() {
    let api = Arc::new(MockFeedApi::new(sample_items(), 10));
    let index = spawn(&api);

    index.query_first();
    assert!(index.is_loading());
    index.query_older();
    index.flush().await.unwrap();

    assert!(!index.is_loading());
    assert_eq!(api.calls(), vec!["list"]);
}

#[tokio::test]
async fn test_tag_filter_queries_when_nothing_matches() {
    let api = Arc::new(MockFeedApi::new(sample_items(), 10));
    let index = spawn(&api);
    let mut events = subscribe(&index);

    index.set_tag_filter(Some("cats".into()));
    index.flush().await.unwrap();

    assert_eq!(api.calls(), vec!["list_by_tag(cats)"]);
    assert_eq!(index.tag_filter().as_deref(), Some("cats"));
    assert_eq!(index.view().positions(), &[14, 11]);

    let events = drain(&mut events);
    assert_eq!(events.len(), 2);
    assert!(matches!(events[0], IndexEvent::Updated(None)));
    assert!(merged_ids(&events[1]).is_some());

    // cached matches, no further request
    index.set_tag_filter(None);
    index.set_tag_filter(Some("cats".into()));
    index.flush().await.unwrap();
    assert_eq!(api.calls().len(), 1);
}

#[tokio::test]
async fn test_tag_filter_pages_within_tag() {
    let api = Arc::new(MockFeedApi::new(sample_items(), 1));
    let index = spawn(&api);

    index.set_tag_filter(Some("cats".into()));
    index.flush().await.unwrap();
    assert_eq!(index.view().positions(), &[14]);

    index.query_older();
    index.flush().await.unwrap();
    // 12 is a video and stays hidden
    assert_eq!(index.view().positions(), &[14]);
    assert!(index.get_by_id(12).is_some());

    index.query_older();
    index.flush().await.unwrap();
    assert_eq!(index.view().positions(), &[14, 11]);

    assert_eq!(
        api.calls(),
        vec![
            "list_by_tag(cats)",
            "list_by_tag_before(cats, 14)",
            "list_by_tag_before(cats, 12)",
        ]
    );
}

#[tokio::test]
async fn test_kind_visibility_is_idempotent() {
    let api = Arc::new(MockFeedApi::new(sample_items(), 10));
    let index = spawn(&api);
    let mut events = subscribe(&index);

    index.query_first();
    index.flush().await.unwrap();
    drain(&mut events);

    index.set_kind_visible(ItemKind::Video, true);
    index.flush().await.unwrap();
    let first = index.view().positions().to_vec();

    index.set_kind_visible(ItemKind::Video, true);
    index.flush().await.unwrap();

    assert_eq!(first, vec![14, 13, 12, 11, 10]);
    assert_eq!(index.view().positions(), first.as_slice());
    assert!(index.is_kind_visible(ItemKind::Video));

    let events = drain(&mut events);
    assert_eq!(events.len(), 2);
    assert!(events
        .iter()
        .all(|event| matches!(event, IndexEvent::Updated(None))));
}

#[tokio::test]
async fn test_audio_cannot_be_shown() {
    let mut items = sample_items();
    items.push(item(15, ItemKind::Audio, &[]));
    let api = Arc::new(MockFeedApi::new(items, 10));
    let index = spawn(&api);

    index.set_kind_visible(ItemKind::Audio, true);
    index.query_first();
    index.flush().await.unwrap();

    assert!(!index.is_kind_visible(ItemKind::Audio));
    assert_eq!(index.get_by_position(0).id, 14);
    assert!(index.get_by_id(15).is_some());
}

#[tokio::test]
async fn test_empty_page_locks_until_filter_change() {
    let api = Arc::new(MockFeedApi::new(sample_items(), 10));
    let index = spawn(&api);

    index.query_first();
    index.flush().await.unwrap();
    assert!(!index.is_locked_query());

    index.query_older();
    index.flush().await.unwrap();
    assert!(index.is_locked_query());
    assert_eq!(index.count(), 4);

    index.set_kind_visible(ItemKind::Image, true);
    index.flush().await.unwrap();
    assert!(!index.is_locked_query());

    index.query_older();
    index.flush().await.unwrap();
    assert!(index.is_locked_query());
    index.reset_locked_query();
    index.flush().await.unwrap();
    assert!(!index.is_locked_query());
}

#[tokio::test]
async fn test_neighbours() {
    let api = Arc::new(MockFeedApi::new(sample_items(), 10));
    let index = spawn(&api);

    index.query_first();
    index.flush().await.unwrap();

    assert_eq!(index.previous_id(13), 14);
    assert_eq!(index.next_id(13), 11);
    assert_eq!(index.previous_id(14), 14);
    assert_eq!(index.next_id(10), 10);
}

#[tokio::test]
async fn test_query_failure_leaves_index_untouched() {
    let api = Arc::new(MockFeedApi::new(sample_items(), 10));
    let index = spawn(&api);
    let mut events = subscribe(&index);

    index.query_first();
    index.flush().await.unwrap();
    drain(&mut events);

    api.set_failing(true);
    index.query_newer();
    index.flush().await.unwrap();

    assert_eq!(index.count(), 4);
    assert!(!index.is_loading());
    assert!(!index.is_locked_query());

    let events = drain(&mut events);
    assert_eq!(events.len(), 1);
    match &events[0] {
        IndexEvent::Error(message) => assert_eq!(message, "server unavailable"),
        other => panic!("expected error event, got {:?}", other),
    }
}

#[tokio::test]
async fn test_update_tags_replaces_cached_item() {
    let api = Arc::new(MockFeedApi::new(sample_items(), 10));
    let index = spawn(&api);

    index.query_first();
    index.flush().await.unwrap();

    let updated = index.update_tags(14, "dogs, -cats").await.unwrap();
    assert_eq!(updated.tags, vec!["dogs"]);
    assert_eq!(index.get_by_id(14).unwrap().tags, vec!["dogs"]);
    assert_eq!(index.view().positions(), &[14, 13, 11, 10]);
    assert_eq!(api.calls().last().unwrap(), "update(14, dogs,-cats)");
}

#[tokio::test]
async fn test_update_tags_of_unknown_item_is_not_cached() {
    let api = Arc::new(MockFeedApi::new(sample_items(), 10));
    let index = spawn(&api);

    api.insert(item(20, ItemKind::Image, &[]));
    let updated = index.update_tags(20, "cats").await.unwrap();

    assert_eq!(updated.tags, vec!["cats"]);
    assert!(index.get_by_id(20).is_none());
}

#[tokio::test]
async fn test_update_tags_errors() {
    let api = Arc::new(MockFeedApi::new(sample_items(), 10));
    let index = spawn(&api);

    let result = index.update_tags(14, " , ").await;
    assert!(matches!(result, Err(ZeitgeistError::InvalidTagExpression(_))));
    assert!(api.calls().is_empty());

    let result = index.update_tags(99, "cats").await;
    assert!(matches!(result, Err(ZeitgeistError::ItemNotFound(99))));
}

#[tokio::test]
async fn test_delete_removes_item() {
    let api = Arc::new(MockFeedApi::new(sample_items(), 10));
    let index = spawn(&api);
    let mut events = subscribe(&index);

    index.query_first();
    index.flush().await.unwrap();
    drain(&mut events);

    index.delete_item(13).await.unwrap();

    assert!(index.get_by_id(13).is_none());
    assert_eq!(index.view().positions(), &[14, 11, 10]);
    assert!(matches!(
        drain(&mut events).as_slice(),
        [IndexEvent::Updated(None)]
    ));

    assert!(index.delete_item(13).await.is_err());
    assert_eq!(index.count(), 3);
}

#[tokio::test]
async fn test_snapshot_warm_start() {
    let dir = tempdir().unwrap();
    let config = IndexConfig {
        snapshot_path: Some(dir.path().join("items.json")),
        ..Default::default()
    };

    let api = Arc::new(MockFeedApi::new(sample_items(), 10));
    let index = ItemIndex::spawn(api.clone(), &config);
    index.query_first();
    index.flush().await.unwrap();
    assert_eq!(index.save_snapshot().await.unwrap(), 5);
    index.shutdown();

    let offline = Arc::new(MockFeedApi::new(Vec::new(), 10));
    offline.set_failing(true);
    let restored = ItemIndex::spawn(offline.clone(), &config);

    assert_eq!(restored.view().positions(), &[14, 13, 11, 10]);
    assert_eq!(restored.get_by_id(12).unwrap().tags, vec!["cats"]);
    assert!(offline.calls().is_empty());
}

#[tokio::test]
async fn test_save_snapshot_without_path() {
    let api = Arc::new(MockFeedApi::new(sample_items(), 10));
    let index = spawn(&api);

    assert!(matches!(
        index.save_snapshot().await,
        Err(ZeitgeistError::Config(_))
    ));
}

#[tokio::test]
async fn test_closed_worker() {
    let api = Arc::new(MockFeedApi::new(sample_items(), 10));
    let index = spawn(&api);

    index.shutdown();
    // let the worker see the shutdown
    tokio::task::yield_now().await;

    assert!(matches!(index.flush().await, Err(ZeitgeistError::WorkerClosed)));
}
