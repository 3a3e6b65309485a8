use imagedeck_core::{
    memory::MemoryKv, CollectionStore, CoreError, ImageRecord, KeyValueStore, MalformedPolicy,
    Notice, Phase, RetryPolicy, Route, StoreConfig, WriteStatus,
};
use std::sync::Arc;

const KEY: &str = "test_images";

fn config() -> StoreConfig {
    StoreConfig {
        key: KEY.to_string(),
        on_malformed: MalformedPolicy::FallBackEmpty,
        retry: RetryPolicy { max_attempts: 3, initial_backoff_ms: 1, max_backoff_ms: 2 },
    }
}

fn two_images() -> &'static str {
    r#"[{"id":1,"uri":"a"},{"id":2,"uri":"b"}]"#
}

#[tokio::test]
async fn empty_store_loads_empty() {
    let kv = Arc::new(MemoryKv::new());
    let mut store = CollectionStore::from_config(kv, &config());
    assert_eq!(store.phase(), Phase::Loading);

    store.load().await.unwrap();
    assert!(store.images().is_empty());
    assert!(!store.is_loading());
    assert_eq!(store.phase(), Phase::Empty);
}

#[tokio::test]
async fn loads_records_in_stored_order() {
    let kv = Arc::new(MemoryKv::with_value(KEY, two_images()));
    let mut store = CollectionStore::from_config(kv, &config());
    store.load().await.unwrap();

    assert_eq!(store.images(), &[ImageRecord::new(1, "a"), ImageRecord::new(2, "b")]);
    assert_eq!(store.phase(), Phase::Populated);
}

#[tokio::test]
async fn delete_reflects_immediately_and_persists() {
    let kv = Arc::new(MemoryKv::with_value(KEY, two_images()));
    let mut store = CollectionStore::from_config(kv.clone(), &config());
    store.load().await.unwrap();

    let out = store.delete(1);
    assert_eq!(out.removed, 1);
    assert!(out.ticket.is_some());
    assert_eq!(store.images(), &[ImageRecord::new(2, "b")]);
    assert_eq!(store.take_notices(), vec![Notice::Deleted { id: 1, removed: 1 }]);

    store.flush().await;
    assert_eq!(store.status(), &WriteStatus::Saved { ticket: 1 });

    // focus regained
    store.load().await.unwrap();
    assert_eq!(store.images(), &[ImageRecord::new(2, "b")]);
    assert_eq!(kv.raw(KEY).unwrap(), r#"[{"id":2,"uri":"b"}]"#);
}

#[tokio::test]
async fn delete_unknown_id_is_acknowledged_noop() {
    let kv = Arc::new(MemoryKv::with_value(KEY, two_images()));
    let mut store = CollectionStore::from_config(kv.clone(), &config());
    store.load().await.unwrap();
    let before = store.images().to_vec();

    let out = store.delete(99);
    assert_eq!(out.removed, 0);
    assert!(out.ticket.is_some());
    assert_eq!(store.images(), &before[..]);
    assert_eq!(store.take_notices(), vec![Notice::Deleted { id: 99, removed: 0 }]);

    store.flush().await;
    assert_eq!(kv.write_count(), 1);
}

#[tokio::test]
async fn deleting_last_record_goes_empty() {
    let kv = Arc::new(MemoryKv::with_value(KEY, r#"[{"id":3,"uri":"c"}]"#));
    let mut store = CollectionStore::from_config(kv, &config());
    store.load().await.unwrap();
    store.delete(3);
    assert_eq!(store.phase(), Phase::Empty);
}

#[tokio::test]
async fn reload_sees_unflushed_delete() {
    let kv = Arc::new(MemoryKv::with_value(KEY, two_images()));
    let mut store = CollectionStore::from_config(kv, &config());
    store.load().await.unwrap();

    store.delete(2);
    store.delete(1);
    store.load().await.unwrap();
    assert!(store.images().is_empty());
    assert!(!store.has_pending_writes());
}

#[tokio::test]
async fn rapid_deletes_land_in_order() {
    let raw = r#"[{"id":1,"uri":"a"},{"id":2,"uri":"b"},{"id":3,"uri":"c"},{"id":4,"uri":"d"}]"#;
    let kv = Arc::new(MemoryKv::with_value(KEY, raw));
    let mut store = CollectionStore::from_config(kv.clone(), &config());
    store.load().await.unwrap();

    for id in [4, 1, 3] {
        store.delete(id);
    }
    let outcomes = store.flush().await;
    assert_eq!(outcomes.last().map(|o| o.through), Some(3));
    assert_eq!(kv.raw(KEY).unwrap(), r#"[{"id":2,"uri":"b"}]"#);
}

#[tokio::test]
async fn transient_write_failure_is_retried() {
    let kv = Arc::new(MemoryKv::with_value(KEY, two_images()));
    let mut store = CollectionStore::from_config(kv.clone(), &config());
    store.load().await.unwrap();

    kv.fail_next_writes(2);
    store.delete(1);
    let outcomes = store.flush().await;
    assert_eq!(outcomes.len(), 1);
    assert_eq!(outcomes[0].attempts, 3);
    assert!(outcomes[0].result.is_ok());
    assert_eq!(store.status(), &WriteStatus::Saved { ticket: 1 });
}

#[tokio::test]
async fn exhausted_retries_keep_optimistic_state() {
    let kv = Arc::new(MemoryKv::with_value(KEY, two_images()));
    let mut store = CollectionStore::from_config(kv.clone(), &config());
    store.load().await.unwrap();
    store.take_notices();

    kv.fail_next_writes(10);
    store.delete(1);
    store.flush().await;

    assert_eq!(store.images(), &[ImageRecord::new(2, "b")]);
    assert!(matches!(store.status(), WriteStatus::Failed { ticket: 1, .. }));
    let notices = store.take_notices();
    assert!(notices.iter().any(|n| matches!(n, Notice::SaveFailed { .. })));
    assert_eq!(kv.raw(KEY).unwrap(), two_images());

    kv.fail_next_writes(0);
    let ticket = store.retry_save();
    assert_eq!(ticket, Some(2));
    store.flush().await;
    assert_eq!(store.status(), &WriteStatus::Saved { ticket: 2 });
    assert_eq!(kv.raw(KEY).unwrap(), r#"[{"id":2,"uri":"b"}]"#);
}

#[tokio::test]
async fn reload_after_failed_delete_keeps_it_for_retry() {
    let kv = Arc::new(MemoryKv::with_value(KEY, two_images()));
    let mut store = CollectionStore::from_config(kv.clone(), &config());
    store.load().await.unwrap();

    kv.fail_next_writes(10);
    store.delete(1);
    // back on the list before the failure was ever polled
    store.load().await.unwrap();
    assert_eq!(store.images(), &[ImageRecord::new(2, "b")]);
    assert!(matches!(store.status(), WriteStatus::Failed { ticket: 1, .. }));
    assert!(!store.is_loading());

    kv.fail_next_writes(0);
    assert_eq!(store.retry_save(), Some(2));
    store.flush().await;
    assert_eq!(store.status(), &WriteStatus::Saved { ticket: 2 });
    assert_eq!(kv.raw(KEY).unwrap(), r#"[{"id":2,"uri":"b"}]"#);

    store.load().await.unwrap();
    assert_eq!(store.images(), &[ImageRecord::new(2, "b")]);
}

#[tokio::test]
async fn reload_after_failed_insert_keeps_new_record() {
    let kv = Arc::new(MemoryKv::with_value(KEY, two_images()));
    let mut store = CollectionStore::from_config(kv.clone(), &config());
    store.load().await.unwrap();

    kv.fail_next_writes(10);
    store.insert(ImageRecord::new(3, "c")).unwrap();
    store.load().await.unwrap();
    assert_eq!(store.get(3), Some(&ImageRecord::new(3, "c")));
    assert_eq!(kv.raw(KEY).unwrap(), two_images());
}

#[tokio::test]
async fn retry_without_failure_does_nothing() {
    let kv = Arc::new(MemoryKv::new());
    let mut store = CollectionStore::from_config(kv, &config());
    store.load().await.unwrap();
    assert_eq!(store.retry_save(), None);
}

#[tokio::test]
async fn poll_writes_eventually_reports() {
    let kv = Arc::new(MemoryKv::with_value(KEY, two_images()));
    let mut store = CollectionStore::from_config(kv, &config());
    store.load().await.unwrap();
    store.delete(2);

    let mut seen = Vec::new();
    for _ in 0..100 {
        seen.extend(store.poll_writes());
        if !store.has_pending_writes() {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    }
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].through, 1);
}

#[tokio::test]
async fn malformed_value_falls_back_to_empty() {
    let kv = Arc::new(MemoryKv::with_value(KEY, "{broken"));
    let mut store = CollectionStore::from_config(kv, &config());
    store.load().await.unwrap();
    assert_eq!(store.phase(), Phase::Empty);
}

#[tokio::test]
async fn malformed_value_can_fail_loudly() {
    let kv = Arc::new(MemoryKv::with_value(KEY, "null"));
    let cfg = StoreConfig { on_malformed: MalformedPolicy::Fail, ..config() };
    let mut store = CollectionStore::from_config(kv.clone(), &cfg);

    let err = store.load().await.unwrap_err();
    assert!(matches!(err, CoreError::Malformed(_)));
    assert!(matches!(store.phase(), Phase::Failed(_)));

    // the corrupt value must survive a delete attempt
    let out = store.delete(1);
    assert_eq!(out.ticket, None);
    assert!(store.insert(ImageRecord::new(1, "a")).is_err());
    store.flush().await;
    assert_eq!(kv.raw(KEY).unwrap(), "null");
}

#[tokio::test]
async fn empty_string_value_is_empty_collection() {
    let kv = Arc::new(MemoryKv::with_value(KEY, ""));
    let cfg = StoreConfig { on_malformed: MalformedPolicy::Fail, ..config() };
    let mut store = CollectionStore::from_config(kv, &cfg);
    store.load().await.unwrap();
    assert_eq!(store.phase(), Phase::Empty);
}

#[tokio::test]
async fn insert_rejects_duplicate_and_persists_new() {
    let kv = Arc::new(MemoryKv::with_value(KEY, two_images()));
    let mut store = CollectionStore::from_config(kv.clone(), &config());
    store.load().await.unwrap();

    let dup = store.insert(ImageRecord::new(2, "z"));
    assert_eq!(dup, Err(CoreError::Conflict("image id already exists")));

    store.insert(ImageRecord::new(3, "c")).unwrap();
    store.flush().await;
    let raw = kv.get(KEY).await.unwrap().unwrap();
    assert!(raw.ends_with(r#"{"id":3,"uri":"c"}]"#));
}

#[tokio::test]
async fn routes_for_existing_records_only() {
    let kv = Arc::new(MemoryKv::with_value(KEY, two_images()));
    let mut store = CollectionStore::from_config(kv, &config());
    store.load().await.unwrap();

    assert_eq!(store.open(2), Some(Route::Detail { id: 2 }));
    assert_eq!(store.open(42), None);
    assert_eq!(store.register().path(), "/study/create");
    assert_eq!(Route::Detail { id: 2 }.path(), "/study/2");
}
