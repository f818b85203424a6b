use std::time::Duration;

use bson::doc;
use datakit_core::{
    constraint::Operator,
    provider::Provider,
    statement::Statement,
    update::Update,
};
use datakit_memory::MemoryStore;
use futures::StreamExt;
use tokio::time::timeout;

const QUIET: Duration = Duration::from_millis(50);

/// Asserts that the stream yields nothing within the quiet window.
macro_rules! assert_silent {
    ($stream:expr) => {
        assert!(timeout(QUIET, $stream.next()).await.is_err())
    };
}

#[tokio::test]
async fn item_stream_yields_current_value_first() {
    let store = MemoryStore::new();
    let mut stream = store.watch_item("things", "k1");

    assert_eq!(stream.next().await, Some(None));

    store
        .set_item("things", "k1", doc! { "x": 1 })
        .await
        .unwrap();
    assert_eq!(stream.next().await, Some(Some(doc! { "x": 1, "id": "k1" })));
}

#[tokio::test]
async fn item_stream_sees_deletes() {
    let store = MemoryStore::new();
    store
        .set_item("things", "k1", doc! { "x": 1 })
        .await
        .unwrap();

    let mut stream = store.watch_item("things", "k1");
    assert_eq!(stream.next().await, Some(Some(doc! { "x": 1, "id": "k1" })));

    store.delete_item("things", "k1").await.unwrap();
    assert_eq!(stream.next().await, Some(None));

    // Deleting an already-absent id signals nothing.
    store.delete_item("things", "k1").await.unwrap();
    assert_silent!(stream);
}

#[tokio::test]
async fn identical_rewrite_is_suppressed() {
    let store = MemoryStore::new();
    let statement = Statement::new().with_filter("tag", Operator::Contains, "odd");

    let mut stream = store.watch_query("things", statement);
    assert_eq!(stream.next().await, Some(vec![]));

    store
        .set_item("things", "k1", doc! { "tag": ["odd"] })
        .await
        .unwrap();

    let results = stream.next().await.unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].get_str("id").unwrap(), "k1");

    // Re-writing structurally identical data wakes the subscriber but must
    // not yield a new value.
    store
        .set_item("things", "k1", doc! { "tag": ["odd"] })
        .await
        .unwrap();
    assert_silent!(stream);
}

#[tokio::test]
async fn irrelevant_writes_do_not_yield() {
    let store = MemoryStore::new();
    let statement = Statement::new().with_filter("num", Operator::Gt, 100);

    let mut stream = store.watch_query("things", statement);
    assert_eq!(stream.next().await, Some(vec![]));

    // The write wakes every subscriber of the table, but the result set is
    // unchanged, so nothing is delivered.
    store
        .set_item("things", "k1", doc! { "num": 50 })
        .await
        .unwrap();
    assert_silent!(stream);

    store
        .set_item("things", "k2", doc! { "num": 150 })
        .await
        .unwrap();
    assert_eq!(stream.next().await.unwrap().len(), 1);
}

#[tokio::test]
async fn empty_update_does_not_notify() {
    let store = MemoryStore::new();
    store
        .set_item("things", "k1", doc! { "x": 1 })
        .await
        .unwrap();

    let mut stream = store.watch_item("things", "k1");
    stream.next().await;

    store
        .update_item("things", "k1", Update::new())
        .await
        .unwrap();
    assert_silent!(stream);

    store
        .update_item("things", "k1", Update::new().set("x", 2))
        .await
        .unwrap();
    assert_eq!(stream.next().await, Some(Some(doc! { "x": 2, "id": "k1" })));
}

#[tokio::test]
async fn write_bursts_are_coalesced() {
    let store = MemoryStore::new();
    let mut stream = store.watch_item("things", "k1");
    stream.next().await;

    // Two writes land before the subscriber catches up; it observes only
    // the latest state.
    store
        .set_item("things", "k1", doc! { "x": 1 })
        .await
        .unwrap();
    store
        .set_item("things", "k1", doc! { "x": 2 })
        .await
        .unwrap();

    assert_eq!(stream.next().await, Some(Some(doc! { "x": 2, "id": "k1" })));
    assert_silent!(stream);
}

#[tokio::test]
async fn changed_resolves_only_after_the_next_write() {
    let store = MemoryStore::new();
    let table = store.table("things").await;

    // No mutation yet, so the raw change future stays pending.
    assert!(timeout(QUIET, table.changed()).await.is_err());

    // Awaiting alongside a write resolves once the signal fires.
    tokio::join!(table.changed(), async {
        table.set_item("k1", doc! { "x": 1 }).await;
    });
}
