//! Integration tests for the caching and relay providers.

use std::sync::Arc;

use bson::doc;
use chrono::Duration;
use futures::StreamExt;
use serde::{Deserialize, Serialize};

use datakit::cache::CacheProvider;
use datakit::memory::MemoryStore;
use datakit::prelude::*;
use datakit::relay::RelayProvider;

fn cached(inner: &Arc<MemoryStore>) -> CacheProvider {
    CacheProvider::new(inner.clone(), Duration::seconds(60))
}

#[tokio::test]
async fn cache_serves_fresh_point_reads() {
    let inner = Arc::new(MemoryStore::new());
    let cache = cached(&inner);

    cache
        .set_item("users", "u-1", doc! { "name": "alice" })
        .await
        .unwrap();

    // Mutate the backend behind the cache's back; the mirrored copy is
    // still fresh, so the read never reaches the backend.
    inner
        .set_item("users", "u-1", doc! { "name": "mallory" })
        .await
        .unwrap();

    let seen = cache.get_item("users", "u-1").await.unwrap().unwrap();
    assert_eq!(seen.get_str("name").unwrap(), "alice");
}

#[tokio::test]
async fn cache_expires_point_reads() {
    let inner = Arc::new(MemoryStore::new());
    // A negative age means nothing is ever fresh.
    let cache = CacheProvider::new(inner.clone(), Duration::seconds(-1));

    cache
        .set_item("users", "u-1", doc! { "name": "alice" })
        .await
        .unwrap();

    inner
        .set_item("users", "u-1", doc! { "name": "mallory" })
        .await
        .unwrap();

    let seen = cache.get_item("users", "u-1").await.unwrap().unwrap();
    assert_eq!(seen.get_str("name").unwrap(), "mallory");
}

#[tokio::test]
async fn cache_miss_populates_from_backend() {
    let inner = Arc::new(MemoryStore::new());
    let cache = cached(&inner);

    inner
        .set_item("users", "u-1", doc! { "name": "alice" })
        .await
        .unwrap();

    let first = cache.get_item("users", "u-1").await.unwrap().unwrap();
    assert_eq!(first.get_str("name").unwrap(), "alice");

    // The fetch mirrored the record, so a subsequent backend change is
    // hidden until the copy ages out.
    inner.delete_item("users", "u-1").await.unwrap();

    let second = cache.get_item("users", "u-1").await.unwrap().unwrap();
    assert_eq!(second.get_str("name").unwrap(), "alice");
}

#[tokio::test]
async fn cache_writes_reach_the_backend() {
    let inner = Arc::new(MemoryStore::new());
    let cache = cached(&inner);

    let id = cache
        .add_item("users", doc! { "name": "alice" })
        .await
        .unwrap();

    let stored = inner.get_item("users", &id).await.unwrap().unwrap();
    assert_eq!(stored.get_str("name").unwrap(), "alice");

    cache.delete_item("users", &id).await.unwrap();

    assert!(inner.get_item("users", &id).await.unwrap().is_none());
    assert!(cache.get_item("users", &id).await.unwrap().is_none());
}

#[tokio::test]
async fn cache_update_mirrors_backend_result() {
    let inner = Arc::new(MemoryStore::new());
    let cache = cached(&inner);

    cache
        .set_item("users", "u-1", doc! { "name": "alice", "score": 10_i64 })
        .await
        .unwrap();

    cache
        .update_item("users", "u-1", Update::new().inc("score", 5))
        .await
        .unwrap();

    let seen = cache.get_item("users", "u-1").await.unwrap().unwrap();
    assert_eq!(seen.get_i64("score").unwrap(), 15);
}

#[tokio::test]
async fn cache_serves_fresh_query_reads() {
    let inner = Arc::new(MemoryStore::new());
    let cache = cached(&inner);

    inner
        .set_item("users", "u-1", doc! { "name": "alice", "age": 30_i64 })
        .await
        .unwrap();

    let adults = Statement::new().with_filter("age", Operator::Gte, 18_i64);

    let first = cache.get_query("users", adults.clone()).await.unwrap();
    assert_eq!(first.len(), 1);

    inner
        .set_item("users", "u-2", doc! { "name": "bob", "age": 40_i64 })
        .await
        .unwrap();

    // Same statement, still fresh: the new backend row is not visible.
    let second = cache.get_query("users", adults).await.unwrap();
    assert_eq!(second.len(), 1);
}

#[tokio::test]
async fn cache_query_writes_invalidate_the_collection() {
    let inner = Arc::new(MemoryStore::new());
    let cache = cached(&inner);

    inner
        .set_item("users", "u-1", doc! { "name": "alice", "age": 30_i64 })
        .await
        .unwrap();

    let adults = Statement::new().with_filter("age", Operator::Gte, 18_i64);
    assert_eq!(cache.get_query("users", adults.clone()).await.unwrap().len(), 1);

    inner
        .set_item("users", "u-2", doc! { "name": "bob", "age": 40_i64 })
        .await
        .unwrap();

    let touched = cache
        .update_query("users", adults.clone(), Update::new().set("seen", true))
        .await
        .unwrap();
    assert_eq!(touched, 2);

    // The write cleared the cache table, so the re-read goes through.
    let after = cache.get_query("users", adults).await.unwrap();
    assert_eq!(after.len(), 2);
    assert!(after.iter().all(|record| matches!(record.get_bool("seen"), Ok(true))));
}

#[tokio::test]
async fn cache_subscriptions_follow_the_backend() {
    let inner = Arc::new(MemoryStore::new());
    let cache = cached(&inner);

    let mut watch = cache.watch_item("users", "u-1");
    assert_eq!(watch.next().await, Some(None));

    inner
        .set_item("users", "u-1", doc! { "name": "alice" })
        .await
        .unwrap();

    let seen = watch.next().await.flatten().unwrap();
    assert_eq!(seen.get_str("name").unwrap(), "alice");
}

#[tokio::test]
async fn relay_forwards_to_its_target() {
    let backend = Arc::new(MemoryStore::new());
    let relay = RelayProvider::new(backend.clone());

    relay
        .set_item("users", "u-1", doc! { "name": "alice" })
        .await
        .unwrap();

    let stored = backend.get_item("users", "u-1").await.unwrap().unwrap();
    assert_eq!(stored.get_str("name").unwrap(), "alice");

    let seen = relay.get_item("users", "u-1").await.unwrap().unwrap();
    assert_eq!(seen.get_str("name").unwrap(), "alice");
}

#[tokio::test]
async fn relay_swaps_targets_at_runtime() {
    let first = Arc::new(MemoryStore::new());
    let second = Arc::new(MemoryStore::new());

    let relay = RelayProvider::new(first.clone());

    relay
        .set_item("users", "u-1", doc! { "name": "alice" })
        .await
        .unwrap();

    relay.set_target(second.clone()).await;

    // Reads and writes now land on the new target.
    assert!(relay.get_item("users", "u-1").await.unwrap().is_none());

    relay
        .set_item("users", "u-2", doc! { "name": "bob" })
        .await
        .unwrap();

    assert!(first.get_item("users", "u-2").await.unwrap().is_none());
    assert!(second.get_item("users", "u-2").await.unwrap().is_some());
}

#[tokio::test]
async fn relay_watch_streams_track_a_live_target() {
    let backend = Arc::new(MemoryStore::new());
    let relay = RelayProvider::new(backend.clone());

    let statement = Statement::new().with_filter("kind", Operator::Is, "task");
    let mut watch = relay.watch_query("tasks", statement);

    assert_eq!(watch.next().await, Some(vec![]));

    relay
        .add_item("tasks", doc! { "kind": "task", "title": "ship it" })
        .await
        .unwrap();

    let matches = watch.next().await.unwrap();
    assert_eq!(matches.len(), 1);
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct User {
    id: String,
    name: String,
    age: i64,
}

impl Record for User {
    fn id(&self) -> &str {
        &self.id
    }

    fn collection_name() -> &'static str {
        "users"
    }
}

#[tokio::test]
async fn typed_collections_work_over_stacked_providers() {
    let backend: Arc<MemoryStore> = Arc::new(MemoryStore::new());
    let relay = RelayProvider::new(backend);
    let store = DataStore::new(CacheProvider::new(
        Arc::new(relay),
        Duration::seconds(60),
    ));

    let users = store.typed_collection::<User>();

    users
        .insert(vec![
            User { id: "u-1".into(), name: "alice".into(), age: 30 },
            User { id: "u-2".into(), name: "bob".into(), age: 12 },
        ])
        .await
        .unwrap();

    let adults = users
        .query(
            Statement::new()
                .with_filter("age", Operator::Gte, 18_i64)
                .with_sort("name", Direction::Asc),
        )
        .await
        .unwrap();

    assert_eq!(adults.len(), 1);
    assert_eq!(adults[0].name, "alice");

    store.shutdown().await.unwrap();
}
