//! The in-memory table: one collection's records, its change-time
//! bookkeeping, and its change signal.

use std::{collections::HashMap, sync::Arc};

use bson::{Document, Uuid};
use chrono::{DateTime, Utc};
use futures::stream::{self, BoxStream};
use mea::rwlock::RwLock;
use tracing::trace;

use datakit_core::{
    error::{StoreError, StoreResult},
    statement::Statement,
    update::Update,
};

use crate::signal::ChangeSignal;

#[derive(Debug, Default)]
struct TableState {
    /// Stored records, keyed by their string id. Every stored record
    /// carries its id as an ordinary `id` field.
    records: HashMap<String, Document>,
    /// Last-changed timestamps, keyed by record id or by a statement's
    /// canonical key. A statement key is stamped only when that query has
    /// been explicitly evaluated and stored, never incidentally.
    times: HashMap<String, DateTime<Utc>>,
}

/// An in-memory collection of records keyed by string id.
///
/// Supports point reads/writes/deletes, constrained queries, partial field
/// updates, query-scoped writes, and live subscription streams driven by
/// the table's shared change signal.
///
/// `Table` is cheaply cloneable; clones share the same underlying state.
/// Each operation takes the state lock once and runs to completion before
/// releasing it, so individual operations are atomic with respect to each
/// other. The change signal fires after the lock is released.
#[derive(Debug, Clone)]
pub struct Table {
    name: Arc<str>,
    state: Arc<RwLock<TableState>>,
    signal: Arc<ChangeSignal>,
}

impl Table {
    pub(crate) fn new(name: &str) -> Self {
        Self {
            name: Arc::from(name),
            state: Arc::new(RwLock::new(TableState::default())),
            signal: Arc::new(ChangeSignal::new()),
        }
    }

    /// Returns the collection name this table stores.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Point lookup; `None` if absent. No side effects.
    pub async fn get_item(&self, id: &str) -> Option<Document> {
        self.state
            .read()
            .await
            .records
            .get(id)
            .cloned()
    }

    /// Stores `data` under a freshly generated random id and returns the id.
    ///
    /// The id is collision-checked against current keys and regenerated
    /// until unique, so two adds of identical data always produce two
    /// distinct records.
    pub async fn add_item(&self, data: Document) -> String {
        let mut state = self.state.write().await;

        let id = loop {
            let candidate = Uuid::new().to_string();

            if !state.records.contains_key(&candidate) {
                break candidate;
            }
        };

        let mut record = data;
        record.insert("id", id.clone());

        state.records.insert(id.clone(), record);
        state.times.insert(id.clone(), Utc::now());
        drop(state);

        trace!(table = %self.name, id = %id, "added item");
        self.signal.notify().await;

        id
    }

    /// Full replace of the item under `id`.
    ///
    /// The `id` parameter wins over any `id` field embedded in `data`.
    pub async fn set_item(&self, id: &str, data: Document) {
        let mut state = self.state.write().await;

        let mut record = data;
        record.insert("id", id);

        state.records.insert(id.to_string(), record);
        state.times.insert(id.to_string(), Utc::now());
        drop(state);

        self.signal.notify().await;
    }

    /// Partial update of an existing item.
    ///
    /// Fails with [`StoreError::ItemRequired`] if `id` is absent; updates
    /// never create. An update that leaves the record structurally unchanged
    /// stamps no time and fires no signal, so subscribers are not woken
    /// spuriously.
    pub async fn update_item(&self, id: &str, updates: &Update) -> StoreResult<()> {
        let mut state = self.state.write().await;

        let Some(current) = state.records.get(id) else {
            return Err(StoreError::ItemRequired(id.to_string(), self.name.to_string()));
        };

        let next = updates.apply(current);

        if next == *current {
            return Ok(());
        }

        state.records.insert(id.to_string(), next);
        state.times.insert(id.to_string(), Utc::now());
        drop(state);

        self.signal.notify().await;

        Ok(())
    }

    /// Removes the item if present. A no-op with no signal if already
    /// absent, so deleting twice is equivalent to deleting once.
    pub async fn delete_item(&self, id: &str) {
        let mut state = self.state.write().await;

        if state.records.remove(id).is_none() {
            return;
        }

        state.times.insert(id.to_string(), Utc::now());
        drop(state);

        self.signal.notify().await;
    }

    /// Evaluates the statement against all records, materialized as an
    /// array snapshot. No side effects on table state; in particular it
    /// stamps no query time (that is a caller/cache concern, see
    /// [`Table::set_query_items`]).
    pub async fn get_query(&self, statement: &Statement) -> Vec<Document> {
        let state = self.state.read().await;

        statement.transform(state.records.values())
    }

    /// Replaces the full value of every matched record with `data`, keeping
    /// each record's id. Returns the affected count.
    ///
    /// Write constraints skip sorting when no limit is present: the full
    /// statement (sort + limit) selects the affected records only when a
    /// limit is set; otherwise filters alone decide, since ordering a
    /// destructive write without a limit is irrelevant.
    pub async fn set_query(&self, statement: &Statement, data: Document) -> usize {
        let mut state = self.state.write().await;
        let ids = affected_ids(&state, statement);
        let now = Utc::now();

        for id in &ids {
            let mut record = data.clone();
            record.insert("id", id.clone());

            state.records.insert(id.clone(), record);
            state.times.insert(id.clone(), now);
        }

        let count = ids.len();

        if count == 0 {
            return 0;
        }

        state.times.insert(statement.key(), now);
        drop(state);

        self.signal.notify().await;

        count
    }

    /// Applies `updates` to every matched record. Only records that
    /// actually change count toward the returned total and receive a
    /// stamped time. Affected-record selection follows the same
    /// limit-dependent rule as [`Table::set_query`].
    pub async fn update_query(&self, statement: &Statement, updates: &Update) -> usize {
        let mut state = self.state.write().await;
        let ids = affected_ids(&state, statement);
        let now = Utc::now();
        let mut count = 0;

        for id in &ids {
            let Some(current) = state.records.get(id) else {
                continue;
            };

            let next = updates.apply(current);

            if next == *current {
                continue;
            }

            state.records.insert(id.clone(), next);
            state.times.insert(id.clone(), now);
            count += 1;
        }

        if count == 0 {
            return 0;
        }

        state.times.insert(statement.key(), now);
        drop(state);

        self.signal.notify().await;

        count
    }

    /// Removes every matched record. Returns the affected count.
    /// Affected-record selection follows the same limit-dependent rule as
    /// [`Table::set_query`].
    pub async fn delete_query(&self, statement: &Statement) -> usize {
        let mut state = self.state.write().await;
        let ids = affected_ids(&state, statement);
        let now = Utc::now();

        for id in &ids {
            state.records.remove(id);
            state.times.insert(id.clone(), now);
        }

        let count = ids.len();

        if count == 0 {
            return 0;
        }

        state.times.insert(statement.key(), now);
        drop(state);

        self.signal.notify().await;

        count
    }

    /// Stores an externally evaluated result set for the statement: each
    /// record is stored under its own embedded id, and the statement's
    /// canonical key is stamped so [`Table::query_time`] afterwards reports
    /// the result's age. This is the explicit caching entry point used by
    /// read-through layers.
    pub async fn set_query_items(&self, statement: &Statement, items: Vec<Document>) {
        let mut state = self.state.write().await;
        let now = Utc::now();

        for item in items {
            let Ok(id) = item.get_str("id").map(str::to_string) else {
                continue;
            };

            state.records.insert(id.clone(), item);
            state.times.insert(id, now);
        }

        state.times.insert(statement.key(), now);
        drop(state);

        self.signal.notify().await;
    }

    /// When the item under `id` last changed (write or delete), if ever.
    pub async fn item_time(&self, id: &str) -> Option<DateTime<Utc>> {
        self.state
            .read()
            .await
            .times
            .get(id)
            .copied()
    }

    /// When the statement's result set was last explicitly stored, if ever.
    /// A statement that was never stored reports `None` ("unknown age"),
    /// not "fresh".
    pub async fn query_time(&self, statement: &Statement) -> Option<DateTime<Utc>> {
        self.state
            .read()
            .await
            .times
            .get(&statement.key())
            .copied()
    }

    /// Removes all records and times, then signals change.
    pub async fn clear(&self) {
        let mut state = self.state.write().await;
        state.records.clear();
        state.times.clear();
        drop(state);

        self.signal.notify().await;
    }

    /// Resolves once the next change signal fires.
    pub async fn changed(&self) {
        let watch = self.signal.watch().await;

        watch.wait().await;
    }

    /// Unending stream of the item's value: yields the current value
    /// immediately, then a new value after every change that alters it
    /// structurally. Writes that land while the subscriber is catching up
    /// are coalesced into the latest state. Dropping the stream cancels it.
    pub fn item_stream(&self, id: &str) -> BoxStream<'static, Option<Document>> {
        let table = self.clone();
        let id = id.to_string();

        Box::pin(stream::unfold(
            None::<Option<Document>>,
            move |last| {
                let table = table.clone();
                let id = id.clone();

                async move {
                    loop {
                        let watch = table.signal.watch().await;
                        let current = table.get_item(&id).await;

                        match &last {
                            Some(previous) if *previous == current => watch.wait().await,
                            _ => return Some((current.clone(), Some(current))),
                        }
                    }
                }
            },
        ))
    }

    /// Unending stream of the statement's result set, with the same yield
    /// and coalescing behavior as [`Table::item_stream`]. Result sets are
    /// compared structurally, so re-writing identical data yields nothing.
    pub fn query_stream(&self, statement: Statement) -> BoxStream<'static, Vec<Document>> {
        let table = self.clone();

        Box::pin(stream::unfold(
            None::<Vec<Document>>,
            move |last| {
                let table = table.clone();
                let statement = statement.clone();

                async move {
                    loop {
                        let watch = table.signal.watch().await;
                        let current = table.get_query(&statement).await;

                        match &last {
                            Some(previous) if *previous == current => watch.wait().await,
                            _ => return Some((current.clone(), Some(current))),
                        }
                    }
                }
            },
        ))
    }
}

/// Ids of the records a query-scoped write affects, extracted under the
/// state lock. Applies sort + limit only when a limit is present; filters
/// alone otherwise.
fn affected_ids(state: &TableState, statement: &Statement) -> Vec<String> {
    if statement.limit.is_some() {
        statement
            .transform(state.records.values())
            .iter()
            .filter_map(|record| record.get_str("id").ok())
            .map(str::to_string)
            .collect()
    } else {
        state
            .records
            .iter()
            .filter(|(_, record)| statement.filters.matches(record))
            .map(|(id, _)| id.clone())
            .collect()
    }
}
