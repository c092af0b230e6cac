//! Persistence for saved artifacts
//!
//! Two layers:
//! - [`KeyValueStore`] is the durable substrate: string values under string
//!   keys. [`SqliteStore`] keeps them in SQLite, [`MemoryStore`] in a map.
//! - [`Collection`] keeps one artifact kind as a JSON-encoded list under the
//!   kind's storage key. Every write replaces the whole list.
//!
//! Collection reads and writes never fail: an unavailable store reads as an
//! empty list and a failed write is logged and dropped.

use crate::error::Result;
use crate::types::{ArtifactKind, RecordId, SavedArticle, SavedMarkdown, SavedOutline, now_millis};
use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::marker::PhantomData;
use std::sync::Arc;

mod memory;
mod sqlite;

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// Durable string storage
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Value stored under `key`, if any
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store `value` under `key`, replacing any previous value
    async fn set(&self, key: &str, value: &str) -> Result<()>;
}

/// A record type kept in a [`Collection`]
pub trait SavedRecord: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Which collection holds this record type
    const KIND: ArtifactKind;

    /// Record identifier
    fn id(&self) -> &RecordId;

    /// Creation time in Unix milliseconds
    fn created_at(&self) -> i64;
}

impl SavedRecord for SavedOutline {
    const KIND: ArtifactKind = ArtifactKind::Outline;

    fn id(&self) -> &RecordId {
        &self.id
    }

    fn created_at(&self) -> i64 {
        self.created_at
    }
}

impl SavedRecord for SavedArticle {
    const KIND: ArtifactKind = ArtifactKind::Article;

    fn id(&self) -> &RecordId {
        &self.id
    }

    fn created_at(&self) -> i64 {
        self.created_at
    }
}

impl SavedRecord for SavedMarkdown {
    const KIND: ArtifactKind = ArtifactKind::Markdown;

    fn id(&self) -> &RecordId {
        &self.id
    }

    fn created_at(&self) -> i64 {
        self.created_at
    }
}

/// Saved records of one kind
pub struct Collection<T> {
    store: Arc<dyn KeyValueStore>,
    _record: PhantomData<fn() -> T>,
}

impl<T> Clone for Collection<T> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            _record: PhantomData,
        }
    }
}

impl<T: SavedRecord> Collection<T> {
    /// Collection backed by `store`
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            _record: PhantomData,
        }
    }

    /// All records, newest first
    ///
    /// Returns an empty list when the store cannot be read or holds
    /// something that does not decode.
    pub async fn list(&self) -> Vec<T> {
        match self.read().await {
            Ok(mut records) => {
                records.sort_by_key(|r| std::cmp::Reverse(r.created_at()));
                records
            }
            Err(e) => {
                tracing::warn!(kind = %T::KIND, error = %e, "failed to read saved records, treating as empty");
                Vec::new()
            }
        }
    }

    async fn read(&self) -> Result<Vec<T>> {
        match self.store.get(T::KIND.storage_key()).await? {
            Some(raw) => Ok(serde_json::from_str(&raw)?),
            None => Ok(Vec::new()),
        }
    }

    /// Record with the given id
    pub async fn get(&self, id: &RecordId) -> Option<T> {
        self.list().await.into_iter().find(|r| r.id() == id)
    }

    /// Replace the whole collection
    ///
    /// Failures are logged and otherwise ignored.
    pub async fn replace(&self, records: &[T]) {
        if let Err(e) = self.write(records).await {
            tracing::warn!(kind = %T::KIND, error = %e, "failed to write saved records");
        }
    }

    async fn write(&self, records: &[T]) -> Result<()> {
        let encoded = serde_json::to_string(records)?;
        self.store.set(T::KIND.storage_key(), &encoded).await
    }

    /// Insert a new record or update the one being edited
    ///
    /// `build` receives the id and creation time to use. When `editing`
    /// names a record in the collection, that record is replaced in place and
    /// keeps its creation time. Otherwise a new record goes to the front of
    /// the list, reusing `editing` as its id when one is given.
    ///
    /// Returns the record id and whether an existing record was updated.
    pub async fn upsert_with<F>(&self, editing: Option<&RecordId>, build: F) -> (RecordId, bool)
    where
        F: FnOnce(RecordId, i64) -> T,
    {
        let mut records = self.list().await;
        let existing = editing.and_then(|id| records.iter().position(|r| r.id() == id));

        let (id, updated) = match existing {
            Some(pos) => {
                let current = &records[pos];
                let record = build(current.id().clone(), current.created_at());
                let id = record.id().clone();
                records[pos] = record;
                (id, true)
            }
            None => {
                let id = editing.cloned().unwrap_or_default();
                let record = build(id, now_millis());
                let id = record.id().clone();
                records.insert(0, record);
                (id, false)
            }
        };

        self.replace(&records).await;
        (id, updated)
    }

    /// Remove a record, returning whether it was present
    pub async fn remove(&self, id: &RecordId) -> bool {
        let mut records = self.list().await;
        let before = records.len();
        records.retain(|r| r.id() != id);
        if records.len() == before {
            return false;
        }
        self.replace(&records).await;
        true
    }
}
