use super::*;
use crate::error::Error;
use crate::types::{Outline, Section};
use tempfile::tempdir;

/// Store whose every call fails
struct FailingStore;

#[async_trait]
impl KeyValueStore for FailingStore {
    async fn get(&self, _key: &str) -> Result<Option<String>> {
        Err(Error::Other("storage unavailable".into()))
    }

    async fn set(&self, _key: &str, _value: &str) -> Result<()> {
        Err(Error::Other("storage unavailable".into()))
    }
}

fn outline(title: &str) -> Outline {
    Outline::new(title, vec![Section::new("Intro", vec!["hook".into()])])
}

fn saved(id: &str, created_at: i64, title: &str) -> SavedOutline {
    SavedOutline {
        id: RecordId::from(id),
        created_at,
        outline: outline(title),
    }
}

fn outlines(store: Arc<dyn KeyValueStore>) -> Collection<SavedOutline> {
    Collection::new(store)
}

#[tokio::test]
async fn sqlite_store_round_trips_and_overwrites() {
    let dir = tempdir().unwrap();
    let store = SqliteStore::new(&dir.path().join("nested").join("store.db"))
        .await
        .unwrap();

    assert_eq!(store.get("k").await.unwrap(), None);
    store.set("k", "one").await.unwrap();
    store.set("k", "two").await.unwrap();
    assert_eq!(store.get("k").await.unwrap().as_deref(), Some("two"));
}

#[tokio::test]
async fn sqlite_store_persists_across_reopen() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("store.db");

    let store = SqliteStore::new(&path).await.unwrap();
    store.set("draftline-saved-outlines", "[]").await.unwrap();
    store.close().await;

    // Reopening must not re-run migration v1
    let reopened = SqliteStore::new(&path).await.unwrap();
    assert_eq!(
        reopened
            .get("draftline-saved-outlines")
            .await
            .unwrap()
            .as_deref(),
        Some("[]")
    );
}

#[tokio::test]
async fn sqlite_store_after_close_returns_error() {
    let dir = tempdir().unwrap();
    let store = SqliteStore::new(&dir.path().join("store.db")).await.unwrap();
    store.pool().close().await;

    assert!(store.get("k").await.is_err());
    assert!(store.set("k", "v").await.is_err());
}

#[tokio::test]
async fn list_sorts_newest_first() {
    let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
    let records = vec![saved("old", 1, "Old"), saved("new", 3, "New"), saved("mid", 2, "Mid")];
    store
        .set(
            ArtifactKind::Outline.storage_key(),
            &serde_json::to_string(&records).unwrap(),
        )
        .await
        .unwrap();

    let ids: Vec<_> = outlines(store)
        .list()
        .await
        .into_iter()
        .map(|r| r.id.0)
        .collect();
    assert_eq!(ids, vec!["new", "mid", "old"]);
}

#[tokio::test]
async fn list_treats_corrupt_value_as_empty() {
    let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
    store
        .set(ArtifactKind::Outline.storage_key(), "{not json")
        .await
        .unwrap();
    assert!(outlines(store).list().await.is_empty());
}

#[tokio::test]
async fn corrupt_value_reads_as_serialization_error() {
    let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
    store
        .set(ArtifactKind::Outline.storage_key(), "{not json")
        .await
        .unwrap();
    let err = outlines(store).read().await.unwrap_err();
    assert!(matches!(err, Error::Serialization(_)));
}

#[tokio::test]
async fn failing_store_degrades_to_empty_and_swallows_writes() {
    let collection = outlines(Arc::new(FailingStore));
    assert!(collection.list().await.is_empty());

    let (id, updated) = collection
        .upsert_with(None, |id, created_at| SavedOutline {
            id,
            created_at,
            outline: outline("T"),
        })
        .await;
    assert!(!updated);
    assert!(!id.as_str().is_empty());
    assert!(!collection.remove(&id).await);
}

#[tokio::test]
async fn upsert_inserts_at_front_then_updates_in_place() {
    let collection = outlines(Arc::new(MemoryStore::new()));
    collection.replace(&[saved("existing", 10, "Existing")]).await;

    let (id, updated) = collection
        .upsert_with(None, |id, created_at| SavedOutline {
            id,
            created_at,
            outline: outline("Fresh"),
        })
        .await;
    assert!(!updated);

    let listed = collection.list().await;
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].id, id);
    let created_at = listed[0].created_at;

    let (same_id, updated) = collection
        .upsert_with(Some(&id), |id, created_at| SavedOutline {
            id,
            created_at,
            outline: outline("Edited"),
        })
        .await;
    assert!(updated);
    assert_eq!(same_id, id);

    let listed = collection.list().await;
    assert_eq!(listed.len(), 2, "update must not add a record");
    let record = collection.get(&id).await.unwrap();
    assert_eq!(record.outline.title, "Edited");
    assert_eq!(record.created_at, created_at);
}

#[tokio::test]
async fn upsert_with_unknown_editing_id_inserts_under_that_id() {
    let collection = outlines(Arc::new(MemoryStore::new()));
    let ghost = RecordId::from("deleted-elsewhere");

    let (id, updated) = collection
        .upsert_with(Some(&ghost), |id, created_at| SavedOutline {
            id,
            created_at,
            outline: outline("Back"),
        })
        .await;
    assert!(!updated);
    assert_eq!(id, ghost);
    assert_eq!(collection.list().await.len(), 1);
}

#[tokio::test]
async fn remove_reports_presence() {
    let collection = outlines(Arc::new(MemoryStore::new()));
    collection
        .replace(&[saved("a", 2, "A"), saved("b", 1, "B")])
        .await;

    assert!(collection.remove(&RecordId::from("a")).await);
    assert!(!collection.remove(&RecordId::from("a")).await);
    let ids: Vec<_> = collection.list().await.into_iter().map(|r| r.id.0).collect();
    assert_eq!(ids, vec!["b"]);
}

#[tokio::test]
async fn collections_are_keyed_per_kind() {
    let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
    outlines(store.clone()).replace(&[saved("o", 1, "O")]).await;

    let markdowns: Collection<SavedMarkdown> = Collection::new(store.clone());
    assert!(markdowns.list().await.is_empty());
    assert!(
        store
            .get("draftline-saved-outlines")
            .await
            .unwrap()
            .unwrap()
            .contains("\"createdAt\":1")
    );
}
