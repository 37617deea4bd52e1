use async_trait::async_trait;
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::sea_query::OnConflict;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, broadcast};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::entities::{kv_entries, prelude::*};
use crate::store::{
    KeyValueStore, StorageChange, StorageError, StorageSubscription, StoreHandleId,
};

const CHANGE_CHANNEL_CAPACITY: usize = 64;

/// `updated_at` of every row as last seen by this process
#[derive(Debug, Default)]
struct SeenRows {
    primed: bool,
    rows: HashMap<String, DateTimeWithTimeZone>,
}

/// Key/value store backed by the `kv_entries` table. Handles opened with
/// [`SqliteStore::open_tab`] share the connection and notify each other
/// directly. Writes from other processes on the same file are picked up by
/// [`SqliteStore::watch`].
#[derive(Clone)]
pub struct SqliteStore {
    db: DatabaseConnection,
    changes: broadcast::Sender<StorageChange>,
    handle: StoreHandleId,
    seen: Arc<Mutex<SeenRows>>,
}

impl SqliteStore {
    pub fn new(db: DatabaseConnection) -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self {
            db,
            changes,
            handle: StoreHandleId::new(),
            seen: Arc::new(Mutex::new(SeenRows::default())),
        }
    }

    pub fn open_tab(&self) -> Self {
        Self {
            handle: StoreHandleId::new(),
            ..self.clone()
        }
    }

    pub fn handle(&self) -> StoreHandleId {
        self.handle
    }

    fn notify(&self, key: &str) {
        let _ = self.changes.send(StorageChange {
            key: Some(key.to_string()),
            origin: Some(self.handle),
        });
    }

    /// Compare every row's `updated_at` with what this process last saw and
    /// broadcast a change for each row written or removed elsewhere. The
    /// first call only records the current rows. Returns how many keys
    /// changed.
    pub async fn poll_external_changes(&self) -> Result<usize, StorageError> {
        let mut seen = self.seen.lock().await;
        let rows: HashMap<String, DateTimeWithTimeZone> = KvEntries::find()
            .all(&self.db)
            .await?
            .into_iter()
            .map(|model| (model.storage_key, model.updated_at))
            .collect();

        if !seen.primed {
            seen.primed = true;
            seen.rows = rows;
            return Ok(0);
        }

        let mut changed: Vec<String> = rows
            .iter()
            .filter(|(key, updated_at)| seen.rows.get(*key) != Some(*updated_at))
            .map(|(key, _)| key.clone())
            .collect();
        changed.extend(
            seen.rows
                .keys()
                .filter(|key| !rows.contains_key(*key))
                .cloned(),
        );
        seen.rows = rows;
        drop(seen);

        if !changed.is_empty() {
            tracing::debug!("{} storage keys changed in another process", changed.len());
        }
        for key in &changed {
            let _ = self.changes.send(StorageChange {
                key: Some(key.clone()),
                origin: None,
            });
        }
        Ok(changed.len())
    }

    /// Poll for writes made by other processes every `period`
    pub fn watch(&self, period: Duration) -> JoinHandle<()> {
        let store = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                if let Err(e) = store.poll_external_changes().await {
                    tracing::warn!("Failed to poll storage for changes: {}", e);
                }
            }
        })
    }
}

#[async_trait]
impl KeyValueStore for SqliteStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let entry = KvEntries::find_by_id(key.to_string()).one(&self.db).await?;
        Ok(entry.map(|model| model.payload))
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let updated_at: DateTimeWithTimeZone = chrono::Utc::now().into();
        let entry = kv_entries::ActiveModel {
            storage_key: sea_orm::ActiveValue::Set(key.to_string()),
            payload: sea_orm::ActiveValue::Set(value.to_string()),
            updated_at: sea_orm::ActiveValue::Set(updated_at),
        };

        let mut seen = self.seen.lock().await;

        KvEntries::insert(entry)
            .on_conflict(
                OnConflict::column(kv_entries::Column::StorageKey)
                    .update_columns([kv_entries::Column::Payload, kv_entries::Column::UpdatedAt])
                    .to_owned(),
            )
            .exec(&self.db)
            .await?;
        seen.rows.insert(key.to_string(), updated_at);
        drop(seen);

        self.notify(key);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut seen = self.seen.lock().await;
        let result = KvEntries::delete_by_id(key.to_string())
            .exec(&self.db)
            .await?;
        seen.rows.remove(key);
        drop(seen);

        if result.rows_affected > 0 {
            self.notify(key);
        }
        Ok(())
    }

    async fn keys(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        let entries = KvEntries::find()
            .filter(kv_entries::Column::StorageKey.starts_with(prefix))
            .all(&self.db)
            .await?;

        Ok(entries.into_iter().map(|model| model.storage_key).collect())
    }

    fn subscribe(&self) -> StorageSubscription {
        StorageSubscription::new(self.changes.subscribe(), self.handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::{connect_to_database, connect_to_memory_database};
    use migration::{Migrator, MigratorTrait};

    async fn setup_test_store() -> SqliteStore {
        let db = connect_to_memory_database().await.unwrap();
        Migrator::up(&db, None).await.unwrap();
        SqliteStore::new(db)
    }

    #[tokio::test]
    async fn test_set_and_get() {
        let store = setup_test_store().await;

        store.set("rebuscada:v1:current", "joc:3").await.unwrap();
        let value = store.get("rebuscada:v1:current").await.unwrap();
        assert_eq!(value.as_deref(), Some("joc:3"));

        assert_eq!(store.get("missing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_set_overwrites_existing_key() {
        let store = setup_test_store().await;

        store.set("k", "first").await.unwrap();
        store.set("k", "second").await.unwrap();

        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("second"));
        assert_eq!(store.keys("k").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_keys_by_prefix_and_remove() {
        let store = setup_test_store().await;

        store.set("rebuscada:v1:game:joc:1", "{}").await.unwrap();
        store.set("rebuscada:v1:game:joc:2", "{}").await.unwrap();
        store.set("rebuscada:v1:games", "[]").await.unwrap();

        let mut keys = store.keys("rebuscada:v1:game:").await.unwrap();
        keys.sort();
        assert_eq!(keys, vec!["rebuscada:v1:game:joc:1", "rebuscada:v1:game:joc:2"]);

        store.remove("rebuscada:v1:game:joc:1").await.unwrap();
        assert_eq!(store.keys("rebuscada:v1:game:").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_tabs_are_notified() {
        let store = setup_test_store().await;
        let other_tab = store.open_tab();
        let mut changes = other_tab.subscribe();

        store.set("k", "v").await.unwrap();

        let change = changes.try_recv().unwrap();
        assert_eq!(change.key.as_deref(), Some("k"));
        assert_eq!(change.origin, Some(store.handle()));
    }

    #[tokio::test]
    async fn test_writes_from_another_process_are_detected() {
        let path = std::env::temp_dir().join(format!("rebuscada-{}.db", uuid::Uuid::new_v4()));
        let database_url = format!("sqlite://{}?mode=rwc", path.display());

        let first_db = connect_to_database(&database_url).await.unwrap();
        Migrator::up(&first_db, None).await.unwrap();
        let second_db = connect_to_database(&database_url).await.unwrap();

        let watcher = SqliteStore::new(first_db);
        let writer = SqliteStore::new(second_db);
        let mut changes = watcher.subscribe();

        writer.set("rebuscada:v1:games", "[]").await.unwrap();
        // The first poll only takes a baseline
        assert_eq!(watcher.poll_external_changes().await.unwrap(), 0);
        assert!(changes.try_recv().is_none());

        writer.set("rebuscada:v1:game:joc:1", "{}").await.unwrap();
        assert_eq!(watcher.poll_external_changes().await.unwrap(), 1);
        let change = changes.try_recv().unwrap();
        assert_eq!(change.key.as_deref(), Some("rebuscada:v1:game:joc:1"));
        assert_eq!(change.origin, None);

        writer.remove("rebuscada:v1:games").await.unwrap();
        assert_eq!(watcher.poll_external_changes().await.unwrap(), 1);
        let change = changes.try_recv().unwrap();
        assert_eq!(change.key.as_deref(), Some("rebuscada:v1:games"));

        // Nothing new since the last poll
        assert_eq!(watcher.poll_external_changes().await.unwrap(), 0);

        let _ = std::fs::remove_file(&path);
    }
}
