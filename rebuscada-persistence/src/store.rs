use async_trait::async_trait;
use sea_orm::DbErr;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::{RwLock, broadcast};
use uuid::Uuid;

const CHANGE_CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Storage unavailable")]
    Unavailable,
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Identifies one handle on a shared store; every tab gets its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StoreHandleId(Uuid);

impl StoreHandleId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for StoreHandleId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for StoreHandleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Notification that a key was written or removed through another handle.
/// `key` is `None` when notifications were missed and everything should be
/// re-read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageChange {
    pub key: Option<String>,
    pub origin: Option<StoreHandleId>,
}

impl StorageChange {
    pub fn resync() -> Self {
        Self {
            key: None,
            origin: None,
        }
    }
}

/// Receives changes made by other handles of the same store. Changes made
/// through the subscribing handle itself are skipped, like browser storage
/// events which never fire in the tab that wrote.
pub struct StorageSubscription {
    receiver: broadcast::Receiver<StorageChange>,
    own_handle: StoreHandleId,
}

impl StorageSubscription {
    pub fn new(receiver: broadcast::Receiver<StorageChange>, own_handle: StoreHandleId) -> Self {
        Self {
            receiver,
            own_handle,
        }
    }

    /// Next foreign change, or `None` once the store is gone
    pub async fn recv(&mut self) -> Option<StorageChange> {
        loop {
            match self.receiver.recv().await {
                Ok(change) if change.origin == Some(self.own_handle) => continue,
                Ok(change) => return Some(change),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::debug!("Storage subscription lagged by {} changes", skipped);
                    return Some(StorageChange::resync());
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Non-blocking variant of [`recv`](Self::recv)
    pub fn try_recv(&mut self) -> Option<StorageChange> {
        loop {
            match self.receiver.try_recv() {
                Ok(change) if change.origin == Some(self.own_handle) => continue,
                Ok(change) => return Some(change),
                Err(broadcast::error::TryRecvError::Lagged(_)) => {
                    return Some(StorageChange::resync());
                }
                Err(_) => return None,
            }
        }
    }
}

/// Small key/value capability the session layer persists through.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    async fn remove(&self, key: &str) -> Result<(), StorageError>;
    /// All keys starting with `prefix`
    async fn keys(&self, prefix: &str) -> Result<Vec<String>, StorageError>;
    fn subscribe(&self) -> StorageSubscription;
}

struct MemoryInner {
    entries: RwLock<BTreeMap<String, String>>,
    changes: broadcast::Sender<StorageChange>,
    unavailable: AtomicBool,
}

/// In-process store. Clones are the same tab; [`MemoryStore::open_tab`]
/// gives another tab on the same data.
#[derive(Clone)]
pub struct MemoryStore {
    inner: Arc<MemoryInner>,
    handle: StoreHandleId,
}

impl MemoryStore {
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self {
            inner: Arc::new(MemoryInner {
                entries: RwLock::new(BTreeMap::new()),
                changes,
                unavailable: AtomicBool::new(false),
            }),
            handle: StoreHandleId::new(),
        }
    }

    pub fn open_tab(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            handle: StoreHandleId::new(),
        }
    }

    pub fn handle(&self) -> StoreHandleId {
        self.handle
    }

    /// Make every operation fail, as storage does in some private-browsing
    /// modes
    pub fn set_unavailable(&self, unavailable: bool) {
        self.inner.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<(), StorageError> {
        if self.inner.unavailable.load(Ordering::SeqCst) {
            Err(StorageError::Unavailable)
        } else {
            Ok(())
        }
    }

    fn notify(&self, key: &str) {
        // No receivers is fine
        let _ = self.inner.changes.send(StorageChange {
            key: Some(key.to_string()),
            origin: Some(self.handle),
        });
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.check_available()?;
        let entries = self.inner.entries.read().await;
        Ok(entries.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.check_available()?;
        {
            let mut entries = self.inner.entries.write().await;
            entries.insert(key.to_string(), value.to_string());
        }
        self.notify(key);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.check_available()?;
        let removed = {
            let mut entries = self.inner.entries.write().await;
            entries.remove(key).is_some()
        };
        if removed {
            self.notify(key);
        }
        Ok(())
    }

    async fn keys(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        self.check_available()?;
        let entries = self.inner.entries.read().await;
        Ok(entries
            .keys()
            .filter(|key| key.starts_with(prefix))
            .cloned()
            .collect())
    }

    fn subscribe(&self) -> StorageSubscription {
        StorageSubscription::new(self.inner.changes.subscribe(), self.handle)
    }
}
