use rebuscada_core::{SessionKey, SessionState};
use rebuscada_types::CompetitionInfo;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::BTreeSet;
use std::sync::Arc;

use crate::store::{KeyValueStore, StorageError, StorageSubscription};

pub const DEFAULT_NAMESPACE: &str = "rebuscada";
pub const STORAGE_VERSION: u32 = 1;

/// Namespaced, versioned storage key layout
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageKeys {
    prefix: String,
}

/// What a storage key refers to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageKeyKind {
    Session(String),
    Directory,
    Current,
    Competition,
    ApiVersion,
}

impl StorageKeys {
    pub fn new(namespace: &str) -> Self {
        Self {
            prefix: format!("{}:v{}:", namespace, STORAGE_VERSION),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn session(&self, storage_id: &str) -> String {
        format!("{}game:{}", self.prefix, storage_id)
    }

    pub fn session_prefix(&self) -> String {
        format!("{}game:", self.prefix)
    }

    pub fn directory(&self) -> String {
        format!("{}games", self.prefix)
    }

    pub fn current(&self) -> String {
        format!("{}current", self.prefix)
    }

    pub fn competition(&self) -> String {
        format!("{}competition", self.prefix)
    }

    pub fn api_version(&self) -> String {
        format!("{}api-version", self.prefix)
    }

    pub fn classify(&self, key: &str) -> Option<StorageKeyKind> {
        let rest = key.strip_prefix(&self.prefix)?;
        if let Some(storage_id) = rest.strip_prefix("game:") {
            return Some(StorageKeyKind::Session(storage_id.to_string()));
        }
        match rest {
            "games" => Some(StorageKeyKind::Directory),
            "current" => Some(StorageKeyKind::Current),
            "competition" => Some(StorageKeyKind::Competition),
            "api-version" => Some(StorageKeyKind::ApiVersion),
            _ => None,
        }
    }
}

impl Default for StorageKeys {
    fn default() -> Self {
        Self::new(DEFAULT_NAMESPACE)
    }
}

/// Saves and restores sessions. Persistence is a convenience: every storage
/// failure is logged and turned into a no-op or an empty result.
#[derive(Clone)]
pub struct SessionRepository {
    store: Arc<dyn KeyValueStore>,
    keys: StorageKeys,
}

impl SessionRepository {
    pub fn new(store: Arc<dyn KeyValueStore>, keys: StorageKeys) -> Self {
        Self { store, keys }
    }

    pub fn keys(&self) -> &StorageKeys {
        &self.keys
    }

    pub fn subscribe(&self) -> StorageSubscription {
        self.store.subscribe()
    }

    fn degrade<T>(operation: &str, result: Result<T, StorageError>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(err) => {
                tracing::warn!("Storage {} failed, continuing without it: {}", operation, err);
                None
            }
        }
    }

    async fn read_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StorageError> {
        match self.store.get(key).await? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    async fn write_json<T: Serialize>(&self, key: &str, value: &T) -> Result<(), StorageError> {
        let raw = serde_json::to_string(value)?;
        self.store.set(key, &raw).await
    }

    /// Persist a session under its own key and record it in the directory.
    /// Sessions without guesses that are neither won nor surrendered are
    /// skipped.
    pub async fn save(&self, state: &SessionState) {
        if !state.should_persist() {
            return;
        }
        let storage_id = state.key.storage_id();
        let result = async {
            self.write_json(&self.keys.session(&storage_id), state).await?;
            self.merge_into_directory(&storage_id).await?;
            self.store.set(&self.keys.current(), &storage_id).await
        }
        .await;

        if Self::degrade("save", result).is_some() {
            tracing::debug!("Saved session {}", storage_id);
        }
    }

    async fn merge_into_directory(&self, storage_id: &str) -> Result<(), StorageError> {
        let directory_key = self.keys.directory();
        let mut directory: BTreeSet<String> =
            self.read_json(&directory_key).await?.unwrap_or_default();
        if directory.insert(storage_id.to_string()) {
            self.write_json(&directory_key, &directory).await?;
        }
        Ok(())
    }

    /// Saved state for exactly this session, if any
    pub async fn load(&self, key: &SessionKey) -> Option<SessionState> {
        let state = self.load_by_id(&key.storage_id()).await?;
        if &state.key != key {
            tracing::debug!(
                "Ignoring saved session {} recorded for a different puzzle",
                key.storage_id()
            );
            return None;
        }
        Some(state)
    }

    pub async fn load_by_id(&self, storage_id: &str) -> Option<SessionState> {
        let result = self
            .read_json::<SessionState>(&self.keys.session(storage_id))
            .await;
        Self::degrade("load", result).flatten()
    }

    /// Storage ids of every saved session
    pub async fn list_sessions(&self) -> Vec<String> {
        let result = self.read_json::<BTreeSet<String>>(&self.keys.directory()).await;
        Self::degrade("directory read", result)
            .flatten()
            .map(|directory| directory.into_iter().collect())
            .unwrap_or_default()
    }

    pub async fn current(&self) -> Option<String> {
        Self::degrade("pointer read", self.store.get(&self.keys.current()).await).flatten()
    }

    /// Remove every saved session together with the directory, the current
    /// pointer and the competition record.
    pub async fn clear(&self) {
        let result = async {
            for key in self.store.keys(&self.keys.session_prefix()).await? {
                self.store.remove(&key).await?;
            }
            self.store.remove(&self.keys.directory()).await?;
            self.store.remove(&self.keys.current()).await?;
            self.store.remove(&self.keys.competition()).await
        }
        .await;

        if Self::degrade("clear", result).is_some() {
            tracing::info!("Cleared saved sessions");
        }
    }

    /// Remove everything under the namespace, API version included
    pub async fn wipe(&self) {
        let result = async {
            for key in self.store.keys(self.keys.prefix()).await? {
                self.store.remove(&key).await?;
            }
            Ok::<(), StorageError>(())
        }
        .await;

        if Self::degrade("wipe", result).is_some() {
            tracing::info!("Wiped local storage under {}", self.keys.prefix());
        }
    }

    pub async fn load_competition(&self) -> Option<CompetitionInfo> {
        let result = self.read_json(&self.keys.competition()).await;
        Self::degrade("competition read", result).flatten()
    }

    pub async fn save_competition(&self, info: &CompetitionInfo) {
        let result = self.write_json(&self.keys.competition(), info).await;
        Self::degrade("competition save", result);
    }

    pub async fn clear_competition(&self) {
        let result = self.store.remove(&self.keys.competition()).await;
        Self::degrade("competition clear", result);
    }

    pub async fn api_version(&self) -> Option<String> {
        Self::degrade("version read", self.store.get(&self.keys.api_version()).await).flatten()
    }

    pub async fn set_api_version(&self, version: &str) {
        let result = self.store.set(&self.keys.api_version(), version).await;
        Self::degrade("version save", result);
    }
}
