pub mod connection;
pub mod entities;
pub mod repositories;
pub mod store;

pub use repositories::{SessionRepository, SqliteStore, StorageKeyKind, StorageKeys};
pub use store::{
    KeyValueStore, MemoryStore, StorageChange, StorageError, StorageSubscription, StoreHandleId,
};
