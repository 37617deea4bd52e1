pub mod kv_repository;
pub mod session_repository;

pub use kv_repository::SqliteStore;
pub use session_repository::{SessionRepository, StorageKeyKind, StorageKeys};
