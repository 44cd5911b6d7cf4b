//! Implementations of the core persistence ports.

mod kv_settings_repository;
mod sqlite_kv_store;

pub use kv_settings_repository::KvSettingsRepository;
pub use sqlite_kv_store::SqliteKvStore;
