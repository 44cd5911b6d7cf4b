//! `SQLite` persistence for parrot.
//!
//! One `kv_store` table backs every collection of the core
//! [`KvStore`](parrot_core::KvStore) port, including the settings record.

#![deny(unsafe_code)]

pub mod factory;
pub mod repositories;
pub mod setup;

// Re-export factory for convenient access
pub use factory::{StoreFactory, Stores};

// Re-export repository implementations
pub use repositories::{KvSettingsRepository, SqliteKvStore};

// Pool type for callers composing over an existing database
pub use sqlx::SqlitePool;

// Re-export setup functions for convenient access
pub use setup::setup_database;
#[cfg(any(test, feature = "test-utils"))]
pub use setup::setup_test_database;
