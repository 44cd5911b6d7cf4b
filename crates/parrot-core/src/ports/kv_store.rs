//! Persistent key-value store port.
//!
//! All persistence goes through named collections of string values keyed by
//! string. Callers own serialization; implementations only move text.

#[cfg(any(test, feature = "test-utils"))]
use std::collections::BTreeMap;
use std::fmt;
#[cfg(any(test, feature = "test-utils"))]
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;

use super::RepositoryError;

/// Named collections in the persistent store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Collection {
    Materials,
    AudioCache,
    TextCache,
    Settings,
}

impl Collection {
    /// Stable storage name of the collection.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Materials => "materials",
            Self::AudioCache => "audioCache",
            Self::TextCache => "textCache",
            Self::Settings => "settings",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Key-value store over named collections.
///
/// # Design Rules
///
/// - No `sqlx` types in signatures
/// - Writes to the same key are last-writer-wins
/// - `get_all` returns entries in key order
#[async_trait]
pub trait KvStore: Send + Sync {
    async fn get(&self, collection: Collection, key: &str)
    -> Result<Option<String>, RepositoryError>;

    async fn put(&self, collection: Collection, key: &str, value: &str)
    -> Result<(), RepositoryError>;

    /// Delete a key. Returns whether it existed.
    async fn delete(&self, collection: Collection, key: &str) -> Result<bool, RepositoryError>;

    async fn get_all(&self, collection: Collection)
    -> Result<Vec<(String, String)>, RepositoryError>;

    async fn clear(&self, collection: Collection) -> Result<(), RepositoryError>;
}

/// In-memory [`KvStore`] for tests.
#[cfg(any(test, feature = "test-utils"))]
#[derive(Debug, Default)]
pub struct MemoryKvStore {
    data: Mutex<BTreeMap<(Collection, String), String>>,
    fail: std::sync::atomic::AtomicBool,
}

#[cfg(any(test, feature = "test-utils"))]
impl MemoryKvStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call fail with a storage error.
    pub fn set_failing(&self, failing: bool) {
        self.fail
            .store(failing, std::sync::atomic::Ordering::SeqCst);
    }

    /// Number of keys in a collection.
    pub fn count(&self, collection: Collection) -> usize {
        self.data
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .filter(|(c, _)| *c == collection)
            .count()
    }

    fn check(&self) -> Result<(), RepositoryError> {
        if self.fail.load(std::sync::atomic::Ordering::SeqCst) {
            return Err(RepositoryError::Storage("store unavailable".to_string()));
        }
        Ok(())
    }
}

#[cfg(any(test, feature = "test-utils"))]
#[async_trait]
impl KvStore for MemoryKvStore {
    async fn get(
        &self,
        collection: Collection,
        key: &str,
    ) -> Result<Option<String>, RepositoryError> {
        self.check()?;
        Ok(self
            .data
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&(collection, key.to_string()))
            .cloned())
    }

    async fn put(
        &self,
        collection: Collection,
        key: &str,
        value: &str,
    ) -> Result<(), RepositoryError> {
        self.check()?;
        self.data
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert((collection, key.to_string()), value.to_string());
        Ok(())
    }

    async fn delete(&self, collection: Collection, key: &str) -> Result<bool, RepositoryError> {
        self.check()?;
        Ok(self
            .data
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&(collection, key.to_string()))
            .is_some())
    }

    async fn get_all(
        &self,
        collection: Collection,
    ) -> Result<Vec<(String, String)>, RepositoryError> {
        self.check()?;
        Ok(self
            .data
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|((c, _), _)| *c == collection)
            .map(|((_, k), v)| (k.clone(), v.clone()))
            .collect())
    }

    async fn clear(&self, collection: Collection) -> Result<(), RepositoryError> {
        self.check()?;
        self.data
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|(c, _), _| *c != collection);
        Ok(())
    }
}
