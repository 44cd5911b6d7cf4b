//! `SQLite` implementation of the `KvStore` trait.

use async_trait::async_trait;
use sqlx::{Row, SqlitePool};

use parrot_core::{Collection, KvStore, RepositoryError};

fn storage(e: sqlx::Error) -> RepositoryError {
    RepositoryError::Storage(e.to_string())
}

/// `SQLite` implementation of the `KvStore` trait.
///
/// Every collection shares the `kv_store` table, keyed by `(collection, key)`.
#[derive(Clone)]
pub struct SqliteKvStore {
    pool: SqlitePool,
}

impl SqliteKvStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl KvStore for SqliteKvStore {
    async fn get(
        &self,
        collection: Collection,
        key: &str,
    ) -> Result<Option<String>, RepositoryError> {
        let row = sqlx::query("SELECT value FROM kv_store WHERE collection = ? AND key = ?")
            .bind(collection.as_str())
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(storage)?;

        Ok(row.map(|r| r.get("value")))
    }

    async fn put(
        &self,
        collection: Collection,
        key: &str,
        value: &str,
    ) -> Result<(), RepositoryError> {
        let updated_at = chrono::Utc::now().format("%Y-%m-%d %H:%M:%S").to_string();

        sqlx::query(
            "INSERT OR REPLACE INTO kv_store (collection, key, value, updated_at) VALUES (?, ?, ?, ?)",
        )
        .bind(collection.as_str())
        .bind(key)
        .bind(value)
        .bind(&updated_at)
        .execute(&self.pool)
        .await
        .map_err(storage)?;

        Ok(())
    }

    async fn delete(&self, collection: Collection, key: &str) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM kv_store WHERE collection = ? AND key = ?")
            .bind(collection.as_str())
            .bind(key)
            .execute(&self.pool)
            .await
            .map_err(storage)?;

        Ok(result.rows_affected() > 0)
    }

    async fn get_all(
        &self,
        collection: Collection,
    ) -> Result<Vec<(String, String)>, RepositoryError> {
        let rows = sqlx::query("SELECT key, value FROM kv_store WHERE collection = ? ORDER BY key")
            .bind(collection.as_str())
            .fetch_all(&self.pool)
            .await
            .map_err(storage)?;

        Ok(rows
            .into_iter()
            .map(|r| (r.get("key"), r.get("value")))
            .collect())
    }

    async fn clear(&self, collection: Collection) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM kv_store WHERE collection = ?")
            .bind(collection.as_str())
            .execute(&self.pool)
            .await
            .map_err(storage)?;

        tracing::debug!(%collection, removed = result.rows_affected(), "Collection cleared");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::setup::setup_test_database;

    async fn store() -> SqliteKvStore {
        SqliteKvStore::new(setup_test_database().await.unwrap())
    }

    #[tokio::test]
    async fn test_put_get_overwrite() {
        let store = store().await;
        assert!(store.get(Collection::Materials, "m1").await.unwrap().is_none());

        store.put(Collection::Materials, "m1", "first").await.unwrap();
        store.put(Collection::Materials, "m1", "second").await.unwrap();

        assert_eq!(
            store.get(Collection::Materials, "m1").await.unwrap().as_deref(),
            Some("second")
        );
    }

    #[tokio::test]
    async fn test_collections_are_isolated() {
        let store = store().await;
        store.put(Collection::AudioCache, "k", "audio").await.unwrap();
        store.put(Collection::TextCache, "k", "text").await.unwrap();

        store.clear(Collection::AudioCache).await.unwrap();

        assert!(store.get(Collection::AudioCache, "k").await.unwrap().is_none());
        assert_eq!(
            store.get(Collection::TextCache, "k").await.unwrap().as_deref(),
            Some("text")
        );
    }

    #[tokio::test]
    async fn test_delete_reports_existence() {
        let store = store().await;
        store.put(Collection::Settings, "a", "1").await.unwrap();

        assert!(store.delete(Collection::Settings, "a").await.unwrap());
        assert!(!store.delete(Collection::Settings, "a").await.unwrap());
    }

    #[tokio::test]
    async fn test_get_all_is_key_ordered() {
        let store = store().await;
        for key in ["c", "a", "b"] {
            store.put(Collection::Materials, key, key).await.unwrap();
        }
        store.put(Collection::TextCache, "z", "z").await.unwrap();

        let keys: Vec<String> = store
            .get_all(Collection::Materials)
            .await
            .unwrap()
            .into_iter()
            .map(|(k, _)| k)
            .collect();
        assert_eq!(keys, vec!["a", "b", "c"]);
    }
}
