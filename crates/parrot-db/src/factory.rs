//! Composition utilities for wiring core services to `SQLite` backends.
//!
//! Construction only, no domain logic.

use sqlx::SqlitePool;
use std::sync::Arc;

use parrot_core::{CacheLimits, CacheStore, KvStore, MaterialService, SettingsService};

use crate::repositories::{KvSettingsRepository, SqliteKvStore};

/// Services sharing one `SQLite` pool.
pub struct Stores {
    pub kv: Arc<dyn KvStore>,
    pub cache: Arc<CacheStore>,
    pub materials: MaterialService,
    pub settings: SettingsService,
}

/// Factory for creating store instances with `SQLite` backends.
pub struct StoreFactory;

impl StoreFactory {
    /// Key-value store over a pool.
    pub fn kv_store(pool: SqlitePool) -> Arc<SqliteKvStore> {
        Arc::new(SqliteKvStore::new(pool))
    }

    /// Settings service over a pool, without a cache attached.
    ///
    /// Load settings with this first, then pass their cache limits to
    /// [`StoreFactory::build`].
    pub fn settings_service(pool: SqlitePool) -> SettingsService {
        SettingsService::new(Arc::new(KvSettingsRepository::new(Self::kv_store(pool))))
    }

    /// Build every store-backed service from a pool.
    ///
    /// The settings service applies cache limit changes to the built cache.
    pub fn build(pool: SqlitePool, limits: CacheLimits) -> Stores {
        let kv: Arc<dyn KvStore> = Self::kv_store(pool);
        let cache = Arc::new(CacheStore::with_limits(kv.clone(), limits));
        let settings = SettingsService::new(Arc::new(KvSettingsRepository::new(kv.clone())))
            .with_cache(cache.clone());
        Stores {
            materials: MaterialService::new(kv.clone(), cache.clone()),
            settings,
            kv,
            cache,
        }
    }
}
