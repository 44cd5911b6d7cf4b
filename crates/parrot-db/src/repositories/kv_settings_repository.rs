//! `SettingsRepository` over any `KvStore`.

use std::sync::Arc;

use async_trait::async_trait;

use parrot_core::{Collection, KvStore, RepositoryError, Settings, SettingsRepository};

const SETTINGS_KEY: &str = "app_settings";

/// Keeps the settings record as JSON under one key of the `settings`
/// collection.
pub struct KvSettingsRepository {
    store: Arc<dyn KvStore>,
}

impl KvSettingsRepository {
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl SettingsRepository for KvSettingsRepository {
    async fn load(&self) -> Result<Settings, RepositoryError> {
        match self.store.get(Collection::Settings, SETTINGS_KEY).await? {
            Some(json) => Ok(serde_json::from_str(&json)?),
            None => Ok(Settings::with_defaults()),
        }
    }

    async fn save(&self, settings: &Settings) -> Result<(), RepositoryError> {
        let json = serde_json::to_string(settings)?;
        self.store.put(Collection::Settings, SETTINGS_KEY, &json).await
    }
}
