//! Settings service - validated settings that take effect immediately.

use std::path::Path;
use std::sync::Arc;

use crate::cache::CacheStore;
use crate::ports::{CoreError, SettingsRepository};
use crate::settings::{NoiseKind, Settings, SettingsError, SettingsUpdate, validate_settings};

/// Service for settings operations.
///
/// With a cache attached, changed cache limits are applied to it on save.
pub struct SettingsService {
    repo: Arc<dyn SettingsRepository>,
    cache: Option<Arc<CacheStore>>,
}

impl SettingsService {
    pub fn new(repo: Arc<dyn SettingsRepository>) -> Self {
        Self { repo, cache: None }
    }

    /// Apply cache limit changes to `cache` as they are saved.
    #[must_use]
    pub fn with_cache(mut self, cache: Arc<CacheStore>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub async fn get(&self) -> Result<Settings, CoreError> {
        self.repo.load().await.map_err(CoreError::from)
    }

    /// Merge `update` into the stored settings and save the result.
    ///
    /// Nothing is stored when the merged settings are invalid.
    pub async fn update(&self, update: SettingsUpdate) -> Result<Settings, CoreError> {
        let mut current = self.repo.load().await?;
        current.merge(&update);
        self.save(&current).await?;
        Ok(current)
    }

    /// Validate and store complete settings.
    pub async fn save(&self, settings: &Settings) -> Result<(), CoreError> {
        check(settings)?;
        self.repo.save(settings).await?;

        let limits = settings.cache_limits();
        if let Some(cache) = &self.cache {
            if limits != cache.limits() {
                let evicted = cache.set_limits(limits).await?;
                tracing::info!(
                    max_entries = limits.max_entries,
                    evict_to = limits.evict_to,
                    evicted,
                    "Cache limits applied"
                );
            }
        }
        tracing::info!("Settings updated");
        Ok(())
    }
}

/// Value checks plus the checks that need the filesystem.
fn check(settings: &Settings) -> Result<(), SettingsError> {
    validate_settings(settings)?;
    if settings.noise_kind == Some(NoiseKind::Custom) {
        if let Some(file) = settings.noise_file.as_deref() {
            if !Path::new(file.trim()).is_file() {
                return Err(SettingsError::NoiseFileNotFound(file.to_string()));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{AudioPayload, CacheNamespace};
    use crate::ports::{Collection, MemoryKvStore, RepositoryError};
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct MemorySettings(Mutex<Settings>);

    #[async_trait]
    impl SettingsRepository for MemorySettings {
        async fn load(&self) -> Result<Settings, RepositoryError> {
            Ok(self.0.lock().unwrap().clone())
        }

        async fn save(&self, settings: &Settings) -> Result<(), RepositoryError> {
            *self.0.lock().unwrap() = settings.clone();
            Ok(())
        }
    }

    fn service() -> SettingsService {
        SettingsService::new(Arc::new(MemorySettings(Mutex::new(Settings::with_defaults()))))
    }

    #[tokio::test]
    async fn test_update_merges_and_persists() {
        let service = service();

        let updated = service
            .update(SettingsUpdate {
                default_speaker: Some(Some("ana".to_string())),
                gap_seconds: Some(Some(2.5)),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(updated.default_speaker.as_deref(), Some("ana"));
        assert_eq!(service.get().await.unwrap().gap_seconds, Some(2.5));

        let reset = service
            .update(SettingsUpdate {
                gap_seconds: Some(None),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(reset.effective_gap_seconds(), crate::settings::DEFAULT_GAP_SECONDS);
    }

    #[tokio::test]
    async fn test_invalid_update_is_not_persisted() {
        let service = service();

        let update = SettingsUpdate {
            playback_rate: Some(Some(10.0)),
            ..Default::default()
        };
        assert!(matches!(service.update(update).await, Err(CoreError::Settings(_))));
        assert_eq!(service.get().await.unwrap().playback_rate, Some(1.0));
    }

    #[tokio::test]
    async fn test_custom_noise_file_must_exist() {
        let service = service();
        let missing = std::env::temp_dir().join("parrot-no-such-noise.wav");

        let err = service
            .update(SettingsUpdate {
                noise_kind: Some(Some(NoiseKind::Custom)),
                noise_file: Some(Some(missing.display().to_string())),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            CoreError::Settings(SettingsError::NoiseFileNotFound(_))
        ));
        assert_eq!(service.get().await.unwrap().noise_kind, Some(NoiseKind::Off));
    }

    #[tokio::test]
    async fn test_existing_custom_noise_file_is_accepted() {
        let service = service();
        let file = std::env::temp_dir().join(format!("parrot-noise-{}.wav", uuid::Uuid::new_v4()));
        std::fs::write(&file, b"RIFF").unwrap();

        let updated = service
            .update(SettingsUpdate {
                noise_kind: Some(Some(NoiseKind::Custom)),
                noise_file: Some(Some(file.display().to_string())),
                ..Default::default()
            })
            .await
            .unwrap();
        std::fs::remove_file(&file).unwrap();

        assert_eq!(updated.noise_kind, Some(NoiseKind::Custom));
    }

    #[tokio::test]
    async fn test_cache_limits_take_effect_on_update() {
        let kv = Arc::new(MemoryKvStore::new());
        let cache = Arc::new(CacheStore::new(kv.clone()));
        for i in 0..8 {
            cache
                .put_audio(&format!("k{i}"), &AudioPayload::from_bytes(&[i], vec![], 0.1))
                .await
                .unwrap();
        }
        let service = service().with_cache(cache.clone());

        service
            .update(SettingsUpdate {
                cache_max_entries: Some(Some(5)),
                cache_evict_to: Some(Some(3)),
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(cache.limits().max_entries, 5);
        assert_eq!(kv.count(Collection::AudioCache), 3);
        assert_eq!(cache.stats(CacheNamespace::Audio).await.unwrap().count, 3);
    }
}
