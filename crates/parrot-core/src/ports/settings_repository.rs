//! Settings persistence port.

use async_trait::async_trait;

use super::RepositoryError;
use crate::settings::Settings;

/// Storage for the single application settings record.
#[async_trait]
pub trait SettingsRepository: Send + Sync {
    /// Load settings, falling back to [`Settings::with_defaults`] when none
    /// have been saved yet.
    async fn load(&self) -> Result<Settings, RepositoryError>;

    async fn save(&self, settings: &Settings) -> Result<(), RepositoryError>;
}
