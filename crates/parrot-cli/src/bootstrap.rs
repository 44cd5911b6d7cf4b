//! CLI bootstrap - the composition root.
//!
//! This module is the ONLY place where infrastructure is wired together for
//! the CLI adapter:
//! - Database pool and stores (via parrot-db)
//! - HTTP speech engines (via parrot-voice)
//! - Core services (via parrot-core)
//!
//! Command handlers receive the composed [`CliContext`].

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use parrot_core::ports::{AudioDecoder, ForcedAligner, SpeechSynthesizer};
use parrot_core::{CacheStore, MaterialService, SettingsService, WavDecoder, database_path};
use parrot_db::{SqlitePool, StoreFactory, setup_database};
use parrot_voice::backend::{DEFAULT_ALIGN_TIMEOUT, DEFAULT_SYNTH_TIMEOUT};
use parrot_voice::{HttpAligner, HttpBackendConfig, HttpSynthesizer};

use crate::error::CliError;
use crate::parser::Cli;

/// Bootstrap configuration for the CLI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliConfig {
    pub db_path: PathBuf,
    pub synth_url: Option<String>,
    pub aligner_url: Option<String>,
}

impl CliConfig {
    /// Resolve configuration from parsed arguments (env already folded in).
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let db_path = match &cli.db {
            Some(path) => path.clone(),
            None => database_path()?,
        };
        Ok(Self {
            db_path,
            synth_url: non_empty(cli.synth_url.as_deref()),
            aligner_url: non_empty(cli.aligner_url.as_deref()),
        })
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value.map(str::trim).filter(|v| !v.is_empty()).map(str::to_string)
}

/// Fully composed application context for CLI commands.
pub struct CliContext {
    pub materials: MaterialService,
    pub settings: SettingsService,
    pub cache: Arc<CacheStore>,
    pub decoder: Arc<dyn AudioDecoder>,
    pub synthesizer: Option<Arc<dyn SpeechSynthesizer>>,
    pub aligner: Option<Arc<dyn ForcedAligner>>,
}

impl CliContext {
    /// The synthesizer, or a configuration error naming how to set one.
    pub fn require_synthesizer(&self) -> Result<Arc<dyn SpeechSynthesizer>, CliError> {
        self.synthesizer.clone().ok_or_else(|| {
            CliError::Config(
                "no speech synthesizer configured; pass --synth-url or set PARROT_SYNTH_URL"
                    .to_string(),
            )
        })
    }
}

/// Bootstrap the CLI context from configuration.
pub async fn bootstrap(config: CliConfig) -> Result<CliContext> {
    let pool = setup_database(&config.db_path).await?;
    tracing::debug!(path = %config.db_path.display(), "Database ready");

    let synthesizer: Option<Arc<dyn SpeechSynthesizer>> = match &config.synth_url {
        Some(url) => Some(Arc::new(HttpSynthesizer::new(HttpBackendConfig::new(
            url,
            DEFAULT_SYNTH_TIMEOUT,
        )?)?)),
        None => None,
    };
    let aligner: Option<Arc<dyn ForcedAligner>> = match &config.aligner_url {
        Some(url) => Some(Arc::new(HttpAligner::new(HttpBackendConfig::new(
            url,
            DEFAULT_ALIGN_TIMEOUT,
        )?)?)),
        None => None,
    };

    compose(pool, synthesizer, aligner).await
}

/// Wire services over an existing pool.
pub async fn compose(
    pool: SqlitePool,
    synthesizer: Option<Arc<dyn SpeechSynthesizer>>,
    aligner: Option<Arc<dyn ForcedAligner>>,
) -> Result<CliContext> {
    let limits = StoreFactory::settings_service(pool.clone())
        .get()
        .await?
        .cache_limits();
    let stores = StoreFactory::build(pool, limits);

    Ok(CliContext {
        materials: stores.materials,
        settings: stores.settings,
        cache: stores.cache,
        decoder: Arc::new(WavDecoder),
        synthesizer,
        aligner,
    })
}
