//! Settings domain types and validation.
//!
//! Pure domain types with no infrastructure dependencies. Every field is
//! optional so stored settings survive schema additions; `effective_*`
//! accessors supply the defaults.

use serde::{Deserialize, Serialize};

use crate::cache::{CacheLimits, DEFAULT_EVICT_TO, DEFAULT_MAX_ENTRIES};

/// Default synthesis speed multiplier.
pub const DEFAULT_SPEED: f32 = 1.0;

/// Default language for generated materials.
pub const DEFAULT_LANGUAGE: &str = "en";

/// Default forced-aligner model name.
pub const DEFAULT_ALIGNER_MODEL: &str = "base";

/// Default pause after each chunk, in seconds.
pub const DEFAULT_GAP_SECONDS: f64 = 1.0;

/// What plays at the start of the pause between chunks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GapSound {
    #[default]
    None,
    Beep,
}

/// Background noise mixed under playback.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoiseKind {
    #[default]
    Off,
    White,
    Gaussian,
    Custom,
}

impl std::str::FromStr for GapSound {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "none" => Ok(Self::None),
            "beep" => Ok(Self::Beep),
            other => Err(format!("unknown gap sound '{other}' (expected none|beep)")),
        }
    }
}

impl std::str::FromStr for NoiseKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "off" => Ok(Self::Off),
            "white" => Ok(Self::White),
            "gaussian" => Ok(Self::Gaussian),
            "custom" => Ok(Self::Custom),
            other => Err(format!(
                "unknown noise kind '{other}' (expected off|white|gaussian|custom)"
            )),
        }
    }
}

/// Application settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    /// Preferred synthesizer voice id.
    pub default_speaker: Option<String>,

    /// Synthesis speed multiplier (0.5-2.0).
    pub speed: Option<f32>,

    /// Language code for generated materials.
    pub language: Option<String>,

    /// Model name passed to the forced aligner.
    pub aligner_model: Option<String>,

    /// Pause after each chunk during playback, in seconds (0-30).
    pub gap_seconds: Option<f64>,

    pub gap_sound: Option<GapSound>,

    /// Playback rate multiplier (0.25-4.0).
    pub playback_rate: Option<f32>,

    pub noise_kind: Option<NoiseKind>,

    /// Noise gain (0-1).
    pub noise_intensity: Option<f32>,

    /// Audio file looped when `noise_kind` is `custom`.
    pub noise_file: Option<String>,

    /// Entry count per cache namespace that triggers eviction.
    pub cache_max_entries: Option<u32>,

    /// Entry count eviction shrinks a cache namespace to.
    pub cache_evict_to: Option<u32>,
}

impl Settings {
    /// Create settings with sensible defaults.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self {
            default_speaker: None,
            speed: Some(DEFAULT_SPEED),
            language: Some(DEFAULT_LANGUAGE.to_string()),
            aligner_model: Some(DEFAULT_ALIGNER_MODEL.to_string()),
            gap_seconds: Some(DEFAULT_GAP_SECONDS),
            gap_sound: Some(GapSound::Beep),
            playback_rate: Some(1.0),
            noise_kind: Some(NoiseKind::Off),
            noise_intensity: Some(0.1),
            noise_file: None,
            cache_max_entries: Some(DEFAULT_MAX_ENTRIES as u32),
            cache_evict_to: Some(DEFAULT_EVICT_TO as u32),
        }
    }

    #[must_use]
    pub fn effective_speed(&self) -> f32 {
        self.speed.unwrap_or(DEFAULT_SPEED)
    }

    #[must_use]
    pub fn effective_language(&self) -> &str {
        self.language.as_deref().unwrap_or(DEFAULT_LANGUAGE)
    }

    #[must_use]
    pub fn effective_aligner_model(&self) -> &str {
        self.aligner_model.as_deref().unwrap_or(DEFAULT_ALIGNER_MODEL)
    }

    #[must_use]
    pub fn effective_gap_seconds(&self) -> f64 {
        self.gap_seconds.unwrap_or(DEFAULT_GAP_SECONDS)
    }

    #[must_use]
    pub fn effective_playback_rate(&self) -> f32 {
        self.playback_rate.unwrap_or(1.0)
    }

    #[must_use]
    pub fn effective_noise_intensity(&self) -> f32 {
        self.noise_intensity.unwrap_or(0.0)
    }

    /// Cache thresholds with defaults filled in.
    #[must_use]
    pub fn cache_limits(&self) -> CacheLimits {
        CacheLimits {
            max_entries: self
                .cache_max_entries
                .map_or(DEFAULT_MAX_ENTRIES, |v| v as usize),
            evict_to: self.cache_evict_to.map_or(DEFAULT_EVICT_TO, |v| v as usize),
        }
    }

    /// Merge another settings into this one, only updating fields that are Some.
    pub fn merge(&mut self, other: &SettingsUpdate) {
        if let Some(ref speaker) = other.default_speaker {
            self.default_speaker.clone_from(speaker);
        }
        if let Some(speed) = other.speed {
            self.speed = speed;
        }
        if let Some(ref language) = other.language {
            self.language.clone_from(language);
        }
        if let Some(ref model) = other.aligner_model {
            self.aligner_model.clone_from(model);
        }
        if let Some(gap) = other.gap_seconds {
            self.gap_seconds = gap;
        }
        if let Some(sound) = other.gap_sound {
            self.gap_sound = sound;
        }
        if let Some(rate) = other.playback_rate {
            self.playback_rate = rate;
        }
        if let Some(kind) = other.noise_kind {
            self.noise_kind = kind;
        }
        if let Some(intensity) = other.noise_intensity {
            self.noise_intensity = intensity;
        }
        if let Some(ref file) = other.noise_file {
            self.noise_file.clone_from(file);
        }
        if let Some(max) = other.cache_max_entries {
            self.cache_max_entries = max;
        }
        if let Some(evict) = other.cache_evict_to {
            self.cache_evict_to = evict;
        }
    }
}

/// Partial settings update.
///
/// Each field is `Option<Option<T>>`:
/// - `None` = don't change this field
/// - `Some(None)` = reset the field to its default
/// - `Some(Some(value))` = set field to value
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SettingsUpdate {
    pub default_speaker: Option<Option<String>>,
    pub speed: Option<Option<f32>>,
    pub language: Option<Option<String>>,
    pub aligner_model: Option<Option<String>>,
    pub gap_seconds: Option<Option<f64>>,
    pub gap_sound: Option<Option<GapSound>>,
    pub playback_rate: Option<Option<f32>>,
    pub noise_kind: Option<Option<NoiseKind>>,
    pub noise_intensity: Option<Option<f32>>,
    pub noise_file: Option<Option<String>>,
    pub cache_max_entries: Option<Option<u32>>,
    pub cache_evict_to: Option<Option<u32>>,
}

/// Settings validation error.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SettingsError {
    #[error("Speed must be between 0.5 and 2.0, got {0}")]
    InvalidSpeed(f32),

    #[error("Gap must be between 0 and 30 seconds, got {0}")]
    InvalidGap(f64),

    #[error("Playback rate must be between 0.25 and 4.0, got {0}")]
    InvalidPlaybackRate(f32),

    #[error("Noise intensity must be between 0 and 1, got {0}")]
    InvalidNoiseIntensity(f32),

    #[error("Cache eviction target ({evict_to}) must be below the cap ({max_entries})")]
    InvalidCacheLimits { max_entries: u32, evict_to: u32 },

    #[error("Custom noise requires a noise file")]
    MissingNoiseFile,

    #[error("Noise file {0} does not exist")]
    NoiseFileNotFound(String),

    #[error("{0} cannot be empty")]
    Empty(&'static str),
}

/// Validate settings values.
pub fn validate_settings(settings: &Settings) -> Result<(), SettingsError> {
    if let Some(speed) = settings.speed {
        if !(0.5..=2.0).contains(&speed) {
            return Err(SettingsError::InvalidSpeed(speed));
        }
    }

    if let Some(gap) = settings.gap_seconds {
        if !(0.0..=30.0).contains(&gap) {
            return Err(SettingsError::InvalidGap(gap));
        }
    }

    if let Some(rate) = settings.playback_rate {
        if !(0.25..=4.0).contains(&rate) {
            return Err(SettingsError::InvalidPlaybackRate(rate));
        }
    }

    if let Some(intensity) = settings.noise_intensity {
        if !(0.0..=1.0).contains(&intensity) {
            return Err(SettingsError::InvalidNoiseIntensity(intensity));
        }
    }

    let limits = settings.cache_limits();
    if limits.max_entries == 0 || limits.evict_to >= limits.max_entries {
        return Err(SettingsError::InvalidCacheLimits {
            max_entries: limits.max_entries as u32,
            evict_to: limits.evict_to as u32,
        });
    }

    if settings.noise_kind == Some(NoiseKind::Custom)
        && settings
            .noise_file
            .as_ref()
            .is_none_or(|p| p.trim().is_empty())
    {
        return Err(SettingsError::MissingNoiseFile);
    }

    for (name, value) in [
        ("Speaker", &settings.default_speaker),
        ("Language", &settings.language),
        ("Aligner model", &settings.aligner_model),
    ] {
        if value.as_ref().is_some_and(|v| v.trim().is_empty()) {
            return Err(SettingsError::Empty(name));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = Settings::with_defaults();
        assert_eq!(settings.speed, Some(1.0));
        assert_eq!(settings.gap_sound, Some(GapSound::Beep));
        assert_eq!(settings.cache_max_entries, Some(500));
        assert_eq!(settings.cache_evict_to, Some(400));
        assert!(validate_settings(&settings).is_ok());
    }

    #[test]
    fn test_empty_settings_are_valid() {
        assert!(validate_settings(&Settings::default()).is_ok());
    }

    #[test]
    fn test_validate_speed_range() {
        let settings = Settings {
            speed: Some(3.0),
            ..Default::default()
        };
        assert!(matches!(
            validate_settings(&settings),
            Err(SettingsError::InvalidSpeed(_))
        ));
    }

    #[test]
    fn test_validate_gap_range() {
        let settings = Settings {
            gap_seconds: Some(-1.0),
            ..Default::default()
        };
        assert!(matches!(
            validate_settings(&settings),
            Err(SettingsError::InvalidGap(_))
        ));
    }

    #[test]
    fn test_validate_playback_rate_and_intensity() {
        let settings = Settings {
            playback_rate: Some(0.1),
            ..Default::default()
        };
        assert!(matches!(
            validate_settings(&settings),
            Err(SettingsError::InvalidPlaybackRate(_))
        ));

        let settings = Settings {
            noise_intensity: Some(1.5),
            ..Default::default()
        };
        assert!(matches!(
            validate_settings(&settings),
            Err(SettingsError::InvalidNoiseIntensity(_))
        ));
    }

    #[test]
    fn test_validate_cache_limits() {
        let settings = Settings {
            cache_max_entries: Some(100),
            cache_evict_to: Some(100),
            ..Default::default()
        };
        assert!(matches!(
            validate_settings(&settings),
            Err(SettingsError::InvalidCacheLimits {
                max_entries: 100,
                evict_to: 100
            })
        ));
    }

    #[test]
    fn test_custom_noise_needs_file() {
        let mut settings = Settings {
            noise_kind: Some(NoiseKind::Custom),
            ..Default::default()
        };
        assert!(matches!(
            validate_settings(&settings),
            Err(SettingsError::MissingNoiseFile)
        ));

        settings.noise_file = Some("rain.wav".to_string());
        assert!(validate_settings(&settings).is_ok());
    }

    #[test]
    fn test_validate_empty_language() {
        let settings = Settings {
            language: Some("  ".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            validate_settings(&settings),
            Err(SettingsError::Empty("Language"))
        ));
    }

    #[test]
    fn test_merge_settings() {
        let mut settings = Settings::with_defaults();
        let update = SettingsUpdate {
            speed: Some(Some(1.25)),
            gap_sound: Some(None),
            ..Default::default()
        };
        settings.merge(&update);

        assert_eq!(settings.speed, Some(1.25));
        assert_eq!(settings.gap_sound, None);
        assert_eq!(settings.gap_seconds, Some(DEFAULT_GAP_SECONDS)); // Unchanged
    }

    #[test]
    fn test_cache_limits_defaults() {
        assert_eq!(Settings::default().cache_limits(), CacheLimits::default());
    }

    #[test]
    fn test_parse_enums() {
        assert_eq!("Beep".parse::<GapSound>().unwrap(), GapSound::Beep);
        assert_eq!("gaussian".parse::<NoiseKind>().unwrap(), NoiseKind::Gaussian);
        assert!("pink".parse::<NoiseKind>().is_err());
    }
}
