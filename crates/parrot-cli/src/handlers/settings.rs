//! Settings show/set handlers.

use anyhow::Result;
use parrot_core::{Settings, SettingsUpdate};

use crate::bootstrap::CliContext;
use crate::commands::SettingsArgs;

impl From<SettingsArgs> for SettingsUpdate {
    fn from(args: SettingsArgs) -> Self {
        Self {
            default_speaker: args.default_speaker.map(Some),
            speed: args.speed.map(Some),
            language: args.language.map(Some),
            aligner_model: args.aligner_model.map(Some),
            gap_seconds: args.gap_seconds.map(Some),
            gap_sound: args.gap_sound.map(Some),
            playback_rate: args.playback_rate.map(Some),
            noise_kind: args.noise_kind.map(Some),
            noise_intensity: args.noise_intensity.map(Some),
            noise_file: args.noise_file.map(Some),
            cache_max_entries: args.cache_max_entries.map(Some),
            cache_evict_to: args.cache_evict_to.map(Some),
        }
    }
}

fn print_settings(settings: &Settings) {
    let limits = settings.cache_limits();
    println!("  default_speaker:   {:?}", settings.default_speaker);
    println!("  speed:             {}", settings.effective_speed());
    println!("  language:          {}", settings.effective_language());
    println!("  aligner_model:     {}", settings.effective_aligner_model());
    println!("  gap_seconds:       {}", settings.effective_gap_seconds());
    println!("  gap_sound:         {:?}", settings.gap_sound.unwrap_or_default());
    println!("  playback_rate:     {}", settings.effective_playback_rate());
    println!("  noise_kind:        {:?}", settings.noise_kind.unwrap_or_default());
    println!("  noise_intensity:   {}", settings.effective_noise_intensity());
    println!("  noise_file:        {:?}", settings.noise_file);
    println!("  cache_max_entries: {}", limits.max_entries);
    println!("  cache_evict_to:    {}", limits.evict_to);
}

/// Print the current settings with defaults filled in.
pub async fn show(ctx: &CliContext) -> Result<Settings> {
    let settings = ctx.settings.get().await?;
    println!("Current settings:");
    print_settings(&settings);
    Ok(settings)
}

/// Apply the given fields; the stored settings are untouched on invalid input.
pub async fn set(ctx: &CliContext, args: SettingsArgs) -> Result<Settings> {
    let update = SettingsUpdate::from(args);
    if update == SettingsUpdate::default() {
        println!("No settings provided. Use --help to see available options.");
        return Ok(ctx.settings.get().await?);
    }

    let updated = ctx.settings.update(update).await?;
    println!("✓ Settings updated:");
    print_settings(&updated);
    Ok(updated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::testing::context_without_engines;
    use parrot_core::{GapSound, NoiseKind};

    #[tokio::test]
    async fn test_set_then_show() {
        let ctx = context_without_engines().await;
        let args = SettingsArgs {
            gap_seconds: Some(2.5),
            gap_sound: Some(GapSound::Beep),
            playback_rate: Some(1.5),
            ..SettingsArgs::default()
        };

        let updated = set(&ctx, args).await.unwrap();
        assert_eq!(updated.gap_seconds, Some(2.5));

        let shown = show(&ctx).await.unwrap();
        assert_eq!(shown.gap_sound, Some(GapSound::Beep));
        assert_eq!(shown.effective_playback_rate(), 1.5);
    }

    #[tokio::test]
    async fn test_invalid_value_is_rejected_and_not_stored() {
        let ctx = context_without_engines().await;
        let before = show(&ctx).await.unwrap();

        let args = SettingsArgs {
            speed: Some(3.0),
            ..SettingsArgs::default()
        };
        assert!(set(&ctx, args).await.is_err());

        let args = SettingsArgs {
            noise_kind: Some(NoiseKind::Custom),
            ..SettingsArgs::default()
        };
        assert!(set(&ctx, args).await.is_err());

        assert_eq!(show(&ctx).await.unwrap(), before);
    }

    #[tokio::test]
    async fn test_empty_set_changes_nothing() {
        let ctx = context_without_engines().await;
        let before = show(&ctx).await.unwrap();
        assert_eq!(set(&ctx, SettingsArgs::default()).await.unwrap(), before);
    }
}
