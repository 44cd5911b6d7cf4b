//! Cache stats and clear handlers.

use anyhow::Result;
use parrot_core::{CacheNamespace, CacheStats};

use crate::bootstrap::CliContext;
use crate::presentation::format_bytes;

fn describe(name: &str, stats: &CacheStats) {
    println!(
        "{name:<6} {:>5} entries  {:>10}",
        stats.count,
        format_bytes(stats.total_size)
    );
    if let (Some(oldest), Some(newest)) = (stats.oldest_timestamp, stats.newest_timestamp) {
        let fmt = |ms: i64| {
            chrono::DateTime::from_timestamp_millis(ms)
                .map_or_else(|| ms.to_string(), |t| t.format("%Y-%m-%d %H:%M").to_string())
        };
        println!("       oldest {}, newest {}", fmt(oldest), fmt(newest));
    }
}

/// Print audio and text cache statistics.
pub async fn stats(ctx: &CliContext) -> Result<(CacheStats, CacheStats)> {
    let audio = ctx.cache.stats(CacheNamespace::Audio).await?;
    let text = ctx.cache.stats(CacheNamespace::Text).await?;
    let limits = ctx.cache.limits();

    describe("audio", &audio);
    describe("text", &text);
    println!(
        "Limit: {} entries per cache, trimmed to {} when exceeded",
        limits.max_entries, limits.evict_to
    );
    Ok((audio, text))
}

/// Clear one cache, or both when neither flag is set.
pub async fn clear(ctx: &CliContext, audio: bool, text: bool) -> Result<()> {
    let both = !audio && !text;
    if audio || both {
        ctx.cache.clear(CacheNamespace::Audio).await?;
        println!("✓ Audio cache cleared");
    }
    if text || both {
        ctx.cache.clear(CacheNamespace::Text).await?;
        println!("✓ Text cache cleared");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::testing::context_without_engines;
    use parrot_core::AudioPayload;

    #[tokio::test]
    async fn test_stats_and_selective_clear() {
        let ctx = context_without_engines().await;
        ctx.cache
            .put_audio("a", &AudioPayload::from_bytes(b"wav", vec![], 0.5))
            .await
            .unwrap();
        ctx.cache.put_text("t", "{}").await.unwrap();

        let (audio, text) = stats(&ctx).await.unwrap();
        assert_eq!((audio.count, text.count), (1, 1));

        clear(&ctx, false, true).await.unwrap();
        let (audio, text) = stats(&ctx).await.unwrap();
        assert_eq!((audio.count, text.count), (1, 0));

        clear(&ctx, false, false).await.unwrap();
        let (audio, _) = stats(&ctx).await.unwrap();
        assert_eq!(audio.count, 0);
    }
}
