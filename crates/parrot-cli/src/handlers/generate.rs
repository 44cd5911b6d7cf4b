//! Generate command handler.

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use parrot_core::services::{GenerationProgress, WordSource};
use parrot_core::{ContentRequest, GenerationOptions, GenerationService, Material, text_cache_key};

use crate::bootstrap::CliContext;
use crate::content::JsonFileContentSource;
use crate::presentation::format_duration;

/// Overrides for one generation run.
#[derive(Debug, Default)]
pub struct GenerateArgs {
    pub speaker: Option<String>,
    pub language: Option<String>,
}

/// Build a material from a content file, synthesize it and store it.
pub async fn execute(ctx: &CliContext, content: &Path, args: GenerateArgs) -> Result<Material> {
    let synthesizer = ctx.require_synthesizer()?;
    let raw = tokio::fs::read_to_string(content)
        .await
        .map_err(|e| crate::CliError::Io(format!("{}: {e}", content.display())))?;

    let settings = ctx.settings.get().await?;
    let mut options = GenerationOptions::from(&settings);
    if args.speaker.is_some() {
        options.speaker = args.speaker;
    }
    if let Some(language) = args.language {
        options.language = language;
    }

    // The file digest keeps edited files from hitting stale cached content.
    let stem = content
        .file_stem()
        .map_or_else(|| "content".into(), |s| s.to_string_lossy());
    let request = ContentRequest {
        topic: format!("{stem} ({})", &text_cache_key(&raw, "file")[..12]),
        language: Some(options.language.clone()),
        difficulty: None,
    };

    let mut service = GenerationService::new(
        Arc::new(JsonFileContentSource::new(content)),
        synthesizer,
        ctx.decoder.clone(),
        ctx.cache.clone(),
    );
    if let Some(aligner) = &ctx.aligner {
        service = service.with_aligner(aligner.clone());
    }

    let on_progress = |p: GenerationProgress| {
        tracing::info!(stage = ?p.stage, completed = p.completed, total = p.total, "Generating");
    };
    let (mut material, report) = service.generate(&request, &options, &on_progress).await?;
    ctx.materials.save(&mut material).await?;

    println!("✓ Generated \"{}\" ({})", material.title, material.id);
    println!(
        "  {} chunks, {} long, voice {}",
        material.chunks.len(),
        format_duration(material.duration),
        report.speaker
    );
    match report.word_source {
        WordSource::Aligner => println!("  Word timings from the forced aligner"),
        WordSource::Synthesizer => println!("  Word timings from the synthesizer"),
        WordSource::None => println!("  No word timings; highlighting disabled"),
    }
    if !report.unaligned.is_empty() {
        println!("  Chunks without words: {:?}", report.unaligned);
    }

    Ok(material)
}
