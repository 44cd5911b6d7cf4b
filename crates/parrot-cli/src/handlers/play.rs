//! Play command handler.

use std::sync::Arc;

use anyhow::Result;
use parrot_core::{Material, NoiseKind};
use parrot_voice::{PlaybackConfig, PlaybackEngine, PlaybackEvent, PlaybackOutcome, RodioSink};
use tokio::task::JoinHandle;

use crate::bootstrap::CliContext;
use crate::error::CliError;
use crate::presentation::truncate_string;

/// The material with chunks before `from` removed.
pub fn material_from(material: &Material, from: usize) -> Result<Material, CliError> {
    if from > 0 && from >= material.chunks.len() {
        return Err(CliError::Core(format!(
            "start chunk {from} is out of range ({} chunks)",
            material.chunks.len()
        )));
    }
    let mut trimmed = material.clone();
    trimmed.chunks.drain(..from);
    Ok(trimmed)
}

/// Wait for the event printer, logging if it panicked or was aborted.
async fn join_printer(printer: JoinHandle<()>) -> bool {
    match printer.await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(error = %e, "Playback event printer failed");
            false
        }
    }
}

/// Play a stored material until it ends or Ctrl+C is pressed.
pub async fn execute(ctx: &CliContext, id: &str, from: usize) -> Result<PlaybackOutcome> {
    let material = material_from(&ctx.materials.find(id).await?, from)?;
    let settings = ctx.settings.get().await?;

    let sink = RodioSink::spawn().map_err(|e| CliError::Playback(e.to_string()))?;
    let (engine, mut events) = PlaybackEngine::new(
        Arc::new(sink),
        ctx.decoder.clone(),
        ctx.cache.clone(),
        PlaybackConfig::from(&settings),
    );
    let engine = match ctx.synthesizer.clone() {
        Some(synthesizer) => engine.with_synthesizer(synthesizer),
        None => engine,
    };

    let custom_noise = match (&settings.noise_kind, &settings.noise_file) {
        (Some(NoiseKind::Custom), Some(path)) => match tokio::fs::read(path).await {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                tracing::warn!(path = %path, error = %e, "Cannot read noise file, using white noise");
                None
            }
        },
        _ => None,
    };
    if let Err(e) = engine.start_noise(custom_noise.as_deref()) {
        tracing::warn!(error = %e, "Background noise unavailable");
    }

    let texts: Vec<(String, String)> = material
        .chunks
        .iter()
        .map(|c| (c.id.clone(), c.text.clone()))
        .collect();
    let printer = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            match event {
                PlaybackEvent::StateChanged(state) => tracing::debug!(?state, "Playback state"),
                PlaybackEvent::Progress { .. } => {}
                PlaybackEvent::ChunkFinished { chunk_id } => {
                    if let Some(index) = texts.iter().position(|(id, _)| *id == chunk_id) {
                        println!("[{}] {}", index + from + 1, truncate_string(&texts[index].1, 72));
                    }
                }
                PlaybackEvent::Error { chunk_id, message } => {
                    eprintln!("✗ Chunk {chunk_id}: {message}");
                }
            }
        }
    });

    println!("▶ {} ({} chunks) - Ctrl+C to stop", material.title, material.chunks.len());
    let outcome = {
        let playing = engine.play_material(&material);
        tokio::pin!(playing);
        tokio::select! {
            result = &mut playing => result,
            _ = tokio::signal::ctrl_c() => {
                engine.stop();
                playing.await
            }
        }
    };
    engine.stop_noise();
    drop(engine);
    join_printer(printer).await;

    let outcome = outcome.map_err(|e| CliError::Playback(e.to_string()))?;
    match outcome {
        PlaybackOutcome::Completed => println!("✓ Finished"),
        PlaybackOutcome::Stopped => println!("■ Stopped"),
    }
    Ok(outcome)
}
