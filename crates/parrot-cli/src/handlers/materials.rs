//! List and delete handlers.

use anyhow::Result;
use parrot_core::Material;

use crate::bootstrap::CliContext;
use crate::presentation::{format_duration, print_separator, truncate_string};

/// Print stored materials, newest first.
pub async fn list(ctx: &CliContext) -> Result<Vec<Material>> {
    let materials = ctx.materials.list().await?;

    if materials.is_empty() {
        println!("No materials stored.");
        println!("Use 'parrot generate --content <file>' or 'parrot import <file>' to add one.");
        return Ok(materials);
    }

    println!(
        "{:<36}  {:<28} {:>6} {:>6} {:<5} Created",
        "ID", "Title", "Chunks", "Length", "Audio"
    );
    print_separator(100);
    for m in &materials {
        println!(
            "{:<36}  {:<28} {:>6} {:>6} {:<5} {}",
            m.id,
            truncate_string(&m.title, 28),
            m.chunks.len(),
            format_duration(m.duration),
            if m.tts_generated { "yes" } else { "no" },
            m.created_at.format("%Y-%m-%d %H:%M"),
        );
    }
    Ok(materials)
}

/// Delete a material and its cached audio.
pub async fn delete(ctx: &CliContext, id: &str) -> Result<Material> {
    let material = ctx.materials.delete(id).await?;
    println!("✓ Deleted \"{}\"", material.title);
    Ok(material)
}
