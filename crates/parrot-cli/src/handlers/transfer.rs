//! Import, export, pack and unpack handlers.

use std::path::Path;

use anyhow::Result;
use parrot_core::{CompressedMaterial, Material};

use crate::bootstrap::CliContext;
use crate::error::CliError;

async fn read_file(path: &Path) -> Result<String, CliError> {
    tokio::fs::read_to_string(path)
        .await
        .map_err(|e| CliError::Io(format!("{}: {e}", path.display())))
}

async fn write_file(path: &Path, contents: &str) -> Result<(), CliError> {
    tokio::fs::write(path, contents)
        .await
        .map_err(|e| CliError::Io(format!("{}: {e}", path.display())))
}

/// Import every material in `file`, or none of them.
pub async fn import(ctx: &CliContext, file: &Path) -> Result<Vec<String>> {
    let json = read_file(file).await?;
    let ids = ctx.materials.import_json(&json).await?;
    println!("✓ Imported {} material(s)", ids.len());
    Ok(ids)
}

/// Write the selected materials (all when `ids` is empty) to `out`.
pub async fn export(ctx: &CliContext, ids: &[String], out: &Path) -> Result<usize> {
    let selection = (!ids.is_empty()).then_some(ids);
    let bundle = ctx.materials.export(selection).await?;
    let json = serde_json::to_string_pretty(&bundle)?;
    write_file(out, &json).await?;
    println!("✓ Exported {} material(s) to {}", bundle.materials.len(), out.display());
    Ok(bundle.materials.len())
}

/// Compress a material; print it or write it to `out`.
pub async fn pack(ctx: &CliContext, id: &str, out: Option<&Path>) -> Result<CompressedMaterial> {
    let packed = ctx.materials.pack(id).await?;
    match out {
        Some(path) => {
            write_file(path, &packed.data).await?;
            println!(
                "✓ Packed {} → {} bytes ({:.0}%) into {}",
                packed.original_size,
                packed.compressed_size,
                packed.ratio() * 100.0,
                path.display()
            );
        }
        None => println!("{}", packed.data),
    }
    Ok(packed)
}

/// Store the material packed in `file`.
pub async fn unpack(ctx: &CliContext, file: &Path) -> Result<Material> {
    let data = read_file(file).await?;
    let material = ctx.materials.unpack(data.trim()).await?;
    println!("✓ Unpacked \"{}\" ({})", material.title, material.id);
    Ok(material)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::testing::context_without_engines;
    use parrot_core::Chunk;

    async fn seeded(title: &str) -> (CliContext, Material) {
        let ctx = context_without_engines().await;
        let mut material = Material::new(title);
        material.chunks = vec![Chunk::new("hola"), Chunk::new("adiós")];
        ctx.materials.save(&mut material).await.unwrap();
        (ctx, material)
    }

    #[tokio::test]
    async fn test_export_then_import_into_fresh_store() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("export.json");
        let (source, material) = seeded("exportar").await;

        assert_eq!(export(&source, &[], &out).await.unwrap(), 1);

        let target = context_without_engines().await;
        let ids = import(&target, &out).await.unwrap();
        assert_eq!(ids, vec![material.id.clone()]);
        assert_eq!(target.materials.find(&material.id).await.unwrap(), material);
    }

    #[tokio::test]
    async fn test_export_selected_ids() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("one.json");
        let (ctx, material) = seeded("uno").await;
        let mut other = Material::new("otro");
        ctx.materials.save(&mut other).await.unwrap();

        assert_eq!(export(&ctx, &[material.id.clone()], &out).await.unwrap(), 1);
        let written = std::fs::read_to_string(&out).unwrap();
        assert!(written.contains("\"uno\""));
        assert!(!written.contains("\"otro\""));
    }

    #[tokio::test]
    async fn test_import_rejects_unknown_shape() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("bad.json");
        std::fs::write(&file, r#"{"foo": 1}"#).unwrap();
        let ctx = context_without_engines().await;

        assert!(import(&ctx, &file).await.is_err());
        assert!(ctx.materials.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_pack_file_unpacks_elsewhere() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("shared.txt");
        let (source, material) = seeded("compartir").await;

        let packed = pack(&source, &material.id, Some(&file)).await.unwrap();
        assert!(packed.compressed_size > 0);

        let target = context_without_engines().await;
        let unpacked = unpack(&target, &file).await.unwrap();
        assert_eq!(unpacked, material);
    }
}
