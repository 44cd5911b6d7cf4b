//! Material service - CRUD, cascade delete and transfer formats.

use std::sync::Arc;

use crate::cache::CacheStore;
use crate::codec::{self, CompressedMaterial};
use crate::domain::Material;
use crate::ports::{Collection, CoreError, KvStore, RepositoryError};
use crate::transfer::{ExportBundle, parse_import};

/// Service for material operations.
///
/// Materials are stored as JSON in the `materials` collection, keyed by id.
pub struct MaterialService {
    store: Arc<dyn KvStore>,
    cache: Arc<CacheStore>,
}

impl MaterialService {
    pub fn new(store: Arc<dyn KvStore>, cache: Arc<CacheStore>) -> Self {
        Self { store, cache }
    }

    /// List all materials, newest first.
    pub async fn list(&self) -> Result<Vec<Material>, CoreError> {
        let rows = self.store.get_all(Collection::Materials).await?;
        let mut materials = Vec::with_capacity(rows.len());
        for (key, raw) in rows {
            match serde_json::from_str::<Material>(&raw) {
                Ok(m) => materials.push(m),
                Err(e) => {
                    tracing::warn!(material_id = %key, error = %e, "Skipping unreadable material");
                }
            }
        }
        materials.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(materials)
    }

    /// Get a material by id, `None` when absent.
    pub async fn get(&self, id: &str) -> Result<Option<Material>, CoreError> {
        match self.store.get(Collection::Materials, id).await? {
            Some(raw) => Ok(Some(
                serde_json::from_str(&raw).map_err(RepositoryError::from)?,
            )),
            None => Ok(None),
        }
    }

    /// Get a material by id. Returns error if not found.
    pub async fn find(&self, id: &str) -> Result<Material, CoreError> {
        self.get(id)
            .await?
            .ok_or_else(|| RepositoryError::NotFound(format!("material {id}")).into())
    }

    /// Insert or replace a material. Missing ids are generated.
    pub async fn save(&self, material: &mut Material) -> Result<(), CoreError> {
        material.ensure_ids();
        let raw = serde_json::to_string(material).map_err(RepositoryError::from)?;
        self.store
            .put(Collection::Materials, &material.id, &raw)
            .await?;
        tracing::debug!(material_id = %material.id, chunks = material.chunks.len(), "Material saved");
        Ok(())
    }

    /// Delete a material and its chunk audio cache entries.
    ///
    /// Cache cleanup failures are logged; the material is deleted regardless.
    pub async fn delete(&self, id: &str) -> Result<Material, CoreError> {
        let material = self.find(id).await?;

        match self.cache.delete_material_entries(&material).await {
            Ok(removed) => {
                tracing::debug!(material_id = %id, removed, "Cascade-deleted cache entries");
            }
            Err(e) => {
                tracing::warn!(material_id = %id, error = %e, "Failed to delete cache entries");
            }
        }

        self.store.delete(Collection::Materials, id).await?;
        tracing::info!(material_id = %id, title = %material.title, "Material deleted");
        Ok(material)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Transfer
    // ─────────────────────────────────────────────────────────────────────────

    /// Build an export bundle of the given materials, or all of them.
    pub async fn export(&self, ids: Option<&[String]>) -> Result<ExportBundle, CoreError> {
        let materials = match ids {
            Some(ids) => {
                let mut out = Vec::with_capacity(ids.len());
                for id in ids {
                    out.push(self.find(id).await?);
                }
                out
            }
            None => self.list().await?,
        };
        Ok(ExportBundle::new(materials))
    }

    /// Import a bulk bundle or single material.
    ///
    /// The whole file is validated before anything is written, and a storage
    /// failure part way through removes what this call had already written.
    pub async fn import_json(&self, json: &str) -> Result<Vec<String>, CoreError> {
        let materials = parse_import(json)?;

        let mut written: Vec<String> = Vec::with_capacity(materials.len());
        for mut material in materials {
            if let Err(e) = self.save(&mut material).await {
                for id in &written {
                    if let Err(rollback) = self.store.delete(Collection::Materials, id).await {
                        tracing::warn!(material_id = %id, error = %rollback, "Import rollback failed");
                    }
                }
                return Err(e);
            }
            written.push(material.id);
        }

        tracing::info!(count = written.len(), "Materials imported");
        Ok(written)
    }

    /// Compress a stored material for sharing.
    pub async fn pack(&self, id: &str) -> Result<CompressedMaterial, CoreError> {
        let material = self.find(id).await?;
        Ok(codec::compress(&material)?)
    }

    /// Decompress a shared material and store it.
    pub async fn unpack(&self, data: &str) -> Result<Material, CoreError> {
        let mut material = codec::decompress(data)?;
        self.save(&mut material).await?;
        Ok(material)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{AudioPayload, SynthesisMode, audio_cache_key, material_track_key};
    use crate::domain::{Chunk, VoiceConfig};
    use crate::ports::MemoryKvStore;

    fn service() -> (Arc<MemoryKvStore>, MaterialService) {
        let kv = Arc::new(MemoryKvStore::new());
        let cache = Arc::new(CacheStore::new(kv.clone()));
        (kv.clone(), MaterialService::new(kv, cache))
    }

    fn material(title: &str) -> Material {
        let mut m = Material::new(title);
        m.chunks = vec![Chunk::new("uno"), Chunk::new("dos")];
        m
    }

    #[tokio::test]
    async fn test_save_get_list() {
        let (_, svc) = service();
        let mut a = material("a");
        let mut b = material("b");
        b.created_at = a.created_at + chrono::Duration::seconds(5);
        svc.save(&mut a).await.unwrap();
        svc.save(&mut b).await.unwrap();

        assert_eq!(svc.find(&a.id).await.unwrap(), a);
        let titles: Vec<_> = svc.list().await.unwrap().into_iter().map(|m| m.title).collect();
        assert_eq!(titles, vec!["b", "a"]);
        assert!(svc.get("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_find_missing_is_not_found() {
        let (_, svc) = service();
        assert!(matches!(
            svc.find("nope").await,
            Err(CoreError::Repository(RepositoryError::NotFound(_)))
        ));
    }

    #[tokio::test]
    async fn test_delete_cascades_to_cache() {
        let (kv, svc) = service();
        let mut m = material("m");
        m.voice_config = Some(VoiceConfig {
            speaker: "ana".to_string(),
            speed: 1.0,
            generated_at: chrono::Utc::now(),
        });
        svc.save(&mut m).await.unwrap();
        let clip = AudioPayload::from_bytes(b"x", vec![], 0.1);
        svc.cache
            .put_audio(&material_track_key(&m).unwrap(), &clip)
            .await
            .unwrap();
        for chunk in &m.chunks {
            let key = audio_cache_key(&chunk.text, "ana", SynthesisMode::Chunk, 1.0);
            svc.cache.put_chunk_audio(&key, &chunk.id, &clip).await.unwrap();
        }
        assert_eq!(kv.count(Collection::AudioCache), 3);

        svc.delete(&m.id).await.unwrap();

        assert_eq!(kv.count(Collection::AudioCache), 0);
        assert_eq!(kv.count(Collection::Materials), 0);
    }

    #[tokio::test]
    async fn test_delete_removes_on_demand_entries_of_imported_material() {
        let (kv, svc) = service();
        let mut m = material("sin voz");
        svc.save(&mut m).await.unwrap();
        assert!(m.voice_config.is_none());
        for chunk in &m.chunks {
            let key = audio_cache_key(&chunk.text, "ana", SynthesisMode::Chunk, 1.0);
            svc.cache
                .put_chunk_audio(&key, &chunk.id, &AudioPayload::from_bytes(b"x", vec![], 0.1))
                .await
                .unwrap();
        }

        svc.delete(&m.id).await.unwrap();

        assert_eq!(kv.count(Collection::AudioCache), 0);
    }

    #[tokio::test]
    async fn test_import_rejects_without_partial_apply() {
        let (kv, svc) = service();
        let err = svc
            .import_json(r#"{"materials":[{"title":"ok","chunks":[]},{"nope":true}]}"#)
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Import(_)));
        assert_eq!(kv.count(Collection::Materials), 0);

        assert!(svc.import_json(r#"{"foo":1}"#).await.is_err());
    }

    #[tokio::test]
    async fn test_export_then_import() {
        let (_, source) = service();
        let mut m = material("shared");
        source.save(&mut m).await.unwrap();
        let bundle = source.export(None).await.unwrap();
        let json = serde_json::to_string(&bundle).unwrap();

        let (kv, target) = service();
        let ids = target.import_json(&json).await.unwrap();
        assert_eq!(ids, vec![m.id.clone()]);
        assert_eq!(kv.count(Collection::Materials), 1);
        assert_eq!(target.find(&m.id).await.unwrap().title, "shared");
    }

    #[tokio::test]
    async fn test_export_unknown_id_fails() {
        let (_, svc) = service();
        assert!(svc.export(Some(&["ghost".to_string()])).await.is_err());
    }

    #[tokio::test]
    async fn test_pack_and_unpack() {
        let (_, source) = service();
        let mut m = material("packed");
        source.save(&mut m).await.unwrap();
        let packed = source.pack(&m.id).await.unwrap();

        let (_, target) = service();
        let unpacked = target.unpack(&packed.data).await.unwrap();
        assert_eq!(unpacked, m);
        assert!(target.get(&m.id).await.unwrap().is_some());
    }
}
