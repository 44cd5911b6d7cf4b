//! Content-addressed persistent cache for synthesized audio and text.
//!
//! Entries live in the `audioCache` and `textCache` collections of the
//! [`KvStore`]. Each entry records an insertion timestamp and its payload
//! size; once a namespace grows past [`CacheLimits::max_entries`] the oldest
//! entries are evicted down to [`CacheLimits::evict_to`] in one pass.
//!
//! Decoded PCM for recently played chunks is kept separately in a small
//! in-memory [`HotCache`] that is never persisted.

pub mod hot;

use std::collections::HashSet;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

pub use hot::{DEFAULT_HOT_CAPACITY, HotCache};

use crate::audio::PcmBuffer;
use crate::domain::{Material, WordTimestamp};
use crate::ports::{Collection, KvStore, RepositoryError};

/// Default entry count that triggers eviction.
pub const DEFAULT_MAX_ENTRIES: usize = 500;
/// Default entry count eviction shrinks a namespace to.
pub const DEFAULT_EVICT_TO: usize = 400;

// ── Keys ───────────────────────────────────────────────────────────────────

/// What an audio entry was synthesized for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SynthesisMode {
    /// One continuous track for a whole material.
    Full,
    /// A single chunk synthesized on demand.
    Chunk,
}

impl SynthesisMode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Chunk => "chunk",
        }
    }
}

fn digest(parts: &[&str]) -> String {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part.as_bytes());
        // Separator byte so ("ab","c") and ("a","bc") differ.
        hasher.update([0x1f]);
    }
    hasher
        .finalize()
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}

/// Cache key for synthesized audio.
#[must_use]
pub fn audio_cache_key(text: &str, speaker: &str, mode: SynthesisMode, speed: f32) -> String {
    let speed = format!("{speed:.2}");
    digest(&["audio", text, speaker, mode.as_str(), &speed])
}

/// Cache key for generated text.
#[must_use]
pub fn text_cache_key(content: &str, language: &str) -> String {
    digest(&["text", content, language])
}

/// Key of the full track a generated material was sliced from.
///
/// Materials without a voice config were never synthesized as a whole.
#[must_use]
pub fn material_track_key(material: &Material) -> Option<String> {
    material.voice_config.as_ref().map(|voice| {
        audio_cache_key(
            &material.joined_chunk_text(),
            &voice.speaker,
            SynthesisMode::Full,
            voice.speed,
        )
    })
}

// ── Entries ────────────────────────────────────────────────────────────────

/// Cache namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheNamespace {
    Audio,
    Text,
}

impl CacheNamespace {
    #[must_use]
    pub const fn collection(self) -> Collection {
        match self {
            Self::Audio => Collection::AudioCache,
            Self::Text => Collection::TextCache,
        }
    }
}

/// Stored cache record, identical in shape for every namespace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry<P> {
    pub cache_key: String,
    pub payload: P,
    /// Insertion time in Unix milliseconds, strictly increasing per store.
    pub timestamp: i64,
    /// Serialized payload size in bytes.
    pub size: usize,
    /// Ids of the chunks this entry was synthesized for.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub owners: Vec<String>,
}

/// Metadata-only view used for eviction and stats.
#[derive(Debug, Deserialize)]
struct EntryMeta {
    #[serde(default)]
    timestamp: i64,
    #[serde(default)]
    size: usize,
    #[serde(default)]
    owners: Vec<String>,
}

/// Synthesized audio payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioPayload {
    /// Base64 audio bytes as returned by the synthesizer.
    pub audio: String,
    #[serde(default)]
    pub words: Vec<WordTimestamp>,
    #[serde(default)]
    pub duration_seconds: f64,
}

impl AudioPayload {
    pub fn from_bytes(audio: &[u8], words: Vec<WordTimestamp>, duration_seconds: f64) -> Self {
        Self {
            audio: BASE64.encode(audio),
            words,
            duration_seconds,
        }
    }

    /// Decoded audio bytes, or `None` when the stored base64 is corrupt.
    #[must_use]
    pub fn audio_bytes(&self) -> Option<Vec<u8>> {
        BASE64.decode(&self.audio).ok()
    }
}

/// Namespace summary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    pub count: usize,
    pub total_size: usize,
    pub oldest_timestamp: Option<i64>,
    pub newest_timestamp: Option<i64>,
}

/// Eviction thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheLimits {
    pub max_entries: usize,
    pub evict_to: usize,
}

impl CacheLimits {
    /// At least one entry kept, at least one evicted.
    #[must_use]
    pub fn corrected(self) -> Self {
        let max_entries = self.max_entries.max(1);
        Self {
            max_entries,
            evict_to: self.evict_to.min(max_entries - 1),
        }
    }
}

impl Default for CacheLimits {
    fn default() -> Self {
        Self {
            max_entries: DEFAULT_MAX_ENTRIES,
            evict_to: DEFAULT_EVICT_TO,
        }
    }
}

/// Cache failures.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Cache I/O failed: {0}")]
    Io(#[from] RepositoryError),

    #[error("Cache entry could not be encoded: {0}")]
    Encode(#[from] serde_json::Error),
}

// ── Store ──────────────────────────────────────────────────────────────────

/// Persistent cache over a [`KvStore`], plus an in-memory decoded-audio cache.
pub struct CacheStore {
    store: Arc<dyn KvStore>,
    limits: Mutex<CacheLimits>,
    last_timestamp: AtomicI64,
    evicting: tokio::sync::Mutex<()>,
    hot: Mutex<HotCache<String, Arc<PcmBuffer>>>,
}

impl CacheStore {
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self::with_limits(store, CacheLimits::default())
    }

    /// Limits with `evict_to >= max_entries` are corrected to evict at least
    /// one entry.
    pub fn with_limits(store: Arc<dyn KvStore>, limits: CacheLimits) -> Self {
        Self {
            store,
            limits: Mutex::new(limits.corrected()),
            last_timestamp: AtomicI64::new(0),
            evicting: tokio::sync::Mutex::new(()),
            hot: Mutex::new(HotCache::default()),
        }
    }

    #[must_use]
    pub fn limits(&self) -> CacheLimits {
        *self.limits.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replace the eviction thresholds and trim both namespaces to them.
    ///
    /// Returns the number of evicted entries.
    pub async fn set_limits(&self, limits: CacheLimits) -> Result<usize, CacheError> {
        let limits = limits.corrected();
        *self.limits.lock().unwrap_or_else(PoisonError::into_inner) = limits;
        tracing::debug!(max_entries = limits.max_entries, evict_to = limits.evict_to, "Cache limits changed");

        let audio = self.enforce_limits(CacheNamespace::Audio).await?;
        let text = self.enforce_limits(CacheNamespace::Text).await?;
        Ok(audio + text)
    }

    /// Next insertion timestamp: wall-clock milliseconds, bumped past the
    /// previous one so insertion order is total.
    fn next_timestamp(&self) -> i64 {
        let now = chrono::Utc::now().timestamp_millis();
        let mut prev = self.last_timestamp.load(Ordering::SeqCst);
        loop {
            let next = now.max(prev + 1);
            match self.last_timestamp.compare_exchange(
                prev,
                next,
                Ordering::SeqCst,
                Ordering::SeqCst,
            ) {
                Ok(_) => return next,
                Err(actual) => prev = actual,
            }
        }
    }

    async fn get_entry<P: DeserializeOwned>(
        &self,
        ns: CacheNamespace,
        key: &str,
    ) -> Result<Option<CacheEntry<P>>, CacheError> {
        let Some(raw) = self.store.get(ns.collection(), key).await? else {
            return Ok(None);
        };
        match serde_json::from_str(&raw) {
            Ok(entry) => Ok(Some(entry)),
            Err(e) => {
                tracing::warn!(
                    collection = %ns.collection(),
                    key,
                    error = %e,
                    "Ignoring unreadable cache entry"
                );
                Ok(None)
            }
        }
    }

    async fn put_entry<P: Serialize + Sync>(
        &self,
        ns: CacheNamespace,
        key: &str,
        payload: &P,
        owners: Vec<String>,
    ) -> Result<(), CacheError> {
        let size = serde_json::to_vec(payload)?.len();
        let entry = CacheEntry {
            cache_key: key.to_string(),
            payload,
            timestamp: self.next_timestamp(),
            size,
            owners,
        };
        let raw = serde_json::to_string(&entry)?;
        self.store.put(ns.collection(), key, &raw).await?;
        self.enforce_limits(ns).await?;
        Ok(())
    }

    pub async fn get_audio(&self, key: &str) -> Result<Option<AudioPayload>, CacheError> {
        Ok(self
            .get_entry::<AudioPayload>(CacheNamespace::Audio, key)
            .await?
            .map(|e| e.payload))
    }

    pub async fn put_audio(&self, key: &str, payload: &AudioPayload) -> Result<(), CacheError> {
        self.put_entry(CacheNamespace::Audio, key, payload, Vec::new())
            .await
    }

    /// Store audio synthesized for one chunk, recording the chunk as an owner
    /// so deleting its material removes the entry.
    ///
    /// Owners already recorded under the same key are kept.
    pub async fn put_chunk_audio(
        &self,
        key: &str,
        chunk_id: &str,
        payload: &AudioPayload,
    ) -> Result<(), CacheError> {
        let mut owners = match self.store.get(Collection::AudioCache, key).await? {
            Some(raw) => serde_json::from_str::<EntryMeta>(&raw)
                .map(|meta| meta.owners)
                .unwrap_or_default(),
            None => Vec::new(),
        };
        if !owners.iter().any(|o| o == chunk_id) {
            owners.push(chunk_id.to_string());
        }
        self.put_entry(CacheNamespace::Audio, key, payload, owners)
            .await
    }

    pub async fn get_text(&self, key: &str) -> Result<Option<String>, CacheError> {
        Ok(self
            .get_entry::<String>(CacheNamespace::Text, key)
            .await?
            .map(|e| e.payload))
    }

    pub async fn put_text(&self, key: &str, text: &str) -> Result<(), CacheError> {
        self.put_entry(CacheNamespace::Text, key, &text.to_string(), Vec::new())
            .await
    }

    async fn metas(&self, ns: CacheNamespace) -> Result<Vec<(String, EntryMeta)>, CacheError> {
        let entries = self.store.get_all(ns.collection()).await?;
        Ok(entries
            .into_iter()
            .map(|(key, raw)| {
                // Unreadable entries sort as oldest and go first.
                let meta = serde_json::from_str(&raw).unwrap_or(EntryMeta {
                    timestamp: 0,
                    size: raw.len(),
                    owners: Vec::new(),
                });
                (key, meta)
            })
            .collect())
    }

    /// Evict oldest entries once the namespace exceeds its cap.
    ///
    /// Returns the number of evicted entries.
    pub async fn enforce_limits(&self, ns: CacheNamespace) -> Result<usize, CacheError> {
        let _guard = self.evicting.lock().await;

        let limits = self.limits();
        let mut metas = self.metas(ns).await?;
        if metas.len() <= limits.max_entries {
            return Ok(0);
        }

        metas.sort_by(|(ka, a), (kb, b)| a.timestamp.cmp(&b.timestamp).then_with(|| ka.cmp(kb)));
        let excess = metas.len() - limits.evict_to;

        for (key, _) in metas.iter().take(excess) {
            self.store.delete(ns.collection(), key).await?;
        }

        tracing::info!(
            collection = %ns.collection(),
            evicted = excess,
            remaining = limits.evict_to,
            "Cache exceeded its cap, evicted oldest entries"
        );
        Ok(excess)
    }

    /// Count, total size and timestamp range of a namespace.
    pub async fn stats(&self, ns: CacheNamespace) -> Result<CacheStats, CacheError> {
        let metas = self.metas(ns).await?;
        let mut stats = CacheStats {
            count: metas.len(),
            ..CacheStats::default()
        };
        for (_, meta) in &metas {
            stats.total_size += meta.size;
            stats.oldest_timestamp = Some(
                stats
                    .oldest_timestamp
                    .map_or(meta.timestamp, |t| t.min(meta.timestamp)),
            );
            stats.newest_timestamp = Some(
                stats
                    .newest_timestamp
                    .map_or(meta.timestamp, |t| t.max(meta.timestamp)),
            );
        }
        Ok(stats)
    }

    /// Drop every entry in a namespace. Clearing audio also empties the
    /// decoded hot cache.
    pub async fn clear(&self, ns: CacheNamespace) -> Result<(), CacheError> {
        self.store.clear(ns.collection()).await?;
        if ns == CacheNamespace::Audio {
            self.hot_lock().clear();
        }
        tracing::info!(collection = %ns.collection(), "Cache cleared");
        Ok(())
    }

    /// Delete the audio entries and decoded buffers belonging to a material.
    ///
    /// Chunk entries shared with chunks of other materials lose this
    /// material's owners but stay. Returns the number of persistent entries
    /// removed.
    pub async fn delete_material_entries(&self, material: &Material) -> Result<usize, CacheError> {
        let chunk_ids: HashSet<&str> = material.chunks.iter().map(|c| c.id.as_str()).collect();
        let mut doomed: Vec<String> = material_track_key(material).into_iter().collect();

        for (key, raw) in self.store.get_all(Collection::AudioCache).await? {
            let Ok(meta) = serde_json::from_str::<EntryMeta>(&raw) else {
                continue;
            };
            if !meta.owners.iter().any(|o| chunk_ids.contains(o.as_str())) {
                continue;
            }
            let remaining: Vec<&String> = meta
                .owners
                .iter()
                .filter(|o| !chunk_ids.contains(o.as_str()))
                .collect();
            if remaining.is_empty() {
                doomed.push(key);
            } else {
                let mut entry: serde_json::Value = serde_json::from_str(&raw)?;
                if let Some(fields) = entry.as_object_mut() {
                    fields.insert("owners".to_string(), serde_json::json!(remaining));
                }
                self.store
                    .put(Collection::AudioCache, &key, &entry.to_string())
                    .await?;
            }
        }

        {
            let mut hot = self.hot_lock();
            for chunk in &material.chunks {
                hot.remove(&chunk.id);
            }
            for key in &doomed {
                hot.remove(key);
            }
        }

        let mut removed = 0;
        for key in &doomed {
            if self.store.delete(Collection::AudioCache, key).await? {
                removed += 1;
            }
        }
        tracing::debug!(material_id = %material.id, removed, "Deleted material cache entries");
        Ok(removed)
    }

    // ── Hot cache ──────────────────────────────────────────────────────────

    fn hot_lock(&self) -> std::sync::MutexGuard<'_, HotCache<String, Arc<PcmBuffer>>> {
        self.hot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Decoded buffer for `key`, if still in memory.
    #[must_use]
    pub fn decoded(&self, key: &str) -> Option<Arc<PcmBuffer>> {
        self.hot_lock().get(&key.to_string())
    }

    pub fn remember_decoded(&self, key: impl Into<String>, buffer: Arc<PcmBuffer>) {
        self.hot_lock().insert(key.into(), buffer);
    }

    /// Drop a decoded buffer whose source audio changed.
    pub fn forget_decoded(&self, key: &str) {
        self.hot_lock().remove(&key.to_string());
    }

    #[must_use]
    pub fn decoded_len(&self) -> usize {
        self.hot_lock().len()
    }
}

impl std::fmt::Debug for CacheStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheStore")
            .field("limits", &self.limits())
            .field("decoded", &self.decoded_len())
            .finish_non_exhaustive()
    }
}
