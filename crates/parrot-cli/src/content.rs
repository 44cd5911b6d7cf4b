//! Content source reading pre-written content from a JSON file.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use parrot_core::ports::{ContentError, ContentRequest, ContentSource, GeneratedContent};

/// [`ContentSource`] backed by a JSON file shaped like [`GeneratedContent`].
///
/// The request topic only labels logs; the file decides the content.
pub struct JsonFileContentSource {
    path: PathBuf,
}

impl JsonFileContentSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl ContentSource for JsonFileContentSource {
    async fn generate(&self, request: &ContentRequest) -> Result<GeneratedContent, ContentError> {
        let raw = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            ContentError::Source(format!("cannot read {}: {e}", self.path.display()))
        })?;
        let content: GeneratedContent = serde_json::from_str(&raw).map_err(|e| {
            ContentError::Source(format!("invalid content file {}: {e}", self.path.display()))
        })?;
        tracing::debug!(topic = %request.topic, chunks = content.chunks.len(), "Loaded content file");
        Ok(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_reads_content_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("content.json");
        std::fs::write(
            &path,
            r#"{"title":"Tienda","originalText":"Fui a la tienda.","chunks":[{"text":"Fui a la tienda.","translation":"I went to the store."}]}"#,
        )
        .unwrap();

        let content = JsonFileContentSource::new(&path)
            .generate(&ContentRequest::default())
            .await
            .unwrap();
        assert_eq!(content.title, "Tienda");
        assert_eq!(content.chunks[0].translation.as_deref(), Some("I went to the store."));
    }

    #[tokio::test]
    async fn test_missing_file_is_source_error() {
        let source = JsonFileContentSource::new("/definitely/not/here.json");
        assert!(matches!(
            source.generate(&ContentRequest::default()).await,
            Err(ContentError::Source(_))
        ));
    }
}
