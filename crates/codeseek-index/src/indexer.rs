//! Per-file indexing orchestrator: delete → chunk → embed → upsert.

use std::sync::Arc;

use codeseek_embed::EmbeddingProvider;
use codeseek_embed::provider::ensure_batch_len;
use codeseek_store::VectorIndex;

use crate::chunker::chunk_text;
use crate::config::ChunkerConfig;
use crate::error::Result;
use crate::events::{IndexEvent, IndexListener, Listeners};

/// Refreshes one file at a time in the vector index.
///
/// Holds no state besides its configuration. Calls for different files may
/// run concurrently; two concurrent calls for the same path may interleave
/// their delete and upsert steps, so callers must serialize those.
pub struct CodeIndexer<P: EmbeddingProvider> {
    store: Arc<dyn VectorIndex>,
    provider: Arc<P>,
    config: ChunkerConfig,
    listeners: Listeners,
}

impl<P: EmbeddingProvider> CodeIndexer<P> {
    #[must_use]
    pub fn new(store: Arc<dyn VectorIndex>, provider: Arc<P>, config: ChunkerConfig) -> Self {
        Self {
            store,
            provider,
            config,
            listeners: Listeners::default(),
        }
    }

    #[must_use]
    pub fn with_listener(mut self, listener: Arc<dyn IndexListener>) -> Self {
        self.listeners.push(listener);
        self
    }

    #[must_use]
    pub fn config(&self) -> &ChunkerConfig {
        &self.config
    }

    /// Replace every stored chunk of `file_path` with chunks of `content`.
    ///
    /// Old chunks are deleted first. If embedding or storing then fails, the
    /// file stays unindexed (never a mix of old and new chunks) until the
    /// caller retries. Returns the count reported by the store; 0 for empty
    /// or whitespace-only content, in which case neither the provider nor
    /// the store's upsert is called.
    ///
    /// # Errors
    ///
    /// Returns the provider or store error unchanged in kind.
    pub async fn index_file(&self, file_path: &str, content: &str, language: &str) -> Result<usize> {
        self.remove_file(file_path).await?;

        let mut chunks = chunk_text(file_path, content, language, &self.config);
        if chunks.is_empty() {
            tracing::debug!(file = file_path, "no content to index");
            return Ok(0);
        }

        let texts: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
        let vectors = self.provider.embed_batch(&texts).await?;
        ensure_batch_len(texts.len(), &vectors)?;

        for (chunk, vector) in chunks.iter_mut().zip(vectors) {
            chunk.embedding = Some(vector);
        }

        let stored = self.store.upsert(chunks).await?;
        tracing::debug!(file = file_path, chunks = stored, "file indexed");
        self.listeners.notify(&IndexEvent::FileIndexed {
            file_path,
            chunks: stored,
        });
        Ok(stored)
    }

    /// Drop every stored chunk of `file_path`, e.g. after the file was deleted.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub async fn remove_file(&self, file_path: &str) -> Result<usize> {
        let removed = self.store.delete_by_file(file_path).await?;
        if removed > 0 {
            tracing::debug!(file = file_path, removed, "stale chunks removed");
        }
        self.listeners
            .notify(&IndexEvent::FileCleared { file_path, removed });
        Ok(removed)
    }
}

impl<P: EmbeddingProvider> std::fmt::Debug for CodeIndexer<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CodeIndexer")
            .field("provider", &self.provider.name())
            .field("config", &self.config)
            .field("listeners", &self.listeners)
            .finish_non_exhaustive()
    }
}
