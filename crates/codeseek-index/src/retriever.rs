//! Semantic search and budgeted context assembly.

use std::sync::Arc;

use codeseek_embed::EmbeddingProvider;
use codeseek_store::{Chunk, VectorIndex};

use crate::config::RetrievalConfig;
use crate::error::Result;
use crate::events::{IndexEvent, IndexListener, Listeners};

/// One ranked hit. Never carries the chunk's embedding.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResult {
    pub chunk: Chunk,
    /// Cosine similarity in `[0, 1]`.
    pub score: f32,
}

impl SearchResult {
    /// Score as a percentage rounded to two decimals: `0.87654` → `87.65`.
    #[must_use]
    pub fn relevance_percentage(&self) -> f64 {
        (f64::from(self.score) * 10_000.0).round() / 100.0
    }
}

/// Header line plus chunk body, as it appears in assembled context.
#[must_use]
pub fn format_block(chunk: &Chunk) -> String {
    format!(
        "// {}:{}-{}\n{}",
        chunk.file_path, chunk.start_line, chunk.end_line, chunk.content
    )
}

/// Greedily pack results in rank order until the next block would exceed
/// `char_limit` characters.
///
/// Packing stops at the first block that does not fit, even if a later,
/// smaller block would. Separators between blocks are not counted.
#[must_use]
pub fn pack_context(results: &[SearchResult], char_limit: usize) -> String {
    pack_blocks(results, char_limit).0
}

fn pack_blocks(results: &[SearchResult], char_limit: usize) -> (String, usize) {
    let mut blocks = Vec::new();
    let mut used = 0usize;

    for result in results {
        let block = format_block(&result.chunk);
        let size = block.chars().count();
        if used + size > char_limit {
            break;
        }
        used += size;
        blocks.push(block);
    }

    let count = blocks.len();
    (blocks.join("\n\n"), count)
}

/// Answers queries against whatever the indexer has stored.
pub struct CodeRetriever<P: EmbeddingProvider> {
    store: Arc<dyn VectorIndex>,
    provider: Arc<P>,
    config: RetrievalConfig,
    listeners: Listeners,
}

impl<P: EmbeddingProvider> CodeRetriever<P> {
    /// # Errors
    ///
    /// Returns [`crate::IndexError::Config`] if `config` fails validation.
    pub fn new(
        store: Arc<dyn VectorIndex>,
        provider: Arc<P>,
        config: RetrievalConfig,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            store,
            provider,
            config,
            listeners: Listeners::default(),
        })
    }

    #[must_use]
    pub fn with_listener(mut self, listener: Arc<dyn IndexListener>) -> Self {
        self.listeners.push(listener);
        self
    }

    #[must_use]
    pub fn config(&self) -> &RetrievalConfig {
        &self.config
    }

    /// Embed `query` once and return up to `limit` hits, best first.
    ///
    /// A `language` filter is applied by the store before the limit.
    ///
    /// # Errors
    ///
    /// Returns an error if embedding or the store search fails.
    pub async fn search(
        &self,
        query: &str,
        limit: usize,
        language: Option<&str>,
    ) -> Result<Vec<SearchResult>> {
        let vector = self.provider.embed(query).await?;
        let hits = self.store.search(vector, limit, language).await?;

        let results: Vec<SearchResult> = hits
            .into_iter()
            .map(|(chunk, score)| SearchResult { chunk, score })
            .collect();

        tracing::debug!(limit, ?language, results = results.len(), "search completed");
        self.listeners.notify(&IndexEvent::SearchCompleted {
            query,
            results: results.len(),
        });
        Ok(results)
    }

    /// [`search`](Self::search) with the configured default limit and no filter.
    ///
    /// # Errors
    ///
    /// Same as [`search`](Self::search).
    pub async fn search_default(&self, query: &str) -> Result<Vec<SearchResult>> {
        self.search(query, self.config.default_limit, None).await
    }

    /// Assemble the best-ranked chunks into one prompt-ready string of at
    /// most `max_tokens * chars_per_token` characters (blank-line separators
    /// excluded). Empty when nothing fits.
    ///
    /// # Errors
    ///
    /// Returns an error if embedding or the store search fails.
    pub async fn build_context(
        &self,
        query: &str,
        max_tokens: usize,
        language: Option<&str>,
    ) -> Result<String> {
        let results = self
            .search(query, self.config.context_candidates, language)
            .await?;
        let char_limit = self.config.char_limit(max_tokens);
        let (context, blocks) = pack_blocks(&results, char_limit);

        let chars = context.chars().count();
        tracing::debug!(
            candidates = results.len(),
            blocks,
            chars,
            char_limit,
            "context assembled"
        );
        self.listeners.notify(&IndexEvent::ContextBuilt {
            query,
            blocks,
            chars,
        });
        Ok(context)
    }

    /// [`build_context`](Self::build_context) with the configured default
    /// token budget and no filter.
    ///
    /// # Errors
    ///
    /// Same as [`build_context`](Self::build_context).
    pub async fn build_context_default(&self, query: &str) -> Result<String> {
        self.build_context(query, self.config.default_max_tokens, None)
            .await
    }
}

impl<P: EmbeddingProvider> std::fmt::Debug for CodeRetriever<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CodeRetriever")
            .field("provider", &self.provider.name())
            .field("config", &self.config)
            .field("listeners", &self.listeners)
            .finish_non_exhaustive()
    }
}
