//! Test-only deterministic embedding provider.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::error::EmbedError;
use crate::provider::EmbeddingProvider;

/// Bag-of-words embedder over a fixed vocabulary.
///
/// Each dimension counts occurrences of one vocabulary word, so texts sharing
/// words land close together under cosine similarity. With an empty
/// vocabulary every text maps to the same unit vector.
#[derive(Debug, Clone, Default)]
pub struct MockEmbedder {
    vocabulary: Vec<String>,
    pub fail: bool,
    embed_calls: Arc<AtomicUsize>,
    batch_calls: Arc<AtomicUsize>,
}

impl MockEmbedder {
    #[must_use]
    pub fn with_vocabulary(words: &[&str]) -> Self {
        Self {
            vocabulary: words.iter().map(|w| w.to_lowercase()).collect(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// Number of `embed` calls served (batches not included).
    #[must_use]
    pub fn embed_calls(&self) -> usize {
        self.embed_calls.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn batch_calls(&self) -> usize {
        self.batch_calls.load(Ordering::SeqCst)
    }

    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn vector_for(&self, text: &str) -> Vec<f32> {
        if self.vocabulary.is_empty() {
            return vec![1.0];
        }
        let lowered = text.to_lowercase();
        let tokens: Vec<&str> = lowered
            .split(|c: char| !c.is_alphanumeric() && c != '_')
            .filter(|t| !t.is_empty())
            .collect();
        self.vocabulary
            .iter()
            .map(|word| tokens.iter().filter(|t| **t == word.as_str()).count() as f32)
            .collect()
    }
}

impl EmbeddingProvider for MockEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedError> {
        self.embed_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(EmbedError::Other("mock embedding error".into()));
        }
        Ok(self.vector_for(text))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbedError> {
        self.batch_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(EmbedError::Other("mock embedding error".into()));
        }
        Ok(texts.iter().map(|t| self.vector_for(t)).collect())
    }

    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "mock"
    }
}
