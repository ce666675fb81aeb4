use std::future::Future;

use crate::error::EmbedError;

/// Capability that turns text into fixed-width vectors.
///
/// Dimensionality is defined by the backend; callers pass vectors through
/// without inspecting them.
pub trait EmbeddingProvider: Send + Sync {
    /// Embed a single text.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend is unreachable or the response is malformed.
    fn embed(&self, text: &str) -> impl Future<Output = Result<Vec<f32>, EmbedError>> + Send;

    /// Embed `texts` in order, returning exactly one vector per input.
    ///
    /// The batch is atomic: either every vector is returned or the call fails.
    /// The default implementation embeds one text at a time and aborts on the
    /// first failure.
    ///
    /// # Errors
    ///
    /// Returns an error if any text fails to embed.
    fn embed_batch(
        &self,
        texts: &[String],
    ) -> impl Future<Output = Result<Vec<Vec<f32>>, EmbedError>> + Send {
        async move {
            let mut vectors = Vec::with_capacity(texts.len());
            for text in texts {
                vectors.push(self.embed(text).await?);
            }
            Ok(vectors)
        }
    }

    fn name(&self) -> &str;
}

/// Check that a backend honored the one-vector-per-text contract.
///
/// # Errors
///
/// Returns [`EmbedError::BatchSize`] when the counts differ.
pub fn ensure_batch_len(expected: usize, vectors: &[Vec<f32>]) -> Result<(), EmbedError> {
    if vectors.len() == expected {
        Ok(())
    } else {
        Err(EmbedError::BatchSize {
            expected,
            actual: vectors.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct LengthProvider;

    impl EmbeddingProvider for LengthProvider {
        #[allow(clippy::cast_precision_loss)]
        async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedError> {
            if text == "boom" {
                return Err(EmbedError::Other("boom".into()));
            }
            Ok(vec![text.len() as f32])
        }

        fn name(&self) -> &'static str {
            "length"
        }
    }

    #[tokio::test]
    async fn default_batch_preserves_order() {
        let texts = vec!["a".to_string(), "abc".to_string(), "ab".to_string()];
        let vectors = LengthProvider.embed_batch(&texts).await.unwrap();
        assert_eq!(vectors, vec![vec![1.0], vec![3.0], vec![2.0]]);
    }

    #[tokio::test]
    async fn default_batch_fails_whole_batch() {
        let texts = vec!["a".to_string(), "boom".to_string(), "ab".to_string()];
        let err = LengthProvider.embed_batch(&texts).await.unwrap_err();
        assert!(matches!(err, EmbedError::Other(_)));
    }

    #[tokio::test]
    async fn default_batch_empty_input() {
        let vectors = LengthProvider.embed_batch(&[]).await.unwrap();
        assert!(vectors.is_empty());
    }

    #[test]
    fn ensure_batch_len_detects_mismatch() {
        assert!(ensure_batch_len(2, &[vec![1.0], vec![2.0]]).is_ok());
        let err = ensure_batch_len(3, &[vec![1.0]]).unwrap_err();
        assert!(matches!(
            err,
            EmbedError::BatchSize {
                expected: 3,
                actual: 1
            }
        ));
    }
}
