use std::future::Future;
use std::pin::Pin;

use crate::error::StoreError;
use crate::types::Chunk;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Persistent home of embedded chunks, answering nearest-neighbor queries.
///
/// Implementations must be safe to call concurrently for different files.
pub trait VectorIndex: Send + Sync {
    /// Insert or replace chunks keyed by [`Chunk::id`]. Every chunk must carry an embedding.
    ///
    /// Returns the number of chunks inserted or updated.
    fn upsert(&self, chunks: Vec<Chunk>) -> BoxFuture<'_, Result<usize, StoreError>>;

    /// Return at most `limit` chunks ordered by descending score in `[0, 1]`.
    ///
    /// `language` restricts candidates before ranking and truncation. Returned
    /// chunks carry no embedding.
    fn search<'a>(
        &'a self,
        vector: Vec<f32>,
        limit: usize,
        language: Option<&'a str>,
    ) -> BoxFuture<'a, Result<Vec<(Chunk, f32)>, StoreError>>;

    /// Remove every chunk of `file_path`. Unknown files yield 0.
    fn delete_by_file<'a>(&'a self, file_path: &'a str) -> BoxFuture<'a, Result<usize, StoreError>>;
}

/// Cosine similarity clamped into `[0, 1]`.
///
/// Zero-norm vectors and vectors of different dimensions score 0.
#[must_use]
pub fn similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    (dot / (norm_a * norm_b)).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn similarity_identical() {
        assert!((similarity(&[1.0, 2.0], &[1.0, 2.0]) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn similarity_orthogonal() {
        assert!(similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < f32::EPSILON);
    }

    #[test]
    fn similarity_opposite_clamps_to_zero() {
        assert!(similarity(&[1.0, 0.0], &[-1.0, 0.0]).abs() < f32::EPSILON);
    }

    #[test]
    fn similarity_zero_vector() {
        assert!(similarity(&[0.0, 0.0], &[1.0, 0.0]).abs() < f32::EPSILON);
    }

    #[test]
    fn similarity_dimension_mismatch_is_zero() {
        // The shared prefix is identical; the extra dimension must not be ignored.
        assert!(similarity(&[1.0, 0.0], &[1.0, 0.0, 5.0]).abs() < f32::EPSILON);
        assert!(similarity(&[1.0], &[]).abs() < f32::EPSILON);
    }

    use proptest::prelude::*;

    proptest! {
        #[test]
        fn similarity_in_unit_range(
            a in proptest::collection::vec(-100.0f32..100.0, 1..16),
            b in proptest::collection::vec(-100.0f32..100.0, 1..16),
        ) {
            let s = similarity(&a, &b);
            prop_assert!((0.0..=1.0).contains(&s));
        }
    }
}
