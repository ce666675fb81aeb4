use std::collections::HashMap;
use std::sync::RwLock;

use crate::error::StoreError;
use crate::types::Chunk;
use crate::vector_index::{BoxFuture, VectorIndex, similarity};

/// Brute-force index held in process memory.
///
/// Serves as the test double for the orchestrators and as the default backend
/// for one-shot runs.
pub struct InMemoryVectorIndex {
    chunks: RwLock<HashMap<String, Chunk>>,
}

impl InMemoryVectorIndex {
    #[must_use]
    pub fn new() -> Self {
        Self {
            chunks: RwLock::new(HashMap::new()),
        }
    }

    /// Total number of stored chunks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.chunks.read().map_or(0, |c| c.len())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Ids of the chunks stored for `file_path`, sorted.
    #[must_use]
    pub fn ids_for_file(&self, file_path: &str) -> Vec<String> {
        let Ok(chunks) = self.chunks.read() else {
            return Vec::new();
        };
        let mut ids: Vec<String> = chunks
            .values()
            .filter(|c| c.file_path == file_path)
            .map(|c| c.id.clone())
            .collect();
        ids.sort();
        ids
    }
}

impl Default for InMemoryVectorIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for InMemoryVectorIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryVectorIndex")
            .field("len", &self.len())
            .finish_non_exhaustive()
    }
}

impl VectorIndex for InMemoryVectorIndex {
    fn upsert(&self, chunks: Vec<Chunk>) -> BoxFuture<'_, Result<usize, StoreError>> {
        Box::pin(async move {
            if let Some(missing) = chunks.iter().find(|c| !c.is_embedded()) {
                return Err(StoreError::MissingEmbedding {
                    id: missing.id.clone(),
                });
            }
            let mut stored = self
                .chunks
                .write()
                .map_err(|e| StoreError::Upsert(e.to_string()))?;
            let count = chunks.len();
            for chunk in chunks {
                stored.insert(chunk.id.clone(), chunk);
            }
            Ok(count)
        })
    }

    fn search<'a>(
        &'a self,
        vector: Vec<f32>,
        limit: usize,
        language: Option<&'a str>,
    ) -> BoxFuture<'a, Result<Vec<(Chunk, f32)>, StoreError>> {
        Box::pin(async move {
            let stored = self
                .chunks
                .read()
                .map_err(|e| StoreError::Search(e.to_string()))?;

            let mut scored: Vec<(&Chunk, f32)> = stored
                .values()
                .filter(|c| language.is_none_or(|lang| c.language == lang))
                .filter_map(|c| {
                    let embedding = c.embedding.as_deref()?;
                    Some((c, similarity(&vector, embedding)))
                })
                .collect();

            scored.sort_by(|a, b| {
                b.1.partial_cmp(&a.1)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then_with(|| a.0.id.cmp(&b.0.id))
            });
            scored.truncate(limit);

            Ok(scored
                .into_iter()
                .map(|(c, score)| {
                    let mut chunk = c.clone();
                    chunk.embedding = None;
                    (chunk, score)
                })
                .collect())
        })
    }

    fn delete_by_file<'a>(&'a self, file_path: &'a str) -> BoxFuture<'a, Result<usize, StoreError>> {
        Box::pin(async move {
            let mut stored = self
                .chunks
                .write()
                .map_err(|e| StoreError::Delete(e.to_string()))?;
            let before = stored.len();
            stored.retain(|_, c| c.file_path != file_path);
            Ok(before - stored.len())
        })
    }
}
