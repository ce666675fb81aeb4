//! `Qdrant` collection backend for code chunks.

use std::collections::HashMap;

use qdrant_client::Qdrant;
use qdrant_client::qdrant::{
    Condition, CountPointsBuilder, CreateCollectionBuilder, CreateFieldIndexCollectionBuilder,
    DeletePointsBuilder, Distance, FieldType, Filter, PointStruct, ScoredPoint,
    SearchPointsBuilder, UpsertPointsBuilder, VectorParamsBuilder,
};

use crate::error::StoreError;
use crate::types::Chunk;
use crate::vector_index::{BoxFuture, VectorIndex};

pub const DEFAULT_COLLECTION: &str = "codeseek_chunks";

/// Chunks stored as `Qdrant` points with cosine distance.
///
/// The collection is created on first upsert, sized from the first embedding.
#[derive(Clone)]
pub struct QdrantVectorIndex {
    client: Qdrant,
    collection: String,
}

impl std::fmt::Debug for QdrantVectorIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QdrantVectorIndex")
            .field("collection", &self.collection)
            .finish_non_exhaustive()
    }
}

/// Deterministic point id for a chunk id (`Qdrant` accepts only UUIDs or integers).
#[must_use]
pub fn point_id(chunk_id: &str) -> String {
    uuid::Uuid::new_v5(&uuid::Uuid::NAMESPACE_OID, chunk_id.as_bytes()).to_string()
}

fn file_filter(file_path: &str) -> Filter {
    Filter::must([Condition::matches("file_path", file_path.to_string())])
}

fn language_filter(language: &str) -> Filter {
    Filter::must([Condition::matches("language", language.to_string())])
}

impl QdrantVectorIndex {
    /// # Errors
    ///
    /// Returns an error if the `Qdrant` client cannot be built from `url`.
    pub fn new(url: &str, collection: impl Into<String>) -> Result<Self, StoreError> {
        let client = Qdrant::from_url(url)
            .build()
            .map_err(|e| StoreError::Connection(e.to_string()))?;
        Ok(Self {
            client,
            collection: collection.into(),
        })
    }

    async fn collection_exists(&self) -> Result<bool, StoreError> {
        self.client
            .collection_exists(&self.collection)
            .await
            .map_err(|e| StoreError::Collection(e.to_string()))
    }

    /// Create the collection with keyword indexes on `file_path` and `language`.
    ///
    /// Idempotent: no-op if the collection already exists.
    ///
    /// # Errors
    ///
    /// Returns an error if `Qdrant` cannot be reached or creation fails.
    pub async fn ensure_collection(&self, vector_size: u64) -> Result<(), StoreError> {
        if self.collection_exists().await? {
            return Ok(());
        }

        self.client
            .create_collection(
                CreateCollectionBuilder::new(&self.collection)
                    .vectors_config(VectorParamsBuilder::new(vector_size, Distance::Cosine)),
            )
            .await
            .map_err(|e| StoreError::Collection(e.to_string()))?;

        for field in ["file_path", "language"] {
            self.client
                .create_field_index(CreateFieldIndexCollectionBuilder::new(
                    &self.collection,
                    field,
                    FieldType::Keyword,
                ))
                .await
                .map_err(|e| StoreError::Collection(e.to_string()))?;
        }

        tracing::info!(collection = %self.collection, vector_size, "created collection");
        Ok(())
    }

    async fn upsert_points(&self, chunks: Vec<Chunk>) -> Result<usize, StoreError> {
        let Some(first) = chunks.first() else {
            return Ok(0);
        };
        let dim = first
            .embedding
            .as_ref()
            .map(Vec::len)
            .ok_or_else(|| StoreError::MissingEmbedding {
                id: first.id.clone(),
            })?;
        self.ensure_collection(dim as u64).await?;

        let count = chunks.len();
        let points = chunks
            .into_iter()
            .map(to_point)
            .collect::<Result<Vec<_>, _>>()?;

        self.client
            .upsert_points(UpsertPointsBuilder::new(&self.collection, points).wait(true))
            .await
            .map_err(|e| StoreError::Upsert(e.to_string()))?;
        Ok(count)
    }

    async fn search_points(
        &self,
        vector: Vec<f32>,
        limit: usize,
        language: Option<&str>,
    ) -> Result<Vec<(Chunk, f32)>, StoreError> {
        if limit == 0 || !self.collection_exists().await? {
            return Ok(Vec::new());
        }

        let mut builder = SearchPointsBuilder::new(&self.collection, vector, limit as u64)
            .with_payload(true);
        if let Some(lang) = language {
            builder = builder.filter(language_filter(lang));
        }

        let response = self
            .client
            .search_points(builder)
            .await
            .map_err(|e| StoreError::Search(e.to_string()))?;

        response
            .result
            .iter()
            .map(from_scored_point)
            .collect::<Result<Vec<_>, _>>()
            .inspect_err(|e| tracing::warn!(collection = %self.collection, "unreadable point: {e}"))
    }

    async fn delete_file_points(&self, file_path: &str) -> Result<usize, StoreError> {
        if !self.collection_exists().await? {
            return Ok(0);
        }

        let counted = self
            .client
            .count(
                CountPointsBuilder::new(&self.collection)
                    .filter(file_filter(file_path))
                    .exact(true),
            )
            .await
            .map_err(|e| StoreError::Delete(e.to_string()))?;
        let count = counted.result.map_or(0, |r| r.count);
        if count == 0 {
            return Ok(0);
        }

        self.client
            .delete_points(
                DeletePointsBuilder::new(&self.collection)
                    .points(file_filter(file_path))
                    .wait(true),
            )
            .await
            .map_err(|e| StoreError::Delete(e.to_string()))?;

        usize::try_from(count).map_err(|e| StoreError::Delete(e.to_string()))
    }
}

fn to_point(chunk: Chunk) -> Result<PointStruct, StoreError> {
    let Some(vector) = chunk.embedding else {
        return Err(StoreError::MissingEmbedding { id: chunk.id });
    };
    let payload: HashMap<String, qdrant_client::qdrant::Value> =
        serde_json::from_value(serde_json::json!({
            "chunk_id": chunk.id,
            "file_path": chunk.file_path,
            "language": chunk.language,
            "symbol_name": chunk.symbol_name,
            "symbol_kind": chunk.symbol_kind,
            "start_line": chunk.start_line,
            "end_line": chunk.end_line,
            "content": chunk.content,
        }))
        .map_err(|e| StoreError::Serialization(e.to_string()))?;

    Ok(PointStruct::new(point_id(&chunk.id), vector, payload))
}

fn from_scored_point(point: &ScoredPoint) -> Result<(Chunk, f32), StoreError> {
    let p = &point.payload;
    let get_str = |key: &str| {
        p.get(key)
            .and_then(qdrant_client::qdrant::Value::as_str)
            .cloned()
    };
    let require_str = |key: &str| {
        get_str(key).ok_or_else(|| StoreError::Serialization(format!("payload missing `{key}`")))
    };
    let require_line = |key: &str| {
        p.get(key)
            .and_then(qdrant_client::qdrant::Value::as_integer)
            .and_then(|v| usize::try_from(v).ok())
            .ok_or_else(|| StoreError::Serialization(format!("payload missing `{key}`")))
    };

    let chunk = Chunk {
        id: require_str("chunk_id")?,
        file_path: require_str("file_path")?,
        content: require_str("content")?,
        language: require_str("language")?,
        symbol_name: get_str("symbol_name"),
        symbol_kind: get_str("symbol_kind"),
        start_line: require_line("start_line")?,
        end_line: require_line("end_line")?,
        embedding: None,
    };
    Ok((chunk, point.score.clamp(0.0, 1.0)))
}

impl VectorIndex for QdrantVectorIndex {
    fn upsert(&self, chunks: Vec<Chunk>) -> BoxFuture<'_, Result<usize, StoreError>> {
        Box::pin(self.upsert_points(chunks))
    }

    fn search<'a>(
        &'a self,
        vector: Vec<f32>,
        limit: usize,
        language: Option<&'a str>,
    ) -> BoxFuture<'a, Result<Vec<(Chunk, f32)>, StoreError>> {
        Box::pin(self.search_points(vector, limit, language))
    }

    fn delete_by_file<'a>(&'a self, file_path: &'a str) -> BoxFuture<'a, Result<usize, StoreError>> {
        Box::pin(self.delete_file_points(file_path))
    }
}
