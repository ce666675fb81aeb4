use serde::{Deserialize, Serialize};

/// Build the identifier of the chunk covering `start_line..=end_line` of `file_path`.
#[must_use]
pub fn chunk_id(file_path: &str, start_line: usize, end_line: usize) -> String {
    format!("{file_path}:{start_line}-{end_line}")
}

/// A contiguous window of one file's text: the unit of embedding and retrieval.
///
/// Line numbers are 1-based and inclusive. `embedding` stays `None` until a
/// provider has produced a vector for `content`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    pub id: String,
    pub file_path: String,
    pub content: String,
    pub language: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symbol_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symbol_kind: Option<String>,
    pub start_line: usize,
    pub end_line: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
}

impl Chunk {
    /// Create an unembedded chunk; the identifier is derived from path and line range.
    ///
    /// # Panics
    ///
    /// Panics in debug builds if `start_line > end_line`.
    #[must_use]
    pub fn new(
        file_path: impl Into<String>,
        content: impl Into<String>,
        language: impl Into<String>,
        start_line: usize,
        end_line: usize,
    ) -> Self {
        debug_assert!(start_line <= end_line, "chunk line range must not be inverted");
        let file_path = file_path.into();
        Self {
            id: chunk_id(&file_path, start_line, end_line),
            file_path,
            content: content.into(),
            language: language.into(),
            symbol_name: None,
            symbol_kind: None,
            start_line,
            end_line,
            embedding: None,
        }
    }

    #[must_use]
    pub fn with_symbol(mut self, name: impl Into<String>, kind: impl Into<String>) -> Self {
        self.symbol_name = Some(name.into());
        self.symbol_kind = Some(kind.into());
        self
    }

    #[must_use]
    pub fn with_embedding(mut self, embedding: Vec<f32>) -> Self {
        self.embedding = Some(embedding);
        self
    }

    #[must_use]
    pub fn is_embedded(&self) -> bool {
        self.embedding.is_some()
    }
}
