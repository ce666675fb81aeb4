//! Error types for codeseek-index.

use crate::config::ConfigError;

/// Errors surfaced by the indexing and retrieval orchestrators.
///
/// Collaborator failures are wrapped without reinterpretation so callers can
/// still tell a provider outage from a store outage.
#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    /// Invalid chunking or retrieval settings.
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// Embedding provider failure.
    #[error("embedding provider error: {0}")]
    Provider(#[from] codeseek_embed::EmbedError),

    /// Vector store failure.
    #[error("vector store error: {0}")]
    Store(#[from] codeseek_store::StoreError),
}

/// Result type alias using `IndexError`.
pub type Result<T> = std::result::Result<T, IndexError>;
