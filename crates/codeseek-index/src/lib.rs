//! Line-window chunking, indexing and retrieval for semantic code search.
//!
//! [`CodeIndexer`] turns one source file into overlapping chunks, embeds them
//! in a single batch and replaces the file's previous chunks in a
//! [`VectorIndex`](codeseek_store::VectorIndex). [`CodeRetriever`] embeds a
//! query, ranks stored chunks by similarity and packs the best ones into a
//! character-budgeted context string.

pub mod chunker;
pub mod config;
pub mod error;
pub mod events;
pub mod indexer;
pub mod languages;
pub mod retriever;

pub use chunker::chunk_text;
pub use config::{ChunkerConfig, ConfigError, RetrievalConfig};
pub use error::{IndexError, Result};
pub use events::{IndexEvent, IndexListener};
pub use indexer::CodeIndexer;
pub use languages::{Lang, detect_language};
pub use retriever::{CodeRetriever, SearchResult, format_block, pack_context};
