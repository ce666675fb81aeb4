//! Vector index capability for code chunks.
//!
//! [`VectorIndex`] is the boundary the indexing core writes to and searches
//! through. Two backends ship here: [`InMemoryVectorIndex`] for tests and
//! one-shot runs, and [`QdrantVectorIndex`] (feature `qdrant`) for persistence.

pub mod error;
pub mod in_memory;
#[cfg(feature = "qdrant")]
pub mod qdrant;
pub mod types;
pub mod vector_index;

pub use error::{Result, StoreError};
pub use in_memory::InMemoryVectorIndex;
#[cfg(feature = "qdrant")]
pub use qdrant::QdrantVectorIndex;
pub use types::{Chunk, chunk_id};
pub use vector_index::{BoxFuture, VectorIndex, similarity};
