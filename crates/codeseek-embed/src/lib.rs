//! Embedding provider abstraction and backend implementations.
//!
//! The indexing core only ever sees [`EmbeddingProvider`]: text in, fixed-width
//! vectors out. Vector contents are opaque to callers.

pub mod any;
pub mod error;
pub mod http;
#[cfg(feature = "mock")]
pub mod mock;
pub mod ollama;
pub mod openai;
pub mod provider;
pub(crate) mod retry;

pub use error::EmbedError;
pub use provider::EmbeddingProvider;
