//! Validated chunking and retrieval settings.
//!
//! Both configs reject invalid combinations when they are built, so an
//! orchestrator can never be constructed around a bad setting.

use serde::{Deserialize, Serialize};

pub const DEFAULT_CHUNK_SIZE: usize = 1000;
pub const DEFAULT_CHUNK_OVERLAP: usize = 200;
pub const DEFAULT_SEARCH_LIMIT: usize = 10;
pub const DEFAULT_CONTEXT_CANDIDATES: usize = 20;
pub const DEFAULT_CHARS_PER_TOKEN: usize = 4;
pub const DEFAULT_MAX_TOKENS: usize = 4000;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("chunk overlap ({overlap}) must be smaller than chunk size ({chunk_size})")]
    InvalidOverlap { overlap: usize, chunk_size: usize },

    #[error("context candidate count must be at least 1")]
    ZeroCandidates,

    #[error("chars per token must be at least 1")]
    ZeroCharsPerToken,
}

/// Chunk size and overlap, both in characters. Invariant: `overlap < chunk_size`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawChunkerConfig", into = "RawChunkerConfig")]
pub struct ChunkerConfig {
    chunk_size: usize,
    overlap: usize,
}

impl ChunkerConfig {
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidOverlap`] unless `overlap < chunk_size`.
    pub fn new(chunk_size: usize, overlap: usize) -> Result<Self, ConfigError> {
        if overlap >= chunk_size {
            return Err(ConfigError::InvalidOverlap {
                overlap,
                chunk_size,
            });
        }
        Ok(Self {
            chunk_size,
            overlap,
        })
    }

    /// Characters accumulated before a chunk boundary is forced.
    #[must_use]
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Characters carried from the tail of one chunk into the next.
    #[must_use]
    pub fn overlap(&self) -> usize {
        self.overlap
    }
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            overlap: DEFAULT_CHUNK_OVERLAP,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct RawChunkerConfig {
    #[serde(default = "default_chunk_size")]
    chunk_size: usize,
    #[serde(default = "default_chunk_overlap")]
    overlap: usize,
}

fn default_chunk_size() -> usize {
    DEFAULT_CHUNK_SIZE
}

fn default_chunk_overlap() -> usize {
    DEFAULT_CHUNK_OVERLAP
}

impl TryFrom<RawChunkerConfig> for ChunkerConfig {
    type Error = ConfigError;

    fn try_from(raw: RawChunkerConfig) -> Result<Self, Self::Error> {
        Self::new(raw.chunk_size, raw.overlap)
    }
}

impl From<ChunkerConfig> for RawChunkerConfig {
    fn from(config: ChunkerConfig) -> Self {
        Self {
            chunk_size: config.chunk_size,
            overlap: config.overlap,
        }
    }
}

/// Retrieval defaults and context-packing heuristics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Result count used when the caller does not pick one.
    #[serde(default = "default_search_limit")]
    pub default_limit: usize,
    /// Candidates fetched for context assembly, independent of caller limits.
    #[serde(default = "default_context_candidates")]
    pub context_candidates: usize,
    /// Characters budgeted per requested token.
    #[serde(default = "default_chars_per_token")]
    pub chars_per_token: usize,
    /// Token budget used when the caller does not pick one.
    #[serde(default = "default_max_tokens")]
    pub default_max_tokens: usize,
}

fn default_search_limit() -> usize {
    DEFAULT_SEARCH_LIMIT
}

fn default_context_candidates() -> usize {
    DEFAULT_CONTEXT_CANDIDATES
}

fn default_chars_per_token() -> usize {
    DEFAULT_CHARS_PER_TOKEN
}

fn default_max_tokens() -> usize {
    DEFAULT_MAX_TOKENS
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            default_limit: DEFAULT_SEARCH_LIMIT,
            context_candidates: DEFAULT_CONTEXT_CANDIDATES,
            chars_per_token: DEFAULT_CHARS_PER_TOKEN,
            default_max_tokens: DEFAULT_MAX_TOKENS,
        }
    }
}

impl RetrievalConfig {
    /// # Errors
    ///
    /// Returns an error if `context_candidates` or `chars_per_token` is zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.context_candidates == 0 {
            return Err(ConfigError::ZeroCandidates);
        }
        if self.chars_per_token == 0 {
            return Err(ConfigError::ZeroCharsPerToken);
        }
        Ok(())
    }

    /// Character budget for `max_tokens`.
    #[must_use]
    pub fn char_limit(&self, max_tokens: usize) -> usize {
        max_tokens.saturating_mul(self.chars_per_token)
    }
}
