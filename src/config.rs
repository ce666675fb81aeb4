use std::path::Path;

use anyhow::Context;
use codeseek_index::{ChunkerConfig, RetrievalConfig};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub chunking: ChunkerConfig,
    pub retrieval: RetrievalConfig,
    pub embedding: EmbeddingConfig,
    pub store: StoreConfig,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingBackend {
    #[default]
    Ollama,
    OpenAi,
}

impl EmbeddingBackend {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ollama => "ollama",
            Self::OpenAi => "openai",
        }
    }
}

impl std::fmt::Display for EmbeddingBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub provider: EmbeddingBackend,
    pub base_url: String,
    pub model: String,
    /// Only read from `CODESEEK_OPENAI_API_KEY`; never written back to disk.
    #[serde(skip)]
    pub api_key: Option<String>,
    pub max_retries: u32,
    /// Per-request timeout for HTTP embedding backends.
    pub timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: EmbeddingBackend::Ollama,
            base_url: "http://localhost:11434".into(),
            model: "nomic-embed-text".into(),
            api_key: None,
            max_retries: 3,
            timeout_secs: 60,
        }
    }
}

impl std::fmt::Debug for EmbeddingConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmbeddingConfig")
            .field("provider", &self.provider)
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("max_retries", &self.max_retries)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Memory,
    Qdrant,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    pub qdrant_url: String,
    pub collection: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Memory,
            qdrant_url: "http://localhost:6334".into(),
            collection: "codeseek_chunks".into(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file with env var overrides.
    ///
    /// Falls back to defaults when the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed, or if
    /// the retrieval settings are invalid.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path).context("failed to read config file")?;
            toml::from_str::<Self>(&content).context("failed to parse config file")?
        } else {
            Self::default()
        };

        config.apply_env_overrides();
        config
            .retrieval
            .validate()
            .context("invalid [retrieval] settings")?;
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("CODESEEK_EMBEDDING_PROVIDER") {
            if let Ok(kind) = serde_json::from_value(serde_json::Value::String(v.clone())) {
                self.embedding.provider = kind;
            } else {
                tracing::warn!("ignoring invalid CODESEEK_EMBEDDING_PROVIDER value: {v}");
            }
        }
        if let Ok(v) = std::env::var("CODESEEK_EMBEDDING_BASE_URL") {
            self.embedding.base_url = v;
        }
        if let Ok(v) = std::env::var("CODESEEK_EMBEDDING_MODEL") {
            self.embedding.model = v;
        }
        if let Ok(v) = std::env::var("CODESEEK_EMBEDDING_TIMEOUT")
            && let Some(secs) = parse_or_warn("CODESEEK_EMBEDDING_TIMEOUT", &v)
        {
            self.embedding.timeout_secs = secs;
        }
        if let Ok(v) = std::env::var("CODESEEK_OPENAI_API_KEY") {
            self.embedding.api_key = Some(v);
        }
        if let Ok(v) = std::env::var("CODESEEK_STORE_BACKEND") {
            if let Ok(backend) = serde_json::from_value(serde_json::Value::String(v.clone())) {
                self.store.backend = backend;
            } else {
                tracing::warn!("ignoring invalid CODESEEK_STORE_BACKEND value: {v}");
            }
        }
        if let Ok(v) = std::env::var("CODESEEK_QDRANT_URL") {
            self.store.qdrant_url = v;
        }
        if let Ok(v) = std::env::var("CODESEEK_QDRANT_COLLECTION") {
            self.store.collection = v;
        }
        self.apply_chunking_overrides();
    }

    fn apply_chunking_overrides(&mut self) {
        let size = std::env::var("CODESEEK_CHUNK_SIZE")
            .ok()
            .and_then(|v| parse_or_warn("CODESEEK_CHUNK_SIZE", &v));
        let overlap = std::env::var("CODESEEK_CHUNK_OVERLAP")
            .ok()
            .and_then(|v| parse_or_warn("CODESEEK_CHUNK_OVERLAP", &v));
        if size.is_none() && overlap.is_none() {
            return;
        }

        let chunk_size = size.unwrap_or(self.chunking.chunk_size());
        let overlap = overlap.unwrap_or(self.chunking.overlap());
        match ChunkerConfig::new(chunk_size, overlap) {
            Ok(chunking) => self.chunking = chunking,
            Err(e) => tracing::warn!("ignoring chunking env overrides: {e}"),
        }
    }
}

fn parse_or_warn<T: std::str::FromStr>(key: &str, value: &str) -> Option<T> {
    match value.parse() {
        Ok(n) => Some(n),
        Err(_) => {
            tracing::warn!("ignoring invalid {key} value: {value}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use serial_test::serial;

    use super::*;

    const ENV_KEYS: [&str; 10] = [
        "CODESEEK_EMBEDDING_PROVIDER",
        "CODESEEK_EMBEDDING_TIMEOUT",
        "CODESEEK_EMBEDDING_BASE_URL",
        "CODESEEK_EMBEDDING_MODEL",
        "CODESEEK_OPENAI_API_KEY",
        "CODESEEK_STORE_BACKEND",
        "CODESEEK_QDRANT_URL",
        "CODESEEK_QDRANT_COLLECTION",
        "CODESEEK_CHUNK_SIZE",
        "CODESEEK_CHUNK_OVERLAP",
    ];

    fn clear_env() {
        for key in ENV_KEYS {
            unsafe { std::env::remove_var(key) };
        }
    }

    fn set_env(key: &str, value: &str) {
        unsafe { std::env::set_var(key, value) };
    }

    fn write_config(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    #[serial]
    fn missing_file_gives_defaults() {
        clear_env();
        let config = Config::load(Path::new("/nonexistent/codeseek.toml")).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.chunking.chunk_size(), 1000);
        assert_eq!(config.chunking.overlap(), 200);
        assert_eq!(config.retrieval.context_candidates, 20);
        assert_eq!(config.store.backend, StoreBackend::Memory);
    }

    #[test]
    #[serial]
    fn parses_all_sections() {
        clear_env();
        let file = write_config(
            r#"
[chunking]
chunk_size = 400
overlap = 50

[retrieval]
default_limit = 5
chars_per_token = 3

[embedding]
provider = "openai"
base_url = "https://api.openai.com/v1"
model = "text-embedding-3-small"

[store]
backend = "qdrant"
collection = "repo"
"#,
        );
        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.chunking, ChunkerConfig::new(400, 50).unwrap());
        assert_eq!(config.retrieval.default_limit, 5);
        assert_eq!(config.retrieval.chars_per_token, 3);
        assert_eq!(config.retrieval.context_candidates, 20);
        assert_eq!(config.embedding.provider, EmbeddingBackend::OpenAi);
        assert_eq!(config.embedding.max_retries, 3);
        assert_eq!(config.store.backend, StoreBackend::Qdrant);
        assert_eq!(config.store.collection, "repo");
        assert_eq!(config.store.qdrant_url, "http://localhost:6334");
    }

    #[test]
    #[serial]
    fn invalid_chunking_in_file_is_rejected() {
        clear_env();
        let file = write_config("[chunking]\nchunk_size = 100\noverlap = 100\n");
        let err = Config::load(file.path()).unwrap_err();
        assert!(format!("{err:#}").contains("overlap"));
    }

    #[test]
    #[serial]
    fn invalid_retrieval_in_file_is_rejected() {
        clear_env();
        let file = write_config("[retrieval]\nchars_per_token = 0\n");
        let err = Config::load(file.path()).unwrap_err();
        assert!(format!("{err:#}").contains("[retrieval]"));
    }

    #[test]
    #[serial]
    fn env_overrides_apply() {
        clear_env();
        set_env("CODESEEK_EMBEDDING_PROVIDER", "openai");
        set_env("CODESEEK_EMBEDDING_MODEL", "text-embedding-3-large");
        set_env("CODESEEK_OPENAI_API_KEY", "sk-test");
        set_env("CODESEEK_STORE_BACKEND", "qdrant");
        set_env("CODESEEK_QDRANT_URL", "http://qdrant:6334");
        set_env("CODESEEK_CHUNK_SIZE", "500");
        set_env("CODESEEK_EMBEDDING_TIMEOUT", "15");

        let config = Config::load(Path::new("/nonexistent/codeseek.toml")).unwrap();
        clear_env();

        assert_eq!(config.embedding.provider, EmbeddingBackend::OpenAi);
        assert_eq!(config.embedding.model, "text-embedding-3-large");
        assert_eq!(config.embedding.api_key.as_deref(), Some("sk-test"));
        assert_eq!(config.store.backend, StoreBackend::Qdrant);
        assert_eq!(config.store.qdrant_url, "http://qdrant:6334");
        assert_eq!(config.chunking.chunk_size(), 500);
        assert_eq!(config.chunking.overlap(), 200);
        assert_eq!(config.embedding.timeout_secs, 15);
    }

    #[test]
    #[serial]
    fn invalid_env_values_are_ignored() {
        clear_env();
        set_env("CODESEEK_EMBEDDING_PROVIDER", "word2vec");
        set_env("CODESEEK_STORE_BACKEND", "sqlite");
        set_env("CODESEEK_CHUNK_SIZE", "lots");

        let config = Config::load(Path::new("/nonexistent/codeseek.toml")).unwrap();
        clear_env();

        assert_eq!(config, Config::default());
    }

    #[test]
    #[serial]
    fn env_chunking_pair_must_stay_valid() {
        clear_env();
        set_env("CODESEEK_CHUNK_SIZE", "100");

        let config = Config::load(Path::new("/nonexistent/codeseek.toml")).unwrap();
        assert_eq!(config.chunking, ChunkerConfig::default());

        set_env("CODESEEK_CHUNK_OVERLAP", "10");
        let config = Config::load(Path::new("/nonexistent/codeseek.toml")).unwrap();
        clear_env();
        assert_eq!(config.chunking, ChunkerConfig::new(100, 10).unwrap());
    }

    #[test]
    fn api_key_is_redacted_and_not_serialized() {
        let mut config = Config::default();
        config.embedding.api_key = Some("sk-secret".into());
        assert!(!format!("{config:?}").contains("sk-secret"));
        let toml = toml::to_string(&config).unwrap();
        assert!(!toml.contains("sk-secret"));
        assert!(toml.contains("[chunking]"));
    }
}
