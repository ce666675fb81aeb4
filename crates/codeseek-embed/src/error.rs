#[derive(Debug, thiserror::Error)]
pub enum EmbedError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parse failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("rate limited")]
    RateLimited,

    #[error("empty response from {provider}")]
    EmptyResponse { provider: String },

    /// The backend returned a different number of vectors than texts sent.
    #[error("embedding batch size mismatch: expected {expected}, got {actual}")]
    BatchSize { expected: usize, actual: usize },

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, EmbedError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn batch_size_message() {
        let err = EmbedError::BatchSize {
            expected: 3,
            actual: 2,
        };
        assert_eq!(
            err.to_string(),
            "embedding batch size mismatch: expected 3, got 2"
        );
    }

    #[test]
    fn empty_response_names_provider() {
        let err = EmbedError::EmptyResponse {
            provider: "ollama".into(),
        };
        assert_eq!(err.to_string(), "empty response from ollama");
    }
}
