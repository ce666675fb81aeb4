use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::EmbedError;
use crate::http::{DEFAULT_REQUEST_TIMEOUT, embedding_client};
use crate::provider::{EmbeddingProvider, ensure_batch_len};
use crate::retry::send_with_retry;

const DEFAULT_MAX_RETRIES: u32 = 3;

/// Embeddings over the OpenAI `/embeddings` endpoint or any compatible server.
#[derive(Clone)]
pub struct OpenAiEmbedder {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    max_retries: u32,
}

impl fmt::Debug for OpenAiEmbedder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAiEmbedder")
            .field("client", &"<reqwest::Client>")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("max_retries", &self.max_retries)
            .finish()
    }
}

impl OpenAiEmbedder {
    #[must_use]
    pub fn new(api_key: String, mut base_url: String, model: String) -> Self {
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self {
            client: embedding_client(DEFAULT_REQUEST_TIMEOUT),
            api_key,
            base_url,
            model,
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }

    #[must_use]
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Bound each HTTP attempt of an embeddings request.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.client = embedding_client(timeout);
        self
    }

    async fn request(&self, input: &[String]) -> Result<Vec<Vec<f32>>, EmbedError> {
        let body = EmbeddingRequest {
            input,
            model: &self.model,
        };
        let url = format!("{}/embeddings", self.base_url);

        let response = send_with_retry("openai", self.max_retries, || {
            self.client
                .post(&url)
                .bearer_auth(&self.api_key)
                .json(&body)
                .send()
        })
        .await?;

        let status = response.status();
        let text = response.text().await.map_err(EmbedError::Http)?;

        if !status.is_success() {
            tracing::error!("OpenAI embedding API error {status}: {text}");
            return Err(EmbedError::Other(format!(
                "OpenAI embedding request failed (status {status})"
            )));
        }

        let resp: EmbeddingResponse = serde_json::from_str(&text)?;
        let vectors = order_by_index(resp.data);
        ensure_batch_len(input.len(), &vectors)?;
        Ok(vectors)
    }
}

fn order_by_index(mut data: Vec<EmbeddingData>) -> Vec<Vec<f32>> {
    data.sort_by_key(|d| d.index);
    data.into_iter().map(|d| d.embedding).collect()
}

impl EmbeddingProvider for OpenAiEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedError> {
        self.request(&[text.to_owned()])
            .await?
            .into_iter()
            .next()
            .ok_or(EmbedError::EmptyResponse {
                provider: "openai".into(),
            })
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbedError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        self.request(texts).await
    }

    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "openai"
    }
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    input: &'a [String],
    model: &'a str,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    #[serde(default)]
    index: usize,
    embedding: Vec<f32>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn embedder(server: &MockServer) -> OpenAiEmbedder {
        OpenAiEmbedder::new(
            "sk-test".into(),
            format!("{}/v1/", server.uri()),
            "text-embedding-3-small".into(),
        )
        .with_max_retries(0)
    }

    #[test]
    fn new_trims_trailing_slashes() {
        let e = OpenAiEmbedder::new("k".into(), "http://x//".into(), "m".into());
        assert_eq!(e.base_url, "http://x");
    }

    #[test]
    fn debug_redacts_api_key() {
        let e = OpenAiEmbedder::new("sk-secret".into(), "http://x".into(), "m".into());
        let dbg = format!("{e:?}");
        assert!(dbg.contains("<redacted>"));
        assert!(!dbg.contains("sk-secret"));
    }

    #[test]
    fn request_serialization() {
        let input = vec!["hello world".to_string()];
        let body = EmbeddingRequest {
            input: &input,
            model: "text-embedding-3-small",
        };
        let json = serde_json::to_string(&body).unwrap();
        assert!(json.contains("\"input\":[\"hello world\"]"));
        assert!(json.contains("\"model\":\"text-embedding-3-small\""));
    }

    #[tokio::test]
    async fn embed_batch_orders_by_index() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/embeddings"))
            .and(header("authorization", "Bearer sk-test"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": [
                    {"index": 1, "embedding": [0.0, 1.0]},
                    {"index": 0, "embedding": [1.0, 0.0]}
                ]
            })))
            .mount(&server)
            .await;

        let vectors = embedder(&server)
            .embed_batch(&["first".into(), "second".into()])
            .await
            .unwrap();
        assert_eq!(vectors, vec![vec![1.0, 0.0], vec![0.0, 1.0]]);
    }

    #[tokio::test]
    async fn embed_batch_short_response_fails_atomically() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/embeddings"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": [{"index": 0, "embedding": [1.0]}]
            })))
            .mount(&server)
            .await;

        let err = embedder(&server)
            .embed_batch(&["a".into(), "b".into()])
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            EmbedError::BatchSize {
                expected: 2,
                actual: 1
            }
        ));
    }

    #[tokio::test]
    async fn embed_single() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/embeddings"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": [{"index": 0, "embedding": [0.5, 0.5, 0.5]}]
            })))
            .mount(&server)
            .await;

        let v = embedder(&server).embed("query").await.unwrap();
        assert_eq!(v, vec![0.5, 0.5, 0.5]);
    }

    #[tokio::test]
    async fn slow_server_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"data": []}))
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&server)
            .await;

        let err = embedder(&server)
            .with_timeout(Duration::from_millis(50))
            .embed("query")
            .await
            .unwrap_err();
        assert!(matches!(err, EmbedError::Http(ref e) if e.is_timeout()));
    }

    #[tokio::test]
    async fn server_error_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("down"))
            .mount(&server)
            .await;

        let err = embedder(&server).embed("query").await.unwrap_err();
        assert!(err.to_string().contains("status 500"));
    }

    #[tokio::test]
    async fn empty_batch_skips_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .expect(0)
            .mount(&server)
            .await;

        let vectors = embedder(&server).embed_batch(&[]).await.unwrap();
        assert!(vectors.is_empty());
    }
}
