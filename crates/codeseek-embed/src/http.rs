//! HTTP client for embedding endpoints.

use std::time::Duration;

/// Request timeout used when the caller does not configure one.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Build the client used for embedding requests.
///
/// Large batches can take a while to embed, so `request_timeout` bounds the
/// whole request, not just the connect. If the tuned builder fails (e.g. the
/// TLS backend cannot initialize) the plain default client is used instead.
#[must_use]
pub fn embedding_client(request_timeout: Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .connect_timeout(CONNECT_TIMEOUT)
        .timeout(request_timeout)
        .user_agent(concat!("codeseek-embed/", env!("CARGO_PKG_VERSION")))
        .build()
        .unwrap_or_else(|e| {
            tracing::warn!("falling back to default HTTP client: {e}");
            reqwest::Client::new()
        })
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{header_regex, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    #[tokio::test]
    async fn sends_codeseek_user_agent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(header_regex("user-agent", "^codeseek-embed/"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let status = embedding_client(DEFAULT_REQUEST_TIMEOUT)
            .get(server.uri())
            .send()
            .await
            .unwrap()
            .status();
        assert!(status.is_success());
    }

    #[tokio::test]
    async fn request_timeout_applies() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
            .mount(&server)
            .await;

        let err = embedding_client(Duration::from_millis(50))
            .get(server.uri())
            .send()
            .await
            .unwrap_err();
        assert!(err.is_timeout());
    }
}
