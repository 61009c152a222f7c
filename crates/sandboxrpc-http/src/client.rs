//! HTTP transport backed by `reqwest`.
//!
//! One `exchange` is one POST. There is no retry, circuit breaking or
//! batching here; callers wrap `SandboxClient::run` if they want any of that.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;

use sandboxrpc_core::error::SandboxError;
use sandboxrpc_core::transport::SandboxTransport;

/// Configuration for `HttpTransport`.
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Deadline for the whole exchange, body included.
    pub request_timeout: Duration,
    /// Idle keep-alive connections kept per host.
    pub pool_max_idle_per_host: usize,
    /// How long an idle connection stays in the pool.
    pub pool_idle_timeout: Duration,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(30),
            pool_max_idle_per_host: 10,
            pool_idle_timeout: Duration::from_secs(30),
        }
    }
}

/// HTTP transport for a sandbox JSON-RPC endpoint.
pub struct HttpTransport {
    url: String,
    http: reqwest::Client,
    request_timeout: Duration,
}

impl HttpTransport {
    /// Create a transport for the given endpoint URL.
    pub fn new(url: impl Into<String>, config: HttpClientConfig) -> Result<Self, SandboxError> {
        // reqwest is built without gzip/brotli, so responses are never compressed.
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .pool_idle_timeout(config.pool_idle_timeout)
            .build()
            .map_err(|e| SandboxError::Http(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            url: url.into(),
            http,
            request_timeout: config.request_timeout,
        })
    }

    /// Create with default configuration.
    pub fn default_for(url: impl Into<String>) -> Result<Self, SandboxError> {
        Self::new(url, HttpClientConfig::default())
    }

    fn map_err(&self, e: reqwest::Error) -> SandboxError {
        if e.is_timeout() {
            SandboxError::Timeout {
                ms: self.request_timeout.as_millis() as u64,
            }
        } else {
            SandboxError::Http(e.to_string())
        }
    }
}

#[async_trait]
impl SandboxTransport for HttpTransport {
    async fn exchange(&self, body: Vec<u8>) -> Result<Vec<u8>, SandboxError> {
        let resp = self
            .http
            .post(&self.url)
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .map_err(|e| self.map_err(e))?;

        let status = resp.status();
        let body = resp.bytes().await.map_err(|e| self.map_err(e))?;

        if !status.is_success() {
            tracing::debug!(status = status.as_u16(), url = %self.url, "sandbox returned failure status");
            return Err(SandboxError::Status {
                status: status.as_u16(),
                body: String::from_utf8_lossy(&body).into_owned(),
            });
        }

        Ok(body.to_vec())
    }

    fn url(&self) -> &str {
        &self.url
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_server::{serve_once, unused_url};
    use serde_json::json;

    #[tokio::test]
    async fn posts_json_and_returns_body() {
        let (url, request) = serve_once("200 OK", r#"{"ok":true}"#).await;
        let transport = HttpTransport::default_for(&url).unwrap();

        let body = transport.exchange(br#"{"ping":1}"#.to_vec()).await.unwrap();

        assert_eq!(body, br#"{"ok":true}"#);
        let request = request.await.unwrap();
        assert!(request.starts_with("POST / HTTP/1.1"));
        assert!(request.to_ascii_lowercase().contains("content-type: application/json"));
        assert!(request.ends_with(r#"{"ping":1}"#));
        assert_eq!(transport.url(), url);
    }

    #[tokio::test]
    async fn failure_status_keeps_body() {
        let (url, _request) = serve_once("400 Bad Request", "<h1>Script timed out</h1>").await;
        let transport = HttpTransport::default_for(&url).unwrap();

        let err = transport.exchange(json!({}).to_string().into_bytes()).await.unwrap_err();

        match err {
            SandboxError::Status { status, body } => {
                assert_eq!(status, 400);
                assert_eq!(body, "<h1>Script timed out</h1>");
            }
            other => panic!("expected status error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn connection_refused_is_http_error() {
        let transport = HttpTransport::default_for(unused_url().await).unwrap();
        let err = transport.exchange(b"{}".to_vec()).await.unwrap_err();
        assert!(matches!(err, SandboxError::Http(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn slow_sandbox_times_out() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}/", listener.local_addr().unwrap());
        tokio::spawn(async move {
            let (_socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(30)).await;
        });
        let transport = HttpTransport::new(
            url,
            HttpClientConfig {
                request_timeout: Duration::from_millis(100),
                ..HttpClientConfig::default()
            },
        )
        .unwrap();

        let err = transport.exchange(b"{}".to_vec()).await.unwrap_err();

        assert!(matches!(err, SandboxError::Timeout { ms: 100 }), "got {err:?}");
    }
}
