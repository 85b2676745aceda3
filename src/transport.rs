//! HTTP boundary to the chat backend.
//!
//! Two endpoints are consumed:
//! - `POST /chat/stream` returns a chunked SSE body (see [`crate::streaming`])
//! - `POST /chat` returns the [`ChatResult`] JSON synchronously
//!
//! Both take the same [`ChatRequest`] body and a bearer token.

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::StreamExt;
use futures_util::stream::BoxStream;
use std::time::Duration;

use crate::config::Config;
use crate::error::{ChatError, Result};
use crate::types::{ChatRequest, ChatResult};

/// Raw body chunks of a streaming response.
pub type ByteStream = BoxStream<'static, Result<Bytes>>;

#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Open the streaming endpoint. Fails before any body is read when the
    /// server answers with a non-success status.
    async fn open_stream(&self, request: &ChatRequest) -> Result<ByteStream>;

    /// Call the synchronous endpoint.
    async fn send(&self, request: &ChatRequest) -> Result<ChatResult>;
}

/// `reqwest`-backed transport.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
    request_timeout: Duration,
}

impl HttpTransport {
    pub fn new(base_url: impl Into<String>, token: Option<String>) -> Result<Self> {
        Self::with_timeouts(
            base_url,
            token,
            Duration::from_secs(10),
            Duration::from_secs(120),
        )
    }

    pub fn with_timeouts(
        base_url: impl Into<String>,
        token: Option<String>,
        connect_timeout: Duration,
        request_timeout: Duration,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(connect_timeout)
            .build()
            .map_err(|e| ChatError::Network(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self {
            http,
            base_url: base_url.into(),
            token,
            request_timeout,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::with_timeouts(
            config.api_url.clone(),
            config.api_token.clone(),
            Duration::from_secs(config.connect_timeout_secs),
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    fn post(&self, path: &str, request: &ChatRequest) -> reqwest::RequestBuilder {
        let mut builder = self.http.post(self.url(path)).json(request);
        if let Some(ref token) = self.token {
            builder = builder.bearer_auth(token);
        }
        builder
    }
}

/// Map a non-success response to an error, reading the body for context.
async fn check_status(resp: reqwest::Response) -> Result<reqwest::Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    if status == reqwest::StatusCode::UNAUTHORIZED {
        return Err(ChatError::Unauthorized(body));
    }
    Err(ChatError::Status {
        status: status.as_u16(),
        body,
    })
}

#[async_trait]
impl ChatTransport for HttpTransport {
    async fn open_stream(&self, request: &ChatRequest) -> Result<ByteStream> {
        let resp = self
            .post("/chat/stream", request)
            .header(reqwest::header::ACCEPT, "text/event-stream")
            .send()
            .await?;
        let resp = check_status(resp).await?;
        tracing::debug!(status = %resp.status(), "stream opened");

        Ok(resp
            .bytes_stream()
            .map(|chunk| chunk.map_err(|e| ChatError::Network(format!("stream read error: {}", e))))
            .boxed())
    }

    async fn send(&self, request: &ChatRequest) -> Result<ChatResult> {
        let resp = self
            .post("/chat", request)
            .timeout(self.request_timeout)
            .send()
            .await?;
        let resp = check_status(resp).await?;
        let body = resp.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_joins_without_double_slash() {
        let transport = HttpTransport::new("http://localhost:8000/api/", None).unwrap();
        assert_eq!(
            transport.url("/chat/stream"),
            "http://localhost:8000/api/chat/stream"
        );
    }
}
