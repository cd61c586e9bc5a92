//! Chat transport abstraction.
//!
//! A [`ChatTransport`] sends one user message and hands back the HTTP status
//! together with the raw response body as a stream of byte chunks. Chunk
//! boundaries carry no meaning; decoding is left to the caller.
//!
//! - [`HttpTransport`]: POSTs `{"message": ...}` as JSON with `reqwest`.

use std::pin::Pin;
use std::sync::Arc;

use bytes::Bytes;
use futures::{Stream, StreamExt};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::error::TransportError;

/// Response body as a stream of binary chunks.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, TransportError>> + Send>>;

/// JSON body sent to the chat endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    /// The user's trimmed message.
    pub message: String,
}

impl ChatRequest {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Status line plus body stream of a chat response.
pub struct TransportResponse {
    /// HTTP status reported with the response headers.
    pub status: StatusCode,
    /// Response body. Streamed text on success, error text otherwise.
    pub body: ByteStream,
}

impl std::fmt::Debug for TransportResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransportResponse")
            .field("status", &self.status)
            .finish_non_exhaustive()
    }
}

impl TransportResponse {
    /// Build a response from a status and any chunk stream.
    pub fn new<S>(status: StatusCode, body: S) -> Self
    where
        S: Stream<Item = Result<Bytes, TransportError>> + Send + 'static,
    {
        Self {
            status,
            body: Box::pin(body),
        }
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Read the whole body as text, replacing invalid UTF-8.
    pub async fn text(self) -> Result<String, TransportError> {
        let mut body = self.body;
        let mut buf = Vec::new();
        while let Some(chunk) = body.next().await {
            buf.extend_from_slice(&chunk?);
        }
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }
}

/// Capability to send a message and receive a streamed reply.
#[async_trait::async_trait]
pub trait ChatTransport: Send + Sync {
    /// Send `request`, resolving once response headers have arrived.
    async fn send(&self, request: &ChatRequest) -> Result<TransportResponse, TransportError>;
}

#[async_trait::async_trait]
impl<T: ChatTransport + ?Sized> ChatTransport for Arc<T> {
    async fn send(&self, request: &ChatRequest) -> Result<TransportResponse, TransportError> {
        (**self).send(request).await
    }
}

/// [`ChatTransport`] backed by an HTTP endpoint.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    http: reqwest::Client,
    endpoint: Url,
}

impl HttpTransport {
    /// Create a transport posting to `endpoint`.
    pub fn new(endpoint: Url) -> crate::Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(TransportError::from)?;
        Ok(Self::with_client(endpoint, http))
    }

    /// Create a transport with a custom reqwest client.
    #[must_use]
    pub fn with_client(endpoint: Url, http: reqwest::Client) -> Self {
        Self { http, endpoint }
    }

    #[must_use]
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait::async_trait]
impl ChatTransport for HttpTransport {
    async fn send(&self, request: &ChatRequest) -> Result<TransportResponse, TransportError> {
        let resp = self
            .http
            .post(self.endpoint.clone())
            .json(request)
            .send()
            .await?;

        let status = resp.status();
        debug!(
            name: "transport.response.headers",
            status = status.as_u16(),
            endpoint = %self.endpoint,
            "Response headers received"
        );

        let body = resp.bytes_stream().map(|chunk| chunk.map_err(TransportError::from));
        Ok(TransportResponse::new(status, body))
    }
}
