//! HTTP transport capability and its reqwest-backed implementation.

use std::sync::Mutex;
use std::time::Duration;

use reqwest::Method;
use reqwest::header::HeaderMap;
use url::Url;

use super::{Response, WebError};

/// A fully-prepared request handed to the transport: method, parsed URL,
/// resolved headers, optional body.
#[derive(Debug, Clone)]
pub struct Request {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Option<Vec<u8>>,
}

/// Executes prepared requests. Swapped for a recording double in tests.
///
/// `set_timeout` configures the per-request timeout for subsequent calls;
/// the helper never calls it for a zero duration, so an unconfigured
/// transport runs without an explicit timeout.
#[async_trait::async_trait]
pub trait HttpTransport: Send + Sync {
    fn set_timeout(&self, timeout: Duration);

    async fn execute(&self, request: Request) -> Result<Response, WebError>;
}

#[async_trait::async_trait]
impl<T: HttpTransport + ?Sized> HttpTransport for std::sync::Arc<T> {
    fn set_timeout(&self, timeout: Duration) {
        (**self).set_timeout(timeout);
    }

    async fn execute(&self, request: Request) -> Result<Response, WebError> {
        (**self).execute(request).await
    }
}

// =============================================================================
// REQWEST IMPLEMENTATION
// =============================================================================

/// Real transport backed by a shared [`reqwest::Client`].
pub struct ReqwestTransport {
    client: reqwest::Client,
    timeout: Mutex<Option<Duration>>,
}

impl ReqwestTransport {
    /// Build the transport with a fresh reqwest client.
    ///
    /// # Errors
    ///
    /// Returns [`WebError::ClientBuild`] if the TLS backend cannot be
    /// initialized.
    pub fn new() -> Result<Self, WebError> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| WebError::ClientBuild(e.to_string()))?;
        Ok(Self { client, timeout: Mutex::new(None) })
    }

    fn current_timeout(&self) -> Option<Duration> {
        *self.timeout.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

#[async_trait::async_trait]
impl HttpTransport for ReqwestTransport {
    fn set_timeout(&self, timeout: Duration) {
        *self.timeout.lock().unwrap_or_else(std::sync::PoisonError::into_inner) = Some(timeout);
    }

    async fn execute(&self, request: Request) -> Result<Response, WebError> {
        let mut builder = self
            .client
            .request(request.method, request.url)
            .headers(request.headers);
        if let Some(body) = request.body {
            builder = builder.body(body);
        }
        if let Some(timeout) = self.current_timeout() {
            builder = builder.timeout(timeout);
        }

        let response = builder.send().await.map_err(|e| WebError::Transport(e.to_string()))?;
        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|e| WebError::Body(e.to_string()))?
            .to_vec();

        Ok(Response { status, body })
    }
}
