//! Verb helpers: GET/PUT/POST/PATCH/DELETE plus authenticated variants.

use std::time::Duration;

use reqwest::Method;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use url::Url;

use super::transport::{HttpTransport, ReqwestTransport, Request};
use super::{Header, Response, TokenSource, WebError};

/// Thin HTTP client. Builds one request per call and delegates to the
/// injected transport; no retry or caching logic lives here.
pub struct WebClient<T = ReqwestTransport> {
    transport: T,
    token: TokenSource,
}

impl WebClient<ReqwestTransport> {
    /// Client over the real reqwest transport, reading bearer tokens from
    /// the `TOKEN` environment variable.
    ///
    /// # Errors
    ///
    /// Returns [`WebError::ClientBuild`] if the HTTP client cannot be built.
    pub fn new() -> Result<Self, WebError> {
        Ok(Self { transport: ReqwestTransport::new()?, token: TokenSource::default() })
    }
}

impl<T: HttpTransport> WebClient<T> {
    /// Client over a caller-supplied transport.
    pub fn with_transport(transport: T) -> Self {
        Self { transport, token: TokenSource::default() }
    }

    /// Replace the bearer-token source used by the `*_auth` variants.
    #[must_use]
    pub fn token_source(mut self, token: TokenSource) -> Self {
        self.token = token;
        self
    }

    // =========================================================================
    // VERBS
    // =========================================================================

    /// HTTP GET. A zero `timeout` leaves the transport timeout unconfigured.
    ///
    /// # Errors
    ///
    /// Construction errors if the URL or a header is malformed; transport
    /// errors if the request never produced a response.
    pub async fn get(&self, url: &str, timeout: Duration, headers: &[Header]) -> Result<Response, WebError> {
        self.dispatch(Method::GET, url, timeout, None, headers, false).await
    }

    /// Authenticated GET: [`WebClient::get`] plus a bearer token read from
    /// the token source at call time.
    ///
    /// # Errors
    ///
    /// Same as [`WebClient::get`].
    pub async fn get_auth(&self, url: &str, timeout: Duration, headers: &[Header]) -> Result<Response, WebError> {
        self.dispatch(Method::GET, url, timeout, None, headers, true).await
    }

    /// HTTP PUT with a request body.
    ///
    /// # Errors
    ///
    /// Same as [`WebClient::get`].
    pub async fn put(
        &self,
        url: &str,
        timeout: Duration,
        body: &[u8],
        headers: &[Header],
    ) -> Result<Response, WebError> {
        self.dispatch(Method::PUT, url, timeout, Some(body.to_vec()), headers, false).await
    }

    /// Authenticated PUT.
    ///
    /// # Errors
    ///
    /// Same as [`WebClient::get`].
    pub async fn put_auth(
        &self,
        url: &str,
        timeout: Duration,
        body: &[u8],
        headers: &[Header],
    ) -> Result<Response, WebError> {
        self.dispatch(Method::PUT, url, timeout, Some(body.to_vec()), headers, true).await
    }

    /// HTTP POST with a request body.
    ///
    /// # Errors
    ///
    /// Same as [`WebClient::get`].
    pub async fn post(
        &self,
        url: &str,
        timeout: Duration,
        body: &[u8],
        headers: &[Header],
    ) -> Result<Response, WebError> {
        self.dispatch(Method::POST, url, timeout, Some(body.to_vec()), headers, false).await
    }

    /// Authenticated POST.
    ///
    /// # Errors
    ///
    /// Same as [`WebClient::get`].
    pub async fn post_auth(
        &self,
        url: &str,
        timeout: Duration,
        body: &[u8],
        headers: &[Header],
    ) -> Result<Response, WebError> {
        self.dispatch(Method::POST, url, timeout, Some(body.to_vec()), headers, true).await
    }

    /// HTTP PATCH with a request body.
    ///
    /// # Errors
    ///
    /// Same as [`WebClient::get`].
    pub async fn patch(
        &self,
        url: &str,
        timeout: Duration,
        body: &[u8],
        headers: &[Header],
    ) -> Result<Response, WebError> {
        self.dispatch(Method::PATCH, url, timeout, Some(body.to_vec()), headers, false).await
    }

    /// Authenticated PATCH.
    ///
    /// # Errors
    ///
    /// Same as [`WebClient::get`].
    pub async fn patch_auth(
        &self,
        url: &str,
        timeout: Duration,
        body: &[u8],
        headers: &[Header],
    ) -> Result<Response, WebError> {
        self.dispatch(Method::PATCH, url, timeout, Some(body.to_vec()), headers, true).await
    }

    /// HTTP DELETE with a request body.
    ///
    /// # Errors
    ///
    /// Same as [`WebClient::get`].
    pub async fn delete(
        &self,
        url: &str,
        timeout: Duration,
        body: &[u8],
        headers: &[Header],
    ) -> Result<Response, WebError> {
        self.dispatch(Method::DELETE, url, timeout, Some(body.to_vec()), headers, false).await
    }

    /// Authenticated DELETE.
    ///
    /// # Errors
    ///
    /// Same as [`WebClient::get`].
    pub async fn delete_auth(
        &self,
        url: &str,
        timeout: Duration,
        body: &[u8],
        headers: &[Header],
    ) -> Result<Response, WebError> {
        self.dispatch(Method::DELETE, url, timeout, Some(body.to_vec()), headers, true).await
    }

    // =========================================================================
    // DISPATCH
    // =========================================================================

    /// Build headers in override order (default, caller, auth), configure the
    /// timeout when nonzero, and execute.
    async fn dispatch(
        &self,
        method: Method,
        url: &str,
        timeout: Duration,
        body: Option<Vec<u8>>,
        headers: &[Header],
        auth: bool,
    ) -> Result<Response, WebError> {
        let url = Url::parse(url).map_err(|e| WebError::InvalidUrl(e.to_string()))?;

        let mut header_map = HeaderMap::new();
        header_map.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        for header in headers {
            let (name, value) = parse_header(header)?;
            header_map.insert(name, value);
        }
        if auth {
            let bearer = format!("Bearer {}", self.token.token());
            let value = HeaderValue::from_str(&bearer).map_err(|e| WebError::InvalidHeader {
                name: AUTHORIZATION.to_string(),
                reason: e.to_string(),
            })?;
            header_map.insert(AUTHORIZATION, value);
        }

        // A zero duration means no explicit timeout is configured.
        if !timeout.is_zero() {
            self.transport.set_timeout(timeout);
        }

        self.transport
            .execute(Request { method, url, headers: header_map, body })
            .await
    }
}

fn parse_header(header: &Header) -> Result<(HeaderName, HeaderValue), WebError> {
    let name = HeaderName::from_bytes(header.name.as_bytes()).map_err(|e| WebError::InvalidHeader {
        name: header.name.clone(),
        reason: e.to_string(),
    })?;
    let value = HeaderValue::from_str(&header.value).map_err(|e| WebError::InvalidHeader {
        name: header.name.clone(),
        reason: e.to_string(),
    })?;
    Ok((name, value))
}

#[cfg(test)]
#[path = "client_test.rs"]
mod tests;
