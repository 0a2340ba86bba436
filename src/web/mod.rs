//! HTTP verb helpers over a pluggable transport.
//!
//! DESIGN
//! ======
//! [`WebClient`] owns two injected capabilities: an [`HttpTransport`] that
//! executes prepared requests (real implementation: reqwest), and a
//! [`TokenSource`] consulted by the `*_auth` variants on every call. The
//! helper itself only builds the request (default `Content-Type`, caller
//! headers, auth header, optional timeout) and hands off to the transport.
//!
//! Non-success HTTP statuses are not errors at this layer: any response the
//! transport produces comes back as [`Response`] with its real status code
//! and fully-read body.

mod client;
mod transport;

pub use client::WebClient;
pub use transport::{HttpTransport, ReqwestTransport, Request};

// =============================================================================
// ERROR
// =============================================================================

/// Errors produced by the HTTP helper.
#[derive(Debug, thiserror::Error)]
pub enum WebError {
    /// The request URL could not be parsed. No network attempted.
    #[error("invalid request url: {0}")]
    InvalidUrl(String),

    /// A header name or value could not be constructed. No network attempted.
    #[error("invalid header {name}: {reason}")]
    InvalidHeader { name: String, reason: String },

    /// The underlying HTTP client could not be built.
    #[error("http client build failed: {0}")]
    ClientBuild(String),

    /// The transport failed before producing a response (connect refused,
    /// timeout elapsed, DNS failure).
    #[error("request failed: {0}")]
    Transport(String),

    /// The response body could not be read to completion.
    #[error("failed to read response body: {0}")]
    Body(String),
}

// =============================================================================
// TYPES
// =============================================================================

/// One caller-supplied header pair. Later pairs override earlier pairs with
/// the same name; the auth pair is applied after all caller pairs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub name: String,
    pub value: String,
}

impl Header {
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self { name: name.into(), value: value.into() }
    }
}

/// Status code and fully-read body of an HTTP response. 4xx/5xx statuses are
/// carried here unchanged, never turned into errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub body: Vec<u8>,
}

// =============================================================================
// TOKEN SOURCE
// =============================================================================

/// Where the `*_auth` variants find their bearer token.
///
/// `Env` reads the named environment variable fresh on every call, so
/// changing the variable between two calls changes the next header. An
/// unset variable yields an empty token, matching a missing configuration
/// rather than failing the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenSource {
    /// Read the token from this environment variable at call time.
    Env(String),
    /// Use this fixed token.
    Value(String),
}

impl TokenSource {
    pub(crate) fn token(&self) -> String {
        match self {
            Self::Env(var) => std::env::var(var).unwrap_or_default(),
            Self::Value(token) => token.clone(),
        }
    }
}

impl Default for TokenSource {
    /// The conventional `TOKEN` environment variable.
    fn default() -> Self {
        Self::Env("TOKEN".into())
    }
}
