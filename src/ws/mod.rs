//! WebSocket connection wrappers for client and server roles.
//!
//! DESIGN
//! ======
//! Both roles wrap an already-established transport behind the [`Socket`]
//! capability: a send/receive/close seam implemented for tokio-tungstenite
//! streams and axum's upgraded sockets, and swapped for scripted doubles in
//! tests. The wrappers add exactly three things on top of the transport:
//! input validation, a spawned read loop delivering messages on a channel,
//! and (server side) registry bookkeeping on terminal errors.
//!
//! Read loops race a [`tokio_util::sync::CancellationToken`] against the
//! blocking read each iteration. Cancellation ends the loop without touching
//! the registry; a read error is terminal for the connection instance. No
//! retry or reconnect logic lives here.

pub mod client;
pub mod registry;
pub mod server;
pub mod socket;

#[cfg(test)]
pub(crate) mod testutil;

pub use client::{Connection, Dialer};
pub use registry::Registry;
pub use server::{CleanupHook, ConnectedClient, Inbound, NoopCleanup};
pub use socket::{AxumSocket, TungsteniteDialer, TungsteniteSocket};

// =============================================================================
// ERROR
// =============================================================================

/// Errors produced by WebSocket connection wrappers and transports.
#[derive(Debug, thiserror::Error)]
pub enum WsError {
    /// A required connect argument was empty. Reported before dialing.
    #[error("missing required connect field: {0}")]
    MissingField(&'static str),

    /// The target URL could not be built from host and path.
    #[error("invalid websocket url: {0}")]
    InvalidUrl(String),

    /// The dial handshake failed. Carries the underlying cause.
    #[error("failed to dial websocket: {0}")]
    Dial(String),

    /// A dialer implementation failed before or during the handshake.
    #[error("websocket handshake failed: {0}")]
    Handshake(String),

    /// Empty payloads are rejected before touching the transport.
    #[error("cannot write an empty payload")]
    EmptyPayload,

    /// Messages are text-framed; the payload must be valid UTF-8.
    #[error("payload is not valid utf-8: {0}")]
    NonTextPayload(String),

    /// The connection no longer holds a transport (already closed).
    #[error("connection is detached")]
    Detached,

    /// The peer closed the connection (EOF-equivalent).
    #[error("connection closed")]
    Closed,

    /// A transport write failed without indicating closure.
    #[error("websocket write failed: {0}")]
    Write(String),

    /// A transport read failed. Any read error is terminal.
    #[error("websocket read failed: {0}")]
    Read(String),
}

// =============================================================================
// SOCKET CAPABILITY
// =============================================================================

/// One open WebSocket transport: text-framed send, blocking receive, close.
///
/// Implementations are internally synchronized so a writer and one read loop
/// can share the same socket. `recv` resolves with one message payload, or
/// [`WsError::Closed`] once the peer has closed; `send` reports closure as
/// [`WsError::Closed`] and any other failure as [`WsError::Write`].
#[async_trait::async_trait]
pub trait Socket: Send + Sync {
    async fn send(&self, data: Vec<u8>) -> Result<(), WsError>;

    async fn recv(&self) -> Result<Vec<u8>, WsError>;

    /// Close the transport. Closing an already-closed socket is a no-op.
    async fn close(&self) -> Result<(), WsError>;
}
