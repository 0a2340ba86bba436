//! Server-side connected client.
//!
//! DESIGN
//! ======
//! A [`ConnectedClient`] pairs a user identity with an upgraded transport
//! and a caller-supplied [`CleanupHook`]. Terminal conditions (a write that
//! hits a closed peer, any read error, an explicit [`ConnectedClient::close`])
//! remove the registry entry, run the hook once, and close the transport.
//! Transient write errors leave the entry in place so the caller may retry.
//!
//! LIFECYCLE
//! =========
//! 1. [`crate::ws::Registry::register`] inserts the client under its identity
//! 2. `read` spawns the per-connection loop delivering [`Inbound`] messages
//! 3. Cancellation ends the loop silently (registry untouched, caller owns
//!    explicit cleanup); a read error deregisters and ends the loop
//! 4. The transport is closed on every loop exit path

use std::sync::{Arc, Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use super::registry::Registry;
use super::{Socket, WsError};

// =============================================================================
// CAPABILITIES
// =============================================================================

/// Caller-side bookkeeping invoked when a connection is torn down, in
/// addition to the registry's own removal. Hook failures are logged and
/// never propagated.
#[async_trait::async_trait]
pub trait CleanupHook: Send + Sync {
    async fn clean_up(&self, identity: &str) -> Result<(), WsError>;
}

/// Hook for callers with no external bookkeeping.
pub struct NoopCleanup;

#[async_trait::async_trait]
impl CleanupHook for NoopCleanup {
    async fn clean_up(&self, _identity: &str) -> Result<(), WsError> {
        Ok(())
    }
}

// =============================================================================
// INBOUND MESSAGE
// =============================================================================

/// One message read from a connection, tagged with the sending identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inbound {
    pub from: String,
    pub data: Vec<u8>,
}

// =============================================================================
// CONNECTED CLIENT
// =============================================================================

/// A registered server-side connection. Clones share the same transport and
/// registry entry; the registry itself holds one.
#[derive(Clone)]
pub struct ConnectedClient {
    identity: String,
    socket: Arc<Mutex<Option<Arc<dyn Socket>>>>,
    hook: Arc<dyn CleanupHook>,
    registry: Registry,
}

impl ConnectedClient {
    pub(crate) fn new(
        identity: String,
        socket: Arc<dyn Socket>,
        hook: Arc<dyn CleanupHook>,
        registry: Registry,
    ) -> Self {
        Self { identity, socket: Arc::new(Mutex::new(Some(socket))), hook, registry }
    }

    #[must_use]
    pub fn identity(&self) -> &str {
        &self.identity
    }

    /// Send one text-framed message to this client.
    ///
    /// # Errors
    ///
    /// [`WsError::EmptyPayload`] and [`WsError::Detached`] are reported
    /// before touching the transport. A transport [`WsError::Closed`] tears
    /// the connection down (deregister, hook, close) and is returned; any
    /// other transport error is returned with the registry entry preserved.
    pub async fn write(&self, data: &[u8]) -> Result<(), WsError> {
        if data.is_empty() {
            return Err(WsError::EmptyPayload);
        }
        let Some(socket) = self.current_socket() else {
            return Err(WsError::Detached);
        };

        match socket.send(data.to_vec()).await {
            Err(WsError::Closed) => {
                warn!(identity = %self.identity, "ws: peer closed during write, tearing down");
                self.deregister().await;
                self.close_socket().await;
                Err(WsError::Closed)
            }
            result => result,
        }
    }

    /// Spawn the read loop. Messages go out on `tx` when supplied; with no
    /// channel the payloads are discarded and the connection stays alive for
    /// write-only consumers. The transport is closed on every exit path.
    ///
    /// Cancellation ends the loop without touching the registry. A read
    /// error deregisters this identity, runs the hook, and ends the loop
    /// with no further channel activity.
    ///
    /// # Errors
    ///
    /// [`WsError::Detached`] if the connection was already closed.
    pub fn read(
        &self,
        cancel: CancellationToken,
        tx: Option<mpsc::Sender<Inbound>>,
    ) -> Result<JoinHandle<()>, WsError> {
        let Some(socket) = self.current_socket() else {
            return Err(WsError::Detached);
        };
        let client = self.clone();

        Ok(tokio::spawn(async move {
            loop {
                tokio::select! {
                    biased;
                    () = cancel.cancelled() => break,
                    result = socket.recv() => match result {
                        Ok(data) => {
                            if let Some(tx) = &tx {
                                // A dropped consumer is not terminal; the
                                // connection stays usable for writes.
                                let _ = tx.send(Inbound { from: client.identity.clone(), data }).await;
                            }
                        }
                        Err(e) => {
                            warn!(identity = %client.identity, error = %e, "ws: read failed, ending connection");
                            client.deregister().await;
                            break;
                        }
                    },
                }
            }
            client.close_socket().await;
        }))
    }

    /// Deregister and close the transport. Idempotent: a second close is a
    /// no-op and the cleanup hook runs at most once per registration.
    pub async fn close(&self) {
        self.deregister().await;
        self.close_socket().await;
    }

    fn current_socket(&self) -> Option<Arc<dyn Socket>> {
        self.socket.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Only the call that actually removes the registry entry runs the hook.
    async fn deregister(&self) {
        if self.registry.remove(&self.identity).await.is_some() {
            if let Err(e) = self.hook.clean_up(&self.identity).await {
                warn!(identity = %self.identity, error = %e, "ws: cleanup hook failed");
            }
        }
    }

    async fn close_socket(&self) {
        let socket = self.socket.lock().unwrap_or_else(PoisonError::into_inner).take();
        if let Some(socket) = socket {
            let _ = socket.close().await;
        }
    }
}

#[cfg(test)]
#[path = "server_test.rs"]
mod tests;
