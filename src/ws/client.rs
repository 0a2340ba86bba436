//! Outbound WebSocket connection: dial with a bearer token, write, read loop.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use url::Url;

use super::{Socket, WsError};

/// Establishes the transport for [`Connection::connect`]. The real
/// implementation is [`crate::ws::TungsteniteDialer`]; tests inject doubles.
#[async_trait::async_trait]
pub trait Dialer: Send + Sync {
    async fn dial(&self, url: &str, headers: &[(String, String)]) -> Result<Box<dyn Socket>, WsError>;
}

/// An owned client connection. The name is caller metadata only; nothing
/// looks connections up by it.
pub struct Connection {
    name: String,
    socket: Arc<dyn Socket>,
}

impl Connection {
    /// Dial `ws(s)://host/path` with an `Authorization: Bearer <token>`
    /// handshake header.
    ///
    /// # Errors
    ///
    /// [`WsError::MissingField`] if any argument is empty (checked before
    /// dialing), [`WsError::InvalidUrl`] if the target cannot be built, and
    /// [`WsError::Dial`] wrapping whatever the dialer reported.
    pub async fn connect(
        dialer: &dyn Dialer,
        secure: bool,
        name: &str,
        host: &str,
        path: &str,
        token: &str,
    ) -> Result<Self, WsError> {
        if name.is_empty() {
            return Err(WsError::MissingField("name"));
        }
        if host.is_empty() {
            return Err(WsError::MissingField("host"));
        }
        if path.is_empty() {
            return Err(WsError::MissingField("path"));
        }
        if token.is_empty() {
            return Err(WsError::MissingField("token"));
        }

        let scheme = if secure { "wss" } else { "ws" };
        let mut url =
            Url::parse(&format!("{scheme}://{host}")).map_err(|e| WsError::InvalidUrl(e.to_string()))?;
        url.set_path(path);

        info!(url = %url, "ws: connecting");
        let headers = [("Authorization".to_string(), format!("Bearer {token}"))];
        let socket = dialer
            .dial(url.as_str(), &headers)
            .await
            .map_err(|e| WsError::Dial(e.to_string()))?;

        info!(name, "ws: connected");
        Ok(Self { name: name.to_string(), socket: socket.into() })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Send one text-framed message.
    ///
    /// # Errors
    ///
    /// [`WsError::EmptyPayload`] before touching the transport; otherwise
    /// whatever the transport reported, unchanged.
    pub async fn write(&self, data: &[u8]) -> Result<(), WsError> {
        if data.is_empty() {
            return Err(WsError::EmptyPayload);
        }
        self.socket.send(data.to_vec()).await
    }

    /// Spawn the read loop. Each received message is delivered on `tx` in
    /// arrival order; a slow consumer blocks the loop (backpressure is the
    /// caller's concern).
    ///
    /// Cancellation ends the loop without further sends; callers that need
    /// the channel to remain observably open across cancellation keep their
    /// own sender clone. A read error is terminal: the loop exits and drops
    /// its sender, closing the channel once no other senders remain.
    pub fn read(&self, cancel: CancellationToken, tx: mpsc::Sender<Vec<u8>>) -> JoinHandle<()> {
        let socket = Arc::clone(&self.socket);
        let name = self.name.clone();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    biased;
                    () = cancel.cancelled() => return,
                    result = socket.recv() => match result {
                        Ok(message) => {
                            if tx.send(message).await.is_err() {
                                // Receiver dropped; nothing left to deliver to.
                                return;
                            }
                        }
                        Err(e) => {
                            warn!(name, error = %e, "ws: read failed, ending client read loop");
                            return;
                        }
                    },
                }
            }
        })
    }
}

#[cfg(test)]
#[path = "client_test.rs"]
mod tests;
