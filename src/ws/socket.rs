//! Real [`Socket`] implementations: tokio-tungstenite streams (client dials,
//! raw accepted connections) and axum's already-upgraded server sockets.
//!
//! Each adapter splits its stream into sink/receive halves behind separate
//! mutexes so one writer and one read loop can share the socket. Messages
//! are text-framed; inbound text and binary frames both surface as raw
//! bytes, ping/pong frames are skipped (the libraries answer them).

use axum::extract::ws::{Message as AxumMessage, WebSocket};
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::Mutex;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::header::{HeaderName, HeaderValue};
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::{WebSocketStream, connect_async};

use super::client::Dialer;
use super::{Socket, WsError};

// =============================================================================
// TUNGSTENITE SOCKET
// =============================================================================

/// [`Socket`] over a tokio-tungstenite stream: the transport behind client
/// dials and server-side `accept_async` connections.
pub struct TungsteniteSocket<S> {
    sink: Mutex<SplitSink<WebSocketStream<S>, Message>>,
    stream: Mutex<SplitStream<WebSocketStream<S>>>,
}

impl<S: AsyncRead + AsyncWrite + Unpin> TungsteniteSocket<S> {
    #[must_use]
    pub fn new(stream: WebSocketStream<S>) -> Self {
        let (sink, stream) = stream.split();
        Self { sink: Mutex::new(sink), stream: Mutex::new(stream) }
    }
}

#[async_trait::async_trait]
impl<S: AsyncRead + AsyncWrite + Unpin + Send> Socket for TungsteniteSocket<S> {
    async fn send(&self, data: Vec<u8>) -> Result<(), WsError> {
        let text = String::from_utf8(data).map_err(|e| WsError::NonTextPayload(e.to_string()))?;
        self.sink
            .lock()
            .await
            .send(Message::Text(text.into()))
            .await
            .map_err(|e| map_tungstenite(e, true))
    }

    async fn recv(&self) -> Result<Vec<u8>, WsError> {
        let mut stream = self.stream.lock().await;
        loop {
            match stream.next().await {
                None => return Err(WsError::Closed),
                Some(Err(e)) => return Err(map_tungstenite(e, false)),
                Some(Ok(Message::Text(text))) => return Ok(text.as_str().as_bytes().to_vec()),
                Some(Ok(Message::Binary(data))) => return Ok(data.to_vec()),
                Some(Ok(Message::Close(_))) => return Err(WsError::Closed),
                Some(Ok(_)) => {}
            }
        }
    }

    async fn close(&self) -> Result<(), WsError> {
        match self.sink.lock().await.close().await {
            Ok(()) => Ok(()),
            Err(e) => match map_tungstenite(e, true) {
                WsError::Closed => Ok(()),
                other => Err(other),
            },
        }
    }
}

/// Closure-class errors collapse to [`WsError::Closed`]; everything else
/// keeps its message under the write or read variant.
fn map_tungstenite(err: tungstenite::Error, on_write: bool) -> WsError {
    use std::io::ErrorKind;

    match err {
        tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed => WsError::Closed,
        tungstenite::Error::Io(io)
            if matches!(
                io.kind(),
                ErrorKind::UnexpectedEof
                    | ErrorKind::BrokenPipe
                    | ErrorKind::ConnectionReset
                    | ErrorKind::ConnectionAborted
            ) =>
        {
            WsError::Closed
        }
        err if on_write => WsError::Write(err.to_string()),
        err => WsError::Read(err.to_string()),
    }
}

// =============================================================================
// AXUM SOCKET
// =============================================================================

/// [`Socket`] over an already-upgraded [`axum::extract::ws::WebSocket`],
/// the transport an upgrade handler hands to [`crate::ws::Registry`].
///
/// axum surfaces send failures only once the peer is gone, so any send
/// error reads as [`WsError::Closed`].
pub struct AxumSocket {
    sink: Mutex<SplitSink<WebSocket, AxumMessage>>,
    stream: Mutex<SplitStream<WebSocket>>,
}

impl AxumSocket {
    #[must_use]
    pub fn new(socket: WebSocket) -> Self {
        let (sink, stream) = socket.split();
        Self { sink: Mutex::new(sink), stream: Mutex::new(stream) }
    }
}

#[async_trait::async_trait]
impl Socket for AxumSocket {
    async fn send(&self, data: Vec<u8>) -> Result<(), WsError> {
        let text = String::from_utf8(data).map_err(|e| WsError::NonTextPayload(e.to_string()))?;
        self.sink
            .lock()
            .await
            .send(AxumMessage::Text(text.into()))
            .await
            .map_err(|_| WsError::Closed)
    }

    async fn recv(&self) -> Result<Vec<u8>, WsError> {
        let mut stream = self.stream.lock().await;
        loop {
            match stream.next().await {
                None => return Err(WsError::Closed),
                Some(Err(e)) => return Err(WsError::Read(e.to_string())),
                Some(Ok(AxumMessage::Text(text))) => return Ok(text.as_str().as_bytes().to_vec()),
                Some(Ok(AxumMessage::Binary(data))) => return Ok(data.to_vec()),
                Some(Ok(AxumMessage::Close(_))) => return Err(WsError::Closed),
                Some(Ok(_)) => {}
            }
        }
    }

    async fn close(&self) -> Result<(), WsError> {
        let _ = self.sink.lock().await.close().await;
        Ok(())
    }
}

// =============================================================================
// DIALER
// =============================================================================

/// Real [`Dialer`] over [`tokio_tungstenite::connect_async`].
pub struct TungsteniteDialer;

#[async_trait::async_trait]
impl Dialer for TungsteniteDialer {
    async fn dial(&self, url: &str, headers: &[(String, String)]) -> Result<Box<dyn Socket>, WsError> {
        let mut request = url
            .into_client_request()
            .map_err(|e| WsError::Handshake(e.to_string()))?;
        for (name, value) in headers {
            let name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| WsError::Handshake(e.to_string()))?;
            let value = HeaderValue::from_str(value).map_err(|e| WsError::Handshake(e.to_string()))?;
            request.headers_mut().insert(name, value);
        }

        let (stream, _response) = connect_async(request)
            .await
            .map_err(|e| WsError::Handshake(e.to_string()))?;
        Ok(Box::new(TungsteniteSocket::new(stream)))
    }
}

#[cfg(test)]
#[path = "socket_test.rs"]
mod tests;
