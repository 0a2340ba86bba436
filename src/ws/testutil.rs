//! Scripted socket and hook doubles shared by the ws tests.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::server::CleanupHook;
use super::{Socket, WsError};

/// Socket double driven by scripted results. `recv` pends forever once its
/// script is exhausted, like a live connection with a quiet peer; `send`
/// succeeds unless a scripted error is queued.
#[derive(Default)]
pub struct ScriptSocket {
    pub sent: Mutex<Vec<Vec<u8>>>,
    pub send_results: Mutex<VecDeque<Result<(), WsError>>>,
    pub recv_results: Mutex<VecDeque<Result<Vec<u8>, WsError>>>,
    pub closed: AtomicUsize,
}

impl ScriptSocket {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_recv(results: Vec<Result<Vec<u8>, WsError>>) -> Self {
        Self { recv_results: Mutex::new(results.into()), ..Self::default() }
    }

    pub fn with_send_error(err: WsError) -> Self {
        Self { send_results: Mutex::new(VecDeque::from([Err(err)])), ..Self::default() }
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }

    pub fn close_count(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl Socket for ScriptSocket {
    async fn send(&self, data: Vec<u8>) -> Result<(), WsError> {
        self.sent.lock().unwrap().push(data);
        let next = self.send_results.lock().unwrap().pop_front();
        next.unwrap_or(Ok(()))
    }

    async fn recv(&self) -> Result<Vec<u8>, WsError> {
        let next = { self.recv_results.lock().unwrap().pop_front() };
        match next {
            Some(result) => result,
            None => std::future::pending().await,
        }
    }

    async fn close(&self) -> Result<(), WsError> {
        self.closed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Cleanup hook that counts its invocations.
#[derive(Default)]
pub struct CountingHook {
    calls: AtomicUsize,
}

impl CountingHook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl CleanupHook for CountingHook {
    async fn clean_up(&self, _identity: &str) -> Result<(), WsError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
