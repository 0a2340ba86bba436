//! Process-wide identity → connection map.
//!
//! The registry is the only shared mutable state in this crate. All
//! mutation goes through [`Registry::register`] and [`Registry::remove`] so
//! concurrent connection tasks never touch the map unsynchronized.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::info;

use super::Socket;
use super::server::{CleanupHook, ConnectedClient};

/// Synchronized map of connected clients keyed by user identity. Cloning is
/// cheap and shares the underlying map.
#[derive(Clone, Default)]
pub struct Registry {
    clients: Arc<RwLock<HashMap<String, ConnectedClient>>>,
}

impl Registry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap an already-upgraded transport and insert it under `identity`.
    ///
    /// The insert is a blind overwrite: a prior entry for the same identity
    /// is replaced without cleanup. Callers that need reject-duplicate
    /// semantics check [`Registry::lookup`] before registering.
    pub async fn register(
        &self,
        identity: impl Into<String>,
        socket: Arc<dyn Socket>,
        hook: Arc<dyn CleanupHook>,
    ) -> ConnectedClient {
        let identity = identity.into();
        let client = ConnectedClient::new(identity.clone(), socket, hook, self.clone());
        let mut clients = self.clients.write().await;
        clients.insert(identity.clone(), client.clone());
        info!(%identity, clients = clients.len(), "ws: client registered");
        client
    }

    pub async fn lookup(&self, identity: &str) -> Option<ConnectedClient> {
        self.clients.read().await.get(identity).cloned()
    }

    pub async fn contains(&self, identity: &str) -> bool {
        self.clients.read().await.contains_key(identity)
    }

    /// Remove and return the entry for `identity`, if any. Terminal-error
    /// paths and explicit close both funnel through here; a removed entry is
    /// never resurrected by the same connection instance.
    pub async fn remove(&self, identity: &str) -> Option<ConnectedClient> {
        let removed = self.clients.write().await.remove(identity);
        if removed.is_some() {
            info!(%identity, "ws: client deregistered");
        }
        removed
    }

    pub async fn len(&self) -> usize {
        self.clients.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.clients.read().await.is_empty()
    }
}

#[cfg(test)]
#[path = "registry_test.rs"]
mod tests;
