//! Thin HTTP and WebSocket helpers.
//!
//! Two small surfaces:
//! - [`web`]: HTTP verb wrappers over a pluggable transport, with optional
//!   bearer-token authentication and per-request timeouts.
//! - [`ws`]: WebSocket connection wrappers for client and server roles,
//!   plus a server-side registry keyed by user identity.
//!
//! Both surfaces take their transports as injected capabilities with real
//! implementations provided (reqwest, tokio-tungstenite, axum), so tests
//! substitute deterministic doubles without network I/O. Resilience policy
//! (retries, backoff, reconnection) belongs to the caller.

pub mod web;
pub mod ws;
