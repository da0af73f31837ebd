//! Socket abstraction layer for Nekolink.
//!
//! Provides the [`Connector`] and [`Connection`] traits that abstract over
//! the persistent socket the gateway speaks on. The core only needs four
//! things from a socket: connect, send one complete text frame, await one
//! complete text frame, and close — framing is the transport's problem.
//!
//! The trait methods return `impl Future + Send` rather than using
//! `async fn` so the session layer can hold connections behind generics
//! and still spawn its receive loop onto the runtime.
//!
//! # Feature Flags
//!
//! - `websocket` (default) — client transport via `tokio-tungstenite`

mod error;
#[cfg(feature = "websocket")]
mod websocket;

pub use error::TransportError;
#[cfg(feature = "websocket")]
pub use websocket::{WebSocketConnection, WebSocketConnector};

use std::fmt;
use std::future::Future;

/// Opaque identifier for a connection, for log correlation across
/// reconnects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Creates a new `ConnectionId` from a raw `u64`.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the underlying `u64` value.
    pub fn into_inner(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Establishes outbound connections to a gateway.
pub trait Connector: Send + Sync + 'static {
    /// The connection type produced by this connector.
    type Connection: Connection;

    /// Opens a new connection to the configured target.
    fn connect(
        &self,
    ) -> impl Future<Output = Result<Self::Connection, TransportError>> + Send;
}

/// A single open connection carrying whole text frames.
pub trait Connection: Send + Sync + 'static {
    /// Sends one complete text frame.
    fn send(&self, text: &str) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Receives the next complete text frame.
    ///
    /// Returns `Ok(None)` when the connection is cleanly closed by the
    /// remote end.
    fn recv(&self) -> impl Future<Output = Result<Option<String>, TransportError>> + Send;

    /// Closes the connection.
    fn close(&self) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Returns the unique identifier for this connection.
    fn id(&self) -> ConnectionId;
}
