//! Unified error type for the Nekolink client.

use nekolink_call::CallError;
use nekolink_protocol::ProtocolError;
use nekolink_transport::TransportError;

/// Top-level error surfaced by [`NekoClient`](crate::NekoClient) calls.
///
/// Wraps the crate-specific errors via `#[from]` so `?` converts them
/// automatically, and adds the call-level outcomes that only the session
/// can decide: not connected, timed out, cancelled.
///
/// Per-frame decode failures on the receive loop never appear here — a
/// malformed inbound frame might belong to another in-flight call or be an
/// event, so it is logged and dropped rather than failing anyone's call.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// A transport-level error (connect, send, receive).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encoding a request, decoding a resolved
    /// response into its typed shape).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A correlation-level error (duplicate echo token).
    #[error(transparent)]
    Call(#[from] CallError),

    /// A call was attempted while no live connection exists. Raised before
    /// any token is registered.
    #[error("not connected to the gateway")]
    NotConnected,

    /// No matching response arrived within the configured duration. The
    /// registry entry has been removed; the token is free again.
    #[error("call timed out (echo={0})")]
    Timeout(String),

    /// The caller's cancellation signal fired before the response arrived.
    /// The registry entry has been removed.
    #[error("call cancelled (echo={0})")]
    Cancelled(String),
}
