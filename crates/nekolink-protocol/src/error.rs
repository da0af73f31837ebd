//! Error types for the protocol layer.
//!
//! Each crate in Nekolink defines its own error enum. A `ProtocolError`
//! always means a serialization problem, never a networking or
//! correlation one.

/// Errors that can occur in the protocol layer.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a value into a text frame).
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed (turning a text frame into a value).
    ///
    /// Common causes: malformed JSON, wrong data types, or truncated
    /// frames.
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The frame parsed but is invalid at the protocol level.
    #[error("invalid frame: {0}")]
    InvalidFrame(String),
}
