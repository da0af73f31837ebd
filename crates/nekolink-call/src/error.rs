//! Error types for the call-correlation layer.

/// Errors that can occur while managing pending calls.
#[derive(Debug, thiserror::Error)]
pub enum CallError {
    /// A waiter is already registered for this echo token.
    ///
    /// Two concurrent calls sharing a token is a programming error on the
    /// caller's side; it is rejected up front rather than queued, so the
    /// colliding call fails before anything reaches the wire.
    #[error("duplicate echo token: {0}")]
    DuplicateEcho(String),
}
