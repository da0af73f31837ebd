//! Client configuration.

use std::time::Duration;

/// Tunables for a [`NekoClient`](crate::NekoClient).
///
/// The connection target itself lives on the connector; this covers the
/// session-level knobs. Sensible defaults are provided.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// How long a call waits for its matching response before failing
    /// with a timeout.
    ///
    /// Default: 60 seconds.
    pub request_timeout: Duration,

    /// Buffer capacity of each subscriber stream (events, responses,
    /// connection-lost). A subscriber that falls further behind than this
    /// starts losing the oldest notifications.
    ///
    /// Default: 256.
    pub subscriber_capacity: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(60),
            subscriber_capacity: 256,
        }
    }
}
