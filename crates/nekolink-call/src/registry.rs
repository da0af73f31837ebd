//! The pending-call registry: one waiter per outstanding correlation token.
//!
//! Every call on a multiplexed connection picks an opaque echo token,
//! parks a waiter here, and resumes when a response frame carrying the
//! same token arrives. The registry owns the token lifecycle end to end:
//! registration, fulfillment exactly once, and removal on timeout or
//! cancellation. A token is released the instant its call terminates —
//! never left dangling.
//!
//! # Concurrency
//!
//! The map is a sharded concurrent map, so the receive loop resolving one
//! token never blocks another task registering or removing a different
//! one. The waiting caller holds only the receiver half of a oneshot
//! channel — the registry entry itself is owned exclusively by the
//! registry from registration to removal.

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use rand::Rng;
use tokio::sync::oneshot;

use crate::CallError;

/// Tracks all pending calls for one session, keyed by echo token.
///
/// Scoped to a single session instance by construction: two sessions never
/// share correlation-token space.
#[derive(Debug, Default)]
pub struct CallRegistry {
    pending: DashMap<String, oneshot::Sender<String>>,
}

impl CallRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a waiter for `echo`.
    ///
    /// # Errors
    /// Returns [`CallError::DuplicateEcho`] if the token already has an
    /// outstanding waiter. That is a caller bug (two concurrent calls
    /// sharing a token) and is surfaced immediately, before anything is
    /// sent.
    pub fn register(&self, echo: &str) -> Result<CallWaiter, CallError> {
        match self.pending.entry(echo.to_string()) {
            Entry::Occupied(_) => Err(CallError::DuplicateEcho(echo.to_string())),
            Entry::Vacant(slot) => {
                let (tx, rx) = oneshot::channel();
                slot.insert(tx);
                tracing::trace!(echo, "call registered");
                Ok(CallWaiter { rx })
            }
        }
    }

    /// Fulfills the waiter for `echo` with the raw response payload.
    ///
    /// At most one resolve per token succeeds: the entry is removed before
    /// the payload is delivered, so a second resolve — or a resolve after
    /// [`remove`](Self::remove) — is a `false` no-op.
    pub fn resolve(&self, echo: &str, payload: String) -> bool {
        match self.pending.remove(echo) {
            Some((_, tx)) => {
                // A dropped receiver (caller gave up between our remove and
                // this send) still counts as consumed.
                let delivered = tx.send(payload).is_ok();
                tracing::trace!(echo, delivered, "call resolved");
                true
            }
            None => false,
        }
    }

    /// Unconditionally drops any entry for `echo`.
    ///
    /// Used on timeout and cancellation so a late response can no longer
    /// be misattributed. Returns `true` if an entry was removed.
    pub fn remove(&self, echo: &str) -> bool {
        let removed = self.pending.remove(echo).is_some();
        if removed {
            tracing::trace!(echo, "call removed");
        }
        removed
    }

    /// Number of outstanding calls.
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Returns `true` if no calls are outstanding.
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

/// The caller's handle on one pending call.
#[derive(Debug)]
pub struct CallWaiter {
    rx: oneshot::Receiver<String>,
}

impl CallWaiter {
    /// Waits for the raw response payload.
    ///
    /// Returns `None` if the registry entry was dropped without a payload
    /// (removed on timeout/cancel, or the registry itself went away).
    pub async fn wait(self) -> Option<String> {
        self.rx.await.ok()
    }
}

/// Generates a random 32-character hex echo token (128 bits of entropy).
///
/// Unique among concurrently outstanding calls with overwhelming
/// probability; callers may still supply their own tokens.
pub fn generate_echo() -> String {
    let mut rng = rand::rng();
    let bytes: [u8; 16] = rng.random();
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

// =========================================================================
// Tests
// =========================================================================
