//! Request/response correlation for Nekolink.
//!
//! This crate owns the lifecycle of outstanding calls on a multiplexed
//! connection:
//!
//! 1. **Registration** — a call claims its echo token before sending
//!    ([`CallRegistry::register`]).
//! 2. **Fulfillment** — the receive loop hands a matching response to
//!    exactly one waiter ([`CallRegistry::resolve`]).
//! 3. **Release** — timeout and cancellation drop the entry so a late
//!    response cannot be misattributed ([`CallRegistry::remove`]).
//!
//! # How it fits in the stack
//!
//! ```text
//! Client session (above)  ← races waiters against timeouts/cancellation
//!     ↕
//! Call layer (this crate) ← maps echo tokens to single-resolution waiters
//!     ↕
//! Protocol layer (below)  ← puts the echo token on the wire
//! ```

mod error;
mod registry;

pub use error::CallError;
pub use registry::{generate_echo, CallRegistry, CallWaiter};
