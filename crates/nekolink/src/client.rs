//! `NekoClient`: the transport session.
//!
//! One client owns one persistent gateway connection and everything that
//! rides on it: the receive loop, the pending-call registry, and the
//! subscriber streams. The link moves through a small state machine:
//!
//! ```text
//!   Idle ──(connect)──→ Connecting ──→ Open ──(disconnect)──→ Closing ──→ Closed
//!                                       │
//!                                       └──(recv error / remote close)──→ faulted
//! ```
//!
//! `Connecting` and `Closing` are transient: they exist only while the
//! link mutex is held, which is also what guarantees a single connect
//! attempt in flight. The faulted path leaves the state `Open` with a dead
//! `alive` flag; both `connect` and calls treat that the same as closed.
//!
//! While `Open`, exactly one receive loop reads frames in arrival order
//! and dispatches each one: events go to the event stream, responses
//! resolve their pending call (if the echo matches one) and always go to
//! the response stream. The loop exiting — for any reason — fires the
//! connection-lost stream exactly once per connection.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use nekolink_call::{generate_echo, CallRegistry};
use nekolink_protocol::{
    classify_frame, ApiCall, ApiRequest, ApiResponse, Codec, Event, InboundFrame, JsonCodec,
};
use nekolink_transport::{Connection, Connector, WebSocketConnector};

use crate::{ClientConfig, ClientError};

// ---------------------------------------------------------------------------
// Per-call options
// ---------------------------------------------------------------------------

/// Options for a single call.
///
/// Everything is optional: an omitted echo is generated, an omitted
/// timeout falls back to [`ClientConfig::request_timeout`], and an omitted
/// cancellation token never fires.
#[derive(Debug, Clone, Default)]
pub struct CallOptions {
    /// Caller-supplied correlation token. Must be unique among the
    /// session's outstanding calls.
    pub echo: Option<String>,
    /// Per-call override of the response timeout.
    pub timeout: Option<Duration>,
    /// External cancellation signal; whichever of response, timeout, and
    /// cancellation fires first decides the call's outcome.
    pub cancel: Option<CancellationToken>,
}

impl CallOptions {
    /// Creates empty options (all defaults).
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a caller-supplied echo token.
    pub fn echo(mut self, echo: impl Into<String>) -> Self {
        self.echo = Some(echo.into());
        self
    }

    /// Sets a per-call timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Attaches an external cancellation signal.
    pub fn cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = Some(cancel);
        self
    }
}

// ---------------------------------------------------------------------------
// Link state
// ---------------------------------------------------------------------------

enum Link<Conn> {
    Idle,
    Open(OpenLink<Conn>),
    Closed,
}

struct OpenLink<Conn> {
    conn: Arc<Conn>,
    /// Cleared by the receive loop when it exits, however it exits.
    alive: Arc<AtomicBool>,
    stop: CancellationToken,
    task: JoinHandle<()>,
}

impl<Conn> OpenLink<Conn> {
    fn is_alive(&self) -> bool {
        self.alive.load(Ordering::Acquire)
    }
}

// ---------------------------------------------------------------------------
// Shared state
// ---------------------------------------------------------------------------

struct Shared<T: Connector, C: Codec> {
    connector: T,
    codec: C,
    config: ClientConfig,
    calls: CallRegistry,
    link: Mutex<Link<T::Connection>>,
    events: broadcast::Sender<Event>,
    responses: broadcast::Sender<ApiResponse>,
    disconnects: broadcast::Sender<()>,
}

impl<T: Connector, C: Codec> Shared<T, C> {
    /// Routes one inbound frame. Decode-level failures are isolated to the
    /// frame: log and move on, never tear down the loop.
    fn dispatch_frame(&self, text: &str) {
        match classify_frame(text) {
            InboundFrame::Event(event) => {
                tracing::trace!(post_type = event.post_type(), "event received");
                let _ = self.events.send(*event);
            }
            InboundFrame::Response(envelope) => {
                if let Some(echo) = envelope
                    .echo
                    .as_deref()
                    .filter(|e| !e.trim().is_empty())
                {
                    // The waiter gets the raw frame so the caller can pick
                    // its own typed shape for the payload.
                    self.calls.resolve(echo, text.to_string());
                }
                // Matched or not, the envelope always reaches the generic
                // response stream.
                let _ = self.responses.send(envelope);
            }
            InboundFrame::Unparseable => {
                tracing::debug!(frame = text, "dropping unparseable frame");
            }
        }
    }
}

/// The receive loop for one connection. Runs until the stop token fires,
/// the remote closes, or a read fails.
async fn receive_loop<T: Connector, C: Codec>(
    shared: Arc<Shared<T, C>>,
    conn: Arc<T::Connection>,
    alive: Arc<AtomicBool>,
    stop: CancellationToken,
) {
    let conn_id = conn.id();
    tracing::debug!(%conn_id, "receive loop started");

    loop {
        tokio::select! {
            _ = stop.cancelled() => {
                tracing::debug!(%conn_id, "receive loop cancelled");
                break;
            }
            frame = conn.recv() => match frame {
                Ok(Some(text)) => shared.dispatch_frame(&text),
                Ok(None) => {
                    tracing::info!(%conn_id, "connection closed by remote");
                    break;
                }
                Err(e) => {
                    tracing::warn!(%conn_id, error = %e, "receive failed");
                    break;
                }
            }
        }
    }

    alive.store(false, Ordering::Release);
    // The loop runs once and exits once, so this notification fires
    // exactly once per connection, whichever way the link went down.
    let _ = shared.disconnects.send(());
    tracing::debug!(%conn_id, "receive loop ended");
}

// ---------------------------------------------------------------------------
// NekoClient
// ---------------------------------------------------------------------------

/// Async client for an OneBot-style gateway.
///
/// Cheap to clone; all clones share one connection, one pending-call
/// registry, and one set of subscriber streams.
///
/// # Example
///
/// ```rust,no_run
/// use nekolink::prelude::*;
///
/// # async fn run() -> Result<(), ClientError> {
/// let client = NekoClient::builder()
///     .url("ws://127.0.0.1:3001")
///     .build();
/// client.connect().await?;
///
/// let chain = MessageChain::new().at(10001_i64).text("hello");
/// let sent = client.send_group_msg(123456, chain).await?;
/// println!("message_id = {:?}", sent.data.map(|d| d.message_id));
/// # Ok(())
/// # }
/// ```
pub struct NekoClient<T: Connector, C: Codec = JsonCodec> {
    shared: Arc<Shared<T, C>>,
}

impl<T: Connector, C: Codec> Clone for NekoClient<T, C> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl NekoClient<WebSocketConnector> {
    /// Creates a builder for the default WebSocket + JSON stack.
    pub fn builder() -> NekoClientBuilder {
        NekoClientBuilder::new()
    }
}

impl<T: Connector> NekoClient<T> {
    /// Creates a client over the given connector with the JSON codec and
    /// default configuration.
    pub fn new(connector: T) -> Self {
        Self::with_parts(connector, JsonCodec, ClientConfig::default())
    }

    /// Creates a client over the given connector with the JSON codec.
    pub fn with_config(connector: T, config: ClientConfig) -> Self {
        Self::with_parts(connector, JsonCodec, config)
    }
}

impl<T: Connector, C: Codec> NekoClient<T, C> {
    /// Creates a client from explicit connector, codec, and configuration.
    pub fn with_parts(connector: T, codec: C, config: ClientConfig) -> Self {
        let (events, _) = broadcast::channel(config.subscriber_capacity);
        let (responses, _) = broadcast::channel(config.subscriber_capacity);
        let (disconnects, _) = broadcast::channel(config.subscriber_capacity);

        Self {
            shared: Arc::new(Shared {
                connector,
                codec,
                config,
                calls: CallRegistry::new(),
                link: Mutex::new(Link::Idle),
                events,
                responses,
                disconnects,
            }),
        }
    }

    /// Opens the connection and starts the receive loop.
    ///
    /// A no-op while a live connection is open. Only one connect attempt
    /// is ever in flight: concurrent callers queue on the link lock and
    /// find the connection open when they get it. After a disconnect —
    /// explicit or faulted — calling this again establishes a fresh
    /// connection.
    ///
    /// # Errors
    /// Returns a [`ClientError::Transport`] if dialing the gateway fails.
    pub async fn connect(&self) -> Result<(), ClientError> {
        let mut link = self.shared.link.lock().await;
        if let Link::Open(open) = &*link {
            if open.is_alive() {
                tracing::debug!("connect called while already open");
                return Ok(());
            }
        }

        let conn = Arc::new(self.shared.connector.connect().await?);
        let alive = Arc::new(AtomicBool::new(true));
        let stop = CancellationToken::new();

        let task = tokio::spawn(receive_loop(
            Arc::clone(&self.shared),
            Arc::clone(&conn),
            Arc::clone(&alive),
            stop.clone(),
        ));

        *link = Link::Open(OpenLink {
            conn,
            alive,
            stop,
            task,
        });
        tracing::info!("connected to gateway");
        Ok(())
    }

    /// Closes the connection: stops the receive loop, sends a close frame
    /// if the socket is still up, and waits for the loop to finish.
    ///
    /// The connection-lost notification is fired by the loop itself, so it
    /// has already been delivered by the time this returns. A no-op when
    /// not connected.
    pub async fn disconnect(&self) {
        let mut link = self.shared.link.lock().await;
        let Link::Open(open) = std::mem::replace(&mut *link, Link::Closed) else {
            return;
        };

        tracing::info!("disconnecting from gateway");
        open.stop.cancel();
        if let Err(e) = open.conn.close().await {
            tracing::debug!(error = %e, "close frame failed");
        }
        if let Err(e) = open.task.await {
            tracing::debug!(error = %e, "receive loop join failed");
        }
    }

    /// Returns `true` while a live connection is open.
    pub async fn is_connected(&self) -> bool {
        matches!(&*self.shared.link.lock().await, Link::Open(open) if open.is_alive())
    }

    /// Subscribes to decoded gateway events.
    pub fn events(&self) -> broadcast::Receiver<Event> {
        self.shared.events.subscribe()
    }

    /// Subscribes to every inbound response envelope, matched to a pending
    /// call or not.
    pub fn responses(&self) -> broadcast::Receiver<ApiResponse> {
        self.shared.responses.subscribe()
    }

    /// Subscribes to connection-lost notifications (one per connection).
    pub fn disconnects(&self) -> broadcast::Receiver<()> {
        self.shared.disconnects.subscribe()
    }

    /// Issues a typed call with default options.
    pub async fn call<A: ApiCall>(
        &self,
        params: A::Params,
    ) -> Result<ApiResponse<A::Output>, ClientError> {
        self.call_with::<A>(params, CallOptions::default()).await
    }

    /// Issues a typed call.
    ///
    /// # Errors
    /// - [`ClientError::NotConnected`] — no live connection; nothing was
    ///   registered or sent.
    /// - [`ClientError::Call`] — the echo token already has a pending call.
    /// - [`ClientError::Timeout`] / [`ClientError::Cancelled`] — the timer
    ///   or the cancellation signal won the race; the token was released.
    /// - [`ClientError::Protocol`] — the resolved response payload did not
    ///   deserialize into the requested shape.
    pub async fn call_with<A: ApiCall>(
        &self,
        params: A::Params,
        options: CallOptions,
    ) -> Result<ApiResponse<A::Output>, ClientError> {
        let text = self.dispatch(A::ACTION, &params, options).await?;
        Ok(self.shared.codec.decode(&text)?)
    }

    /// Issues an untyped call with default options; the response payload
    /// stays a raw JSON value.
    pub async fn send_raw(
        &self,
        action: &str,
        params: serde_json::Value,
    ) -> Result<ApiResponse, ClientError> {
        self.send_raw_with(action, params, CallOptions::default()).await
    }

    /// Issues an untyped call.
    pub async fn send_raw_with(
        &self,
        action: &str,
        params: serde_json::Value,
        options: CallOptions,
    ) -> Result<ApiResponse, ClientError> {
        let text = self.dispatch(action, &params, options).await?;
        Ok(self.shared.codec.decode(&text)?)
    }

    /// The correlation core: register, send, race, deliver.
    async fn dispatch<P: Serialize + Send + Sync>(
        &self,
        action: &str,
        params: &P,
        options: CallOptions,
    ) -> Result<String, ClientError> {
        // Fail fast, before a token is registered.
        let conn = self.live_connection().await?;

        let echo = options.echo.unwrap_or_else(generate_echo);
        let timeout = options
            .timeout
            .unwrap_or(self.shared.config.request_timeout);
        let cancel = options.cancel.unwrap_or_default();

        let waiter = self.shared.calls.register(&echo)?;
        // Covers every exit from here on — error returns and callers that
        // drop the future mid-wait both release the token.
        let mut guard = CallGuard {
            calls: &self.shared.calls,
            echo: echo.clone(),
            armed: true,
        };

        let frame = self.shared.codec.encode(&ApiRequest {
            action,
            params,
            echo: &echo,
        })?;
        tracing::debug!(action, echo = %echo, "sending call");
        conn.send(&frame).await?;

        let payload = tokio::select! {
            payload = waiter.wait() => payload,
            _ = tokio::time::sleep(timeout) => {
                tracing::debug!(echo = %echo, "call timed out");
                return Err(ClientError::Timeout(echo));
            }
            _ = cancel.cancelled() => {
                tracing::debug!(echo = %echo, "call cancelled");
                return Err(ClientError::Cancelled(echo));
            }
        };

        // Resolution already consumed the registry entry; disarm so the
        // guard cannot touch a token someone re-registers later.
        guard.armed = false;

        match payload {
            Some(text) => Ok(text),
            // The entry was dropped without a payload. That only happens
            // when something removed it out from under us; surface it the
            // same way an expiry would.
            None => Err(ClientError::Timeout(echo)),
        }
    }

    async fn live_connection(&self) -> Result<Arc<T::Connection>, ClientError> {
        let link = self.shared.link.lock().await;
        match &*link {
            Link::Open(open) if open.is_alive() => Ok(Arc::clone(&open.conn)),
            _ => Err(ClientError::NotConnected),
        }
    }
}

/// Removes a registry entry on drop unless disarmed.
struct CallGuard<'a> {
    calls: &'a CallRegistry,
    echo: String,
    armed: bool,
}

impl Drop for CallGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.calls.remove(&self.echo);
        }
    }
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Builder for the default WebSocket + JSON client.
pub struct NekoClientBuilder {
    url: String,
    config: ClientConfig,
}

impl NekoClientBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            url: "ws://127.0.0.1:3001".to_string(),
            config: ClientConfig::default(),
        }
    }

    /// Sets the gateway URL.
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    /// Sets the per-call response timeout.
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.config.request_timeout = timeout;
        self
    }

    /// Replaces the whole configuration.
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    /// Builds the client. The connection is established separately with
    /// [`NekoClient::connect`].
    pub fn build(self) -> NekoClient<WebSocketConnector> {
        NekoClient::with_config(WebSocketConnector::new(self.url), self.config)
    }
}

impl Default for NekoClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}
