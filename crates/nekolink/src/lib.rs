//! # Nekolink
//!
//! Async client for OneBot-style chat-bot gateways: one persistent
//! WebSocket, events pushed by the gateway and request/response calls from
//! the client multiplexed over it, correlated by an opaque echo token.
//!
//! The workspace is layered: `nekolink-protocol` (wire types, the segment
//! chain builder, the event decoder), `nekolink-transport` (the socket),
//! `nekolink-call` (pending-call correlation), and this crate tying them
//! together as [`NekoClient`].
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use nekolink::prelude::*;
//!
//! # async fn run() -> Result<(), ClientError> {
//! let client = NekoClient::builder()
//!     .url("ws://127.0.0.1:3001")
//!     .build();
//! client.connect().await?;
//!
//! // React to pushed events.
//! let mut events = client.events();
//! tokio::spawn(async move {
//!     while let Ok(event) = events.recv().await {
//!         println!("event: {}", event.post_type());
//!     }
//! });
//!
//! // Issue a correlated call.
//! let info = client.get_group_info(123456).await?;
//! println!("group: {:?}", info.data.and_then(|g| g.group_name));
//! # Ok(())
//! # }
//! ```

mod api;
mod client;
mod config;
mod error;

pub use api::{
    GetGroupInfo, GetGroupInfoOutput, GetGroupInfoParams, SendGroupMsg, SendGroupMsgOutput,
    SendGroupMsgParams,
};
pub use client::{CallOptions, NekoClient, NekoClientBuilder};
pub use config::ClientConfig;
pub use error::ClientError;

// Re-exported so downstream crates don't need direct dependencies on the
// layer crates for everyday use.
pub use nekolink_call::{generate_echo, CallError, CallRegistry};
pub use nekolink_protocol::{
    classify_frame, ApiCall, ApiRequest, ApiResponse, Codec, Event, InboundFrame, JsonCodec,
    MessageChain, MessageEvent, MessageSentEvent, MetaEvent, NoticeEvent, ProtocolError,
    RequestEvent, Segment, SegmentMap, SegmentValue, UnknownEvent,
};
pub use nekolink_transport::{Connection, Connector, TransportError, WebSocketConnector};
pub use tokio_util::sync::CancellationToken;

/// The common surface, importable in one line.
pub mod prelude {
    pub use crate::{
        ApiCall, ApiResponse, CallError, CallOptions, CancellationToken, ClientConfig,
        ClientError, Event, MessageChain, MessageEvent, MetaEvent, NekoClient,
        NekoClientBuilder, NoticeEvent, RequestEvent, Segment, SegmentValue,
        WebSocketConnector,
    };
}
