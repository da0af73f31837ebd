//! Wire protocol for Nekolink.
//!
//! This crate defines everything that travels on the socket and how it is
//! interpreted:
//!
//! - **Segments** ([`Segment`], [`SegmentValue`], [`SegmentMap`]) — the
//!   typed units of a composite message, with payload maps that round-trip
//!   arbitrary, protocol-future kinds losslessly.
//! - **Chain builder** ([`MessageChain`]) — fluent construction of ordered
//!   segment sequences with the protocol's merge and ordering rules.
//! - **Events** ([`Event`] and its per-category enums) — the closed variant
//!   set for gateway pushes, with an [`Event::Unknown`] fallback that keeps
//!   the raw frame.
//! - **Decoding** ([`classify_frame`], [`decode_event`], [`InboundFrame`])
//!   — the event-vs-response classifier and the discriminator cascade.
//! - **Envelopes** ([`ApiRequest`], [`ApiResponse`], [`ApiCall`]) — the
//!   call/response wire shapes and the typed-action contract.
//! - **Codec** ([`Codec`], [`JsonCodec`]) — text-frame serialization.
//!
//! # Architecture
//!
//! The protocol layer sits between transport (whole text frames) and the
//! client session (correlation, subscriptions). It knows nothing about
//! sockets or pending calls — it only maps text to typed values and back.
//!
//! ```text
//! Transport (text frames) → Protocol (events, envelopes) → Session (correlation)
//! ```

mod chain;
mod codec;
mod decode;
mod envelope;
mod error;
mod event;
mod segment;
mod value;

pub use chain::MessageChain;
pub use codec::{Codec, JsonCodec};
pub use decode::{classify_frame, decode_event, InboundFrame};
pub use envelope::{ApiCall, ApiRequest, ApiResponse};
pub use error::ProtocolError;
pub use event::{
    EmojiLike, Event, FriendRecallNotice, FriendRequest, GroupAdminNotice, GroupBanNotice,
    GroupDecreaseNotice, GroupEmojiLikeNotice, GroupIncreaseNotice, GroupMessage,
    GroupMessageSent, GroupNameNotice, GroupRecallNotice, GroupRequest, GroupUploadFile,
    GroupUploadNotice, HeartbeatMeta, LifecycleMeta, MessageEvent, MessageSentEvent,
    MetaEvent, NoticeEvent, PokeNotice, PrivateMessage, PrivateMessageSent,
    ProfileLikeNotice, RequestEvent, Sender, TitleNotice, UnknownEvent,
};
pub use segment::Segment;
pub use value::{lenient, SegmentMap, SegmentValue};
