//! Typed event variants pushed by the gateway.
//!
//! Inbound event frames carry no single type tag; instead a cascade of
//! string discriminators (`post_type`, then `message_type` /
//! `notice_type` / `request_type` / `meta_event_type`, then `sub_type`)
//! selects the concrete shape. The enums here are that closed shape set;
//! [`crate::decode`] walks the cascade and anything it cannot place lands
//! in [`Event::Unknown`] with the original frame preserved verbatim.
//!
//! Every field beyond the discriminators is optional on the wire: payload
//! structs default missing fields instead of failing the decode.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::segment::Segment;
use crate::value::lenient;

// ---------------------------------------------------------------------------
// Top-level variants
// ---------------------------------------------------------------------------

/// A decoded gateway event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    /// Someone sent a message the bot can see.
    Message(MessageEvent),
    /// The bot's own account sent a message (possibly from another device).
    MessageSent(MessageSentEvent),
    /// A state-change notification (recalls, bans, pokes, ...).
    Notice(NoticeEvent),
    /// An approval request (friend add, group join/invite).
    Request(RequestEvent),
    /// Gateway housekeeping (heartbeat, lifecycle).
    Meta(MetaEvent),
    /// A frame that matched no known discriminator combination.
    Unknown(UnknownEvent),
}

impl Event {
    /// The outer category discriminator this event decoded from.
    pub fn post_type(&self) -> &str {
        match self {
            Event::Message(_) => "message",
            Event::MessageSent(_) => "message_sent",
            Event::Notice(_) => "notice",
            Event::Request(_) => "request",
            Event::Meta(_) => "meta_event",
            Event::Unknown(e) => e.raw.get("post_type").and_then(Value::as_str).unwrap_or(""),
        }
    }

    /// Event timestamp (seconds since the epoch; 0 when absent).
    pub fn time(&self) -> i64 {
        match self {
            Event::Message(e) => e.time(),
            Event::MessageSent(e) => e.time(),
            Event::Notice(e) => e.time(),
            Event::Request(e) => e.time(),
            Event::Meta(e) => e.time(),
            Event::Unknown(e) => e.raw.get("time").and_then(Value::as_i64).unwrap_or(0),
        }
    }

    /// The bot account this event was delivered to (0 when absent).
    pub fn self_id(&self) -> i64 {
        match self {
            Event::Message(e) => e.self_id(),
            Event::MessageSent(e) => e.self_id(),
            Event::Notice(e) => e.self_id(),
            Event::Request(e) => e.self_id(),
            Event::Meta(e) => e.self_id(),
            Event::Unknown(e) => e.raw.get("self_id").and_then(Value::as_i64).unwrap_or(0),
        }
    }
}

/// A frame whose discriminators matched nothing we know.
///
/// The raw JSON object is retained untouched so no data is lost; callers
/// can inspect or forward it as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnknownEvent {
    pub raw: Value,
}

// ---------------------------------------------------------------------------
// Message events
// ---------------------------------------------------------------------------

/// A received message, split by conversation kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MessageEvent {
    Group(GroupMessage),
    Private(PrivateMessage),
}

impl MessageEvent {
    pub fn time(&self) -> i64 {
        match self {
            MessageEvent::Group(e) => e.time,
            MessageEvent::Private(e) => e.time,
        }
    }

    pub fn self_id(&self) -> i64 {
        match self {
            MessageEvent::Group(e) => e.self_id,
            MessageEvent::Private(e) => e.self_id,
        }
    }

    /// The segment list of the message body, whichever kind it is.
    pub fn segments(&self) -> &[Segment] {
        match self {
            MessageEvent::Group(e) => &e.message,
            MessageEvent::Private(e) => &e.message,
        }
    }
}

/// A message sent by the bot's own account, split by conversation kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MessageSentEvent {
    Group(GroupMessageSent),
    Private(PrivateMessageSent),
}

impl MessageSentEvent {
    pub fn time(&self) -> i64 {
        match self {
            MessageSentEvent::Group(e) => e.time,
            MessageSentEvent::Private(e) => e.time,
        }
    }

    pub fn self_id(&self) -> i64 {
        match self {
            MessageSentEvent::Group(e) => e.self_id,
            MessageSentEvent::Private(e) => e.self_id,
        }
    }
}

/// Who sent a message.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Sender {
    #[serde(deserialize_with = "lenient::i64")]
    pub user_id: i64,
    pub nickname: Option<String>,
    pub card: Option<String>,
    pub role: Option<String>,
}

/// A message received in a group.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupMessage {
    #[serde(deserialize_with = "lenient::i64")]
    pub time: i64,
    #[serde(deserialize_with = "lenient::i64")]
    pub self_id: i64,
    pub sub_type: Option<String>,
    #[serde(deserialize_with = "lenient::i64")]
    pub user_id: i64,
    #[serde(deserialize_with = "lenient::i64")]
    pub group_id: i64,
    pub group_name: Option<String>,
    #[serde(deserialize_with = "lenient::i64")]
    pub message_id: i64,
    #[serde(deserialize_with = "lenient::i64")]
    pub message_seq: i64,
    #[serde(deserialize_with = "lenient::i64")]
    pub real_id: i64,
    pub real_seq: Option<String>,
    pub raw_message: Option<String>,
    #[serde(deserialize_with = "lenient::i64")]
    pub font: i64,
    pub message: Vec<Segment>,
    pub message_format: Option<String>,
    pub sender: Option<Sender>,
    #[serde(deserialize_with = "lenient::opt_i64")]
    pub target_id: Option<i64>,
}

/// A message received in a private conversation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrivateMessage {
    #[serde(deserialize_with = "lenient::i64")]
    pub time: i64,
    #[serde(deserialize_with = "lenient::i64")]
    pub self_id: i64,
    pub sub_type: Option<String>,
    #[serde(deserialize_with = "lenient::i64")]
    pub user_id: i64,
    #[serde(deserialize_with = "lenient::i64")]
    pub message_id: i64,
    #[serde(deserialize_with = "lenient::i64")]
    pub message_seq: i64,
    #[serde(deserialize_with = "lenient::i64")]
    pub real_id: i64,
    pub real_seq: Option<String>,
    pub raw_message: Option<String>,
    #[serde(deserialize_with = "lenient::i64")]
    pub font: i64,
    pub message: Vec<Segment>,
    pub message_format: Option<String>,
    pub sender: Option<Sender>,
    #[serde(deserialize_with = "lenient::opt_i64")]
    pub target_id: Option<i64>,
}

/// A group message echoed back for the bot's own account.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupMessageSent {
    #[serde(deserialize_with = "lenient::i64")]
    pub time: i64,
    #[serde(deserialize_with = "lenient::i64")]
    pub self_id: i64,
    pub sub_type: Option<String>,
    pub message_sent_type: Option<String>,
    #[serde(deserialize_with = "lenient::i64")]
    pub user_id: i64,
    #[serde(deserialize_with = "lenient::i64")]
    pub group_id: i64,
    pub group_name: Option<String>,
    #[serde(deserialize_with = "lenient::i64")]
    pub message_id: i64,
    pub raw_message: Option<String>,
    pub message: Vec<Segment>,
    pub sender: Option<Sender>,
    #[serde(deserialize_with = "lenient::opt_i64")]
    pub target_id: Option<i64>,
}

/// A private message echoed back for the bot's own account.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrivateMessageSent {
    #[serde(deserialize_with = "lenient::i64")]
    pub time: i64,
    #[serde(deserialize_with = "lenient::i64")]
    pub self_id: i64,
    pub sub_type: Option<String>,
    pub message_sent_type: Option<String>,
    #[serde(deserialize_with = "lenient::i64")]
    pub user_id: i64,
    #[serde(deserialize_with = "lenient::i64")]
    pub message_id: i64,
    pub raw_message: Option<String>,
    pub message: Vec<Segment>,
    pub sender: Option<Sender>,
    #[serde(deserialize_with = "lenient::opt_i64")]
    pub target_id: Option<i64>,
}

// ---------------------------------------------------------------------------
// Notice events
// ---------------------------------------------------------------------------

/// State-change notifications.
///
/// The `notice_type` discriminator selects most shapes directly; the
/// `notify` value requires the tertiary `sub_type` discriminator
/// (poke / title / profile_like / group_name).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum NoticeEvent {
    FriendRecall(FriendRecallNotice),
    GroupAdmin(GroupAdminNotice),
    GroupBan(GroupBanNotice),
    GroupIncrease(GroupIncreaseNotice),
    GroupDecrease(GroupDecreaseNotice),
    GroupRecall(GroupRecallNotice),
    GroupUpload(GroupUploadNotice),
    GroupEmojiLike(GroupEmojiLikeNotice),
    Poke(PokeNotice),
    Title(TitleNotice),
    ProfileLike(ProfileLikeNotice),
    GroupName(GroupNameNotice),
}

impl NoticeEvent {
    pub fn time(&self) -> i64 {
        match self {
            NoticeEvent::FriendRecall(e) => e.time,
            NoticeEvent::GroupAdmin(e) => e.time,
            NoticeEvent::GroupBan(e) => e.time,
            NoticeEvent::GroupIncrease(e) => e.time,
            NoticeEvent::GroupDecrease(e) => e.time,
            NoticeEvent::GroupRecall(e) => e.time,
            NoticeEvent::GroupUpload(e) => e.time,
            NoticeEvent::GroupEmojiLike(e) => e.time,
            NoticeEvent::Poke(e) => e.time,
            NoticeEvent::Title(e) => e.time,
            NoticeEvent::ProfileLike(e) => e.time,
            NoticeEvent::GroupName(e) => e.time,
        }
    }

    pub fn self_id(&self) -> i64 {
        match self {
            NoticeEvent::FriendRecall(e) => e.self_id,
            NoticeEvent::GroupAdmin(e) => e.self_id,
            NoticeEvent::GroupBan(e) => e.self_id,
            NoticeEvent::GroupIncrease(e) => e.self_id,
            NoticeEvent::GroupDecrease(e) => e.self_id,
            NoticeEvent::GroupRecall(e) => e.self_id,
            NoticeEvent::GroupUpload(e) => e.self_id,
            NoticeEvent::GroupEmojiLike(e) => e.self_id,
            NoticeEvent::Poke(e) => e.self_id,
            NoticeEvent::Title(e) => e.self_id,
            NoticeEvent::ProfileLike(e) => e.self_id,
            NoticeEvent::GroupName(e) => e.self_id,
        }
    }
}

/// A friend recalled a message.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FriendRecallNotice {
    #[serde(deserialize_with = "lenient::i64")]
    pub time: i64,
    #[serde(deserialize_with = "lenient::i64")]
    pub self_id: i64,
    #[serde(deserialize_with = "lenient::opt_i64")]
    pub user_id: Option<i64>,
    #[serde(deserialize_with = "lenient::i64")]
    pub message_id: i64,
}

/// A group admin was appointed or dismissed (`sub_type` set/unset).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupAdminNotice {
    #[serde(deserialize_with = "lenient::i64")]
    pub time: i64,
    #[serde(deserialize_with = "lenient::i64")]
    pub self_id: i64,
    pub sub_type: Option<String>,
    #[serde(deserialize_with = "lenient::opt_i64")]
    pub user_id: Option<i64>,
    #[serde(deserialize_with = "lenient::opt_i64")]
    pub group_id: Option<i64>,
}

/// A group member was muted or unmuted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupBanNotice {
    #[serde(deserialize_with = "lenient::i64")]
    pub time: i64,
    #[serde(deserialize_with = "lenient::i64")]
    pub self_id: i64,
    pub sub_type: Option<String>,
    #[serde(deserialize_with = "lenient::opt_i64")]
    pub user_id: Option<i64>,
    #[serde(deserialize_with = "lenient::opt_i64")]
    pub group_id: Option<i64>,
    #[serde(deserialize_with = "lenient::i64")]
    pub operator_id: i64,
    /// Mute duration in seconds; 0 on unmute.
    #[serde(deserialize_with = "lenient::i64")]
    pub duration: i64,
}

/// Someone joined a group.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupIncreaseNotice {
    #[serde(deserialize_with = "lenient::i64")]
    pub time: i64,
    #[serde(deserialize_with = "lenient::i64")]
    pub self_id: i64,
    pub sub_type: Option<String>,
    #[serde(deserialize_with = "lenient::opt_i64")]
    pub user_id: Option<i64>,
    #[serde(deserialize_with = "lenient::opt_i64")]
    pub group_id: Option<i64>,
    #[serde(deserialize_with = "lenient::i64")]
    pub operator_id: i64,
}

/// Someone left or was removed from a group (`sub_type`
/// leave/kick/kick_me).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupDecreaseNotice {
    #[serde(deserialize_with = "lenient::i64")]
    pub time: i64,
    #[serde(deserialize_with = "lenient::i64")]
    pub self_id: i64,
    pub sub_type: Option<String>,
    #[serde(deserialize_with = "lenient::opt_i64")]
    pub user_id: Option<i64>,
    #[serde(deserialize_with = "lenient::opt_i64")]
    pub group_id: Option<i64>,
    #[serde(deserialize_with = "lenient::i64")]
    pub operator_id: i64,
}

/// A group message was recalled.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupRecallNotice {
    #[serde(deserialize_with = "lenient::i64")]
    pub time: i64,
    #[serde(deserialize_with = "lenient::i64")]
    pub self_id: i64,
    #[serde(deserialize_with = "lenient::opt_i64")]
    pub user_id: Option<i64>,
    #[serde(deserialize_with = "lenient::opt_i64")]
    pub group_id: Option<i64>,
    #[serde(deserialize_with = "lenient::i64")]
    pub operator_id: i64,
    #[serde(deserialize_with = "lenient::i64")]
    pub message_id: i64,
}

/// Details of a file uploaded to a group.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupUploadFile {
    pub id: Option<String>,
    pub name: Option<String>,
    #[serde(deserialize_with = "lenient::i64")]
    pub size: i64,
    #[serde(deserialize_with = "lenient::i64")]
    pub busid: i64,
}

/// A file was uploaded to a group.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupUploadNotice {
    #[serde(deserialize_with = "lenient::i64")]
    pub time: i64,
    #[serde(deserialize_with = "lenient::i64")]
    pub self_id: i64,
    #[serde(deserialize_with = "lenient::opt_i64")]
    pub user_id: Option<i64>,
    #[serde(deserialize_with = "lenient::opt_i64")]
    pub group_id: Option<i64>,
    pub file: Option<GroupUploadFile>,
}

/// One emoji reaction entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmojiLike {
    pub emoji_id: Option<String>,
    #[serde(deserialize_with = "lenient::i64")]
    pub count: i64,
}

/// Emoji reactions on a group message changed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupEmojiLikeNotice {
    #[serde(deserialize_with = "lenient::i64")]
    pub time: i64,
    #[serde(deserialize_with = "lenient::i64")]
    pub self_id: i64,
    #[serde(deserialize_with = "lenient::opt_i64")]
    pub user_id: Option<i64>,
    #[serde(deserialize_with = "lenient::opt_i64")]
    pub group_id: Option<i64>,
    #[serde(deserialize_with = "lenient::i64")]
    pub message_id: i64,
    pub likes: Vec<EmojiLike>,
    pub is_add: bool,
}

/// Someone poked someone.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PokeNotice {
    #[serde(deserialize_with = "lenient::i64")]
    pub time: i64,
    #[serde(deserialize_with = "lenient::i64")]
    pub self_id: i64,
    #[serde(deserialize_with = "lenient::opt_i64")]
    pub user_id: Option<i64>,
    #[serde(deserialize_with = "lenient::opt_i64")]
    pub group_id: Option<i64>,
    #[serde(deserialize_with = "lenient::i64")]
    pub target_id: i64,
    /// Platform-specific extra detail, kept as-is.
    pub raw_info: Option<Value>,
}

/// A member received a group title.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TitleNotice {
    #[serde(deserialize_with = "lenient::i64")]
    pub time: i64,
    #[serde(deserialize_with = "lenient::i64")]
    pub self_id: i64,
    #[serde(deserialize_with = "lenient::opt_i64")]
    pub user_id: Option<i64>,
    #[serde(deserialize_with = "lenient::opt_i64")]
    pub group_id: Option<i64>,
    pub title: Option<String>,
}

/// Someone liked the bot's profile.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileLikeNotice {
    #[serde(deserialize_with = "lenient::i64")]
    pub time: i64,
    #[serde(deserialize_with = "lenient::i64")]
    pub self_id: i64,
    #[serde(deserialize_with = "lenient::opt_i64")]
    pub user_id: Option<i64>,
    #[serde(deserialize_with = "lenient::i64")]
    pub operator_id: i64,
    pub operator_nick: Option<String>,
    #[serde(deserialize_with = "lenient::i64")]
    pub times: i64,
}

/// A group was renamed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupNameNotice {
    #[serde(deserialize_with = "lenient::i64")]
    pub time: i64,
    #[serde(deserialize_with = "lenient::i64")]
    pub self_id: i64,
    #[serde(deserialize_with = "lenient::opt_i64")]
    pub user_id: Option<i64>,
    #[serde(deserialize_with = "lenient::opt_i64")]
    pub group_id: Option<i64>,
    pub name_new: Option<String>,
}

// ---------------------------------------------------------------------------
// Request events
// ---------------------------------------------------------------------------

/// An approval request. Group requests split once more on `sub_type`
/// (someone asking to join vs the bot being invited).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RequestEvent {
    Friend(FriendRequest),
    GroupAdd(GroupRequest),
    GroupInvite(GroupRequest),
}

impl RequestEvent {
    pub fn time(&self) -> i64 {
        match self {
            RequestEvent::Friend(e) => e.time,
            RequestEvent::GroupAdd(e) | RequestEvent::GroupInvite(e) => e.time,
        }
    }

    pub fn self_id(&self) -> i64 {
        match self {
            RequestEvent::Friend(e) => e.self_id,
            RequestEvent::GroupAdd(e) | RequestEvent::GroupInvite(e) => e.self_id,
        }
    }

    /// The approval flag to pass back when accepting or rejecting.
    pub fn flag(&self) -> Option<&str> {
        match self {
            RequestEvent::Friend(e) => e.flag.as_deref(),
            RequestEvent::GroupAdd(e) | RequestEvent::GroupInvite(e) => e.flag.as_deref(),
        }
    }
}

/// Someone wants to add the bot as a friend.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FriendRequest {
    #[serde(deserialize_with = "lenient::i64")]
    pub time: i64,
    #[serde(deserialize_with = "lenient::i64")]
    pub self_id: i64,
    #[serde(deserialize_with = "lenient::opt_i64")]
    pub user_id: Option<i64>,
    pub comment: Option<String>,
    pub flag: Option<String>,
}

/// A group join request or invitation; which one is encoded in the
/// enclosing [`RequestEvent`] variant.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupRequest {
    #[serde(deserialize_with = "lenient::i64")]
    pub time: i64,
    #[serde(deserialize_with = "lenient::i64")]
    pub self_id: i64,
    pub sub_type: Option<String>,
    #[serde(deserialize_with = "lenient::opt_i64")]
    pub user_id: Option<i64>,
    #[serde(deserialize_with = "lenient::opt_i64")]
    pub group_id: Option<i64>,
    pub comment: Option<String>,
    pub flag: Option<String>,
}

// ---------------------------------------------------------------------------
// Meta events
// ---------------------------------------------------------------------------

/// Gateway housekeeping events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MetaEvent {
    Heartbeat(HeartbeatMeta),
    Lifecycle(LifecycleMeta),
}

impl MetaEvent {
    pub fn time(&self) -> i64 {
        match self {
            MetaEvent::Heartbeat(e) => e.time,
            MetaEvent::Lifecycle(e) => e.time,
        }
    }

    pub fn self_id(&self) -> i64 {
        match self {
            MetaEvent::Heartbeat(e) => e.self_id,
            MetaEvent::Lifecycle(e) => e.self_id,
        }
    }
}

/// Periodic gateway heartbeat.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeartbeatMeta {
    #[serde(deserialize_with = "lenient::i64")]
    pub time: i64,
    #[serde(deserialize_with = "lenient::i64")]
    pub self_id: i64,
    /// Gateway-defined status blob, kept as-is.
    pub status: Option<Value>,
    #[serde(deserialize_with = "lenient::opt_i64")]
    pub interval: Option<i64>,
}

/// Connection lifecycle marker (`sub_type` connect/enable/disable).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LifecycleMeta {
    #[serde(deserialize_with = "lenient::i64")]
    pub time: i64,
    #[serde(deserialize_with = "lenient::i64")]
    pub self_id: i64,
    pub sub_type: Option<String>,
}

// =========================================================================
// Tests
// =========================================================================
