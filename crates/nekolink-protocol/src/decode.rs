//! Inbound frame classification and the event discriminator cascade.
//!
//! Inbound frames carry no out-of-band type tag: an event object and a
//! response envelope arrive on the same socket and must be told apart by
//! shape. [`classify_frame`] makes that call, and for events walks the
//! multi-level discriminator cascade down to one concrete [`Event`]
//! variant. Nothing is ever dropped on a failed match — an unrecognized
//! combination decodes to [`Event::Unknown`] with the original object kept
//! verbatim, and a malformed envelope is synthesized around whatever `echo`
//! and payload can be salvaged.

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::envelope::ApiResponse;
use crate::event::{
    Event, FriendRecallNotice, FriendRequest, GroupAdminNotice, GroupBanNotice,
    GroupDecreaseNotice, GroupEmojiLikeNotice, GroupIncreaseNotice, GroupMessage,
    GroupMessageSent, GroupNameNotice, GroupRecallNotice, GroupRequest, GroupUploadNotice,
    HeartbeatMeta, LifecycleMeta, MessageEvent, MessageSentEvent, MetaEvent, NoticeEvent,
    PokeNotice, PrivateMessage, PrivateMessageSent, ProfileLikeNotice, RequestEvent,
    TitleNotice, UnknownEvent,
};

/// The result of classifying one inbound text frame.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundFrame {
    /// The frame is an event push, fully variant-resolved.
    Event(Box<Event>),
    /// The frame is a response envelope (possibly synthesized best-effort).
    Response(ApiResponse),
    /// The frame is not a JSON object; there is nothing to hand anyone.
    Unparseable,
}

/// Classifies one complete inbound text frame.
///
/// A frame is treated as an event iff it is a JSON object with a non-blank
/// string `post_type`. This is a heuristic, not a protocol guarantee: if a
/// future protocol revision ever adds a `post_type` field to response
/// envelopes, those responses would be misclassified as events. Everything
/// else that is an object goes down the response path; non-object JSON and
/// non-JSON text are [`InboundFrame::Unparseable`].
pub fn classify_frame(text: &str) -> InboundFrame {
    let Ok(raw) = serde_json::from_str::<Value>(text) else {
        return InboundFrame::Unparseable;
    };
    if !raw.is_object() {
        return InboundFrame::Unparseable;
    }

    let is_event = raw
        .get("post_type")
        .and_then(Value::as_str)
        .is_some_and(|s| !s.trim().is_empty());

    if is_event {
        InboundFrame::Event(Box::new(decode_event(raw)))
    } else {
        InboundFrame::Response(decode_response(raw))
    }
}

/// Resolves an event object to its concrete variant.
///
/// First match wins at every level; a miss at any level yields
/// [`Event::Unknown`] carrying `raw` unchanged.
pub fn decode_event(raw: Value) -> Event {
    let Some(post_type) = raw.get("post_type").and_then(Value::as_str) else {
        return unknown(raw);
    };

    match post_type {
        "message" => decode_message(raw),
        "message_sent" => decode_message_sent(raw),
        "notice" => decode_notice(raw),
        "request" => decode_request(raw),
        "meta_event" => decode_meta(raw),
        _ => unknown(raw),
    }
}

fn unknown(raw: Value) -> Event {
    Event::Unknown(UnknownEvent { raw })
}

/// Tries to decode `raw` into `T`; a structural mismatch falls back to
/// [`Event::Unknown`] instead of failing the frame.
fn shape<T, F>(raw: Value, wrap: F) -> Event
where
    T: DeserializeOwned,
    F: FnOnce(T) -> Event,
{
    match serde_json::from_value::<T>(raw.clone()) {
        Ok(value) => wrap(value),
        Err(_) => unknown(raw),
    }
}

fn str_field<'a>(raw: &'a Value, key: &str) -> Option<&'a str> {
    raw.get(key).and_then(Value::as_str)
}

fn decode_message(raw: Value) -> Event {
    match str_field(&raw, "message_type") {
        Some(t) if t.eq_ignore_ascii_case("group") => {
            shape(raw, |e: GroupMessage| {
                Event::Message(MessageEvent::Group(e))
            })
        }
        Some(t) if t.eq_ignore_ascii_case("private") => {
            shape(raw, |e: PrivateMessage| {
                Event::Message(MessageEvent::Private(e))
            })
        }
        _ => unknown(raw),
    }
}

fn decode_message_sent(raw: Value) -> Event {
    match str_field(&raw, "message_type") {
        Some(t) if t.eq_ignore_ascii_case("group") => {
            shape(raw, |e: GroupMessageSent| {
                Event::MessageSent(MessageSentEvent::Group(e))
            })
        }
        Some(t) if t.eq_ignore_ascii_case("private") => {
            shape(raw, |e: PrivateMessageSent| {
                Event::MessageSent(MessageSentEvent::Private(e))
            })
        }
        _ => unknown(raw),
    }
}

fn decode_notice(raw: Value) -> Event {
    let Some(notice_type) = str_field(&raw, "notice_type") else {
        return unknown(raw);
    };

    match notice_type {
        "friend_recall" => shape(raw, |e: FriendRecallNotice| {
            Event::Notice(NoticeEvent::FriendRecall(e))
        }),
        "group_admin" => shape(raw, |e: GroupAdminNotice| {
            Event::Notice(NoticeEvent::GroupAdmin(e))
        }),
        "group_ban" => shape(raw, |e: GroupBanNotice| {
            Event::Notice(NoticeEvent::GroupBan(e))
        }),
        "group_increase" => shape(raw, |e: GroupIncreaseNotice| {
            Event::Notice(NoticeEvent::GroupIncrease(e))
        }),
        "group_decrease" => shape(raw, |e: GroupDecreaseNotice| {
            Event::Notice(NoticeEvent::GroupDecrease(e))
        }),
        "group_recall" => shape(raw, |e: GroupRecallNotice| {
            Event::Notice(NoticeEvent::GroupRecall(e))
        }),
        "group_upload" => shape(raw, |e: GroupUploadNotice| {
            Event::Notice(NoticeEvent::GroupUpload(e))
        }),
        "group_msg_emoji_like" => shape(raw, |e: GroupEmojiLikeNotice| {
            Event::Notice(NoticeEvent::GroupEmojiLike(e))
        }),
        "notify" => decode_notify(raw),
        _ => unknown(raw),
    }
}

/// The `notify` notice family needs the tertiary `sub_type` discriminator.
fn decode_notify(raw: Value) -> Event {
    match str_field(&raw, "sub_type") {
        Some("poke") => shape(raw, |e: PokeNotice| Event::Notice(NoticeEvent::Poke(e))),
        Some("title") => shape(raw, |e: TitleNotice| Event::Notice(NoticeEvent::Title(e))),
        Some("profile_like") => shape(raw, |e: ProfileLikeNotice| {
            Event::Notice(NoticeEvent::ProfileLike(e))
        }),
        Some("group_name") => shape(raw, |e: GroupNameNotice| {
            Event::Notice(NoticeEvent::GroupName(e))
        }),
        _ => unknown(raw),
    }
}

fn decode_request(raw: Value) -> Event {
    match str_field(&raw, "request_type") {
        Some(t) if t.eq_ignore_ascii_case("friend") => {
            shape(raw, |e: FriendRequest| {
                Event::Request(RequestEvent::Friend(e))
            })
        }
        Some(t) if t.eq_ignore_ascii_case("group") => match str_field(&raw, "sub_type") {
            Some("add") => shape(raw, |e: GroupRequest| {
                Event::Request(RequestEvent::GroupAdd(e))
            }),
            Some("invite") => shape(raw, |e: GroupRequest| {
                Event::Request(RequestEvent::GroupInvite(e))
            }),
            _ => unknown(raw),
        },
        _ => unknown(raw),
    }
}

fn decode_meta(raw: Value) -> Event {
    match str_field(&raw, "meta_event_type") {
        Some("heartbeat") => shape(raw, |e: HeartbeatMeta| {
            Event::Meta(MetaEvent::Heartbeat(e))
        }),
        Some("lifecycle") => shape(raw, |e: LifecycleMeta| {
            Event::Meta(MetaEvent::Lifecycle(e))
        }),
        _ => unknown(raw),
    }
}

/// Best-effort response decoding.
///
/// A structurally sound envelope parses typed; anything else becomes a
/// synthesized envelope carrying the string `echo` (if one is present) and
/// the whole raw object as its payload, so the frame still reaches
/// response subscribers.
fn decode_response(raw: Value) -> ApiResponse {
    let raw_echo = raw
        .get("echo")
        .and_then(Value::as_str)
        .map(str::to_string);

    match serde_json::from_value::<ApiResponse>(raw.clone()) {
        Ok(mut envelope) => {
            if envelope
                .echo
                .as_deref()
                .is_none_or(|e| e.trim().is_empty())
            {
                envelope.echo = raw_echo;
            }
            envelope
        }
        Err(_) => ApiResponse {
            echo: raw_echo,
            data: Some(raw),
            ..ApiResponse::default()
        },
    }
}

// =========================================================================
// Tests
// =========================================================================
