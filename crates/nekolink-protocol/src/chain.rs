//! Fluent builder for ordered segment chains.
//!
//! A [`MessageChain`] is the ordered list of segments that forms one
//! outgoing message. Every builder method consumes and returns the chain so
//! construction reads as one expression:
//!
//! ```
//! use nekolink_protocol::MessageChain;
//!
//! let chain = MessageChain::new()
//!     .reply(1234)
//!     .at(10001_i64)
//!     .text("see the attached image")
//!     .image("file:///tmp/shot.png");
//! assert_eq!(chain.segments()[0].kind(), "reply");
//! ```
//!
//! Two ordering rules hold at all times:
//!
//! 1. A reply segment lives at index 0 no matter when [`reply`] was called;
//!    a later call replaces an earlier one.
//! 2. Consecutive text is never materialized as two segments — appending
//!    text onto a trailing text segment extends it in place.
//!
//! [`reply`]: MessageChain::reply

use serde::{Serialize, Serializer};

use crate::segment::Segment;
use crate::value::{SegmentMap, SegmentValue};

/// An ordered, buildable sequence of [`Segment`]s.
///
/// Not thread-safe by design: a chain is a single-owner construction
/// object, built in one flow and then materialized with
/// [`into_segments`](Self::into_segments).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MessageChain {
    segments: Vec<Segment>,
}

impl MessageChain {
    /// Creates an empty chain.
    pub fn new() -> Self {
        Self::default()
    }

    fn push(mut self, kind: &str, entries: Vec<(&str, SegmentValue)>) -> Self {
        let mut data = SegmentMap::new();
        for (key, value) in entries {
            data.insert(key, value);
        }
        self.segments.push(Segment::with_data(kind, data));
        self
    }

    /// Appends plain text.
    ///
    /// Empty input is silently ignored. If the chain already ends in a text
    /// segment the new text is concatenated onto it instead of creating a
    /// second segment.
    pub fn text(mut self, text: impl Into<String>) -> Self {
        let text = text.into();
        if text.is_empty() {
            return self;
        }

        if let Some(last) = self.segments.last_mut() {
            if last.kind() == "text" {
                if let Some(SegmentValue::Str(existing)) = last.data_mut().get_mut("text") {
                    existing.push_str(&text);
                    return self;
                }
            }
        }

        self.push("text", vec![("text", text.into())])
    }

    /// Appends a mention of the given user, followed by a separator space.
    ///
    /// The space rides the normal text merge path, so text appended right
    /// after a mention joins the separator instead of creating an extra
    /// segment.
    pub fn at(self, user_id: impl ToString) -> Self {
        self.push("at", vec![("qq", user_id.to_string().into())])
            .text(" ")
    }

    /// Appends a mention of everyone, followed by a separator space.
    pub fn at_all(self) -> Self {
        self.push("at", vec![("qq", "all".into())]).text(" ")
    }

    /// Appends an image segment. `file` may be a local path, URL, or
    /// base64 data URL.
    pub fn image(self, file: impl Into<String>) -> Self {
        self.push("image", vec![("file", file.into().into())])
    }

    /// Appends an image segment with a display summary and sub-type
    /// (0 = plain image, 1 = sticker).
    pub fn image_with_summary(
        self,
        file: impl Into<String>,
        summary: impl Into<String>,
        sub_type: i64,
    ) -> Self {
        self.push(
            "image",
            vec![
                ("file", file.into().into()),
                ("summary", summary.into().into()),
                ("sub_type", sub_type.into()),
            ],
        )
    }

    /// Appends a face (built-in emoticon) segment.
    pub fn face(self, id: i64) -> Self {
        self.push("face", vec![("id", id.into())])
    }

    /// Marks the message as a reply to `message_id`.
    ///
    /// The reply segment is placed at index 0 regardless of when this is
    /// called. Calling it again replaces the previous reply, so exactly one
    /// reply segment remains and it reflects the last call.
    pub fn reply(mut self, message_id: i64) -> Self {
        self.segments.retain(|s| s.kind() != "reply");
        let mut data = SegmentMap::new();
        data.insert("id", message_id);
        self.segments.insert(0, Segment::with_data("reply", data));
        self
    }

    /// Appends a voice recording segment.
    pub fn record(self, file: impl Into<String>) -> Self {
        self.push("record", vec![("file", file.into().into())])
    }

    /// Appends a file attachment segment.
    pub fn file(self, file: impl Into<String>) -> Self {
        self.push("file", vec![("file", file.into().into())])
    }

    /// Appends a video segment.
    pub fn video(self, file: impl Into<String>) -> Self {
        self.push("video", vec![("file", file.into().into())])
    }

    /// Appends a platform music share (`platform` is e.g. `"qq"` or `"163"`).
    pub fn music(self, platform: impl Into<String>, id: impl Into<String>) -> Self {
        self.push(
            "music",
            vec![("type", platform.into().into()), ("id", id.into().into())],
        )
    }

    /// Appends a custom music share with explicit link, audio, and title.
    pub fn custom_music(
        self,
        url: impl Into<String>,
        audio: impl Into<String>,
        title: impl Into<String>,
        image: impl Into<String>,
    ) -> Self {
        self.push(
            "music",
            vec![
                ("type", "custom".into()),
                ("url", url.into().into()),
                ("audio", audio.into().into()),
                ("title", title.into().into()),
                ("image", image.into().into()),
            ],
        )
    }

    /// Appends a JSON card segment carrying the raw card payload.
    pub fn json(self, payload: impl Into<String>) -> Self {
        self.push("json", vec![("data", payload.into().into())])
    }

    /// Appends a dice roll segment (no payload).
    pub fn dice(mut self) -> Self {
        self.segments.push(Segment::new("dice"));
        self
    }

    /// Appends a rock-paper-scissors segment (no payload).
    pub fn rps(mut self) -> Self {
        self.segments.push(Segment::new("rps"));
        self
    }

    /// Appends a forwarded-message node wrapping a nested chain.
    ///
    /// The nested chain is consumed, so the node holds a snapshot: there is
    /// no way to mutate the content after it has been added.
    pub fn node(
        self,
        user_id: impl Into<String>,
        nickname: impl Into<String>,
        content: MessageChain,
    ) -> Self {
        self.node_segments(user_id, nickname, content.into_segments())
    }

    /// Appends a forwarded-message node from an explicit segment list.
    pub fn node_segments(
        self,
        user_id: impl Into<String>,
        nickname: impl Into<String>,
        content: Vec<Segment>,
    ) -> Self {
        let content: Vec<SegmentValue> = content.iter().map(Segment::to_value).collect();
        self.push(
            "node",
            vec![
                ("user_id", user_id.into().into()),
                ("nickname", nickname.into().into()),
                ("content", content.into()),
            ],
        )
    }

    /// The segments built so far, in order.
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Materializes the chain into its ordered segment list.
    pub fn into_segments(self) -> Vec<Segment> {
        self.segments
    }

    /// Number of segments in the chain.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Returns `true` if no segments have been added.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

impl From<MessageChain> for Vec<Segment> {
    fn from(chain: MessageChain) -> Self {
        chain.into_segments()
    }
}

impl Serialize for MessageChain {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(&self.segments)
    }
}

// =========================================================================
// Tests
// =========================================================================
