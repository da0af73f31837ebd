//! Message segments: the typed units of a composite message.
//!
//! On the wire a segment is `{"type": "...", "data": {...}}`. The `type` tag
//! comes from an open vocabulary (text, at, image, face, reply, record,
//! file, video, music, json, dice, rps, node, ...) and `data` is a free-form
//! payload map. The decoder has no static shape per kind — unknown,
//! protocol-future kinds round-trip untouched.

use std::fmt;

use serde::de::{Deserializer, MapAccess, Visitor};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};

use crate::value::{SegmentMap, SegmentValue};

/// One typed unit of a composite message.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Segment {
    kind: String,
    data: SegmentMap,
}

impl Segment {
    /// Creates a segment with an empty payload.
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            data: SegmentMap::new(),
        }
    }

    /// Creates a segment with the given payload.
    pub fn with_data(kind: impl Into<String>, data: SegmentMap) -> Self {
        Self {
            kind: kind.into(),
            data,
        }
    }

    /// The segment's type tag.
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// The payload map.
    pub fn data(&self) -> &SegmentMap {
        &self.data
    }

    pub(crate) fn data_mut(&mut self) -> &mut SegmentMap {
        &mut self.data
    }

    /// Converts the segment into its generic value form
    /// (`{"type": ..., "data": ...}` as a [`SegmentValue::Map`]).
    ///
    /// Forwarded-message nodes embed whole segment lists inside a payload;
    /// this is the canonical representation they use, and it is what an
    /// inbound decode of the same node produces.
    pub fn to_value(&self) -> SegmentValue {
        let mut map = SegmentMap::new();
        map.insert("type", self.kind.clone());
        map.insert("data", SegmentValue::Map(self.data.clone()));
        SegmentValue::Map(map)
    }
}

impl Serialize for Segment {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        // Always emit both keys; zero-payload kinds serialize as "data": {}.
        let mut map = serializer.serialize_map(Some(2))?;
        map.serialize_entry("type", &self.kind)?;
        map.serialize_entry("data", &self.data)?;
        map.end()
    }
}

struct SegmentVisitor;

impl<'de> Visitor<'de> for SegmentVisitor {
    type Value = Segment;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a message segment object")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut kind = String::new();
        let mut data = SegmentMap::new();

        while let Some(key) = access.next_key::<String>()? {
            if key.eq_ignore_ascii_case("type") {
                // A missing or non-string tag decodes as the empty string.
                if let SegmentValue::Str(tag) = access.next_value::<SegmentValue>()? {
                    kind = tag;
                }
            } else if key.eq_ignore_ascii_case("data") {
                data = match access.next_value::<SegmentValue>()? {
                    SegmentValue::Map(map) => map,
                    SegmentValue::Null => SegmentMap::new(),
                    // A scalar or list payload is kept under a "value" key
                    // rather than being dropped.
                    other => {
                        let mut map = SegmentMap::new();
                        map.insert("value", other);
                        map
                    }
                };
            } else {
                let _ = access.next_value::<serde::de::IgnoredAny>()?;
            }
        }

        Ok(Segment { kind, data })
    }
}

impl<'de> Deserialize<'de> for Segment {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(SegmentVisitor)
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segment_serializes_type_and_data() {
        let mut data = SegmentMap::new();
        data.insert("text", "hello");
        let seg = Segment::with_data("text", data);
        assert_eq!(
            serde_json::to_string(&seg).unwrap(),
            r#"{"type":"text","data":{"text":"hello"}}"#
        );
    }

    #[test]
    fn test_segment_empty_payload_serializes_empty_object() {
        let seg = Segment::new("dice");
        assert_eq!(
            serde_json::to_string(&seg).unwrap(),
            r#"{"type":"dice","data":{}}"#
        );
    }

    #[test]
    fn test_segment_deserialize_missing_type_is_empty() {
        let seg: Segment = serde_json::from_str(r#"{"data":{"x":1}}"#).unwrap();
        assert_eq!(seg.kind(), "");
        assert_eq!(seg.data().get_int("x"), Some(1));
    }

    #[test]
    fn test_segment_deserialize_null_data_is_empty_map() {
        let seg: Segment = serde_json::from_str(r#"{"type":"rps","data":null}"#).unwrap();
        assert_eq!(seg.kind(), "rps");
        assert!(seg.data().is_empty());
    }

    #[test]
    fn test_segment_deserialize_scalar_data_wraps_under_value() {
        let seg: Segment = serde_json::from_str(r#"{"type":"json","data":"raw"}"#).unwrap();
        assert_eq!(seg.data().get_str("value"), Some("raw"));
    }

    #[test]
    fn test_segment_round_trip_unknown_kind_lossless() {
        // A kind this crate has never heard of keeps its full payload.
        let json = r#"{"type":"hologram","data":{"depth":3,"frames":["a","b"],"meta":{"fps":24}}}"#;
        let seg: Segment = serde_json::from_str(json).unwrap();
        assert_eq!(seg.kind(), "hologram");
        assert_eq!(serde_json::to_string(&seg).unwrap(), json);
    }

    #[test]
    fn test_segment_to_value_matches_decoded_shape() {
        let mut data = SegmentMap::new();
        data.insert("text", "hi");
        let seg = Segment::with_data("text", data);

        // Encoding the value form and decoding it as a Segment gives the
        // original back — the two representations agree.
        let encoded = serde_json::to_string(&seg.to_value()).unwrap();
        let decoded: Segment = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded, seg);
    }
}
