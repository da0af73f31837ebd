//! Recursive value model for segment payloads.
//!
//! Segment payloads are open-ended key/value maps whose values mix strings,
//! numbers, booleans, and nested maps/lists (forwarded-message nodes carry
//! whole segment lists inside a payload). [`SegmentValue`] models that shape
//! as a small recursive variant so payloads round-trip through JSON without
//! loss and compare with well-defined equality.
//!
//! Gateways are sloppy about numeric fields — the same field arrives as
//! `123` from one implementation and `"123"` from another. The [`lenient`]
//! module provides `deserialize_with` helpers that accept both.

use std::fmt;

use serde::de::{Deserializer, MapAccess, SeqAccess, Visitor};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// SegmentValue
// ---------------------------------------------------------------------------

/// One value inside a segment payload.
///
/// JSON numbers decode to [`Int`](SegmentValue::Int) when they fit an `i64`
/// and to [`Float`](SegmentValue::Float) otherwise, so identifier-sized
/// integers never lose precision.
#[derive(Debug, Clone, PartialEq)]
pub enum SegmentValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<SegmentValue>),
    Map(SegmentMap),
}

impl SegmentValue {
    /// Returns the string slice if this value is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            SegmentValue::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the integer value if this value is an integer.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            SegmentValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Returns the boolean value if this value is a boolean.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            SegmentValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the list if this value is a list.
    pub fn as_list(&self) -> Option<&[SegmentValue]> {
        match self {
            SegmentValue::List(items) => Some(items),
            _ => None,
        }
    }

    /// Returns the map if this value is a map.
    pub fn as_map(&self) -> Option<&SegmentMap> {
        match self {
            SegmentValue::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Returns `true` for [`SegmentValue::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, SegmentValue::Null)
    }
}

impl From<bool> for SegmentValue {
    fn from(v: bool) -> Self {
        SegmentValue::Bool(v)
    }
}

impl From<i32> for SegmentValue {
    fn from(v: i32) -> Self {
        SegmentValue::Int(v.into())
    }
}

impl From<i64> for SegmentValue {
    fn from(v: i64) -> Self {
        SegmentValue::Int(v)
    }
}

impl From<f64> for SegmentValue {
    fn from(v: f64) -> Self {
        SegmentValue::Float(v)
    }
}

impl From<&str> for SegmentValue {
    fn from(v: &str) -> Self {
        SegmentValue::Str(v.to_string())
    }
}

impl From<String> for SegmentValue {
    fn from(v: String) -> Self {
        SegmentValue::Str(v)
    }
}

impl From<Vec<SegmentValue>> for SegmentValue {
    fn from(v: Vec<SegmentValue>) -> Self {
        SegmentValue::List(v)
    }
}

impl From<SegmentMap> for SegmentValue {
    fn from(v: SegmentMap) -> Self {
        SegmentValue::Map(v)
    }
}

impl Serialize for SegmentValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            SegmentValue::Null => serializer.serialize_unit(),
            SegmentValue::Bool(b) => serializer.serialize_bool(*b),
            SegmentValue::Int(i) => serializer.serialize_i64(*i),
            SegmentValue::Float(f) => serializer.serialize_f64(*f),
            SegmentValue::Str(s) => serializer.serialize_str(s),
            SegmentValue::List(items) => serializer.collect_seq(items),
            SegmentValue::Map(map) => map.serialize(serializer),
        }
    }
}

struct SegmentValueVisitor;

impl<'de> Visitor<'de> for SegmentValueVisitor {
    type Value = SegmentValue;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("any JSON value")
    }

    fn visit_bool<E>(self, v: bool) -> Result<Self::Value, E> {
        Ok(SegmentValue::Bool(v))
    }

    fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E> {
        Ok(SegmentValue::Int(v))
    }

    fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E> {
        // Out-of-range magnitudes degrade to floats rather than failing.
        Ok(i64::try_from(v)
            .map(SegmentValue::Int)
            .unwrap_or(SegmentValue::Float(v as f64)))
    }

    fn visit_f64<E>(self, v: f64) -> Result<Self::Value, E> {
        Ok(SegmentValue::Float(v))
    }

    fn visit_str<E>(self, v: &str) -> Result<Self::Value, E> {
        Ok(SegmentValue::Str(v.to_string()))
    }

    fn visit_string<E>(self, v: String) -> Result<Self::Value, E> {
        Ok(SegmentValue::Str(v))
    }

    fn visit_unit<E>(self) -> Result<Self::Value, E> {
        Ok(SegmentValue::Null)
    }

    fn visit_none<E>(self) -> Result<Self::Value, E> {
        Ok(SegmentValue::Null)
    }

    fn visit_some<D: Deserializer<'de>>(self, d: D) -> Result<Self::Value, D::Error> {
        d.deserialize_any(SegmentValueVisitor)
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
        let mut items = Vec::new();
        while let Some(item) = seq.next_element()? {
            items.push(item);
        }
        Ok(SegmentValue::List(items))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut map = SegmentMap::new();
        while let Some((key, value)) = access.next_entry::<String, SegmentValue>()? {
            map.insert(key, value);
        }
        Ok(SegmentValue::Map(map))
    }
}

impl<'de> Deserialize<'de> for SegmentValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(SegmentValueVisitor)
    }
}

// ---------------------------------------------------------------------------
// SegmentMap
// ---------------------------------------------------------------------------

/// An ordered map of payload keys to [`SegmentValue`]s.
///
/// Storage preserves insertion order and original key case, so a decoded
/// payload re-encodes byte-for-byte equivalent. Lookups and replacement are
/// ASCII-case-insensitive: gateways disagree on key casing and the protocol
/// treats `File` and `file` as the same key.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SegmentMap {
    entries: Vec<(String, SegmentValue)>,
}

impl SegmentMap {
    /// Creates an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks up a value by key, ignoring ASCII case.
    pub fn get(&self, key: &str) -> Option<&SegmentValue> {
        self.entries
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v)
    }

    /// Mutable lookup, ignoring ASCII case.
    pub fn get_mut(&mut self, key: &str) -> Option<&mut SegmentValue> {
        self.entries
            .iter_mut()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v)
    }

    /// Shorthand for a string-valued lookup.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(SegmentValue::as_str)
    }

    /// Shorthand for an integer-valued lookup.
    pub fn get_int(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(SegmentValue::as_int)
    }

    /// Inserts a value. A key that already exists (ignoring ASCII case) is
    /// replaced in place, keeping its position and original spelling.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<SegmentValue>) {
        let key = key.into();
        let value = value.into();
        match self.get_mut(&key) {
            Some(slot) => *slot = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the map has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &SegmentValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl FromIterator<(String, SegmentValue)> for SegmentMap {
    fn from_iter<I: IntoIterator<Item = (String, SegmentValue)>>(iter: I) -> Self {
        let mut map = SegmentMap::new();
        for (key, value) in iter {
            map.insert(key, value);
        }
        map
    }
}

impl Serialize for SegmentMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, value) in &self.entries {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

struct SegmentMapVisitor;

impl<'de> Visitor<'de> for SegmentMapVisitor {
    type Value = SegmentMap;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a JSON object")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut map = SegmentMap::new();
        while let Some((key, value)) = access.next_entry::<String, SegmentValue>()? {
            map.insert(key, value);
        }
        Ok(map)
    }
}

impl<'de> Deserialize<'de> for SegmentMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(SegmentMapVisitor)
    }
}

// ---------------------------------------------------------------------------
// Lenient numeric decoding
// ---------------------------------------------------------------------------

/// `deserialize_with` helpers for numeric fields that may arrive as JSON
/// numbers or as string-encoded numbers.
pub mod lenient {
    use std::fmt;

    use serde::de::{self, Deserializer, Visitor};

    struct LenientI64;

    impl Visitor<'_> for LenientI64 {
        type Value = i64;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("an integer or a string-encoded integer")
        }

        fn visit_i64<E>(self, v: i64) -> Result<i64, E> {
            Ok(v)
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<i64, E> {
            i64::try_from(v).map_err(|_| E::custom("integer out of range for i64"))
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<i64, E> {
            v.trim()
                .parse()
                .map_err(|_| E::custom(format!("cannot parse {v:?} as an integer")))
        }
    }

    /// Decodes an `i64` from a number or a numeric string.
    pub fn i64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
        deserializer.deserialize_any(LenientI64)
    }

    struct LenientOptI64;

    impl<'de> Visitor<'de> for LenientOptI64 {
        type Value = Option<i64>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("an optional integer or string-encoded integer")
        }

        fn visit_none<E>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_some<D: Deserializer<'de>>(self, d: D) -> Result<Self::Value, D::Error> {
            i64(d).map(Some)
        }
    }

    /// Decodes an `Option<i64>` from a number, a numeric string, or null.
    pub fn opt_i64<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<i64>, D::Error> {
        deserializer.deserialize_option(LenientOptI64)
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_int_round_trip() {
        let json = "12345678901234";
        let value: SegmentValue = serde_json::from_str(json).unwrap();
        assert_eq!(value, SegmentValue::Int(12345678901234));
        assert_eq!(serde_json::to_string(&value).unwrap(), json);
    }

    #[test]
    fn test_value_float_when_not_integral() {
        let value: SegmentValue = serde_json::from_str("1.5").unwrap();
        assert_eq!(value, SegmentValue::Float(1.5));
    }

    #[test]
    fn test_value_nested_round_trip() {
        let json = r#"{"a":[1,"two",{"b":null,"c":true}],"d":-3}"#;
        let value: SegmentValue = serde_json::from_str(json).unwrap();
        // Re-encoding preserves entry order, so the text matches exactly.
        assert_eq!(serde_json::to_string(&value).unwrap(), json);
    }

    #[test]
    fn test_map_get_is_case_insensitive() {
        let mut map = SegmentMap::new();
        map.insert("File", "a.png");
        assert_eq!(map.get_str("file"), Some("a.png"));
        assert_eq!(map.get_str("FILE"), Some("a.png"));
        assert_eq!(map.get("nope"), None);
    }

    #[test]
    fn test_map_insert_replaces_case_insensitively() {
        let mut map = SegmentMap::new();
        map.insert("file", "a.png");
        map.insert("FILE", "b.png");
        assert_eq!(map.len(), 1);
        assert_eq!(map.get_str("file"), Some("b.png"));
        // The original spelling is what re-encodes.
        assert_eq!(serde_json::to_string(&map).unwrap(), r#"{"file":"b.png"}"#);
    }

    #[test]
    fn test_map_preserves_insertion_order() {
        let mut map = SegmentMap::new();
        map.insert("z", 1i64);
        map.insert("a", 2i64);
        map.insert("m", 3i64);
        let keys: Vec<&str> = map.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["z", "a", "m"]);
    }

    #[test]
    fn test_lenient_i64_accepts_number_and_string() {
        #[derive(serde::Deserialize)]
        struct Probe {
            #[serde(deserialize_with = "lenient::i64")]
            id: i64,
        }

        let n: Probe = serde_json::from_str(r#"{"id": 42}"#).unwrap();
        assert_eq!(n.id, 42);

        let s: Probe = serde_json::from_str(r#"{"id": "42"}"#).unwrap();
        assert_eq!(s.id, 42);

        let bad: Result<Probe, _> = serde_json::from_str(r#"{"id": "nope"}"#);
        assert!(bad.is_err());
    }

    #[test]
    fn test_lenient_opt_i64_accepts_null() {
        #[derive(Default, serde::Deserialize)]
        #[serde(default)]
        struct Probe {
            #[serde(deserialize_with = "lenient::opt_i64")]
            id: Option<i64>,
        }

        let null: Probe = serde_json::from_str(r#"{"id": null}"#).unwrap();
        assert_eq!(null.id, None);

        let missing: Probe = serde_json::from_str("{}").unwrap();
        assert_eq!(missing.id, None);

        let string: Probe = serde_json::from_str(r#"{"id": "7"}"#).unwrap();
        assert_eq!(string.id, Some(7));
    }
}
