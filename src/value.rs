//! Dynamic value representation for LLSD data.
//!
//! This module provides the [`LlsdValue`] enum, the tagged union every codec
//! in this crate reads and writes.
//!
//! ## Core Types
//!
//! - [`LlsdValue`]: undefined, boolean, integer, real, string, UUID, date, URI,
//!   binary, array or map
//! - [`LlsdMap`](crate::LlsdMap): the map payload
//! - [`LlsdDate`](crate::LlsdDate): the date payload
//!
//! ## Usage Patterns
//!
//! ### Creating Values
//!
//! ```rust
//! use serde_llsd::{llsd, LlsdValue};
//!
//! let undef = LlsdValue::Undefined;
//! let boolean = LlsdValue::from(true);
//! let number = LlsdValue::from(42);
//! let text = LlsdValue::from("hello");
//!
//! let map = llsd!({
//!     "name": "Alice",
//!     "age": 30
//! });
//! assert!(map.is_map());
//! ```
//!
//! ### Growing Containers
//!
//! Assigning into an undefined value turns it into the right container, and
//! assigning past the end of an array pads it with undefined values.
//!
//! ```rust
//! use serde_llsd::LlsdValue;
//!
//! let mut list = LlsdValue::Undefined;
//! list.set_at(2, LlsdValue::from(7));
//! assert_eq!(list.len(), 3);
//! assert!(list.get_index(0).unwrap().is_undefined());
//!
//! let mut map = LlsdValue::Undefined;
//! map.set("amy", LlsdValue::from(23));
//! assert_eq!(map.get("amy").and_then(|v| v.as_integer()), Some(23));
//! ```
//!
//! ### Node Counting
//!
//! Every scalar and every container counts as one node, which is the figure the
//! parsers report alongside the value they built.
//!
//! ```rust
//! use serde_llsd::llsd;
//!
//! let value = llsd!({ "amy": 23, "bob": undef, "cam": 1.23 });
//! assert_eq!(value.node_count(), 4);
//! ```

use crate::{LlsdDate, LlsdMap};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use uuid::Uuid;

/// A dynamically-typed LLSD value.
///
/// Equality is structural, with two exceptions inherited from the payloads:
/// maps compare without regard to key order, and a `Real` holding NaN is never
/// equal to anything.
///
/// # Examples
///
/// ```rust
/// use serde_llsd::LlsdValue;
///
/// let undef = LlsdValue::Undefined;
/// let num = LlsdValue::Integer(42);
/// let uri = LlsdValue::Uri("http://example.com/".to_string());
///
/// assert!(undef.is_undefined());
/// assert!(num.is_integer());
/// assert_eq!(uri.type_name(), "uri");
/// ```
#[derive(Clone, Debug, PartialEq, Default)]
pub enum LlsdValue {
    #[default]
    Undefined,
    Boolean(bool),
    Integer(i32),
    Real(f64),
    String(String),
    Uuid(Uuid),
    Date(LlsdDate),
    Uri(String),
    Binary(Vec<u8>),
    Array(Vec<LlsdValue>),
    Map(LlsdMap),
}

impl LlsdValue {
    /// Creates an empty map value.
    #[must_use]
    pub fn empty_map() -> Self {
        LlsdValue::Map(LlsdMap::new())
    }

    /// Creates an empty array value.
    #[must_use]
    pub fn empty_array() -> Self {
        LlsdValue::Array(Vec::new())
    }

    /// Creates a binary value from anything byte-like.
    #[must_use]
    pub fn binary(bytes: impl Into<Vec<u8>>) -> Self {
        LlsdValue::Binary(bytes.into())
    }

    /// Creates a URI value. URIs are opaque and never validated.
    #[must_use]
    pub fn uri(text: impl Into<String>) -> Self {
        LlsdValue::Uri(text.into())
    }

    /// Name of the variant, as used by the XML tag vocabulary.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            LlsdValue::Undefined => "undef",
            LlsdValue::Boolean(_) => "boolean",
            LlsdValue::Integer(_) => "integer",
            LlsdValue::Real(_) => "real",
            LlsdValue::String(_) => "string",
            LlsdValue::Uuid(_) => "uuid",
            LlsdValue::Date(_) => "date",
            LlsdValue::Uri(_) => "uri",
            LlsdValue::Binary(_) => "binary",
            LlsdValue::Array(_) => "array",
            LlsdValue::Map(_) => "map",
        }
    }

    #[inline]
    #[must_use]
    pub const fn is_undefined(&self) -> bool {
        matches!(self, LlsdValue::Undefined)
    }

    #[inline]
    #[must_use]
    pub const fn is_boolean(&self) -> bool {
        matches!(self, LlsdValue::Boolean(_))
    }

    #[inline]
    #[must_use]
    pub const fn is_integer(&self) -> bool {
        matches!(self, LlsdValue::Integer(_))
    }

    #[inline]
    #[must_use]
    pub const fn is_real(&self) -> bool {
        matches!(self, LlsdValue::Real(_))
    }

    #[inline]
    #[must_use]
    pub const fn is_string(&self) -> bool {
        matches!(self, LlsdValue::String(_))
    }

    #[inline]
    #[must_use]
    pub const fn is_uuid(&self) -> bool {
        matches!(self, LlsdValue::Uuid(_))
    }

    #[inline]
    #[must_use]
    pub const fn is_date(&self) -> bool {
        matches!(self, LlsdValue::Date(_))
    }

    #[inline]
    #[must_use]
    pub const fn is_uri(&self) -> bool {
        matches!(self, LlsdValue::Uri(_))
    }

    #[inline]
    #[must_use]
    pub const fn is_binary(&self) -> bool {
        matches!(self, LlsdValue::Binary(_))
    }

    #[inline]
    #[must_use]
    pub const fn is_array(&self) -> bool {
        matches!(self, LlsdValue::Array(_))
    }

    #[inline]
    #[must_use]
    pub const fn is_map(&self) -> bool {
        matches!(self, LlsdValue::Map(_))
    }

    #[must_use]
    pub fn as_boolean(&self) -> Option<bool> {
        match self {
            LlsdValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_integer(&self) -> Option<i32> {
        match self {
            LlsdValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Returns the value as a float, widening integers.
    #[must_use]
    pub fn as_real(&self) -> Option<f64> {
        match self {
            LlsdValue::Real(r) => Some(*r),
            LlsdValue::Integer(i) => Some(f64::from(*i)),
            _ => None,
        }
    }

    /// Returns the text of a string value.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            LlsdValue::String(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_uuid(&self) -> Option<Uuid> {
        match self {
            LlsdValue::Uuid(u) => Some(*u),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_date(&self) -> Option<LlsdDate> {
        match self {
            LlsdValue::Date(d) => Some(*d),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_uri(&self) -> Option<&str> {
        match self {
            LlsdValue::Uri(u) => Some(u),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_binary(&self) -> Option<&[u8]> {
        match self {
            LlsdValue::Binary(b) => Some(b),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_array(&self) -> Option<&Vec<LlsdValue>> {
        match self {
            LlsdValue::Array(a) => Some(a),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_map(&self) -> Option<&LlsdMap> {
        match self {
            LlsdValue::Map(m) => Some(m),
            _ => None,
        }
    }

    /// Looks up a key in a map value.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&LlsdValue> {
        self.as_map().and_then(|map| map.get(key))
    }

    /// Looks up an index in an array value.
    #[must_use]
    pub fn get_index(&self, index: usize) -> Option<&LlsdValue> {
        self.as_array().and_then(|array| array.get(index))
    }

    /// Number of entries in a container; zero for scalars.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            LlsdValue::Array(a) => a.len(),
            LlsdValue::Map(m) => m.len(),
            _ => 0,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Stores `value` under `key`, replacing any previous value for that key.
    ///
    /// An undefined value becomes an empty map first. Any other non-map value
    /// is left untouched and the assignment is ignored.
    pub fn set(&mut self, key: impl Into<String>, value: LlsdValue) {
        if self.is_undefined() {
            *self = LlsdValue::empty_map();
        }
        if let LlsdValue::Map(map) = self {
            map.insert(key.into(), value);
        }
    }

    /// Stores `value` at `index`, padding the array with undefined values as needed.
    ///
    /// An undefined value becomes an empty array first. Any other non-array
    /// value is left untouched.
    pub fn set_at(&mut self, index: usize, value: LlsdValue) {
        if self.is_undefined() {
            *self = LlsdValue::empty_array();
        }
        if let LlsdValue::Array(array) = self {
            if index >= array.len() {
                array.resize(index + 1, LlsdValue::Undefined);
            }
            array[index] = value;
        }
    }

    /// Appends to an array, turning an undefined value into an array first.
    pub fn push(&mut self, value: LlsdValue) {
        if self.is_undefined() {
            *self = LlsdValue::empty_array();
        }
        if let LlsdValue::Array(array) = self {
            array.push(value);
        }
    }

    /// Counts one node per scalar and one per container, plus all children.
    ///
    /// A formatted value parses back with exactly this count.
    #[must_use]
    pub fn node_count(&self) -> usize {
        match self {
            LlsdValue::Array(items) => 1 + items.iter().map(LlsdValue::node_count).sum::<usize>(),
            LlsdValue::Map(map) => 1 + map.values().map(LlsdValue::node_count).sum::<usize>(),
            _ => 1,
        }
    }
}

impl fmt::Display for LlsdValue {
    /// Renders the compact notation form.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = crate::to_notation(self).map_err(|_| fmt::Error)?;
        f.write_str(&String::from_utf8_lossy(&text))
    }
}

impl Serialize for LlsdValue {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            LlsdValue::Undefined => serializer.serialize_unit(),
            LlsdValue::Boolean(b) => serializer.serialize_bool(*b),
            LlsdValue::Integer(i) => serializer.serialize_i32(*i),
            LlsdValue::Real(r) => serializer.serialize_f64(*r),
            LlsdValue::String(s) | LlsdValue::Uri(s) => serializer.serialize_str(s),
            LlsdValue::Uuid(u) => serializer.collect_str(&u.hyphenated()),
            LlsdValue::Date(d) => serializer.collect_str(d),
            LlsdValue::Binary(b) => serializer.serialize_bytes(b),
            LlsdValue::Array(arr) => {
                use serde::ser::SerializeSeq;
                let mut seq = serializer.serialize_seq(Some(arr.len()))?;
                for element in arr {
                    seq.serialize_element(element)?;
                }
                seq.end()
            }
            LlsdValue::Map(obj) => {
                use serde::ser::SerializeMap;
                let mut map = serializer.serialize_map(Some(obj.len()))?;
                for (k, v) in obj.iter() {
                    map.serialize_entry(k, v)?;
                }
                map.end()
            }
        }
    }
}

impl<'de> Deserialize<'de> for LlsdValue {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        use serde::de::{self, Visitor};

        struct LlsdValueVisitor;

        impl<'de> Visitor<'de> for LlsdValueVisitor {
            type Value = LlsdValue;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("any valid LLSD value")
            }

            fn visit_bool<E>(self, value: bool) -> Result<Self::Value, E> {
                Ok(LlsdValue::Boolean(value))
            }

            fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E> {
                Ok(i32::try_from(value)
                    .map(LlsdValue::Integer)
                    .unwrap_or(LlsdValue::Real(value as f64)))
            }

            fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E> {
                Ok(i32::try_from(value)
                    .map(LlsdValue::Integer)
                    .unwrap_or(LlsdValue::Real(value as f64)))
            }

            fn visit_f64<E>(self, value: f64) -> Result<Self::Value, E> {
                Ok(LlsdValue::Real(value))
            }

            fn visit_str<E>(self, value: &str) -> Result<Self::Value, E> {
                Ok(LlsdValue::String(value.to_string()))
            }

            fn visit_string<E>(self, value: String) -> Result<Self::Value, E> {
                Ok(LlsdValue::String(value))
            }

            fn visit_bytes<E>(self, value: &[u8]) -> Result<Self::Value, E> {
                Ok(LlsdValue::Binary(value.to_vec()))
            }

            fn visit_byte_buf<E>(self, value: Vec<u8>) -> Result<Self::Value, E> {
                Ok(LlsdValue::Binary(value))
            }

            fn visit_unit<E>(self) -> Result<Self::Value, E> {
                Ok(LlsdValue::Undefined)
            }

            fn visit_none<E>(self) -> Result<Self::Value, E> {
                Ok(LlsdValue::Undefined)
            }

            fn visit_some<D>(self, deserializer: D) -> Result<Self::Value, D::Error>
            where
                D: Deserializer<'de>,
            {
                Deserialize::deserialize(deserializer)
            }

            fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
            where
                A: de::SeqAccess<'de>,
            {
                let mut vec = Vec::with_capacity(seq.size_hint().unwrap_or(0).min(4096));
                while let Some(elem) = seq.next_element()? {
                    vec.push(elem);
                }
                Ok(LlsdValue::Array(vec))
            }

            fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
            where
                A: de::MapAccess<'de>,
            {
                let mut values = LlsdMap::new();
                while let Some((key, value)) = map.next_entry()? {
                    values.insert(key, value);
                }
                Ok(LlsdValue::Map(values))
            }
        }

        deserializer.deserialize_any(LlsdValueVisitor)
    }
}

impl TryFrom<LlsdValue> for i32 {
    type Error = crate::Error;

    fn try_from(value: LlsdValue) -> crate::Result<Self> {
        match value {
            LlsdValue::Integer(i) => Ok(i),
            LlsdValue::Real(r) => {
                if r.fract() == 0.0 && r >= f64::from(i32::MIN) && r <= f64::from(i32::MAX) {
                    Ok(r as i32)
                } else {
                    Err(crate::Error::custom(format!(
                        "cannot convert real {} to i32",
                        r
                    )))
                }
            }
            _ => Err(crate::Error::custom(format!(
                "expected integer, found {}",
                value.type_name()
            ))),
        }
    }
}

impl TryFrom<LlsdValue> for f64 {
    type Error = crate::Error;

    fn try_from(value: LlsdValue) -> crate::Result<Self> {
        value.as_real().ok_or_else(|| {
            crate::Error::custom(format!("expected real, found {}", value.type_name()))
        })
    }
}

impl TryFrom<LlsdValue> for bool {
    type Error = crate::Error;

    fn try_from(value: LlsdValue) -> crate::Result<Self> {
        match value {
            LlsdValue::Boolean(b) => Ok(b),
            _ => Err(crate::Error::custom(format!(
                "expected boolean, found {}",
                value.type_name()
            ))),
        }
    }
}

impl TryFrom<LlsdValue> for String {
    type Error = crate::Error;

    fn try_from(value: LlsdValue) -> crate::Result<Self> {
        match value {
            LlsdValue::String(s) => Ok(s),
            _ => Err(crate::Error::custom(format!(
                "expected string, found {}",
                value.type_name()
            ))),
        }
    }
}

impl From<bool> for LlsdValue {
    fn from(value: bool) -> Self {
        LlsdValue::Boolean(value)
    }
}

impl From<i8> for LlsdValue {
    fn from(value: i8) -> Self {
        LlsdValue::Integer(i32::from(value))
    }
}

impl From<i16> for LlsdValue {
    fn from(value: i16) -> Self {
        LlsdValue::Integer(i32::from(value))
    }
}

impl From<i32> for LlsdValue {
    fn from(value: i32) -> Self {
        LlsdValue::Integer(value)
    }
}

impl From<u8> for LlsdValue {
    fn from(value: u8) -> Self {
        LlsdValue::Integer(i32::from(value))
    }
}

impl From<u16> for LlsdValue {
    fn from(value: u16) -> Self {
        LlsdValue::Integer(i32::from(value))
    }
}

impl From<f32> for LlsdValue {
    fn from(value: f32) -> Self {
        LlsdValue::Real(f64::from(value))
    }
}

impl From<f64> for LlsdValue {
    fn from(value: f64) -> Self {
        LlsdValue::Real(value)
    }
}

impl From<&str> for LlsdValue {
    fn from(value: &str) -> Self {
        LlsdValue::String(value.to_string())
    }
}

impl From<String> for LlsdValue {
    fn from(value: String) -> Self {
        LlsdValue::String(value)
    }
}

impl From<Uuid> for LlsdValue {
    fn from(value: Uuid) -> Self {
        LlsdValue::Uuid(value)
    }
}

impl From<LlsdDate> for LlsdValue {
    fn from(value: LlsdDate) -> Self {
        LlsdValue::Date(value)
    }
}

impl From<LlsdMap> for LlsdValue {
    fn from(value: LlsdMap) -> Self {
        LlsdValue::Map(value)
    }
}

impl<T: Into<LlsdValue>> From<Vec<T>> for LlsdValue {
    fn from(value: Vec<T>) -> Self {
        LlsdValue::Array(value.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<LlsdValue>> From<Option<T>> for LlsdValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(LlsdValue::Undefined, Into::into)
    }
}
