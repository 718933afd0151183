//! Converting [`LlsdValue`] into Rust values.
//!
//! [`from_value`] drives any `T: Deserialize` from a parsed value. The LLSD
//! types without a serde counterpart surface as strings: UUIDs in hyphenated
//! form, dates in their ISO-8601 text and URIs verbatim. Binary is offered as
//! a byte buffer, or as a sequence of `u8` when the target asks for one.
//!
//! Undefined stands in for `None`, `()` and unit structs. Enums are read from
//! a string (unit variants) or a one-entry map from the variant name to its
//! content.
//!
//! ```rust
//! use serde::Deserialize;
//! use serde_llsd::{from_notation, from_value};
//!
//! #[derive(Deserialize, Debug, PartialEq)]
//! struct Agent { name: String, region: Option<String>, age: u8 }
//!
//! let value = from_notation(b"{'name':'Alice','region':!,'age':i30}").unwrap();
//! let agent: Agent = from_value(value).unwrap();
//! assert_eq!(agent, Agent { name: "Alice".into(), region: None, age: 30 });
//! ```

use crate::{Error, LlsdMap, LlsdValue, Result};
use serde::de::{self, DeserializeOwned, IntoDeserializer};
use serde::forward_to_deserialize_any;

/// Deserializes a `T` out of an owned [`LlsdValue`].
///
/// # Errors
///
/// Returns [`Error::Custom`] when the shape of the value does not match what
/// `T` expects.
pub fn from_value<T>(value: LlsdValue) -> Result<T>
where
    T: DeserializeOwned,
{
    T::deserialize(ValueDeserializer::new(value))
}

/// A serde `Deserializer` reading from an owned [`LlsdValue`].
pub struct ValueDeserializer {
    value: LlsdValue,
}

impl ValueDeserializer {
    #[must_use]
    pub fn new(value: LlsdValue) -> Self {
        ValueDeserializer { value }
    }

    fn invalid_type(&self, expected: &str) -> Error {
        Error::custom(format!(
            "invalid type: expected {}, found {}",
            expected,
            self.value.type_name()
        ))
    }
}

impl IntoDeserializer<'_, Error> for LlsdValue {
    type Deserializer = ValueDeserializer;

    fn into_deserializer(self) -> ValueDeserializer {
        ValueDeserializer::new(self)
    }
}

impl<'de> de::Deserializer<'de> for ValueDeserializer {
    type Error = Error;

    fn deserialize_any<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self.value {
            LlsdValue::Undefined => visitor.visit_unit(),
            LlsdValue::Boolean(b) => visitor.visit_bool(b),
            LlsdValue::Integer(i) => visitor.visit_i32(i),
            LlsdValue::Real(r) => visitor.visit_f64(r),
            LlsdValue::String(s) | LlsdValue::Uri(s) => visitor.visit_string(s),
            LlsdValue::Uuid(u) => visitor.visit_string(u.hyphenated().to_string()),
            LlsdValue::Date(d) => visitor.visit_string(d.to_string()),
            LlsdValue::Binary(b) => visitor.visit_byte_buf(b),
            LlsdValue::Array(arr) => visitor.visit_seq(SeqDeserializer::new(arr)),
            LlsdValue::Map(map) => visitor.visit_map(MapDeserializer::new(map)),
        }
    }

    fn deserialize_option<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self.value {
            LlsdValue::Undefined => visitor.visit_none(),
            _ => visitor.visit_some(self),
        }
    }

    fn deserialize_unit<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self.value {
            LlsdValue::Undefined => visitor.visit_unit(),
            _ => Err(self.invalid_type("undefined")),
        }
    }

    fn deserialize_unit_struct<V>(self, _name: &'static str, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        self.deserialize_unit(visitor)
    }

    fn deserialize_newtype_struct<V>(self, _name: &'static str, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_seq<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self.value {
            LlsdValue::Array(arr) => visitor.visit_seq(SeqDeserializer::new(arr)),
            LlsdValue::Binary(bytes) => {
                let values = bytes.into_iter().map(|b| LlsdValue::Integer(i32::from(b)));
                visitor.visit_seq(SeqDeserializer::new(values.collect()))
            }
            _ => Err(self.invalid_type("array")),
        }
    }

    fn deserialize_tuple<V>(self, _len: usize, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        self.deserialize_seq(visitor)
    }

    fn deserialize_tuple_struct<V>(
        self,
        _name: &'static str,
        _len: usize,
        visitor: V,
    ) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        self.deserialize_seq(visitor)
    }

    fn deserialize_enum<V>(
        self,
        _name: &'static str,
        _variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self.value {
            LlsdValue::String(variant) => visitor.visit_enum(EnumDeserializer::new(variant, None)),
            LlsdValue::Map(map) if map.len() == 1 => {
                let Some((variant, value)) = map.into_iter().next() else {
                    return Err(Error::custom("expected enum variant"));
                };
                visitor.visit_enum(EnumDeserializer::new(variant, Some(value)))
            }
            LlsdValue::Map(_) => Err(Error::custom(
                "expected a map with a single key naming the enum variant",
            )),
            _ => Err(self.invalid_type("string or map")),
        }
    }

    forward_to_deserialize_any! {
        bool i8 i16 i32 i64 i128 u8 u16 u32 u64 u128 f32 f64 char str string
        bytes byte_buf map struct identifier ignored_any
    }
}

struct SeqDeserializer {
    iter: std::vec::IntoIter<LlsdValue>,
}

impl SeqDeserializer {
    fn new(vec: Vec<LlsdValue>) -> Self {
        SeqDeserializer {
            iter: vec.into_iter(),
        }
    }
}

impl<'de> de::SeqAccess<'de> for SeqDeserializer {
    type Error = Error;

    fn next_element_seed<T>(&mut self, seed: T) -> Result<Option<T::Value>>
    where
        T: de::DeserializeSeed<'de>,
    {
        match self.iter.next() {
            Some(value) => seed.deserialize(ValueDeserializer::new(value)).map(Some),
            None => Ok(None),
        }
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.iter.len())
    }
}

struct MapDeserializer {
    iter: indexmap::map::IntoIter<String, LlsdValue>,
    value: Option<LlsdValue>,
}

impl MapDeserializer {
    fn new(map: LlsdMap) -> Self {
        MapDeserializer {
            iter: map.into_iter(),
            value: None,
        }
    }
}

impl<'de> de::MapAccess<'de> for MapDeserializer {
    type Error = Error;

    fn next_key_seed<K>(&mut self, seed: K) -> Result<Option<K::Value>>
    where
        K: de::DeserializeSeed<'de>,
    {
        match self.iter.next() {
            Some((key, value)) => {
                self.value = Some(value);
                seed.deserialize(ValueDeserializer::new(LlsdValue::String(key)))
                    .map(Some)
            }
            None => Ok(None),
        }
    }

    fn next_value_seed<V>(&mut self, seed: V) -> Result<V::Value>
    where
        V: de::DeserializeSeed<'de>,
    {
        match self.value.take() {
            Some(value) => seed.deserialize(ValueDeserializer::new(value)),
            None => Err(Error::custom("next_value_seed called before next_key_seed")),
        }
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.iter.len())
    }
}

struct EnumDeserializer {
    variant: String,
    value: Option<LlsdValue>,
}

impl EnumDeserializer {
    fn new(variant: String, value: Option<LlsdValue>) -> Self {
        EnumDeserializer { variant, value }
    }
}

impl<'de> de::EnumAccess<'de> for EnumDeserializer {
    type Error = Error;
    type Variant = VariantDeserializer;

    fn variant_seed<V>(self, seed: V) -> Result<(V::Value, Self::Variant)>
    where
        V: de::DeserializeSeed<'de>,
    {
        let variant = seed.deserialize(ValueDeserializer::new(LlsdValue::String(self.variant)))?;
        Ok((variant, VariantDeserializer { value: self.value }))
    }
}

struct VariantDeserializer {
    value: Option<LlsdValue>,
}

impl<'de> de::VariantAccess<'de> for VariantDeserializer {
    type Error = Error;

    fn unit_variant(self) -> Result<()> {
        match self.value {
            Some(LlsdValue::Undefined) | None => Ok(()),
            _ => Err(Error::custom("expected unit variant")),
        }
    }

    fn newtype_variant_seed<T>(self, seed: T) -> Result<T::Value>
    where
        T: de::DeserializeSeed<'de>,
    {
        match self.value {
            Some(value) => seed.deserialize(ValueDeserializer::new(value)),
            None => Err(Error::custom("expected newtype variant")),
        }
    }

    fn tuple_variant<V>(self, _len: usize, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self.value {
            Some(LlsdValue::Array(arr)) => visitor.visit_seq(SeqDeserializer::new(arr)),
            _ => Err(Error::custom("expected tuple variant")),
        }
    }

    fn struct_variant<V>(self, _fields: &'static [&'static str], visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self.value {
            Some(LlsdValue::Map(map)) => visitor.visit_map(MapDeserializer::new(map)),
            _ => Err(Error::custom("expected struct variant")),
        }
    }
}
