//! Converting Rust values into [`LlsdValue`].
//!
//! [`ValueSerializer`] is a serde `Serializer` whose output is an in-memory
//! [`LlsdValue`]; any of the three formatters can then write it out.
//!
//! | Rust | LLSD |
//! |---|---|
//! | `bool` | boolean |
//! | integers fitting in `i32` | integer |
//! | wider integers, floats | real |
//! | `char`, `&str`, `String` | string |
//! | bytes (`serde_bytes`, `serialize_bytes`) | binary |
//! | `()`, `None`, unit structs | undefined |
//! | sequences, tuples | array |
//! | maps with string keys, structs | map |
//! | unit variants | string holding the variant name |
//! | other variants | one-entry map from the variant name to its content |
//!
//! ## Usage
//!
//! ```rust
//! use serde::Serialize;
//! use serde_llsd::{to_value, LlsdValue};
//!
//! #[derive(Serialize)]
//! struct Agent { name: String, region: Option<String>, x: u64 }
//!
//! let agent = Agent { name: "Alice".into(), region: None, x: 5_000_000_000 };
//! let value = to_value(&agent).unwrap();
//! assert_eq!(value.get("name").and_then(|v| v.as_str()), Some("Alice"));
//! assert_eq!(value.get("region"), Some(&LlsdValue::Undefined));
//! assert_eq!(value.get("x"), Some(&LlsdValue::Real(5_000_000_000.0)));
//! ```

use crate::{Error, LlsdMap, LlsdValue, Result};
use serde::{ser, Serialize};

/// Serializer producing an [`LlsdValue`].
pub struct ValueSerializer;

pub struct SerializeVec {
    vec: Vec<LlsdValue>,
    variant: Option<&'static str>,
}

pub struct SerializeMap {
    map: LlsdMap,
    current_key: Option<String>,
    variant: Option<&'static str>,
}

/// Wraps `value` as `{variant: value}`.
fn tag_variant(variant: Option<&'static str>, value: LlsdValue) -> LlsdValue {
    match variant {
        Some(name) => {
            let mut map = LlsdMap::with_capacity(1);
            map.insert(name.to_string(), value);
            LlsdValue::Map(map)
        }
        None => value,
    }
}

/// Integers outside the 32-bit range widen to reals.
fn integer_or_real<T: Into<i128>>(v: T) -> LlsdValue {
    let wide: i128 = v.into();
    match i32::try_from(wide) {
        Ok(i) => LlsdValue::Integer(i),
        Err(_) => LlsdValue::Real(wide as f64),
    }
}

impl ser::Serializer for ValueSerializer {
    type Ok = LlsdValue;
    type Error = Error;

    type SerializeSeq = SerializeVec;
    type SerializeTuple = SerializeVec;
    type SerializeTupleStruct = SerializeVec;
    type SerializeTupleVariant = SerializeVec;
    type SerializeMap = SerializeMap;
    type SerializeStruct = SerializeMap;
    type SerializeStructVariant = SerializeMap;

    fn serialize_bool(self, v: bool) -> Result<LlsdValue> {
        Ok(LlsdValue::Boolean(v))
    }

    fn serialize_i8(self, v: i8) -> Result<LlsdValue> {
        Ok(LlsdValue::Integer(i32::from(v)))
    }

    fn serialize_i16(self, v: i16) -> Result<LlsdValue> {
        Ok(LlsdValue::Integer(i32::from(v)))
    }

    fn serialize_i32(self, v: i32) -> Result<LlsdValue> {
        Ok(LlsdValue::Integer(v))
    }

    fn serialize_i64(self, v: i64) -> Result<LlsdValue> {
        Ok(integer_or_real(v))
    }

    fn serialize_i128(self, v: i128) -> Result<LlsdValue> {
        Ok(integer_or_real(v))
    }

    fn serialize_u8(self, v: u8) -> Result<LlsdValue> {
        Ok(LlsdValue::Integer(i32::from(v)))
    }

    fn serialize_u16(self, v: u16) -> Result<LlsdValue> {
        Ok(LlsdValue::Integer(i32::from(v)))
    }

    fn serialize_u32(self, v: u32) -> Result<LlsdValue> {
        Ok(integer_or_real(v))
    }

    fn serialize_u64(self, v: u64) -> Result<LlsdValue> {
        Ok(integer_or_real(v))
    }

    fn serialize_u128(self, v: u128) -> Result<LlsdValue> {
        match i32::try_from(v) {
            Ok(i) => Ok(LlsdValue::Integer(i)),
            Err(_) => Ok(LlsdValue::Real(v as f64)),
        }
    }

    fn serialize_f32(self, v: f32) -> Result<LlsdValue> {
        Ok(LlsdValue::Real(f64::from(v)))
    }

    fn serialize_f64(self, v: f64) -> Result<LlsdValue> {
        Ok(LlsdValue::Real(v))
    }

    fn serialize_char(self, v: char) -> Result<LlsdValue> {
        Ok(LlsdValue::String(v.to_string()))
    }

    fn serialize_str(self, v: &str) -> Result<LlsdValue> {
        Ok(LlsdValue::String(v.to_string()))
    }

    fn serialize_bytes(self, v: &[u8]) -> Result<LlsdValue> {
        Ok(LlsdValue::Binary(v.to_vec()))
    }

    fn serialize_none(self) -> Result<LlsdValue> {
        Ok(LlsdValue::Undefined)
    }

    fn serialize_some<T>(self, value: &T) -> Result<LlsdValue>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<LlsdValue> {
        Ok(LlsdValue::Undefined)
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<LlsdValue> {
        Ok(LlsdValue::Undefined)
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> Result<LlsdValue> {
        Ok(LlsdValue::String(variant.to_string()))
    }

    fn serialize_newtype_struct<T>(self, _name: &'static str, value: &T) -> Result<LlsdValue>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T>(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        value: &T,
    ) -> Result<LlsdValue>
    where
        T: ?Sized + Serialize,
    {
        Ok(tag_variant(Some(variant), to_value(value)?))
    }

    fn serialize_seq(self, len: Option<usize>) -> Result<SerializeVec> {
        Ok(SerializeVec::new(len.unwrap_or(0), None))
    }

    fn serialize_tuple(self, len: usize) -> Result<SerializeVec> {
        Ok(SerializeVec::new(len, None))
    }

    fn serialize_tuple_struct(self, _name: &'static str, len: usize) -> Result<SerializeVec> {
        Ok(SerializeVec::new(len, None))
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        len: usize,
    ) -> Result<SerializeVec> {
        Ok(SerializeVec::new(len, Some(variant)))
    }

    fn serialize_map(self, len: Option<usize>) -> Result<SerializeMap> {
        Ok(SerializeMap::new(len.unwrap_or(0), None))
    }

    fn serialize_struct(self, _name: &'static str, len: usize) -> Result<SerializeMap> {
        Ok(SerializeMap::new(len, None))
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        len: usize,
    ) -> Result<SerializeMap> {
        Ok(SerializeMap::new(len, Some(variant)))
    }
}

impl SerializeVec {
    fn new(capacity: usize, variant: Option<&'static str>) -> Self {
        SerializeVec {
            vec: Vec::with_capacity(capacity.min(4096)),
            variant,
        }
    }

    fn push<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<()> {
        self.vec.push(to_value(value)?);
        Ok(())
    }

    fn finish(self) -> LlsdValue {
        tag_variant(self.variant, LlsdValue::Array(self.vec))
    }
}

impl SerializeMap {
    fn new(capacity: usize, variant: Option<&'static str>) -> Self {
        SerializeMap {
            map: LlsdMap::with_capacity(capacity.min(4096)),
            current_key: None,
            variant,
        }
    }

    fn finish(self) -> LlsdValue {
        tag_variant(self.variant, LlsdValue::Map(self.map))
    }
}

impl ser::SerializeSeq for SerializeVec {
    type Ok = LlsdValue;
    type Error = Error;

    fn serialize_element<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.push(value)
    }

    fn end(self) -> Result<LlsdValue> {
        Ok(self.finish())
    }
}

impl ser::SerializeTuple for SerializeVec {
    type Ok = LlsdValue;
    type Error = Error;

    fn serialize_element<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.push(value)
    }

    fn end(self) -> Result<LlsdValue> {
        Ok(self.finish())
    }
}

impl ser::SerializeTupleStruct for SerializeVec {
    type Ok = LlsdValue;
    type Error = Error;

    fn serialize_field<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.push(value)
    }

    fn end(self) -> Result<LlsdValue> {
        Ok(self.finish())
    }
}

impl ser::SerializeTupleVariant for SerializeVec {
    type Ok = LlsdValue;
    type Error = Error;

    fn serialize_field<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.push(value)
    }

    fn end(self) -> Result<LlsdValue> {
        Ok(self.finish())
    }
}

impl ser::SerializeMap for SerializeMap {
    type Ok = LlsdValue;
    type Error = Error;

    fn serialize_key<T>(&mut self, key: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        match to_value(key)? {
            LlsdValue::String(s) => {
                self.current_key = Some(s);
                Ok(())
            }
            other => Err(Error::custom(format!(
                "map keys must be strings, found {}",
                other.type_name()
            ))),
        }
    }

    fn serialize_value<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        let key = self
            .current_key
            .take()
            .ok_or_else(|| Error::custom("serialize_value called without serialize_key"))?;
        self.map.insert(key, to_value(value)?);
        Ok(())
    }

    fn end(self) -> Result<LlsdValue> {
        Ok(self.finish())
    }
}

impl ser::SerializeStruct for SerializeMap {
    type Ok = LlsdValue;
    type Error = Error;

    fn serialize_field<T>(&mut self, key: &'static str, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.map.insert(key.to_string(), to_value(value)?);
        Ok(())
    }

    fn end(self) -> Result<LlsdValue> {
        Ok(self.finish())
    }
}

impl ser::SerializeStructVariant for SerializeMap {
    type Ok = LlsdValue;
    type Error = Error;

    fn serialize_field<T>(&mut self, key: &'static str, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.map.insert(key.to_string(), to_value(value)?);
        Ok(())
    }

    fn end(self) -> Result<LlsdValue> {
        Ok(self.finish())
    }
}

/// Converts any `T: Serialize` into an [`LlsdValue`].
///
/// # Errors
///
/// Returns an error if the value has a map with non-string keys, or if its
/// `Serialize` implementation fails.
pub fn to_value<T>(value: &T) -> Result<LlsdValue>
where
    T: ?Sized + Serialize,
{
    value.serialize(ValueSerializer)
}
