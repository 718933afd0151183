//! # serde_llsd
//!
//! Reading and writing LLSD, the self-describing structured data format used
//! by virtual-world protocols.
//!
//! ## What is LLSD?
//!
//! LLSD is a dynamically typed value model with eleven kinds of value:
//! undefined, boolean, 32-bit integer, real, string, UUID, date, URI, binary,
//! array and map. It has three interchangeable wire encodings:
//!
//! - **Notation**: a compact, sigil-based text form (`{'amy':i23}`)
//! - **XML**: an `<llsd>` document with one element per value
//! - **Binary**: tag bytes followed by big-endian length-prefixed payloads
//!
//! Any value written in one encoding reads back equal from the same encoding,
//! and converting between encodings preserves it.
//!
//! ## Key Features
//!
//! - **Untrusted input**: parsers enforce an optional byte budget and a
//!   nesting depth that never exceeds [`depth::MAX_DEPTH`], and report how
//!   many nodes they consumed
//! - **Self-identifying streams**: [`serialize`] and [`deserialize`] add and
//!   detect a `<? llsd/... ?>` header; [`deserialize_from`] reads exactly one
//!   value from a stream
//! - **Serde Compatible**: [`to_value`] and [`from_value`] bridge LLSD to any
//!   `#[derive(Serialize, Deserialize)]` type
//! - **Configurable output**: pretty printing, boolean and binary styles and a
//!   printf-style real format
//!
//! ## Quick Start
//!
//! ```rust
//! use serde_llsd::{from_notation, llsd, to_notation, LlsdValue};
//!
//! let value = llsd!({ "amy": 23, "bob": undef, "cam": 1.23 });
//! let text = to_notation(&value).unwrap();
//! assert_eq!(text, b"{'amy':i23,'bob':!,'cam':r1.23}");
//!
//! let back = from_notation(&text).unwrap();
//! assert_eq!(back, value);
//! ```
//!
//! ### Bounded parsing
//!
//! ```rust
//! use serde_llsd::{notation::NotationParser, ErrorKind, ParseOptions, Parser};
//!
//! let parser = NotationParser::new(ParseOptions::new().with_byte_budget(8));
//! let err = parser.parse_slice(b"s(13)\"a long string\"").unwrap_err();
//! assert_eq!(err.kind(), ErrorKind::BudgetExceeded);
//! ```
//!
//! ### Typed data
//!
//! ```rust
//! use serde::{Deserialize, Serialize};
//! use serde_llsd::{from_binary, from_value, to_binary, to_value};
//!
//! #[derive(Serialize, Deserialize, PartialEq, Debug)]
//! struct Parcel {
//!     name: String,
//!     area: u32,
//!     for_sale: bool,
//! }
//!
//! let parcel = Parcel { name: "Ahern".into(), area: 512, for_sale: false };
//! let bytes = to_binary(&to_value(&parcel).unwrap()).unwrap();
//! let back: Parcel = from_value(from_binary(&bytes).unwrap()).unwrap();
//! assert_eq!(back, parcel);
//! ```
//!
//! ## Safety Guarantees
//!
//! - No `unsafe` code blocks
//! - Declared lengths are checked against the remaining input before any
//!   allocation
//! - Malformed input yields an [`Error`], never a panic

pub mod binary;
pub mod codec;
pub mod date;
pub mod de;
pub mod depth;
pub mod dispatch;
pub mod error;
mod input;
pub mod macros;
pub mod map;
pub mod notation;
pub mod options;
pub mod real_format;
pub mod ser;
pub mod value;
pub mod xml;

pub use codec::{Formatter, Parsed, Parser};
pub use date::LlsdDate;
pub use de::{from_value, ValueDeserializer};
pub use depth::DepthBudget;
pub use dispatch::{deserialize, deserialize_from, serialize, Encoding};
pub use error::{Error, ErrorKind, Result};
pub use map::LlsdMap;
pub use options::{BinaryStyle, BooleanStyle, FormatOptions, ParseOptions};
pub use real_format::RealFormat;
pub use ser::{to_value, ValueSerializer};
pub use value::LlsdValue;

/// Shorthand for [`LlsdValue`].
pub type Value = LlsdValue;

use binary::{BinaryFormatter, BinaryParser};
use notation::{NotationFormatter, NotationParser};
use xml::{XmlFormatter, XmlParser};

/// Formats `value` as compact notation.
///
/// # Examples
///
/// ```rust
/// use serde_llsd::{llsd, to_notation};
///
/// assert_eq!(to_notation(&llsd!([1, "a", undef])).unwrap(), b"[i1,'a',!]");
/// ```
///
/// # Errors
///
/// Notation can represent every value, so this only fails if a custom real
/// format cannot be applied.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_notation(value: &LlsdValue) -> Result<Vec<u8>> {
    to_notation_with_options(value, &FormatOptions::default())
}

/// Formats `value` as notation with custom options.
///
/// # Errors
///
/// See [`to_notation`].
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_notation_with_options(value: &LlsdValue, options: &FormatOptions) -> Result<Vec<u8>> {
    NotationFormatter::new(options.clone()).format(value)
}

/// Formats `value` as a compact XML document.
///
/// # Examples
///
/// ```rust
/// use serde_llsd::{to_xml, LlsdValue};
///
/// assert_eq!(
///     to_xml(&LlsdValue::Integer(5)).unwrap(),
///     b"<llsd><integer>5</integer></llsd>\n"
/// );
/// ```
///
/// # Errors
///
/// See [`to_notation`].
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_xml(value: &LlsdValue) -> Result<Vec<u8>> {
    to_xml_with_options(value, &FormatOptions::default())
}

/// Formats `value` as an XML document with custom options.
///
/// # Errors
///
/// See [`to_notation`].
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_xml_with_options(value: &LlsdValue, options: &FormatOptions) -> Result<Vec<u8>> {
    XmlFormatter::new(options.clone()).format(value)
}

/// Formats `value` in the binary encoding.
///
/// # Errors
///
/// Returns [`Error::UnsupportedType`] when a string, binary, array or map is
/// too long for a 32-bit length field.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_binary(value: &LlsdValue) -> Result<Vec<u8>> {
    BinaryFormatter::new().format(value)
}

/// Parses one notation value with no byte budget or depth limit.
///
/// # Examples
///
/// ```rust
/// use serde_llsd::{from_notation, LlsdValue};
///
/// let value = from_notation(b"{'name':'Alice','age':i30}").unwrap();
/// assert_eq!(value.get("age"), Some(&LlsdValue::Integer(30)));
/// ```
///
/// # Errors
///
/// Returns an error if the input is not well-formed notation.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn from_notation(input: &[u8]) -> Result<LlsdValue> {
    NotationParser::default()
        .parse_slice(input)
        .map(Parsed::into_value)
}

/// Parses one XML document with no byte budget or depth limit.
///
/// # Errors
///
/// Returns [`Error::NotLlsd`] if the root element is not `<llsd>`, and a
/// structural error for malformed XML.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn from_xml(input: &[u8]) -> Result<LlsdValue> {
    XmlParser::default().parse_slice(input).map(Parsed::into_value)
}

/// Parses one binary value with no byte budget or depth limit.
///
/// # Errors
///
/// Returns an error if the input is truncated or malformed.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn from_binary(input: &[u8]) -> Result<LlsdValue> {
    BinaryParser::default()
        .parse_slice(input)
        .map(Parsed::into_value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Serialize, Deserialize, Debug, PartialEq)]
    struct Point {
        x: i32,
        y: i32,
    }

    #[derive(Serialize, Deserialize, Debug, PartialEq)]
    struct User {
        id: u32,
        name: String,
        active: bool,
        tags: Vec<String>,
    }

    fn alice() -> User {
        User {
            id: 123,
            name: "Alice".to_string(),
            active: true,
            tags: vec!["admin".to_string(), "user".to_string()],
        }
    }

    #[test]
    fn test_user_through_every_encoding() {
        let value = to_value(&alice()).unwrap();

        let notation = from_notation(&to_notation(&value).unwrap()).unwrap();
        let xml = from_xml(&to_xml(&value).unwrap()).unwrap();
        let binary = from_binary(&to_binary(&value).unwrap()).unwrap();

        for back in [notation, xml, binary] {
            assert_eq!(from_value::<User>(back).unwrap(), alice());
        }
    }

    #[test]
    fn test_pretty_printing() {
        let value = to_value(&alice()).unwrap();
        let options = FormatOptions::pretty();

        let notation = to_notation_with_options(&value, &options).unwrap();
        assert!(notation.contains(&b'\n'));
        assert_eq!(from_notation(&notation).unwrap(), value);

        let xml = to_xml_with_options(&value, &options).unwrap();
        assert!(xml.starts_with(b"<?xml"));
        assert_eq!(from_xml(&xml).unwrap(), value);
    }

    #[test]
    fn test_to_value() {
        let value = to_value(&Point { x: 1, y: 2 }).unwrap();
        assert!(value.is_map());
        assert_eq!(value.get("x"), Some(&LlsdValue::Integer(1)));
        assert_eq!(value.get("y"), Some(&LlsdValue::Integer(2)));
    }

    #[test]
    fn test_arrays() {
        let numbers = vec![1, 2, 3, 4, 5];
        let bytes = to_binary(&to_value(&numbers).unwrap()).unwrap();
        let back: Vec<i32> = from_value(from_binary(&bytes).unwrap()).unwrap();
        assert_eq!(numbers, back);
    }

    #[test]
    fn test_value_alias() {
        let value: Value = llsd!([true]);
        assert_eq!(value.to_string(), "[1]");
    }
}
