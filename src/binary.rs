//! The binary encoding: one tag byte per value, big-endian lengths and counts.
//!
//! | Tag | Value | Payload |
//! |---|---|---|
//! | `!` | undefined | none |
//! | `1` `0` | boolean | none |
//! | `i` | integer | 4-byte big-endian |
//! | `r` | real | 8-byte big-endian |
//! | `u` | UUID | 16 raw bytes |
//! | `s` `l` `b` | string, URI, binary | 4-byte big-endian length, then the bytes |
//! | `d` | date | 8-byte big-endian seconds since the epoch |
//! | `{` | map | 4-byte count, count × (`k` + length + key, value), `}` |
//! | `[` | array | 4-byte count, count × value, `]` |
//!
//! When the input's length is known, every declared length and count is
//! checked against the bytes actually left, so a hostile length field fails
//! immediately instead of allocating. On a stream of unknown length payloads
//! are read in bounded steps instead.
//!
//! ## Examples
//!
//! ```rust
//! use serde_llsd::binary::BinaryFormatter;
//! use serde_llsd::{llsd, Formatter};
//!
//! let bytes = BinaryFormatter::new().format(&llsd!({ "amy": 23 })).unwrap();
//! assert_eq!(
//!     bytes,
//!     b"{\x00\x00\x00\x01k\x00\x00\x00\x03amyi\x00\x00\x00\x17}".to_vec()
//! );
//! ```

use crate::codec::{Formatter, Parsed, Parser};
use crate::depth::DepthBudget;
use crate::input::Input;
use crate::notation::read_quoted;
use crate::options::ParseOptions;
use crate::{Error, LlsdDate, LlsdMap, LlsdValue, Result};
use std::io::BufRead;
use tracing::debug;
use uuid::Uuid;

/// Writes values in the binary encoding. Binary output has no options.
#[derive(Clone, Copy, Debug, Default)]
pub struct BinaryFormatter;

impl BinaryFormatter {
    #[must_use]
    pub fn new() -> Self {
        BinaryFormatter
    }

    fn write_value(value: &LlsdValue, out: &mut Vec<u8>) -> Result<()> {
        match value {
            LlsdValue::Undefined => out.push(b'!'),
            LlsdValue::Boolean(true) => out.push(b'1'),
            LlsdValue::Boolean(false) => out.push(b'0'),
            LlsdValue::Integer(i) => {
                out.push(b'i');
                out.extend_from_slice(&i.to_be_bytes());
            }
            LlsdValue::Real(r) => {
                out.push(b'r');
                out.extend_from_slice(&r.to_be_bytes());
            }
            LlsdValue::Uuid(u) => {
                out.push(b'u');
                out.extend_from_slice(u.as_bytes());
            }
            LlsdValue::String(s) => write_sized(out, b's', s.as_bytes())?,
            LlsdValue::Uri(u) => write_sized(out, b'l', u.as_bytes())?,
            LlsdValue::Binary(bytes) => write_sized(out, b'b', bytes)?,
            LlsdValue::Date(d) => {
                out.push(b'd');
                out.extend_from_slice(&d.seconds().to_be_bytes());
            }
            LlsdValue::Array(items) => {
                out.push(b'[');
                out.extend_from_slice(&length_field(items.len())?);
                for item in items {
                    Self::write_value(item, out)?;
                }
                out.push(b']');
            }
            LlsdValue::Map(map) => {
                out.push(b'{');
                out.extend_from_slice(&length_field(map.len())?);
                for (key, item) in map.iter() {
                    write_sized(out, b'k', key.as_bytes())?;
                    Self::write_value(item, out)?;
                }
                out.push(b'}');
            }
        }
        Ok(())
    }
}

impl Formatter for BinaryFormatter {
    fn format_into(&self, value: &LlsdValue, out: &mut Vec<u8>) -> Result<()> {
        Self::write_value(value, out)
    }
}

fn length_field(len: usize) -> Result<[u8; 4]> {
    u32::try_from(len)
        .map(u32::to_be_bytes)
        .map_err(|_| Error::unsupported_type(&format!("length {} does not fit in 32 bits", len)))
}

fn write_sized(out: &mut Vec<u8>, tag: u8, bytes: &[u8]) -> Result<()> {
    out.push(tag);
    out.extend_from_slice(&length_field(bytes.len())?);
    out.extend_from_slice(bytes);
    Ok(())
}

/// Reads one value in the binary encoding.
#[derive(Clone, Debug, Default)]
pub struct BinaryParser {
    options: ParseOptions,
}

impl BinaryParser {
    #[must_use]
    pub fn new(options: ParseOptions) -> Self {
        BinaryParser { options }
    }
}

impl Parser for BinaryParser {
    fn options(&self) -> &ParseOptions {
        &self.options
    }

    fn parse_bounded<R: BufRead>(&self, reader: R, limit: Option<usize>) -> Result<Parsed> {
        let mut reader = BinaryReader {
            input: Input::new(reader, limit),
            nodes: 0,
        };
        match reader.parse_value(DepthBudget::new(self.options.depth_limit)) {
            Ok(value) => Ok(Parsed::new(value, reader.nodes)),
            Err(err) => {
                debug!(encoding = "binary", offset = reader.input.pos(), error = %err, "parse failed");
                Err(err)
            }
        }
    }
}

/// Containers never reserve room for more entries than this up front.
const MAX_PREALLOC_ENTRIES: usize = 4096;

struct BinaryReader<R> {
    input: Input<R>,
    nodes: usize,
}

impl<R: BufRead> BinaryReader<R> {
    fn parse_value(&mut self, depth: DepthBudget) -> Result<LlsdValue> {
        let depth = depth.descend()?;
        let offset = self.input.pos();
        let tag = self.input.next("a value tag")?;
        self.nodes += 1;

        match tag {
            b'!' => Ok(LlsdValue::Undefined),
            b'1' => Ok(LlsdValue::Boolean(true)),
            b'0' => Ok(LlsdValue::Boolean(false)),
            b'i' => Ok(LlsdValue::Integer(self.input.read_i32_be()?)),
            b'r' => Ok(LlsdValue::Real(self.input.read_f64_be("8-byte real")?)),
            b'u' => {
                let raw = self.input.read_exact(16, "16 UUID bytes")?;
                let uuid = Uuid::from_slice(&raw)
                    .map_err(|_| Error::syntax(offset + 1, "invalid UUID bytes"))?;
                Ok(LlsdValue::Uuid(uuid))
            }
            b's' => Ok(LlsdValue::String(self.read_sized_string()?)),
            b'l' => Ok(LlsdValue::Uri(self.read_sized_string()?)),
            b'b' => Ok(LlsdValue::Binary(self.read_sized()?)),
            b'd' => Ok(LlsdValue::Date(LlsdDate::from_seconds(
                self.input.read_f64_be("8-byte date")?,
            ))),
            b'\'' | b'"' => Ok(LlsdValue::String(read_quoted(&mut self.input, tag)?)),
            b'{' => self.parse_map(depth),
            b'[' => self.parse_array(depth),
            other => Err(Error::syntax(
                offset,
                &format!("unknown binary tag 0x{:02x}", other),
            )),
        }
    }

    fn read_count(&mut self) -> Result<usize> {
        Ok(self.input.read_u32_be()? as usize)
    }

    fn read_sized(&mut self) -> Result<Vec<u8>> {
        let len = self.read_count()?;
        self.input.read_declared(len)
    }

    fn read_sized_string(&mut self) -> Result<String> {
        let offset = self.input.pos();
        let bytes = self.read_sized()?;
        String::from_utf8(bytes).map_err(|_| Error::syntax(offset, "string is not valid UTF-8"))
    }

    /// Rejects a count that could not possibly fit in the bytes left, where
    /// every entry takes at least `min_entry` bytes.
    fn check_count(&self, count: usize, min_entry: usize) -> Result<()> {
        let need = count.saturating_mul(min_entry);
        match self.input.remaining() {
            Some(remaining) if need > remaining => {
                Err(Error::exceeds_budget(self.input.pos(), need, remaining))
            }
            _ => Ok(()),
        }
    }

    fn parse_map(&mut self, depth: DepthBudget) -> Result<LlsdValue> {
        let count_at = self.input.pos();
        let count = self.read_count()?;
        // A key tag and a value tag at the very least.
        self.check_count(count, 2)?;
        let mut map = LlsdMap::with_capacity(count.min(MAX_PREALLOC_ENTRIES));
        for parsed in 0..count {
            let offset = self.input.pos();
            let key = match self.input.next("map key")? {
                b'k' => self.read_sized_string()?,
                delim @ (b'\'' | b'"') => read_quoted(&mut self.input, delim)?,
                b'}' => return Err(Error::length_mismatch(count_at, count, parsed)),
                other => {
                    return Err(Error::syntax(
                        offset,
                        &format!("expected map key, found tag 0x{:02x}", other),
                    ))
                }
            };
            let value = self.parse_value(depth)?;
            map.insert(key, value);
        }
        self.expect_close(b'}', count_at, count)?;
        Ok(LlsdValue::Map(map))
    }

    fn parse_array(&mut self, depth: DepthBudget) -> Result<LlsdValue> {
        let count_at = self.input.pos();
        let count = self.read_count()?;
        self.check_count(count, 1)?;
        let mut items = Vec::with_capacity(count.min(MAX_PREALLOC_ENTRIES));
        for parsed in 0..count {
            if self.input.peek() == Some(b']') {
                return Err(Error::length_mismatch(count_at, count, parsed));
            }
            items.push(self.parse_value(depth)?);
        }
        self.expect_close(b']', count_at, count)?;
        Ok(LlsdValue::Array(items))
    }

    /// After `count` entries the closer must come next; anything else means
    /// the count was too small.
    fn expect_close(&mut self, closer: u8, count_at: usize, count: usize) -> Result<()> {
        let expected = format!("'{}'", char::from(closer));
        match self.input.next(&expected)? {
            byte if byte == closer => Ok(()),
            _ => Err(Error::length_mismatch(count_at, count, count + 1)),
        }
    }
}
