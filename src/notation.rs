//! The notation encoding: sigil-prefixed scalars with `{}` maps and `[]` arrays.
//!
//! ```text
//! {'name':'Alice','age':i30,'tags':['a','b'],'id':u3c115e51-04f4-523c-9fa6-98aff1034730}
//! ```
//!
//! | Form | Value |
//! |---|---|
//! | `!` | undefined |
//! | `1` `0` `t` `f` `T` `F` `true` `false` `TRUE` `FALSE` | boolean |
//! | `i-42` | integer |
//! | `r3.5` | real |
//! | `u<uuid>` | UUID |
//! | `'text'` `"text"` `s(4)"text"` | string |
//! | `l"http://..."` | URI |
//! | `d"2006-02-01T14:29:53Z"` | date |
//! | `b64"..."` `b16"..."` `b(4)"...."` | binary |
//!
//! ## Examples
//!
//! ```rust
//! use serde_llsd::notation::{NotationFormatter, NotationParser};
//! use serde_llsd::{llsd, FormatOptions, Formatter, ParseOptions, Parser};
//!
//! let value = llsd!({ "amy": 23, "bob": undef, "cam": 1.23 });
//! let text = NotationFormatter::new(FormatOptions::new()).format(&value).unwrap();
//! assert_eq!(text, b"{'amy':i23,'bob':!,'cam':r1.23}");
//!
//! let parsed = NotationParser::new(ParseOptions::new()).parse_slice(&text).unwrap();
//! assert_eq!(parsed.value, value);
//! assert_eq!(parsed.nodes, 4);
//! ```

use crate::codec::{Formatter, Parsed, Parser};
use crate::depth::DepthBudget;
use crate::input::Input;
use crate::options::{BinaryStyle, FormatOptions, ParseOptions};
use crate::{Error, LlsdDate, LlsdMap, LlsdValue, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use std::io::BufRead;
use tracing::debug;
use uuid::Uuid;

const UUID_TEXT_LEN: usize = 36;

/// Writes values in the notation encoding.
#[derive(Clone, Debug, Default)]
pub struct NotationFormatter {
    options: FormatOptions,
}

impl NotationFormatter {
    #[must_use]
    pub fn new(options: FormatOptions) -> Self {
        NotationFormatter { options }
    }

    fn write_value(&self, value: &LlsdValue, out: &mut Vec<u8>, level: usize) {
        match value {
            LlsdValue::Undefined => out.push(b'!'),
            LlsdValue::Boolean(b) => {
                out.extend_from_slice(self.options.boolean_style.render(*b).as_bytes())
            }
            LlsdValue::Integer(i) => {
                out.push(b'i');
                out.extend_from_slice(i.to_string().as_bytes());
            }
            LlsdValue::Real(r) => {
                out.push(b'r');
                out.extend_from_slice(self.options.render_real(*r).as_bytes());
            }
            LlsdValue::Uuid(u) => {
                out.push(b'u');
                out.extend_from_slice(u.hyphenated().to_string().as_bytes());
            }
            LlsdValue::String(s) => write_quoted(out, s.as_bytes(), b'\''),
            LlsdValue::Uri(u) => {
                out.push(b'l');
                write_quoted(out, u.as_bytes(), b'"');
            }
            LlsdValue::Date(d) => {
                out.push(b'd');
                write_quoted(out, d.to_string().as_bytes(), b'"');
            }
            LlsdValue::Binary(bytes) => self.write_binary(bytes, out),
            LlsdValue::Array(items) => {
                out.push(b'[');
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        out.push(b',');
                    }
                    self.newline(out, level + 1);
                    self.write_value(item, out, level + 1);
                }
                if !items.is_empty() {
                    self.newline(out, level);
                }
                out.push(b']');
            }
            LlsdValue::Map(map) => {
                out.push(b'{');
                for (i, (key, item)) in map.iter().enumerate() {
                    if i > 0 {
                        out.push(b',');
                    }
                    self.newline(out, level + 1);
                    write_quoted(out, key.as_bytes(), b'\'');
                    out.push(b':');
                    self.write_value(item, out, level + 1);
                }
                if !map.is_empty() {
                    self.newline(out, level);
                }
                out.push(b'}');
            }
        }
    }

    fn write_binary(&self, bytes: &[u8], out: &mut Vec<u8>) {
        match self.options.binary_style {
            BinaryStyle::Base64 => {
                out.extend_from_slice(b"b64\"");
                out.extend_from_slice(STANDARD.encode(bytes).as_bytes());
            }
            BinaryStyle::Hex => {
                out.extend_from_slice(b"b16\"");
                out.extend_from_slice(hex::encode_upper(bytes).as_bytes());
            }
            BinaryStyle::Raw => {
                out.extend_from_slice(format!("b({})\"", bytes.len()).as_bytes());
                out.extend_from_slice(bytes);
            }
        }
        out.push(b'"');
    }

    fn newline(&self, out: &mut Vec<u8>, level: usize) {
        if self.options.pretty {
            out.push(b'\n');
            out.extend(std::iter::repeat(b' ').take(level * self.options.indent));
        }
    }
}

impl Formatter for NotationFormatter {
    fn format_into(&self, value: &LlsdValue, out: &mut Vec<u8>) -> Result<()> {
        self.write_value(value, out, 0);
        Ok(())
    }
}

/// Writes `bytes` between `delim` quotes, escaping the delimiter, backslashes
/// and everything outside printable ASCII.
pub(crate) fn write_quoted(out: &mut Vec<u8>, bytes: &[u8], delim: u8) {
    out.push(delim);
    for &byte in bytes {
        match byte {
            b'\\' => out.extend_from_slice(b"\\\\"),
            _ if byte == delim => {
                out.push(b'\\');
                out.push(delim);
            }
            0x07 => out.extend_from_slice(b"\\a"),
            0x08 => out.extend_from_slice(b"\\b"),
            b'\t' => out.extend_from_slice(b"\\t"),
            b'\n' => out.extend_from_slice(b"\\n"),
            0x0b => out.extend_from_slice(b"\\v"),
            0x0c => out.extend_from_slice(b"\\f"),
            b'\r' => out.extend_from_slice(b"\\r"),
            0x20..=0x7e => out.push(byte),
            _ => out.extend_from_slice(format!("\\x{:02x}", byte).as_bytes()),
        }
    }
    out.push(delim);
}

/// Reads an escaped string whose opening `delim` has already been consumed,
/// up to and including the matching unescaped closing `delim`.
pub(crate) fn read_quoted<R: BufRead>(input: &mut Input<R>, delim: u8) -> Result<String> {
    let start = input.pos();
    let mut bytes = Vec::new();
    loop {
        let byte = input.next("closing quote")?;
        if byte == delim {
            break;
        }
        if byte != b'\\' {
            bytes.push(byte);
            continue;
        }
        let escaped = input.next("escape sequence")?;
        bytes.push(match escaped {
            b'a' => 0x07,
            b'b' => 0x08,
            b'f' => 0x0c,
            b'n' => b'\n',
            b'r' => b'\r',
            b't' => b'\t',
            b'v' => 0x0b,
            b'x' => {
                let offset = input.pos();
                let digits = input.read_exact(2, "two hex digits")?;
                std::str::from_utf8(&digits)
                    .ok()
                    .and_then(|digits| u8::from_str_radix(digits, 16).ok())
                    .ok_or_else(|| Error::syntax(offset, "invalid \\x escape"))?
            }
            other => other,
        });
    }
    String::from_utf8(bytes).map_err(|_| Error::syntax(start, "string is not valid UTF-8"))
}

/// Reads one value in the notation encoding.
#[derive(Clone, Debug, Default)]
pub struct NotationParser {
    options: ParseOptions,
}

impl NotationParser {
    #[must_use]
    pub fn new(options: ParseOptions) -> Self {
        NotationParser { options }
    }
}

impl Parser for NotationParser {
    fn options(&self) -> &ParseOptions {
        &self.options
    }

    fn parse_bounded<R: BufRead>(&self, reader: R, limit: Option<usize>) -> Result<Parsed> {
        let mut reader = NotationReader {
            input: Input::new(reader, limit),
            nodes: 0,
        };
        match reader.parse_value(DepthBudget::new(self.options.depth_limit)) {
            Ok(value) => Ok(Parsed::new(value, reader.nodes)),
            Err(err) => {
                debug!(encoding = "notation", offset = reader.input.pos(), error = %err, "parse failed");
                Err(err)
            }
        }
    }
}

struct NotationReader<R> {
    input: Input<R>,
    nodes: usize,
}

impl<R: BufRead> NotationReader<R> {
    fn parse_value(&mut self, depth: DepthBudget) -> Result<LlsdValue> {
        self.input.skip_whitespace();
        let depth = depth.descend()?;
        let offset = self.input.pos();
        let sigil = self.input.next("a value")?;
        self.nodes += 1;

        match sigil {
            b'!' => Ok(LlsdValue::Undefined),
            b'1' => Ok(LlsdValue::Boolean(true)),
            b'0' => Ok(LlsdValue::Boolean(false)),
            b't' => self.finish_keyword(b"rue", true),
            b'T' => self.finish_keyword(b"RUE", true),
            b'f' => self.finish_keyword(b"alse", false),
            b'F' => self.finish_keyword(b"ALSE", false),
            b'i' => self.parse_integer(),
            b'r' => self.parse_real(),
            b'u' => self.parse_uuid(),
            b'\'' | b'"' => Ok(LlsdValue::String(read_quoted(&mut self.input, sigil)?)),
            b's' => Ok(LlsdValue::String(self.parse_sized_string()?)),
            b'l' => Ok(LlsdValue::Uri(self.parse_quoted_payload()?)),
            b'd' => {
                let at = self.input.pos();
                let text = self.parse_quoted_payload()?;
                LlsdDate::parse(&text)
                    .map(LlsdValue::Date)
                    .map_err(|_| Error::syntax(at, &format!("invalid date '{}'", text)))
            }
            b'b' => Ok(LlsdValue::Binary(self.parse_binary()?)),
            b'{' => self.parse_map(depth),
            b'[' => self.parse_array(depth),
            other => Err(Error::syntax(
                offset,
                &format!("unexpected '{}'", char::from(other).escape_default()),
            )),
        }
    }

    /// Completes `true`/`false` after the first letter; the single letter alone
    /// is also a boolean, but a partial keyword is not.
    fn finish_keyword(&mut self, rest: &[u8], value: bool) -> Result<LlsdValue> {
        if self.input.peek() != Some(rest[0]) {
            return Ok(LlsdValue::Boolean(value));
        }
        for &expected in rest {
            self.input.expect(expected)?;
        }
        Ok(LlsdValue::Boolean(value))
    }

    fn parse_integer(&mut self) -> Result<LlsdValue> {
        let offset = self.input.pos();
        let digits = self
            .input
            .take_while(|b| b.is_ascii_digit() || b == b'-' || b == b'+');
        std::str::from_utf8(&digits)
            .ok()
            .and_then(|digits| digits.parse::<i32>().ok())
            .map(LlsdValue::Integer)
            .ok_or_else(|| Error::syntax(offset, "invalid integer"))
    }

    fn parse_real(&mut self) -> Result<LlsdValue> {
        let offset = self.input.pos();
        let text = self
            .input
            .take_while(|b| b.is_ascii_alphanumeric() || matches!(b, b'+' | b'-' | b'.'));
        std::str::from_utf8(&text)
            .ok()
            .and_then(|text| text.parse::<f64>().ok())
            .map(LlsdValue::Real)
            .ok_or_else(|| Error::syntax(offset, "invalid real"))
    }

    fn parse_uuid(&mut self) -> Result<LlsdValue> {
        let offset = self.input.pos();
        let text = self.input.read_exact(UUID_TEXT_LEN, "a 36-character UUID")?;
        std::str::from_utf8(&text)
            .ok()
            .and_then(|text| Uuid::parse_str(text).ok())
            .map(LlsdValue::Uuid)
            .ok_or_else(|| Error::syntax(offset, "invalid UUID"))
    }

    /// `(N)` as used by `s(N)` and `b(N)`.
    fn parse_length(&mut self) -> Result<usize> {
        self.input.expect(b'(')?;
        let offset = self.input.pos();
        let digits = self.input.take_while(|b| b.is_ascii_digit());
        let len = std::str::from_utf8(&digits)
            .ok()
            .and_then(|digits| digits.parse::<usize>().ok())
            .ok_or_else(|| Error::syntax(offset, "invalid length"))?;
        self.input.expect(b')')?;
        Ok(len)
    }

    /// Reads `"<len raw bytes>"`; the closing quote must follow exactly `len` bytes.
    fn parse_sized_payload(&mut self, len: usize) -> Result<Vec<u8>> {
        let offset = self.input.pos();
        let delim = self.input.next("opening quote")?;
        if delim != b'"' && delim != b'\'' {
            return Err(Error::syntax(offset, "expected opening quote"));
        }
        let start = self.input.pos();
        let payload = self.input.read_declared(len)?;
        if self.input.peek() == Some(delim) {
            self.input.next("closing quote")?;
            return Ok(payload);
        }
        let actual = match payload.iter().position(|&b| b == delim) {
            Some(early) => early,
            None if self.input.peek().is_some() => {
                len + self.input.take_while(|b| b != delim).len()
            }
            None => {
                // Nothing follows the payload: report why.
                self.input.next("closing quote")?;
                len
            }
        };
        Err(Error::length_mismatch(start, len, actual))
    }

    fn parse_sized_string(&mut self) -> Result<String> {
        let len = self.parse_length()?;
        let offset = self.input.pos();
        let payload = self.parse_sized_payload(len)?;
        String::from_utf8(payload).map_err(|_| Error::syntax(offset, "string is not valid UTF-8"))
    }

    fn parse_quoted_payload(&mut self) -> Result<String> {
        let offset = self.input.pos();
        match self.input.next("opening quote")? {
            delim @ (b'"' | b'\'') => read_quoted(&mut self.input, delim),
            _ => Err(Error::syntax(offset, "expected opening quote")),
        }
    }

    fn parse_binary(&mut self) -> Result<Vec<u8>> {
        let offset = self.input.pos();
        match self.input.peek() {
            Some(b'(') => {
                let len = self.parse_length()?;
                self.parse_sized_payload(len)
            }
            Some(b'6') => {
                self.input.expect(b'6')?;
                self.input.expect(b'4')?;
                let text = self.parse_encoded_payload()?;
                let compact: Vec<u8> = text
                    .into_iter()
                    .filter(|b| !b.is_ascii_whitespace())
                    .collect();
                STANDARD
                    .decode(compact)
                    .map_err(|e| Error::syntax(offset, &format!("invalid base64: {}", e)))
            }
            Some(b'1') => {
                self.input.expect(b'1')?;
                self.input.expect(b'6')?;
                let text = self.parse_encoded_payload()?;
                hex::decode(text).map_err(|e| Error::syntax(offset, &format!("invalid hex: {}", e)))
            }
            _ => Err(Error::syntax(offset, "expected b64, b16 or b(N)")),
        }
    }

    /// Raw text between double quotes, for the `b64` and `b16` forms.
    fn parse_encoded_payload(&mut self) -> Result<Vec<u8>> {
        self.input.expect(b'"')?;
        let text = self.input.take_while(|b| b != b'"');
        self.input.expect(b'"')?;
        Ok(text)
    }

    fn parse_map(&mut self, depth: DepthBudget) -> Result<LlsdValue> {
        let mut map = LlsdMap::new();
        loop {
            self.input.skip_whitespace();
            let offset = self.input.pos();
            let key = match self.input.next("map key or '}'")? {
                b'}' if map.is_empty() => break,
                b'}' => return Err(Error::syntax(offset, "expected map key after ','")),
                delim @ (b'\'' | b'"') => read_quoted(&mut self.input, delim)?,
                b's' => self.parse_sized_string()?,
                other => {
                    return Err(Error::syntax(
                        offset,
                        &format!("expected map key, found '{}'", char::from(other).escape_default()),
                    ))
                }
            };
            self.input.skip_whitespace();
            self.input.expect(b':')?;
            let value = self.parse_value(depth)?;
            map.insert(key, value);

            self.input.skip_whitespace();
            let offset = self.input.pos();
            match self.input.next("',' or '}'")? {
                b',' => continue,
                b'}' => break,
                _ => return Err(Error::syntax(offset, "expected ',' or '}' after map entry")),
            }
        }
        Ok(LlsdValue::Map(map))
    }

    fn parse_array(&mut self, depth: DepthBudget) -> Result<LlsdValue> {
        let mut items = Vec::new();
        self.input.skip_whitespace();
        if self.input.peek() == Some(b']') {
            self.input.next("']'")?;
            return Ok(LlsdValue::Array(items));
        }
        loop {
            items.push(self.parse_value(depth)?);
            self.input.skip_whitespace();
            let offset = self.input.pos();
            match self.input.next("',' or ']'")? {
                b',' => continue,
                b']' => break,
                _ => return Err(Error::syntax(offset, "expected ',' or ']' after array element")),
            }
        }
        Ok(LlsdValue::Array(items))
    }
}
