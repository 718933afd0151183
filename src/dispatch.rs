//! Self-identifying streams.
//!
//! [`serialize`] writes a short header naming the encoding before the body;
//! [`deserialize`] reads that header back and picks the matching parser. Input
//! without a header is sniffed: a leading `<` means XML, anything else is
//! taken as notation. Binary has no recognizable first byte, so it is only
//! ever detected through its header.
//!
//! The bare formatters and parsers in [`notation`](crate::notation),
//! [`xml`](crate::xml) and [`binary`](crate::binary) never write or expect a
//! header.
//!
//! [`deserialize_from`] does the same over a stream: it reads the header a
//! byte at a time and then exactly one value, leaving the rest of the stream
//! unread.
//!
//! ```rust
//! use serde_llsd::{deserialize, llsd, serialize, Encoding, FormatOptions, ParseOptions};
//!
//! let value = llsd!({ "amy": 23 });
//! let mut stream = Vec::new();
//! serialize(&value, &mut stream, Encoding::Binary, &FormatOptions::new()).unwrap();
//! assert!(stream.starts_with(b"<? llsd/binary ?>\n"));
//!
//! let parsed = deserialize(&stream, &ParseOptions::new()).unwrap();
//! assert_eq!(parsed.value, value);
//! ```

use crate::binary::{BinaryFormatter, BinaryParser};
use crate::codec::{Formatter, Parsed, Parser};
use crate::notation::{NotationFormatter, NotationParser};
use crate::xml::{XmlFormatter, XmlParser};
use crate::{Error, FormatOptions, LlsdValue, ParseOptions, Result};
use std::fmt;
use std::io::{self, BufRead, Read, Write};
use tracing::debug;

/// Longest header [`deserialize`] will look through for the closing `?>`.
const MAX_HEADER_LEN: usize = 64;

/// The three wire encodings.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Encoding {
    Binary,
    Xml,
    Notation,
}

impl Encoding {
    /// The header [`serialize`] writes ahead of the body.
    #[must_use]
    pub const fn header(&self) -> &'static str {
        match self {
            Encoding::Binary => "<? llsd/binary ?>\n",
            Encoding::Xml => "<? llsd/xml ?>\n",
            Encoding::Notation => "<? llsd/notation ?>\n",
        }
    }

    /// Formats `value` in this encoding, without a header.
    ///
    /// # Errors
    ///
    /// Returns an error if the writer fails or the value cannot be represented.
    pub fn format_to<W: Write>(
        &self,
        value: &LlsdValue,
        writer: &mut W,
        options: &FormatOptions,
    ) -> Result<usize> {
        match self {
            Encoding::Binary => BinaryFormatter::new().format_to(value, writer),
            Encoding::Xml => XmlFormatter::new(options.clone()).format_to(value, writer),
            Encoding::Notation => NotationFormatter::new(options.clone()).format_to(value, writer),
        }
    }

    /// Parses `input` in this encoding, without expecting a header.
    ///
    /// # Errors
    ///
    /// See [`Parser::parse_slice`].
    pub fn parse_slice(&self, input: &[u8], options: &ParseOptions) -> Result<Parsed> {
        match self {
            Encoding::Binary => BinaryParser::new(*options).parse_slice(input),
            Encoding::Xml => XmlParser::new(*options).parse_slice(input),
            Encoding::Notation => NotationParser::new(*options).parse_slice(input),
        }
    }

    /// Parses one value from a stream in this encoding, without expecting a
    /// header.
    ///
    /// # Errors
    ///
    /// See [`Parser::parse_reader`].
    pub fn parse_reader<R: BufRead>(&self, reader: R, options: &ParseOptions) -> Result<Parsed> {
        match self {
            Encoding::Binary => BinaryParser::new(*options).parse_reader(reader),
            Encoding::Xml => XmlParser::new(*options).parse_reader(reader),
            Encoding::Notation => NotationParser::new(*options).parse_reader(reader),
        }
    }

    fn parse_bounded<R: BufRead>(
        &self,
        reader: R,
        limit: Option<usize>,
        options: &ParseOptions,
    ) -> Result<Parsed> {
        match self {
            Encoding::Binary => BinaryParser::new(*options).parse_bounded(reader, limit),
            Encoding::Xml => XmlParser::new(*options).parse_bounded(reader, limit),
            Encoding::Notation => NotationParser::new(*options).parse_bounded(reader, limit),
        }
    }

    fn from_header(content: &str) -> Option<Self> {
        match content {
            "llsd/binary" => Some(Encoding::Binary),
            "llsd/xml" => Some(Encoding::Xml),
            "llsd/notation" => Some(Encoding::Notation),
            _ => None,
        }
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Encoding::Binary => "binary",
            Encoding::Xml => "xml",
            Encoding::Notation => "notation",
        })
    }
}

/// Writes the header for `encoding` followed by `value` in that encoding.
///
/// Returns the total number of bytes written, header included.
///
/// # Errors
///
/// Returns an error if the writer fails or the value cannot be represented.
pub fn serialize<W: Write>(
    value: &LlsdValue,
    writer: &mut W,
    encoding: Encoding,
    options: &FormatOptions,
) -> Result<usize> {
    let header = encoding.header();
    writer.write_all(header.as_bytes())?;
    let body = encoding.format_to(value, writer, options)?;
    Ok(header.len() + body)
}

/// Detects the encoding of `input` and parses one value from it.
///
/// A header, when present, counts against the byte budget.
///
/// # Errors
///
/// Returns a structural error for a malformed or unknown `<? ... ?>` header,
/// and whatever the selected parser reports otherwise.
pub fn deserialize(input: &[u8], options: &ParseOptions) -> Result<Parsed> {
    let end = options
        .byte_budget
        .map_or(input.len(), |budget| budget.min(input.len()));
    deserialize_bounded(&input[..end], Some(end), options)
}

/// Detects the encoding of a stream and reads exactly one value from it.
///
/// Nothing past the value is consumed, so the same reader can be passed
/// again (as `&mut reader`) for the next value. A header, when present,
/// counts against the byte budget.
///
/// # Errors
///
/// See [`deserialize`]; reader failures surface as I/O errors.
pub fn deserialize_from<R: BufRead>(reader: R, options: &ParseOptions) -> Result<Parsed> {
    match options.byte_budget {
        Some(budget) => deserialize_bounded(reader.take(budget as u64), Some(budget), options),
        None => deserialize_bounded(reader, None, options),
    }
}

fn deserialize_bounded<R: BufRead>(
    mut reader: R,
    limit: Option<usize>,
    options: &ParseOptions,
) -> Result<Parsed> {
    let detected = detect(&mut reader, options.byte_budget)?;
    debug!(encoding = %detected.encoding, header_len = detected.header_len, "detected encoding");

    let header_len = detected.header_len;
    let options = ParseOptions {
        byte_budget: options.byte_budget.map(|budget| budget - header_len),
        ..*options
    };
    let body = detected.replay.as_slice().chain(reader);
    detected
        .encoding
        .parse_bounded(body, limit.map(|limit| limit - header_len), &options)
}

/// What [`detect`] found at the start of a stream.
#[derive(Debug, PartialEq)]
struct Detected {
    encoding: Encoding,
    /// Header bytes consumed, newline included.
    header_len: usize,
    /// Bytes read while sniffing that belong to the body.
    replay: Vec<u8>,
}

fn peek_byte<R: BufRead>(reader: &mut R) -> io::Result<Option<u8>> {
    loop {
        match reader.fill_buf() {
            Ok(buf) => return Ok(buf.first().copied()),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
}

fn read_byte<R: BufRead>(reader: &mut R) -> io::Result<Option<u8>> {
    let byte = peek_byte(reader)?;
    if byte.is_some() {
        reader.consume(1);
    }
    Ok(byte)
}

/// Reads just enough of `reader` to tell the encoding.
///
/// Leading whitespace is skipped. A `<? ... ?>` header is consumed along with
/// one line ending after it. Any other bytes looked at are handed back in
/// `replay`.
fn detect<R: BufRead>(reader: &mut R, budget: Option<usize>) -> Result<Detected> {
    let mut skipped = 0;
    while peek_byte(reader)?.is_some_and(|b| b.is_ascii_whitespace()) {
        reader.consume(1);
        skipped += 1;
    }
    let body = |encoding, replay| Detected {
        encoding,
        header_len: skipped,
        replay,
    };
    if peek_byte(reader)? != Some(b'<') {
        return Ok(body(Encoding::Notation, Vec::new()));
    }

    let mut sniffed = vec![b'<'];
    reader.consume(1);
    match read_byte(reader)? {
        Some(b'?') => sniffed.push(b'?'),
        Some(other) => {
            sniffed.push(other);
            return Ok(body(Encoding::Xml, sniffed));
        }
        None => return Ok(body(Encoding::Xml, sniffed)),
    }

    // The closing `?>` can only start after the opening `<?`.
    while sniffed.len() < 4 || !sniffed.ends_with(b"?>") {
        if sniffed.len() >= MAX_HEADER_LEN {
            return Err(Error::syntax(0, "unterminated '<?' header"));
        }
        match read_byte(reader)? {
            Some(byte) => sniffed.push(byte),
            None if budget == Some(skipped + sniffed.len()) => {
                return Err(Error::exceeds_budget(
                    skipped,
                    sniffed.len() + 1,
                    sniffed.len(),
                ))
            }
            None => return Err(Error::syntax(0, "unterminated '<?' header")),
        }
    }

    let content = String::from_utf8_lossy(&sniffed[2..sniffed.len() - 2])
        .trim()
        .to_ascii_lowercase();
    if content.starts_with("xml") {
        // An ordinary XML declaration belongs to the document.
        return Ok(body(Encoding::Xml, sniffed));
    }
    let encoding = Encoding::from_header(&content)
        .ok_or_else(|| Error::syntax(0, &format!("unknown header '<?{}?>'", content)))?;

    let mut header_len = skipped + sniffed.len();
    if peek_byte(reader)? == Some(b'\r') {
        reader.consume(1);
        header_len += 1;
    }
    if peek_byte(reader)? == Some(b'\n') {
        reader.consume(1);
        header_len += 1;
    }
    Ok(Detected {
        encoding,
        header_len,
        replay: Vec::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{llsd, ErrorKind};
    use std::io::BufReader;

    fn sniff(input: &[u8]) -> (Encoding, usize) {
        let detected = detect(&mut &input[..], None).unwrap();
        (detected.encoding, detected.header_len)
    }

    fn round_trip(encoding: Encoding) {
        let value = llsd!({ "amy": 23, "list": [true, "x", undef] });
        let mut stream = Vec::new();
        let written = serialize(&value, &mut stream, encoding, &FormatOptions::new()).unwrap();
        assert_eq!(written, stream.len());
        assert!(stream.starts_with(encoding.header().as_bytes()));
        let parsed = deserialize(&stream, &ParseOptions::new()).unwrap();
        assert_eq!(parsed.value, value);
        assert_eq!(parsed.nodes, value.node_count());
    }

    #[test]
    fn test_round_trip_each_encoding() {
        round_trip(Encoding::Binary);
        round_trip(Encoding::Xml);
        round_trip(Encoding::Notation);
    }

    #[test]
    fn test_headerless_sniffing() {
        assert_eq!(sniff(b"<llsd><undef /></llsd>"), (Encoding::Xml, 0));
        assert_eq!(sniff(b"[i1]"), (Encoding::Notation, 0));
        assert_eq!(sniff(b""), (Encoding::Notation, 0));
        assert_eq!(sniff(b"\n  <? llsd/xml ?>\n<llsd/>"), (Encoding::Xml, 18));
        assert_eq!(
            sniff(b"<?xml version=\"1.0\"?><llsd/>"),
            (Encoding::Xml, 0)
        );
        let parsed = deserialize(b"<?xml version=\"1.0\"?><llsd><integer>3</integer></llsd>", &ParseOptions::new()).unwrap();
        assert_eq!(parsed.value, LlsdValue::Integer(3));
    }

    #[test]
    fn test_header_tolerance() {
        assert_eq!(sniff(b"<?LLSD/Binary?>!"), (Encoding::Binary, 15));
        assert_eq!(
            sniff(b"<?  llsd/notation  ?>\r\n!"),
            (Encoding::Notation, 23)
        );
        let parsed = deserialize(b"<? llsd/notation ?>\ni5", &ParseOptions::new()).unwrap();
        assert_eq!(parsed.value, LlsdValue::Integer(5));
    }

    #[test]
    fn test_unknown_header_fails() {
        let err = deserialize(b"<? llsd/json ?>\n{}", &ParseOptions::new()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Structural);
        assert!(deserialize(b"<? llsd/binary", &ParseOptions::new()).is_err());
    }

    #[test]
    fn test_short_headers_fail_cleanly() {
        for input in [&b"<?"[..], b"<?>", b"<?x", b"<??", b"<??>", b"<?>?"] {
            let err = deserialize(input, &ParseOptions::new()).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Structural, "{:?}", input);
        }
        let long = [&b"<?"[..], &[b' '; 100][..]].concat();
        assert!(deserialize(&long, &ParseOptions::new()).is_err());
    }

    #[test]
    fn test_header_counts_against_budget() {
        let stream = b"<? llsd/notation ?>\ni5";
        let tight = ParseOptions::new().with_byte_budget(stream.len());
        assert!(deserialize(stream, &tight).is_ok());
        let short = ParseOptions::new().with_byte_budget(stream.len() - 2);
        assert!(deserialize(stream, &short).is_err());
        let tiny = ParseOptions::new().with_byte_budget(4);
        assert_eq!(
            deserialize(stream, &tiny).unwrap_err().kind(),
            ErrorKind::BudgetExceeded
        );
    }

    #[test]
    fn test_deserialize_from_reads_one_value_per_call() {
        let encodings = [
            (0_i32, Encoding::Binary),
            (1, Encoding::Xml),
            (2, Encoding::Notation),
        ];
        let mut stream = Vec::new();
        for (i, encoding) in encodings {
            serialize(&llsd!([i]), &mut stream, encoding, &FormatOptions::new()).unwrap();
        }
        let mut reader = BufReader::new(&stream[..]);
        for (i, _) in encodings {
            let parsed = deserialize_from(&mut reader, &ParseOptions::new()).unwrap();
            assert_eq!(parsed.value, llsd!([i]));
        }
        assert!(reader.fill_buf().unwrap().is_empty());
    }

    #[test]
    fn test_deserialize_from_sniffed_xml_keeps_first_bytes() {
        let doc = b"<llsd><string>kept</string></llsd>";
        let parsed = deserialize_from(&doc[..], &ParseOptions::new()).unwrap();
        assert_eq!(parsed.value, LlsdValue::from("kept"));
        assert_eq!(parsed.nodes, 1);
    }
}
