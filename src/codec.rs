//! The formatter and parser seams.
//!
//! Each encoding provides one [`Formatter`] and one [`Parser`]; there are
//! exactly three of each and the set is closed (see [`Encoding`](crate::Encoding)).
//! The bare implementations never read or write a self-identifying header:
//! that is the job of [`serialize`](crate::serialize) and
//! [`deserialize`](crate::deserialize).

use crate::{LlsdValue, ParseOptions, Result};
use std::io::{BufRead, Read, Write};

/// A successful parse: the value and how many LLSD nodes were consumed.
///
/// Every scalar and every container counts as one node. An XML element that
/// was not recognized but still occupied a value position counts too.
#[derive(Clone, Debug, PartialEq)]
pub struct Parsed {
    pub value: LlsdValue,
    pub nodes: usize,
}

impl Parsed {
    pub(crate) fn new(value: LlsdValue, nodes: usize) -> Self {
        Parsed { value, nodes }
    }

    /// Discards the node count.
    #[must_use]
    pub fn into_value(self) -> LlsdValue {
        self.value
    }
}

/// Writes one value in one encoding.
pub trait Formatter {
    /// Appends the encoded form of `value` to `out`.
    ///
    /// # Errors
    ///
    /// Returns an error only when the value cannot be represented, such as a
    /// payload longer than the encoding's length field allows.
    fn format_into(&self, value: &LlsdValue, out: &mut Vec<u8>) -> Result<()>;

    /// Writes the encoded form of `value` and returns the number of bytes written.
    ///
    /// # Errors
    ///
    /// Returns an error if the writer fails.
    fn format_to<W: Write>(&self, value: &LlsdValue, writer: &mut W) -> Result<usize> {
        let mut buffer = Vec::with_capacity(128);
        self.format_into(value, &mut buffer)?;
        writer.write_all(&buffer)?;
        Ok(buffer.len())
    }

    /// Returns the encoded form of `value` as bytes.
    ///
    /// # Errors
    ///
    /// See [`Formatter::format_into`].
    fn format(&self, value: &LlsdValue) -> Result<Vec<u8>> {
        let mut buffer = Vec::with_capacity(128);
        self.format_into(value, &mut buffer)?;
        Ok(buffer)
    }
}

/// Reads exactly one top-level value in one encoding.
///
/// Parsers pull bytes only as the value needs them and stop as soon as it is
/// complete, so whatever follows it stays in the reader.
pub trait Parser {
    /// The limits this parser enforces.
    fn options(&self) -> &ParseOptions;

    /// Parses one value from a reader that is already cut to the byte budget.
    ///
    /// `limit` is how many bytes `reader` can yield at most, when known. A
    /// declared length or count that cannot fit in it fails as over budget
    /// before any of the payload is read.
    ///
    /// # Errors
    ///
    /// Any malformed token, length mismatch, exhausted budget or reader
    /// failure fails the whole call; there is no partial result.
    fn parse_bounded<R: BufRead>(&self, reader: R, limit: Option<usize>) -> Result<Parsed>;

    /// Parses one value from the start of `input`.
    ///
    /// Only the first `byte_budget` bytes are ever looked at. Bytes after the
    /// value are left alone.
    ///
    /// # Errors
    ///
    /// See [`Parser::parse_bounded`].
    fn parse_slice(&self, input: &[u8]) -> Result<Parsed> {
        let end = self
            .options()
            .byte_budget
            .map_or(input.len(), |budget| budget.min(input.len()));
        self.parse_bounded(&input[..end], Some(end))
    }

    /// Parses one value from a stream, reading no more than the byte budget
    /// and nothing past the end of the value.
    ///
    /// Pass `&mut reader` to keep reading the stream afterwards.
    ///
    /// # Errors
    ///
    /// See [`Parser::parse_bounded`].
    fn parse_reader<R: BufRead>(&self, reader: R) -> Result<Parsed> {
        match self.options().byte_budget {
            Some(budget) => self.parse_bounded(reader.take(budget as u64), Some(budget)),
            None => self.parse_bounded(reader, None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notation::{NotationFormatter, NotationParser};
    use crate::FormatOptions;
    use std::io::BufReader;

    #[test]
    fn test_format_to_reports_bytes_written() {
        let formatter = NotationFormatter::new(FormatOptions::new());
        let mut out = Vec::new();
        let written = formatter
            .format_to(&LlsdValue::from(23), &mut out)
            .unwrap();
        assert_eq!(written, 3);
        assert_eq!(out, b"i23");
    }

    #[test]
    fn test_parse_reader_honours_budget() {
        let parser = NotationParser::new(ParseOptions::new().with_byte_budget(3));
        let parsed = parser.parse_reader(&b"i23456"[..]).unwrap();
        assert_eq!(parsed.value, LlsdValue::Integer(23));
        assert_eq!(parsed.nodes, 1);
    }

    /// Never reaches EOF: every read past the data times out.
    struct Idle;

    impl Read for Idle {
        fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
            Err(std::io::Error::new(std::io::ErrorKind::TimedOut, "peer idle"))
        }
    }

    #[test]
    fn test_parse_reader_finishes_on_idle_stream() {
        let parser = NotationParser::new(ParseOptions::new());
        let stream = BufReader::new((&b"i5"[..]).chain(Idle));
        assert_eq!(parser.parse_reader(stream).unwrap().value, LlsdValue::Integer(5));

        let stream = BufReader::new((&b"[i5"[..]).chain(Idle));
        assert_eq!(
            parser.parse_reader(stream).unwrap_err().kind(),
            crate::ErrorKind::Io
        );
    }

    #[test]
    fn test_parse_reader_consumes_one_value() {
        let parser = NotationParser::new(ParseOptions::new());
        let mut stream = &b"{'a':i1}[i2] 'three'"[..];
        assert_eq!(parser.parse_reader(&mut stream).unwrap().nodes, 2);
        assert_eq!(stream, b"[i2] 'three'");
        assert_eq!(parser.parse_reader(&mut stream).unwrap().nodes, 2);
        assert_eq!(
            parser.parse_reader(&mut stream).unwrap().value,
            LlsdValue::from("three")
        );
        assert!(stream.is_empty());
    }
}
