//! Bounded byte cursor used by the notation and binary parsers.
//!
//! The cursor pulls from a [`BufRead`] one buffer at a time and never asks
//! for a byte the parse does not need, so a stream is left positioned just
//! after the value. The reader handed in is already cut to the byte budget
//! (a slice prefix or an [`io::Take`]); running out of bytes *is* running out
//! of budget. When the cutoff is known up front, `limit` carries it and
//! declared lengths are checked against it before any payload is read.

use crate::{Error, Result};
use std::io::{self, BufRead};

/// Payloads are grown in steps of at most this many bytes when the reader's
/// length is not known in advance.
const MAX_PREALLOC: usize = 64 * 1024;

/// Cursor over a budget-truncated reader.
pub(crate) struct Input<R> {
    reader: R,
    pos: usize,
    limit: Option<usize>,
    /// A reader error hit while only looking ahead.
    stalled: Option<io::Error>,
}

impl<R: BufRead> Input<R> {
    /// Creates a cursor over `reader`, which yields at most `limit` bytes when
    /// that is known.
    pub(crate) fn new(reader: R, limit: Option<usize>) -> Self {
        Input {
            reader,
            pos: 0,
            limit,
            stalled: None,
        }
    }

    /// Current byte offset.
    pub(crate) fn pos(&self) -> usize {
        self.pos
    }

    /// Bytes left before the limit, when the limit is known.
    pub(crate) fn remaining(&self) -> Option<usize> {
        self.limit.map(|limit| limit.saturating_sub(self.pos))
    }

    /// Looks at the next byte without consuming it.
    ///
    /// A reader error only ends the lookahead: a value that is already
    /// complete still parses, and the error surfaces from the next read that
    /// actually needs a byte.
    pub(crate) fn peek(&mut self) -> Option<u8> {
        if self.stalled.is_some() {
            return None;
        }
        loop {
            match self.reader.fill_buf() {
                Ok(buf) => return buf.first().copied(),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    self.stalled = Some(e);
                    return None;
                }
            }
        }
    }

    /// The error for a read that found no byte where one was required.
    fn missing(&mut self, expected: &str) -> Error {
        match self.stalled.take() {
            Some(err) => Error::from(err),
            None => Error::unexpected_eof(self.pos, expected),
        }
    }

    /// Consumes one byte, failing at the end of the budget.
    pub(crate) fn next(&mut self, expected: &str) -> Result<u8> {
        match self.peek() {
            Some(byte) => {
                self.reader.consume(1);
                self.pos += 1;
                Ok(byte)
            }
            None => Err(self.missing(expected)),
        }
    }

    /// Consumes `byte` or fails with a syntax error naming it.
    pub(crate) fn expect(&mut self, byte: u8) -> Result<()> {
        let expected = format!("'{}'", char::from(byte));
        let offset = self.pos;
        let found = self.next(&expected)?;
        if found == byte {
            Ok(())
        } else {
            Err(Error::syntax(
                offset,
                &format!("expected {}, found '{}'", expected, char::from(found)),
            ))
        }
    }

    /// Appends exactly `n` bytes to `out`.
    fn fill(&mut self, n: usize, out: &mut Vec<u8>, expected: &str) -> Result<()> {
        if let Some(err) = self.stalled.take() {
            return Err(err.into());
        }
        let target = out.len() + n;
        while out.len() < target {
            let buf = match self.reader.fill_buf() {
                Ok(buf) => buf,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            };
            if buf.is_empty() {
                return Err(Error::unexpected_eof(self.pos, expected));
            }
            let take = buf.len().min(target - out.len());
            out.extend_from_slice(&buf[..take]);
            self.reader.consume(take);
            self.pos += take;
        }
        Ok(())
    }

    /// Reads a fixed-width field.
    pub(crate) fn read_exact(&mut self, n: usize, expected: &str) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(n);
        self.fill(n, &mut out, expected)?;
        Ok(out)
    }

    fn read_array<const N: usize>(&mut self, expected: &str) -> Result<[u8; N]> {
        let mut buf = [0_u8; N];
        buf.copy_from_slice(&self.read_exact(N, expected)?);
        Ok(buf)
    }

    /// Reads a payload whose length came from the input itself.
    ///
    /// A claim larger than the known remainder fails immediately, before
    /// anything is allocated for it. Without a known remainder the payload is
    /// read in bounded steps, so a false claim costs no more memory than the
    /// bytes that actually arrive.
    pub(crate) fn read_declared(&mut self, n: usize) -> Result<Vec<u8>> {
        if let Some(remaining) = self.remaining() {
            if n > remaining {
                return Err(Error::exceeds_budget(self.pos, n, remaining));
            }
        }
        let mut out = Vec::with_capacity(n.min(MAX_PREALLOC));
        let mut left = n;
        while left > 0 {
            let step = left.min(MAX_PREALLOC);
            self.fill(step, &mut out, "declared payload")?;
            left -= step;
        }
        Ok(out)
    }

    /// Consumes bytes while `pred` holds and returns them.
    pub(crate) fn take_while(&mut self, pred: impl Fn(u8) -> bool) -> Vec<u8> {
        let mut out = Vec::new();
        while let Some(byte) = self.peek().filter(|&b| pred(b)) {
            out.push(byte);
            self.reader.consume(1);
            self.pos += 1;
        }
        out
    }

    pub(crate) fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(|b| b.is_ascii_whitespace()) {
            self.reader.consume(1);
            self.pos += 1;
        }
    }

    pub(crate) fn read_u32_be(&mut self) -> Result<u32> {
        self.read_array("4-byte length").map(u32::from_be_bytes)
    }

    pub(crate) fn read_i32_be(&mut self) -> Result<i32> {
        self.read_array("4-byte integer").map(i32::from_be_bytes)
    }

    pub(crate) fn read_f64_be(&mut self, expected: &str) -> Result<f64> {
        self.read_array(expected).map(f64::from_be_bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{BufReader, Read};

    /// Yields its bytes, then times out forever instead of reaching EOF.
    struct Idle;

    impl Read for Idle {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::TimedOut, "peer idle"))
        }
    }

    #[test]
    fn test_budget_truncates_input() {
        let bytes = b"abcdef";
        let mut input = Input::new(&bytes[..3], Some(3));
        assert_eq!(input.remaining(), Some(3));
        assert_eq!(input.read_exact(3, "bytes").unwrap(), b"abc");
        assert!(input.next("more").is_err());
    }

    #[test]
    fn test_oversized_claim_fails_before_reading() {
        let bytes = b"\x00\x01\x86\xa0abc";
        let mut input = Input::new(&bytes[..], Some(bytes.len()));
        let claim = input.read_u32_be().unwrap() as usize;
        assert_eq!(claim, 100_000);
        match input.read_declared(claim) {
            Err(Error::ExceedsBudget {
                offset,
                need,
                remaining,
            }) => {
                assert_eq!((offset, need, remaining), (4, 100_000, 3));
            }
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(input.pos(), 4);
    }

    #[test]
    fn test_unknown_length_claim_reads_what_arrives() {
        let mut input = Input::new(&b"abc"[..], None);
        assert_eq!(input.remaining(), None);
        let err = input.read_declared(1_000_000_000).unwrap_err();
        assert!(matches!(err, Error::UnexpectedEof { offset: 3, .. }));
    }

    #[test]
    fn test_expect_reports_offset() {
        let mut input = Input::new(&b"  x"[..], None);
        input.skip_whitespace();
        assert_eq!(input.pos(), 2);
        let err = input.expect(b'}').unwrap_err();
        assert!(err.to_string().contains("byte 2"));
    }

    #[test]
    fn test_big_endian_numbers() {
        let mut bytes = 23_i32.to_be_bytes().to_vec();
        bytes.extend_from_slice(&1.5_f64.to_be_bytes());
        let mut input = Input::new(&bytes[..], None);
        assert_eq!(input.read_i32_be().unwrap(), 23);
        assert_eq!(input.read_f64_be("8-byte real").unwrap(), 1.5);
        assert_eq!(input.peek(), None);
    }

    #[test]
    fn test_idle_reader_ends_lookahead_only() {
        let mut input = Input::new(BufReader::new((&b"42"[..]).chain(Idle)), None);
        assert_eq!(input.take_while(|b| b.is_ascii_digit()), b"42");
        let err = input.next("a byte").unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_stream_left_after_consumed_bytes() {
        let mut stream = &b"ab cd"[..];
        let mut input = Input::new(&mut stream, None);
        assert_eq!(input.take_while(|b| b != b' '), b"ab");
        assert_eq!(stream, b" cd");
    }
}
