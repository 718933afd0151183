//! Error types for LLSD formatting and parsing.
//!
//! Every parser reports failure for the whole top-level call: there is no
//! partial value on error. Callers that need a value regardless can fall back
//! to [`LlsdValue::Undefined`](crate::LlsdValue::Undefined).
//!
//! ## Error Categories
//!
//! - **Structural**: malformed syntax, unterminated strings or containers, unknown leading tokens
//! - **Length mismatch**: a declared length or element count disagrees with the payload
//! - **Budget exceeded**: the byte budget or depth limit ran out mid-parse
//! - **I/O**: the underlying reader or writer failed
//!
//! ## Examples
//!
//! ```rust
//! use serde_llsd::{from_notation, ErrorKind};
//!
//! let err = from_notation(b"s(7)\"whatever\"").unwrap_err();
//! assert_eq!(err.kind(), ErrorKind::LengthMismatch);
//! ```

use std::fmt;
use thiserror::Error;

/// Represents all possible errors that can occur while formatting or parsing LLSD.
///
/// Parse errors carry the byte offset into the input at which the problem was found.
#[derive(Debug, Clone, Error)]
pub enum Error {
    /// IO error during reading or writing
    #[error("IO error: {0}")]
    Io(String),

    /// Malformed syntax
    #[error("Syntax error at byte {offset}: {msg}")]
    Syntax { offset: usize, msg: String },

    /// Input ended before a value was complete
    #[error("Unexpected end of input at byte {offset}, expected {expected}")]
    UnexpectedEof { offset: usize, expected: String },

    /// A declared length or element count disagrees with what followed it
    #[error("Length mismatch at byte {offset}: declared {declared}, found {actual}")]
    LengthMismatch {
        offset: usize,
        declared: usize,
        actual: usize,
    },

    /// A read would go past the byte budget
    #[error("Read of {need} bytes at byte {offset} exceeds the {remaining} bytes left in the budget")]
    ExceedsBudget {
        offset: usize,
        need: usize,
        remaining: usize,
    },

    /// Nesting went deeper than the configured depth limit
    #[error("Depth limit of {limit} exceeded")]
    DepthLimitExceeded { limit: usize },

    /// An XML document that contains no LLSD at all
    #[error("Not an LLSD document: {0}")]
    NotLlsd(String),

    /// Value cannot be represented
    #[error("Unsupported type: {0}")]
    UnsupportedType(String),

    /// Custom error
    #[error("Error: {0}")]
    Custom(String),
}

/// Coarse classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed syntax, unterminated input, or no recognizable LLSD.
    Structural,
    /// Declared length or count disagrees with the payload.
    LengthMismatch,
    /// Byte budget or depth limit exhausted.
    BudgetExceeded,
    /// Underlying reader or writer failed.
    Io,
    /// A Rust value could not be converted to or from LLSD.
    Conversion,
}

impl Error {
    /// Creates a syntax error at the given byte offset.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use serde_llsd::Error;
    ///
    /// let err = Error::syntax(10, "unexpected token");
    /// assert!(err.to_string().contains("byte 10"));
    /// ```
    pub fn syntax(offset: usize, msg: &str) -> Self {
        Error::Syntax {
            offset,
            msg: msg.to_string(),
        }
    }

    /// Creates an unexpected end-of-input error.
    pub fn unexpected_eof(offset: usize, expected: &str) -> Self {
        Error::UnexpectedEof {
            offset,
            expected: expected.to_string(),
        }
    }

    /// Creates a length mismatch error.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use serde_llsd::{Error, ErrorKind};
    ///
    /// let err = Error::length_mismatch(1, 2, 1);
    /// assert_eq!(err.kind(), ErrorKind::LengthMismatch);
    /// ```
    pub fn length_mismatch(offset: usize, declared: usize, actual: usize) -> Self {
        Error::LengthMismatch {
            offset,
            declared,
            actual,
        }
    }

    /// Creates an error for a read that would pass the end of the byte budget.
    pub fn exceeds_budget(offset: usize, need: usize, remaining: usize) -> Self {
        Error::ExceedsBudget {
            offset,
            need,
            remaining,
        }
    }

    /// Creates a depth limit error.
    pub fn depth_limit_exceeded(limit: usize) -> Self {
        Error::DepthLimitExceeded { limit }
    }

    /// Creates an error for an XML document without any LLSD in it.
    pub fn not_llsd(msg: &str) -> Self {
        Error::NotLlsd(msg.to_string())
    }

    /// Creates an unsupported type error.
    pub fn unsupported_type(msg: &str) -> Self {
        Error::UnsupportedType(msg.to_string())
    }

    /// Creates a custom error with a display message.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use serde_llsd::Error;
    ///
    /// let err = Error::custom("something went wrong");
    /// assert!(err.to_string().contains("something went wrong"));
    /// ```
    pub fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Custom(msg.to_string())
    }

    /// Creates an I/O error.
    pub fn io(msg: &str) -> Self {
        Error::Io(msg.to_string())
    }

    /// Returns the category this error belongs to.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Io(_) => ErrorKind::Io,
            Error::Syntax { .. } | Error::UnexpectedEof { .. } | Error::NotLlsd(_) => {
                ErrorKind::Structural
            }
            Error::LengthMismatch { .. } => ErrorKind::LengthMismatch,
            Error::ExceedsBudget { .. } | Error::DepthLimitExceeded { .. } => {
                ErrorKind::BudgetExceeded
            }
            Error::UnsupportedType(_) | Error::Custom(_) => ErrorKind::Conversion,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::io(&err.to_string())
    }
}

impl serde::ser::Error for Error {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Custom(msg.to_string())
    }
}

impl serde::de::Error for Error {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Custom(msg.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
