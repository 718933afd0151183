//! Configuration for LLSD formatting and parsing.
//!
//! - [`FormatOptions`]: layout, boolean style, real format and binary style for formatters
//! - [`ParseOptions`]: byte budget and depth limit for parsers
//!
//! ## Examples
//!
//! ```rust
//! use serde_llsd::{to_notation_with_options, BooleanStyle, FormatOptions, LlsdValue};
//!
//! let options = FormatOptions::new().with_boolean_style(BooleanStyle::Alphabetic);
//! let text = to_notation_with_options(&LlsdValue::from(true), &options).unwrap();
//! assert_eq!(text, b"true");
//!
//! let text = to_notation_with_options(&LlsdValue::from(true), &FormatOptions::new()).unwrap();
//! assert_eq!(text, b"1");
//! ```

use crate::RealFormat;

/// How booleans are written by the text formatters.
///
/// # Examples
///
/// ```rust
/// use serde_llsd::BooleanStyle;
///
/// assert_eq!(BooleanStyle::Numeric.render(true), "1");
/// assert_eq!(BooleanStyle::Alphabetic.render(false), "false");
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum BooleanStyle {
    /// `true` / `false`
    Alphabetic,
    /// `1` / `0`
    #[default]
    Numeric,
}

impl BooleanStyle {
    #[must_use]
    pub const fn render(&self, value: bool) -> &'static str {
        match (self, value) {
            (BooleanStyle::Alphabetic, true) => "true",
            (BooleanStyle::Alphabetic, false) => "false",
            (BooleanStyle::Numeric, true) => "1",
            (BooleanStyle::Numeric, false) => "0",
        }
    }
}

/// How the notation formatter writes binary values.
///
/// Only `Base64` and `Raw` are meant for machines; `Hex` is a display form.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum BinaryStyle {
    /// `b64"aGVsbG8="`
    #[default]
    Base64,
    /// `b16"68656C6C6F"`, the pretty display form
    Hex,
    /// `b(5)"hello"`, raw bytes with an explicit length
    Raw,
}

/// Options shared by the three formatters.
///
/// Each formatter reads the fields that mean something for its encoding: the
/// binary formatter ignores all of them.
///
/// # Examples
///
/// ```rust
/// use serde_llsd::{BinaryStyle, FormatOptions};
///
/// let options = FormatOptions::pretty()
///     .with_indent(4)
///     .with_real_format("%.2f")
///     .unwrap()
///     .with_binary_style(BinaryStyle::Hex);
/// assert!(options.pretty);
/// assert_eq!(options.indent, 4);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct FormatOptions {
    pub pretty: bool,
    pub indent: usize,
    pub boolean_style: BooleanStyle,
    pub real_format: Option<RealFormat>,
    pub binary_style: BinaryStyle,
}

impl Default for FormatOptions {
    fn default() -> Self {
        FormatOptions {
            pretty: false,
            indent: 2,
            boolean_style: BooleanStyle::default(),
            real_format: None,
            binary_style: BinaryStyle::default(),
        }
    }
}

impl FormatOptions {
    /// Creates default options: compact, numeric booleans, shortest round-trip
    /// reals and base64 binaries.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates options for indented, multi-line output.
    #[must_use]
    pub fn pretty() -> Self {
        FormatOptions {
            pretty: true,
            ..Default::default()
        }
    }

    /// Sets the indentation size (number of spaces per level).
    ///
    /// Only affects pretty-printed output.
    #[must_use]
    pub fn with_indent(mut self, indent: usize) -> Self {
        self.indent = indent;
        self
    }

    #[must_use]
    pub fn with_boolean_style(mut self, style: BooleanStyle) -> Self {
        self.boolean_style = style;
        self
    }

    /// Applies a printf-style format such as `%.2f` to every real written.
    ///
    /// # Errors
    ///
    /// Returns an error if `spec` is not a supported real conversion.
    pub fn with_real_format(mut self, spec: &str) -> crate::Result<Self> {
        self.real_format = Some(RealFormat::parse(spec)?);
        Ok(self)
    }

    #[must_use]
    pub fn with_binary_style(mut self, style: BinaryStyle) -> Self {
        self.binary_style = style;
        self
    }

    /// Renders a real with the configured format, or the shortest form that
    /// parses back to the same value.
    pub(crate) fn render_real(&self, value: f64) -> String {
        match &self.real_format {
            Some(format) => format.format(value),
            None => shortest_real(value),
        }
    }
}

fn shortest_real(value: f64) -> String {
    if value.is_nan() {
        "nan".to_string()
    } else if value.is_infinite() {
        if value > 0.0 { "inf" } else { "-inf" }.to_string()
    } else {
        format!("{}", value)
    }
}

/// Limits applied to one parse call.
///
/// # Examples
///
/// ```rust
/// use serde_llsd::{notation::NotationParser, Parser, ParseOptions};
///
/// let options = ParseOptions::new().with_depth_limit(1);
/// let parser = NotationParser::new(options);
/// assert!(parser.parse_slice(b"i5").is_ok());
/// assert!(parser.parse_slice(b"[i5]").is_err());
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct ParseOptions {
    /// Maximum number of input bytes to consume; `None` is unlimited.
    pub byte_budget: Option<usize>,
    /// Maximum nesting depth; `None` leaves only
    /// [`MAX_DEPTH`](crate::depth::MAX_DEPTH), which also caps any larger limit.
    pub depth_limit: Option<usize>,
}

impl ParseOptions {
    /// Creates options with no byte budget and no depth limit beyond
    /// [`MAX_DEPTH`](crate::depth::MAX_DEPTH).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Same as [`ParseOptions::new`], spelled out at call sites that mean it.
    #[must_use]
    pub fn unlimited() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_byte_budget(mut self, budget: usize) -> Self {
        self.byte_budget = Some(budget);
        self
    }

    #[must_use]
    pub fn with_depth_limit(mut self, limit: usize) -> Self {
        self.depth_limit = Some(limit);
        self
    }
}
