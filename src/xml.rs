//! The XML encoding.
//!
//! ```xml
//! <llsd><map><key>amy</key><integer>23</integer><key>bob</key><undef /></map></llsd>
//! ```
//!
//! The parser is event driven on [`quick_xml`] and tolerant: inside `<llsd>`,
//! an element it does not understand becomes undefined at that position (and
//! still counts as a node), and a stray element where a map expects `<key>` is
//! skipped. A document with no `<llsd>` root at all fails.
//!
//! ## Examples
//!
//! ```rust
//! use serde_llsd::xml::XmlParser;
//! use serde_llsd::{llsd, ParseOptions, Parser};
//!
//! let doc = b"<llsd><map>\
//!     <key>amy</key><integer>23</integer>\
//!     <html><body>junk</body></html>\
//!     <key>cam</key><real>1.23</real>\
//!     </map></llsd>";
//! let parsed = XmlParser::new(ParseOptions::new()).parse_slice(doc).unwrap();
//! assert_eq!(parsed.value, llsd!({ "amy": 23, "cam": 1.23 }));
//! assert_eq!(parsed.nodes, 3);
//! ```

use crate::codec::{Formatter, Parsed, Parser};
use crate::depth::DepthBudget;
use crate::options::{FormatOptions, ParseOptions};
use crate::{Error, LlsdDate, LlsdMap, LlsdValue, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use quick_xml::escape::escape;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::io::BufRead;
use tracing::{debug, trace};
use uuid::Uuid;

/// Whether `c` may appear in an XML document.
///
/// Excludes C0 controls other than tab and line feed, the `U+FDD0..=U+FDEF`
/// noncharacters, and the two noncharacters ending every plane (`U+xxFFFE`,
/// `U+xxFFFF`). Strings made only of allowed characters round-trip through
/// the XML encoding.
///
/// ```rust
/// use serde_llsd::xml::is_xml_char;
///
/// assert!(is_xml_char('\t'));
/// assert!(!is_xml_char('\u{1}'));
/// assert!(!is_xml_char('\u{1FFFF}'));
/// ```
#[must_use]
pub fn is_xml_char(c: char) -> bool {
    match u32::from(c) {
        0x09 | 0x0A => true,
        0x00..=0x1F => false,
        0xFDD0..=0xFDEF => false,
        cp => cp & 0xFFFE != 0xFFFE,
    }
}

/// Writes values in the XML encoding.
#[derive(Clone, Debug, Default)]
pub struct XmlFormatter {
    options: FormatOptions,
}

impl XmlFormatter {
    #[must_use]
    pub fn new(options: FormatOptions) -> Self {
        XmlFormatter { options }
    }

    fn write_value(&self, value: &LlsdValue, out: &mut String, level: usize) {
        self.indent(out, level);
        match value {
            LlsdValue::Undefined => out.push_str("<undef />"),
            LlsdValue::Boolean(b) => {
                write_element(out, "boolean", self.options.boolean_style.render(*b))
            }
            LlsdValue::Integer(i) => write_element(out, "integer", &i.to_string()),
            LlsdValue::Real(r) => write_element(out, "real", &self.options.render_real(*r)),
            LlsdValue::String(s) => write_element(out, "string", &escape(s.as_str())),
            LlsdValue::Uuid(u) if u.is_nil() => out.push_str("<uuid />"),
            LlsdValue::Uuid(u) => write_element(out, "uuid", &u.hyphenated().to_string()),
            LlsdValue::Date(d) => write_element(out, "date", &d.to_string()),
            LlsdValue::Uri(u) => write_element(out, "uri", &escape(u.as_str())),
            LlsdValue::Binary(bytes) if bytes.is_empty() => {
                out.push_str("<binary encoding=\"base64\" />")
            }
            LlsdValue::Binary(bytes) => {
                out.push_str("<binary encoding=\"base64\">");
                out.push_str(&STANDARD.encode(bytes));
                out.push_str("</binary>");
            }
            LlsdValue::Array(items) if items.is_empty() => out.push_str("<array />"),
            LlsdValue::Array(items) => {
                out.push_str("<array>");
                self.newline(out);
                for item in items {
                    self.write_value(item, out, level + 1);
                }
                self.indent(out, level);
                out.push_str("</array>");
            }
            LlsdValue::Map(map) if map.is_empty() => out.push_str("<map />"),
            LlsdValue::Map(map) => {
                out.push_str("<map>");
                self.newline(out);
                for (key, item) in map.iter() {
                    self.indent(out, level + 1);
                    out.push_str("<key>");
                    out.push_str(&escape(key.as_str()));
                    out.push_str("</key>");
                    self.newline(out);
                    self.write_value(item, out, level + 1);
                }
                self.indent(out, level);
                out.push_str("</map>");
            }
        }
        self.newline(out);
    }

    fn indent(&self, out: &mut String, level: usize) {
        if self.options.pretty {
            out.extend(std::iter::repeat(' ').take(level * self.options.indent));
        }
    }

    fn newline(&self, out: &mut String) {
        if self.options.pretty {
            out.push('\n');
        }
    }
}

/// `<tag>text</tag>`, or `<tag />` when the text is empty.
fn write_element(out: &mut String, tag: &str, text: &str) {
    out.push('<');
    out.push_str(tag);
    if text.is_empty() {
        out.push_str(" />");
        return;
    }
    out.push('>');
    out.push_str(text);
    out.push_str("</");
    out.push_str(tag);
    out.push('>');
}

impl Formatter for XmlFormatter {
    fn format_into(&self, value: &LlsdValue, out: &mut Vec<u8>) -> Result<()> {
        let mut doc = String::with_capacity(64);
        if self.options.pretty {
            doc.push_str("<?xml version=\"1.0\" ?>\n<llsd>\n");
            self.write_value(value, &mut doc, 1);
        } else {
            doc.push_str("<llsd>");
            self.write_value(value, &mut doc, 0);
        }
        doc.push_str("</llsd>\n");
        out.extend_from_slice(doc.as_bytes());
        Ok(())
    }
}

/// Reads one `<llsd>` document.
#[derive(Clone, Debug, Default)]
pub struct XmlParser {
    options: ParseOptions,
}

impl XmlParser {
    #[must_use]
    pub fn new(options: ParseOptions) -> Self {
        XmlParser { options }
    }
}

impl Parser for XmlParser {
    fn options(&self) -> &ParseOptions {
        &self.options
    }

    fn parse_bounded<R: BufRead>(&self, reader: R, _limit: Option<usize>) -> Result<Parsed> {
        let mut reader = XmlReader {
            reader: Reader::from_reader(reader),
            buf: Vec::new(),
            nodes: 0,
        };
        match reader.parse_document(DepthBudget::new(self.options.depth_limit)) {
            Ok(value) => Ok(Parsed::new(value, reader.nodes)),
            Err(err) => {
                debug!(encoding = "xml", offset = reader.offset(), error = %err, "parse failed");
                Err(err)
            }
        }
    }
}

struct XmlReader<R> {
    reader: Reader<R>,
    buf: Vec<u8>,
    nodes: usize,
}

/// Reader failures are I/O errors; everything else quick-xml reports is
/// malformed markup.
fn xml_error(offset: usize, err: quick_xml::Error) -> Error {
    match err {
        quick_xml::Error::Io(io) => Error::io(&io.to_string()),
        other => Error::syntax(offset, &other.to_string()),
    }
}

impl<R: BufRead> XmlReader<R> {
    fn offset(&self) -> usize {
        self.reader.buffer_position() as usize
    }

    fn next_event(&mut self) -> Result<Event<'static>> {
        let offset = self.offset();
        self.buf.clear();
        match self.reader.read_event_into(&mut self.buf) {
            Ok(event) => Ok(event.into_owned()),
            Err(err) => Err(xml_error(offset, err)),
        }
    }

    fn skip_element(&mut self, start: &BytesStart<'_>) -> Result<()> {
        let offset = self.offset();
        self.buf.clear();
        self.reader
            .read_to_end_into(start.name(), &mut self.buf)
            .map(|_| ())
            .map_err(|err| xml_error(offset, err))
    }

    fn parse_document(&mut self, depth: DepthBudget) -> Result<LlsdValue> {
        loop {
            match self.next_event()? {
                Event::Start(e) if e.name().as_ref() == b"llsd" => break,
                Event::Empty(e) if e.name().as_ref() == b"llsd" => return Ok(LlsdValue::Undefined),
                Event::Start(e) | Event::Empty(e) => {
                    return Err(Error::not_llsd(&format!(
                        "root element is <{}>",
                        String::from_utf8_lossy(e.name().as_ref())
                    )))
                }
                Event::Text(t) if t.iter().all(u8::is_ascii_whitespace) => continue,
                Event::Text(_) | Event::CData(_) => {
                    return Err(Error::not_llsd("text outside of <llsd>"))
                }
                Event::Eof => return Err(Error::unexpected_eof(self.offset(), "<llsd>")),
                _ => continue,
            }
        }

        let value = self.next_value(depth)?;
        if value.is_some() {
            self.skip_to_llsd_end()?;
        }
        Ok(value.unwrap_or_default())
    }

    /// Consumes whatever follows the value up to and including `</llsd>`.
    fn skip_to_llsd_end(&mut self) -> Result<()> {
        loop {
            match self.next_event()? {
                Event::End(_) => return Ok(()),
                Event::Start(e) => {
                    trace!(element = %String::from_utf8_lossy(e.name().as_ref()), "ignoring extra value after the first");
                    self.skip_element(&e)?;
                }
                Event::Eof => return Err(Error::unexpected_eof(self.offset(), "</llsd>")),
                _ => continue,
            }
        }
    }

    /// Parses the next element inside the current container, or returns `None`
    /// when the container closes first.
    fn next_value(&mut self, depth: DepthBudget) -> Result<Option<LlsdValue>> {
        loop {
            match self.next_event()? {
                Event::Start(e) => return self.parse_element(&e, false, depth).map(Some),
                Event::Empty(e) => return self.parse_element(&e, true, depth).map(Some),
                Event::End(_) => return Ok(None),
                Event::Eof => return Err(Error::unexpected_eof(self.offset(), "closing tag")),
                _ => continue,
            }
        }
    }

    fn parse_element(
        &mut self,
        start: &BytesStart<'_>,
        empty: bool,
        depth: DepthBudget,
    ) -> Result<LlsdValue> {
        let depth = depth.descend()?;
        self.nodes += 1;

        let name = start.name();
        match name.as_ref() {
            b"map" if empty => Ok(LlsdValue::empty_map()),
            b"map" => self.parse_map(depth),
            b"array" if empty => Ok(LlsdValue::empty_array()),
            b"array" => self.parse_array(depth),
            b"undef" => {
                if !empty {
                    self.skip_element(start)?;
                }
                Ok(LlsdValue::Undefined)
            }
            tag @ (b"boolean" | b"integer" | b"real" | b"string" | b"uuid" | b"date"
            | b"uri" | b"binary") => {
                let text = if empty {
                    Some(String::new())
                } else {
                    self.read_text()?
                };
                let value = text.and_then(|text| scalar_from_text(tag, start, text));
                Ok(value.unwrap_or_else(|| {
                    trace!(element = %String::from_utf8_lossy(tag), "unparseable content, substituting undefined");
                    LlsdValue::Undefined
                }))
            }
            other => {
                trace!(element = %String::from_utf8_lossy(other), "unrecognized element, substituting undefined");
                if !empty {
                    self.skip_element(start)?;
                }
                Ok(LlsdValue::Undefined)
            }
        }
    }

    /// Collects character data up to the element's end tag. Returns `None`
    /// when the content holds child elements or bad entity references.
    fn read_text(&mut self) -> Result<Option<String>> {
        let mut text = String::new();
        let mut valid = true;
        loop {
            match self.next_event()? {
                Event::Text(t) => match t.unescape() {
                    Ok(chunk) => text.push_str(&chunk),
                    Err(_) => valid = false,
                },
                Event::CData(c) => match std::str::from_utf8(&c) {
                    Ok(chunk) => text.push_str(chunk),
                    Err(_) => valid = false,
                },
                Event::Start(e) => {
                    valid = false;
                    self.skip_element(&e)?;
                }
                Event::Empty(_) => valid = false,
                Event::End(_) => break,
                Event::Eof => return Err(Error::unexpected_eof(self.offset(), "closing tag")),
                _ => continue,
            }
        }
        Ok(valid.then_some(text))
    }

    fn parse_map(&mut self, depth: DepthBudget) -> Result<LlsdValue> {
        let mut map = LlsdMap::new();
        loop {
            let key = match self.next_event()? {
                Event::Start(e) if e.name().as_ref() == b"key" => match self.read_text()? {
                    Some(key) => key,
                    None => continue,
                },
                Event::Empty(e) if e.name().as_ref() == b"key" => String::new(),
                Event::Start(e) => {
                    trace!(element = %String::from_utf8_lossy(e.name().as_ref()), "skipping element in key position");
                    self.skip_element(&e)?;
                    continue;
                }
                Event::Empty(e) => {
                    trace!(element = %String::from_utf8_lossy(e.name().as_ref()), "skipping element in key position");
                    continue;
                }
                Event::End(_) => break,
                Event::Eof => return Err(Error::unexpected_eof(self.offset(), "</map>")),
                _ => continue,
            };
            match self.next_value(depth)? {
                Some(value) => {
                    map.insert(key, value);
                }
                None => {
                    map.insert(key, LlsdValue::Undefined);
                    break;
                }
            }
        }
        Ok(LlsdValue::Map(map))
    }

    fn parse_array(&mut self, depth: DepthBudget) -> Result<LlsdValue> {
        let mut items = Vec::new();
        while let Some(value) = self.next_value(depth)? {
            items.push(value);
        }
        Ok(LlsdValue::Array(items))
    }
}

/// Converts the text of a scalar element; `None` when the text does not fit
/// the type.
fn scalar_from_text(tag: &[u8], start: &BytesStart<'_>, text: String) -> Option<LlsdValue> {
    let trimmed = text.trim();
    match tag {
        b"boolean" => Some(LlsdValue::Boolean(trimmed == "true" || trimmed == "1")),
        b"integer" if trimmed.is_empty() => Some(LlsdValue::Integer(0)),
        b"integer" => trimmed.parse().ok().map(LlsdValue::Integer),
        b"real" if trimmed.is_empty() => Some(LlsdValue::Real(0.0)),
        b"real" => trimmed.parse().ok().map(LlsdValue::Real),
        b"string" => Some(LlsdValue::String(text)),
        b"uri" => Some(LlsdValue::Uri(text)),
        b"uuid" if trimmed.is_empty() => Some(LlsdValue::Uuid(Uuid::nil())),
        b"uuid" => Uuid::parse_str(trimmed).ok().map(LlsdValue::Uuid),
        b"date" if trimmed.is_empty() => Some(LlsdValue::Date(LlsdDate::epoch())),
        b"date" => LlsdDate::parse(trimmed).ok().map(LlsdValue::Date),
        b"binary" => {
            let encoding = start
                .try_get_attribute("encoding")
                .ok()?
                .map(|attr| attr.unescape_value().map(|v| v.into_owned()))
                .transpose()
                .ok()?;
            match encoding.as_deref() {
                None | Some("base64") => {
                    let compact: String =
                        text.chars().filter(|c| !c.is_ascii_whitespace()).collect();
                    STANDARD.decode(compact).ok().map(LlsdValue::Binary)
                }
                Some(_) => None,
            }
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{llsd, BooleanStyle, ErrorKind};

    fn parse(doc: &str) -> Result<Parsed> {
        XmlParser::default().parse_slice(doc.as_bytes())
    }

    fn format(value: &LlsdValue) -> String {
        format_with(value, FormatOptions::new())
    }

    fn format_with(value: &LlsdValue, options: FormatOptions) -> String {
        String::from_utf8(XmlFormatter::new(options).format(value).unwrap()).unwrap()
    }

    #[test]
    fn test_format_scalars() {
        assert_eq!(format(&LlsdValue::Undefined), "<llsd><undef /></llsd>\n");
        assert_eq!(
            format(&LlsdValue::from(3463)),
            "<llsd><integer>3463</integer></llsd>\n"
        );
        assert_eq!(format(&LlsdValue::from("")), "<llsd><string /></llsd>\n");
        assert_eq!(
            format(&LlsdValue::from("a<b&c")),
            "<llsd><string>a&lt;b&amp;c</string></llsd>\n"
        );
        assert_eq!(
            format(&LlsdValue::Uuid(Uuid::nil())),
            "<llsd><uuid /></llsd>\n"
        );
        assert_eq!(
            format(&LlsdValue::binary(b"hello".to_vec())),
            "<llsd><binary encoding=\"base64\">aGVsbG8=</binary></llsd>\n"
        );
    }

    #[test]
    fn test_format_booleans_and_reals() {
        let alpha = FormatOptions::new().with_boolean_style(BooleanStyle::Alphabetic);
        assert_eq!(
            format_with(&LlsdValue::from(true), alpha),
            "<llsd><boolean>true</boolean></llsd>\n"
        );
        assert_eq!(
            format(&LlsdValue::from(false)),
            "<llsd><boolean>0</boolean></llsd>\n"
        );
        let fixed = FormatOptions::new().with_real_format("%.4f").unwrap();
        assert_eq!(
            format_with(&LlsdValue::from(-34379.0438), fixed),
            "<llsd><real>-34379.0438</real></llsd>\n"
        );
    }

    #[test]
    fn test_format_containers() {
        assert_eq!(format(&LlsdValue::empty_array()), "<llsd><array /></llsd>\n");
        assert_eq!(format(&LlsdValue::empty_map()), "<llsd><map /></llsd>\n");
        assert_eq!(
            format(&llsd!([undef, 1])),
            "<llsd><array><undef /><integer>1</integer></array></llsd>\n"
        );
        assert_eq!(
            format(&llsd!({ "baz": undef, "foo": "bar" })),
            "<llsd><map><key>baz</key><undef /><key>foo</key><string>bar</string></map></llsd>\n"
        );
    }

    #[test]
    fn test_format_pretty() {
        let text = format_with(&llsd!({ "a": [1] }), FormatOptions::pretty());
        assert_eq!(
            text,
            "<?xml version=\"1.0\" ?>\n<llsd>\n  <map>\n    <key>a</key>\n    <array>\n      <integer>1</integer>\n    </array>\n  </map>\n</llsd>\n"
        );
        assert_eq!(parse(&text).unwrap().value, llsd!({ "a": [1] }));
    }

    #[test]
    fn test_not_llsd() {
        for doc in [
            "<llsd><string>ha ha</string>",
            "<html><body><p>ha ha</p></body></html>",
            "<string>ha ha</string>",
            "<key>ha ha</key>",
            "",
        ] {
            let err = parse(doc).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Structural, "{}", doc);
        }
    }

    #[test]
    fn test_unknown_scalar_becomes_undefined() {
        let parsed = parse(
            "<llsd><map><key>amy</key><integer>23</integer>\
             <key>bob</key><bigint>99999999999999999</bigint>\
             <key>cam</key><real>1.23</real></map></llsd>",
        )
        .unwrap();
        assert_eq!(parsed.value, llsd!({ "amy": 23, "bob": undef, "cam": 1.23 }));
        assert_eq!(parsed.nodes, 4);
    }

    #[test]
    fn test_junk_in_array_is_counted() {
        let parsed = parse(
            "<llsd><array><integer>23</integer>\
             <map><html><body>ha ha</body></html></map>\
             <real>1.23</real></array></llsd>",
        )
        .unwrap();
        assert_eq!(parsed.value, llsd!([23, {}, 1.23]));
        assert_eq!(parsed.nodes, 4);
    }

    #[test]
    fn test_empty_elements_and_documents() {
        assert_eq!(parse("<llsd/>").unwrap(), Parsed::new(LlsdValue::Undefined, 0));
        assert_eq!(
            parse("<llsd></llsd>").unwrap(),
            Parsed::new(LlsdValue::Undefined, 0)
        );
        let parsed = parse(
            "<?xml version=\"1.0\"?>\n<!-- note -->\n<llsd><array>\
             <integer/><real/><string/><uuid/><date/><binary/><boolean/></array></llsd>",
        )
        .unwrap();
        assert_eq!(
            parsed.value,
            LlsdValue::Array(vec![
                LlsdValue::Integer(0),
                LlsdValue::Real(0.0),
                LlsdValue::from(""),
                LlsdValue::Uuid(Uuid::nil()),
                LlsdValue::Date(LlsdDate::epoch()),
                LlsdValue::Binary(Vec::new()),
                LlsdValue::Boolean(false),
            ])
        );
    }

    #[test]
    fn test_binary_encodings() {
        let parsed = parse("<llsd><binary>aGVs\nbG8=</binary></llsd>").unwrap();
        assert_eq!(parsed.value, LlsdValue::binary(b"hello".to_vec()));
        let parsed = parse("<llsd><binary encoding=\"base85\">xyz</binary></llsd>").unwrap();
        assert_eq!(parsed.value, LlsdValue::Undefined);
        assert_eq!(parsed.nodes, 1);
    }

    #[test]
    fn test_key_without_value() {
        let parsed = parse("<llsd><map><key>a</key><integer>1</integer><key>b</key></map></llsd>")
            .unwrap();
        assert_eq!(parsed.value, llsd!({ "a": 1, "b": undef }));
        assert_eq!(parsed.nodes, 2);
    }

    #[test]
    fn test_entities_and_whitespace_are_preserved() {
        let parsed = parse("<llsd><string> a &amp; &lt;b&gt; </string></llsd>").unwrap();
        assert_eq!(parsed.value, LlsdValue::from(" a & <b> "));
    }

    #[test]
    fn test_depth_limit() {
        let parser = XmlParser::new(ParseOptions::new().with_depth_limit(2));
        assert!(parser
            .parse_slice(b"<llsd><array><integer>1</integer></array></llsd>")
            .is_ok());
        let err = parser
            .parse_slice(b"<llsd><array><array><integer>1</integer></array></array></llsd>")
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BudgetExceeded);
    }

    #[test]
    fn test_hostile_nesting_fails_without_limit() {
        let doc = format!("<llsd>{}", "<array>".repeat(1_000_000));
        assert_eq!(parse(&doc).unwrap_err().kind(), ErrorKind::BudgetExceeded);
    }

    #[test]
    fn test_reader_stops_after_document() {
        let text = "<llsd><integer>5</integer></llsd>\n<llsd><string>next</string></llsd>";
        let mut stream = text.as_bytes();
        let parser = XmlParser::default();
        assert_eq!(parser.parse_reader(&mut stream).unwrap().value, LlsdValue::Integer(5));
        assert_eq!(
            parser.parse_reader(&mut stream).unwrap().value,
            LlsdValue::from("next")
        );
    }

    #[test]
    fn test_xml_char_ranges() {
        assert!(is_xml_char('\n'));
        assert!(is_xml_char('a'));
        assert!(is_xml_char('\u{10FFFD}'));
        assert!(!is_xml_char('\r'));
        assert!(!is_xml_char('\u{0}'));
        assert!(!is_xml_char('\u{FDD0}'));
        assert!(!is_xml_char('\u{FFFE}'));
        assert!(!is_xml_char('\u{10FFFF}'));
    }
}
