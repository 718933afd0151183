//! printf-style formatting for real numbers.
//!
//! Formatters accept a C format string such as `%.2f` and apply it to every
//! real they emit. The spec is validated once, up front, by [`RealFormat::parse`].
//!
//! Supported: flags `-`, `+`, space, `0` and `#`; a minimum width; a precision;
//! conversions `f`/`F`, `e`/`E` and `g`/`G`. Text around the single conversion
//! is copied through, with `%%` standing for a literal percent sign.
//!
//! ```rust
//! use serde_llsd::RealFormat;
//!
//! let fixed = RealFormat::parse("%.2f").unwrap();
//! assert_eq!(fixed.format(1.0), "1.00");
//! assert_eq!(fixed.format(-34379.0364), "-34379.04");
//!
//! let general = RealFormat::parse("%g").unwrap();
//! assert_eq!(general.format(0.0001), "0.0001");
//! assert_eq!(general.format(1e20), "1e+20");
//! ```

use crate::{Error, Result};
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Conversion {
    Fixed,
    Exponent,
    General,
}

/// A parsed printf conversion for `f64` values.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RealFormat {
    source: String,
    prefix: String,
    suffix: String,
    left_align: bool,
    plus_sign: bool,
    space_sign: bool,
    zero_pad: bool,
    alternate: bool,
    width: usize,
    precision: Option<usize>,
    conversion: Conversion,
    uppercase: bool,
}

impl RealFormat {
    /// Parses a printf format string holding exactly one real conversion.
    ///
    /// # Errors
    ///
    /// Returns a syntax error for a missing, repeated or unsupported conversion.
    pub fn parse(spec: &str) -> Result<Self> {
        let bytes = spec.as_bytes();
        let mut prefix = String::new();
        let mut suffix = String::new();
        let mut conversion = None;
        let mut format = RealFormat {
            source: spec.to_string(),
            prefix: String::new(),
            suffix: String::new(),
            left_align: false,
            plus_sign: false,
            space_sign: false,
            zero_pad: false,
            alternate: false,
            width: 0,
            precision: None,
            conversion: Conversion::Fixed,
            uppercase: false,
        };

        let mut i = 0;
        while i < bytes.len() {
            let literal = if conversion.is_none() {
                &mut prefix
            } else {
                &mut suffix
            };
            if bytes[i] != b'%' {
                let ch_len = spec[i..].chars().next().map_or(1, char::len_utf8);
                literal.push_str(&spec[i..i + ch_len]);
                i += ch_len;
                continue;
            }
            if bytes.get(i + 1) == Some(&b'%') {
                literal.push('%');
                i += 2;
                continue;
            }
            if conversion.is_some() {
                return Err(Error::syntax(i, "real format has more than one conversion"));
            }
            i += 1;

            while let Some(&flag) = bytes.get(i) {
                match flag {
                    b'-' => format.left_align = true,
                    b'+' => format.plus_sign = true,
                    b' ' => format.space_sign = true,
                    b'0' => format.zero_pad = true,
                    b'#' => format.alternate = true,
                    _ => break,
                }
                i += 1;
            }
            let digits_start = i;
            while bytes.get(i).is_some_and(u8::is_ascii_digit) {
                i += 1;
            }
            format.width = spec[digits_start..i].parse().unwrap_or(0);
            if bytes.get(i) == Some(&b'.') {
                i += 1;
                let digits_start = i;
                while bytes.get(i).is_some_and(u8::is_ascii_digit) {
                    i += 1;
                }
                format.precision = Some(spec[digits_start..i].parse().unwrap_or(0));
            }
            // Length modifiers carry no meaning for doubles.
            while matches!(bytes.get(i), Some(b'l' | b'L' | b'h')) {
                i += 1;
            }
            let conv = match bytes.get(i) {
                Some(b'f') => Conversion::Fixed,
                Some(b'F') => {
                    format.uppercase = true;
                    Conversion::Fixed
                }
                Some(b'e') => Conversion::Exponent,
                Some(b'E') => {
                    format.uppercase = true;
                    Conversion::Exponent
                }
                Some(b'g') => Conversion::General,
                Some(b'G') => {
                    format.uppercase = true;
                    Conversion::General
                }
                Some(&other) => {
                    return Err(Error::syntax(
                        i,
                        &format!("unsupported real conversion '{}'", char::from(other)),
                    ))
                }
                None => return Err(Error::unexpected_eof(i, "conversion character")),
            };
            conversion = Some(conv);
            i += 1;
        }

        format.conversion =
            conversion.ok_or_else(|| Error::syntax(0, "real format has no conversion"))?;
        format.prefix = prefix;
        format.suffix = suffix;
        Ok(format)
    }

    /// The format string this was parsed from.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Formats one value.
    #[must_use]
    pub fn format(&self, value: f64) -> String {
        let negative = value.is_sign_negative() && !value.is_nan();
        let magnitude = value.abs();
        let mut body = if value.is_nan() {
            "nan".to_string()
        } else if value.is_infinite() {
            "inf".to_string()
        } else {
            match self.conversion {
                Conversion::Fixed => fixed(magnitude, self.precision.unwrap_or(6), self.alternate),
                Conversion::Exponent => {
                    exponent(magnitude, self.precision.unwrap_or(6), self.alternate)
                }
                Conversion::General => general(magnitude, self.precision, self.alternate),
            }
        };
        if self.uppercase {
            body = body.to_ascii_uppercase();
        }

        let sign = if negative {
            "-"
        } else if self.plus_sign {
            "+"
        } else if self.space_sign {
            " "
        } else {
            ""
        };

        let len = sign.len() + body.len();
        let mut out = String::with_capacity(self.prefix.len() + len.max(self.width) + self.suffix.len());
        out.push_str(&self.prefix);
        if len >= self.width {
            out.push_str(sign);
            out.push_str(&body);
        } else if self.left_align {
            out.push_str(sign);
            out.push_str(&body);
            out.extend(std::iter::repeat(' ').take(self.width - len));
        } else if self.zero_pad && value.is_finite() {
            out.push_str(sign);
            out.extend(std::iter::repeat('0').take(self.width - len));
            out.push_str(&body);
        } else {
            out.extend(std::iter::repeat(' ').take(self.width - len));
            out.push_str(sign);
            out.push_str(&body);
        }
        out.push_str(&self.suffix);
        out
    }
}

impl fmt::Display for RealFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

impl std::str::FromStr for RealFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        RealFormat::parse(s)
    }
}

fn fixed(magnitude: f64, precision: usize, alternate: bool) -> String {
    let mut out = format!("{:.*}", precision, magnitude);
    if alternate && precision == 0 {
        out.push('.');
    }
    out
}

/// C-style exponent: at least two exponent digits and an explicit sign.
fn exponent(magnitude: f64, precision: usize, alternate: bool) -> String {
    let rust = format!("{:.*e}", precision, magnitude);
    let (mantissa, exp) = rust.split_once('e').unwrap_or((rust.as_str(), "0"));
    let exp: i32 = exp.parse().unwrap_or(0);
    let mut mantissa = mantissa.to_string();
    if alternate && precision == 0 {
        mantissa.push('.');
    }
    let sign = if exp < 0 { '-' } else { '+' };
    format!("{}e{}{:02}", mantissa, sign, exp.abs())
}

fn general(magnitude: f64, precision: Option<usize>, alternate: bool) -> String {
    let p = match precision {
        None => 6,
        Some(0) => 1,
        Some(p) => p,
    };
    if magnitude == 0.0 {
        return if alternate {
            format!("{:.*}", p - 1, 0.0)
        } else {
            "0".to_string()
        };
    }
    // The exponent is taken after rounding to `p` significant digits.
    let rounded = format!("{:.*e}", p - 1, magnitude);
    let x: i64 = rounded
        .split_once('e')
        .and_then(|(_, exp)| exp.parse().ok())
        .unwrap_or(0);
    let p = p as i64;
    let out = if x < p && x >= -4 {
        fixed(magnitude, (p - 1 - x) as usize, alternate)
    } else {
        exponent(magnitude, (p - 1) as usize, alternate)
    };
    if alternate {
        out
    } else {
        strip_trailing_zeros(&out)
    }
}

fn strip_trailing_zeros(text: &str) -> String {
    let (mantissa, exp) = match text.find('e') {
        Some(at) => text.split_at(at),
        None => (text, ""),
    };
    let mantissa = if mantissa.contains('.') {
        mantissa.trim_end_matches('0').trim_end_matches('.')
    } else {
        mantissa
    };
    format!("{}{}", mantissa, exp)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fmt(spec: &str, value: f64) -> String {
        RealFormat::parse(spec).unwrap().format(value)
    }

    #[test]
    fn test_fixed() {
        assert_eq!(fmt("%.2f", 1.0), "1.00");
        assert_eq!(fmt("%.2f", -34379.0364), "-34379.04");
        assert_eq!(fmt("%.0f", 0.333333333333333333), "0");
        assert_eq!(fmt("%.0f", 3287.4387), "3287");
        assert_eq!(fmt("%f", 0.5), "0.500000");
        assert_eq!(fmt("%#.0f", 2.0), "2.");
    }

    #[test]
    fn test_exponent() {
        assert_eq!(fmt("%e", 1234.5), "1.234500e+03");
        assert_eq!(fmt("%.2E", 0.000123), "1.23E-04");
        assert_eq!(fmt("%.0e", 5e100), "5e+100");
    }

    #[test]
    fn test_general() {
        assert_eq!(fmt("%g", 100000.0), "100000");
        assert_eq!(fmt("%g", 1000000.0), "1e+06");
        assert_eq!(fmt("%g", 0.5), "0.5");
        assert_eq!(fmt("%g", 0.00001), "1e-05");
        assert_eq!(fmt("%.3g", 3.14159), "3.14");
        assert_eq!(fmt("%g", 0.0), "0");
        assert_eq!(fmt("%.17g", 0.1), "0.10000000000000001");
    }

    #[test]
    fn test_width_and_flags() {
        assert_eq!(fmt("%8.2f", 3.14159), "    3.14");
        assert_eq!(fmt("%-8.2f|", 3.14159), "3.14    |");
        assert_eq!(fmt("%08.2f", -3.14159), "-0003.14");
        assert_eq!(fmt("%+.1f", 2.0), "+2.0");
        assert_eq!(fmt("% .1f", 2.0), " 2.0");
    }

    #[test]
    fn test_literals_and_specials() {
        assert_eq!(fmt("%.1f%%", 50.0), "50.0%");
        assert_eq!(fmt("%lf", 1.5), "1.500000");
        assert_eq!(fmt("%f", f64::NAN), "nan");
        assert_eq!(fmt("%f", f64::NEG_INFINITY), "-inf");
        assert_eq!(fmt("%G", f64::INFINITY), "INF");
    }

    #[test]
    fn test_invalid_specs() {
        assert!(RealFormat::parse("no conversion").is_err());
        assert!(RealFormat::parse("%d").is_err());
        assert!(RealFormat::parse("%f %f").is_err());
        assert!(RealFormat::parse("%.2").is_err());
        assert_eq!(RealFormat::parse("%.4f").unwrap().as_str(), "%.4f");
    }
}
