//! Literal parser for scalar parameter values.
//!
//! Parameter values are typed by the user as text. They are turned into a
//! tagged [`ScalarValue`] by a small parser that recognises integer,
//! floating-point, boolean and complex syntaxes and nothing else: there is no
//! expression evaluation, so `1 + 1` or `pi` are rejected.
//!
//! Accepted forms (surrounding whitespace and one or more pairs of outer
//! parentheses are ignored):
//!
//! - integers: `42`, `-7`, `+3`, `1_000`, `0x1F`, `0o17`, `0b101`
//! - floats: `1.5`, `.5`, `5.`, `-2e-3`, `1.5d0` (Fortran exponent marker)
//! - booleans: `True`, `False`, `true`, `false`, `.true.`, `.false.`
//! - complex: `2j`, `1+2j`, `-1.5-0.5J`

use std::fmt;
use std::num::IntErrorKind;

use crate::error::{LiteralError, LiteralErrorKind};

/// A parsed scalar literal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScalarValue {
    /// 64-bit signed integer
    Integer(i64),
    /// Double-precision float
    Float(f64),
    /// Boolean flag
    Boolean(bool),
    /// Double-precision complex number
    Complex {
        /// Real part
        re: f64,
        /// Imaginary part
        im: f64,
    },
}

impl ScalarValue {
    /// Fortran type keyword used for a `PARAMETER` declaration of this value.
    pub fn fortran_type(&self) -> &'static str {
        match self {
            ScalarValue::Integer(_) => "INTEGER",
            ScalarValue::Float(_) => "DOUBLE PRECISION",
            ScalarValue::Boolean(_) => "LOGICAL",
            ScalarValue::Complex { .. } => "COMPLEX*16",
        }
    }

    /// Fortran literal for this value, e.g. `42`, `1.5D0`, `.TRUE.`, `(1.0D0, 2.0D0)`.
    pub fn fortran_literal(&self) -> String {
        match self {
            ScalarValue::Integer(i) => i.to_string(),
            ScalarValue::Float(f) => fortran_double(*f),
            ScalarValue::Boolean(true) => ".TRUE.".to_string(),
            ScalarValue::Boolean(false) => ".FALSE.".to_string(),
            ScalarValue::Complex { re, im } => {
                format!("({}, {})", fortran_double(*re), fortran_double(*im))
            }
        }
    }
}

impl fmt::Display for ScalarValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScalarValue::Integer(i) => write!(f, "{i}"),
            ScalarValue::Float(v) => write!(f, "{v:?}"),
            ScalarValue::Boolean(b) => write!(f, "{b}"),
            ScalarValue::Complex { re, im } if *im < 0.0 => write!(f, "{re:?}{im:?}j"),
            ScalarValue::Complex { re, im } => write!(f, "{re:?}+{im:?}j"),
        }
    }
}

/// Formats a finite double as a Fortran double-precision constant (`D` exponent).
pub fn fortran_double(value: f64) -> String {
    let scientific = format!("{value:E}");
    let (mantissa, exponent) = scientific
        .split_once('E')
        .unwrap_or((scientific.as_str(), "0"));
    if mantissa.contains('.') {
        format!("{mantissa}D{exponent}")
    } else {
        format!("{mantissa}.0D{exponent}")
    }
}

/// Parses literal text into a [`ScalarValue`].
///
/// # Arguments
///
/// * `text` - The value as typed by the user
///
/// # Returns
///
/// The tagged value, or a [`LiteralError`] naming the text and the reason it was rejected.
pub fn parse_literal(text: &str) -> Result<ScalarValue, LiteralError> {
    let body = strip_outer_parens(text.trim());
    if body.is_empty() {
        return Err(LiteralError::new(text, LiteralErrorKind::Empty));
    }

    if let Some(flag) = parse_bool(body) {
        return Ok(ScalarValue::Boolean(flag));
    }

    if let Some(imaginary) = body.strip_suffix(['j', 'J']) {
        return parse_complex(imaginary).map_err(|kind| LiteralError::new(text, kind));
    }

    match parse_integer(body) {
        Ok(Some(i)) => return Ok(ScalarValue::Integer(i)),
        Ok(None) => {}
        Err(kind) => return Err(LiteralError::new(text, kind)),
    }

    parse_float(body)
        .map(ScalarValue::Float)
        .map_err(|kind| LiteralError::new(text, kind))
}

fn strip_outer_parens(mut s: &str) -> &str {
    while let Some(inner) = s.strip_prefix('(').and_then(|r| r.strip_suffix(')')) {
        s = inner.trim();
    }
    s
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.to_ascii_lowercase().as_str() {
        "true" | ".true." => Some(true),
        "false" | ".false." => Some(false),
        _ => None,
    }
}

/// `Ok(None)` means "not integer syntax"; the caller then tries a float.
fn parse_integer(s: &str) -> Result<Option<i64>, LiteralErrorKind> {
    let (negative, unsigned) = split_sign(s);

    let lower = unsigned.to_ascii_lowercase();
    let (radix, digits) = if let Some(d) = lower.strip_prefix("0x") {
        (16, d)
    } else if let Some(d) = lower.strip_prefix("0o") {
        (8, d)
    } else if let Some(d) = lower.strip_prefix("0b") {
        (2, d)
    } else {
        (10, lower.as_str())
    };

    let digits = match strip_separators(digits, |c| c.is_digit(radix)) {
        Some(d) => d,
        None if radix == 10 => return Ok(None),
        None => return Err(LiteralErrorKind::InvalidSyntax),
    };

    let signed = if negative {
        format!("-{digits}")
    } else {
        digits
    };
    match i64::from_str_radix(&signed, radix) {
        Ok(value) => Ok(Some(value)),
        Err(e) => match e.kind() {
            IntErrorKind::PosOverflow | IntErrorKind::NegOverflow => {
                Err(LiteralErrorKind::IntegerOverflow)
            }
            _ => Err(LiteralErrorKind::InvalidSyntax),
        },
    }
}

fn parse_float(s: &str) -> Result<f64, LiteralErrorKind> {
    let (negative, unsigned) = split_sign(s);

    let (mantissa, exponent) = match unsigned.find(['e', 'E', 'd', 'D']) {
        Some(pos) => (&unsigned[..pos], Some(&unsigned[pos + 1..])),
        None => (unsigned, None),
    };

    let (int_part, frac_part) = match mantissa.split_once('.') {
        Some((i, f)) => (i, f),
        None => (mantissa, ""),
    };
    if int_part.is_empty() && frac_part.is_empty() {
        return Err(LiteralErrorKind::InvalidSyntax);
    }
    let is_digit = |c: char| c.is_ascii_digit();
    let int_digits = if int_part.is_empty() {
        String::new()
    } else {
        strip_separators(int_part, is_digit).ok_or(LiteralErrorKind::InvalidSyntax)?
    };
    let frac_digits = if frac_part.is_empty() {
        String::new()
    } else {
        strip_separators(frac_part, is_digit).ok_or(LiteralErrorKind::InvalidSyntax)?
    };
    // A bare integer never reaches here, so a float needs a point or an exponent.
    if !mantissa.contains('.') && exponent.is_none() {
        return Err(LiteralErrorKind::InvalidSyntax);
    }

    let mut normalized = String::with_capacity(s.len() + 2);
    if negative {
        normalized.push('-');
    }
    normalized.push_str(if int_digits.is_empty() { "0" } else { &int_digits });
    normalized.push('.');
    normalized.push_str(if frac_digits.is_empty() { "0" } else { &frac_digits });

    if let Some(exponent) = exponent {
        let (exp_negative, exp_digits) = split_sign(exponent);
        let exp_digits =
            strip_separators(exp_digits, is_digit).ok_or(LiteralErrorKind::InvalidSyntax)?;
        normalized.push('e');
        if exp_negative {
            normalized.push('-');
        }
        normalized.push_str(&exp_digits);
    }

    let value: f64 = normalized
        .parse()
        .map_err(|_| LiteralErrorKind::InvalidSyntax)?;
    if value.is_finite() {
        Ok(value)
    } else {
        Err(LiteralErrorKind::NonFinite)
    }
}

/// Parses the text of a complex literal with its trailing `j` already removed.
fn parse_complex(body: &str) -> Result<ScalarValue, LiteralErrorKind> {
    let body = body.trim();
    match find_binary_sign(body) {
        Some(split) => {
            let re = parse_real(body[..split].trim())?;
            let im = parse_real(body[split..].trim())?;
            Ok(ScalarValue::Complex { re, im })
        }
        None => {
            let im = parse_real(body)?;
            Ok(ScalarValue::Complex { re: 0.0, im })
        }
    }
}

fn parse_real(s: &str) -> Result<f64, LiteralErrorKind> {
    if s.is_empty() {
        return Err(LiteralErrorKind::InvalidSyntax);
    }
    match parse_integer(s)? {
        Some(i) => Ok(i as f64),
        None => parse_float(s),
    }
}

/// Position of the `+`/`-` separating real and imaginary parts, skipping a
/// leading sign and signs that belong to an exponent.
fn find_binary_sign(s: &str) -> Option<usize> {
    let bytes = s.as_bytes();
    (1..bytes.len()).rev().find(|&i| {
        matches!(bytes[i], b'+' | b'-')
            && !matches!(bytes[i - 1], b'e' | b'E' | b'd' | b'D')
    })
}

fn split_sign(s: &str) -> (bool, &str) {
    if let Some(rest) = s.strip_prefix('-') {
        (true, rest)
    } else if let Some(rest) = s.strip_prefix('+') {
        (false, rest)
    } else {
        (false, s)
    }
}

/// Removes `_` digit separators. Returns `None` unless the text is a non-empty
/// run of accepted digits with separators only between digits.
fn strip_separators(s: &str, is_digit: impl Fn(char) -> bool) -> Option<String> {
    if s.is_empty() || s.starts_with('_') || s.ends_with('_') || s.contains("__") {
        return None;
    }
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if c == '_' {
            continue;
        }
        if !is_digit(c) {
            return None;
        }
        out.push(c);
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kind_of(text: &str) -> LiteralErrorKind {
        parse_literal(text).unwrap_err().kind
    }

    #[test]
    fn test_integers() {
        assert_eq!(parse_literal("42").unwrap(), ScalarValue::Integer(42));
        assert_eq!(parse_literal(" -7 ").unwrap(), ScalarValue::Integer(-7));
        assert_eq!(parse_literal("+3").unwrap(), ScalarValue::Integer(3));
        assert_eq!(parse_literal("1_000").unwrap(), ScalarValue::Integer(1000));
        assert_eq!(parse_literal("0x1F").unwrap(), ScalarValue::Integer(31));
        assert_eq!(parse_literal("0o17").unwrap(), ScalarValue::Integer(15));
        assert_eq!(parse_literal("-0b101").unwrap(), ScalarValue::Integer(-5));
        assert_eq!(parse_literal("(12)").unwrap(), ScalarValue::Integer(12));
    }

    #[test]
    fn test_integer_overflow() {
        assert_eq!(kind_of("99999999999999999999"), LiteralErrorKind::IntegerOverflow);
        assert_eq!(
            parse_literal("-9223372036854775808").unwrap(),
            ScalarValue::Integer(i64::MIN)
        );
    }

    #[test]
    fn test_floats() {
        assert_eq!(parse_literal("1.5").unwrap(), ScalarValue::Float(1.5));
        assert_eq!(parse_literal(".5").unwrap(), ScalarValue::Float(0.5));
        assert_eq!(parse_literal("5.").unwrap(), ScalarValue::Float(5.0));
        assert_eq!(parse_literal("-2e-3").unwrap(), ScalarValue::Float(-0.002));
        assert_eq!(parse_literal("1.5d0").unwrap(), ScalarValue::Float(1.5));
        assert_eq!(parse_literal("2E+2").unwrap(), ScalarValue::Float(200.0));
        assert_eq!(parse_literal("1_0.2_5").unwrap(), ScalarValue::Float(10.25));
    }

    #[test]
    fn test_float_overflow_is_not_finite() {
        assert_eq!(kind_of("1e999"), LiteralErrorKind::NonFinite);
    }

    #[test]
    fn test_booleans() {
        assert_eq!(parse_literal("True").unwrap(), ScalarValue::Boolean(true));
        assert_eq!(parse_literal("false").unwrap(), ScalarValue::Boolean(false));
        assert_eq!(parse_literal(".TRUE.").unwrap(), ScalarValue::Boolean(true));
    }

    #[test]
    fn test_complex() {
        assert_eq!(
            parse_literal("2j").unwrap(),
            ScalarValue::Complex { re: 0.0, im: 2.0 }
        );
        assert_eq!(
            parse_literal("1+2j").unwrap(),
            ScalarValue::Complex { re: 1.0, im: 2.0 }
        );
        assert_eq!(
            parse_literal("(-1.5-0.5J)").unwrap(),
            ScalarValue::Complex { re: -1.5, im: -0.5 }
        );
        assert_eq!(
            parse_literal("1e-1+2e-1j").unwrap(),
            ScalarValue::Complex { re: 0.1, im: 0.2 }
        );
    }

    #[test]
    fn test_rejects_expressions_and_names() {
        assert_eq!(kind_of(""), LiteralErrorKind::Empty);
        assert_eq!(kind_of("   "), LiteralErrorKind::Empty);
        assert_eq!(kind_of("1 + 1"), LiteralErrorKind::InvalidSyntax);
        assert_eq!(kind_of("pi"), LiteralErrorKind::InvalidSyntax);
        assert_eq!(kind_of("j"), LiteralErrorKind::InvalidSyntax);
        assert_eq!(kind_of("1+j"), LiteralErrorKind::InvalidSyntax);
        assert_eq!(kind_of("__import__('os')"), LiteralErrorKind::InvalidSyntax);
        assert_eq!(kind_of("1__0"), LiteralErrorKind::InvalidSyntax);
        assert_eq!(kind_of("0xZZ"), LiteralErrorKind::InvalidSyntax);
        assert_eq!(kind_of("."), LiteralErrorKind::InvalidSyntax);
    }

    #[test]
    fn test_fortran_rendering() {
        assert_eq!(ScalarValue::Integer(-3).fortran_literal(), "-3");
        assert_eq!(ScalarValue::Float(1.5).fortran_literal(), "1.5D0");
        assert_eq!(ScalarValue::Float(1e-5).fortran_literal(), "1.0D-5");
        assert_eq!(ScalarValue::Float(250.0).fortran_literal(), "2.5D2");
        assert_eq!(ScalarValue::Boolean(false).fortran_literal(), ".FALSE.");
        assert_eq!(
            ScalarValue::Complex { re: 1.0, im: -2.0 }.fortran_literal(),
            "(1.0D0, -2.0D0)"
        );
        assert_eq!(ScalarValue::Float(0.0).fortran_type(), "DOUBLE PRECISION");
        assert_eq!(
            ScalarValue::Complex { re: 0.0, im: 0.0 }.fortran_type(),
            "COMPLEX*16"
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(ScalarValue::Float(2.0).to_string(), "2.0");
        assert_eq!(ScalarValue::Complex { re: 1.0, im: -2.0 }.to_string(), "1.0-2.0j");
        assert_eq!(ScalarValue::Complex { re: 1.0, im: 2.0 }.to_string(), "1.0+2.0j");
    }
}
