//! The numeric subset: exact 64-bit integers and inexact doubles, plus the
//! R5RS numeric-literal grammar shared by the lexer and `string->number`.

use crate::{
    error::{Error, ErrorKind, EvalResult},
    value::Value,
};

/// A number lifted out of the value representation. `Int` is exact, `Float`
/// is inexact; exactness of a result is the AND of the operands' exactness.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    #[must_use]
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Int(i) => Some(Self::Int(i)),
            Value::Float(x) => Some(Self::Float(x)),
            _ => None,
        }
    }

    #[must_use]
    pub fn value(self) -> Value {
        match self {
            Self::Int(i) => Value::Int(i),
            Self::Float(x) => Value::Float(x),
        }
    }

    #[must_use]
    pub fn is_exact(self) -> bool {
        matches!(self, Self::Int(_))
    }

    #[must_use]
    pub fn as_f64(self) -> f64 {
        match self {
            Self::Int(i) => i as f64,
            Self::Float(x) => x,
        }
    }

    /// Inexact rendition of this number.
    #[must_use]
    pub fn to_inexact(self) -> Self {
        Self::Float(self.as_f64())
    }

    #[must_use]
    pub fn add(self, other: Self) -> Self {
        match (self, other) {
            (Self::Int(a), Self::Int(b)) => Self::Int(a.wrapping_add(b)),
            _ => Self::Float(self.as_f64() + other.as_f64()),
        }
    }

    #[must_use]
    pub fn sub(self, other: Self) -> Self {
        match (self, other) {
            (Self::Int(a), Self::Int(b)) => Self::Int(a.wrapping_sub(b)),
            _ => Self::Float(self.as_f64() - other.as_f64()),
        }
    }

    #[must_use]
    pub fn mul(self, other: Self) -> Self {
        match (self, other) {
            (Self::Int(a), Self::Int(b)) => Self::Int(a.wrapping_mul(b)),
            _ => Self::Float(self.as_f64() * other.as_f64()),
        }
    }

    /// Division. Exact over exact stays exact when the quotient is whole,
    /// otherwise the result drops to a float. Exact division by zero is a
    /// domain error; inexact division follows IEEE-754.
    pub fn div(self, other: Self) -> EvalResult<Self> {
        match (self, other) {
            (Self::Int(_), Self::Int(0)) => Err(Error::new(ErrorKind::Domain, "division by zero")),
            (Self::Int(a), Self::Int(b)) => {
                if a.wrapping_rem(b) == 0 {
                    Ok(Self::Int(a.wrapping_div(b)))
                } else {
                    Ok(Self::Float(a as f64 / b as f64))
                }
            }
            _ => Ok(Self::Float(self.as_f64() / other.as_f64())),
        }
    }

    #[must_use]
    pub fn neg(self) -> Self {
        match self {
            Self::Int(i) => Self::Int(i.wrapping_neg()),
            Self::Float(x) => Self::Float(-x),
        }
    }

    /// Numeric equality across tags (`=`).
    #[must_use]
    pub fn num_eq(self, other: Self) -> bool {
        match (self, other) {
            (Self::Int(a), Self::Int(b)) => a == b,
            _ => self.as_f64() == other.as_f64(),
        }
    }

    #[must_use]
    pub fn lt(self, other: Self) -> bool {
        match (self, other) {
            (Self::Int(a), Self::Int(b)) => a < b,
            _ => self.as_f64() < other.as_f64(),
        }
    }

    #[must_use]
    pub fn le(self, other: Self) -> bool {
        match (self, other) {
            (Self::Int(a), Self::Int(b)) => a <= b,
            _ => self.as_f64() <= other.as_f64(),
        }
    }
}

/// Outcome of scanning a literal's prefix block (`#x`, `#e`, … in any order).
#[derive(Debug, Clone, Copy, Default)]
struct Prefixes {
    radix: Option<u32>,
    exact: Option<bool>,
}

/// Parses an R5RS numeric literal. Returns `None` when `text` is not a valid
/// number in `default_radix` — including the complex forms (`a+bi`, `+i`,
/// `a@b`), which the grammar recognizes but this subset rejects.
#[must_use]
pub fn parse_number(text: &str, default_radix: u32) -> Option<Number> {
    let bytes = text.as_bytes();
    let (prefixes, mut pos) = scan_prefixes(bytes)?;
    let radix = prefixes.radix.unwrap_or(default_radix);
    if !matches!(radix, 2 | 8 | 10 | 16) {
        return None;
    }
    let rest = &bytes[pos..];
    if rest.is_empty() {
        return None;
    }

    // Complex forms are single tokens but not numbers here: polar `a@b`, and
    // any rectangular form, which always ends in `i` (never a valid digit or
    // exponent tail in any supported radix).
    if rest.contains(&b'@') || matches!(rest.last(), Some(&(b'i' | b'I'))) {
        return None;
    }

    pos = 0;
    let negative = match rest.first() {
        Some(b'+') => {
            pos = 1;
            false
        }
        Some(b'-') => {
            pos = 1;
            true
        }
        _ => false,
    };
    // A second sign anywhere after the first marks a rectangular complex
    // (the exponent-marker sign is consumed by the exponent scan below, so
    // this check runs on the tail only for radix != 10 and on the mantissa
    // for radix 10 via the scans).

    let (int_digits, int_hashes) = scan_digit_run(rest, &mut pos, radix);

    // Rational: <digits> / <digits>
    if rest.get(pos) == Some(&b'/') {
        pos += 1;
        let (den_digits, den_hashes) = scan_digit_run(rest, &mut pos, radix);
        if pos != rest.len() || int_digits.is_empty() || den_digits.is_empty() {
            return None;
        }
        let inexact_flag = int_hashes || den_hashes;
        let num = i64::from_str_radix(&int_digits, radix).ok()?;
        let den = i64::from_str_radix(&den_digits, radix).ok()?;
        if den == 0 {
            return None;
        }
        let num = if negative { -num } else { num };
        return finish_ratio(num, den, inexact_flag, prefixes.exact);
    }

    // Decimal point and exponent only exist in radix 10 (in hex, `e` and
    // friends are digits).
    let mut saw_point = false;
    let mut frac_digits = String::new();
    let mut frac_hashes = false;
    let mut exponent: Option<(bool, String)> = None;
    if radix == 10 {
        if rest.get(pos) == Some(&b'.') {
            saw_point = true;
            pos += 1;
            let (digits, hashes) = scan_digit_run(rest, &mut pos, 10);
            frac_digits = digits;
            frac_hashes = hashes;
        }
        if let Some(&marker) = rest.get(pos)
            && matches!(marker.to_ascii_lowercase(), b'e' | b's' | b'f' | b'd' | b'l')
        {
            pos += 1;
            let exp_negative = match rest.get(pos) {
                Some(b'+') => {
                    pos += 1;
                    false
                }
                Some(b'-') => {
                    pos += 1;
                    true
                }
                _ => false,
            };
            let (digits, hashes) = scan_digit_run(rest, &mut pos, 10);
            if digits.is_empty() || hashes {
                return None;
            }
            exponent = Some((exp_negative, digits));
        }
    }

    if pos != rest.len() || (int_digits.is_empty() && frac_digits.is_empty()) {
        return None;
    }
    if saw_point && int_digits.is_empty() && frac_digits.is_empty() {
        return None;
    }

    let forced_inexact = int_hashes || frac_hashes || saw_point || exponent.is_some();
    if !forced_inexact {
        // Plain integer in some radix.
        let magnitude = i64::from_str_radix(&int_digits, radix).ok()?;
        let magnitude = if negative { -magnitude } else { magnitude };
        return match prefixes.exact {
            Some(false) => Some(Number::Float(magnitude as f64)),
            _ => Some(Number::Int(magnitude)),
        };
    }

    // Decimal notation: build a normal float literal and let the std parser
    // produce the closest double.
    let mut literal = String::new();
    if negative {
        literal.push('-');
    }
    literal.push_str(if int_digits.is_empty() { "0" } else { &int_digits });
    literal.push('.');
    literal.push_str(&frac_digits);
    if let Some((exp_negative, digits)) = exponent {
        literal.push('e');
        if exp_negative {
            literal.push('-');
        }
        literal.push_str(&digits);
    }
    let x: f64 = literal.parse().ok()?;
    match prefixes.exact {
        Some(true) => {
            // An exactness override on a value with a fractional part has no
            // exact representation in this subset.
            if x.fract() == 0.0 && x >= i64::MIN as f64 && x <= i64::MAX as f64 {
                Some(Number::Int(x as i64))
            } else {
                None
            }
        }
        _ => Some(Number::Float(x)),
    }
}

fn scan_prefixes(bytes: &[u8]) -> Option<(Prefixes, usize)> {
    let mut prefixes = Prefixes::default();
    let mut pos = 0;
    while bytes.get(pos) == Some(&b'#') {
        let marker = bytes.get(pos + 1)?.to_ascii_lowercase();
        match marker {
            b'b' | b'o' | b'd' | b'x' => {
                if prefixes.radix.is_some() {
                    return None;
                }
                prefixes.radix = Some(match marker {
                    b'b' => 2,
                    b'o' => 8,
                    b'd' => 10,
                    _ => 16,
                });
            }
            b'e' | b'i' => {
                if prefixes.exact.is_some() {
                    return None;
                }
                prefixes.exact = Some(marker == b'e');
            }
            _ => return None,
        }
        pos += 2;
    }
    Some((prefixes, pos))
}

/// Scans a run of digits in `radix`, where `#` stands for a zero digit and
/// taints the literal inexact. Returns the digits with `#` replaced by `0`.
fn scan_digit_run(bytes: &[u8], pos: &mut usize, radix: u32) -> (String, bool) {
    let mut digits = String::new();
    let mut saw_hash = false;
    while let Some(&b) = bytes.get(*pos) {
        if b == b'#' && !digits.is_empty() {
            saw_hash = true;
            digits.push('0');
        } else if (b as char).is_digit(radix) {
            // Digits may not resume after a `#` placeholder.
            if saw_hash {
                break;
            }
            digits.push(b as char);
        } else {
            break;
        }
        *pos += 1;
    }
    (digits, saw_hash)
}

fn finish_ratio(num: i64, den: i64, inexact_flag: bool, exact_override: Option<bool>) -> Option<Number> {
    let exact = match exact_override {
        Some(e) => e,
        None => !inexact_flag,
    };
    if num % den == 0 {
        let quotient = num / den;
        return Some(if exact {
            Number::Int(quotient)
        } else {
            Number::Float(quotient as f64)
        });
    }
    if exact_override == Some(true) {
        // No exact rationals in this subset.
        return None;
    }
    Some(Number::Float(num as f64 / den as f64))
}

/// Formats a number for `number->string`. Radix 2, 8, and 16 are integers
/// only; floats are base-10.
pub fn format_number(n: Number, radix: u32) -> EvalResult<String> {
    match (n, radix) {
        (Number::Int(i), 10) => Ok(i.to_string()),
        (Number::Float(x), 10) => Ok(ryu::Buffer::new().format(x).to_string()),
        (Number::Int(i), 2 | 8 | 16) => {
            let magnitude = i128::from(i).unsigned_abs();
            let body = match radix {
                2 => format!("{magnitude:b}"),
                8 => format!("{magnitude:o}"),
                _ => format!("{magnitude:x}"),
            };
            Ok(if i < 0 { format!("-{body}") } else { body })
        }
        (Number::Float(_), _) => Err(Error::new(
            ErrorKind::Domain,
            "inexact numbers can only be written in radix 10",
        )),
        _ => Err(Error::new(ErrorKind::Domain, "radix must be one of 2 8 10 16")),
    }
}
