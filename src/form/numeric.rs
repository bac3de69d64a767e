//! Browser-compatible numeric parsing for form fields
//!
//! Field values are entered as free text. The accepted grammar matches what
//! the wallet's web front end has always accepted, so that a form filled in
//! one client validates identically in the other:
//! - [`to_number`] is the strict whole-string conversion (`Number(text)`)
//! - [`parse_float`] reads the longest leading float (`parseFloat(text)`)
//! - [`parse_int`] reads the leading decimal integer (`parseInt(text, 10)`)

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref DECIMAL: Regex =
        Regex::new(r"^[+-]?(?:\d+\.?\d*|\.\d+)(?:[eE][+-]?\d+)?$").unwrap();
    static ref INFINITY: Regex = Regex::new(r"^[+-]?Infinity$").unwrap();
    static ref RADIX: Regex = Regex::new(r"^0(?:[xX][0-9a-fA-F]+|[oO][0-7]+|[bB][01]+)$").unwrap();
    static ref FLOAT_PREFIX: Regex =
        Regex::new(r"^[+-]?(?:Infinity|(?:\d+\.?\d*|\.\d+)(?:[eE][+-]?\d+)?)").unwrap();
    static ref INT_PREFIX: Regex = Regex::new(r"^[+-]?\d+").unwrap();
    static ref DECIMAL_PARTS: Regex =
        Regex::new(r"^\+?(\d*)(?:\.(\d*))?(?:[eE]([+-]?\d+))?$").unwrap();
}

/// Largest exponent considered; anything beyond saturates either way
const MAX_EXPONENT: i64 = 1_000;

/// Strict conversion of the whole (trimmed) text to a number.
///
/// Returns `None` where the browser would produce `NaN`. Blank text converts to zero.
pub fn to_number(text: &str) -> Option<f64> {
    let trimmed = text.trim();

    if trimmed.is_empty() {
        return Some(0.0);
    }

    if DECIMAL.is_match(trimmed) {
        return trimmed.parse::<f64>().ok();
    }

    if INFINITY.is_match(trimmed) {
        return Some(if trimmed.starts_with('-') {
            f64::NEG_INFINITY
        } else {
            f64::INFINITY
        });
    }

    if RADIX.is_match(trimmed) {
        let (radix, digits) = match &trimmed[..2] {
            "0x" | "0X" => (16, &trimmed[2..]),
            "0o" | "0O" => (8, &trimmed[2..]),
            _ => (2, &trimmed[2..]),
        };
        return u128::from_str_radix(digits, radix).ok().map(|v| v as f64);
    }

    None
}

/// Check if the text is numeric under [`to_number`]
pub fn is_numeric(text: &str) -> bool {
    to_number(text).is_some()
}

/// Longest leading float, ignoring leading whitespace and any trailing garbage
pub fn parse_float(text: &str) -> Option<f64> {
    let trimmed = text.trim_start();
    let found = FLOAT_PREFIX.find(trimmed)?.as_str();

    match found.trim_start_matches(['+', '-']) {
        "Infinity" => Some(if found.starts_with('-') {
            f64::NEG_INFINITY
        } else {
            f64::INFINITY
        }),
        _ => found.parse::<f64>().ok(),
    }
}

/// Leading base-10 integer, ignoring leading whitespace and any trailing garbage
pub fn parse_int(text: &str) -> Option<f64> {
    let trimmed = text.trim_start();
    let found = INT_PREFIX.find(trimmed)?.as_str();
    found.parse::<f64>().ok()
}

/// Fixed two-decimal rendering (`value.toFixed(2)`).
///
/// The exact binary value is rounded, with ties going away from zero, so
/// `0.125` gives `"0.13"` while `1.005` (stored just below) gives `"1.00"`.
pub fn to_fixed_2(value: f64) -> String {
    if !value.is_finite() || value.abs() >= 1e21 {
        return value.to_string();
    }

    // Every finite double has a terminating decimal expansion within 1100 places
    let exact = format!("{:.1100}", value.abs());
    let (int, frac) = exact.split_once('.').unwrap_or((exact.as_str(), ""));
    let frac = frac.as_bytes();
    let digit = |i: usize| frac.get(i).map_or(0u128, |b| u128::from(b - b'0'));

    let mut hundredths = int.parse::<u128>().unwrap_or(0) * 100 + digit(0) * 10 + digit(1);
    if digit(2) >= 5 {
        hundredths += 1;
    }

    let sign = if value < 0.0 { "-" } else { "" };
    format!("{}{}.{:02}", sign, hundredths / 100, hundredths % 100)
}

/// Exact value of a non-negative decimal literal in units of `10^-scale`,
/// rounded up to the next whole unit and saturating at `u64::MAX`.
///
/// Returns `None` for anything that is not a plain decimal literal
/// (negative values, `Infinity`, hex/octal/binary).
pub fn decimal_units_ceil(text: &str, scale: u32) -> Option<u64> {
    let trimmed = text.trim();
    if !DECIMAL.is_match(trimmed) {
        return None;
    }
    let caps = DECIMAL_PARTS.captures(trimmed)?;

    let int = caps.get(1).map_or("", |m| m.as_str());
    let frac = caps.get(2).map_or("", |m| m.as_str());
    let exponent = match caps.get(3) {
        Some(m) => {
            let e = m.as_str();
            e.parse::<i64>().unwrap_or(if e.starts_with('-') {
                -MAX_EXPONENT
            } else {
                MAX_EXPONENT
            })
        }
        None => 0,
    }
    .clamp(-MAX_EXPONENT, MAX_EXPONENT);

    let digits = format!("{}{}", int, frac);
    let digits = digits.trim_start_matches('0');
    if digits.is_empty() {
        return Some(0);
    }

    let shift = exponent + i64::from(scale) - frac.len() as i64;
    let units = if shift >= 0 {
        // u128 holds at most 38 decimal digits
        if digits.len() as i64 + shift > 38 {
            return Some(u64::MAX);
        }
        digits.parse::<u128>().ok()? * 10u128.pow(shift as u32)
    } else {
        let cut = (-shift) as usize;
        if cut >= digits.len() {
            1
        } else {
            let (whole, rest) = digits.split_at(digits.len() - cut);
            if whole.len() > 38 {
                return Some(u64::MAX);
            }
            let whole = whole.parse::<u128>().ok()?;
            if rest.bytes().any(|b| b != b'0') {
                whole + 1
            } else {
                whole
            }
        }
    };

    Some(u64::try_from(units).unwrap_or(u64::MAX))
}
