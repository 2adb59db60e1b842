//! Cell and statistic formatting.

use unicode_width::UnicodeWidthStr;

/// Fractional digits for fixed-point reals.
pub const REAL_FRACTION_DIGITS: usize = 15;

/// Values below this (negatives included) use general notation.
const GENERAL_BELOW: f64 = 0.000_01;
/// Values above this use general notation.
const GENERAL_ABOVE: f64 = 999_999_999_999.0;
/// Significant digits in general notation.
const GENERAL_PRECISION: i32 = 4;

/// Integer with thousands separators (`-1,234,567`).
pub fn format_int(value: i64) -> String {
    let digits = group_thousands(&value.unsigned_abs().to_string());
    if value < 0 {
        format!("-{digits}")
    } else {
        digits
    }
}

/// Integer as plain digits, used for excluded columns such as keys.
pub fn format_int_plain(value: i64) -> String {
    value.to_string()
}

/// Real number: `0`, general notation for values below `0.00001` (so every
/// negative) or above `999,999,999,999`, otherwise fixed point with thousands
/// separators.
pub fn format_real(value: f64) -> String {
    if value == 0.0 {
        return "0".to_string();
    }
    if !value.is_finite() {
        return value.to_string();
    }
    if value < GENERAL_BELOW || value > GENERAL_ABOVE {
        return format_general(value);
    }

    let magnitude = value.abs();
    let fixed = format!("{:.*}", REAL_FRACTION_DIGITS, magnitude);
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), ""));
    let sign = if value < 0.0 { "-" } else { "" };
    if frac_part.is_empty() {
        format!("{sign}{}", group_thousands(int_part))
    } else {
        format!("{sign}{}.{frac_part}", group_thousands(int_part))
    }
}

/// Four significant digits, like C's `%.4g` without trailing-zero removal:
/// decimal when the rounded exponent is in `-4..4`, scientific otherwise.
fn format_general(value: f64) -> String {
    let exp = rounded_exponent(value);
    if (-4..GENERAL_PRECISION).contains(&exp) {
        let decimals = (GENERAL_PRECISION - 1 - exp) as usize;
        format!("{value:.decimals$}")
    } else {
        format_scientific(value)
    }
}

/// Decimal exponent of `value` after rounding to four significant digits.
fn rounded_exponent(value: f64) -> i32 {
    let raw = format!("{:.*e}", (GENERAL_PRECISION - 1) as usize, value);
    raw.split_once('e')
        .and_then(|(_, exp)| exp.parse().ok())
        .unwrap_or(0)
}

/// Four significant digits with a signed two-digit exponent (`1.235e+12`).
fn format_scientific(value: f64) -> String {
    let raw = format!("{value:.3e}");
    let Some((mantissa, exponent)) = raw.split_once('e') else {
        return raw;
    };
    let exp: i32 = exponent.parse().unwrap_or(0);
    let sign = if exp < 0 { '-' } else { '+' };
    format!("{mantissa}e{sign}{:02}", exp.unsigned_abs())
}

/// Scale factor as shown in the scale row (`1.0`, `2.5`).
pub fn format_scale(factor: f64) -> String {
    if factor.fract() == 0.0 && factor.abs() < 1e15 {
        format!("{factor:.1}")
    } else {
        factor.to_string()
    }
}

fn group_thousands(digits: &str) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Terminal display width of a string.
pub fn display_width(s: &str) -> usize {
    UnicodeWidthStr::width(s)
}

/// Left-align `s` in a field of `width` display cells.
pub fn pad_right(s: &str, width: usize) -> String {
    let used = display_width(s);
    let mut out = String::with_capacity(s.len() + width.saturating_sub(used));
    out.push_str(s);
    out.extend(std::iter::repeat_n(' ', width.saturating_sub(used)));
    out
}
