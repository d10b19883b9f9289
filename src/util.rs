// Utility helpers for parsing, rounding and formatting.
//
// The CSV sources carry every number as text, so this module owns the
// lenient conversions and the rest of the code can assume typed values.
use chrono::Utc;
use num_format::{Locale, ToFormattedString};
use std::sync::atomic::{AtomicI64, Ordering};

/// Parse the leading integer of a text field.
///
/// - Accepts `Option<&str>` so callers can pass optional CSV columns through.
/// - Trims whitespace and honours a single leading sign.
/// - Stops at the first non-digit, so `"12.7"` is `12` and `"42abc"` is `42`.
/// - Anything without leading digits (empty, `"n/a"`, missing) is `0`.
pub fn parse_int_or_zero(s: Option<&str>) -> i64 {
    let Some(s) = s else {
        return 0;
    };
    let s = s.trim();
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    let value = digits[..end].parse::<i64>().unwrap_or(0);
    if negative {
        -value
    } else {
        value
    }
}

/// Trimmed text value, or `fallback` when the column is missing or blank.
pub fn text_or(s: Option<&str>, fallback: &str) -> String {
    match s.map(str::trim) {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => fallback.to_string(),
    }
}

/// Composite `YYYY-MM` key. Zero padding keeps lexicographic order equal to
/// chronological order.
pub fn month_key(year: i64, month: i64) -> String {
    format!("{}-{:02}", year, month)
}

pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    let scaled = value * factor;
    // Values this large carry no fractional digits anyway.
    if !scaled.is_finite() {
        return value;
    }
    scaled.round() / factor
}

/// `part / whole * 100`, rounded to two decimals; `0` when `whole` is zero.
pub fn percentage(part: i64, whole: i64) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    round_to(part as f64 / whole as f64 * 100.0, 2)
}

static LAST_TIMESTAMP: AtomicI64 = AtomicI64::new(0);

/// Current epoch milliseconds, strictly greater than any value previously
/// returned in this process.
pub fn next_timestamp_millis() -> i64 {
    let now = Utc::now().timestamp_millis();
    let mut last = LAST_TIMESTAMP.load(Ordering::Relaxed);
    loop {
        let next = now.max(last + 1);
        match LAST_TIMESTAMP.compare_exchange_weak(last, next, Ordering::Relaxed, Ordering::Relaxed)
        {
            Ok(_) => return next,
            Err(actual) => last = actual,
        }
    }
}

pub fn format_number(n: f64, decimals: usize) -> String {
    // Fixed decimals plus locale-aware thousands separators (`1,234,567.89`).
    let neg = n.is_sign_negative() && n != 0.0;
    let s = format!("{:.*}", decimals, n.abs());
    let mut parts = s.split('.');
    let int_part = parts.next().unwrap_or("0");
    let frac_part = parts.next();
    let int_val: i64 = int_part.parse().unwrap_or(0);
    let mut res = int_val.to_formatted_string(&Locale::en);
    if let Some(frac) = frac_part {
        res.push('.');
        res.push_str(frac);
    }
    if neg {
        format!("-{}", res)
    } else {
        res
    }
}

pub fn format_int<T>(n: T) -> String
where
    T: ToFormattedString,
{
    n.to_formatted_string(&Locale::en)
}
