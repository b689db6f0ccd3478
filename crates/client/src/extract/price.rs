//! Price text parsing for Romanian storefronts.
//!
//! Listings write prices as `1.299,99 Lei`, `2 599 lei`, `1.299` (integer
//! part only) or `1299.99 RON`. The decimal separator is whichever of `,`/`.`
//! comes last when both appear; a lone `,` is decimal; a lone `.` followed by
//! exactly three digits is a thousands separator.

use std::sync::LazyLock;

use regex::Regex;

static NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d[\d.,\u{a0}\u{202f} ]*").expect("valid price regex"));

/// Parse the first number in `text` as a price. Non-positive results are `None`.
pub fn parse_price(text: &str) -> Option<f64> {
    let raw = NUMBER.find(text)?.as_str();
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit() || *c == '.' || *c == ',').collect();
    let digits = digits.trim_end_matches(['.', ',']);

    let normalized = match (digits.rfind(','), digits.rfind('.')) {
        (Some(c), Some(d)) => with_decimal_at(digits, c.max(d)),
        (Some(c), None) if digits.matches(',').count() == 1 => with_decimal_at(digits, c),
        (None, Some(d)) if digits.matches('.').count() == 1 && digits.len() - d - 1 != 3 => {
            with_decimal_at(digits, d)
        }
        _ => digits.replace(['.', ','], ""),
    };

    normalized.parse::<f64>().ok().filter(|p| p.is_finite() && *p > 0.0)
}

fn with_decimal_at(s: &str, idx: usize) -> String {
    let (int, frac) = s.split_at(idx);
    format!("{}.{}", int.replace(['.', ','], ""), &frac[1..])
}
