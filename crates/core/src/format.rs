//! Display formatting shared by exports, print views and lookup responses.

use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};

/// Placeholder for missing values in exported tables.
pub const NOT_AVAILABLE: &str = "N/A";

/// Two decimals with thousands separators: `1234.5` -> `"1,234.50"`.
///
/// Midpoints round away from zero.
pub fn format_amount(value: Decimal) -> String {
    let rounded = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let negative = rounded.is_sign_negative() && !rounded.is_zero();
    let text = format!("{:.2}", rounded.abs());
    let (int_part, frac_part) = text.split_once('.').unwrap_or((text.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if negative { "-" } else { "" };
    format!("{sign}{grouped}.{frac_part}")
}

/// Like [`format_amount`] but renders `None` as [`NOT_AVAILABLE`].
pub fn format_optional_amount(value: Option<Decimal>) -> String {
    value.map_or_else(|| NOT_AVAILABLE.to_string(), format_amount)
}

/// `YYYY-MM-DD`, or [`NOT_AVAILABLE`].
pub fn format_optional_date(value: Option<NaiveDate>) -> String {
    value.map_or_else(
        || NOT_AVAILABLE.to_string(),
        |d| d.format("%Y-%m-%d").to_string(),
    )
}

/// Text cell, with empty and missing values shown as [`NOT_AVAILABLE`].
pub fn or_not_available(value: Option<&str>) -> String {
    match value {
        Some(v) if !v.trim().is_empty() => v.to_string(),
        _ => NOT_AVAILABLE.to_string(),
    }
}

/// Timestamp printed under export titles, e.g. `03/07/2025, 4:05:09 PM`.
pub fn generated_stamp<Tz>(at: &chrono::DateTime<Tz>) -> String
where
    Tz: chrono::TimeZone,
    Tz::Offset: std::fmt::Display,
{
    at.format("%m/%d/%Y, %-I:%M:%S %p").to_string()
}
