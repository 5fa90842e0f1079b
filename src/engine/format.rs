//! Display formatting: thousands use a plain space as group separator.

use num_format::{CustomFormat, Grouping, ToFormattedString};

fn space_grouping() -> Option<CustomFormat> {
    CustomFormat::builder()
        .grouping(Grouping::Standard)
        .separator(" ")
        .build()
        .ok()
}

/// `value` rounded to `decimals` places with the integer part grouped by
/// thousands, e.g. `1234567.891` → `"1 234 567.89"`.
pub fn grouped(value: f64, decimals: usize) -> String {
    let raw = format!("{:.*}", decimals, value.abs());
    let sign = if value < 0.0 && raw.chars().any(|c| matches!(c, '1'..='9')) {
        "-"
    } else {
        ""
    };
    let (int_part, frac_part) = match raw.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (raw.as_str(), None),
    };
    let int_grouped = match (int_part.parse::<u128>(), space_grouping()) {
        (Ok(n), Some(fmt)) => n.to_formatted_string(&fmt),
        _ => int_part.to_string(),
    };
    match frac_part {
        Some(f) => format!("{sign}{int_grouped}.{f}"),
        None => format!("{sign}{int_grouped}"),
    }
}

/// Tiered price display: under 1 keeps 4 decimals, under 100 keeps 2,
/// anything larger is a grouped integer.
pub fn price(symbol: &str, value: f64) -> String {
    if value < 1.0 {
        format!("{symbol}{value:.4}")
    } else if value < 100.0 {
        format!("{symbol}{value:.2}")
    } else {
        format!("{symbol}{}", grouped(value, 0))
    }
}
