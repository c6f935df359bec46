// Utility helpers for parsing and basic statistics.
//
// This module centralizes all the "dirty" CSV/number/date handling so the
// rest of the code can assume clean, typed values.
use crate::types::GpsAvailability;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use num_format::{Locale, ToFormattedString};

/// Rendering used for a missing `Order Creation Date`.
pub const MISSING_DATE: &str = "NaT";

const DATE_FORMATS: [&str; 5] = ["%Y-%m-%d", "%Y/%m/%d", "%d-%m-%Y", "%m/%d/%Y", "%d-%b-%Y"];
const TIME_FORMATS: [&str; 2] = ["%H:%M:%S", "%H:%M"];

/// Parse a string-like value into `f64` while being forgiving about
/// formatting issues that are common in CSV exports (commas, spaces, text).
///
/// - Trims whitespace.
/// - Strips thousands separators like `","` before parsing.
/// - Accepts exponent notation (`1.2E+06`), as spreadsheet exports write it.
/// - Returns `None` for text and for `NaN`/`inf`.
pub fn parse_f64_safe(s: Option<&str>) -> Option<f64> {
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }
    let s = s.replace(",", "");
    s.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parse a date with an optional time-of-day. A bare date lands on midnight.
pub fn parse_date_safe(s: Option<&str>) -> Option<NaiveDateTime> {
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }
    for date_fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(s, date_fmt) {
            return Some(d.and_time(NaiveTime::MIN));
        }
        for sep in [" ", "T"] {
            for time_fmt in TIME_FORMATS {
                let fmt = format!("{}{}{}", date_fmt, sep, time_fmt);
                if let Ok(dt) = NaiveDateTime::parse_from_str(s, &fmt) {
                    return Some(dt);
                }
            }
        }
    }
    None
}

/// Only `yes` (any casing) marks GPS as available; `no` marks it unavailable.
pub fn parse_gps_flag(s: Option<&str>) -> GpsAvailability {
    match s.map(|v| v.trim().to_ascii_lowercase()).as_deref() {
        Some("yes") => GpsAvailability::Yes,
        Some("no") => GpsAvailability::No,
        _ => GpsAvailability::Unknown,
    }
}

/// `None` or whitespace-only cells become `None`; anything else is trimmed.
pub fn non_blank(s: Option<&str>) -> Option<String> {
    let s = s?.trim();
    if s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}

pub fn format_date(d: Option<NaiveDateTime>) -> String {
    match d {
        Some(dt) if dt.num_seconds_from_midnight() == 0 && dt.nanosecond() == 0 => {
            dt.format("%Y-%m-%d").to_string()
        }
        Some(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
        None => MISSING_DATE.to_string(),
    }
}

/// The value furthest from zero, keeping its sign.
pub fn largest_magnitude<I: IntoIterator<Item = f64>>(values: I) -> Option<f64> {
    values
        .into_iter()
        .reduce(|best, v| if v.abs() > best.abs() { v } else { best })
}

/// Arithmetic mean; `None` for an empty slice instead of a NaN.
pub fn mean(v: &[f64]) -> Option<f64> {
    if v.is_empty() {
        return None;
    }
    let sum: f64 = v.iter().copied().sum();
    Some(sum / v.len() as f64)
}

pub fn format_number(n: f64, decimals: usize) -> String {
    // Fixed decimals with locale-aware thousands separators (`1,234,567.89`).
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
    // Counts in console messages (e.g., `9,855 trips loaded`).
    n.to_formatted_string(&Locale::en)
}
