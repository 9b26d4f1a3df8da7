//! Timestamp and exec-time normalisation for GmesLog.
//!
//! GMES logs stamp lines as `dd-MM-yyyy HH:mm:ss[.fff]` and report
//! durations in several shapes. Everything here degrades to pass-through:
//! an input that cannot be understood comes back unchanged.

use std::sync::OnceLock;

use chrono::{DateTime, NaiveDateTime, Timelike};
use regex::Regex;

/// Generic date-time layouts tried after the native GMES layout fails.
/// `%.f` also accepts input without a fractional part.
const GENERIC_LAYOUTS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y/%m/%d %H:%M:%S%.f",
    "%d/%m/%Y %H:%M:%S%.f",
    "%d.%m.%Y %H:%M:%S%.f",
    "%Y%m%d %H:%M:%S%.f",
];

fn gmes_timestamp_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(\d{2}-\d{2}-\d{4} \d{2}:\d{2}:\d{2})(?:\.(\d{1,9}))?$")
            .expect("valid gmes timestamp regex")
    })
}

fn trailing_time_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(\d{1,2}:\d{2}:\d{2}(?:\.\d+)?)\s*$").expect("valid trailing time regex")
    })
}

fn clock_duration_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(\d+):(\d{1,2}):(\d{1,2})(\.\d+)?$").expect("valid clock duration regex")
    })
}

fn suffixed_seconds_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\d+(?:\.\d+)?)\s*s$").expect("valid seconds regex"))
}

fn bare_number_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d+(?:\.\d+)?$").expect("valid number regex"))
}

/// Parse the native GMES layout, returning the date-time and the
/// millisecond text (three digits) when the input carried a fraction.
fn parse_gmes(input: &str) -> Option<(NaiveDateTime, Option<String>)> {
    let caps = gmes_timestamp_re().captures(input)?;
    let base = NaiveDateTime::parse_from_str(&caps[1], "%d-%m-%Y %H:%M:%S").ok()?;
    let millis = caps.get(2).map(|m| {
        let mut digits: String = m.as_str().chars().take(3).collect();
        while digits.len() < 3 {
            digits.push('0');
        }
        digits
    });
    Some((base, millis))
}

/// Try the generic layouts and RFC 3339.
fn parse_generic(input: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Some(dt.naive_local());
    }
    GENERIC_LAYOUTS
        .iter()
        .find_map(|layout| NaiveDateTime::parse_from_str(input, layout).ok())
}

/// Convert a log timestamp to wall-clock `HH:mm:ss` or `HH:mm:ss.fff`.
///
/// Milliseconds are kept when the input has a fractional part. Falls back
/// to a generic date-time parse, then to slicing a trailing `HH:mm:ss`
/// out of the text, and finally returns the input unchanged.
pub fn normalize_timestamp(input: &str) -> String {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return input.to_string();
    }

    if let Some((dt, millis)) = parse_gmes(trimmed) {
        let clock = dt.format("%H:%M:%S").to_string();
        return match millis {
            Some(ms) => format!("{clock}.{ms}"),
            None => clock,
        };
    }

    if let Some(dt) = parse_generic(trimmed) {
        return if dt.nanosecond() != 0 {
            dt.format("%H:%M:%S%.3f").to_string()
        } else {
            dt.format("%H:%M:%S").to_string()
        };
    }

    if let Some(caps) = trailing_time_re().captures(trimmed) {
        return caps[1].to_string();
    }

    input.to_string()
}

/// Convert a log timestamp to the full `yyyy-MM-dd HH:mm:ss` form used by
/// session summaries. Unparseable input is returned unchanged.
pub fn normalize_full_timestamp(input: &str) -> String {
    let trimmed = input.trim();
    let parsed = parse_gmes(trimmed)
        .map(|(dt, _)| dt)
        .or_else(|| parse_generic(trimmed));
    match parsed {
        Some(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
        None => input.to_string(),
    }
}

/// Normalise an execution-time value to `SS[.fraction]`.
///
/// - `00:00:01.500` → `01.500` (hours and minutes are dropped)
/// - `1.234s` → `1.234`
/// - `0.123` → `0.123`
///
/// Anything else is returned verbatim.
pub fn normalize_exec_time(input: &str) -> String {
    let trimmed = input.trim();

    if let Some(caps) = clock_duration_re().captures(trimmed) {
        let secs: u32 = caps[3].parse().unwrap_or(0);
        let fraction = caps.get(4).map_or("", |m| m.as_str());
        return format!("{secs:02}{fraction}");
    }

    if let Some(caps) = suffixed_seconds_re().captures(trimmed) {
        return caps[1].to_string();
    }

    if bare_number_re().is_match(trimmed) {
        return trimmed.to_string();
    }

    input.to_string()
}

/// Numeric seconds of a normalised exec-time value, if it is numeric.
pub fn exec_time_seconds(exec_time: &str) -> Option<f64> {
    let normalized = normalize_exec_time(exec_time);
    if bare_number_re().is_match(&normalized) {
        normalized.parse().ok()
    } else {
        None
    }
}

/// Format a `std::time::Duration` into a human-readable string.
///
/// Used when logging how long a parse took.
/// Examples: `0.3s`, `1.2s`, `45.6s`.
pub fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs_f64();
    if secs < 0.01 {
        format!("{:.1}ms", secs * 1000.0)
    } else if secs < 60.0 {
        format!("{secs:.1}s")
    } else {
        let mins = secs / 60.0;
        format!("{mins:.1}m")
    }
}
