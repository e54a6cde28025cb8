// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde_json::Value;
use time::OffsetDateTime;
use time::macros::format_description;

const ERROR_SUMMARY_LIMIT: usize = 100;

/// Compact two-unit rendering of a second count. Negative input renders as `0s`.
pub fn duration(seconds: i64) -> String {
    if seconds < 0 {
        return "0s".to_owned();
    }
    match seconds {
        0..60 => format!("{seconds}s"),
        60..3_600 => format!("{}m{}s", seconds / 60, seconds % 60),
        3_600..86_400 => format!("{}h{}m", seconds / 3_600, (seconds % 3_600) / 60),
        _ => format!("{}d{}h", seconds / 86_400, (seconds % 86_400) / 3_600),
    }
}

pub fn bytes(value: i64) -> String {
    const UNIT: f64 = 1024.0;
    const SUFFIXES: [&str; 4] = ["KB", "MB", "GB", "TB"];

    if value < 1024 {
        return format!("{value} B");
    }

    let mut scaled = value as f64 / UNIT;
    let mut suffix = SUFFIXES[0];
    for next in &SUFFIXES[1..] {
        if scaled < UNIT {
            break;
        }
        scaled /= UNIT;
        suffix = next;
    }
    format!("{scaled:.1} {suffix}")
}

/// One-decimal magnitude rendering: `999`, `1.0K`, `55.6K`, `7.8M`, `1.0B`.
pub fn number(value: i64) -> String {
    let magnitude = value.unsigned_abs();
    let sign = if value < 0 { "-" } else { "" };
    match magnitude {
        0..1_000 => value.to_string(),
        1_000..1_000_000 => format!("{sign}{:.1}K", magnitude as f64 / 1e3),
        1_000_000..1_000_000_000 => format!("{sign}{:.1}M", magnitude as f64 / 1e6),
        _ => format!("{sign}{:.1}B", magnitude as f64 / 1e9),
    }
}

/// At most four columns: one decimal while the scaled value is a single digit,
/// the floored integer after that.
pub fn short_number(value: i64) -> String {
    let magnitude = value.unsigned_abs();
    let sign = if value < 0 { "-" } else { "" };
    let (divisor, suffix) = match magnitude {
        0..1_000 => return value.to_string(),
        1_000..1_000_000 => (1_000_u64, 'K'),
        1_000_000..1_000_000_000 => (1_000_000, 'M'),
        _ => (1_000_000_000, 'B'),
    };

    let whole = magnitude / divisor;
    if whole < 10 {
        format!("{sign}{:.1}{suffix}", magnitude as f64 / divisor as f64)
    } else {
        format!("{sign}{whole}{suffix}")
    }
}

pub fn args(values: &[Value]) -> String {
    values
        .iter()
        .map(|value| serde_json::to_string(value).unwrap_or_else(|_| "{}".to_owned()))
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn error_summary(class: &str, message: &str) -> String {
    if class.is_empty() && message.is_empty() {
        return String::new();
    }

    let summary = format!("{class}: {message}");
    if summary.chars().count() <= ERROR_SUMMARY_LIMIT {
        return summary;
    }
    let mut truncated = summary
        .chars()
        .take(ERROR_SUMMARY_LIMIT - 3)
        .collect::<String>();
    truncated.push_str("...");
    truncated
}

pub fn timestamp(unix_seconds: i64) -> String {
    let Ok(at) = OffsetDateTime::from_unix_timestamp(unix_seconds) else {
        return unix_seconds.to_string();
    };
    at.format(format_description!(
        "[year]-[month]-[day] [hour]:[minute]:[second] UTC"
    ))
    .unwrap_or_else(|_| unix_seconds.to_string())
}

pub fn unix_now() -> i64 {
    OffsetDateTime::now_utc().unix_timestamp()
}
