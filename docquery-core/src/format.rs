//! Formatting helpers shared across UIs.

use chrono::{DateTime, TimeZone, Utc};

const SIZE_UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];

/// Format a byte count with base-1024 units and at most two decimals
/// (e.g., "0 Bytes", "512 Bytes", "1.5 KB").
pub fn format_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < SIZE_UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    let rounded = format!("{:.2}", value);
    let trimmed = rounded.trim_end_matches('0').trim_end_matches('.');
    format!("{} {}", trimmed, SIZE_UNITS[unit])
}

/// Format a timestamp as relative time (e.g., "2m ago").
pub fn format_relative_time(ts: DateTime<Utc>) -> String {
    let now = Utc::now();
    let duration = now.signed_duration_since(ts);

    if duration.num_seconds() < 0 {
        "just now".to_string()
    } else if duration.num_seconds() < 60 {
        format!("{}s ago", duration.num_seconds())
    } else if duration.num_minutes() < 60 {
        format!("{}m ago", duration.num_minutes())
    } else if duration.num_hours() < 24 {
        format!("{}h ago", duration.num_hours())
    } else if duration.num_days() < 7 {
        format!("{}d ago", duration.num_days())
    } else {
        ts.format("%b %d").to_string()
    }
}

/// Relative time for an epoch-millisecond timestamp (history entries)
pub fn format_relative_millis(millis: i64) -> String {
    match Utc.timestamp_millis_opt(millis).single() {
        Some(ts) => format_relative_time(ts),
        None => "-".to_string(),
    }
}

/// Latency in whole milliseconds (e.g., "412ms")
pub fn format_latency(ms: f64) -> String {
    format!("{:.0}ms", ms.max(0.0))
}

/// A `[0, 1]` similarity score as a percentage (e.g., "82%")
pub fn format_score(score: f64) -> String {
    format!("{:.0}%", (score * 100.0).clamp(0.0, 100.0))
}
