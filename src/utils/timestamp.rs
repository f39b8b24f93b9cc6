//! Episode and timestamp parsing for subtitle records
//!
//! Episode titles carry a part tag such as `[P12]`; timestamps come as
//! `5m30s`, `05:30` or `30s`.

use regex::Regex;
use std::sync::LazyLock;

static BRACKET_EPISODE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[P(\d+)\]").expect("valid regex"));

static EPISODE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"P(\d+)").expect("valid regex"));

static TIMESTAMP_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:(\d+)[m:])?(\d+)s?").expect("valid regex"));

/// Episode number from a title, preferring a bracketed `[P<n>]` tag
pub fn episode_number(title: &str) -> Option<u32> {
    let caps = BRACKET_EPISODE_RE
        .captures(title)
        .or_else(|| EPISODE_RE.captures(title))?;
    caps.get(1)?.as_str().parse().ok()
}

/// Convert a subtitle timestamp to whole seconds
pub fn timestamp_to_seconds(timestamp: &str) -> Option<u32> {
    let caps = TIMESTAMP_RE.captures(timestamp.trim())?;
    let minutes: u32 = match caps.get(1) {
        Some(m) => m.as_str().parse().ok()?,
        None => 0,
    };
    let seconds: u32 = caps.get(2)?.as_str().parse().ok()?;
    minutes.checked_mul(60)?.checked_add(seconds)
}
