//! Uptime text conversion.

use std::sync::LazyLock;

use regex::Regex;

static RE_UPTIME_PART: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d+)\s+(year|week|day|hour|minute|second)s?").expect("valid uptime regex")
});

const MINUTE: u64 = 60;
const HOUR: u64 = 60 * MINUTE;
const DAY: u64 = 24 * HOUR;
const WEEK: u64 = 7 * DAY;
const YEAR: u64 = 365 * DAY;

/// Convert `1 year, 2 weeks, 4 days, 18 hours, 59 minutes` to seconds.
///
/// Returns `None` when the text contains no recognizable unit.
pub fn uptime_seconds(text: &str) -> Option<u64> {
    let mut total = 0u64;
    let mut found = false;

    for caps in RE_UPTIME_PART.captures_iter(text) {
        let Ok(count) = caps[1].parse::<u64>() else {
            continue;
        };
        let unit = match &caps[2] {
            "year" => YEAR,
            "week" => WEEK,
            "day" => DAY,
            "hour" => HOUR,
            "minute" => MINUTE,
            _ => 1,
        };
        total = total.saturating_add(count.saturating_mul(unit));
        found = true;
    }

    found.then_some(total)
}

/// Format seconds as `DD:HH:MM:SS`.
pub fn uptime_string(seconds: u64) -> String {
    format!(
        "{:02}:{:02}:{:02}:{:02}",
        seconds / DAY,
        seconds % DAY / HOUR,
        seconds % HOUR / MINUTE,
        seconds % MINUTE
    )
}
