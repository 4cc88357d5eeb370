//! Time formatting and backoff helpers.

use std::time::Duration;

/// Format a duration in seconds to a human-readable string.
pub fn format_duration(secs: u64) -> String {
    if secs < 60 {
        format!("{}s", secs)
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else if secs < 86400 {
        format!("{}h {}m", secs / 3600, (secs % 3600) / 60)
    } else {
        format!("{}d {}h", secs / 86400, (secs % 86400) / 3600)
    }
}

/// Exponential backoff for the given zero-based retry, clamped to `[min, max]`.
pub fn backoff_delay(retry: u32, min: Duration, max: Duration) -> Duration {
    let factor = 1u32.checked_shl(retry).unwrap_or(u32::MAX);
    min.checked_mul(factor).unwrap_or(max).clamp(min, max.max(min))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_each_magnitude() {
        assert_eq!(format_duration(42), "42s");
        assert_eq!(format_duration(300), "5m 0s");
        assert_eq!(format_duration(3_660), "1h 1m");
        assert_eq!(format_duration(90_000), "1d 1h");
    }

    #[test]
    fn backoff_doubles_until_capped() {
        let min = Duration::from_millis(100);
        let max = Duration::from_secs(1);
        assert_eq!(backoff_delay(0, min, max), Duration::from_millis(100));
        assert_eq!(backoff_delay(1, min, max), Duration::from_millis(200));
        assert_eq!(backoff_delay(3, min, max), Duration::from_millis(800));
        assert_eq!(backoff_delay(4, min, max), max);
        assert_eq!(backoff_delay(40, min, max), max);
    }
}
