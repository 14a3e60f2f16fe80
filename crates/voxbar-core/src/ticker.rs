//! Elapsed-time formatting for the recording indicator.

/// Format a duration in seconds as `M:SS`, e.g. `0:05` or `1:15`.
pub fn format_ticker(secs: u64) -> String {
    format!("{}:{:02}", secs / 60, secs % 60)
}

/// Format elapsed time against a limit, e.g. `0:05 / 1:00`.
///
/// Elapsed time is clamped to the limit so the display never overshoots
/// the ceiling even if a tick lands late.
pub fn format_ticker_with_limit(elapsed_secs: u64, limit_secs: u64) -> String {
    format!(
        "{} / {}",
        format_ticker(elapsed_secs.min(limit_secs)),
        format_ticker(limit_secs)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_ticker() {
        assert_eq!(format_ticker(0), "0:00");
        assert_eq!(format_ticker(5), "0:05");
        assert_eq!(format_ticker(59), "0:59");
        assert_eq!(format_ticker(60), "1:00");
        assert_eq!(format_ticker(75), "1:15");
        assert_eq!(format_ticker(600), "10:00");
    }

    #[test]
    fn test_format_ticker_with_limit() {
        assert_eq!(format_ticker_with_limit(5, 60), "0:05 / 1:00");
        assert_eq!(format_ticker_with_limit(60, 60), "1:00 / 1:00");
    }

    #[test]
    fn test_ticker_clamps_to_limit() {
        assert_eq!(format_ticker_with_limit(75, 60), "1:00 / 1:00");
    }
}
