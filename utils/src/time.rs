//! Time formatting helpers.

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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_ttl_reads_as_hours() {
        assert_eq!(format_duration(6 * 3600), "6h 0m");
        assert_eq!(format_duration(90), "1m 30s");
        assert_eq!(format_duration(2 * 86400 + 3600), "2d 1h");
    }
}
