//! Calendar buckets and timestamp rendering.

use chrono::{DateTime, Datelike, SecondsFormat, Utc};
use stakeclaim_types::Timestamp;

/// Buckets are counted from this year.
const BASE_YEAR: i64 = 2020;

/// Month, quarter and year of an instant (UTC), counted from 2020.
///
/// January 2020 is month 1 and quarter 1; January 2021 is month 13 and
/// quarter 5; 2020 is year 0.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CalendarBucket {
    pub month: u32,
    pub quarter: u32,
    pub year: u32,
}

impl CalendarBucket {
    pub fn of(ts: Timestamp) -> Self {
        let date = datetime(ts);
        let years = date.year() as i64 - BASE_YEAR;
        let month = date.month() as i64;
        let quarter = (month + 2) / 3;
        Self {
            month: clamp(month + 12 * years),
            quarter: clamp(quarter + 4 * years),
            year: clamp(years),
        }
    }
}

fn clamp(v: i64) -> u32 {
    u32::try_from(v.max(0)).unwrap_or(u32::MAX)
}

fn datetime(ts: Timestamp) -> DateTime<Utc> {
    i64::try_from(ts.as_secs())
        .ok()
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// RFC 3339 in UTC with millisecond precision, e.g. `2024-03-01T06:00:00.000Z`.
pub fn to_rfc3339(ts: Timestamp) -> String {
    datetime(ts).to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::*;

    // 2020-01-01T00:00:00Z
    const JAN_2020: u64 = 1_577_836_800;
    // 2024-03-15T12:00:00Z
    const MAR_2024: u64 = 1_710_504_000;
    // 2025-12-31T23:59:59Z
    const END_2025: u64 = 1_767_225_599;

    #[test]
    fn first_month_of_base_year() {
        let b = CalendarBucket::of(Timestamp::new(JAN_2020));
        assert_eq!(b, CalendarBucket { month: 1, quarter: 1, year: 0 });
    }

    #[test]
    fn march_2024() {
        let b = CalendarBucket::of(Timestamp::new(MAR_2024));
        assert_eq!(b, CalendarBucket { month: 51, quarter: 17, year: 4 });
    }

    #[test]
    fn last_second_of_2025() {
        let b = CalendarBucket::of(Timestamp::new(END_2025));
        assert_eq!(b, CalendarBucket { month: 72, quarter: 24, year: 5 });
    }

    #[test]
    fn before_base_year_clamps_to_zero() {
        let b = CalendarBucket::of(Timestamp::new(0));
        assert_eq!(b, CalendarBucket { month: 0, quarter: 0, year: 0 });
    }

    #[test]
    fn renders_rfc3339_millis() {
        assert_eq!(to_rfc3339(Timestamp::new(MAR_2024)), "2024-03-15T12:00:00.000Z");
    }
}
