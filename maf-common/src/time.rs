//! Timestamp utilities

use chrono::{DateTime, Duration, Utc};

/// Longest configurable age: 100 years, far beyond any useful cache window
/// and well inside the range `DateTime<Utc>` arithmetic can represent.
pub const MAX_AGE_HOURS: u64 = 24 * 365 * 100;

/// Get current UTC timestamp
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Convert whole hours to a chrono duration, saturating at `MAX_AGE_HOURS`
pub fn hours(hours: u64) -> Duration {
    let capped = hours.min(MAX_AGE_HOURS) as i64;
    Duration::try_hours(capped).unwrap_or(Duration::zero())
}

/// `now - max_age`, clamped to the earliest representable time
pub fn cutoff(now: DateTime<Utc>, max_age: Duration) -> DateTime<Utc> {
    now.checked_sub_signed(max_age)
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

/// Whether a cached calculation is missing or older than `max_age` at `now`
///
/// A timestamp exactly on the cutoff is still considered fresh.
pub fn is_stale(last_calc: Option<DateTime<Utc>>, now: DateTime<Utc>, max_age: Duration) -> bool {
    match last_calc {
        None => true,
        Some(at) => at < cutoff(now, max_age),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn noon() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2015, 12, 9, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_now_returns_recent_timestamp() {
        let timestamp = now();
        assert!(timestamp.timestamp() > 946_684_800); // 2000-01-01 00:00:00 UTC
        assert!(timestamp.timestamp() < 4_102_444_800); // 2100-01-01 00:00:00 UTC
    }

    #[test]
    fn test_missing_calculation_is_stale() {
        assert!(is_stale(None, noon(), hours(24)));
    }

    #[test]
    fn test_recent_calculation_is_fresh() {
        let last = noon() - Duration::hours(23);
        assert!(!is_stale(Some(last), noon(), hours(24)));
    }

    #[test]
    fn test_old_calculation_is_stale() {
        let last = noon() - Duration::hours(25);
        assert!(is_stale(Some(last), noon(), hours(24)));
    }

    #[test]
    fn test_cutoff_boundary_is_fresh() {
        let last = noon() - Duration::hours(24);
        assert!(!is_stale(Some(last), noon(), hours(24)));
    }

    #[test]
    fn test_hours_conversion() {
        assert_eq!(hours(48), Duration::days(2));
        assert_eq!(hours(0), Duration::zero());
    }

    #[test]
    fn test_huge_hours_saturate() {
        assert_eq!(hours(u64::MAX), hours(MAX_AGE_HOURS));
        assert_eq!(hours(u64::MAX / 4), hours(MAX_AGE_HOURS));
        assert!(hours(u64::MAX) > Duration::days(365 * 99));
    }

    #[test]
    fn test_cutoff_never_overflows() {
        let max = Duration::try_milliseconds(i64::MAX).unwrap();
        assert_eq!(cutoff(noon(), max), DateTime::<Utc>::MIN_UTC);
        assert_eq!(cutoff(noon(), hours(24)), noon() - Duration::days(1));

        // Anything ever calculated is fresh under an unbounded age
        let ancient = Utc.with_ymd_and_hms(1970, 1, 1, 0, 0, 0).unwrap();
        assert!(!is_stale(Some(ancient), noon(), max));
        assert!(!is_stale(Some(ancient), noon(), hours(u64::MAX)));
    }
}
