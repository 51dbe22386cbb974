//! Half-open time intervals with timezone-aware boundaries.
//!
//! Every timestamp entering the scheduling core must carry an explicit
//! UTC offset. Naive timestamps are localized once, at the parsing
//! boundary in this module, using the configured timezone, never
//! guessed deeper in.

use chrono::{DateTime, Duration, FixedOffset, NaiveDateTime, TimeZone};
use chrono_tz::Tz;
use serde::Serialize;

/// Failures surfaced by the scheduling core. These are never coerced
/// into a default availability judgment.
#[derive(Debug, thiserror::Error)]
pub enum ScheduleError {
    #[error("invalid interval: {0}")]
    InvalidInterval(String),

    #[error("timestamp is missing a timezone offset: {0}")]
    MissingTimezone(String),

    #[error("calendar unavailable: {0}")]
    CalendarUnavailable(String),

    #[error("{name} out of range: got {value}, expected {bounds}")]
    OutOfRange {
        name: &'static str,
        value: i64,
        bounds: &'static str,
    },
}

/// A half-open interval `[start, end)`. Invariant: `start < end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimeInterval {
    pub start: DateTime<FixedOffset>,
    pub end: DateTime<FixedOffset>,
}

impl TimeInterval {
    pub fn new(
        start: DateTime<FixedOffset>,
        end: DateTime<FixedOffset>,
    ) -> Result<Self, ScheduleError> {
        if start >= end {
            return Err(ScheduleError::InvalidInterval(format!(
                "start {} is not before end {}",
                start.to_rfc3339(),
                end.to_rfc3339()
            )));
        }
        Ok(Self { start, end })
    }

    /// Build an interval from a start plus a duration in minutes.
    pub fn starting_at(
        start: DateTime<FixedOffset>,
        duration_minutes: i64,
    ) -> Result<Self, ScheduleError> {
        if duration_minutes <= 0 {
            return Err(ScheduleError::InvalidInterval(format!(
                "duration must be positive, got {} minutes",
                duration_minutes
            )));
        }
        Self::new(start, start + Duration::minutes(duration_minutes))
    }

    /// Half-open overlap: `[s1, e1)` and `[s2, e2)` overlap iff
    /// `s1 < e2 && s2 < e1`. An interval ending exactly when another
    /// starts does not overlap it.
    pub fn overlaps(&self, other: &TimeInterval) -> bool {
        self.start < other.end && other.start < self.end
    }

    pub fn duration_minutes(&self) -> i64 {
        (self.end - self.start).num_minutes()
    }
}

/// Parse a timestamp string into an offset-carrying datetime.
///
/// RFC3339 strings with an explicit offset are taken as-is. Naive
/// strings (`2025-03-10T14:00:00` or with a space separator) are
/// localized into `tz` when one is configured, otherwise rejected with
/// `MissingTimezone`.
pub fn parse_timestamp(s: &str, tz: Option<Tz>) -> Result<DateTime<FixedOffset>, ScheduleError> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt);
    }

    let naive = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S"))
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M"))
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M"))
        .map_err(|_| ScheduleError::InvalidInterval(format!("unparseable timestamp: {}", s)))?;

    let tz = tz.ok_or_else(|| ScheduleError::MissingTimezone(s.to_string()))?;
    localize(tz, naive).ok_or_else(|| {
        // Nonexistent local time, e.g. inside a DST spring-forward gap.
        ScheduleError::InvalidInterval(format!("{} does not exist in {}", s, tz))
    })
}

/// Resolve a naive local time in `tz` to a fixed-offset instant,
/// taking the earlier interpretation when DST makes it ambiguous.
pub(crate) fn localize(tz: Tz, naive: NaiveDateTime) -> Option<DateTime<FixedOffset>> {
    tz.from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.fixed_offset())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(s: &str) -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339(s).unwrap()
    }

    fn interval(start: &str, end: &str) -> TimeInterval {
        TimeInterval::new(ts(start), ts(end)).unwrap()
    }

    #[test]
    fn test_rejects_backwards_interval() {
        let result = TimeInterval::new(
            ts("2025-03-10T15:00:00+05:30"),
            ts("2025-03-10T14:00:00+05:30"),
        );
        assert!(matches!(result, Err(ScheduleError::InvalidInterval(_))));
    }

    #[test]
    fn test_rejects_zero_duration() {
        let at = ts("2025-03-10T14:00:00+05:30");
        assert!(matches!(
            TimeInterval::new(at, at),
            Err(ScheduleError::InvalidInterval(_))
        ));
        assert!(matches!(
            TimeInterval::starting_at(at, 0),
            Err(ScheduleError::InvalidInterval(_))
        ));
        assert!(matches!(
            TimeInterval::starting_at(at, -30),
            Err(ScheduleError::InvalidInterval(_))
        ));
    }

    #[test]
    fn test_starting_at_duration() {
        let slot = TimeInterval::starting_at(ts("2025-03-10T14:00:00+05:30"), 45).unwrap();
        assert_eq!(slot.end, ts("2025-03-10T14:45:00+05:30"));
        assert_eq!(slot.duration_minutes(), 45);
    }

    #[test]
    fn test_overlap_is_symmetric() {
        let a = interval("2025-03-10T14:00:00+00:00", "2025-03-10T15:00:00+00:00");
        let b = interval("2025-03-10T14:30:00+00:00", "2025-03-10T15:30:00+00:00");
        assert!(a.overlaps(&b));
        assert!(b.overlaps(&a));
    }

    #[test]
    fn test_interval_overlaps_itself() {
        let a = interval("2025-03-10T14:00:00+00:00", "2025-03-10T15:00:00+00:00");
        assert!(a.overlaps(&a));
    }

    #[test]
    fn test_adjacency_is_not_overlap() {
        let a = interval("2025-03-10T14:00:00+00:00", "2025-03-10T15:00:00+00:00");
        let b = interval("2025-03-10T15:00:00+00:00", "2025-03-10T16:00:00+00:00");
        assert!(!a.overlaps(&b));
        assert!(!b.overlaps(&a));
    }

    #[test]
    fn test_disjoint_intervals_do_not_overlap() {
        let a = interval("2025-03-10T09:00:00+00:00", "2025-03-10T10:00:00+00:00");
        let b = interval("2025-03-10T12:00:00+00:00", "2025-03-10T13:00:00+00:00");
        assert!(!a.overlaps(&b));
    }

    #[test]
    fn test_overlap_compares_instants_across_offsets() {
        // 14:30+05:30 == 09:00Z, inside [08:30Z, 09:30Z)
        let a = interval("2025-03-10T14:30:00+05:30", "2025-03-10T15:30:00+05:30");
        let b = interval("2025-03-10T08:30:00+00:00", "2025-03-10T09:30:00+00:00");
        assert!(a.overlaps(&b));
    }

    #[test]
    fn test_parse_timestamp_with_offset() {
        let dt = parse_timestamp("2025-03-10T14:00:00+05:30", None).unwrap();
        assert_eq!(dt, ts("2025-03-10T14:00:00+05:30"));
    }

    #[test]
    fn test_parse_naive_requires_configured_zone() {
        let result = parse_timestamp("2025-03-10T14:00:00", None);
        assert!(matches!(result, Err(ScheduleError::MissingTimezone(_))));
    }

    #[test]
    fn test_parse_naive_localizes_into_configured_zone() {
        let dt = parse_timestamp("2025-03-10 14:00:00", Some(chrono_tz::Asia::Kolkata)).unwrap();
        assert_eq!(dt, ts("2025-03-10T14:00:00+05:30"));
    }

    #[test]
    fn test_parse_garbage_fails() {
        assert!(matches!(
            parse_timestamp("not a time", Some(chrono_tz::UTC)),
            Err(ScheduleError::InvalidInterval(_))
        ));
    }
}
