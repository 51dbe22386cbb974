//! Availability check for a single candidate interval.

use serde::Serialize;

use super::CalendarEvents;
use super::busy::{BusyInterval, busy_intervals};
use super::interval::{ScheduleError, TimeInterval};

/// One busy interval that overlaps the requested candidate.
#[derive(Debug, Clone, Serialize)]
pub struct Conflict {
    pub title: String,
    pub interval: TimeInterval,
}

/// Outcome of an availability check. Computed fresh per query and
/// never cached; the busy set may change the moment this is returned.
#[derive(Debug, Clone, Serialize)]
pub struct AvailabilityResult {
    pub available: bool,
    pub requested: TimeInterval,
    pub conflicts: Vec<Conflict>,
}

/// Collect every busy interval overlapping the candidate, in busy-set
/// order (ascending by start).
pub fn conflicts_with(busy: &[BusyInterval], candidate: &TimeInterval) -> Vec<Conflict> {
    busy.iter()
        .filter(|b| b.interval.overlaps(candidate))
        .map(|b| Conflict {
            title: b.title.clone(),
            interval: b.interval,
        })
        .collect()
}

/// Check whether the candidate interval is free on the given calendar.
///
/// Fetches events covering the candidate window, reduces them to busy
/// intervals, and reports every overlap. A failed fetch propagates as
/// [`ScheduleError::CalendarUnavailable`]; "unknown" is never
/// reported as busy or available.
pub async fn check_availability<C>(
    calendar: &C,
    calendar_id: &str,
    candidate: TimeInterval,
) -> Result<AvailabilityResult, ScheduleError>
where
    C: CalendarEvents + ?Sized,
{
    let events = calendar
        .list_events(calendar_id, candidate.start, candidate.end)
        .await?;
    let busy = busy_intervals(&events);
    let conflicts = conflicts_with(&busy, &candidate);

    Ok(AvailabilityResult {
        available: conflicts.is_empty(),
        requested: candidate,
        conflicts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::ResponseStatus;
    use crate::schedule::busy::tests::event;
    use crate::schedule::test_support::StubCalendar;
    use chrono::DateTime;

    fn candidate(start: &str, end: &str) -> TimeInterval {
        TimeInterval::new(
            DateTime::parse_from_rfc3339(start).unwrap(),
            DateTime::parse_from_rfc3339(end).unwrap(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_overlapping_event_reports_conflict() {
        let calendar = StubCalendar::with_events(vec![event(
            "design review",
            "2025-03-10T14:00:00+05:30",
            "2025-03-10T15:00:00+05:30",
        )]);

        let result = check_availability(
            &calendar,
            "primary",
            candidate("2025-03-10T14:30:00+05:30", "2025-03-10T15:30:00+05:30"),
        )
        .await
        .unwrap();

        assert!(!result.available);
        assert_eq!(result.conflicts.len(), 1);
        assert_eq!(result.conflicts[0].title, "design review");
    }

    #[tokio::test]
    async fn test_adjacent_event_is_not_a_conflict() {
        let calendar = StubCalendar::with_events(vec![event(
            "design review",
            "2025-03-10T14:00:00+05:30",
            "2025-03-10T15:00:00+05:30",
        )]);

        let result = check_availability(
            &calendar,
            "primary",
            candidate("2025-03-10T15:00:00+05:30", "2025-03-10T16:00:00+05:30"),
        )
        .await
        .unwrap();

        assert!(result.available);
        assert!(result.conflicts.is_empty());
    }

    #[tokio::test]
    async fn test_declined_event_never_conflicts() {
        let mut declined = event(
            "declined sync",
            "2025-03-10T14:00:00+05:30",
            "2025-03-10T16:00:00+05:30",
        );
        declined.response_status = ResponseStatus::Declined;
        let calendar = StubCalendar::with_events(vec![declined]);

        let result = check_availability(
            &calendar,
            "primary",
            candidate("2025-03-10T14:30:00+05:30", "2025-03-10T15:30:00+05:30"),
        )
        .await
        .unwrap();

        assert!(result.available);
        assert!(result.conflicts.is_empty());
    }

    #[tokio::test]
    async fn test_all_day_event_never_conflicts() {
        let mut all_day = event(
            "company offsite",
            "2025-03-10T00:00:00+00:00",
            "2025-03-11T00:00:00+00:00",
        );
        all_day.is_all_day = true;
        let calendar = StubCalendar::with_events(vec![all_day]);

        let result = check_availability(
            &calendar,
            "primary",
            candidate("2025-03-10T09:00:00+00:00", "2025-03-10T10:00:00+00:00"),
        )
        .await
        .unwrap();

        assert!(result.available);
    }

    #[tokio::test]
    async fn test_conflicts_reported_in_start_order() {
        let calendar = StubCalendar::with_events(vec![
            event(
                "second",
                "2025-03-10T10:00:00+00:00",
                "2025-03-10T11:00:00+00:00",
            ),
            event(
                "first",
                "2025-03-10T09:00:00+00:00",
                "2025-03-10T10:30:00+00:00",
            ),
        ]);

        let result = check_availability(
            &calendar,
            "primary",
            candidate("2025-03-10T09:30:00+00:00", "2025-03-10T10:30:00+00:00"),
        )
        .await
        .unwrap();

        assert_eq!(result.conflicts.len(), 2);
        assert_eq!(result.conflicts[0].title, "first");
        assert_eq!(result.conflicts[1].title, "second");
    }

    #[tokio::test]
    async fn test_repeated_check_is_identical() {
        let calendar = StubCalendar::with_events(vec![event(
            "standup",
            "2025-03-10T09:00:00+00:00",
            "2025-03-10T09:30:00+00:00",
        )]);
        let wanted = candidate("2025-03-10T09:00:00+00:00", "2025-03-10T10:00:00+00:00");

        let a = check_availability(&calendar, "primary", wanted)
            .await
            .unwrap();
        let b = check_availability(&calendar, "primary", wanted)
            .await
            .unwrap();

        assert_eq!(a.available, b.available);
        assert_eq!(a.requested, b.requested);
        assert_eq!(a.conflicts.len(), b.conflicts.len());
    }

    #[tokio::test]
    async fn test_fetch_failure_propagates() {
        let calendar = StubCalendar::offline();

        let result = check_availability(
            &calendar,
            "primary",
            candidate("2025-03-10T09:00:00+00:00", "2025-03-10T10:00:00+00:00"),
        )
        .await;

        assert!(matches!(
            result,
            Err(ScheduleError::CalendarUnavailable(_))
        ));
    }
}
