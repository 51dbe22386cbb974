//! Free-slot search over a forward-looking horizon.

use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveDate, Weekday};
use chrono_tz::Tz;
use serde::Serialize;

use super::CalendarEvents;
use super::busy::{BusyInterval, busy_intervals};
use super::interval::{ScheduleError, TimeInterval, localize};

/// Candidate start times are considered on a 30-minute grid, and an
/// emitted slot is followed by a 30-minute gap before the sweep
/// resumes. A tunable, but it must stay consistent for reproducible
/// suggestions.
const SLOT_STEP_MINUTES: i64 = 30;

/// No suggestion may start less than an hour from "now".
const LEAD_BUFFER_HOURS: i64 = 1;

const HORIZON_BOUNDS: std::ops::RangeInclusive<i64> = 1..=90;

/// Search parameters for [`find_free_slots`].
#[derive(Debug, Clone)]
pub struct SlotQuery {
    /// Days to scan forward from "now". Validated to 1..=90.
    pub horizon_days: i64,
    /// Required meeting length. Must be positive.
    pub duration_minutes: i64,
    /// Restrict suggestions to 09:00-17:00 on weekdays; otherwise
    /// 08:00-20:00 every day.
    pub business_hours_only: bool,
    /// Upper bound on the number of returned slots.
    pub max_suggestions: usize,
}

impl SlotQuery {
    /// Check the query bounds without touching the calendar, so callers
    /// can reject bad input before acquiring a connection.
    pub fn validate(&self) -> Result<(), ScheduleError> {
        if !HORIZON_BOUNDS.contains(&self.horizon_days) {
            return Err(ScheduleError::OutOfRange {
                name: "horizon_days",
                value: self.horizon_days,
                bounds: "1..=90",
            });
        }
        if self.duration_minutes <= 0 {
            return Err(ScheduleError::InvalidInterval(format!(
                "duration must be positive, got {} minutes",
                self.duration_minutes
            )));
        }
        Ok(())
    }
}

impl Default for SlotQuery {
    fn default() -> Self {
        Self {
            horizon_days: 7,
            duration_minutes: 60,
            business_hours_only: true,
            max_suggestions: 5,
        }
    }
}

/// A conflict-free suggestion. Advisory only: nothing is reserved, so
/// the slot is not guaranteed to remain free after computation.
#[derive(Debug, Clone, Serialize)]
pub struct FreeSlot {
    pub interval: TimeInterval,
    pub day_of_week: String,
}

/// Enumerate up to `max_suggestions` conflict-free slots within the
/// horizon, in chronological order.
///
/// Fetches the busy set once for `[now, now + horizon)` and sweeps
/// each day's window. On a conflict the sweep jumps to the conflicting
/// interval's end instead of stepping the grid. The first scanned day
/// is clamped to `now + 1h` so no suggestion is less than an hour
/// away. Either a fully computed (possibly empty) list is returned or
/// the calendar fault propagates; never a partial result.
pub async fn find_free_slots<C>(
    calendar: &C,
    calendar_id: &str,
    query: &SlotQuery,
    now: DateTime<FixedOffset>,
    tz: Tz,
) -> Result<Vec<FreeSlot>, ScheduleError>
where
    C: CalendarEvents + ?Sized,
{
    query.validate()?;

    let horizon_end = now + Duration::days(query.horizon_days);
    let events = calendar.list_events(calendar_id, now, horizon_end).await?;
    let busy = busy_intervals(&events);

    Ok(sweep(&busy, query, now, tz))
}

fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Pure day-by-day sweep against an already-fetched busy set.
pub(crate) fn sweep(
    busy: &[BusyInterval],
    query: &SlotQuery,
    now: DateTime<FixedOffset>,
    tz: Tz,
) -> Vec<FreeSlot> {
    let mut slots = Vec::new();
    if query.max_suggestions == 0 {
        return slots;
    }

    let lead = now + Duration::hours(LEAD_BUFFER_HOURS);
    let now_local = now.with_timezone(&tz);
    let (open, close) = if query.business_hours_only {
        (9, 17)
    } else {
        (8, 20)
    };

    for day_offset in 0..query.horizon_days {
        let date = (now_local + Duration::days(day_offset)).date_naive();
        if query.business_hours_only && is_weekend(date) {
            continue;
        }

        // Skip days whose window boundaries don't exist locally (DST
        // gaps); and_hms_opt only fails for out-of-range components.
        let (Some(window_start), Some(window_end)) = (
            date.and_hms_opt(open, 0, 0).and_then(|n| localize(tz, n)),
            date.and_hms_opt(close, 0, 0).and_then(|n| localize(tz, n)),
        ) else {
            continue;
        };

        // The lead clamp only binds on the first day(s); later windows
        // start well past it.
        let mut slot_start = window_start.max(lead);

        while slot_start + Duration::minutes(query.duration_minutes) <= window_end {
            let candidate = TimeInterval {
                start: slot_start,
                end: slot_start + Duration::minutes(query.duration_minutes),
            };

            match busy.iter().find(|b| b.interval.overlaps(&candidate)) {
                Some(conflict) => {
                    // Skip ahead past the whole conflicting interval.
                    slot_start = conflict.interval.end;
                }
                None => {
                    slots.push(FreeSlot {
                        day_of_week: candidate
                            .start
                            .with_timezone(&tz)
                            .format("%A")
                            .to_string(),
                        interval: candidate,
                    });
                    if slots.len() >= query.max_suggestions {
                        return slots;
                    }
                    slot_start = candidate.end + Duration::minutes(SLOT_STEP_MINUTES);
                }
            }
        }
    }

    slots
}
