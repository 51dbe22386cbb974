//! Aggregates raw calendar events into the busy intervals that count
//! as genuine obligations: declined invitations and all-day entries
//! never block a timed meeting.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use super::interval::TimeInterval;

/// The calendar owner's response to an event invitation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ResponseStatus {
    Accepted,
    Declined,
    NeedsAction,
    Tentative,
    #[serde(other)]
    None,
}

/// A calendar event as reported by the provider. Read-only input to
/// the scheduling core; never mutated here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalendarEvent {
    pub title: String,
    pub start: DateTime<FixedOffset>,
    pub end: DateTime<FixedOffset>,
    pub is_all_day: bool,
    pub response_status: ResponseStatus,
}

/// A time range during which the owner is unavailable, tagged with the
/// originating event's title for conflict reporting. Overlap checks
/// compare the interval only.
#[derive(Debug, Clone, Serialize)]
pub struct BusyInterval {
    pub title: String,
    pub interval: TimeInterval,
}

/// Reduce raw events to busy intervals, ordered ascending by start.
///
/// Declined events are dropped first, then all-day entries (they carry
/// only a date, no time-of-day). Events whose reported times do not
/// form a valid interval are skipped. The sort is stable so that ties
/// keep the provider's original order, which keeps conflict reports
/// deterministic.
pub fn busy_intervals(events: &[CalendarEvent]) -> Vec<BusyInterval> {
    let mut busy: Vec<BusyInterval> = events
        .iter()
        .filter(|e| e.response_status != ResponseStatus::Declined)
        .filter(|e| !e.is_all_day)
        .filter_map(|e| {
            let interval = TimeInterval::new(e.start, e.end).ok()?;
            Some(BusyInterval {
                title: e.title.clone(),
                interval,
            })
        })
        .collect();
    busy.sort_by_key(|b| b.interval.start);
    busy
}
