//! Calendar availability core: busy-time aggregation, availability
//! checks, and free-slot search over a provider-agnostic event source.
//!
//! All operations are request-scoped and read-only. The calendar
//! client is passed in explicitly rather than held in process-wide
//! state, so every operation is independently testable and concurrent
//! checks need no coordination.

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};

pub mod availability;
pub mod busy;
pub mod interval;
pub mod slots;

pub use availability::{AvailabilityResult, Conflict, check_availability};
pub use busy::{BusyInterval, CalendarEvent, ResponseStatus, busy_intervals};
pub use interval::{ScheduleError, TimeInterval, parse_timestamp};
pub use slots::{FreeSlot, SlotQuery, find_free_slots};

/// Read-only event source the scheduling operations run against.
///
/// Implementations must return events that intersect the query window,
/// ordered by start time, each carrying the authenticated user's
/// response status and the all-day/timed discriminator. Any fetch
/// fault (network, auth, quota) surfaces as
/// [`ScheduleError::CalendarUnavailable`]; the core never substitutes
/// a default availability judgment for a failed fetch.
#[async_trait]
pub trait CalendarEvents {
    async fn list_events(
        &self,
        calendar_id: &str,
        time_min: DateTime<FixedOffset>,
        time_max: DateTime<FixedOffset>,
    ) -> Result<Vec<CalendarEvent>, ScheduleError>;
}
