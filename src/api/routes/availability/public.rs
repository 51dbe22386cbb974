use serde::Deserialize;

/// Query parameters for checking a specific interval.
///
/// `start` is required. The interval end comes from `end` when given,
/// otherwise from `duration_minutes`, otherwise the configured default
/// meeting length. Naive timestamps are interpreted in the configured
/// timezone.
#[derive(Debug, Deserialize)]
pub struct AvailabilityQuery {
    pub start: String,
    pub end: Option<String>,
    pub duration_minutes: Option<i64>,
}
