use serde::Deserialize;

/// Query parameters for the free-slot search. Every field is optional;
/// missing fields fall back to the configured defaults.
#[derive(Debug, Deserialize)]
pub struct SlotsQuery {
    pub horizon_days: Option<i64>,
    pub duration_minutes: Option<i64>,
    pub business_hours_only: Option<bool>,
    pub max_suggestions: Option<usize>,
}
