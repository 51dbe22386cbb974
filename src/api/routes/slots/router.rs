use axum::Json;
use axum::extract::{Query, State};
use axum::routing::get;
use chrono::Utc;

use super::public::SlotsQuery;
use crate::api::public::ApiError;
use crate::api::state::SharedState;
use crate::google::gcal::GoogleCalendar;
use crate::schedule::{FreeSlot, SlotQuery, find_free_slots};

pub fn router() -> axum::Router<SharedState> {
    axum::Router::new().route("/", get(list))
}

async fn list(
    State(state): State<SharedState>,
    Query(params): Query<SlotsQuery>,
) -> Result<Json<Vec<FreeSlot>>, ApiError> {
    let config = {
        let state = state.read().await;
        state.config.clone()
    };

    let query = SlotQuery {
        horizon_days: params.horizon_days.unwrap_or(config.horizon_days),
        duration_minutes: params
            .duration_minutes
            .unwrap_or(config.default_duration_minutes),
        business_hours_only: params
            .business_hours_only
            .unwrap_or(config.business_hours_only),
        max_suggestions: params.max_suggestions.unwrap_or(config.max_suggestions),
    };
    // Reject bad bounds before spending an OAuth refresh on them.
    query.validate()?;

    let calendar = GoogleCalendar::connect(
        &config.gmail_api_client_id,
        &config.gmail_api_client_secret,
        &config.token_path,
    )
    .await?;
    let now = Utc::now().fixed_offset();
    let slots =
        find_free_slots(&calendar, &config.calendar_id, &query, now, config.timezone).await?;

    Ok(Json(slots))
}
