use axum::Json;
use axum::extract::{Query, State};
use axum::routing::get;

use super::public::AvailabilityQuery;
use crate::api::public::ApiError;
use crate::api::state::SharedState;
use crate::google::gcal::GoogleCalendar;
use crate::schedule::{
    AvailabilityResult, TimeInterval, check_availability, parse_timestamp,
};

pub fn router() -> axum::Router<SharedState> {
    axum::Router::new().route("/", get(check))
}

async fn check(
    State(state): State<SharedState>,
    Query(params): Query<AvailabilityQuery>,
) -> Result<Json<AvailabilityResult>, ApiError> {
    let config = {
        let state = state.read().await;
        state.config.clone()
    };

    let start = parse_timestamp(&params.start, Some(config.timezone))?;
    let interval = match &params.end {
        Some(end) => TimeInterval::new(start, parse_timestamp(end, Some(config.timezone))?)?,
        None => TimeInterval::starting_at(
            start,
            params.duration_minutes.unwrap_or(config.default_duration_minutes),
        )?,
    };

    let calendar = GoogleCalendar::connect(
        &config.gmail_api_client_id,
        &config.gmail_api_client_secret,
        &config.token_path,
    )
    .await?;
    let result = check_availability(&calendar, &config.calendar_id, interval).await?;

    Ok(Json(result))
}
