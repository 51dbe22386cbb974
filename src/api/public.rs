//! Public API surface and error mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::schedule::ScheduleError;

pub use crate::api::routes::availability::public::AvailabilityQuery;
pub use crate::api::routes::slots::public::SlotsQuery;

/// Wrapper so handlers can use `?` on anything `anyhow` can hold while
/// still producing sensible status codes for known failure modes.
pub struct ApiError(anyhow::Error);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.0.downcast_ref::<ScheduleError>() {
            Some(ScheduleError::InvalidInterval(_))
            | Some(ScheduleError::MissingTimezone(_))
            | Some(ScheduleError::OutOfRange { .. }) => StatusCode::BAD_REQUEST,
            Some(ScheduleError::CalendarUnavailable(_)) => StatusCode::BAD_GATEWAY,
            None => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, format!("{}", self.0)).into_response()
    }
}

// Enable using `?` on functions that return `Result<_, anyhow::Error>`
// to turn them into `Result<_, ApiError>`.
impl<E> From<E> for ApiError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}
