//! Integration tests for the slots endpoint

mod test_utils;

#[cfg(test)]
mod tests {
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use tower::util::ServiceExt;

    use crate::test_utils::test_app;

    #[tokio::test]
    async fn it_returns_400_for_non_numeric_horizon() {
        let app = test_app();

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/slots?horizon_days=soon")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    /// Out-of-bounds queries are rejected before any calendar
    /// connection is attempted, so they map to 400 rather than 502
    #[tokio::test]
    async fn it_returns_400_for_out_of_range_horizon() {
        let app = test_app();

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/slots?horizon_days=200")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn it_returns_400_for_zero_duration() {
        let app = test_app();

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/slots?duration_minutes=0")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    /// With no stored refresh token the calendar backend is
    /// unreachable, which surfaces as 502 Bad Gateway
    #[tokio::test]
    async fn it_returns_502_without_calendar_credentials() {
        let app = test_app();

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/slots")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }
}
