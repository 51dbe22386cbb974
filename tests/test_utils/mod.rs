//! Test utilities for integration tests
use std::path::PathBuf;
use std::sync::Arc;

use axum::Router;
use tokio::sync::RwLock;

use mailpilot::api::{AppState, app};
use mailpilot::core::config::AppConfig;

/// Creates a test application router. The token path points at a file
/// that never exists, so any handler that reaches for Google gets a
/// clean calendar-unavailable failure instead of a network call.
pub fn test_app() -> Router {
    let config = AppConfig {
        gmail_api_client_id: "test-client-id".to_string(),
        gmail_api_client_secret: "test-client-secret".to_string(),
        token_path: PathBuf::from("/nonexistent/mailpilot-test-token.json"),
        openai_api_hostname: "http://127.0.0.1:1".to_string(),
        openai_api_key: "test-key".to_string(),
        openai_model: "gpt-4".to_string(),
        calendar_id: "primary".to_string(),
        api_base_url: "http://127.0.0.1:2222".to_string(),
        timezone: chrono_tz::Asia::Kolkata,
        history_days: 10,
        default_duration_minutes: 60,
        horizon_days: 7,
        business_hours_only: true,
        max_suggestions: 5,
        scheduling_link: None,
    };
    let shared_state = Arc::new(RwLock::new(AppState::new(config)));
    app(shared_state)
}
