use std::sync::Arc;

use tokio::sync::RwLock;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::api::routes;
use crate::api::state::{AppState, SharedState};
use crate::core::config::AppConfig;
use crate::jobs::{process_inbox::ProcessInbox, spawn_periodic_job};

pub fn app(shared_state: SharedState) -> axum::Router {
    axum::Router::new()
        .nest("/api", routes::router())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(shared_state)
}

pub async fn serve(host: &str, port: &str, config: AppConfig) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!(
                    "{}=debug,tower_http=debug,axum::rejection=trace",
                    env!("CARGO_CRATE_NAME")
                )
                .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let shared_state: SharedState = Arc::new(RwLock::new(AppState::new(config.clone())));

    spawn_periodic_job(config, ProcessInbox);

    let app = app(shared_state);

    let listener = tokio::net::TcpListener::bind(format!("{}:{}", host, port))
        .await
        .unwrap();
    tracing::info!("Listening on {}:{}", host, port);
    axum::serve(listener, app).await.unwrap();
}
