use std::sync::Arc;

use tokio::sync::RwLock;

use crate::core::config::AppConfig;

pub type SharedState = Arc<RwLock<AppState>>;

pub struct AppState {
    pub config: AppConfig,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }
}
