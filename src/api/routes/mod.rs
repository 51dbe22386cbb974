pub mod availability;
pub mod slots;

use crate::api::state::SharedState;

pub fn router() -> axum::Router<SharedState> {
    axum::Router::new()
        .nest("/availability", availability::router::router())
        .nest("/slots", slots::router::router())
}
