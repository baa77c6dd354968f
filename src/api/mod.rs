pub mod health;
pub mod slash;

use axum::routing::{get, post};
use axum::Router;

use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/slack/ask", post(slash::ask))
        .route("/slack/ask/deferred", post(slash::ask_deferred))
        .route("/health", get(health::health))
        .with_state(state)
}
