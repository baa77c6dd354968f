use axum::extract::State;
use axum::Json;

use crate::models::HealthResponse;
use crate::state::AppState;

/// GET /health - Which secrets are configured, and where we are running.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(state.health.as_ref().clone())
}
