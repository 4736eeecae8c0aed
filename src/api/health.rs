use axum::{extract::State, routing::get, Json, Router};
use chrono::Utc;
use serde::Serialize;

use crate::state::AppState;

/// Health response structure
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub identity_verifier: String,
    pub mail_transport: String,
    pub timestamp: String,
}

/// Health routes
pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}

/// GET /health - Liveness plus the collaborators this instance is wired to
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        identity_verifier: state.dispatcher.verifier_name().to_string(),
        mail_transport: state.dispatcher.transport_name().to_string(),
        timestamp: Utc::now().to_rfc3339(),
    })
}
