use axum::{
    body::Bytes,
    extract::State,
    http::HeaderMap,
    routing::post,
    Json, Router,
};
use serde::Serialize;

use crate::auth::bearer_token;
use crate::error::{AppError, Result};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct SendEmailResponse {
    pub success: bool,
}

pub fn send_email_routes() -> Router<AppState> {
    Router::new().route("/send-email", post(send_email))
}

/// POST /send-email - Validate, render and dispatch one notification
///
/// The body is read raw so the bearer token is checked before any parsing.
async fn send_email(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<SendEmailResponse>> {
    let token = bearer_token(&headers).ok();

    state
        .dispatcher
        .dispatch(token, &body)
        .await
        .inspect_err(log_failure)?;

    Ok(Json(SendEmailResponse { success: true }))
}

fn log_failure(err: &AppError) {
    match err {
        AppError::Unauthenticated | AppError::InvalidToken(_) => {
            tracing::warn!(error = ?err, "Rejected unauthenticated send-email call")
        }
        AppError::TransportError(_) | AppError::UnexpectedError(_) => {
            tracing::error!(error = %err, "Error in send-email")
        }
        _ => tracing::debug!(error = ?err, "Rejected send-email request"),
    }
}
