use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::models::NotificationKind;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Email type is required")]
    MissingKind,

    #[error("Invalid email type")]
    UnknownKind(String),

    #[error("{}", .kind.missing_fields_message())]
    MissingField {
        kind: NotificationKind,
        field: &'static str,
    },

    #[error("Authorization token required")]
    Unauthenticated,

    // The reason stays in logs; callers only see the fixed message.
    #[error("Invalid authorization token")]
    InvalidToken(String),

    #[error("{0}")]
    TransportError(String),

    #[error("{0}")]
    UnexpectedError(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::MissingKind
            | AppError::UnknownKind(_)
            | AppError::MissingField { .. } => StatusCode::BAD_REQUEST,
            AppError::Unauthenticated | AppError::InvalidToken(_) => StatusCode::UNAUTHORIZED,
            AppError::TransportError(_) | AppError::UnexpectedError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(json!({ "error": self.to_string() }));

        (status, body).into_response()
    }
}

impl From<handlebars::RenderError> for AppError {
    fn from(err: handlebars::RenderError) -> Self {
        AppError::UnexpectedError(format!("Template render failed: {}", err))
    }
}

impl From<handlebars::TemplateError> for AppError {
    fn from(err: handlebars::TemplateError) -> Self {
        AppError::UnexpectedError(format!("Template compile failed: {}", err))
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
