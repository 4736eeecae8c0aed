use std::fmt;

use serde::Serialize;
use serde_json::{Map, Number, Value};

use crate::error::{AppError, Result};

/// Discriminator carried in the `type` field of a request body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    CommentNotification,
    WelcomeEmail,
    PasswordReset,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::CommentNotification => "comment_notification",
            NotificationKind::WelcomeEmail => "welcome_email",
            NotificationKind::PasswordReset => "password_reset",
        }
    }

    pub fn from_wire(value: &str) -> Option<Self> {
        match value {
            "comment_notification" => Some(NotificationKind::CommentNotification),
            "welcome_email" => Some(NotificationKind::WelcomeEmail),
            "password_reset" => Some(NotificationKind::PasswordReset),
            _ => None,
        }
    }

    /// Reason returned to the caller when a required field is missing
    pub fn missing_fields_message(&self) -> &'static str {
        match self {
            NotificationKind::CommentNotification => {
                "Missing required fields for comment notification"
            }
            NotificationKind::WelcomeEmail => "Recipient email is required",
            NotificationKind::PasswordReset => "Missing required fields for password reset",
        }
    }
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A validated notification request. Each variant holds only what its template needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationRequest {
    CommentNotification {
        recipient: String,
        ticket_no: String,
        comment: String,
        ticket_url: String,
    },
    WelcomeEmail {
        to: String,
        full_name: Option<String>,
    },
    PasswordReset {
        to: String,
        reset_link: String,
    },
}

impl NotificationRequest {
    /// Validate a parsed request body.
    ///
    /// Pure: never touches the network. Fields are checked in declaration
    /// order and the first missing one is reported.
    pub fn from_value(body: &Value) -> Result<Self> {
        let Some(fields) = body.as_object() else {
            return Err(AppError::MissingKind);
        };

        let kind = match fields.get("type") {
            None | Some(Value::Null) | Some(Value::Bool(false)) => {
                return Err(AppError::MissingKind)
            }
            Some(Value::String(s)) if s.is_empty() => return Err(AppError::MissingKind),
            Some(Value::Number(n)) if n.as_f64() == Some(0.0) => {
                return Err(AppError::MissingKind)
            }
            Some(Value::String(s)) => {
                NotificationKind::from_wire(s).ok_or_else(|| AppError::UnknownKind(s.clone()))?
            }
            Some(other) => return Err(AppError::UnknownKind(other.to_string())),
        };

        let request = match kind {
            NotificationKind::CommentNotification => NotificationRequest::CommentNotification {
                recipient: required(fields, kind, "recipient")?,
                ticket_no: required(fields, kind, "ticket_no")?,
                comment: required(fields, kind, "comment")?,
                ticket_url: required(fields, kind, "ticket_url")?,
            },
            NotificationKind::WelcomeEmail => NotificationRequest::WelcomeEmail {
                to: required(fields, kind, "to")?,
                full_name: scalar_field(fields, "full_name"),
            },
            NotificationKind::PasswordReset => NotificationRequest::PasswordReset {
                to: required(fields, kind, "to")?,
                reset_link: required(fields, kind, "reset_link")?,
            },
        };

        Ok(request)
    }

    pub fn kind(&self) -> NotificationKind {
        match self {
            NotificationRequest::CommentNotification { .. } => {
                NotificationKind::CommentNotification
            }
            NotificationRequest::WelcomeEmail { .. } => NotificationKind::WelcomeEmail,
            NotificationRequest::PasswordReset { .. } => NotificationKind::PasswordReset,
        }
    }

    /// Address the rendered message is delivered to
    pub fn recipient(&self) -> &str {
        match self {
            NotificationRequest::CommentNotification { recipient, .. } => recipient,
            NotificationRequest::WelcomeEmail { to, .. } => to,
            NotificationRequest::PasswordReset { to, .. } => to,
        }
    }
}

fn required(
    fields: &Map<String, Value>,
    kind: NotificationKind,
    field: &'static str,
) -> Result<String> {
    scalar_field(fields, field).ok_or(AppError::MissingField { kind, field })
}

/// Non-empty strings and non-zero numbers count as present; ticket numbers may be numeric.
fn scalar_field(fields: &Map<String, Value>, name: &str) -> Option<String> {
    match fields.get(name)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) if n.as_f64() != Some(0.0) => Some(number_text(n)),
        _ => None,
    }
}

/// Integral floats print without a fraction, so `1042.0` reads as `1042`.
fn number_text(n: &Number) -> String {
    match n.as_f64() {
        Some(f) if n.is_f64() && f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", f as i64),
        _ => n.to_string(),
    }
}

/// Subject, plain-text and HTML renderings of one notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedMessage {
    pub subject: String,
    pub text_body: String,
    pub html_body: String,
}
