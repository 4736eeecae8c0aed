use std::sync::Arc;

use crate::auth::IdentityVerifier;
use crate::error::{AppError, Result};
use crate::mail::{Mailer, TransportReceipt};
use crate::models::NotificationRequest;
use crate::templates::Renderer;

pub struct Dispatcher {
    verifier: Arc<dyn IdentityVerifier>,
    renderer: Renderer,
    mailer: Mailer,
}

impl Dispatcher {
    pub fn new(verifier: Arc<dyn IdentityVerifier>, renderer: Renderer, mailer: Mailer) -> Self {
        Self {
            verifier,
            renderer,
            mailer,
        }
    }

    pub fn verifier_name(&self) -> &'static str {
        self.verifier.name()
    }

    pub fn transport_name(&self) -> &'static str {
        self.mailer.transport_name()
    }

    /// Handle one request body on behalf of the bearer of `token`.
    ///
    /// Authentication always runs first. Nothing is sent unless every earlier
    /// step succeeded.
    pub async fn dispatch(&self, token: Option<&str>, body: &[u8]) -> Result<TransportReceipt> {
        let token = token.ok_or(AppError::Unauthenticated)?;
        let caller = self.verifier.verify(token).await?;

        let value: serde_json::Value = serde_json::from_slice(body)
            .map_err(|e| AppError::UnexpectedError(e.to_string()))?;
        let request = NotificationRequest::from_value(&value)?;
        let kind = request.kind();

        let message = self.renderer.render(&request, &caller)?;
        let receipt = self.mailer.deliver(request.recipient(), &message).await?;

        tracing::info!(
            kind = %kind,
            recipient = %request.recipient(),
            caller = %caller.email,
            provider = receipt.provider,
            message_id = ?receipt.message_id,
            "Notification sent"
        );

        Ok(receipt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{RecordingTransport, StaticVerifier};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn dispatcher(transport: Arc<RecordingTransport>) -> Dispatcher {
        let verifier = StaticVerifier::new().with_token("good", "alice.smith@uni.canberra.edu.au");
        Dispatcher::new(
            Arc::new(verifier),
            Renderer::new().unwrap(),
            Mailer::new(transport, "no-reply@scitech.support", "outbound"),
        )
    }

    fn body(value: serde_json::Value) -> Vec<u8> {
        serde_json::to_vec(&value).unwrap()
    }

    #[tokio::test]
    async fn test_comment_notification_uses_caller_name() {
        let transport = Arc::new(RecordingTransport::new());
        let dispatcher = dispatcher(transport.clone());

        dispatcher
            .dispatch(
                Some("good"),
                &body(json!({
                    "type": "comment_notification",
                    "recipient": "student@uni.canberra.edu.au",
                    "ticket_no": "88",
                    "comment": "Access granted",
                    "ticket_url": "https://support.example/request/88"
                })),
            )
            .await
            .unwrap();

        let sent = transport.sent().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "student@uni.canberra.edu.au");
        assert_eq!(sent[0].subject, "New comment on your support ticket #88");
        assert!(sent[0].text_body.contains("alice.smith has added"));
    }

    #[tokio::test]
    async fn test_authentication_precedes_validation() {
        let transport = Arc::new(RecordingTransport::new());
        let dispatcher = dispatcher(transport.clone());

        let err = dispatcher.dispatch(None, b"not json").await.unwrap_err();
        assert!(matches!(err, AppError::Unauthenticated));

        let err = dispatcher
            .dispatch(Some("bad"), &body(json!({"type": "foo"})))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidToken(_)));

        assert_eq!(transport.attempts(), 0);
    }

    #[tokio::test]
    async fn test_malformed_body_is_unexpected_error() {
        let transport = Arc::new(RecordingTransport::new());
        let dispatcher = dispatcher(transport.clone());

        let err = dispatcher.dispatch(Some("good"), b"{oops").await.unwrap_err();

        assert!(matches!(err, AppError::UnexpectedError(_)));
        assert_eq!(err.status(), axum::http::StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(transport.attempts(), 0);
    }

    #[tokio::test]
    async fn test_transport_failure_propagates() {
        let transport = Arc::new(RecordingTransport::failing("Provider down"));
        let dispatcher = dispatcher(transport.clone());

        let err = dispatcher
            .dispatch(
                Some("good"),
                &body(json!({"type": "welcome_email", "to": "new@uni.canberra.edu.au"})),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::TransportError(ref m) if m == "Provider down"));
        assert_eq!(transport.attempts(), 1);
    }
}
