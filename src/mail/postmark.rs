use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{EmailTransport, OutboundEmail, TransportReceipt};
use crate::error::{AppError, Result};

const DEFAULT_BASE_URL: &str = "https://api.postmarkapp.com";

#[derive(Clone)]
pub struct PostmarkTransport {
    client: Client,
    server_token: String,
    endpoint: String,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct Payload<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    text_body: &'a str,
    html_body: &'a str,
    message_stream: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct PostmarkResponse {
    #[serde(rename = "MessageID", default)]
    message_id: Option<String>,
    #[serde(default)]
    error_code: i64,
    #[serde(default)]
    message: String,
}

impl PostmarkTransport {
    pub fn new(server_token: &str, base_url: Option<&str>) -> Self {
        let base = base_url.unwrap_or(DEFAULT_BASE_URL).trim_end_matches('/');
        Self {
            client: Client::new(),
            server_token: server_token.to_string(),
            endpoint: format!("{}/email", base),
        }
    }
}

#[async_trait]
impl EmailTransport for PostmarkTransport {
    async fn send(&self, email: &OutboundEmail) -> Result<TransportReceipt> {
        let payload = Payload {
            from: &email.from,
            to: &email.to,
            subject: &email.subject,
            text_body: &email.text_body,
            html_body: &email.html_body,
            message_stream: &email.stream,
        };

        let res = self
            .client
            .post(&self.endpoint)
            .header("Accept", "application/json")
            .header("X-Postmark-Server-Token", &self.server_token)
            .json(&payload)
            .send()
            .await
            .map_err(|e| AppError::TransportError(format!("Mail send failed: {}", e)))?;

        let status = res.status();
        let body = res.text().await.unwrap_or_default();
        let parsed = serde_json::from_str::<PostmarkResponse>(&body).ok();

        // Postmark can answer 200 with a non-zero ErrorCode.
        match parsed {
            Some(r) if status.is_success() && r.error_code == 0 => Ok(TransportReceipt {
                provider: self.name(),
                message_id: r.message_id,
            }),
            Some(r) if !r.message.is_empty() => Err(AppError::TransportError(r.message)),
            _ => Err(AppError::TransportError(format!(
                "Postmark API error ({}): {}",
                status, body
            ))),
        }
    }

    fn name(&self) -> &'static str {
        "postmark"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::spawn_stub;
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::post;
    use axum::{Json, Router};
    use serde_json::{json, Value};
    use std::sync::Arc;
    use tokio::sync::Mutex;

    fn email(to: &str) -> OutboundEmail {
        OutboundEmail {
            from: "no-reply@scitech.support".to_string(),
            to: to.to_string(),
            subject: "Welcome to SciTech Support".to_string(),
            text_body: "Hi there,".to_string(),
            html_body: "<p>Hi there,</p>".to_string(),
            stream: "outbound".to_string(),
        }
    }

    #[tokio::test]
    async fn test_send_posts_postmark_payload() {
        let captured: Arc<Mutex<Vec<(Option<String>, Value)>>> = Arc::default();
        let sink = captured.clone();
        let app = Router::new().route(
            "/email",
            post(move |headers: HeaderMap, Json(body): Json<Value>| {
                let sink = sink.clone();
                async move {
                    let token = headers
                        .get("x-postmark-server-token")
                        .and_then(|v| v.to_str().ok())
                        .map(str::to_string);
                    sink.lock().await.push((token, body));
                    Json(json!({"ErrorCode": 0, "Message": "OK", "MessageID": "msg-1"}))
                }
            }),
        );
        let base = spawn_stub(app).await;
        let transport = PostmarkTransport::new("server-token", Some(&base));

        let receipt = transport.send(&email("new.user@uni.canberra.edu.au")).await.unwrap();

        assert_eq!(receipt.provider, "postmark");
        assert_eq!(receipt.message_id.as_deref(), Some("msg-1"));

        let captured = captured.lock().await;
        assert_eq!(captured.len(), 1);
        let (token, body) = &captured[0];
        assert_eq!(token.as_deref(), Some("server-token"));
        assert_eq!(
            body,
            &json!({
                "From": "no-reply@scitech.support",
                "To": "new.user@uni.canberra.edu.au",
                "Subject": "Welcome to SciTech Support",
                "TextBody": "Hi there,",
                "HtmlBody": "<p>Hi there,</p>",
                "MessageStream": "outbound"
            })
        );
    }

    #[tokio::test]
    async fn test_provider_rejection_carries_message() {
        let app = Router::new().route(
            "/email",
            post(|| async {
                (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    Json(json!({"ErrorCode": 406, "Message": "You tried to send to an inactive recipient."})),
                )
            }),
        );
        let base = spawn_stub(app).await;
        let transport = PostmarkTransport::new("server-token", Some(&base));

        let err = transport.send(&email("gone@canberra.edu.au")).await.unwrap_err();

        assert!(matches!(
            err,
            AppError::TransportError(ref m) if m == "You tried to send to an inactive recipient."
        ));
    }

    #[tokio::test]
    async fn test_non_json_error_body() {
        let app = Router::new().route(
            "/email",
            post(|| async { (StatusCode::BAD_GATEWAY, "upstream down") }),
        );
        let base = spawn_stub(app).await;
        let transport = PostmarkTransport::new("server-token", Some(&base));

        let err = transport.send(&email("a@b")).await.unwrap_err();
        assert!(err.to_string().contains("upstream down"));
    }
}
