use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{EmailTransport, OutboundEmail, TransportReceipt};
use crate::error::{AppError, Result};

const DEFAULT_BASE_URL: &str = "https://api.resend.com";

#[derive(Clone)]
pub struct ResendTransport {
    client: Client,
    api_key: String,
    endpoint: String,
}

impl ResendTransport {
    pub fn new(api_key: &str, base_url: Option<&str>) -> Self {
        let base = base_url.unwrap_or(DEFAULT_BASE_URL).trim_end_matches('/');
        Self {
            client: Client::new(),
            api_key: api_key.to_string(),
            endpoint: format!("{}/emails", base),
        }
    }
}

#[async_trait]
impl EmailTransport for ResendTransport {
    // Resend has no message streams; `stream` is dropped.
    async fn send(&self, email: &OutboundEmail) -> Result<TransportReceipt> {
        #[derive(Serialize)]
        struct Payload<'a> {
            from: &'a str,
            to: Vec<&'a str>,
            subject: &'a str,
            text: &'a str,
            html: &'a str,
        }

        #[derive(Deserialize)]
        struct Accepted {
            id: Option<String>,
        }

        #[derive(Deserialize)]
        struct Rejected {
            message: String,
        }

        let payload = Payload {
            from: &email.from,
            to: vec![email.to.as_str()],
            subject: &email.subject,
            text: &email.text_body,
            html: &email.html_body,
        };

        let res = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| AppError::TransportError(format!("Mail send failed: {}", e)))?;

        let status = res.status();
        let body = res.text().await.unwrap_or_default();

        if !status.is_success() {
            let message = serde_json::from_str::<Rejected>(&body)
                .map(|r| r.message)
                .unwrap_or_else(|_| format!("Resend API error ({}): {}", status, body));
            return Err(AppError::TransportError(message));
        }

        let message_id = serde_json::from_str::<Accepted>(&body)
            .ok()
            .and_then(|a| a.id);

        Ok(TransportReceipt {
            provider: self.name(),
            message_id,
        })
    }

    fn name(&self) -> &'static str {
        "resend"
    }
}
