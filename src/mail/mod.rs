pub mod postmark;
pub mod resend;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;

use crate::config::{Config, MailProvider};
use crate::error::{AppError, Result};
use crate::models::RenderedMessage;

pub use postmark::PostmarkTransport;
pub use resend::ResendTransport;

/// A fully rendered message addressed for delivery
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutboundEmail {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub text_body: String,
    pub html_body: String,
    pub stream: String,
}

/// Provider acknowledgement of an accepted message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportReceipt {
    pub provider: &'static str,
    pub message_id: Option<String>,
}

/// Transactional-email provider
#[async_trait]
pub trait EmailTransport: Send + Sync {
    /// One delivery attempt. Provider rejections surface as `TransportError`.
    async fn send(&self, email: &OutboundEmail) -> Result<TransportReceipt>;

    fn name(&self) -> &'static str;
}

pub fn transport_from_config(config: &Config) -> Arc<dyn EmailTransport> {
    let base_url = config.mail_api_base_url.as_deref();
    match config.mail_provider {
        MailProvider::Postmark => Arc::new(PostmarkTransport::new(&config.mail_api_key, base_url)),
        MailProvider::Resend => Arc::new(ResendTransport::new(&config.mail_api_key, base_url)),
    }
}

/// Bounded exponential backoff. `max_retries = 0` means a single attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn single_attempt() -> Self {
        Self {
            max_retries: 0,
            base_delay: Duration::ZERO,
        }
    }

    pub fn delay_for(&self, retry: u32) -> Duration {
        self.base_delay.saturating_mul(2u32.saturating_pow(retry))
    }
}

/// Addresses rendered messages and hands them to the configured transport
#[derive(Clone)]
pub struct Mailer {
    transport: Arc<dyn EmailTransport>,
    from: String,
    stream: String,
    retry: RetryPolicy,
}

impl Mailer {
    pub fn new(
        transport: Arc<dyn EmailTransport>,
        from: impl Into<String>,
        stream: impl Into<String>,
    ) -> Self {
        Self {
            transport,
            from: from.into(),
            stream: stream.into(),
            retry: RetryPolicy::single_attempt(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            transport_from_config(config),
            config.mail_from.clone(),
            config.message_stream.clone(),
        )
        .with_retry(RetryPolicy {
            max_retries: config.mail_max_retries,
            base_delay: Duration::from_millis(config.mail_retry_base_ms),
        })
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn transport_name(&self) -> &'static str {
        self.transport.name()
    }

    pub async fn deliver(&self, to: &str, message: &RenderedMessage) -> Result<TransportReceipt> {
        let email = OutboundEmail {
            from: self.from.clone(),
            to: to.to_string(),
            subject: message.subject.clone(),
            text_body: message.text_body.clone(),
            html_body: message.html_body.clone(),
            stream: self.stream.clone(),
        };

        let mut retry = 0;
        loop {
            match self.transport.send(&email).await {
                Ok(receipt) => return Ok(receipt),
                Err(AppError::TransportError(msg)) if retry < self.retry.max_retries => {
                    let delay = self.retry.delay_for(retry);
                    tracing::warn!(
                        provider = self.transport.name(),
                        attempt = retry + 1,
                        delay_ms = delay.as_millis() as u64,
                        error = %msg,
                        "Mail send failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    retry += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
