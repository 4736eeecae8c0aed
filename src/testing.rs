use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::Mutex;

use crate::auth::IdentityVerifier;
use crate::error::{AppError, Result};
use crate::mail::{EmailTransport, OutboundEmail, TransportReceipt};
use crate::models::CallerIdentity;

/// Serve `app` on an ephemeral local port and return its base URL
pub async fn spawn_stub(app: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Should bind stub listener");
    let addr = listener.local_addr().expect("Should have local addr");

    tokio::spawn(async move {
        axum::serve(listener, app).await.ok();
    });

    format!("http://{}", addr)
}

/// Accepts a fixed set of tokens
#[derive(Default)]
pub struct StaticVerifier {
    tokens: HashMap<String, CallerIdentity>,
}

impl StaticVerifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(mut self, token: &str, email: &str) -> Self {
        self.tokens
            .insert(token.to_string(), CallerIdentity::new(None, email));
        self
    }
}

#[async_trait]
impl IdentityVerifier for StaticVerifier {
    async fn verify(&self, token: &str) -> Result<CallerIdentity> {
        self.tokens
            .get(token)
            .cloned()
            .ok_or_else(|| AppError::InvalidToken("unknown token".to_string()))
    }

    fn name(&self) -> &'static str {
        "static"
    }
}

/// Records every message it is asked to send
#[derive(Default)]
pub struct RecordingTransport {
    sent: Mutex<Vec<OutboundEmail>>,
    attempts: AtomicUsize,
    failure: Option<String>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// A transport whose provider rejects everything with `message`
    pub fn failing(message: &str) -> Self {
        Self {
            failure: Some(message.to_string()),
            ..Self::default()
        }
    }

    pub async fn sent(&self) -> Vec<OutboundEmail> {
        self.sent.lock().await.clone()
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EmailTransport for RecordingTransport {
    async fn send(&self, email: &OutboundEmail) -> Result<TransportReceipt> {
        self.attempts.fetch_add(1, Ordering::SeqCst);

        if let Some(message) = &self.failure {
            return Err(AppError::TransportError(message.clone()));
        }

        self.sent.lock().await.push(email.clone());
        Ok(TransportReceipt {
            provider: self.name(),
            message_id: Some(format!("rec-{}", self.attempts())),
        })
    }

    fn name(&self) -> &'static str {
        "recording"
    }
}
