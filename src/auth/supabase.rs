use async_trait::async_trait;
use reqwest::Client;

use super::IdentityVerifier;
use crate::error::{AppError, Result};
use crate::models::identity::ProviderUser;
use crate::models::CallerIdentity;

/// Verifies tokens by asking the hosted auth service who they belong to
#[derive(Clone)]
pub struct SupabaseVerifier {
    client: Client,
    user_endpoint: String,
    anon_key: String,
}

impl SupabaseVerifier {
    pub fn new(base_url: &str, anon_key: &str) -> Self {
        Self {
            client: Client::new(),
            user_endpoint: format!("{}/auth/v1/user", base_url.trim_end_matches('/')),
            anon_key: anon_key.to_string(),
        }
    }
}

#[async_trait]
impl IdentityVerifier for SupabaseVerifier {
    async fn verify(&self, token: &str) -> Result<CallerIdentity> {
        let res = self
            .client
            .get(&self.user_endpoint)
            .header("apikey", &self.anon_key)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| AppError::InvalidToken(format!("Identity provider unreachable: {}", e)))?;

        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            return Err(AppError::InvalidToken(format!(
                "Identity provider rejected token ({}): {}",
                status, body
            )));
        }

        let user: ProviderUser = res
            .json()
            .await
            .map_err(|e| AppError::InvalidToken(format!("Unreadable user payload: {}", e)))?;

        Ok(user.into())
    }

    fn name(&self) -> &'static str {
        "supabase"
    }
}
