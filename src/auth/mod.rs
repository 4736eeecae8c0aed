pub mod jwt;
pub mod supabase;

use std::sync::Arc;

use async_trait::async_trait;
use axum::http::{header, HeaderMap};

use crate::config::Config;
use crate::error::{AppError, Result};
use crate::models::CallerIdentity;

pub use jwt::JwtVerifier;
pub use supabase::SupabaseVerifier;

/// Resolves a bearer token into the caller's identity
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    /// Fails with `InvalidToken` when the provider rejects the token or cannot be reached
    async fn verify(&self, token: &str) -> Result<CallerIdentity>;

    fn name(&self) -> &'static str;
}

/// Pick the verifier the configuration asks for
pub fn verifier_from_config(config: &Config) -> Result<Arc<dyn IdentityVerifier>> {
    if let Some(secret) = &config.supabase_jwt_secret {
        return Ok(Arc::new(JwtVerifier::new(secret)));
    }

    match (&config.supabase_url, &config.supabase_anon_key) {
        (Some(url), Some(anon_key)) => Ok(Arc::new(SupabaseVerifier::new(url, anon_key))),
        _ => Err(AppError::UnexpectedError(
            "Identity provider is not configured".to_string(),
        )),
    }
}

/// Extract the token from an `Authorization: Bearer <token>` header
pub fn bearer_token(headers: &HeaderMap) -> Result<&str> {
    let value = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(AppError::Unauthenticated)?;

    let (scheme, token) = value.trim().split_once(' ').ok_or(AppError::Unauthenticated)?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(AppError::Unauthenticated);
    }

    let token = token.trim();
    if token.is_empty() {
        return Err(AppError::Unauthenticated);
    }

    Ok(token)
}
