use async_trait::async_trait;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};

use super::IdentityVerifier;
use crate::error::{AppError, Result};
use crate::models::{CallerIdentity, SupabaseClaims};

/// Audience the identity provider stamps on user session tokens
pub const SESSION_AUDIENCE: &str = "authenticated";

/// Verifies session JWTs locally with the provider's shared secret
#[derive(Clone)]
pub struct JwtVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtVerifier {
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(&[SESSION_AUDIENCE]);

        Self {
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    /// Validate a JWT token and return the claims
    pub fn validate_token(&self, token: &str) -> Result<SupabaseClaims> {
        let token_data = decode::<SupabaseClaims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| AppError::InvalidToken(e.to_string()))?;

        Ok(token_data.claims)
    }
}

#[async_trait]
impl IdentityVerifier for JwtVerifier {
    async fn verify(&self, token: &str) -> Result<CallerIdentity> {
        self.validate_token(token).map(CallerIdentity::from)
    }

    fn name(&self) -> &'static str {
        "jwt"
    }
}

#[cfg(test)]
pub(crate) fn issue_token(secret: &str, sub: &str, email: &str, ttl_seconds: i64) -> String {
    use chrono::Utc;
    use jsonwebtoken::{encode, EncodingKey, Header};

    let now = Utc::now().timestamp();
    let claims = SupabaseClaims {
        sub: sub.to_string(),
        email: Some(email.to_string()),
        aud: SESSION_AUDIENCE.to_string(),
        role: Some("authenticated".to_string()),
        iat: now,
        exp: now + ttl_seconds,
    };

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .expect("Should encode token")
}
