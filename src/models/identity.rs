use serde::{Deserialize, Serialize};

/// Who invoked the service, resolved from the bearer token for one request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerIdentity {
    pub user_id: Option<String>,
    pub email: String,
}

impl CallerIdentity {
    pub fn new(user_id: Option<String>, email: impl Into<String>) -> Self {
        Self {
            user_id,
            email: email.into(),
        }
    }

    /// Local part of the email, used as the commenter name
    pub fn display_name(&self) -> &str {
        self.email.split('@').next().unwrap_or_default()
    }
}

/// Session JWT claims issued by the identity provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupabaseClaims {
    pub sub: String,
    #[serde(default)]
    pub email: Option<String>,
    pub aud: String,
    #[serde(default)]
    pub role: Option<String>,
    pub iat: i64,
    pub exp: i64,
}

/// User payload returned by the identity provider's `/auth/v1/user` endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderUser {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

impl From<ProviderUser> for CallerIdentity {
    fn from(user: ProviderUser) -> Self {
        CallerIdentity::new(Some(user.id), user.email.unwrap_or_default())
    }
}

impl From<SupabaseClaims> for CallerIdentity {
    fn from(claims: SupabaseClaims) -> Self {
        CallerIdentity::new(Some(claims.sub), claims.email.unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_name_is_local_part() {
        let caller = CallerIdentity::new(None, "alice.smith@uni.canberra.edu.au");
        assert_eq!(caller.display_name(), "alice.smith");
    }

    #[test]
    fn test_display_name_without_at_sign() {
        assert_eq!(CallerIdentity::new(None, "service").display_name(), "service");
        assert_eq!(CallerIdentity::new(None, "").display_name(), "");
    }

    #[test]
    fn test_provider_user_without_email() {
        let user: ProviderUser = serde_json::from_str(r#"{"id":"u-1","email":null}"#).unwrap();
        let caller = CallerIdentity::from(user);
        assert_eq!(caller.user_id.as_deref(), Some("u-1"));
        assert_eq!(caller.email, "");
    }
}
