use std::env;
use std::str::FromStr;

pub const DEFAULT_SENDER: &str = "no-reply@scitech.support";
pub const DEFAULT_MESSAGE_STREAM: &str = "outbound";

/// Which transactional-email provider the mailer talks to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MailProvider {
    Postmark,
    Resend,
}

impl FromStr for MailProvider {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postmark" => Ok(MailProvider::Postmark),
            "resend" => Ok(MailProvider::Resend),
            other => Err(ConfigError::UnknownMailProvider(other.to_string())),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub server_host: String,
    pub server_port: u16,
    pub supabase_url: Option<String>,
    pub supabase_anon_key: Option<String>,
    pub supabase_jwt_secret: Option<String>,
    pub mail_provider: MailProvider,
    pub mail_api_key: String,
    pub mail_api_base_url: Option<String>,
    pub mail_from: String,
    pub message_stream: String,
    pub mail_max_retries: u32,
    pub mail_retry_base_ms: u64,
    pub log_json: bool,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = Config {
            server_host: env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            server_port: env::var("SERVER_PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidPort)?,
            supabase_url: non_empty_var("SUPABASE_URL"),
            supabase_anon_key: non_empty_var("SUPABASE_ANON_KEY"),
            supabase_jwt_secret: non_empty_var("SUPABASE_JWT_SECRET"),
            mail_provider: match non_empty_var("MAIL_PROVIDER") {
                Some(raw) => raw.parse()?,
                None => MailProvider::Postmark,
            },
            mail_api_key: non_empty_var("MAIL_API_KEY")
                .or_else(|| non_empty_var("RESEND_API_KEY"))
                .ok_or(ConfigError::MissingMailApiKey)?,
            mail_api_base_url: non_empty_var("MAIL_API_BASE_URL"),
            mail_from: sender_from_env(),
            message_stream: non_empty_var("MAIL_MESSAGE_STREAM")
                .unwrap_or_else(|| DEFAULT_MESSAGE_STREAM.to_string()),
            mail_max_retries: env::var("MAIL_MAX_RETRIES")
                .unwrap_or_else(|_| "0".to_string())
                .parse()
                .unwrap_or(0),
            mail_retry_base_ms: env::var("MAIL_RETRY_BASE_MS")
                .unwrap_or_else(|_| "200".to_string())
                .parse()
                .unwrap_or(200),
            log_json: env::var("LOG_FORMAT")
                .map(|v| v.eq_ignore_ascii_case("json"))
                .unwrap_or(false),
        };

        config.validate()?;
        Ok(config)
    }

    /// Either a local JWT secret or the remote identity endpoint must be usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.supabase_jwt_secret.is_some() {
            return Ok(());
        }
        if self.supabase_url.is_none() || self.supabase_anon_key.is_none() {
            return Err(ConfigError::MissingIdentityProvider);
        }
        Ok(())
    }

    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }
}

fn sender_from_env() -> String {
    non_empty_var("SMTP_SENDER")
        .or_else(|| non_empty_var("SUPABASE_SMTP_SENDER"))
        .unwrap_or_else(|| DEFAULT_SENDER.to_string())
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid server port")]
    InvalidPort,
    #[error("SUPABASE_URL and SUPABASE_ANON_KEY (or SUPABASE_JWT_SECRET) are required")]
    MissingIdentityProvider,
    #[error("MAIL_API_KEY (or RESEND_API_KEY) environment variable is required")]
    MissingMailApiKey,
    #[error("Unknown MAIL_PROVIDER: {0}")]
    UnknownMailProvider(String),
}

#[cfg(test)]
pub(crate) fn test_config() -> Config {
    Config {
        server_host: "localhost".to_string(),
        server_port: 8080,
        supabase_url: Some("http://localhost:54321".to_string()),
        supabase_anon_key: Some("anon-key".to_string()),
        supabase_jwt_secret: None,
        mail_provider: MailProvider::Postmark,
        mail_api_key: "test-mail-key".to_string(),
        mail_api_base_url: None,
        mail_from: DEFAULT_SENDER.to_string(),
        message_stream: DEFAULT_MESSAGE_STREAM.to_string(),
        mail_max_retries: 0,
        mail_retry_base_ms: 200,
        log_json: false,
    }
}
