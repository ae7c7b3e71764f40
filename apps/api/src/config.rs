use std::path::PathBuf;

use anyhow::{Context, Result};

const DEFAULT_SMTP_HOST: &str = "smtp.gmail.com";
const DEFAULT_SMTP_PORT: u16 = 465;
const DEFAULT_SMTP_TIMEOUT_SECS: u64 = 30;

/// Application configuration loaded from environment variables.
///
/// Mail credentials are optional at startup; a submission arriving while they
/// are absent fails with a configuration error instead of crashing the process.
#[derive(Debug, Clone)]
pub struct Config {
    pub smtp_host: String,
    pub smtp_port: u16,
    pub smtp_mail: Option<String>,
    pub smtp_password: Option<String>,
    /// Recruiting inbox. Falls back to `smtp_mail` when unset.
    pub recipient_override: Option<String>,
    pub smtp_timeout_secs: u64,
    pub upload_dir: PathBuf,
    /// Empty means any origin is accepted.
    pub cors_allowed_origins: Vec<String>,
    pub port: u16,
    pub rust_log: String,
}

/// Account and secret for the SMTP relay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailCredentials {
    pub account: String,
    pub password: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            smtp_host: optional_env("SMTP_HOST").unwrap_or_else(|| DEFAULT_SMTP_HOST.to_string()),
            smtp_port: optional_env("SMTP_PORT")
                .map(|v| v.parse::<u16>())
                .transpose()
                .context("SMTP_PORT must be a valid port number")?
                .unwrap_or(DEFAULT_SMTP_PORT),
            smtp_mail: optional_env("SMTP_MAIL"),
            smtp_password: optional_env("SMTP_PASSWORD"),
            recipient_override: optional_env("SENDER_EMAIL"),
            smtp_timeout_secs: optional_env("SMTP_TIMEOUT_SECS")
                .map(|v| v.parse::<u64>())
                .transpose()
                .context("SMTP_TIMEOUT_SECS must be a whole number of seconds")?
                .unwrap_or(DEFAULT_SMTP_TIMEOUT_SECS),
            upload_dir: optional_env("UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| std::env::temp_dir().join("careers-uploads")),
            cors_allowed_origins: optional_env("CORS_ALLOWED_ORIGINS")
                .map(|v| parse_origin_list(&v))
                .unwrap_or_default(),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "7777".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }

    /// Both the account and the password must be present.
    pub fn mail_credentials(&self) -> Option<MailCredentials> {
        match (&self.smtp_mail, &self.smtp_password) {
            (Some(account), Some(password)) => Some(MailCredentials {
                account: account.clone(),
                password: password.clone(),
            }),
            _ => None,
        }
    }

    pub fn recipient(&self) -> Option<&str> {
        self.recipient_override
            .as_deref()
            .or(self.smtp_mail.as_deref())
    }
}

/// Reads a variable, trimming whitespace and treating blank values as unset.
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_origin_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
pub(crate) fn test_config(upload_dir: PathBuf) -> Config {
    Config {
        smtp_host: "smtp.test.local".to_string(),
        smtp_port: 465,
        smtp_mail: Some("careers@test.local".to_string()),
        smtp_password: Some("secret".to_string()),
        recipient_override: Some("hiring@test.local".to_string()),
        smtp_timeout_secs: 5,
        upload_dir,
        cors_allowed_origins: Vec::new(),
        port: 0,
        rust_log: "debug".to_string(),
    }
}
