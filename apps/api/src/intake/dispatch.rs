//! Message dispatch: the seam between the intake pipeline and the mail relay.
//!
//! `AppState` holds an `Arc<dyn MessageDispatcher>`. Production wires in
//! `SmtpDispatcher`; tests substitute a recording fake.

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use lettre::message::{header::ContentType, Attachment, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::config::{Config, MailCredentials};
use crate::intake::compose::OutboundMessage;

/// Port on which the relay expects TLS from the first byte.
const IMPLICIT_TLS_PORT: u16 = 465;

/// SMTP reply codes that mean the relay refused our credentials.
const AUTH_FAILURE_CODES: &[&str] = &["530", "534", "535"];

/// Why a dispatch failed. Closed set; anything unclassified lands in `Other`
/// with the provider's own text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    #[error("authentication failed: {0}")]
    Authentication(String),

    #[error("connection failed: {0}")]
    Connection(String),

    #[error("timed out waiting for the mail server")]
    Timeout,

    #[error("{0}")]
    Other(String),
}

impl DispatchError {
    pub fn user_message(&self) -> String {
        match self {
            DispatchError::Authentication(_) => {
                "Email authentication failed. Please check your SMTP credentials.".to_string()
            }
            DispatchError::Connection(_) => {
                "Could not connect to email server. Please check your SMTP settings.".to_string()
            }
            DispatchError::Timeout => "Email server timed out. Please try again later.".to_string(),
            DispatchError::Other(raw) if raw.trim().is_empty() => {
                "Failed to send email".to_string()
            }
            DispatchError::Other(raw) => raw.clone(),
        }
    }
}

/// Proof of handoff to the relay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryReceipt {
    pub message_id: String,
}

#[async_trait]
pub trait MessageDispatcher: Send + Sync {
    async fn dispatch(&self, message: &OutboundMessage) -> Result<DeliveryReceipt, DispatchError>;

    /// Connectivity probe used for startup diagnostics. Never fatal.
    async fn check_connection(&self) -> Result<(), DispatchError> {
        Ok(())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// SmtpDispatcher
// ────────────────────────────────────────────────────────────────────────────

/// Relays messages over SMTP with `lettre`. Built once at startup.
pub struct SmtpDispatcher {
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpDispatcher {
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let relay = if config.smtp_port == IMPLICIT_TLS_PORT {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&config.smtp_host)
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)
        };
        let builder =
            relay.with_context(|| format!("Invalid SMTP relay host '{}'", config.smtp_host))?;

        let mut builder = builder
            .port(config.smtp_port)
            .timeout(Some(Duration::from_secs(config.smtp_timeout_secs)));

        if let Some(MailCredentials { account, password }) = config.mail_credentials() {
            builder = builder.credentials(Credentials::new(account, password));
        } else {
            warn!("SMTP credentials not set; submissions will be refused until configured");
        }

        info!(
            host = %config.smtp_host,
            port = config.smtp_port,
            "Created SMTP transport"
        );

        Ok(Self {
            transport: builder.build(),
        })
    }

    async fn build_message(
        message: &OutboundMessage,
        message_id: &str,
    ) -> Result<Message, DispatchError> {
        let from: Mailbox = parse_mailbox(&message.from)?;
        let to: Mailbox = parse_mailbox(&message.to)?;

        let alternative = MultiPart::alternative()
            .singlepart(
                SinglePart::builder()
                    .header(ContentType::TEXT_PLAIN)
                    .body(message.text_body.clone()),
            )
            .singlepart(
                SinglePart::builder()
                    .header(ContentType::TEXT_HTML)
                    .body(message.html_body.clone()),
            );

        let body = match &message.attachment {
            None => alternative,
            Some(attachment) => {
                let content = tokio::fs::read(&attachment.path).await.map_err(|e| {
                    error!(
                        path = %attachment.path.display(),
                        error = %e,
                        "Staged attachment unreadable"
                    );
                    DispatchError::Other(format!("Could not read attached resume: {e}"))
                })?;
                let content_type = ContentType::parse(&attachment.content_type)
                    .map_err(|e| DispatchError::Other(format!("Invalid content type: {e}")))?;
                MultiPart::mixed()
                    .multipart(alternative)
                    .singlepart(
                        Attachment::new(attachment.filename.clone()).body(content, content_type),
                    )
            }
        };

        Message::builder()
            .from(from)
            .to(to)
            .subject(message.subject.clone())
            .message_id(Some(message_id.to_string()))
            .multipart(body)
            .map_err(|e| DispatchError::Other(format!("Failed to build message: {e}")))
    }
}

#[async_trait]
impl MessageDispatcher for SmtpDispatcher {
    async fn dispatch(&self, message: &OutboundMessage) -> Result<DeliveryReceipt, DispatchError> {
        let message_id = generate_message_id(&message.from);
        let email = Self::build_message(message, &message_id).await?;

        debug!(to = %message.to, message_id = %message_id, "Sending email");
        match self.transport.send(email).await {
            Ok(_) => {
                info!(message_id = %message_id, "Email sent successfully");
                Ok(DeliveryReceipt { message_id })
            }
            Err(e) => {
                error!(error = %e, "Failed to send email");
                Err(classify_smtp_error(&e))
            }
        }
    }

    async fn check_connection(&self) -> Result<(), DispatchError> {
        match self.transport.test_connection().await {
            Ok(true) => Ok(()),
            Ok(false) => Err(DispatchError::Connection(
                "Mail server did not accept the connection".to_string(),
            )),
            Err(e) => Err(classify_smtp_error(&e)),
        }
    }
}

fn parse_mailbox(address: &str) -> Result<Mailbox, DispatchError> {
    address.parse().map_err(|e| {
        error!(error = %e, address = %address, "Invalid email address");
        DispatchError::Other(format!("Invalid email address '{address}': {e}"))
    })
}

/// `<uuid@domain>`, with the domain taken from the sender address.
fn generate_message_id(from: &str) -> String {
    let domain = from
        .rsplit_once('@')
        .map(|(_, d)| d.trim_end_matches('>').trim())
        .filter(|d| !d.is_empty())
        .unwrap_or("localhost");
    format!("<{}@{}>", uuid::Uuid::new_v4(), domain)
}

fn classify_smtp_error(e: &lettre::transport::smtp::Error) -> DispatchError {
    let raw = e.to_string();
    if e.is_timeout() {
        return DispatchError::Timeout;
    }
    match e.status() {
        Some(code) => classify_reply_code(&code.to_string(), raw),
        None if e.is_client() => DispatchError::Other(raw),
        None => DispatchError::Connection(raw),
    }
}

fn classify_reply_code(code: &str, raw: String) -> DispatchError {
    if AUTH_FAILURE_CODES.contains(&code) {
        DispatchError::Authentication(raw)
    } else {
        DispatchError::Other(raw)
    }
}
