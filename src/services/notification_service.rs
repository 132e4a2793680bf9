use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Attachment, Mailbox, MultiPart, SinglePart},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use tracing::{error, info};

use crate::config::SmtpConfig;
use crate::errors::AppError;
use crate::models::OutgoingEmail;

/// Delivery channel for the report email.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), AppError>;
}

/// Sends through an authenticated SMTP relay using lettre.
pub struct SmtpMailer {
    host: String,
    port: u16,
    starttls: bool,
    credentials: Credentials,
    from: Mailbox,
    to: Mailbox,
}

impl SmtpMailer {
    pub fn from_config(config: &SmtpConfig) -> Result<Self, AppError> {
        let username = require(&config.username, "SMTP_USERNAME")?;
        let password = require(&config.password, "SMTP_PASSWORD")?;
        let from_email = require(&config.from_email, "SMTP_FROM_EMAIL")?;
        let to_email = require(&config.to_email, "SMTP_TO_EMAIL")?;

        let from = format!("{} <{}>", config.from_name, from_email)
            .parse::<Mailbox>()
            .map_err(|e| AppError::Config(format!("Invalid from address: {}", e)))?;
        let to = to_email
            .parse::<Mailbox>()
            .map_err(|e| AppError::Config(format!("Invalid to address: {}", e)))?;

        Ok(Self {
            host: config.host.clone(),
            port: config.port,
            starttls: config.starttls,
            credentials: Credentials::new(username, password),
            from,
            to,
        })
    }

    fn transport(&self) -> Result<AsyncSmtpTransport<Tokio1Executor>, AppError> {
        let builder = if self.starttls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.host)
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&self.host)
        }
        .map_err(|e| AppError::Mail(format!("Failed to create SMTP transport: {}", e)))?;

        Ok(builder
            .port(self.port)
            .credentials(self.credentials.clone())
            .build())
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), AppError> {
        let message = build_message(self.from.clone(), self.to.clone(), email)?;
        let mailer = self.transport()?;

        info!("🔌 Connecting to SMTP server: {}:{}", self.host, self.port);
        info!("📤 Sending email to {}...", self.to);
        match mailer.send(message).await {
            Ok(_) => {
                info!("✅ Email sent successfully to {}", self.to);
                Ok(())
            }
            Err(e) => {
                error!("❌ SMTP Error: {:?}", e);
                Err(AppError::Mail(format!("SMTP send failed: {}", e)))
            }
        }
    }
}

/// Logs the email instead of sending it (SMTP disabled).
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), AppError> {
        info!("📧 Email would be sent (SMTP disabled):");
        info!("   Subject: {}", email.subject);
        info!("   Body:\n{}", email.body);
        if let Some(attachment) = &email.attachment {
            info!("   Attachment: {} ({} bytes)", attachment.filename, attachment.data.len());
        }
        Ok(())
    }
}

pub fn build_message(from: Mailbox, to: Mailbox, email: &OutgoingEmail) -> Result<Message, AppError> {
    let mut parts = MultiPart::mixed().singlepart(
        SinglePart::builder()
            .header(ContentType::TEXT_PLAIN)
            .body(email.body.clone()),
    );

    if let Some(attachment) = &email.attachment {
        let content_type = ContentType::parse(&attachment.content_type)
            .map_err(|e| AppError::Mail(format!("Invalid attachment content type: {}", e)))?;
        parts = parts.singlepart(
            Attachment::new(attachment.filename.clone()).body(attachment.data.clone(), content_type),
        );
    }

    Message::builder()
        .from(from)
        .to(to)
        .subject(email.subject.clone())
        .multipart(parts)
        .map_err(|e| AppError::Mail(format!("Failed to build email: {}", e)))
}

fn require(value: &Option<String>, key: &str) -> Result<String, AppError> {
    value
        .clone()
        .ok_or_else(|| AppError::Config(format!("{} not set", key)))
}
