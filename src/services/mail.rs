//! Outbound mail
//!
//! `SmtpMailer` relays through the configured SMTP server. Without a `mail`
//! section the service falls back to `LogMailer`, which only records that a
//! message would have been sent.

use anyhow::{Context, Result};
use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use tracing::{info, warn};

use crate::config::MailConfig;

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<()>;
}

pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn new(config: &MailConfig) -> Result<Self> {
        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)
            .with_context(|| format!("Invalid SMTP relay: {}", config.smtp_host))?
            .port(config.smtp_port);

        if let (Some(user), Some(pass)) = (&config.username, &config.password) {
            builder = builder.credentials(Credentials::new(user.clone(), pass.clone()));
        }

        let from = config
            .from
            .parse::<Mailbox>()
            .with_context(|| format!("Invalid sender address: {}", config.from))?;

        Ok(Self {
            transport: builder.build(),
            from,
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<()> {
        let to_mailbox = to
            .parse::<Mailbox>()
            .with_context(|| format!("Invalid recipient address: {}", to))?;

        let message = Message::builder()
            .from(self.from.clone())
            .to(to_mailbox)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())
            .context("Failed to build email")?;

        self.transport
            .send(message)
            .await
            .context("Failed to send email")?;

        info!(to = %to, subject = %subject, "Email sent");
        Ok(())
    }
}

/// Mailer used when no SMTP relay is configured
#[derive(Debug, Clone, Default)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, to: &str, subject: &str, _body: &str) -> Result<()> {
        warn!(to = %to, subject = %subject, "SMTP not configured - email logged but not sent");
        Ok(())
    }
}
