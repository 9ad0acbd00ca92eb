//! Outbound notifications. Messages are rendered from templates and handed to
//! a bounded queue; a background worker delivers them through a
//! [`MailTransport`].

mod queue;
pub mod templates;

use async_trait::async_trait;

pub use queue::{MailError, Mailer};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailMessage {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub body: String,
}

#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn send(&self, message: &MailMessage) -> anyhow::Result<()>;
}

/// Writes messages to the log instead of delivering them.
pub struct LogTransport;

#[async_trait]
impl MailTransport for LogTransport {
    async fn send(&self, message: &MailMessage) -> anyhow::Result<()> {
        tracing::info!(
            from = %message.from,
            to = %message.to,
            subject = %message.subject,
            bytes = message.body.len(),
            "mail delivered to log transport"
        );
        Ok(())
    }
}
