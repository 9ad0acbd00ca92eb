use std::{sync::Arc, time::Duration};

use tokio::sync::mpsc;

use super::{MailMessage, MailTransport};
use crate::config::MailConfig;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum MailError {
    #[error("mail queue is full")]
    Timeout,
    #[error("mail worker has stopped")]
    Closed,
}

/// Cheap to clone handle onto the mail queue.
#[derive(Clone)]
pub struct Mailer {
    from: String,
    tx: mpsc::Sender<MailMessage>,
    enqueue_timeout: Duration,
}

impl Mailer {
    /// Starts the delivery worker on the current runtime.
    pub fn spawn(cfg: &MailConfig, transport: Arc<dyn MailTransport>) -> Self {
        let (tx, mut rx) = mpsc::channel::<MailMessage>(cfg.queue_capacity.max(1));
        tokio::spawn(async move {
            while let Some(message) = rx.recv().await {
                if let Err(err) = transport.send(&message).await {
                    tracing::warn!(to = %message.to, subject = %message.subject, error = %err, "mail delivery failed");
                }
            }
            tracing::debug!("mail worker stopped");
        });
        Self::from_sender(cfg, tx)
    }

    pub(crate) fn from_sender(cfg: &MailConfig, tx: mpsc::Sender<MailMessage>) -> Self {
        Self {
            from: cfg.from.clone(),
            tx,
            enqueue_timeout: Duration::from_millis(cfg.enqueue_timeout_ms),
        }
    }

    pub fn message(&self, to: &str, subject: String, body: String) -> MailMessage {
        MailMessage {
            from: self.from.clone(),
            to: to.to_string(),
            subject,
            body,
        }
    }

    pub async fn enqueue(&self, message: MailMessage) -> Result<(), MailError> {
        match tokio::time::timeout(self.enqueue_timeout, self.tx.send(message)).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(_)) => Err(MailError::Closed),
            Err(_) => Err(MailError::Timeout),
        }
    }

    /// Best effort: a failed enqueue is logged and otherwise ignored.
    pub async fn notify(&self, message: MailMessage) {
        let to = message.to.clone();
        let subject = message.subject.clone();
        match self.enqueue(message).await {
            Ok(()) => tracing::info!(%to, %subject, "mail queued"),
            Err(err) => tracing::warn!(%to, %subject, error = %err, "mail not queued"),
        }
    }
}
