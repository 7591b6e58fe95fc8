use std::sync::Mutex;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq)]
pub struct OutgoingEmail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

#[derive(Debug, Error)]
#[error("mail delivery failed: {0}")]
pub struct MailError(pub String);

/// Transactional email. Delivery itself belongs to the hosted provider.
pub trait Mailer: Send + Sync {
    fn send(&self, email: OutgoingEmail) -> Result<(), MailError>;
}

/// Hands mail to the log; used when no provider is wired in.
pub struct LogMailer;

impl Mailer for LogMailer {
    fn send(&self, email: OutgoingEmail) -> Result<(), MailError> {
        tracing::info!(to = %email.to, subject = %email.subject, "outgoing email");
        Ok(())
    }
}

/// Keeps every message in memory so callers can inspect what was sent.
#[derive(Default)]
pub struct MemoryMailer {
    sent: Mutex<Vec<OutgoingEmail>>,
}

impl MemoryMailer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<OutgoingEmail> {
        self.sent.lock().map(|sent| sent.clone()).unwrap_or_default()
    }
}

impl Mailer for MemoryMailer {
    fn send(&self, email: OutgoingEmail) -> Result<(), MailError> {
        let mut sent = self
            .sent
            .lock()
            .map_err(|_| MailError("outbox lock poisoned".to_string()))?;
        sent.push(email);
        Ok(())
    }
}
