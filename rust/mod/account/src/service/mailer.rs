use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
#[error("mail failed: {0}")]
pub struct MailError(pub String);

/// Outbound mail. Account flows treat delivery as best effort.
pub trait Mailer: Send + Sync {
    fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), MailError>;
}

/// Writes mails to the log instead of delivering them.
pub struct LogMailer;

impl Mailer for LogMailer {
    fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), MailError> {
        info!(to = %to, subject = %subject, body = %body, "mail");
        Ok(())
    }
}
