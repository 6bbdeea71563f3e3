//! Outgoing email port.

use async_trait::async_trait;

/// Delivers HTML email. Failures are reported, never retried.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, to: &str, html: &str, subject: &str) -> Result<(), MailError>;
}

#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("Invalid address: {0}")]
    Address(String),

    #[error("Failed to build message: {0}")]
    Message(String),

    #[error("Transport error: {0}")]
    Transport(String),
}
