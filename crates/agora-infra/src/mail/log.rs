use async_trait::async_trait;

use agora_core::ports::{MailError, Mailer};

/// Writes messages to the log instead of sending them. Reset links can be
/// copied from the output during development.
#[derive(Debug, Default, Clone)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, to: &str, html: &str, subject: &str) -> Result<(), MailError> {
        if !to.contains('@') {
            return Err(MailError::Address(to.to_string()));
        }

        tracing::info!(%to, %subject, body = %html, "Mail not sent (log mailer)");
        Ok(())
    }
}
