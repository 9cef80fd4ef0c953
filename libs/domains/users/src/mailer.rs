//! Outbound mail seam used by the password-reset flow.

use async_trait::async_trait;

/// Minimal mail delivery port. Implementations decide the transport; the
/// domain only hands over addressed plain-text messages.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, to: &str, subject: &str, body: &str) -> eyre::Result<()>;
}

/// Mailer that logs instead of sending. Default in development and tests.
#[derive(Debug, Clone, Default)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, to: &str, subject: &str, body: &str) -> eyre::Result<()> {
        tracing::info!(to, subject, body, "Mail delivery (log only)");
        Ok(())
    }
}
