use async_trait::async_trait;
use std::sync::Mutex;

/// Outbound delivery of reset links.
///
/// Delivery failures never reach the caller of the forgot-password flow; the
/// service logs them and still answers with the generic acknowledgement.
#[async_trait]
pub trait EmailProvider: Send + Sync {
    async fn send_password_reset_email(
        &self,
        to_email: &str,
        reset_token: &str,
    ) -> Result<(), anyhow::Error>;
}

/// Drops every message. Used until a real mail transport is wired in.
#[derive(Debug, Clone, Default)]
pub struct NoopEmailService;

#[async_trait]
impl EmailProvider for NoopEmailService {
    async fn send_password_reset_email(
        &self,
        _to_email: &str,
        _reset_token: &str,
    ) -> Result<(), anyhow::Error> {
        tracing::debug!("Password reset email delivery is disabled");
        Ok(())
    }
}

/// Records every reset email instead of sending it.
#[derive(Debug, Default)]
pub struct MockEmailService {
    sent: Mutex<Vec<(String, String)>>,
}

impl MockEmailService {
    pub fn new() -> Self {
        Self::default()
    }

    /// `(recipient, token)` pairs in send order.
    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent
            .lock()
            .map(|sent| sent.clone())
            .unwrap_or_default()
    }

    /// Token of the most recent message to `to_email`.
    pub fn last_token_for(&self, to_email: &str) -> Option<String> {
        self.sent()
            .into_iter()
            .rev()
            .find(|(to, _)| to == to_email)
            .map(|(_, token)| token)
    }
}

#[async_trait]
impl EmailProvider for MockEmailService {
    async fn send_password_reset_email(
        &self,
        to_email: &str,
        reset_token: &str,
    ) -> Result<(), anyhow::Error> {
        self.sent
            .lock()
            .map_err(|_| anyhow::anyhow!("mock mailbox poisoned"))?
            .push((to_email.to_string(), reset_token.to_string()));
        Ok(())
    }
}
