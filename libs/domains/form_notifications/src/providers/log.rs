//! Mailer that writes emails to tracing output instead of sending them.
//!
//! Used as the `log` mail channel for local development. A provider built
//! with [`LogProvider::recording`] also keeps every email in memory so
//! callers can inspect what would have been sent.

use super::{EmailContent, EmailProvider, SentEmail};
use crate::error::NotificationResult;
use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Mutex;
use tracing::info;

#[derive(Clone, Default)]
pub struct LogProvider {
    logged: Arc<AtomicUsize>,
    outbox: Option<Arc<Mutex<Vec<EmailContent>>>>,
}

impl LogProvider {
    /// Log-only provider; emails are not retained.
    pub fn new() -> Self {
        Self::default()
    }

    /// Provider that also records every email it logs.
    pub fn recording() -> Self {
        Self {
            outbox: Some(Arc::default()),
            ..Self::default()
        }
    }

    /// All emails recorded so far. Always empty unless built with
    /// [`LogProvider::recording`].
    pub async fn sent_emails(&self) -> Vec<EmailContent> {
        match &self.outbox {
            Some(outbox) => outbox.lock().await.clone(),
            None => Vec::new(),
        }
    }

    /// Number of emails logged, recorded or not.
    pub fn sent_count(&self) -> usize {
        self.logged.load(Ordering::Relaxed)
    }

    /// Check if a recorded email went to a specific address
    pub async fn was_sent_to(&self, email: &str) -> bool {
        match &self.outbox {
            Some(outbox) => outbox.lock().await.iter().any(|e| e.to_email == email),
            None => false,
        }
    }
}

#[async_trait]
impl EmailProvider for LogProvider {
    async fn send(&self, email: &EmailContent) -> NotificationResult<SentEmail> {
        info!(
            to = %email.to_email,
            from = ?email.from.as_ref().map(|f| f.address.as_str()),
            reply_to = ?email.reply_to,
            subject = %email.subject,
            "--- EMAIL (log) ---\n{}\n--- END EMAIL ---",
            email.text_body
        );

        if let Some(outbox) = &self.outbox {
            outbox.lock().await.push(email.clone());
        }
        let count = self.logged.fetch_add(1, Ordering::Relaxed) + 1;

        Ok(SentEmail {
            message_id: Some(format!("log-{}", count)),
            accepted: true,
        })
    }

    fn name(&self) -> &'static str {
        "log"
    }

    async fn health_check(&self) -> NotificationResult<bool> {
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn email() -> EmailContent {
        EmailContent {
            to_email: "owner@example.com".to_string(),
            subject: "Test Subject".to_string(),
            text_body: "Test body".to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_log_provider_records_email() {
        let provider = LogProvider::recording();

        let result = provider.send(&email()).await.unwrap();
        assert!(result.accepted);
        assert_eq!(result.message_id.as_deref(), Some("log-1"));

        assert_eq!(provider.sent_count(), 1);
        assert_eq!(provider.sent_emails().await.len(), 1);
        assert!(provider.was_sent_to("owner@example.com").await);
        assert!(!provider.was_sent_to("other@example.com").await);
    }

    #[tokio::test]
    async fn test_log_provider_does_not_retain_by_default() {
        let provider = LogProvider::new();

        for _ in 0..3 {
            provider.send(&email()).await.unwrap();
        }
        let result = provider.send(&email()).await.unwrap();

        assert_eq!(result.message_id.as_deref(), Some("log-4"));
        assert_eq!(provider.sent_count(), 4);
        assert!(provider.sent_emails().await.is_empty());
        assert!(!provider.was_sent_to("owner@example.com").await);
    }

    #[tokio::test]
    async fn test_log_provider_clones_share_outbox() {
        let provider = LogProvider::recording();
        let clone = provider.clone();

        clone.send(&EmailContent::default()).await.unwrap();

        assert_eq!(provider.sent_count(), 1);
        assert_eq!(provider.sent_emails().await.len(), 1);
        assert!(provider.health_check().await.unwrap());
    }
}
