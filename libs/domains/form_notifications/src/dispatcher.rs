//! Hands built notifications to the mailer their mail channel names.
//!
//! One attempt per send. Retries, queueing and dead-lettering belong to
//! whatever runs the dispatcher.

use crate::error::{NotificationError, NotificationResult};
use crate::models::{Channel, Notifiable, OutboundMessage};
use crate::notification::FormSubmissionNotification;
use crate::providers::{EmailContent, EmailProvider, SentEmail};
use crate::templates::TemplateEngine;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{error, info};

/// Mailer registry plus the template engine.
#[derive(Clone)]
pub struct MailDispatcher {
    templates: Arc<TemplateEngine>,
    mailers: HashMap<String, Arc<dyn EmailProvider>>,
}

impl MailDispatcher {
    pub fn new(templates: TemplateEngine) -> Self {
        Self {
            templates: Arc::new(templates),
            mailers: HashMap::new(),
        }
    }

    /// Register a provider under a mail channel name (e.g. "smtp", "log").
    pub fn with_mailer(mut self, name: impl Into<String>, provider: Arc<dyn EmailProvider>) -> Self {
        self.mailers.insert(name.into(), provider);
        self
    }

    pub fn has_mailer(&self, name: &str) -> bool {
        self.mailers.contains_key(name)
    }

    /// Build, render and send `notification` on each of its channels.
    pub async fn send(
        &self,
        notification: &FormSubmissionNotification,
        notifiable: &Notifiable,
    ) -> NotificationResult<Vec<SentEmail>> {
        let mut sent = Vec::new();

        for channel in notification.via(notifiable) {
            match channel {
                Channel::Mail => {
                    let message = notification.to_mail(notifiable)?;
                    let to = notifiable
                        .route_for(Channel::Mail)
                        .ok_or(NotificationError::MissingRoute(Channel::Mail))?;
                    sent.push(self.deliver(&message, to).await?);
                }
            }
        }

        Ok(sent)
    }

    /// Render `message` and send it to `to` through its mailer.
    pub async fn deliver(&self, message: &OutboundMessage, to: &str) -> NotificationResult<SentEmail> {
        let provider = self
            .mailers
            .get(&message.mail_channel)
            .ok_or_else(|| NotificationError::UnknownMailer(message.mail_channel.clone()))?;

        let rendered = self.templates.render_message(message)?;

        let email = EmailContent {
            to_email: to.to_string(),
            to_name: String::new(),
            from: Some(message.from.clone()),
            subject: rendered.subject,
            html_body: rendered.html,
            text_body: rendered.text,
            reply_to: Some(message.reply_to.clone()),
        };

        let result = provider.send(&email).await.map_err(|e| {
            error!(
                mailer = %message.mail_channel,
                provider = provider.name(),
                to = %to,
                error = %e,
                "Failed to send form submission notification"
            );
            e
        })?;

        info!(
            mailer = %message.mail_channel,
            provider = provider.name(),
            to = %to,
            reply_to = %message.reply_to,
            message_id = ?result.message_id,
            "Sent form submission notification"
        );

        Ok(result)
    }
}
