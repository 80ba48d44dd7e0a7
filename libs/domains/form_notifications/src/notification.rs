//! The email sent to form owners when a form is submitted.

use crate::clock::Clock;
use crate::error::{NotificationError, NotificationResult};
use crate::formatter::{FieldFormatter, FormatOptions};
use crate::models::{
    Channel, FormSubmitted, IntegrationSettings, MailAddress, Notifiable, OutboundMessage,
    SubmissionTemplateData,
};
use crate::validation::is_valid_email;
use core_config::MailConfig;
use std::sync::Arc;
use tracing::debug;

/// Template used to render the notification.
pub const TEMPLATE_NAME: &str = "form-submission-notification";

const CHANNELS: &[Channel] = &[Channel::Mail];

/// Channels this notification is delivered on.
pub fn channels() -> &'static [Channel] {
    CHANNELS
}

/// Collaborators injected into every notification.
#[derive(Clone)]
pub struct NotificationContext {
    pub config: Arc<MailConfig>,
    pub formatter: Arc<dyn FieldFormatter>,
    pub clock: Arc<dyn Clock>,
}

impl NotificationContext {
    pub fn new(config: MailConfig, formatter: Arc<dyn FieldFormatter>, clock: Arc<dyn Clock>) -> Self {
        Self {
            config: Arc::new(config),
            formatter,
            clock,
        }
    }
}

/// Notification for a single form submission.
pub struct FormSubmissionNotification {
    event: FormSubmitted,
    integration: IntegrationSettings,
    mailer: String,
    context: NotificationContext,
}

impl FormSubmissionNotification {
    pub fn new(
        event: FormSubmitted,
        integration: IntegrationSettings,
        mailer: impl Into<String>,
        context: NotificationContext,
    ) -> Self {
        Self {
            event,
            integration,
            mailer: mailer.into(),
            context,
        }
    }

    /// Delivery channels; always mail.
    pub fn via(&self, _notifiable: &Notifiable) -> Vec<Channel> {
        channels().to_vec()
    }

    /// Build the outbound email for `notifiable`.
    pub fn to_mail(&self, notifiable: &Notifiable) -> NotificationResult<OutboundMessage> {
        let default_reply_to = notifiable
            .route_for(Channel::Mail)
            .ok_or(NotificationError::MissingRoute(Channel::Mail))?;

        let fields = self.context.formatter.format(
            &self.event.form,
            &self.event.data,
            &FormatOptions::for_notification(),
        )?;

        Ok(OutboundMessage {
            mail_channel: self.mailer.clone(),
            reply_to: self.reply_to_address(default_reply_to),
            from: MailAddress::new(self.from_address(), self.context.config.app_name.clone()),
            subject: format!("New form submission for \"{}\"", self.event.form.title),
            template_name: TEMPLATE_NAME.to_string(),
            template_data: SubmissionTemplateData {
                fields,
                form: self.event.form.clone(),
            },
        })
    }

    /// From address for this notification.
    ///
    /// Self-hosted instances may use the integration's sender when it is
    /// valid. Hosted instances always send from the configured address,
    /// plus-tagged with the current unix timestamp.
    pub fn from_address(&self) -> String {
        let config = &self.context.config;

        if config.is_self_hosted() {
            if let Some(from) = self
                .integration
                .notification_from_email
                .as_deref()
                .filter(|email| is_valid_email(email))
            {
                return from.to_string();
            }
            return config.from_address.clone();
        }

        let local = config.from_address.split('@').next().unwrap_or_default();
        let domain = config.from_address.rsplit('@').next().unwrap_or_default();

        format!("{}+{}@{}", local, self.context.clock.now().timestamp(), domain)
    }

    /// Reply-To address: integration override, then the respondent's email,
    /// then `default`.
    pub fn reply_to_address(&self, default: &str) -> String {
        if let Some(reply_to) = self
            .integration
            .notification_reply_to
            .as_deref()
            .filter(|email| is_valid_email(email))
        {
            return reply_to.to_string();
        }

        self.respondent_email()
            .unwrap_or(default)
            .to_string()
    }

    /// The submitted value of the form's only visible email field, if valid.
    pub fn respondent_email(&self) -> Option<&str> {
        let mut email_fields = self
            .event
            .form
            .properties
            .iter()
            .filter(|field| field.is_visible_email());

        let (Some(field), None) = (email_fields.next(), email_fields.next()) else {
            debug!(form_id = %self.event.form.id, "No single email field, skipping respondent reply-to");
            return None;
        };

        self.event
            .data
            .get(&field.id)
            .and_then(|value| value.as_str())
            .filter(|email| is_valid_email(email))
    }
}

/// Build the outbound message for a submission in one call.
pub fn build(
    event: FormSubmitted,
    integration: IntegrationSettings,
    mailer: impl Into<String>,
    context: NotificationContext,
    notifiable: &Notifiable,
) -> NotificationResult<OutboundMessage> {
    FormSubmissionNotification::new(event, integration, mailer, context).to_mail(notifiable)
}
