//! Form Submission Notifications
//!
//! Builds the email a form owner receives when someone submits their form.
//!
//! # Features
//!
//! - From address policy (integration sender on self-hosted, plus-tagged
//!   system sender on hosted)
//! - Reply-To resolution (integration override, then the respondent's own
//!   email, then the owner's address)
//! - Field formatting with links and signed file URLs
//! - Handlebars rendering and delivery through named mailers
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │  FormSubmitted  │  ← form definition + submitted data
//! └────────┬────────┘
//!          │
//! ┌────────▼─────────────────────┐
//! │ FormSubmissionNotification   │  ← from / reply-to / subject
//! └────────┬─────────────────────┘
//!          │ OutboundMessage
//! ┌────────▼────────┐
//! │ MailDispatcher  │  ← renders template, picks mailer by channel name
//! └────────┬────────┘
//!          │
//! ┌────────▼────────┐
//! │ Email Provider  │  ← SMTP, log
//! └─────────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use form_notifications::{
//!     Channel, FormSubmissionNotification, MailDispatcher, Notifiable, NotificationContext,
//!     SubmissionFormatter, SystemClock, TemplateEngine,
//! };
//!
//! let notification = FormSubmissionNotification::new(event, settings, "smtp", context);
//! let dispatcher = MailDispatcher::new(TemplateEngine::new()?)
//!     .with_mailer("smtp", Arc::new(SmtpProvider::from_env()?));
//!
//! dispatcher
//!     .send(&notification, &Notifiable::route(Channel::Mail, "owner@example.com"))
//!     .await?;
//! ```

pub mod clock;
pub mod dispatcher;
pub mod error;
pub mod formatter;
pub mod models;
pub mod notification;
pub mod providers;
pub mod templates;
pub mod validation;

// Re-export commonly used types
pub use clock::{Clock, FixedClock, SystemClock};
pub use dispatcher::MailDispatcher;
pub use error::{NotificationError, NotificationResult};
pub use formatter::{FieldFormatter, FileUrlConfig, FormatOptions, SubmissionFormatter};
pub use models::{
    Channel, FieldDefinition, FormDefinition, FormSubmitted, FormattedField, IntegrationSettings,
    MailAddress, Notifiable, OutboundMessage, SubmissionData, SubmissionTemplateData,
};
pub use notification::{build, channels, FormSubmissionNotification, NotificationContext};
pub use providers::{EmailProvider, LogProvider, SmtpProvider};
pub use templates::TemplateEngine;
pub use validation::is_valid_email;
