//! Error types for form submission notifications.

use crate::models::Channel;
use thiserror::Error;

/// Result type for notification operations.
pub type NotificationResult<T> = Result<T, NotificationError>;

/// Errors that can occur while building or delivering a notification.
///
/// Invalid override addresses are not errors; they fall back to the next
/// source. Only collaborator failures surface here.
#[derive(Debug, Error)]
pub enum NotificationError {
    /// The notifiable has no route for the requested channel.
    #[error("Notifiable has no route for channel '{0}'")]
    MissingRoute(Channel),

    /// Field formatting failed.
    #[error("Field formatting error: {0}")]
    FormattingError(String),

    /// Template rendering error.
    #[error("Template rendering error: {0}")]
    TemplateError(String),

    /// No provider registered under the message's mail channel.
    #[error("No mailer registered for channel '{0}'")]
    UnknownMailer(String),

    /// Email provider error.
    #[error("Email provider error: {0}")]
    ProviderError(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl From<handlebars::RenderError> for NotificationError {
    fn from(err: handlebars::RenderError) -> Self {
        NotificationError::TemplateError(err.to_string())
    }
}

impl From<core_config::ConfigError> for NotificationError {
    fn from(err: core_config::ConfigError) -> Self {
        NotificationError::ConfigError(err.to_string())
    }
}

impl From<serde_json::Error> for NotificationError {
    fn from(err: serde_json::Error) -> Self {
        NotificationError::FormattingError(format!("JSON serialization error: {}", err))
    }
}
