//! Data models for form submission notifications.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use strum::{Display, EnumString};

/// Submitted values keyed by field id.
pub type SubmissionData = Map<String, Value>;

// ============================================================================
// Submission Event
// ============================================================================

/// A single field of a form.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FieldDefinition {
    pub id: String,
    /// Display label.
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: String,
    #[serde(default, deserialize_with = "deserialize_truthy")]
    pub hidden: bool,
    /// Display metadata the formatter may read (placeholder, options, ...).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl FieldDefinition {
    pub fn new(id: impl Into<String>, name: impl Into<String>, field_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            field_type: field_type.into(),
            hidden: false,
            extra: Map::new(),
        }
    }

    /// Builder method to mark the field hidden.
    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    /// Whether this field is a visible email input.
    pub fn is_visible_email(&self) -> bool {
        !self.hidden && self.field_type == "email"
    }
}

/// Loose boolean: `null`, `false`, `0`, `""` and `"0"` are false, anything else is true.
fn deserialize_truthy<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Null => false,
        Value::Bool(b) => b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => !(s.is_empty() || s == "0"),
        Value::Array(items) => !items.is_empty(),
        Value::Object(_) => true,
    })
}

/// A form definition as stored by the form builder.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FormDefinition {
    #[serde(default)]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub properties: Vec<FieldDefinition>,
}

impl FormDefinition {
    pub fn new(title: impl Into<String>, properties: Vec<FieldDefinition>) -> Self {
        Self {
            id: String::new(),
            title: title.into(),
            properties,
        }
    }

    /// Builder method to set the form id.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }
}

/// Raised when a respondent submits a form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormSubmitted {
    pub form: FormDefinition,
    #[serde(default)]
    pub data: SubmissionData,
}

impl FormSubmitted {
    pub fn new(form: FormDefinition, data: SubmissionData) -> Self {
        Self { form, data }
    }
}

/// Per-integration notification overrides.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IntegrationSettings {
    #[serde(default)]
    pub notification_from_email: Option<String>,
    #[serde(default)]
    pub notification_reply_to: Option<String>,
}

// ============================================================================
// Routing
// ============================================================================

/// Delivery channels a notification can use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Channel {
    Mail,
}

/// An on-demand recipient, addressed by per-channel routes.
#[derive(Debug, Clone, Default)]
pub struct Notifiable {
    routes: HashMap<Channel, String>,
}

impl Notifiable {
    /// Create a notifiable with a single route.
    pub fn route(channel: Channel, address: impl Into<String>) -> Self {
        Self::default().with_route(channel, address)
    }

    /// Builder method to add a route.
    pub fn with_route(mut self, channel: Channel, address: impl Into<String>) -> Self {
        self.routes.insert(channel, address.into());
        self
    }

    pub fn route_for(&self, channel: Channel) -> Option<&str> {
        self.routes.get(&channel).map(String::as_str)
    }
}

// ============================================================================
// Outbound Message
// ============================================================================

/// A formatted field ready for display.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FormattedField {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: String,
    pub value: Value,
}

/// An address with a display name.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MailAddress {
    pub address: String,
    pub name: String,
}

impl MailAddress {
    pub fn new(address: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            name: name.into(),
        }
    }
}

/// Data handed to the `form-submission-notification` template.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionTemplateData {
    pub fields: Vec<FormattedField>,
    pub form: FormDefinition,
}

/// A fully-specified email, ready to hand to a mailer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutboundMessage {
    /// Name of the mailer that should deliver this message.
    pub mail_channel: String,
    pub reply_to: String,
    pub from: MailAddress,
    pub subject: String,
    pub template_name: String,
    pub template_data: SubmissionTemplateData,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_field_definition_defaults_from_json() {
        let field: FieldDefinition = serde_json::from_value(json!({
            "id": "f1",
            "type": "email",
            "placeholder": "you@example.com"
        }))
        .unwrap();

        assert_eq!(field.name, "");
        assert!(!field.hidden);
        assert!(field.is_visible_email());
        assert_eq!(field.extra.get("placeholder"), Some(&json!("you@example.com")));
    }

    #[test]
    fn test_hidden_accepts_loose_values() {
        let hidden = |value: Value| {
            serde_json::from_value::<FieldDefinition>(json!({
                "id": "e",
                "type": "email",
                "hidden": value
            }))
            .unwrap()
            .hidden
        };

        assert!(!hidden(Value::Null));
        assert!(!hidden(json!(0)));
        assert!(!hidden(json!("")));
        assert!(!hidden(json!(false)));
        assert!(hidden(json!(1)));
        assert!(hidden(json!("yes")));
        assert!(hidden(json!(true)));
    }

    #[test]
    fn test_hidden_email_is_not_visible_email() {
        let field = FieldDefinition::new("f1", "Email", "email").hidden();
        assert!(!field.is_visible_email());
    }

    #[test]
    fn test_integration_settings_missing_keys() {
        let settings: IntegrationSettings = serde_json::from_value(json!({})).unwrap();
        assert!(settings.notification_from_email.is_none());
        assert!(settings.notification_reply_to.is_none());
    }

    #[test]
    fn test_channel_display() {
        assert_eq!(Channel::Mail.to_string(), "mail");
        assert_eq!("mail".parse::<Channel>().unwrap(), Channel::Mail);
    }

    #[test]
    fn test_notifiable_routes() {
        let notifiable = Notifiable::route(Channel::Mail, "owner@example.com");
        assert_eq!(notifiable.route_for(Channel::Mail), Some("owner@example.com"));
        assert_eq!(Notifiable::default().route_for(Channel::Mail), None);
    }
}
