//! Email template rendering engine.
//!
//! This module provides Handlebars-based template rendering for the
//! submission notification. Field values arrive pre-formatted as HTML (links
//! are created by the formatter), so the HTML part emits them raw and the
//! text part flattens them with the `plain` helper.

use crate::error::{NotificationError, NotificationResult};
use crate::models::OutboundMessage;
use crate::notification::TEMPLATE_NAME;
use handlebars::{handlebars_helper, Handlebars};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

const LINK_OPEN: &str = "<a href=\"";

/// Rendered email content.
#[derive(Debug, Clone)]
pub struct RenderedEmail {
    /// HTML body content.
    pub html: String,
    /// Plain text body content.
    pub text: String,
    /// Email subject line.
    pub subject: String,
}

/// Template engine for rendering email templates.
pub struct TemplateEngine {
    handlebars: Arc<Handlebars<'static>>,
}

handlebars_helper!(plain: |value: Json| to_plain(value));

impl TemplateEngine {
    /// Create a new template engine with all templates registered.
    pub fn new() -> NotificationResult<Self> {
        let mut handlebars = Handlebars::new();
        handlebars.register_helper("plain", Box::new(plain));

        Self::register(&mut handlebars, TEMPLATE_NAME, SUBMISSION_HTML_TEMPLATE, SUBMISSION_TEXT_TEMPLATE)?;

        Ok(Self {
            handlebars: Arc::new(handlebars),
        })
    }

    fn register(
        handlebars: &mut Handlebars<'static>,
        name: &str,
        html: &str,
        text: &str,
    ) -> NotificationResult<()> {
        for (suffix, source) in [("html", html), ("text", text)] {
            let key = format!("{}_{}", name, suffix);
            handlebars
                .register_template_string(&key, source)
                .map_err(|e| NotificationError::TemplateError(format!("Failed to register {}: {}", key, e)))?;
        }
        Ok(())
    }

    /// Whether a template with this name is registered.
    pub fn has_template(&self, template_name: &str) -> bool {
        self.handlebars.has_template(&format!("{}_html", template_name))
    }

    /// Render both parts of a named template.
    pub fn render<T: Serialize>(
        &self,
        template_name: &str,
        subject: &str,
        data: &T,
    ) -> NotificationResult<RenderedEmail> {
        if !self.has_template(template_name) {
            return Err(NotificationError::TemplateError(format!(
                "Unknown template: {}",
                template_name
            )));
        }

        debug!(template = %template_name, "Rendering email template");

        let html = self.handlebars.render(&format!("{}_html", template_name), data)?;
        let text = self.handlebars.render(&format!("{}_text", template_name), data)?;

        Ok(RenderedEmail {
            html,
            text,
            subject: subject.to_string(),
        })
    }

    /// Render an outbound message with its own template and data.
    pub fn render_message(&self, message: &OutboundMessage) -> NotificationResult<RenderedEmail> {
        self.render(&message.template_name, &message.subject, &message.template_data)
    }
}

/// Flatten a formatted value to plain text: links become `text (url)`,
/// entities are decoded.
fn to_plain(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(html) => html_to_text(html),
        other => other.to_string(),
    }
}

fn html_to_text(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut rest = html;

    while let Some(start) = rest.find(LINK_OPEN) {
        out.push_str(&unescape(&rest[..start]));

        let tail = &rest[start + LINK_OPEN.len()..];
        let parsed = tail.split_once("\">").and_then(|(href, tail)| {
            tail.split_once("</a>").map(|(text, tail)| (href, text, tail))
        });

        let Some((href, text, tail)) = parsed else {
            out.push_str(&unescape(&rest[start..]));
            return out;
        };

        let href = unescape(href);
        let text = unescape(text);
        let href = href.strip_prefix("mailto:").map(str::to_string).unwrap_or(href);
        if href == text {
            out.push_str(&text);
        } else {
            out.push_str(&format!("{} ({})", text, href));
        }

        rest = tail;
    }

    out.push_str(&unescape(rest));
    out
}

fn unescape(s: &str) -> String {
    s.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#x27;", "'")
        .replace("&#x60;", "`")
        .replace("&#x3D;", "=")
        .replace("&amp;", "&")
}

// ============================================================================
// Email Templates
// ============================================================================

const SUBMISSION_HTML_TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8">
  <meta name="viewport" content="width=device-width, initial-scale=1.0">
  <title>New form submission</title>
</head>
<body style="margin: 0; padding: 0; font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif; background-color: #f4f4f5;">
  <table role="presentation" width="100%" cellspacing="0" cellpadding="0" style="max-width: 600px; margin: 0 auto; padding: 40px 20px;">
    <tr>
      <td style="background-color: #ffffff; border-radius: 8px; padding: 40px; box-shadow: 0 2px 4px rgba(0,0,0,0.1);">
        <p style="color: #18181b; font-size: 16px; line-height: 24px; margin: 0 0 16px 0;">
          Hello there 👋
        </p>
        <p style="color: #52525b; font-size: 16px; line-height: 24px; margin: 0 0 32px 0;">
          Your form "{{form.title}}" has a new submission.
        </p>
        <table width="100%" cellspacing="0" cellpadding="0">
          {{#each fields}}
          <tr>
            <td style="padding: 12px 0; border-bottom: 1px solid #e4e4e7;">
              <p style="color: #18181b; font-size: 14px; font-weight: 600; margin: 0 0 4px 0;">{{this.name}}</p>
              <p style="color: #52525b; font-size: 14px; margin: 0;">{{{this.value}}}</p>
            </td>
          </tr>
          {{/each}}
        </table>
      </td>
    </tr>
  </table>
</body>
</html>"#;

const SUBMISSION_TEXT_TEMPLATE: &str = r#"Hello there,

Your form "{{{plain form.title}}}" has a new submission.

{{#each fields}}
{{{plain this.name}}}
{{{plain this.value}}}

{{/each}}"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FormDefinition, FormattedField, SubmissionTemplateData};
    use serde_json::json;

    fn field(name: &str, value: Value) -> FormattedField {
        FormattedField {
            id: name.to_lowercase(),
            name: name.to_string(),
            field_type: "text".to_string(),
            value,
        }
    }

    #[test]
    fn test_template_engine_creation() {
        let engine = TemplateEngine::new();
        assert!(engine.is_ok());
        assert!(engine.unwrap().has_template("form-submission-notification"));
    }

    #[test]
    fn test_render_submission_notification() {
        let engine = TemplateEngine::new().unwrap();
        let data = SubmissionTemplateData {
            fields: vec![
                field("Name", json!("Ada &amp; Co")),
                field(
                    "Email",
                    json!("<a href=\"mailto:ada@example.com\">ada@example.com</a>"),
                ),
                field(
                    "Documents",
                    json!("<a href=\"https://files.example.com/a.pdf\">a.pdf</a>"),
                ),
            ],
            form: FormDefinition::new("Contact Us", Vec::new()),
        };

        let rendered = engine
            .render("form-submission-notification", "New form submission for \"Contact Us\"", &data)
            .unwrap();

        assert!(rendered.html.contains("Contact Us"));
        assert!(rendered.html.contains("<a href=\"mailto:ada@example.com\">ada@example.com</a>"));
        assert!(rendered.html.contains("Ada &amp; Co"));

        assert!(rendered.text.contains("Ada & Co"));
        assert!(rendered.text.contains("ada@example.com"));
        assert!(!rendered.text.contains("mailto:"));
        assert!(rendered.text.contains("a.pdf (https://files.example.com/a.pdf)"));
        assert_eq!(rendered.subject, "New form submission for \"Contact Us\"");
    }

    #[test]
    fn test_render_unknown_template() {
        let engine = TemplateEngine::new().unwrap();
        let result = engine.render("welcome", "Hi", &json!({}));
        assert!(matches!(result, Err(NotificationError::TemplateError(_))));
    }

    #[test]
    fn test_html_to_text() {
        assert_eq!(html_to_text("plain &lt;b&gt;"), "plain <b>");
        assert_eq!(
            html_to_text("<a href=\"https://x.dev\">https://x.dev</a>, <a href=\"https://y.dev/f\">f</a>"),
            "https://x.dev, f (https://y.dev/f)"
        );
        assert_eq!(html_to_text("<a href=\"broken"), "<a href=\"broken");
    }

    #[test]
    fn test_to_plain_non_strings() {
        assert_eq!(to_plain(&Value::Null), "");
        assert_eq!(to_plain(&json!(42)), "42");
    }
}
