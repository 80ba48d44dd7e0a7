//! Submission field formatting.
//!
//! Turns raw submitted values into display values for the notification
//! template. The notification builder depends only on the [`FieldFormatter`]
//! trait; [`SubmissionFormatter`] is the default implementation.

use crate::clock::Clock;
use crate::error::{NotificationError, NotificationResult};
use crate::models::{FieldDefinition, FormDefinition, FormattedField, SubmissionData};
use chrono::Duration;
use core_config::{ConfigError, FromEnv, env_or_default, env_required};
use handlebars::html_escape;
use hmac::{Hmac, Mac};
use serde_json::Value;
use sha2::Sha256;
use std::sync::Arc;
use tracing::debug;

type HmacSha256 = Hmac<Sha256>;

/// Longest accepted signed URL lifetime (one year).
pub const MAX_FILE_URL_TTL_SECONDS: i64 = 365 * 24 * 60 * 60;

/// Formatting switches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FormatOptions {
    /// Include fields marked hidden.
    pub show_hidden_fields: bool,
    /// Render urls, emails and files as HTML links.
    pub create_links: bool,
    /// Coerce every value to a string.
    pub output_strings_only: bool,
    /// Use expiring signed URLs for uploaded files.
    pub use_signed_url_for_files: bool,
}

impl FormatOptions {
    /// Options used by the submission notification email.
    pub fn for_notification() -> Self {
        Self {
            show_hidden_fields: true,
            create_links: true,
            output_strings_only: true,
            use_signed_url_for_files: true,
        }
    }
}

/// Converts a form plus submitted data into an ordered list of display fields.
#[cfg_attr(test, mockall::automock)]
pub trait FieldFormatter: Send + Sync {
    fn format(
        &self,
        form: &FormDefinition,
        data: &SubmissionData,
        options: &FormatOptions,
    ) -> NotificationResult<Vec<FormattedField>>;
}

/// Where uploaded submission files are served from.
#[derive(Debug, Clone)]
pub struct FileUrlConfig {
    /// Public base URL, without trailing slash.
    pub base_url: String,
    /// Secret used to sign file URLs.
    pub signing_key: String,
    /// Lifetime of a signed URL in seconds.
    pub ttl_seconds: i64,
}

impl FileUrlConfig {
    pub fn new(base_url: impl Into<String>, signing_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            signing_key: signing_key.into(),
            ttl_seconds: 600,
        }
    }

    /// Builder method to set the signed URL lifetime.
    pub fn with_ttl_seconds(mut self, ttl_seconds: i64) -> Self {
        self.ttl_seconds = ttl_seconds;
        self
    }
}

impl FromEnv for FileUrlConfig {
    /// Reads:
    /// - FILES_BASE_URL: required
    /// - FILES_SIGNING_KEY: required
    /// - FILES_URL_TTL_SECONDS: defaults to 600, between 1 and one year
    fn from_env() -> Result<Self, ConfigError> {
        let ttl_seconds: i64 = env_or_default("FILES_URL_TTL_SECONDS", "600")
            .parse()
            .map_err(|e| ConfigError::ParseError {
                key: "FILES_URL_TTL_SECONDS".to_string(),
                details: format!("{}", e),
            })?;

        if !(1..=MAX_FILE_URL_TTL_SECONDS).contains(&ttl_seconds) {
            return Err(ConfigError::ParseError {
                key: "FILES_URL_TTL_SECONDS".to_string(),
                details: format!("{} is outside 1..={}", ttl_seconds, MAX_FILE_URL_TTL_SECONDS),
            });
        }

        Ok(Self::new(env_required("FILES_BASE_URL")?, env_required("FILES_SIGNING_KEY")?)
            .with_ttl_seconds(ttl_seconds))
    }
}

/// Default field formatter.
#[derive(Clone)]
pub struct SubmissionFormatter {
    files: Arc<FileUrlConfig>,
    clock: Arc<dyn Clock>,
}

impl SubmissionFormatter {
    pub fn new(files: FileUrlConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            files: Arc::new(files),
            clock,
        }
    }

    fn file_path(&self, form: &FormDefinition, file_name: &str) -> String {
        format!(
            "/forms/{}/submissions/files/{}",
            urlencoding::encode(&form.id),
            urlencoding::encode(file_name)
        )
    }

    /// Public URL for an uploaded file.
    pub fn file_url(&self, form: &FormDefinition, file_name: &str) -> String {
        format!("{}{}", self.files.base_url, self.file_path(form, file_name))
    }

    /// Expiring URL for an uploaded file, signed with HMAC-SHA256 over
    /// `path:expires`.
    pub fn signed_file_url(&self, form: &FormDefinition, file_name: &str) -> NotificationResult<String> {
        let path = self.file_path(form, file_name);
        let expires = Duration::try_seconds(self.files.ttl_seconds)
            .and_then(|ttl| self.clock.now().checked_add_signed(ttl))
            .ok_or_else(|| {
                NotificationError::FormattingError(format!(
                    "Signed file URL lifetime out of range: {}s",
                    self.files.ttl_seconds
                ))
            })?
            .timestamp();
        let signature = sign(&self.files.signing_key, &path, expires)?;

        Ok(format!(
            "{}{}?expires={}&signature={}",
            self.files.base_url, path, expires, signature
        ))
    }

    fn format_field(
        &self,
        form: &FormDefinition,
        field: &FieldDefinition,
        raw: Option<&Value>,
        options: &FormatOptions,
    ) -> NotificationResult<Value> {
        if field.field_type == "checkbox" {
            let checked = matches!(raw, Some(Value::Bool(true)));
            return Ok(Value::String(yes_no(checked).to_string()));
        }

        let raw = match raw {
            None | Some(Value::Null) => return Ok(empty_value(options)),
            Some(raw) => raw,
        };

        let value = match field.field_type.as_str() {
            "files" | "signature" => self.format_files(form, raw, options)?,
            "url" if options.create_links => match raw.as_str() {
                Some(url) => Value::String(link(url, url)),
                None => stringify(raw, options, ", "),
            },
            "email" if options.create_links => match raw.as_str() {
                Some(email) => Value::String(link(&format!("mailto:{}", email), email)),
                None => stringify(raw, options, ", "),
            },
            "date" => stringify(raw, options, " - "),
            _ => stringify(raw, options, ", "),
        };

        Ok(value)
    }

    fn format_files(
        &self,
        form: &FormDefinition,
        raw: &Value,
        options: &FormatOptions,
    ) -> NotificationResult<Value> {
        let names: Vec<&str> = match raw {
            Value::String(name) => vec![name.as_str()],
            Value::Array(items) => items.iter().filter_map(Value::as_str).collect(),
            _ => Vec::new(),
        };

        let rendered = names
            .into_iter()
            .filter(|name| !name.is_empty())
            .map(|name| {
                let url = if options.use_signed_url_for_files {
                    self.signed_file_url(form, name)?
                } else {
                    self.file_url(form, name)
                };
                Ok(if options.create_links { link(&url, name) } else { url })
            })
            .collect::<NotificationResult<Vec<String>>>()?;

        if options.output_strings_only {
            Ok(Value::String(rendered.join(", ")))
        } else {
            Ok(Value::Array(rendered.into_iter().map(Value::String).collect()))
        }
    }
}

impl FieldFormatter for SubmissionFormatter {
    fn format(
        &self,
        form: &FormDefinition,
        data: &SubmissionData,
        options: &FormatOptions,
    ) -> NotificationResult<Vec<FormattedField>> {
        let fields = form
            .properties
            .iter()
            // nf-* blocks are layout elements (text, images, page breaks)
            .filter(|field| !field.field_type.starts_with("nf-"))
            .filter(|field| options.show_hidden_fields || !field.hidden)
            .map(|field| {
                Ok(FormattedField {
                    id: field.id.clone(),
                    name: field.name.clone(),
                    field_type: field.field_type.clone(),
                    value: self.format_field(form, field, data.get(&field.id), options)?,
                })
            })
            .collect::<NotificationResult<Vec<FormattedField>>>()?;

        debug!(form_id = %form.id, field_count = fields.len(), "Formatted submission fields");

        Ok(fields)
    }
}

fn sign(key: &str, path: &str, expires: i64) -> NotificationResult<String> {
    let mut mac = HmacSha256::new_from_slice(key.as_bytes())
        .map_err(|e| NotificationError::FormattingError(format!("Invalid file signing key: {}", e)))?;
    mac.update(path.as_bytes());
    mac.update(b":");
    mac.update(expires.to_string().as_bytes());
    Ok(format!("{:x}", mac.finalize().into_bytes()))
}

fn link(href: &str, text: &str) -> String {
    format!("<a href=\"{}\">{}</a>", html_escape(href), html_escape(text))
}

fn yes_no(value: bool) -> &'static str {
    if value { "Yes" } else { "No" }
}

fn empty_value(options: &FormatOptions) -> Value {
    if options.output_strings_only {
        Value::String(String::new())
    } else {
        Value::Null
    }
}

fn stringify(raw: &Value, options: &FormatOptions, separator: &str) -> Value {
    if !options.output_strings_only {
        return raw.clone();
    }

    let text = to_display(raw, separator);
    // Links make the value HTML, so plain text has to be escaped to match
    if options.create_links {
        Value::String(html_escape(&text))
    } else {
        Value::String(text)
    }
}

fn to_display(raw: &Value, separator: &str) -> String {
    match raw {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => yes_no(*b).to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(items) => items
            .iter()
            .map(|item| to_display(item, separator))
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(separator),
        Value::Object(_) => raw.to_string(),
    }
}
