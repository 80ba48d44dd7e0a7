use crate::{env_bool, env_or_default, env_required, ConfigError, FromEnv};

/// Who owns the outbound sending identity.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeploymentMode {
    /// The operator runs their own instance and controls mail reputation.
    SelfHosted,
    /// Multi-tenant hosted service; tenants never set the literal From address.
    Hosted,
}

impl DeploymentMode {
    pub fn is_self_hosted(&self) -> bool {
        matches!(self, DeploymentMode::SelfHosted)
    }
}

/// Application-wide mail identity
#[derive(Clone, Debug)]
pub struct MailConfig {
    /// Display name used for outgoing mail.
    pub app_name: String,
    /// Default From address.
    pub from_address: String,
    pub mode: DeploymentMode,
}

impl MailConfig {
    pub fn new(app_name: impl Into<String>, from_address: impl Into<String>, mode: DeploymentMode) -> Self {
        Self {
            app_name: app_name.into(),
            from_address: from_address.into(),
            mode,
        }
    }

    pub fn is_self_hosted(&self) -> bool {
        self.mode.is_self_hosted()
    }
}

impl FromEnv for MailConfig {
    /// Reads:
    /// - APP_NAME: defaults to "Forms"
    /// - MAIL_FROM_ADDRESS: required
    /// - APP_SELF_HOSTED: defaults to true
    fn from_env() -> Result<Self, ConfigError> {
        let mode = if env_bool("APP_SELF_HOSTED", true)? {
            DeploymentMode::SelfHosted
        } else {
            DeploymentMode::Hosted
        };

        Ok(Self {
            app_name: env_or_default("APP_NAME", "Forms"),
            from_address: env_required("MAIL_FROM_ADDRESS")?,
            mode,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mail_config_from_env_with_defaults() {
        temp_env::with_vars(
            [
                ("APP_NAME", None::<&str>),
                ("MAIL_FROM_ADDRESS", Some("hello@example.com")),
                ("APP_SELF_HOSTED", None::<&str>),
            ],
            || {
                let config = MailConfig::from_env().unwrap();
                assert_eq!(config.app_name, "Forms");
                assert_eq!(config.from_address, "hello@example.com");
                assert!(config.is_self_hosted());
            },
        );
    }

    #[test]
    fn test_mail_config_hosted_mode() {
        temp_env::with_vars(
            [
                ("APP_NAME", Some("Acme Forms")),
                ("MAIL_FROM_ADDRESS", Some("notifications@acme.test")),
                ("APP_SELF_HOSTED", Some("false")),
            ],
            || {
                let config = MailConfig::from_env().unwrap();
                assert_eq!(config.app_name, "Acme Forms");
                assert_eq!(config.mode, DeploymentMode::Hosted);
            },
        );
    }

    #[test]
    fn test_mail_config_requires_from_address() {
        temp_env::with_var_unset("MAIL_FROM_ADDRESS", || {
            let err = MailConfig::from_env().unwrap_err();
            assert!(err.to_string().contains("MAIL_FROM_ADDRESS"));
        });
    }

    #[test]
    fn test_mail_config_invalid_self_hosted_flag() {
        temp_env::with_vars(
            [
                ("MAIL_FROM_ADDRESS", Some("hello@example.com")),
                ("APP_SELF_HOSTED", Some("sometimes")),
            ],
            || {
                let err = MailConfig::from_env().unwrap_err();
                assert!(err.to_string().contains("APP_SELF_HOSTED"));
            },
        );
    }
}
