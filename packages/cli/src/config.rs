// ABOUTME: Server configuration loaded from environment variables
// ABOUTME: Port, database, CORS, admin token, rate limits and integration endpoints

use std::env;
use std::num::ParseIntError;
use std::path::PathBuf;

use porchlight_integrations::{EmailConfig, IntegrationError, IntegrationsConfig, ServiceConfig};
use thiserror::Error;

use crate::middleware::RateLimitConfig;

pub const DEFAULT_PORT: u16 = 4010;
pub const DEFAULT_CORS_ORIGIN: &str = "http://localhost:5173";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid port number: {0}")]
    InvalidPort(#[from] ParseIntError),
    #[error("Port {0} is out of valid range (1-65535)")]
    PortOutOfRange(u16),
    #[error("Invalid value for {name}: '{value}'")]
    InvalidValue { name: &'static str, value: String },
    #[error("{present} is set but {missing} is missing")]
    Incomplete {
        present: &'static str,
        missing: &'static str,
    },
    #[error("ADMIN_API_TOKEN must be set unless PORCHLIGHT_DEV_MODE is enabled")]
    MissingAdminToken,
    #[error("Invalid integration settings: {0}")]
    Integration(#[from] IntegrationError),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub database_path: PathBuf,
    pub cors_origin: String,
    /// Base for links embedded in outgoing emails; `None` leaves them relative
    pub public_base_url: Option<String>,
    pub admin_token: Option<String>,
    /// Skips the admin token check
    pub dev_mode: bool,
    pub enable_hsts: bool,
    pub rate_limit: RateLimitConfig,
    pub integrations: IntegrationsConfig,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build a config from any variable source; blank values count as unset
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let port = match var("PORCHLIGHT_PORT") {
            Some(raw) => raw.parse::<u16>()?,
            None => DEFAULT_PORT,
        };
        if port == 0 {
            return Err(ConfigError::PortOutOfRange(port));
        }

        let database_path = var("PORCHLIGHT_DATABASE_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(porchlight_core::default_database_path);

        let cors_origin = var("CORS_ORIGIN").unwrap_or_else(|| DEFAULT_CORS_ORIGIN.to_string());
        let public_base_url = var("PUBLIC_BASE_URL").map(|url| url.trim_end_matches('/').to_string());

        let dev_mode = parse_flag("PORCHLIGHT_DEV_MODE", var("PORCHLIGHT_DEV_MODE"), false)?;
        let admin_token = var("ADMIN_API_TOKEN");
        if admin_token.is_none() && !dev_mode {
            return Err(ConfigError::MissingAdminToken);
        }

        let enable_hsts = parse_flag("ENABLE_HSTS", var("ENABLE_HSTS"), false)?;

        let mut rate_limit = RateLimitConfig {
            enabled: parse_flag("RATE_LIMIT_ENABLED", var("RATE_LIMIT_ENABLED"), true)?,
            ..RateLimitConfig::default()
        };
        if let Some(raw) = var("FORMS_RATE_LIMIT_RPM") {
            rate_limit.forms_rpm = match raw.parse::<u32>() {
                Ok(rpm) if rpm > 0 => rpm,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        name: "FORMS_RATE_LIMIT_RPM",
                        value: raw,
                    })
                }
            };
        }

        let crm = service_pair(&var, "CRM_API_URL", "CRM_API_KEY")?;
        let pdf = service_pair(&var, "PDF_API_URL", "PDF_API_KEY")?;
        let email = match service_pair(&var, "EMAIL_API_URL", "EMAIL_API_KEY")? {
            Some(service) => {
                let from = var("EMAIL_FROM").ok_or(ConfigError::Incomplete {
                    present: "EMAIL_API_URL",
                    missing: "EMAIL_FROM",
                })?;
                Some(EmailConfig {
                    service,
                    from,
                    admin_recipient: var("ADMIN_NOTIFICATION_EMAIL"),
                })
            }
            None => None,
        };

        Ok(Config {
            port,
            database_path,
            cors_origin,
            public_base_url,
            admin_token,
            dev_mode,
            enable_hsts,
            rate_limit,
            integrations: IntegrationsConfig { crm, email, pdf },
        })
    }
}

fn parse_flag(name: &'static str, raw: Option<String>, default: bool) -> Result<bool, ConfigError> {
    let Some(raw) = raw else {
        return Ok(default);
    };
    match raw.to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue { name, value: raw }),
    }
}

/// A service is configured only when both its URL and key are present
fn service_pair<F>(
    var: &F,
    url_name: &'static str,
    key_name: &'static str,
) -> Result<Option<ServiceConfig>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match (var(url_name), var(key_name)) {
        (Some(url), Some(key)) => Ok(Some(ServiceConfig::new(&url, key)?)),
        (None, None) => Ok(None),
        (Some(_), None) => Err(ConfigError::Incomplete {
            present: url_name,
            missing: key_name,
        }),
        (None, Some(_)) => Err(ConfigError::Incomplete {
            present: key_name,
            missing: url_name,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_defaults_in_dev_mode() {
        let config = config_from(&[("PORCHLIGHT_DEV_MODE", "true")]).unwrap();

        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.cors_origin, DEFAULT_CORS_ORIGIN);
        assert!(config.dev_mode);
        assert!(config.admin_token.is_none());
        assert!(config.rate_limit.enabled);
        assert!(config.integrations.crm.is_none());
        assert!(config.integrations.email.is_none());
        assert!(config.integrations.pdf.is_none());
        assert!(config.database_path.ends_with("porchlight.db"));
    }

    #[test]
    fn test_admin_token_required_outside_dev_mode() {
        let err = config_from(&[]).unwrap_err();
        assert!(matches!(err, ConfigError::MissingAdminToken));

        let config = config_from(&[("ADMIN_API_TOKEN", "secret")]).unwrap();
        assert_eq!(config.admin_token.as_deref(), Some("secret"));
        assert!(!config.dev_mode);
    }

    #[test]
    fn test_port_validation() {
        let err = config_from(&[("ADMIN_API_TOKEN", "t"), ("PORCHLIGHT_PORT", "0")]).unwrap_err();
        assert!(matches!(err, ConfigError::PortOutOfRange(0)));

        let err =
            config_from(&[("ADMIN_API_TOKEN", "t"), ("PORCHLIGHT_PORT", "70000")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPort(_)));

        let config =
            config_from(&[("ADMIN_API_TOKEN", "t"), ("PORCHLIGHT_PORT", "8080")]).unwrap();
        assert_eq!(config.port, 8080);
    }

    #[test]
    fn test_invalid_flag_is_rejected() {
        let err = config_from(&[("PORCHLIGHT_DEV_MODE", "maybe")]).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue {
                name: "PORCHLIGHT_DEV_MODE",
                ..
            }
        ));
    }

    #[test]
    fn test_forms_rate_limit_override() {
        let config = config_from(&[
            ("PORCHLIGHT_DEV_MODE", "1"),
            ("FORMS_RATE_LIMIT_RPM", "3"),
            ("RATE_LIMIT_ENABLED", "false"),
        ])
        .unwrap();
        assert_eq!(config.rate_limit.forms_rpm, 3);
        assert!(!config.rate_limit.enabled);

        let err = config_from(&[("PORCHLIGHT_DEV_MODE", "1"), ("FORMS_RATE_LIMIT_RPM", "0")])
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn test_integrations_need_url_and_key() {
        let err = config_from(&[
            ("PORCHLIGHT_DEV_MODE", "1"),
            ("CRM_API_URL", "https://crm.example.com/api"),
        ])
        .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Incomplete {
                present: "CRM_API_URL",
                missing: "CRM_API_KEY"
            }
        ));

        let config = config_from(&[
            ("PORCHLIGHT_DEV_MODE", "1"),
            ("CRM_API_URL", "https://crm.example.com/api"),
            ("CRM_API_KEY", "key"),
            ("PDF_API_URL", "https://pdf.example.com"),
            ("PDF_API_KEY", "key"),
        ])
        .unwrap();
        assert!(config.integrations.crm.is_some());
        assert!(config.integrations.pdf.is_some());
    }

    #[test]
    fn test_email_requires_sender_address() {
        let base = [
            ("PORCHLIGHT_DEV_MODE", "1"),
            ("EMAIL_API_URL", "https://mail.example.com"),
            ("EMAIL_API_KEY", "key"),
        ];
        let err = config_from(&base).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Incomplete {
                missing: "EMAIL_FROM",
                ..
            }
        ));

        let mut with_from = base.to_vec();
        with_from.push(("EMAIL_FROM", "help@porchlight.example"));
        with_from.push(("ADMIN_NOTIFICATION_EMAIL", "team@porchlight.example"));
        let config = config_from(&with_from).unwrap();
        let email = config.integrations.email.unwrap();
        assert_eq!(email.from, "help@porchlight.example");
        assert_eq!(email.admin_recipient.as_deref(), Some("team@porchlight.example"));
    }

    #[test]
    fn test_public_base_url_trailing_slash_trimmed() {
        let config = config_from(&[
            ("PORCHLIGHT_DEV_MODE", "1"),
            ("PUBLIC_BASE_URL", "https://porchlight.example/"),
        ])
        .unwrap();
        assert_eq!(
            config.public_base_url.as_deref(),
            Some("https://porchlight.example")
        );
    }
}
