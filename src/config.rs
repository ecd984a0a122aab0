use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::env;

/// Application configuration
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct AppConfig {
    /// Server configuration
    pub server: ServerConfig,
    /// Webhook configuration
    pub webhook: WebhookConfig,
    /// Twilio configuration
    pub twilio: TwilioConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    /// Server host (default: 0.0.0.0)
    pub host: String,
    /// Server port (default: 3000)
    pub port: u16,
}

/// Webhook configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct WebhookConfig {
    /// Shared secret expected in `verification_token`
    pub verify_token: String,
}

/// Twilio provider configuration.
///
/// Auto-replies are sent only when all three credentials are present.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct TwilioConfig {
    /// Twilio Account SID
    pub account_sid: Option<String>,
    /// Twilio Auth Token
    pub auth_token: Option<String>,
    /// WhatsApp-enabled sender number
    pub whatsapp_number: Option<String>,
    /// API base URL (default: https://api.twilio.com)
    pub base_url: String,
}

/// Complete Twilio credentials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TwilioCredentials {
    pub account_sid: String,
    pub auth_token: String,
    pub whatsapp_number: String,
}

/// Logging configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    /// Log level (default: info)
    pub level: String,
    /// Log format: json or pretty (default: pretty)
    pub format: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            verify_token: "test_token_12345".to_string(),
        }
    }
}

impl Default for TwilioConfig {
    fn default() -> Self {
        Self {
            account_sid: None,
            auth_token: None,
            whatsapp_number: None,
            base_url: wa_twilio::DEFAULT_BASE_URL.to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl TwilioConfig {
    /// Credentials, if every field is set and non-empty.
    pub fn credentials(&self) -> Option<TwilioCredentials> {
        fn present(v: &Option<String>) -> Option<String> {
            v.as_ref().filter(|s| !s.is_empty()).cloned()
        }

        Some(TwilioCredentials {
            account_sid: present(&self.account_sid)?,
            auth_token: present(&self.auth_token)?,
            whatsapp_number: present(&self.whatsapp_number)?,
        })
    }
}

impl ServerConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl AppConfig {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with(|key| env::var(key).ok())
    }

    /// Same as [`AppConfig::load`], reading the flat legacy variables through `lookup`.
    ///
    /// Empty values count as unset so the defaults stay in effect.
    pub fn load_with<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());
        let legacy = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Config::builder()
            // Start with default configuration
            .add_source(Config::try_from(&AppConfig::default())?)
            // Add configuration file based on environment
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // Add local configuration file (gitignored)
            .add_source(File::with_name("config/local").required(false))
            // Add environment variables (prefixed with AUTOREPLY__)
            .add_source(Environment::with_prefix("AUTOREPLY").separator("__"))
            // Flat variables used by existing deployments
            .set_override_option("server.port", legacy("PORT"))?
            .set_override_option("webhook.verify_token", legacy("VERIFY_TOKEN"))?
            .set_override_option("twilio.account_sid", legacy("TWILIO_ACCOUNT_SID"))?
            .set_override_option("twilio.auth_token", legacy("TWILIO_AUTH_TOKEN"))?
            .set_override_option("twilio.whatsapp_number", legacy("TWILIO_WHATSAPP_NUMBER"))?
            .build()?
            .try_deserialize()
    }
}
