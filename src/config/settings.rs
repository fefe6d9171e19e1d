//! Application settings management
//!
//! This module defines the configuration structure and provides methods
//! for loading settings from TOML files and environment variables.

use serde::{Deserialize, Serialize};

/// Main application configuration structure
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Settings {
    pub server: ServerConfig,
    pub backend: BackendConfig,
    pub identity: IdentityConfig,
    pub session: SessionConfig,
    pub calendar: CalendarConfig,
    pub i18n: I18nConfig,
    pub logging: LoggingConfig,
}

/// HTTP listener configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// REST backend configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BackendConfig {
    pub base_url: String,
    pub timeout_seconds: u64,
}

/// Identity provider configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct IdentityConfig {
    pub base_url: String,
    /// Realm end users log into
    pub realm: String,
    /// Client used for the password grant
    pub client_id: String,
    /// Client whose roles carry application privileges
    pub role_client_id: String,
    pub admin_realm: String,
    pub admin_client_id: String,
    pub admin_username: String,
    pub admin_password: String,
    pub timeout_seconds: u64,
}

/// Session cookie and re-check configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SessionConfig {
    pub cookie_name: String,
    pub recheck_interval_seconds: u64,
}

/// Calendar view configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CalendarConfig {
    /// Location shown for events that carry none
    pub default_location: String,
}

/// Internationalization configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct I18nConfig {
    pub default_language: String,
    pub supported_languages: Vec<String>,
    pub translations_dir: String,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    pub level: String,
    pub file_path: String,
    pub log_to_stdout: bool,
}

impl Settings {
    /// Load settings from configuration file and environment variables
    ///
    /// Defaults are applied first, then an optional `config.toml`, then
    /// `EVENTUS__SECTION__KEY` environment variables.
    pub fn new() -> Result<Self, config::ConfigError> {
        let defaults = config::Config::try_from(&Settings::default())?;

        let settings = config::Config::builder()
            .add_source(defaults)
            .add_source(config::File::with_name("config").required(false))
            .add_source(
                config::Environment::with_prefix("EVENTUS")
                    .prefix_separator("__")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("i18n.supported_languages")
                    .try_parsing(true),
            )
            .build()?;

        settings.try_deserialize()
    }

    /// Validate configuration settings
    pub fn validate(&self) -> Result<(), crate::utils::errors::EventusError> {
        super::validation::validate_settings(self)
    }

    /// Socket address string the server binds to
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 3000,
            },
            backend: BackendConfig {
                base_url: "http://localhost:9000".to_string(),
                timeout_seconds: 15,
            },
            identity: IdentityConfig {
                base_url: "http://localhost:8080".to_string(),
                realm: "lucassousa".to_string(),
                client_id: "eventus-rest-api".to_string(),
                role_client_id: "eventus-rest-api".to_string(),
                admin_realm: "master".to_string(),
                admin_client_id: "admin-cli".to_string(),
                admin_username: "admin".to_string(),
                admin_password: "admin".to_string(),
                timeout_seconds: 10,
            },
            session: SessionConfig {
                cookie_name: "token".to_string(),
                recheck_interval_seconds: 30,
            },
            calendar: CalendarConfig {
                default_location: "IFPB".to_string(),
            },
            i18n: I18nConfig {
                default_language: "pt-BR".to_string(),
                supported_languages: vec!["pt-BR".to_string(), "en".to_string()],
                translations_dir: "translations".to_string(),
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                file_path: "logs".to_string(),
                log_to_stdout: true,
            },
        }
    }
}
