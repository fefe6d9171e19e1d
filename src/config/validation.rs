//! Configuration validation module
//!
//! This module provides validation functions for application configuration
//! to ensure all required settings are properly configured.

use super::Settings;
use crate::utils::errors::{EventusError, Result};

/// Validate all configuration settings
pub fn validate_settings(settings: &Settings) -> Result<()> {
    validate_server_config(&settings.server)?;
    validate_backend_config(&settings.backend)?;
    validate_identity_config(&settings.identity)?;
    validate_session_config(&settings.session)?;
    validate_i18n_config(&settings.i18n)?;
    validate_logging_config(&settings.logging)?;

    Ok(())
}

/// Validate server configuration
fn validate_server_config(config: &super::ServerConfig) -> Result<()> {
    if config.host.is_empty() {
        return Err(EventusError::Config("Server host is required".to_string()));
    }

    if config.port == 0 {
        return Err(EventusError::Config(
            "Server port must be greater than 0".to_string(),
        ));
    }

    Ok(())
}

/// Validate REST backend configuration
fn validate_backend_config(config: &super::BackendConfig) -> Result<()> {
    if config.base_url.is_empty() {
        return Err(EventusError::Config("Backend URL is required".to_string()));
    }

    url::Url::parse(&config.base_url)
        .map_err(|e| EventusError::Config(format!("Invalid backend URL: {}", e)))?;

    if config.timeout_seconds == 0 {
        return Err(EventusError::Config(
            "Backend timeout must be greater than 0".to_string(),
        ));
    }

    Ok(())
}

/// Validate identity provider configuration
fn validate_identity_config(config: &super::IdentityConfig) -> Result<()> {
    if config.base_url.is_empty() {
        return Err(EventusError::Config(
            "Identity provider URL is required".to_string(),
        ));
    }

    url::Url::parse(&config.base_url)
        .map_err(|e| EventusError::Config(format!("Invalid identity provider URL: {}", e)))?;

    if config.realm.is_empty() || config.admin_realm.is_empty() {
        return Err(EventusError::Config(
            "Identity realm and admin realm are required".to_string(),
        ));
    }

    if config.client_id.is_empty() || config.role_client_id.is_empty() {
        return Err(EventusError::Config(
            "Identity client ids are required".to_string(),
        ));
    }

    if config.admin_username.is_empty() {
        return Err(EventusError::Config(
            "Identity admin username is required".to_string(),
        ));
    }

    if config.timeout_seconds == 0 {
        return Err(EventusError::Config(
            "Identity timeout must be greater than 0".to_string(),
        ));
    }

    Ok(())
}

/// Validate session configuration
fn validate_session_config(config: &super::SessionConfig) -> Result<()> {
    if config.cookie_name.is_empty() {
        return Err(EventusError::Config(
            "Session cookie name is required".to_string(),
        ));
    }

    if config.recheck_interval_seconds == 0 {
        return Err(EventusError::Config(
            "Registration re-check interval must be greater than 0".to_string(),
        ));
    }

    Ok(())
}

/// Validate internationalization configuration
fn validate_i18n_config(config: &super::I18nConfig) -> Result<()> {
    if config.default_language.is_empty() {
        return Err(EventusError::Config(
            "Default language is required".to_string(),
        ));
    }

    if config.supported_languages.is_empty() {
        return Err(EventusError::Config(
            "At least one supported language is required".to_string(),
        ));
    }

    if !config.supported_languages.contains(&config.default_language) {
        return Err(EventusError::Config(
            "Default language must be in supported languages list".to_string(),
        ));
    }

    Ok(())
}

/// Validate logging configuration
fn validate_logging_config(config: &super::LoggingConfig) -> Result<()> {
    if config.level.is_empty() {
        return Err(EventusError::Config("Log level is required".to_string()));
    }

    let valid_levels = ["trace", "debug", "info", "warn", "error"];
    if !valid_levels.contains(&config.level.as_str()) {
        return Err(EventusError::Config(format!(
            "Invalid log level: {}. Valid levels: {:?}",
            config.level, valid_levels
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_rejects_unparseable_backend_url() {
        let mut settings = Settings::default();
        settings.backend.base_url = "not a url".to_string();
        assert_matches!(validate_settings(&settings), Err(EventusError::Config(_)));
    }

    #[test]
    fn test_rejects_default_language_outside_supported() {
        let mut settings = Settings::default();
        settings.i18n.default_language = "fr".to_string();
        assert_matches!(validate_settings(&settings), Err(EventusError::Config(msg)) if msg.contains("Default language"));
    }

    #[test]
    fn test_rejects_zero_recheck_interval() {
        let mut settings = Settings::default();
        settings.session.recheck_interval_seconds = 0;
        assert!(validate_settings(&settings).is_err());
    }

    #[test]
    fn test_rejects_unknown_log_level() {
        let mut settings = Settings::default();
        settings.logging.level = "verbose".to_string();
        assert!(validate_settings(&settings).is_err());
    }
}
