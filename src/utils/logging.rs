//! Logging configuration and setup
//!
//! This module provides logging initialization and structured logging utilities
//! for the Eventus application.

use tracing::{debug, error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LoggingConfig;
use crate::utils::errors::{EventusError, Result};
use crate::utils::helpers::truncate_text;

const MAX_LOGGED_BODY: usize = 2000;

/// Initialize logging based on configuration
///
/// The returned guard flushes the file writer on drop and must be kept alive
/// for the lifetime of the process.
pub fn init_logging(config: &LoggingConfig) -> Result<WorkerGuard> {
    std::fs::create_dir_all(&config.file_path)?;

    let file_appender = tracing_appender::rolling::daily(&config.file_path, "eventus.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = EnvFilter::try_from_env("EVENTUS_LOG")
        .or_else(|_| EnvFilter::try_new(&config.level))
        .map_err(|e| EventusError::Config(format!("Invalid log filter: {}", e)))?;

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(true);

    let stdout_layer = config
        .log_to_stdout
        .then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stdout));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(stdout_layer)
        .try_init()
        .map_err(|e| EventusError::Config(format!("Logging already initialized: {}", e)))?;

    info!("Logging initialized with level: {}", config.level);
    Ok(guard)
}

/// Log user actions with structured data
pub fn log_user_action(subject_id: &str, action: &str, details: Option<&str>) {
    info!(
        subject_id = subject_id,
        action = action,
        details = details,
        "User action performed"
    );
}

/// Log registration changes (register / cancel) on events and activities
pub fn log_registration_change(subject_id: &str, target: &str, target_id: i64, registered: bool) {
    info!(
        subject_id = subject_id,
        target = target,
        target_id = target_id,
        registered = registered,
        "Registration changed"
    );
}

/// Log presence updates
pub fn log_attendance_change(activity_id: i64, user_id: &str, present: bool, success: bool) {
    if success {
        info!(
            activity_id = activity_id,
            user_id = user_id,
            present = present,
            "Presence updated"
        );
    } else {
        warn!(
            activity_id = activity_id,
            user_id = user_id,
            present = present,
            "Presence update failed"
        );
    }
}

/// Log upstream (backend or identity provider) errors with the raw body
pub fn log_upstream_error(api: &str, status: u16, body: &str) {
    error!(
        api = api,
        status = status,
        body = %truncate_text(body, MAX_LOGGED_BODY),
        "Upstream returned an error"
    );
}

/// Log token decode failures
pub fn log_decode_failure(reason: &str) {
    debug!(reason = reason, "Token payload could not be decoded");
}
