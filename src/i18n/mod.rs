//! Internationalization module
//!
//! This module handles multi-language support for user-facing messages.
//! It provides translation loading, language detection, message formatting,
//! and pluralization support.

pub mod loader;

// Re-export commonly used i18n components
pub use loader::{I18n, TranslationParams};
