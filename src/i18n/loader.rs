//! Translation loader and i18n management
//!
//! This module provides the core internationalization functionality including
//! translation loading, language detection from `Accept-Language`, and message
//! formatting. Built-in translations are compiled in; files found in the
//! configured directory replace them.

use serde_json::{Map, Value};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, error, info, warn};

use crate::config::I18nConfig;
use crate::utils::errors::{EventusError, Result};

const BUILTIN_TRANSLATIONS: [(&str, &str); 2] = [
    ("pt-BR", include_str!("../../translations/pt-BR.json")),
    ("en", include_str!("../../translations/en.json")),
];

/// Main internationalization manager
#[derive(Debug, Clone)]
pub struct I18n {
    /// Loaded translations by language code
    translations: HashMap<String, Map<String, Value>>,
    /// Default language code
    default_language: String,
    /// Supported language codes
    supported_languages: Vec<String>,
    translations_dir: String,
}

/// Translation parameters for message formatting
pub type TranslationParams = HashMap<String, String>;

impl I18n {
    /// Create a new I18n instance with no translations loaded
    pub fn new(config: &I18nConfig) -> Self {
        Self {
            translations: HashMap::new(),
            default_language: config.default_language.clone(),
            supported_languages: config.supported_languages.clone(),
            translations_dir: config.translations_dir.clone(),
        }
    }

    /// Create an instance holding the compiled-in translations
    pub fn with_builtin(config: &I18nConfig) -> Result<Self> {
        let mut i18n = Self::new(config);
        for (lang_code, content) in BUILTIN_TRANSLATIONS {
            if i18n.is_language_supported(lang_code) {
                i18n.insert_language(lang_code, content)?;
            }
        }
        Ok(i18n)
    }

    /// Load translation files from the translations directory
    ///
    /// A missing directory or file keeps the built-in copy. Only a broken
    /// default-language file is an error.
    pub async fn load_translations(&mut self) -> Result<()> {
        let translations_dir = PathBuf::from(&self.translations_dir);
        if !translations_dir.exists() {
            warn!(dir = %translations_dir.display(), "Translations directory not found, using built-in translations");
            return Ok(());
        }

        let supported_languages = self.supported_languages.clone();
        for lang_code in &supported_languages {
            let file_path = translations_dir.join(format!("{}.json", lang_code));
            if !file_path.exists() {
                debug!(file = %file_path.display(), "Translation file not found");
                continue;
            }

            match self.load_language_file(&file_path, lang_code).await {
                Ok(_) => info!("Loaded translations for language: {}", lang_code),
                Err(e) => {
                    error!("Failed to load translations for {}: {}", lang_code, e);
                    if lang_code == &self.default_language {
                        return Err(EventusError::Config(format!(
                            "Failed to load default language translations: {}",
                            e
                        )));
                    }
                }
            }
        }

        if !self.translations.contains_key(&self.default_language) {
            return Err(EventusError::Config(format!(
                "No translations available for default language {}",
                self.default_language
            )));
        }
        Ok(())
    }

    /// Load a single language file
    async fn load_language_file(&mut self, file_path: &Path, lang_code: &str) -> Result<()> {
        let content = fs::read_to_string(file_path).await?;
        self.insert_language(lang_code, &content)
    }

    fn insert_language(&mut self, lang_code: &str, content: &str) -> Result<()> {
        match serde_json::from_str(content)? {
            Value::Object(map) => {
                debug!("Loaded {} translation groups for {}", map.len(), lang_code);
                self.translations.insert(lang_code.to_string(), map);
                Ok(())
            }
            _ => Err(EventusError::Config(format!(
                "Invalid translation file format for {}",
                lang_code
            ))),
        }
    }

    /// Get a translated message
    ///
    /// Falls back to the default language, then to the key itself.
    pub fn t(&self, key: &str, lang: &str, params: Option<&TranslationParams>) -> String {
        let effective_lang = self.get_effective_language(lang);

        let value = self
            .get_translation_value(key, effective_lang)
            .or_else(|| self.get_translation_value(key, &self.default_language));

        match value {
            Some(translation) => {
                let text = self.extract_text_from_value(translation);
                self.format_message(&text, params)
            }
            None => {
                warn!("Translation key '{}' not found in any language", key);
                key.to_string()
            }
        }
    }

    /// Get a translated message with pluralization support
    pub fn tp(&self, key: &str, lang: &str, count: i64, params: Option<&TranslationParams>) -> String {
        let effective_lang = self.get_effective_language(lang);
        let plural_key = format!("{}.{}", key, self.get_plural_form(count, effective_lang));

        let mut final_params = params.cloned().unwrap_or_default();
        final_params.insert("count".to_string(), count.to_string());

        self.t(&plural_key, effective_lang, Some(&final_params))
    }

    /// Check if a language is supported
    pub fn is_language_supported(&self, lang: &str) -> bool {
        self.supported_languages.iter().any(|l| l == lang)
    }

    /// Get the effective language (fallback to default if not supported)
    fn get_effective_language<'a>(&'a self, lang: &'a str) -> &'a str {
        if self.is_language_supported(lang) && self.translations.contains_key(lang) {
            lang
        } else {
            &self.default_language
        }
    }

    /// Get translation value from nested JSON structure
    fn get_translation_value(&self, key: &str, lang: &str) -> Option<&Value> {
        let mut parts = key.split('.');
        let mut current = self.translations.get(lang)?.get(parts.next()?)?;
        for part in parts {
            current = current.get(part)?;
        }
        Some(current)
    }

    /// Extract text from JSON value (handle both strings and objects with pluralization)
    fn extract_text_from_value(&self, value: &Value) -> String {
        match value {
            Value::String(s) => s.clone(),
            Value::Object(obj) => {
                if let Some(other) = obj.get("other") {
                    self.extract_text_from_value(other)
                } else if let Some((_, first_value)) = obj.iter().next() {
                    self.extract_text_from_value(first_value)
                } else {
                    String::new()
                }
            }
            _ => value.to_string(),
        }
    }

    /// Format message with parameters
    fn format_message(&self, template: &str, params: Option<&TranslationParams>) -> String {
        match params {
            Some(params) => params.iter().fold(template.to_string(), |acc, (key, value)| {
                acc.replace(&format!("{{{}}}", key), value)
            }),
            None => template.to_string(),
        }
    }

    /// Determine plural form based on language-specific rules
    fn get_plural_form(&self, count: i64, lang: &str) -> &'static str {
        match lang {
            // Portuguese treats zero as singular
            "pt-BR" | "pt" => {
                if count.abs() <= 1 {
                    "one"
                } else {
                    "other"
                }
            }
            _ => {
                if count == 1 {
                    "one"
                } else {
                    "other"
                }
            }
        }
    }

    /// Get supported languages
    pub fn supported_languages(&self) -> &[String] {
        &self.supported_languages
    }

    /// Get default language
    pub fn default_language(&self) -> &str {
        &self.default_language
    }

    /// Pick a language from an `Accept-Language` header value
    ///
    /// Entries are tried by descending quality. An exact tag wins, then a
    /// supported language sharing the primary subtag (`pt` matches `pt-BR`).
    pub fn detect_language(&self, accept_language: Option<&str>) -> String {
        let Some(header) = accept_language else {
            return self.default_language.clone();
        };

        let mut candidates: Vec<(f32, &str)> = header
            .split(',')
            .filter_map(|entry| {
                let mut parts = entry.trim().split(';');
                let tag = parts.next()?.trim();
                if tag.is_empty() || tag == "*" {
                    return None;
                }
                let quality = parts
                    .find_map(|p| p.trim().strip_prefix("q="))
                    .and_then(|q| q.parse::<f32>().ok())
                    .unwrap_or(1.0);
                Some((quality, tag))
            })
            .collect();
        candidates.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));

        for (_, tag) in candidates {
            if let Some(exact) = self
                .supported_languages
                .iter()
                .find(|l| l.eq_ignore_ascii_case(tag))
            {
                return exact.clone();
            }
            let primary = tag.split('-').next().unwrap_or(tag);
            if let Some(partial) = self.supported_languages.iter().find(|l| {
                l.split('-')
                    .next()
                    .map(|p| p.eq_ignore_ascii_case(primary))
                    .unwrap_or(false)
            }) {
                return partial.clone();
            }
        }

        self.default_language.clone()
    }
}
