use serde::{
    Deserialize,
    Serialize,
};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Configuration error in '{field_path}': {message}")]
pub struct ValidationError {
    /// JSON path to the field (e.g., "excludePatterns[0]")
    pub field_path: String,
    pub message: String,
}

impl ValidationError {
    #[must_use]
    pub fn new(field_path: impl Into<String>, message: impl Into<String>) -> Self {
        Self { field_path: field_path.into(), message: message.into() }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration validation failed:\n{}", format_validation_errors(.0))]
    ValidationErrors(Vec<ValidationError>),

    #[error("Failed to load configuration file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse configuration: {0}")]
    ParseError(#[from] serde_json::Error),
}

fn format_validation_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .enumerate()
        .map(|(i, err)| format!("  {}. {} - {}", i + 1, err.field_path, err.message))
        .collect::<Vec<_>>()
        .join("\n")
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LocaleSettings {
    /// Canonical locale, used for fallback and "is-source" marking.
    pub source_language: String,

    /// Locale shown as a node's value. Defaults to `source_language`.
    pub display_language: Option<String>,

    /// Locales that every key should be translated into.
    ///
    /// - `None`: every locale detected in the locale files (default)
    /// - `Some([...])`: only these locales, also used to detect a file's locale
    pub locales: Option<Vec<String>>,

    pub locale_files: LocaleFilesConfig,
    pub exclude_patterns: Vec<String>,

    pub key_separator: String,

    pub loading: LoadingConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LocaleFilesConfig {
    pub file_pattern: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct LoadingConfig {
    /// Maximum number of locale files read at once.
    /// Default: 80% of CPU cores (minimum 1).
    pub max_concurrent_reads: Option<usize>,
}

impl LoadingConfig {
    #[must_use]
    pub fn effective_concurrency(&self) -> usize {
        self.max_concurrent_reads.unwrap_or_else(|| (num_cpus::get() * 4 / 5).max(1)).max(1)
    }
}

impl LocaleSettings {
    /// Locale used for node display values.
    #[must_use]
    pub fn display_language(&self) -> &str {
        self.display_language.as_deref().unwrap_or(&self.source_language)
    }

    /// # Errors
    /// - Required field is empty
    /// - Invalid glob pattern
    /// - Invalid locale list
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if self.key_separator.is_empty() {
            errors.push(ValidationError::new(
                "keySeparator",
                "The separator cannot be empty. Please specify a separator, for example: \".\" (dot)",
            ));
        }

        if self.source_language.trim().is_empty() {
            errors.push(ValidationError::new(
                "sourceLanguage",
                "The source language cannot be empty. Example: \"en\"",
            ));
        }

        if let Some(display) = &self.display_language
            && display.trim().is_empty()
        {
            errors.push(ValidationError::new(
                "displayLanguage",
                "The display language cannot be empty. Please specify a locale, or remove this field",
            ));
        }

        if let Some(locales) = &self.locales {
            self.validate_locales(locales, &mut errors);
        }

        for (index, pattern) in self.exclude_patterns.iter().enumerate() {
            if let Err(e) = globset::Glob::new(pattern) {
                errors.push(ValidationError::new(
                    format!("excludePatterns[{index}]"),
                    format!("Invalid glob pattern '{pattern}': {e}"),
                ));
            }
        }

        if self.locale_files.file_pattern.is_empty() {
            errors.push(ValidationError::new(
                "localeFiles.filePattern",
                "The pattern cannot be empty. Example: \"**/locales/**/*.json\"",
            ));
        } else if let Err(e) = globset::Glob::new(&self.locale_files.file_pattern) {
            errors.push(ValidationError::new(
                "localeFiles.filePattern",
                format!("Invalid glob pattern '{}': {e}", self.locale_files.file_pattern),
            ));
        }

        if self.loading.max_concurrent_reads == Some(0) {
            errors.push(ValidationError::new(
                "loading.maxConcurrentReads",
                "Must be at least 1, or removed to use the default",
            ));
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }

    fn validate_locales(&self, locales: &[String], errors: &mut Vec<ValidationError>) {
        if locales.is_empty() {
            errors.push(ValidationError::new(
                "locales",
                "At least one locale is required. Example: [\"en\", \"ja\"], or remove this field",
            ));
            return;
        }

        for (index, locale) in locales.iter().enumerate() {
            if locale.trim().is_empty() {
                errors.push(ValidationError::new(
                    format!("locales[{index}]"),
                    "The locale cannot be empty",
                ));
            } else if locales.iter().take(index).any(|earlier| earlier == locale) {
                errors.push(ValidationError::new(
                    format!("locales[{index}]"),
                    format!("Duplicate locale '{locale}'"),
                ));
            }
        }

        if !locales.contains(&self.source_language) {
            errors.push(ValidationError::new(
                "sourceLanguage",
                format!("'{}' must be one of the configured locales", self.source_language),
            ));
        }
    }
}

impl Default for LocaleFilesConfig {
    fn default() -> Self {
        Self { file_pattern: "**/{locales,lang,langs,i18n,messages}/**/*.json".to_string() }
    }
}

impl Default for LocaleSettings {
    fn default() -> Self {
        Self {
            source_language: "en".to_string(),
            display_language: None,
            locales: None,
            locale_files: LocaleFilesConfig::default(),
            exclude_patterns: vec!["node_modules/**".to_string()],
            key_separator: ".".to_string(),
            loading: LoadingConfig::default(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing, clippy::expect_used, clippy::panic)]
mod tests {
    use googletest::prelude::*;
    use rstest::*;

    use super::*;

    #[rstest]
    fn validate_valid_settings() {
        let settings = LocaleSettings::default();

        assert_that!(settings.validate(), ok(anything()));
    }

    #[rstest]
    fn deserialize_partial_settings() {
        let json = r#"{"sourceLanguage": "ja", "locales": ["ja", "en"]}"#;

        let settings: LocaleSettings = serde_json::from_str(json).unwrap();

        assert_that!(settings.source_language, eq("ja"));
        assert_that!(settings.display_language(), eq("ja"));
        assert_that!(settings.key_separator, eq("."));
        assert_that!(settings.locales, some(elements_are![eq("ja"), eq("en")]));
    }

    #[rstest]
    fn deserialize_empty_settings() {
        let settings: LocaleSettings = serde_json::from_str("{}").unwrap();

        assert_that!(settings, eq(&LocaleSettings::default()));
        assert_that!(settings.exclude_patterns, elements_are![eq("node_modules/**")]);
        assert_that!(
            settings.locale_files.file_pattern,
            eq("**/{locales,lang,langs,i18n,messages}/**/*.json")
        );
    }

    #[rstest]
    fn validate_invalid_key_separator_empty() {
        let settings = LocaleSettings { key_separator: String::new(), ..LocaleSettings::default() };

        assert_that!(
            settings.validate(),
            err(elements_are![all![
                field!(ValidationError.field_path, eq("keySeparator")),
                field!(ValidationError.message, contains_substring("cannot be empty"))
            ]])
        );
    }

    #[rstest]
    fn validate_source_language_outside_locales() {
        let settings = LocaleSettings {
            locales: Some(vec!["ja".to_string(), "fr".to_string()]),
            ..LocaleSettings::default()
        };

        assert_that!(
            settings.validate(),
            err(elements_are![all![
                field!(ValidationError.field_path, eq("sourceLanguage")),
                field!(ValidationError.message, contains_substring("'en'"))
            ]])
        );
    }

    #[rstest]
    fn validate_duplicate_locales() {
        let settings = LocaleSettings {
            locales: Some(vec!["en".to_string(), "fr".to_string(), "en".to_string()]),
            ..LocaleSettings::default()
        };

        assert_that!(
            settings.validate(),
            err(elements_are![all![
                field!(ValidationError.field_path, eq("locales[2]")),
                field!(ValidationError.message, contains_substring("Duplicate"))
            ]])
        );
    }

    #[rstest]
    fn validate_invalid_exclude_pattern() {
        let settings = LocaleSettings {
            exclude_patterns: vec!["node_modules/**".to_string(), "invalid[pattern".to_string()],
            ..LocaleSettings::default()
        };

        assert_that!(
            settings.validate(),
            err(elements_are![all![
                field!(ValidationError.field_path, eq("excludePatterns[1]")),
                field!(ValidationError.message, contains_substring("Invalid glob pattern"))
            ]])
        );
    }

    #[rstest]
    fn validate_invalid_locale_file_pattern() {
        let settings = LocaleSettings {
            locale_files: LocaleFilesConfig { file_pattern: "**/{locales/*.json".to_string() },
            ..LocaleSettings::default()
        };

        assert_that!(
            settings.validate(),
            err(elements_are![field!(
                ValidationError.field_path,
                eq("localeFiles.filePattern")
            )])
        );
    }

    #[rstest]
    #[case(Some(3), 3)]
    #[case(Some(1), 1)]
    fn effective_concurrency_uses_setting(#[case] configured: Option<usize>, #[case] expected: usize) {
        let loading = LoadingConfig { max_concurrent_reads: configured };

        assert_that!(loading.effective_concurrency(), eq(expected));
    }

    #[rstest]
    fn effective_concurrency_default_is_positive() {
        assert_that!(LoadingConfig::default().effective_concurrency(), ge(1));
    }

    #[rstest]
    fn config_error_validation_errors_format() {
        let settings = LocaleSettings {
            key_separator: String::new(),
            source_language: String::new(),
            ..LocaleSettings::default()
        };

        let errors = settings.validate().unwrap_err();
        let error_message = format!("{}", ConfigError::ValidationErrors(errors));

        assert_that!(error_message, contains_substring("Configuration validation failed"));
        assert_that!(error_message, contains_substring("1. keySeparator"));
        assert_that!(error_message, contains_substring("2. sourceLanguage"));
    }
}
