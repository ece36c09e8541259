//! Workspace settings: file discovery patterns, locales and key separator.
/// Config file loader
mod loader;
/// Configuration manager
mod manager;
/// Locale file pattern matcher
mod matcher;
/// Configuration types and settings
mod types;

pub use loader::CONFIG_FILE_NAME;
pub use manager::ConfigManager;
pub use matcher::{
    LocaleFileMatcher,
    MatcherError,
};
pub use types::{
    ConfigError,
    LoadingConfig,
    LocaleFilesConfig,
    LocaleSettings,
    ValidationError,
};
