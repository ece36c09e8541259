//! Locale file pattern matcher.

use std::path::{
    Path,
    PathBuf,
};

use globset::{
    Glob,
    GlobSet,
    GlobSetBuilder,
};

use super::LocaleSettings;

#[derive(Debug, thiserror::Error)]
pub enum MatcherError {
    #[error("Invalid locale file pattern '{pattern}': {source}")]
    InvalidLocalePattern {
        pattern: String,
        #[source]
        source: globset::Error,
    },

    #[error("Invalid exclude pattern '{pattern}': {source}")]
    InvalidExcludePattern {
        pattern: String,
        #[source]
        source: globset::Error,
    },

    #[error("Failed to build glob set: {0}")]
    GlobSetBuild(#[from] globset::Error),
}

/// Decides whether a workspace path is a locale file.
#[derive(Debug, Clone)]
pub struct LocaleFileMatcher {
    workspace_root: PathBuf,
    locale_set: GlobSet,
    exclude_set: GlobSet,
}

impl LocaleFileMatcher {
    /// # Errors
    /// Returns an error if a configured pattern is not a valid glob.
    pub fn new(workspace_root: PathBuf, settings: &LocaleSettings) -> Result<Self, MatcherError> {
        let locale_set = build_glob_set(
            std::slice::from_ref(&settings.locale_files.file_pattern),
            |pattern, source| MatcherError::InvalidLocalePattern { pattern, source },
        )?;
        let exclude_set = build_glob_set(&settings.exclude_patterns, |pattern, source| {
            MatcherError::InvalidExcludePattern { pattern, source }
        })?;

        Ok(Self { workspace_root, locale_set, exclude_set })
    }

    #[must_use]
    pub fn workspace_root(&self) -> &Path {
        &self.workspace_root
    }

    /// The path must be absolute and under the workspace root.
    #[must_use]
    pub fn is_locale_file(&self, absolute_path: &Path) -> bool {
        absolute_path
            .strip_prefix(&self.workspace_root)
            .is_ok_and(|relative_path| self.is_locale_file_relative(relative_path))
    }

    /// The path must be relative to the workspace root.
    #[must_use]
    pub fn is_locale_file_relative(&self, relative_path: &Path) -> bool {
        self.locale_set.is_match(relative_path) && !self.exclude_set.is_match(relative_path)
    }
}

fn build_glob_set<F>(patterns: &[String], make_error: F) -> Result<GlobSet, MatcherError>
where
    F: Fn(String, globset::Error) -> MatcherError,
{
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern).map_err(|e| make_error(pattern.clone(), e))?;
        builder.add(glob);
    }
    Ok(builder.build()?)
}
