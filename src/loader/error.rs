use std::path::{
    Path,
    PathBuf,
};

use serde::Serialize;
use thiserror::Error;

use super::translate::TranslateError;
use crate::config::{
    ConfigError,
    MatcherError,
};
use crate::input::{
    EditError,
    SourceError,
};
use crate::tree::TreeConflict;

/// Errors returned to the caller of a loader operation.
#[derive(Error, Debug)]
pub enum LoaderError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Matcher(#[from] MatcherError),

    #[error("Failed to read locale file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write locale file {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to edit locale file {}: {source}", path.display())]
    Edit {
        path: PathBuf,
        #[source]
        source: EditError,
    },

    #[error(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    Conflict(#[from] TreeConflict),

    #[error(transparent)]
    Translate(#[from] TranslateError),

    #[error("'{0}' is an array element and cannot be edited")]
    UnsupportedKey(String),

    #[error("Key '{0}' not found")]
    KeyNotFound(String),

    #[error("Key '{0}' already exists")]
    KeyExists(String),

    #[error("'{keypath}' ({locale}) has no value to write")]
    MissingValue { keypath: String, locale: String },
}

/// A problem found while loading, reported without aborting the load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum LoadIssue {
    /// The file could not be read or parsed; none of its keys are loaded.
    File { path: PathBuf, message: String },
    /// A record could not be merged into the tree.
    Conflict { conflict: TreeConflict },
}

impl LoadIssue {
    #[must_use]
    pub fn from_source_error(error: &SourceError) -> Self {
        Self::File { path: error.path().to_path_buf(), message: error.to_string() }
    }

    /// Path of the failed file, `None` for conflicts.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::File { path, .. } => Some(path),
            Self::Conflict { .. } => None,
        }
    }

    #[must_use]
    pub const fn is_file_error(&self) -> bool {
        matches!(self, Self::File { .. })
    }
}

impl std::fmt::Display for LoadIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::File { message, .. } => f.write_str(message),
            Self::Conflict { conflict } => write!(f, "{conflict}"),
        }
    }
}

/// Outcome of a load cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LoadReport {
    /// Number of locale files merged into the snapshot.
    pub files: usize,
    pub issues: Vec<LoadIssue>,
}

impl LoadReport {
    #[must_use]
    pub fn has_file_errors(&self) -> bool {
        self.issues.iter().any(LoadIssue::is_file_error)
    }
}
