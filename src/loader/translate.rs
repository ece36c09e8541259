//! Machine translation provider seam.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TranslateError {
    #[error("Translation provider failed: {0}")]
    Provider(String),

    #[error("'{0}' is the source language and cannot be machine translated")]
    SourceLanguage(String),

    #[error("'{keypath}' has no source text in '{locale}'")]
    MissingSourceText { keypath: String, locale: String },
}

/// An external translation provider.
///
/// Called once per request; retries are left to the caller.
pub trait Translator: Send + Sync {
    /// Translates `text` from locale `from` into locale `to`.
    fn translate(
        &self,
        text: &str,
        from: &str,
        to: &str,
    ) -> impl Future<Output = Result<String, TranslateError>> + Send;
}
