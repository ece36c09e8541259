//! Key commands invoked from the tree view.

use crate::loader::{
    LoaderError,
    LocaleLoader,
    Translator,
};
use crate::tree::{
    LocaleNode,
    LocaleRecord,
};

/// Text copied for a key: `$t('common.hello')`.
#[must_use]
pub fn copy_key_snippet(node: &LocaleNode) -> String {
    format!("$t('{}')", node.keypath)
}

/// Writes `new_value` to `record` when it differs from the current value.
///
/// `None` means the edit was cancelled. Returns whether anything was written.
pub async fn edit_key(
    loader: &LocaleLoader,
    record: &LocaleRecord,
    new_value: Option<&str>,
) -> Result<bool, LoaderError> {
    let Some(new_value) = new_value else {
        return Ok(false);
    };
    if record.value.as_deref() == Some(new_value) {
        tracing::debug!(keypath = %record.keypath, locale = %record.locale, "Value unchanged");
        return Ok(false);
    }

    loader.write_to_file(&record.with_value(new_value)).await?;
    Ok(true)
}

/// Machine translates `record` and saves the result.
///
/// Returns the saved record, or `None` when the translation was superseded.
pub async fn translate_key<T: Translator>(
    loader: &LocaleLoader,
    record: &LocaleRecord,
    translator: &T,
) -> Result<Option<LocaleRecord>, LoaderError> {
    let Some(pending) = loader.machine_translate_record(record, translator).await? else {
        return Ok(None);
    };

    loader.write_to_file(&pending).await?;
    tracing::info!(keypath = %pending.keypath, locale = %pending.locale, "Translation saved");
    Ok(Some(pending))
}
