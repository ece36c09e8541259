//! Key completion entries.

use serde::Serialize;

use crate::loader::LocaleSnapshot;

/// One completion entry for a translation key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyCompletion {
    /// Value of the key in the requested locale, empty when missing.
    pub label: String,
    pub key: String,
    /// Snippet offering the common translate call styles.
    pub insert_text: String,
    /// Markdown with the key and its source-language value.
    pub documentation: String,
}

/// One entry per known key, in key order.
#[must_use]
pub fn key_completions(snapshot: &LocaleSnapshot, locale: &str) -> Vec<KeyCompletion> {
    let source_language = snapshot.source_language();
    snapshot
        .keys()
        .iter()
        .map(|key| {
            let label = snapshot.get_value_by_key(key, locale, 0).unwrap_or_default();
            let source_value = snapshot.get_value_by_key(key, source_language, 0).unwrap_or_default();
            KeyCompletion {
                label: label.to_string(),
                key: key.clone(),
                insert_text: format!("${{1|this.$t,$t,i18n.t|}}('{key}')"),
                documentation: format!("*i18n Key* \n\n{key}\n\n{source_value}"),
            }
        })
        .collect()
}
