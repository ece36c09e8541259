//! Locale source file parsing.

use std::collections::HashMap;
use std::path::{
    Path,
    PathBuf,
};

use serde_json::Value;
use thiserror::Error;

use crate::tree::LocaleRecord;
use crate::types::SourceRange;

/// ISO 639-1 language codes, used to recognise the primary subtag of a locale.
const ISO_639_1: &[&str] = &[
    "aa", "ab", "ae", "af", "ak", "am", "an", "ar", "as", "av", "ay", "az", "ba", "be", "bg", "bh",
    "bi", "bm", "bn", "bo", "br", "bs", "ca", "ce", "ch", "co", "cr", "cs", "cu", "cv", "cy", "da",
    "de", "dv", "dz", "ee", "el", "en", "eo", "es", "et", "eu", "fa", "ff", "fi", "fj", "fo", "fr",
    "fy", "ga", "gd", "gl", "gn", "gu", "gv", "ha", "he", "hi", "ho", "hr", "ht", "hu", "hy", "hz",
    "ia", "id", "ie", "ig", "ii", "ik", "io", "is", "it", "iu", "ja", "jv", "ka", "kg", "ki", "kj",
    "kk", "kl", "km", "kn", "ko", "kr", "ks", "ku", "kv", "kw", "ky", "la", "lb", "lg", "li", "ln",
    "lo", "lt", "lu", "lv", "mg", "mh", "mi", "mk", "ml", "mn", "mr", "ms", "mt", "my", "na", "nb",
    "nd", "ne", "ng", "nl", "nn", "no", "nr", "nv", "ny", "oc", "oj", "om", "or", "os", "pa", "pi",
    "pl", "ps", "pt", "qu", "rm", "rn", "ro", "ru", "rw", "sa", "sc", "sd", "se", "sg", "si", "sk",
    "sl", "sm", "sn", "so", "sq", "sr", "ss", "st", "su", "sv", "sw", "ta", "te", "tg", "th", "ti",
    "tk", "tl", "tn", "to", "tr", "ts", "tt", "tw", "ty", "ug", "uk", "ur", "uz", "ve", "vi", "vo",
    "wa", "wo", "xh", "yi", "yo", "za", "zh", "zu",
];

/// Errors reading or parsing one locale file.
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Failed to read locale file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse locale file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Locale file {} must contain a JSON object at its root", path.display())]
    NotAnObject { path: PathBuf },
}

impl SourceError {
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::Read { path, .. } | Self::Parse { path, .. } | Self::NotAnObject { path } => path,
        }
    }
}

/// How keys are laid out inside a locale file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeyStyle {
    /// `{ "common": { "hello": "Hello" } }`
    #[default]
    Nested,
    /// `{ "common.hello": "Hello" }`
    Flat,
}

/// One parsed locale file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocaleFile {
    pub path: PathBuf,
    pub locale: String,
    pub style: KeyStyle,
    /// Flattened entries in document order.
    pub entries: Vec<(String, String)>,
    /// Key → value range, for records.
    pub value_ranges: HashMap<String, SourceRange>,
    pub text: String,
}

impl LocaleFile {
    /// Parses the text of a locale file.
    ///
    /// # Errors
    /// Returns error if the text is not JSON or its root is not an object.
    pub fn parse(
        path: impl Into<PathBuf>,
        locale: impl Into<String>,
        text: String,
        separator: &str,
    ) -> Result<Self, SourceError> {
        let path = path.into();
        let json: Value = match serde_json::from_str(&text) {
            Ok(json) => json,
            Err(source) => return Err(SourceError::Parse { path, source }),
        };
        let Value::Object(root) = &json else {
            return Err(SourceError::NotAnObject { path });
        };

        let style = detect_key_style(root, separator);
        let entries = flatten_json(&json, separator, None);
        let value_ranges = extract_value_ranges(&text, separator);

        Ok(Self { path, locale: locale.into(), style, entries, value_ranges, text })
    }

    #[must_use]
    pub fn contains_key(&self, keypath: &str) -> bool {
        self.entries.iter().any(|(key, _)| key == keypath)
    }

    #[must_use]
    pub fn value(&self, keypath: &str) -> Option<&str> {
        self.entries.iter().find(|(key, _)| key == keypath).map(|(_, value)| value.as_str())
    }

    /// Records of this file in document order.
    pub fn records(&self) -> impl Iterator<Item = LocaleRecord> + '_ {
        self.entries.iter().map(|(key, value)| {
            LocaleRecord::new(key.clone(), self.locale.clone(), value.clone(), self.path.clone())
                .with_range(self.value_ranges.get(key).copied())
        })
    }
}

/// Reads and parses a locale file.
///
/// # Errors
/// Returns error if the file cannot be read or parsed.
pub async fn read_locale_file(
    path: &Path,
    locale: &str,
    separator: &str,
) -> Result<LocaleFile, SourceError> {
    let text = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| SourceError::Read { path: path.to_path_buf(), source })?;
    LocaleFile::parse(path, locale, text, separator)
}

fn detect_key_style(root: &serde_json::Map<String, Value>, separator: &str) -> KeyStyle {
    let has_separated_keys = root.keys().any(|key| key.contains(separator));
    let has_nested_objects = root.values().any(Value::is_object);
    if has_separated_keys && !has_nested_objects { KeyStyle::Flat } else { KeyStyle::Nested }
}

/// Detect locale from file path.
///
/// With configured locales, every path part (split by separators and '.') is
/// searched backwards for one of them. Without, only the file name and its
/// parent directory are searched for a part shaped like a language tag.
///
/// # Examples
/// - `locales/en.json` → `en`
/// - `messages/ja-JP.json` → `ja-JP`
/// - `translations/en_US/common.json` → `en_US`
#[must_use]
pub fn detect_locale_from_path(file_path: &Path, configured: Option<&[String]>) -> Option<String> {
    if let Some(locales) = configured {
        let path_str = file_path.to_string_lossy();
        let parts: Vec<&str> = path_str.split(['/', '\\', '.']).collect();
        return parts
            .into_iter()
            .rev()
            .find(|part| locales.iter().any(|locale| locale == part))
            .map(str::to_string);
    }

    let file_name = file_path.file_name()?.to_string_lossy();
    let parent_name = file_path
        .parent()
        .and_then(Path::file_name)
        .map(|name| name.to_string_lossy())
        .unwrap_or_default();

    file_name
        .rsplit('.')
        .chain(std::iter::once(&*parent_name))
        .find(|part| looks_like_locale_code(part))
        .map(str::to_string)
}

/// Replaces the locale part of a locale file path.
///
/// The last path part (split by separators and '.') equal to `from` is replaced.
/// Returns `None` when the path does not mention `from`.
///
/// # Examples
/// - `locales/en.json`, `en` → `fr`: `locales/fr.json`
/// - `locales/en/common.json`, `en` → `fr`: `locales/fr/common.json`
#[must_use]
pub fn replace_locale_in_path(file_path: &Path, from: &str, to: &str) -> Option<PathBuf> {
    let components: Vec<String> = file_path
        .components()
        .map(|component| component.as_os_str().to_string_lossy().into_owned())
        .collect();

    let (index, replaced) = components.iter().enumerate().rev().find_map(|(index, component)| {
        let parts: Vec<&str> = component.split('.').collect();
        let position = parts.iter().rposition(|part| *part == from)?;
        let replaced = parts
            .iter()
            .enumerate()
            .map(|(i, part)| if i == position { to } else { *part })
            .collect::<Vec<_>>()
            .join(".");
        Some((index, replaced))
    })?;

    Some(
        components
            .iter()
            .enumerate()
            .map(|(i, component)| if i == index { replaced.as_str() } else { component.as_str() })
            .collect(),
    )
}

/// Checks the shape `ll`, `ll-RR`, `ll_RR`, `ll-Scrp-RR` (case-insensitive subtags).
fn looks_like_locale_code(part: &str) -> bool {
    let mut subtags = part.split(['-', '_']);
    let Some(primary) = subtags.next() else {
        return false;
    };
    if !ISO_639_1.contains(&primary.to_ascii_lowercase().as_str()) {
        return false;
    }

    subtags.all(|subtag| {
        let is_region = subtag.len() == 2 && subtag.chars().all(|c| c.is_ascii_alphabetic());
        let is_numeric_region = subtag.len() == 3 && subtag.chars().all(|c| c.is_ascii_digit());
        let is_script = subtag.len() == 4 && subtag.chars().all(|c| c.is_ascii_alphabetic());
        is_region || is_numeric_region || is_script
    })
}

/// Flatten nested JSON object into separator-joined entries, in document order.
///
/// # Examples
/// ```
/// use serde_json::json;
/// use locale_tree::input::flatten_json;
///
/// let json = json!({
///     "common": {
///         "hello": "Hello",
///         "goodbye": "Goodbye"
///     }
/// });
///
/// let flattened = flatten_json(&json, ".", None);
/// assert_eq!(flattened[0], ("common.hello".to_string(), "Hello".to_string()));
/// assert_eq!(flattened[1], ("common.goodbye".to_string(), "Goodbye".to_string()));
/// ```
#[must_use]
pub fn flatten_json(json: &Value, separator: &str, prefix: Option<&str>) -> Vec<(String, String)> {
    let mut result = Vec::new();
    flatten_json_value(json, separator, prefix, &mut result);
    result
}

fn flatten_json_value(
    json: &Value,
    separator: &str,
    prefix: Option<&str>,
    result: &mut Vec<(String, String)>,
) {
    match json {
        Value::Object(map) => {
            for (key, value) in map {
                let full_key =
                    prefix.map_or_else(|| key.clone(), |p| format!("{p}{separator}{key}"));
                flatten_json_value(value, separator, Some(&full_key), result);
            }
        }
        Value::Array(arr) => {
            for (index, value) in arr.iter().enumerate() {
                let full_key =
                    prefix.map_or_else(|| format!("[{index}]"), |p| format!("{p}[{index}]"));
                flatten_json_value(value, separator, Some(&full_key), result);
            }
        }
        Value::String(s) => {
            if let Some(key) = prefix {
                result.push((key.to_string(), s.clone()));
            }
        }
        _ => {
            if let Some(key) = prefix {
                result.push((key.to_string(), json.to_string()));
            }
        }
    }
}

/// Extract value source ranges from JSON text using tree-sitter.
#[must_use]
pub fn extract_value_ranges(json_text: &str, separator: &str) -> HashMap<String, SourceRange> {
    let mut value_ranges = HashMap::new();

    let mut parser = tree_sitter::Parser::new();
    let Ok(()) = parser.set_language(&tree_sitter_json::LANGUAGE.into()) else {
        tracing::warn!("Failed to set tree-sitter-json language");
        return value_ranges;
    };

    let Some(tree) = parser.parse(json_text, None) else {
        tracing::warn!("Failed to parse JSON with tree-sitter");
        return value_ranges;
    };

    extract_from_node(tree.root_node(), json_text.as_bytes(), separator, None, &mut value_ranges);

    value_ranges
}

fn extract_from_node(
    node: tree_sitter::Node<'_>,
    source: &[u8],
    separator: &str,
    prefix: Option<&str>,
    value_ranges: &mut HashMap<String, SourceRange>,
) {
    match node.kind() {
        "document" | "object" => {
            let mut cursor = node.walk();
            for child in node.children(&mut cursor) {
                extract_from_node(child, source, separator, prefix, value_ranges);
            }
        }
        "array" => {
            let mut cursor = node.walk();
            let elements = node.named_children(&mut cursor).filter(|child| child.kind() != "comment");
            for (index, child) in elements.enumerate() {
                let full_key =
                    prefix.map_or_else(|| format!("[{index}]"), |p| format!("{p}[{index}]"));
                extract_value(child, source, separator, full_key, value_ranges);
            }
        }
        "pair" => {
            let Some(key_node) = node.child_by_field_name("key") else {
                return;
            };
            let Some(value_node) = node.child_by_field_name("value") else {
                return;
            };
            let Ok(key_text) = key_node.utf8_text(source) else {
                tracing::warn!("Failed to get key text from node");
                return;
            };
            let key = key_text.trim_matches('"');
            let full_key =
                prefix.map_or_else(|| key.to_string(), |p| format!("{p}{separator}{key}"));
            extract_value(value_node, source, separator, full_key, value_ranges);
        }
        _ => {}
    }
}

fn extract_value(
    value_node: tree_sitter::Node<'_>,
    source: &[u8],
    separator: &str,
    full_key: String,
    value_ranges: &mut HashMap<String, SourceRange>,
) {
    match value_node.kind() {
        "object" | "array" => {
            extract_from_node(value_node, source, separator, Some(&full_key), value_ranges);
        }
        _ => {
            value_ranges.insert(full_key, SourceRange::from_node(&value_node));
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use std::path::Path;

    use googletest::prelude::*;
    use rstest::rstest;
    use serde_json::json;

    use super::*;

    fn entry(key: &str, value: &str) -> (String, String) {
        (key.to_string(), value.to_string())
    }

    #[googletest::test]
    fn test_flatten_json_keeps_document_order() {
        let json: Value =
            serde_json::from_str(r#"{"zeta": "Z", "alpha": {"b": "B", "a": "A"}}"#).unwrap();

        let result = flatten_json(&json, ".", None);

        expect_that!(
            result,
            elements_are![
                eq(&entry("zeta", "Z")),
                eq(&entry("alpha.b", "B")),
                eq(&entry("alpha.a", "A"))
            ]
        );
    }

    #[googletest::test]
    fn test_flatten_json_non_string_values_and_arrays() {
        let json = json!({
            "number": 42,
            "flag": true,
            "items": ["apple", { "name": "Bob" }]
        });

        let result = flatten_json(&json, ".", None);

        expect_that!(result, contains(eq(&entry("number", "42"))));
        expect_that!(result, contains(eq(&entry("flag", "true"))));
        expect_that!(result, contains(eq(&entry("items[0]", "apple"))));
        expect_that!(result, contains(eq(&entry("items[1].name", "Bob"))));
    }

    #[googletest::test]
    fn test_flatten_json_custom_separator() {
        let json = json!({ "common": { "hello": "Hello" } });

        let result = flatten_json(&json, "_", None);

        expect_that!(result, elements_are![eq(&entry("common_hello", "Hello"))]);
    }

    #[rstest]
    #[case("/path/to/locales/en/trans.json", Some("en"))]
    #[case("/path/to/locales/ja/trans.json", Some("ja"))]
    #[case("/path/to/locales/hoge/trans.json", None)]
    #[case("/path/to/locales/sub/en.json", Some("en"))]
    #[case("/path/to/my/locales/trans.json", None)]
    #[case("/path/to/locales/en-trans.json", None)]
    #[case("/path/to/locales/en-us/trans.json", Some("en-us"))]
    #[case("/path/to/locales/en_US/trans.json", Some("en_US"))]
    #[case("/path/to/locales/zh-Hant-TW.json", Some("zh-Hant-TW"))]
    #[case("/path/to/locales/es-419.json", Some("es-419"))]
    // When multiple locale names are included, the last match is returned
    #[case("/path/to/locales/en/ja.json", Some("ja"))]
    fn test_detect_locale_from_path(#[case] path: &str, #[case] expected: Option<&str>) {
        let result = detect_locale_from_path(Path::new(path), None);
        assert_eq!(result.as_deref(), expected);
    }

    #[rstest]
    fn test_detect_locale_from_path_with_configured_locales() {
        let configured = vec!["en".to_string(), "pirate".to_string()];

        let pirate = detect_locale_from_path(Path::new("/locales/pirate.json"), Some(&configured));
        let german = detect_locale_from_path(Path::new("/locales/de.json"), Some(&configured));

        assert_eq!(pirate.as_deref(), Some("pirate"));
        assert_eq!(german, None);
    }

    #[rstest]
    #[case("/ws/locales/en.json", "/ws/locales/fr.json")]
    #[case("/ws/locales/en/common.json", "/ws/locales/fr/common.json")]
    #[case("/ws/messages/app.en.json", "/ws/messages/app.fr.json")]
    #[case("/ws/en/locales/en.json", "/ws/en/locales/fr.json")]
    fn test_replace_locale_in_path(#[case] path: &str, #[case] expected: &str) {
        let replaced = replace_locale_in_path(Path::new(path), "en", "fr");

        assert_that!(replaced, some(eq(&PathBuf::from(expected))));
    }

    #[rstest]
    fn test_replace_locale_in_path_without_locale() {
        assert_that!(replace_locale_in_path(Path::new("/ws/locales/app.json"), "en", "fr"), none());
    }

    #[googletest::test]
    fn test_parse_nested_file() {
        let text = r#"{
  "common": {
    "hello": "Hello"
  }
}"#;

        let file = LocaleFile::parse("/locales/en.json", "en", text.to_string(), ".").unwrap();

        expect_that!(file.style, eq(KeyStyle::Nested));
        expect_that!(file.value("common.hello"), some(eq("Hello")));
        let records: Vec<_> = file.records().collect();
        expect_that!(records.len(), eq(1));
        expect_that!(records[0].locale, eq("en"));
        expect_that!(
            records[0].range.map(|r| r.start),
            some(eq(crate::types::SourcePosition { line: 2, character: 13 }))
        );
    }

    #[googletest::test]
    fn test_parse_flat_file() {
        let text = r#"{ "common.hello": "Hello", "common.bye": "Bye" }"#;

        let file = LocaleFile::parse("/locales/en.json", "en", text.to_string(), ".").unwrap();

        expect_that!(file.style, eq(KeyStyle::Flat));
        expect_that!(file.contains_key("common.bye"), eq(true));
        expect_that!(file.value_ranges.contains_key("common.hello"), eq(true));
    }

    #[googletest::test]
    fn test_parse_errors() {
        let malformed = LocaleFile::parse("/locales/en.json", "en", "{ nope".to_string(), ".");
        let not_object = LocaleFile::parse("/locales/en.json", "en", "[1, 2]".to_string(), ".");

        expect_true!(matches!(malformed, Err(SourceError::Parse { .. })));
        let not_object = not_object.unwrap_err();
        expect_true!(matches!(not_object, SourceError::NotAnObject { .. }));
        expect_that!(not_object.path(), eq(Path::new("/locales/en.json")));
    }

    #[googletest::test]
    fn test_extract_value_ranges_with_dots_in_keys() {
        let json_text = r#"{
  "hoge.fuga": {
    "piyo": "Hello"
  },
  "items": ["a", "b"]
}"#;

        let value_ranges = extract_value_ranges(json_text, ".");

        expect_that!(value_ranges.contains_key("hoge.fuga.piyo"), eq(true));
        expect_that!(value_ranges.contains_key("hoge.fuga"), eq(false));
        expect_that!(value_ranges.contains_key("items[0]"), eq(true));
        expect_that!(value_ranges.contains_key("items[1]"), eq(true));
    }
}
