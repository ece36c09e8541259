//! Immutable, fully merged view of every loaded locale file.

use std::borrow::Cow;
use std::path::{
    Path,
    PathBuf,
};

use indexmap::IndexMap;

use super::error::LoadIssue;
use crate::config::LocaleSettings;
use crate::input::{
    KeyStyle,
    LocaleFile,
    replace_locale_in_path,
};
use crate::keypath;
use crate::tree::{
    LocaleItem,
    LocaleNode,
    LocaleRecord,
    LocaleTree,
    TreeBuilder,
};

/// Metadata of one loaded locale file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileInfo {
    pub path: PathBuf,
    pub locale: String,
    pub style: KeyStyle,
}

/// A merged record set. Never mutated after it is published.
#[derive(Debug, Clone, Default)]
pub struct LocaleSnapshot {
    tree: LocaleTree,
    keys: Vec<String>,
    files: Vec<FileInfo>,
    issues: Vec<LoadIssue>,
    locales: Vec<String>,
    source_language: String,
    display_language: String,
    separator: String,
}

impl LocaleSnapshot {
    /// Empty snapshot, published before the first load.
    #[must_use]
    pub fn empty(settings: &LocaleSettings) -> Self {
        Self::build(std::iter::empty(), Vec::new(), settings)
    }

    /// Merges `files` (in the given order) into a new snapshot.
    ///
    /// Structural conflicts are appended to `issues`.
    #[must_use]
    pub fn build<'a>(
        files: impl IntoIterator<Item = &'a LocaleFile>,
        mut issues: Vec<LoadIssue>,
        settings: &LocaleSettings,
    ) -> Self {
        let separator = settings.key_separator.clone();
        let mut builder = TreeBuilder::new(separator.clone());
        let mut infos = Vec::new();

        for file in files {
            builder.extend(file.records());
            infos.push(FileInfo {
                path: file.path.clone(),
                locale: file.locale.clone(),
                style: file.style,
            });
        }

        let built = builder.finish();
        issues.extend(built.conflicts.into_iter().map(|conflict| LoadIssue::Conflict { conflict }));

        let keys = built.tree.flatten().keys().map(|key| (*key).to_string()).collect();
        let locales = configured_locales(settings, &infos);

        Self {
            tree: built.tree,
            keys,
            files: infos,
            issues,
            locales,
            source_language: settings.source_language.clone(),
            display_language: settings.display_language().to_string(),
            separator,
        }
    }

    /// Every key path with a record, in tree order.
    #[must_use]
    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    #[must_use]
    pub const fn locale_tree(&self) -> &LocaleTree {
        &self.tree
    }

    /// Key path → node, prefix trees omitted.
    #[must_use]
    pub fn flatten_locale_tree(&self) -> IndexMap<&str, &LocaleNode> {
        self.tree.flatten()
    }

    #[must_use]
    pub fn get_item(&self, keypath: &str) -> Option<&LocaleItem> {
        self.tree.get(keypath, &self.separator)
    }

    #[must_use]
    pub fn get_node(&self, keypath: &str) -> Option<&LocaleNode> {
        self.tree.get_node(keypath, &self.separator)
    }

    /// Value of `key` in `locale`.
    ///
    /// When the key has no value, up to `fallback_depth` trailing segments are
    /// removed one at a time and the shortened key is tried instead.
    #[must_use]
    pub fn get_value_by_key(&self, key: &str, locale: &str, fallback_depth: usize) -> Option<&str> {
        let mut current = key;
        for _ in 0..=fallback_depth {
            if current.is_empty() {
                return None;
            }
            let value = self
                .get_node(current)
                .and_then(|node| node.record(locale))
                .and_then(|record| record.value.as_deref());
            if value.is_some() {
                return value;
            }
            current = keypath::parent(current, &self.separator)?;
        }
        None
    }

    /// Placeholder records for every configured locale missing from `node`.
    #[must_use]
    pub fn get_shadow_locales(&self, node: &LocaleNode) -> Vec<LocaleRecord> {
        self.locales
            .iter()
            .filter(|locale| !node.locales.contains_key(locale.as_str()))
            .map(|locale| LocaleRecord::shadow(&node.keypath, locale, self.shadow_filepath(node, locale)))
            .collect()
    }

    /// Real records and shadows in configured-locale order, then any
    /// unconfigured locales that still have records.
    #[must_use]
    pub fn records_with_shadows<'a>(&self, node: &'a LocaleNode) -> Vec<Cow<'a, LocaleRecord>> {
        let mut records: Vec<Cow<'a, LocaleRecord>> = self
            .locales
            .iter()
            .map(|locale| {
                node.record(locale).map_or_else(
                    || {
                        Cow::Owned(LocaleRecord::shadow(
                            &node.keypath,
                            locale,
                            self.shadow_filepath(node, locale),
                        ))
                    },
                    Cow::Borrowed,
                )
            })
            .collect();

        records.extend(
            node.locales
                .values()
                .filter(|record| !self.locales.contains(&record.locale))
                .map(Cow::Borrowed),
        );
        records
    }

    /// Configured locales, source language first.
    #[must_use]
    pub fn locales(&self) -> &[String] {
        &self.locales
    }

    #[must_use]
    pub fn files(&self) -> &[FileInfo] {
        &self.files
    }

    #[must_use]
    pub fn file(&self, path: &Path) -> Option<&FileInfo> {
        self.files.iter().find(|file| file.path == path)
    }

    #[must_use]
    pub fn issues(&self) -> &[LoadIssue] {
        &self.issues
    }

    #[must_use]
    pub fn source_language(&self) -> &str {
        &self.source_language
    }

    #[must_use]
    pub fn display_language(&self) -> &str {
        &self.display_language
    }

    #[must_use]
    pub fn separator(&self) -> &str {
        &self.separator
    }

    /// File a missing translation would be written to. Files that failed to load are never chosen.
    fn shadow_filepath(&self, node: &LocaleNode, locale: &str) -> PathBuf {
        let substituted = node
            .locales
            .values()
            .filter_map(|sibling| replace_locale_in_path(&sibling.filepath, &sibling.locale, locale))
            .find(|path| !self.is_failed_file(path));

        if let Some(path) = &substituted
            && self.files.iter().any(|file| file.path == *path && file.locale == locale)
        {
            return path.clone();
        }

        if let Some(file) = self.files.iter().find(|file| file.locale == locale) {
            return file.path.clone();
        }

        substituted.unwrap_or_else(|| {
            let directory = node
                .locales
                .values()
                .next()
                .and_then(|record| record.filepath.parent())
                .map(Path::to_path_buf)
                .unwrap_or_default();
            directory.join(format!("{locale}.json"))
        })
    }

    fn is_failed_file(&self, path: &Path) -> bool {
        self.issues.iter().any(|issue| issue.path() == Some(path))
    }
}

/// Explicit `locales`, or the source language followed by detected locales in first-seen order.
fn configured_locales(settings: &LocaleSettings, files: &[FileInfo]) -> Vec<String> {
    if let Some(locales) = &settings.locales {
        let mut ordered = vec![settings.source_language.clone()];
        ordered.extend(locales.iter().filter(|l| **l != settings.source_language).cloned());
        return ordered;
    }

    let mut locales = vec![settings.source_language.clone()];
    for file in files {
        if !locales.contains(&file.locale) {
            locales.push(file.locale.clone());
        }
    }
    locales
}
