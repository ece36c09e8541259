//! Locale tree data model.

use std::borrow::Cow;
use std::fmt;
use std::path::{
    Path,
    PathBuf,
};

use indexmap::IndexMap;
use serde::Serialize;

use crate::keypath;
use crate::types::SourceRange;

/// One key's value in one locale.
///
/// Identified by `(keypath, locale)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LocaleRecord {
    pub keypath: String,
    pub locale: String,
    /// `None` for shadow records (missing translations).
    pub value: Option<String>,
    pub filepath: PathBuf,
    /// Location of the value inside `filepath`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub range: Option<SourceRange>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub shadow: bool,
}

impl LocaleRecord {
    #[must_use]
    pub fn new(
        keypath: impl Into<String>,
        locale: impl Into<String>,
        value: impl Into<String>,
        filepath: impl Into<PathBuf>,
    ) -> Self {
        Self {
            keypath: keypath.into(),
            locale: locale.into(),
            value: Some(value.into()),
            filepath: filepath.into(),
            range: None,
            shadow: false,
        }
    }

    /// Placeholder for a locale that has no translation at `keypath`.
    #[must_use]
    pub fn shadow(
        keypath: impl Into<String>,
        locale: impl Into<String>,
        filepath: impl Into<PathBuf>,
    ) -> Self {
        Self {
            keypath: keypath.into(),
            locale: locale.into(),
            value: None,
            filepath: filepath.into(),
            range: None,
            shadow: true,
        }
    }

    #[must_use]
    pub fn with_range(mut self, range: Option<SourceRange>) -> Self {
        self.range = range;
        self
    }

    /// Copy of this record carrying a new value, ready to be written.
    #[must_use]
    pub fn with_value(&self, value: impl Into<String>) -> Self {
        Self {
            keypath: self.keypath.clone(),
            locale: self.locale.clone(),
            value: Some(value.into()),
            filepath: self.filepath.clone(),
            range: None,
            shadow: false,
        }
    }

    #[must_use]
    pub fn is_source(&self, source_language: &str) -> bool {
        self.locale == source_language
    }

    #[must_use]
    pub fn value_or_empty(&self) -> &str {
        self.value.as_deref().unwrap_or_default()
    }
}

/// A key path that has at least one record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LocaleNode {
    pub keypath: String,
    pub keyname: String,
    /// Locale → record. A locale without an entry is missing a translation.
    pub locales: IndexMap<String, LocaleRecord>,
}

impl LocaleNode {
    #[must_use]
    pub fn new(keypath: impl Into<String>, keyname: impl Into<String>) -> Self {
        Self { keypath: keypath.into(), keyname: keyname.into(), locales: IndexMap::new() }
    }

    #[must_use]
    pub fn record(&self, locale: &str) -> Option<&LocaleRecord> {
        self.locales.get(locale)
    }

    /// Display value: the record value in `display_language`, or empty.
    #[must_use]
    pub fn value(&self, display_language: &str) -> &str {
        self.record(display_language).map_or("", LocaleRecord::value_or_empty)
    }
}

/// A key path prefix grouping child keys.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct LocaleTree {
    pub keypath: String,
    pub keyname: String,
    /// Keyname → child, in first-seen order.
    pub children: IndexMap<String, LocaleItem>,
}

impl LocaleTree {
    #[must_use]
    pub fn new(keypath: impl Into<String>, keyname: impl Into<String>) -> Self {
        Self { keypath: keypath.into(), keyname: keyname.into(), children: IndexMap::new() }
    }

    /// The root tree, with an empty key path.
    #[must_use]
    pub fn root() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Walks the children by key path segments.
    #[must_use]
    pub fn get(&self, keypath: &str, separator: &str) -> Option<&LocaleItem> {
        let mut segments = keypath::split(keypath, separator).into_iter();
        let mut item = self.children.get(segments.next()?)?;
        for segment in segments {
            let LocaleItem::Tree(tree) = item else {
                return None;
            };
            item = tree.children.get(segment)?;
        }
        Some(item)
    }

    #[must_use]
    pub fn get_node(&self, keypath: &str, separator: &str) -> Option<&LocaleNode> {
        match self.get(keypath, separator)? {
            LocaleItem::Node(node) => Some(node),
            LocaleItem::Tree(_) => None,
        }
    }

    /// Every node under this tree keyed by full key path, prefix trees omitted.
    #[must_use]
    pub fn flatten(&self) -> IndexMap<&str, &LocaleNode> {
        let mut flat = IndexMap::new();
        collect_nodes(self, &mut flat);
        flat
    }
}

fn collect_nodes<'a>(tree: &'a LocaleTree, flat: &mut IndexMap<&'a str, &'a LocaleNode>) {
    for child in tree.children.values() {
        match child {
            LocaleItem::Tree(subtree) => collect_nodes(subtree, flat),
            LocaleItem::Node(node) => {
                flat.insert(node.keypath.as_str(), node);
            }
        }
    }
}

/// A child of a [`LocaleTree`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum LocaleItem {
    Tree(LocaleTree),
    Node(LocaleNode),
}

impl LocaleItem {
    #[must_use]
    pub fn keypath(&self) -> &str {
        match self {
            Self::Tree(tree) => &tree.keypath,
            Self::Node(node) => &node.keypath,
        }
    }

    #[must_use]
    pub fn keyname(&self) -> &str {
        match self {
            Self::Tree(tree) => &tree.keyname,
            Self::Node(node) => &node.keyname,
        }
    }

    #[must_use]
    pub const fn kind(&self) -> NodeKind {
        match self {
            Self::Tree(_) => NodeKind::Tree,
            Self::Node(_) => NodeKind::Node,
        }
    }
}

/// Discriminant of [`Node`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Tree,
    Node,
    Record,
}

impl NodeKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Tree => "tree",
            Self::Node => "node",
            Self::Record => "record",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Any element a consumer can walk: a prefix tree, a key node, or a record.
///
/// Records are borrowed when they come from the tree and owned when they are shadows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node<'a> {
    Tree(&'a LocaleTree),
    Node(&'a LocaleNode),
    Record(Cow<'a, LocaleRecord>),
}

impl Node<'_> {
    #[must_use]
    pub const fn kind(&self) -> NodeKind {
        match self {
            Self::Tree(_) => NodeKind::Tree,
            Self::Node(_) => NodeKind::Node,
            Self::Record(_) => NodeKind::Record,
        }
    }

    #[must_use]
    pub fn keypath(&self) -> &str {
        match self {
            Self::Tree(tree) => &tree.keypath,
            Self::Node(node) => &node.keypath,
            Self::Record(record) => &record.keypath,
        }
    }

    /// Source file of a record; trees and nodes span several files.
    #[must_use]
    pub fn filepath(&self) -> Option<&Path> {
        match self {
            Self::Record(record) => Some(&record.filepath),
            Self::Tree(_) | Self::Node(_) => None,
        }
    }
}

impl<'a> From<&'a LocaleItem> for Node<'a> {
    fn from(item: &'a LocaleItem) -> Self {
        match item {
            LocaleItem::Tree(tree) => Self::Tree(tree),
            LocaleItem::Node(node) => Self::Node(node),
        }
    }
}

impl<'a> From<&'a LocaleRecord> for Node<'a> {
    fn from(record: &'a LocaleRecord) -> Self {
        Self::Record(Cow::Borrowed(record))
    }
}

impl From<LocaleRecord> for Node<'_> {
    fn from(record: LocaleRecord) -> Self {
        Self::Record(Cow::Owned(record))
    }
}
