//! Merges locale records into a single [`LocaleTree`].
//!
//! Records are placed by key path. Intermediate segments become trees, the
//! last segment becomes a node holding one record per locale. When a path is
//! both a translation and a group of keys, the first-seen shape wins and the
//! later record is reported as a [`TreeConflict`].

use indexmap::map::Entry;
use serde::Serialize;
use thiserror::Error;

use super::types::{
    LocaleItem,
    LocaleNode,
    LocaleRecord,
    LocaleTree,
};
use crate::keypath;

/// A record that could not be placed in the tree.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum TreeConflict {
    /// `prefix` is already a translation, so `keypath` cannot live below it.
    #[error("'{keypath}' ({locale}) needs '{prefix}' to be a group of keys, but it is a translation")]
    LeafUsedAsContainer { keypath: String, locale: String, prefix: String },

    /// `keypath` is already a group of keys, so it cannot hold a translation.
    #[error("'{keypath}' ({locale}) is a translation, but it is already a group of keys")]
    ContainerUsedAsLeaf { keypath: String, locale: String },

    /// The key path has an empty segment.
    #[error("'{keypath}' ({locale}) is not a valid key path")]
    MalformedKey { keypath: String, locale: String },
}

impl TreeConflict {
    #[must_use]
    pub fn keypath(&self) -> &str {
        match self {
            Self::LeafUsedAsContainer { keypath, .. }
            | Self::ContainerUsedAsLeaf { keypath, .. }
            | Self::MalformedKey { keypath, .. } => keypath,
        }
    }
}

/// Result of merging a record set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuiltTree {
    pub tree: LocaleTree,
    pub conflicts: Vec<TreeConflict>,
}

/// Incremental tree builder.
#[derive(Debug, Clone)]
pub struct TreeBuilder {
    separator: String,
    root: LocaleTree,
    conflicts: Vec<TreeConflict>,
}

impl TreeBuilder {
    #[must_use]
    pub fn new(separator: impl Into<String>) -> Self {
        Self { separator: separator.into(), root: LocaleTree::root(), conflicts: Vec::new() }
    }

    /// Places one record. Conflicts are recorded and also returned.
    pub fn insert(&mut self, record: LocaleRecord) -> Result<(), TreeConflict> {
        let result = place(&mut self.root, record, &self.separator);
        if let Err(conflict) = &result {
            tracing::debug!(%conflict, "Structural conflict while merging locale records");
            self.conflicts.push(conflict.clone());
        }
        result
    }

    pub fn extend(&mut self, records: impl IntoIterator<Item = LocaleRecord>) {
        for record in records {
            // Recorded in `self.conflicts`.
            let _ = self.insert(record);
        }
    }

    #[must_use]
    pub fn finish(self) -> BuiltTree {
        BuiltTree { tree: self.root, conflicts: self.conflicts }
    }
}

/// Builds a tree from a record set in one go.
#[must_use]
pub fn build_locale_tree(
    records: impl IntoIterator<Item = LocaleRecord>,
    separator: &str,
) -> BuiltTree {
    let mut builder = TreeBuilder::new(separator);
    builder.extend(records);
    builder.finish()
}

fn place(root: &mut LocaleTree, record: LocaleRecord, separator: &str) -> Result<(), TreeConflict> {
    if !keypath::is_well_formed(&record.keypath, separator) {
        return Err(TreeConflict::MalformedKey {
            keypath: record.keypath,
            locale: record.locale,
        });
    }

    let segments: Vec<String> =
        keypath::split(&record.keypath, separator).into_iter().map(str::to_owned).collect();
    let Some((last, parents)) = segments.split_last() else {
        return Err(TreeConflict::MalformedKey { keypath: record.keypath, locale: record.locale });
    };

    let mut current = root;
    let mut prefix = String::new();
    for segment in parents {
        if !prefix.is_empty() {
            prefix.push_str(separator);
        }
        prefix.push_str(segment);

        let child = current
            .children
            .entry(segment.clone())
            .or_insert_with(|| LocaleItem::Tree(LocaleTree::new(prefix.clone(), segment.clone())));
        match child {
            LocaleItem::Tree(tree) => current = tree,
            LocaleItem::Node(_) => {
                return Err(TreeConflict::LeafUsedAsContainer {
                    keypath: record.keypath,
                    locale: record.locale,
                    prefix,
                });
            }
        }
    }

    match current.children.entry(last.clone()) {
        Entry::Vacant(entry) => {
            let mut node = LocaleNode::new(record.keypath.clone(), last.clone());
            node.locales.insert(record.locale.clone(), record);
            entry.insert(LocaleItem::Node(node));
            Ok(())
        }
        Entry::Occupied(entry) => match entry.into_mut() {
            LocaleItem::Node(node) => {
                if let Some(previous) = node.locales.get(&record.locale) {
                    tracing::debug!(
                        keypath = %record.keypath,
                        locale = %record.locale,
                        previous = %previous.filepath.display(),
                        replacement = %record.filepath.display(),
                        "Replacing record defined in another file"
                    );
                }
                node.locales.insert(record.locale.clone(), record);
                Ok(())
            }
            LocaleItem::Tree(_) => {
                Err(TreeConflict::ContainerUsedAsLeaf { keypath: record.keypath, locale: record.locale })
            }
        },
    }
}
