//! Tree view model over the locale tree.
//!
//! Items borrow from a [`LocaleSnapshot`], so a refresh is a matter of taking
//! a new snapshot and asking for the roots again.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;

use crate::loader::{
    LoaderEvent,
    LocaleLoader,
    LocaleSnapshot,
};
use crate::tree::Node;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Collapsible {
    None,
    Collapsed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum IconKind {
    /// A group of keys.
    Module,
    /// A translated key.
    String,
}

/// Display state of one tree row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeItem<'a> {
    pub node: Node<'a>,
    pub label: String,
    pub tooltip: String,
    pub description: String,
    pub collapsible: Collapsible,
    pub icon: Option<IconKind>,
    /// `tree`, `node`, `record`, or `record-source` for source-language records.
    pub context_value: String,
}

impl<'a> TreeItem<'a> {
    #[must_use]
    pub fn new(node: Node<'a>, snapshot: &LocaleSnapshot, flatten: bool) -> Self {
        let label = match &node {
            Node::Record(record) => record.locale.clone(),
            Node::Tree(tree) if !flatten => tree.keyname.clone(),
            Node::Node(leaf) if !flatten => leaf.keyname.clone(),
            Node::Tree(_) | Node::Node(_) => node.keypath().to_string(),
        };
        let description = match &node {
            Node::Tree(_) => String::new(),
            Node::Node(leaf) => leaf.value(snapshot.display_language()).to_string(),
            Node::Record(record) => {
                record.value.as_deref().filter(|v| !v.is_empty()).unwrap_or("(empty)").to_string()
            }
        };
        let (collapsible, icon) = match &node {
            Node::Tree(_) => (Collapsible::Collapsed, Some(IconKind::Module)),
            Node::Node(_) => (Collapsible::Collapsed, Some(IconKind::String)),
            Node::Record(_) => (Collapsible::None, None),
        };
        let context_value = match &node {
            Node::Record(record) if record.is_source(snapshot.source_language()) => {
                "record-source".to_string()
            }
            _ => node.kind().to_string(),
        };

        Self {
            tooltip: node.keypath().to_string(),
            label,
            description,
            collapsible,
            icon,
            context_value,
            node,
        }
    }
}

/// Supplies tree rows and refresh notifications for a locale tree view.
#[derive(Debug)]
pub struct LocalesTreeProvider {
    loader: Arc<LocaleLoader>,
    flatten: bool,
    /// Only nodes whose key path is a prefix of one of these are shown.
    include_paths: Option<Vec<String>>,
    events: broadcast::Receiver<LoaderEvent>,
    refresh_pending: bool,
}

impl LocalesTreeProvider {
    #[must_use]
    pub fn new(loader: Arc<LocaleLoader>, include_paths: Option<Vec<String>>, flatten: bool) -> Self {
        let events = loader.subscribe();
        Self { loader, flatten, include_paths, events, refresh_pending: false }
    }

    #[must_use]
    pub const fn flatten(&self) -> bool {
        self.flatten
    }

    /// Switches between the tree and the flat key list. Changing it requests a refresh.
    pub fn set_flatten(&mut self, flatten: bool) {
        if self.flatten != flatten {
            self.flatten = flatten;
            self.refresh_pending = true;
        }
    }

    /// Snapshot to read items from.
    #[must_use]
    pub fn snapshot(&self) -> Arc<LocaleSnapshot> {
        self.loader.snapshot()
    }

    #[must_use]
    pub fn roots<'a>(&self, snapshot: &'a LocaleSnapshot) -> Vec<TreeItem<'a>> {
        let nodes: Vec<Node<'a>> = if self.flatten {
            snapshot.flatten_locale_tree().into_values().map(Node::Node).collect()
        } else {
            snapshot.locale_tree().children.values().map(Node::from).collect()
        };
        self.items(nodes, snapshot)
    }

    #[must_use]
    pub fn children<'a>(&self, snapshot: &'a LocaleSnapshot, item: &TreeItem<'a>) -> Vec<TreeItem<'a>> {
        let nodes: Vec<Node<'a>> = match &item.node {
            Node::Tree(tree) => {
                let tree = *tree;
                tree.children.values().map(Node::from).collect()
            }
            Node::Node(node) => {
                snapshot.records_with_shadows(*node).into_iter().map(Node::Record).collect()
            }
            Node::Record(_) => Vec::new(),
        };
        self.items(nodes, snapshot)
    }

    /// Waits until the view should be redrawn. Returns `false` once the loader is gone.
    pub async fn next_refresh(&mut self) -> bool {
        if std::mem::take(&mut self.refresh_pending) {
            return true;
        }
        match self.events.recv().await {
            Ok(LoaderEvent::Changed) | Err(RecvError::Lagged(_)) => true,
            Err(RecvError::Closed) => false,
        }
    }

    fn items<'a>(&self, nodes: Vec<Node<'a>>, snapshot: &LocaleSnapshot) -> Vec<TreeItem<'a>> {
        nodes
            .into_iter()
            .filter(|node| self.is_included(node.keypath()))
            .map(|node| TreeItem::new(node, snapshot, self.flatten))
            .collect()
    }

    fn is_included(&self, keypath: &str) -> bool {
        self.include_paths
            .as_ref()
            .is_none_or(|paths| paths.iter().any(|path| path.starts_with(keypath)))
    }
}
