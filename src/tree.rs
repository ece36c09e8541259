//! Locale tree: the hierarchical view over all locale records.

pub mod builder;
pub mod types;

pub use builder::{
    BuiltTree,
    TreeBuilder,
    TreeConflict,
    build_locale_tree,
};
pub use types::{
    LocaleItem,
    LocaleNode,
    LocaleRecord,
    LocaleTree,
    Node,
    NodeKind,
};
