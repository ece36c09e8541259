//! Consumers of the loader API: tree view model, key completion, and key commands.

pub mod commands;
pub mod completion;
pub mod tree_view;

pub use commands::{
    copy_key_snippet,
    edit_key,
    translate_key,
};
pub use completion::{
    KeyCompletion,
    key_completions,
};
pub use tree_view::{
    Collapsible,
    IconKind,
    LocalesTreeProvider,
    TreeItem,
};
