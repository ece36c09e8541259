//! locale-tree
//!
//! プロジェクトのロケールファイルを読み込み、フラットなキー一覧とキーツリーとして
//! 同期的に保持するライブラリ

pub mod config;
pub mod input;
pub mod keypath;
pub mod loader;
pub mod tree;
pub mod types;
pub mod view;

pub use loader::{
    LocaleLoader,
    LocaleSnapshot,
};
