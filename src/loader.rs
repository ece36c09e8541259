//! The locale loader: owns the record set and publishes immutable snapshots of it.
//!
//! Readers take an `Arc<LocaleSnapshot>` and never block on writers. Every
//! mutation goes through [`LocaleLoader`], which rebuilds the tree, swaps the
//! snapshot in, then fires [`LoaderEvent::Changed`].

mod discovery;
mod error;
mod locale_loader;
mod snapshot;
mod translate;
mod trigger;
mod write_queue;

pub use discovery::find_locale_files;
pub use error::{
    LoadIssue,
    LoadReport,
    LoaderError,
};
pub use locale_loader::{
    LoaderEvent,
    LoaderState,
    LocaleLoader,
};
pub use snapshot::{
    FileInfo,
    LocaleSnapshot,
};
pub use translate::{
    TranslateError,
    Translator,
};
pub use trigger::{
    LoaderTrigger,
    spawn_trigger_loop,
};
pub use write_queue::WriteQueue;
