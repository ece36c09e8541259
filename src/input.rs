//! Locale source files: parsing, locale detection and format-preserving edits.

pub mod json_edit;
pub mod locale_file;

pub use json_edit::{
    EditError,
    KeyDeletion,
};
pub use locale_file::{
    KeyStyle,
    LocaleFile,
    SourceError,
    detect_locale_from_path,
    flatten_json,
    read_locale_file,
    replace_locale_in_path,
};
