//! Format-preserving edits of locale JSON files.
//!
//! Every edit goes through the `jsonc-parser` CST, so text outside the edited
//! property is written back unchanged.

use jsonc_parser::ParseOptions;
use jsonc_parser::cst::{
    CstInputValue,
    CstObject,
    CstObjectProp,
    CstRootNode,
};
use thiserror::Error;

use super::locale_file::KeyStyle;

/// Errors editing a locale file.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EditError {
    #[error("Failed to parse locale file: {0}")]
    Parse(String),

    #[error("Root of the locale file is not an object")]
    RootNotAnObject,

    #[error("'{0}' is a translation and cannot contain other keys")]
    NotAnObject(String),

    #[error("Key '{0}' is not in the file")]
    KeyNotFound(String),
}

/// Result of a key deletion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyDeletion {
    pub new_text: String,
    pub deleted_keys: Vec<String>,
}

fn parse_root(json_text: &str) -> Result<(CstRootNode, CstObject), EditError> {
    // A missing file starts as an empty object.
    let text = if json_text.trim().is_empty() { "{}" } else { json_text };
    let root =
        CstRootNode::parse(text, &ParseOptions::default()).map_err(|e| EditError::Parse(e.to_string()))?;
    let root_obj = root.object_value().ok_or(EditError::RootNotAnObject)?;
    Ok((root, root_obj))
}

/// Sets `key` to `value`, updating it in place when present and inserting it otherwise.
///
/// # Errors
/// - The text is not JSON, or its root is not an object
/// - A parent of `key` is a translation
pub fn set_value(
    json_text: &str,
    key: &str,
    value: &str,
    separator: &str,
    style: KeyStyle,
) -> Result<String, EditError> {
    let (root, root_obj) = parse_root(json_text)?;
    let segments: Vec<&str> = key.split(separator).collect();

    if let Some(path) = find_property_path(&root_obj, &segments, separator)
        && let Some(prop) = path.last()
    {
        prop.set_value(CstInputValue::String(value.to_string()));
    } else {
        insert_value(&root_obj, &segments, value, separator, style)?;
    }

    Ok(root.to_string())
}

fn insert_value(
    root_obj: &CstObject,
    segments: &[&str],
    value: &str,
    separator: &str,
    style: KeyStyle,
) -> Result<(), EditError> {
    let Some((last, parents)) = segments.split_last() else {
        return Ok(());
    };

    // Start below the deepest group that already exists, whatever its layout.
    let mut current_obj = root_obj.clone();
    let mut remaining = parents;
    for depth in (1..=parents.len()).rev() {
        let (existing, rest) = parents.split_at(depth);
        if let Some(prop) = find_property_path(root_obj, existing, separator).and_then(|path| path.into_iter().last())
        {
            let Some(obj) = prop.value().and_then(|v| v.as_object()) else {
                return Err(EditError::NotAnObject(existing.join(separator)));
            };
            current_obj = obj;
            remaining = rest;
            break;
        }
    }

    if style == KeyStyle::Flat {
        let mut flat_key: Vec<&str> = remaining.to_vec();
        flat_key.push(last);
        current_obj.append(&flat_key.join(separator), CstInputValue::String(value.to_string()));
        return Ok(());
    }

    for part in remaining {
        current_obj = current_obj.object_value_or_set(part);
    }
    current_obj.append(last, CstInputValue::String(value.to_string()));

    Ok(())
}

/// Delete keys, removing parent objects the deletion leaves empty.
///
/// # Errors
/// The text is not JSON, or its root is not an object.
pub fn delete_keys(
    json_text: &str,
    keys_to_delete: &[String],
    separator: &str,
) -> Result<KeyDeletion, EditError> {
    let (root, root_obj) = parse_root(json_text)?;

    let deleted_keys: Vec<String> = keys_to_delete
        .iter()
        .filter(|key| delete_single_key(&root_obj, key, separator))
        .cloned()
        .collect();

    Ok(KeyDeletion { new_text: root.to_string(), deleted_keys })
}

/// Moves the value of `old_key` to `new_key`.
///
/// # Errors
/// - The text is not JSON, or its root is not an object
/// - `old_key` is not in the file
/// - A parent of `new_key` is a translation
pub fn rename_key(
    json_text: &str,
    old_key: &str,
    new_key: &str,
    value: &str,
    separator: &str,
    style: KeyStyle,
) -> Result<String, EditError> {
    let deletion = delete_keys(json_text, &[old_key.to_string()], separator)?;
    if deletion.deleted_keys.is_empty() {
        return Err(EditError::KeyNotFound(old_key.to_string()));
    }
    set_value(&deletion.new_text, new_key, value, separator, style)
}

fn delete_single_key(root_obj: &CstObject, key: &str, separator: &str) -> bool {
    let segments: Vec<&str> = key.split(separator).collect();
    let Some(path) = find_property_path(root_obj, &segments, separator) else {
        return false;
    };
    let Some((leaf, ancestors)) = path.split_last() else {
        return false;
    };

    leaf.clone().remove();
    for prop in ancestors.iter().rev() {
        let emptied = prop.value().and_then(|v| v.as_object()).is_some_and(|obj| obj.properties().is_empty());
        if !emptied {
            break;
        }
        prop.clone().remove();
    }
    true
}

/// Properties from the root down to the one holding `segments`.
///
/// A property name may span several segments (`{"a.b": {"c": ..}}`); longer
/// names are tried first.
fn find_property_path(obj: &CstObject, segments: &[&str], separator: &str) -> Option<Vec<CstObjectProp>> {
    for len in (1..=segments.len()).rev() {
        let (head, rest) = segments.split_at(len);
        let Some(prop) = obj.get(&head.join(separator)) else {
            continue;
        };
        if rest.is_empty() {
            return Some(vec![prop]);
        }
        if let Some(child) = prop.value().and_then(|v| v.as_object())
            && let Some(mut path) = find_property_path(&child, rest, separator)
        {
            path.insert(0, prop);
            return Some(path);
        }
    }
    None
}
