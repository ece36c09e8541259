//! Locale file discovery.

use std::path::PathBuf;

use ignore::WalkBuilder;

use crate::config::LocaleFileMatcher;

/// Walks the workspace and returns every locale file, sorted by path.
///
/// `.gitignore` rules are honored; hidden directories are searched.
#[must_use]
pub fn find_locale_files(matcher: &LocaleFileMatcher) -> Vec<PathBuf> {
    let workspace_root = matcher.workspace_root();
    let mut found_files = Vec::new();

    for result in WalkBuilder::new(workspace_root)
        .hidden(false)
        .git_ignore(true)
        .git_global(true)
        .git_exclude(true)
        .follow_links(false)
        .build()
    {
        let entry = match result {
            Ok(entry) => entry,
            Err(err) => {
                tracing::debug!(?err, "Failed to read directory entry");
                continue;
            }
        };

        if !entry.file_type().is_some_and(|ft| ft.is_file()) {
            continue;
        }

        let path = entry.path();
        let Ok(relative_path) = path.strip_prefix(workspace_root) else {
            continue;
        };
        if matcher.is_locale_file_relative(relative_path) {
            found_files.push(path.to_path_buf());
        }
    }

    found_files.sort();
    tracing::debug!(count = found_files.len(), root = %workspace_root.display(), "Discovered locale files");
    found_files
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::fs;

    use googletest::prelude::*;
    use rstest::rstest;
    use tempfile::TempDir;

    use super::*;
    use crate::config::LocaleSettings;

    #[rstest]
    fn finds_matching_files_sorted() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        for file in [
            "locales/fr.json",
            "locales/en.json",
            "src/i18n/ja/common.json",
            "node_modules/pkg/locales/en.json",
            "package.json",
        ] {
            let path = root.join(file);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, "{}").unwrap();
        }
        let matcher = LocaleFileMatcher::new(root.to_path_buf(), &LocaleSettings::default()).unwrap();

        let files = find_locale_files(&matcher);

        assert_that!(
            files,
            elements_are![
                eq(&root.join("locales/en.json")),
                eq(&root.join("locales/fr.json")),
                eq(&root.join("src/i18n/ja/common.json")),
            ]
        );
    }

    #[rstest]
    fn respects_gitignore() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::create_dir_all(root.join(".git")).unwrap();
        fs::write(root.join(".gitignore"), "build/\n").unwrap();
        for file in ["locales/en.json", "build/locales/en.json"] {
            let path = root.join(file);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, "{}").unwrap();
        }
        let matcher = LocaleFileMatcher::new(root.to_path_buf(), &LocaleSettings::default()).unwrap();

        let files = find_locale_files(&matcher);

        assert_that!(files, elements_are![eq(&root.join("locales/en.json"))]);
    }
}
