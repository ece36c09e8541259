//! Locale loader: loading, editing and publishing of the locale tree.

use std::collections::{
    BTreeMap,
    HashMap,
};
use std::io::ErrorKind;
use std::path::{
    Path,
    PathBuf,
};
use std::sync::{
    Arc,
    Mutex,
    PoisonError,
    RwLock,
};

use futures::StreamExt;
use tokio::sync::{
    Mutex as AsyncMutex,
    OwnedMutexGuard,
    broadcast,
};

use super::discovery::find_locale_files;
use super::error::{
    LoadIssue,
    LoadReport,
    LoaderError,
};
use super::snapshot::LocaleSnapshot;
use super::translate::{
    TranslateError,
    Translator,
};
use super::trigger::LoaderTrigger;
use super::write_queue::WriteQueue;
use crate::config::{
    ConfigError,
    LocaleFileMatcher,
    LocaleSettings,
};
use crate::input::{
    EditError,
    KeyStyle,
    LocaleFile,
    SourceError,
    detect_locale_from_path,
    json_edit,
    read_locale_file,
};
use crate::keypath;
use crate::tree::{
    LocaleItem,
    LocaleRecord,
    TreeConflict,
};

/// Capacity of the change event channel. Slow subscribers see `Lagged` and re-read.
const EVENT_CAPACITY: usize = 64;

/// Lifecycle of a loader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoaderState {
    #[default]
    Uninitialized,
    Loading,
    Ready,
    /// The last cycle could not read or parse at least one file.
    /// The snapshot of the remaining files is still published.
    Error,
}

/// Notification sent after a mutation is on disk and its snapshot is published.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoaderEvent {
    Changed,
}

/// Parsed files and per-file failures, keyed by path.
#[derive(Debug, Default)]
struct LoadedFiles {
    files: BTreeMap<PathBuf, LocaleFile>,
    failures: BTreeMap<PathBuf, LoadIssue>,
    /// Counter of single-file changes (writes, reloads, removals).
    commits: u64,
    /// Path → value of `commits` at its last single-file change.
    changed: BTreeMap<PathBuf, u64>,
}

impl LoadedFiles {
    fn insert(&mut self, file: LocaleFile) {
        self.failures.remove(&file.path);
        self.files.insert(file.path.clone(), file);
    }

    fn fail(&mut self, error: &SourceError) {
        let path = error.path().to_path_buf();
        self.files.remove(&path);
        self.failures.insert(path, LoadIssue::from_source_error(error));
    }

    fn remove(&mut self, path: &Path) -> bool {
        let had_file = self.files.remove(path).is_some();
        let had_failure = self.failures.remove(path).is_some();
        had_file || had_failure
    }

    fn mark_changed(&mut self, path: &Path) {
        self.commits += 1;
        self.changed.insert(path.to_path_buf(), self.commits);
    }

    /// Takes the state of every path `current` changed after commit `since`.
    fn carry_over(&mut self, current: &Self, since: u64) {
        for path in current.changed.iter().filter(|(_, commit)| **commit > since).map(|(path, _)| path) {
            self.remove(path);
            if let Some(file) = current.files.get(path) {
                self.files.insert(path.clone(), file.clone());
            }
            if let Some(issue) = current.failures.get(path) {
                self.failures.insert(path.clone(), issue.clone());
            }
        }
        self.commits = current.commits;
        self.changed.clone_from(&current.changed);
    }

    /// Records of `keypath` in every file that defines it, in path order.
    fn key_targets(&self, keypath: &str) -> Vec<LocaleRecord> {
        self.files
            .values()
            .filter_map(|file| {
                file.value(keypath)
                    .map(|value| LocaleRecord::new(keypath, file.locale.clone(), value, file.path.clone()))
            })
            .collect()
    }
}

/// Owner of the locale record set.
///
/// # Lock order
///
/// 1. `write_queue` (per-file, sorted by path when several are held)
/// 2. `files`
/// 3. `snapshot` / `state` / `generations` (held briefly, never across `.await`)
pub struct LocaleLoader {
    settings: LocaleSettings,
    matcher: LocaleFileMatcher,
    files: AsyncMutex<LoadedFiles>,
    snapshot: RwLock<Arc<LocaleSnapshot>>,
    state: RwLock<LoaderState>,
    /// `(keypath, locale)` → number of edits applied by this loader.
    generations: Mutex<HashMap<(String, String), u64>>,
    write_queue: WriteQueue,
    events: broadcast::Sender<LoaderEvent>,
}

impl std::fmt::Debug for LocaleLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocaleLoader")
            .field("workspace_root", &self.matcher.workspace_root())
            .field("state", &self.state())
            .field("keys", &self.snapshot().keys().len())
            .finish_non_exhaustive()
    }
}

impl LocaleLoader {
    /// Creates a loader for `workspace_root`. Nothing is read until [`Self::load`].
    ///
    /// # Errors
    /// Returns an error if `settings` does not validate.
    pub fn new(settings: LocaleSettings, workspace_root: PathBuf) -> Result<Self, LoaderError> {
        settings.validate().map_err(ConfigError::ValidationErrors)?;
        let matcher = LocaleFileMatcher::new(workspace_root, &settings)?;
        let snapshot = Arc::new(LocaleSnapshot::empty(&settings));
        let (events, _) = broadcast::channel(EVENT_CAPACITY);

        Ok(Self {
            settings,
            matcher,
            files: AsyncMutex::new(LoadedFiles::default()),
            snapshot: RwLock::new(snapshot),
            state: RwLock::new(LoaderState::Uninitialized),
            generations: Mutex::new(HashMap::new()),
            write_queue: WriteQueue::new(),
            events,
        })
    }

    #[must_use]
    pub const fn settings(&self) -> &LocaleSettings {
        &self.settings
    }

    #[must_use]
    pub const fn matcher(&self) -> &LocaleFileMatcher {
        &self.matcher
    }

    /// The last published snapshot.
    #[must_use]
    pub fn snapshot(&self) -> Arc<LocaleSnapshot> {
        let snapshot = self.snapshot.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&*snapshot)
    }

    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        self.snapshot().keys().to_vec()
    }

    #[must_use]
    pub fn state(&self) -> LoaderState {
        *self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Subscribes to change events. Dropping the receiver unsubscribes.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<LoaderEvent> {
        self.events.subscribe()
    }

    /// Discovers and reads every locale file, replacing the current record set.
    ///
    /// Files written or reloaded while the load is reading keep their newer state.
    pub async fn load(&self) -> LoadReport {
        self.set_state(LoaderState::Loading);
        let started = self.files.lock().await.commits;

        let paths = find_locale_files(&self.matcher);
        let concurrency = self.settings.loading.effective_concurrency();
        tracing::debug!(count = paths.len(), concurrency, "Reading locale files");

        let results: Vec<_> = futures::stream::iter(paths)
            .map(|path| self.read_file(path))
            .buffer_unordered(concurrency)
            .collect()
            .await;

        let mut loaded = LoadedFiles::default();
        for result in results {
            match result {
                Ok(Some(file)) => loaded.insert(file),
                Ok(None) => {}
                Err(error) => {
                    tracing::warn!(%error, "Skipping locale file");
                    loaded.fail(&error);
                }
            }
        }

        let mut files = self.files.lock().await;
        loaded.carry_over(&files, started);
        *files = loaded;

        let report = self.publish(&files, &[]);
        tracing::info!(
            files = report.files,
            issues = report.issues.len(),
            keys = self.snapshot().keys().len(),
            "Locale files loaded"
        );
        report
    }

    /// Same as [`Self::load`].
    pub async fn reload(&self) -> LoadReport {
        self.load().await
    }

    /// Re-reads one file. A file that no longer exists is removed.
    pub async fn reload_file(&self, path: &Path) -> LoadReport {
        let _guard = self.write_queue.acquire(path).await;
        self.set_state(LoaderState::Loading);

        let result = self.read_file(path.to_path_buf()).await;

        let mut files = self.files.lock().await;
        match result {
            Ok(Some(file)) => {
                tracing::debug!(path = %path.display(), "Reloaded locale file");
                files.insert(file);
            }
            Ok(None) => {
                files.remove(path);
            }
            Err(SourceError::Read { source, .. }) if source.kind() == ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "Locale file is gone");
                files.remove(path);
            }
            Err(error) => {
                tracing::warn!(%error, "Skipping locale file");
                files.fail(&error);
            }
        }
        files.mark_changed(path);

        self.publish(&files, &[])
    }

    /// Drops every record of `path`.
    pub async fn remove_file(&self, path: &Path) -> LoadReport {
        let _guard = self.write_queue.acquire(path).await;
        self.set_state(LoaderState::Loading);

        let mut files = self.files.lock().await;
        if files.remove(path) {
            tracing::debug!(path = %path.display(), "Removed locale file");
        }
        files.mark_changed(path);
        self.publish(&files, &[])
    }

    /// Applies one trigger message.
    pub async fn handle_trigger(&self, trigger: LoaderTrigger) -> LoadReport {
        match trigger {
            LoaderTrigger::FileChanged(path) => {
                if self.matcher.is_locale_file(&path) {
                    self.reload_file(&path).await
                } else {
                    tracing::debug!(path = %path.display(), "Ignoring change to non-locale file");
                    self.current_report()
                }
            }
            LoaderTrigger::FileRemoved(path) => self.remove_file(&path).await,
            LoaderTrigger::ReloadAll => self.reload().await,
        }
    }

    /// Persists the value of `record` to `record.filepath`, creating the file
    /// or the key's parent objects when needed.
    ///
    /// Writes to the same file are applied in the order they were called.
    ///
    /// # Errors
    /// - The record has no value, or its key is an array element or malformed
    /// - The key would turn a translation into a group of keys or vice versa
    /// - The file cannot be read, edited, or written
    pub async fn write_to_file(&self, record: &LocaleRecord) -> Result<(), LoaderError> {
        let value = record.value.as_deref().ok_or_else(|| LoaderError::MissingValue {
            keypath: record.keypath.clone(),
            locale: record.locale.clone(),
        })?;
        self.check_writable_key(&record.keypath, &record.locale)?;

        let _guard = self.write_queue.acquire(&record.filepath).await;
        self.check_structure(&record.keypath, &record.locale)?;

        let text = read_existing(&record.filepath).await?;
        let style = self.file_style(&record.filepath, &record.locale).await;
        let new_text =
            json_edit::set_value(&text, &record.keypath, value, &self.settings.key_separator, style)
                .map_err(|source| LoaderError::Edit { path: record.filepath.clone(), source })?;

        let file = self.write_file(&record.filepath, &record.locale, new_text).await?;
        self.commit(vec![file], &[(record.keypath.as_str(), record.locale.as_str())]).await;

        tracing::debug!(
            keypath = %record.keypath,
            locale = %record.locale,
            path = %record.filepath.display(),
            "Wrote translation"
        );
        Ok(())
    }

    /// Removes `keypath` from every file that defines it.
    ///
    /// # Errors
    /// - No record exists for `keypath`, or a file no longer holds it on disk
    /// - A file cannot be read, edited, or written. Files already written stay published.
    pub async fn delete_key(&self, keypath: &str) -> Result<(), LoaderError> {
        let (targets, _guards) = self.lock_key_targets(keypath).await?;

        let keys = [keypath.to_string()];
        let mut written = Vec::new();
        let mut touched = Vec::new();
        let mut failure = None;
        for record in &targets {
            let result = async {
                let text = read_existing(&record.filepath).await?;
                let deletion = json_edit::delete_keys(&text, &keys, &self.settings.key_separator)
                    .map_err(|source| LoaderError::Edit { path: record.filepath.clone(), source })?;
                if deletion.deleted_keys.is_empty() {
                    return Err(LoaderError::Edit {
                        path: record.filepath.clone(),
                        source: EditError::KeyNotFound(keypath.to_string()),
                    });
                }
                self.write_file(&record.filepath, &record.locale, deletion.new_text).await
            }
            .await;

            match result {
                Ok(file) => {
                    written.push(file);
                    touched.push((keypath, record.locale.as_str()));
                }
                Err(error) => {
                    failure = Some(error);
                    break;
                }
            }
        }

        self.commit(written, &touched).await;
        match failure {
            Some(error) => {
                tracing::error!(%error, keypath, "Failed to delete key");
                Err(error)
            }
            None => {
                tracing::debug!(keypath, files = targets.len(), "Deleted key");
                Ok(())
            }
        }
    }

    /// Renames `old_keypath` to `new_keypath` in every file that defines it.
    ///
    /// # Errors
    /// - No record exists for `old_keypath`, or `new_keypath` already exists
    /// - `new_keypath` is an array element, malformed, or conflicts with an existing translation
    /// - A file cannot be read, edited, or written. Files already written stay published.
    pub async fn rename_key(&self, old_keypath: &str, new_keypath: &str) -> Result<(), LoaderError> {
        self.check_writable_key(new_keypath, &self.settings.source_language)?;

        let (targets, _guards) = self.lock_key_targets(old_keypath).await?;
        let snapshot = self.snapshot();
        if snapshot.get_item(new_keypath).is_some() {
            return Err(LoaderError::KeyExists(new_keypath.to_string()));
        }
        // The old key is removed first, so it may not be a prefix of the new one.
        if keypath::is_child_key(new_keypath, old_keypath, &self.settings.key_separator) {
            return Err(TreeConflict::LeafUsedAsContainer {
                keypath: new_keypath.to_string(),
                locale: snapshot.source_language().to_string(),
                prefix: old_keypath.to_string(),
            }
            .into());
        }
        for record in &targets {
            self.check_structure(new_keypath, &record.locale)?;
        }

        let mut written = Vec::new();
        let mut touched = Vec::new();
        let mut failure = None;
        for record in &targets {
            let result = async {
                let text = read_existing(&record.filepath).await?;
                let style = self.file_style(&record.filepath, &record.locale).await;
                let new_text = json_edit::rename_key(
                    &text,
                    old_keypath,
                    new_keypath,
                    record.value_or_empty(),
                    &self.settings.key_separator,
                    style,
                )
                .map_err(|source| LoaderError::Edit { path: record.filepath.clone(), source })?;
                self.write_file(&record.filepath, &record.locale, new_text).await
            }
            .await;

            match result {
                Ok(file) => {
                    written.push(file);
                    touched.push((old_keypath, record.locale.as_str()));
                    touched.push((new_keypath, record.locale.as_str()));
                }
                Err(error) => {
                    failure = Some(error);
                    break;
                }
            }
        }

        self.commit(written, &touched).await;
        match failure {
            Some(error) => {
                tracing::error!(%error, old_keypath, new_keypath, "Failed to rename key");
                Err(error)
            }
            None => {
                tracing::debug!(old_keypath, new_keypath, files = targets.len(), "Renamed key");
                Ok(())
            }
        }
    }

    /// Asks `translator` for a value of `record` translated from the source language.
    ///
    /// Nothing is written; persist the returned record with [`Self::write_to_file`].
    /// Returns `Ok(None)` when the record was edited while the request was in
    /// flight. Dropping the future abandons the request.
    ///
    /// # Errors
    /// - `record` is in the source language, or the key has no source text
    /// - The translator failed
    pub async fn machine_translate_record<T: Translator>(
        &self,
        record: &LocaleRecord,
        translator: &T,
    ) -> Result<Option<LocaleRecord>, LoaderError> {
        let source_language = self.settings.source_language.as_str();
        if record.locale == source_language {
            return Err(TranslateError::SourceLanguage(record.locale.clone()).into());
        }

        let snapshot = self.snapshot();
        let node = snapshot.get_node(&record.keypath);
        let source_text = node
            .and_then(|node| node.record(source_language))
            .and_then(|source| source.value.clone())
            .filter(|text| !text.is_empty())
            .ok_or_else(|| TranslateError::MissingSourceText {
                keypath: record.keypath.clone(),
                locale: source_language.to_string(),
            })?;
        let value_before = node.and_then(|node| node.record(&record.locale)).and_then(|r| r.value.clone());
        let generation = self.generation(&record.keypath, &record.locale);

        let translated = match translator.translate(&source_text, source_language, &record.locale).await {
            Ok(translated) => translated,
            Err(error) => {
                tracing::error!(%error, keypath = %record.keypath, locale = %record.locale, "Machine translation failed");
                return Err(error.into());
            }
        };

        let current = self.snapshot();
        let value_now = current
            .get_node(&record.keypath)
            .and_then(|node| node.record(&record.locale))
            .and_then(|r| r.value.clone());
        if self.generation(&record.keypath, &record.locale) != generation || value_now != value_before {
            tracing::info!(
                keypath = %record.keypath,
                locale = %record.locale,
                "Discarding translation of a record edited in the meantime"
            );
            return Ok(None);
        }

        Ok(Some(record.with_value(translated)))
    }

    fn set_state(&self, state: LoaderState) {
        *self.state.write().unwrap_or_else(PoisonError::into_inner) = state;
    }

    fn generation(&self, keypath: &str, locale: &str) -> u64 {
        let generations = self.generations.lock().unwrap_or_else(PoisonError::into_inner);
        generations.get(&(keypath.to_string(), locale.to_string())).copied().unwrap_or_default()
    }

    fn current_report(&self) -> LoadReport {
        let snapshot = self.snapshot();
        LoadReport { files: snapshot.files().len(), issues: snapshot.issues().to_vec() }
    }

    /// Reads one file. `Ok(None)` when its locale cannot be detected.
    async fn read_file(&self, path: PathBuf) -> Result<Option<LocaleFile>, SourceError> {
        let Some(locale) = detect_locale_from_path(&path, self.settings.locales.as_deref()) else {
            tracing::debug!(path = %path.display(), "No locale in path, skipping");
            return Ok(None);
        };
        read_locale_file(&path, &locale, &self.settings.key_separator).await.map(Some)
    }

    /// Rebuilds from `files`, publishes, and notifies. Called with `files` locked.
    fn publish(&self, files: &LoadedFiles, touched: &[(&str, &str)]) -> LoadReport {
        let snapshot = LocaleSnapshot::build(
            files.files.values(),
            files.failures.values().cloned().collect(),
            &self.settings,
        );
        let report = LoadReport { files: files.files.len(), issues: snapshot.issues().to_vec() };

        {
            let mut generations = self.generations.lock().unwrap_or_else(PoisonError::into_inner);
            for (keypath, locale) in touched {
                *generations.entry(((*keypath).to_string(), (*locale).to_string())).or_default() += 1;
            }
        }

        *self.snapshot.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(snapshot);
        self.set_state(if files.failures.is_empty() { LoaderState::Ready } else { LoaderState::Error });

        // No receivers is not an error.
        let _ = self.events.send(LoaderEvent::Changed);
        report
    }

    /// Merges freshly written files and publishes. A no-op when nothing was written.
    async fn commit(&self, written: Vec<LocaleFile>, touched: &[(&str, &str)]) {
        if written.is_empty() {
            return;
        }
        self.set_state(LoaderState::Loading);
        let mut files = self.files.lock().await;
        for file in written {
            files.mark_changed(&file.path);
            files.insert(file);
        }
        self.publish(&files, touched);
    }

    /// Parses `text` and, if it parses, writes it. Parent directories are created as needed.
    async fn write_file(&self, path: &Path, locale: &str, text: String) -> Result<LocaleFile, LoaderError> {
        let file = LocaleFile::parse(path, locale, text, &self.settings.key_separator)?;

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| LoaderError::Write { path: path.to_path_buf(), source })?;
        }
        tokio::fs::write(path, &file.text)
            .await
            .map_err(|source| LoaderError::Write { path: path.to_path_buf(), source })?;

        Ok(file)
    }

    /// Key style of a loaded file; new files follow another file of the same locale.
    async fn file_style(&self, path: &Path, locale: &str) -> KeyStyle {
        let files = self.files.lock().await;
        files
            .files
            .get(path)
            .or_else(|| files.files.values().find(|file| file.locale == locale))
            .map(|file| file.style)
            .unwrap_or_default()
    }

    fn check_writable_key(&self, keypath: &str, locale: &str) -> Result<(), LoaderError> {
        if keypath::is_array_key(keypath) {
            return Err(LoaderError::UnsupportedKey(keypath.to_string()));
        }
        if !keypath::is_well_formed(keypath, &self.settings.key_separator) {
            return Err(TreeConflict::MalformedKey {
                keypath: keypath.to_string(),
                locale: locale.to_string(),
            }
            .into());
        }
        Ok(())
    }

    /// Rejects writes that would make a key both a translation and a group.
    fn check_structure(&self, keypath: &str, locale: &str) -> Result<(), LoaderError> {
        let snapshot = self.snapshot();
        let separator = &self.settings.key_separator;

        if let Some(LocaleItem::Tree(_)) = snapshot.get_item(keypath) {
            return Err(TreeConflict::ContainerUsedAsLeaf {
                keypath: keypath.to_string(),
                locale: locale.to_string(),
            }
            .into());
        }

        let mut prefix = keypath::parent(keypath, separator);
        while let Some(current) = prefix.filter(|p| !p.is_empty()) {
            if snapshot.get_node(current).is_some() {
                return Err(TreeConflict::LeafUsedAsContainer {
                    keypath: keypath.to_string(),
                    locale: locale.to_string(),
                    prefix: current.to_string(),
                }
                .into());
            }
            prefix = keypath::parent(current, separator);
        }
        Ok(())
    }

    /// Locks every file defining `keypath` and returns its records there.
    ///
    /// The set of files is read again once the locks are held; if it changed
    /// while waiting, the locks are released and taken again.
    async fn lock_key_targets(
        &self,
        keypath: &str,
    ) -> Result<(Vec<LocaleRecord>, Vec<OwnedMutexGuard<()>>), LoaderError> {
        let mut paths = target_paths(&self.files.lock().await.key_targets(keypath));
        loop {
            if paths.is_empty() {
                return Err(LoaderError::KeyNotFound(keypath.to_string()));
            }
            let guards = self.write_queue.acquire_all(&paths).await;
            let targets = self.files.lock().await.key_targets(keypath);
            let locked = target_paths(&targets);
            if locked == paths {
                return Ok((targets, guards));
            }
            tracing::debug!(keypath, "Files holding the key changed while waiting, locking again");
            paths = locked;
        }
    }
}

fn target_paths(targets: &[LocaleRecord]) -> Vec<PathBuf> {
    targets.iter().map(|record| record.filepath.clone()).collect()
}

/// Current text of `path`, or empty when the file does not exist yet.
async fn read_existing(path: &Path) -> Result<String, LoaderError> {
    match tokio::fs::read_to_string(path).await {
        Ok(text) => Ok(text),
        Err(source) if source.kind() == ErrorKind::NotFound => Ok(String::new()),
        Err(source) => Err(LoaderError::Read { path: path.to_path_buf(), source }),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use std::fs;

    use googletest::prelude::*;
    use rstest::*;
    use tempfile::TempDir;

    use super::*;

    fn workspace(files: &[(&str, &str)]) -> TempDir {
        let temp_dir = TempDir::new().unwrap();
        for (path, content) in files {
            let path = temp_dir.path().join(path);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, content).unwrap();
        }
        temp_dir
    }

    fn loader(temp_dir: &TempDir) -> LocaleLoader {
        LocaleLoader::new(LocaleSettings::default(), temp_dir.path().to_path_buf()).unwrap()
    }

    #[tokio::test]
    async fn starts_uninitialized_and_empty() {
        let temp_dir = workspace(&[]);
        let loader = loader(&temp_dir);

        assert_that!(loader.state(), eq(LoaderState::Uninitialized));
        assert_that!(loader.keys(), is_empty());
        assert_that!(loader.snapshot().locales(), elements_are![eq("en")]);
    }

    #[tokio::test]
    async fn load_publishes_tree_and_fires_changed() {
        let temp_dir = workspace(&[
            ("locales/en.json", r#"{"a": {"b": "Hello", "c": "World"}}"#),
            ("locales/fr.json", r#"{"a": {"b": "Bonjour"}}"#),
        ]);
        let loader = loader(&temp_dir);
        let mut events = loader.subscribe();

        let report = loader.load().await;

        assert_that!(report.files, eq(2));
        assert_that!(report.issues, is_empty());
        assert_that!(loader.state(), eq(LoaderState::Ready));
        assert_that!(loader.keys(), elements_are![eq("a.b"), eq("a.c")]);
        assert_that!(events.try_recv(), ok(eq(&LoaderEvent::Changed)));
        assert!(events.try_recv().is_err());
    }

    #[tokio::test]
    async fn malformed_file_does_not_block_others() {
        let temp_dir = workspace(&[
            ("locales/en.json", r#"{"greeting": "Hi"}"#),
            ("locales/fr.json", r#"{"greeting": "#),
        ]);
        let loader = loader(&temp_dir);

        let report = loader.load().await;

        assert_that!(report.files, eq(1));
        assert_that!(report.has_file_errors(), eq(true));
        assert_that!(
            report.issues[0].path(),
            some(eq(temp_dir.path().join("locales/fr.json").as_path()))
        );
        assert_that!(loader.state(), eq(LoaderState::Error));
        assert_that!(loader.snapshot().get_value_by_key("greeting", "en", 0), some(eq("Hi")));

        fs::write(temp_dir.path().join("locales/fr.json"), r#"{"greeting": "Salut"}"#).unwrap();
        let report = loader.reload_file(&temp_dir.path().join("locales/fr.json")).await;

        assert_that!(report.issues, is_empty());
        assert_that!(loader.state(), eq(LoaderState::Ready));
        assert_that!(loader.snapshot().get_value_by_key("greeting", "fr", 0), some(eq("Salut")));
    }

    #[tokio::test]
    async fn write_rejects_structural_conflicts() {
        let temp_dir = workspace(&[("locales/en.json", r#"{"a": {"b": "Hello"}, "leaf": "x"}"#)]);
        let loader = loader(&temp_dir);
        loader.load().await;
        let path = temp_dir.path().join("locales/en.json");

        let into_group = loader.write_to_file(&LocaleRecord::new("a", "en", "v", &path)).await;
        let below_leaf = loader.write_to_file(&LocaleRecord::new("leaf.x", "en", "v", &path)).await;
        let array = loader.write_to_file(&LocaleRecord::new("list[0]", "en", "v", &path)).await;

        assert!(matches!(into_group, Err(LoaderError::Conflict(TreeConflict::ContainerUsedAsLeaf { .. }))));
        assert!(matches!(below_leaf, Err(LoaderError::Conflict(TreeConflict::LeafUsedAsContainer { .. }))));
        assert!(matches!(array, Err(LoaderError::UnsupportedKey(_))));
        assert_that!(fs::read_to_string(&path).unwrap(), eq(r#"{"a": {"b": "Hello"}, "leaf": "x"}"#));
    }

    #[rstest]
    fn new_rejects_invalid_settings() {
        let temp_dir = workspace(&[]);
        let settings = LocaleSettings { key_separator: String::new(), ..LocaleSettings::default() };

        let result = LocaleLoader::new(settings, temp_dir.path().to_path_buf());

        assert!(matches!(result, Err(LoaderError::Config(ConfigError::ValidationErrors(_)))));
    }

    #[rstest]
    fn carry_over_keeps_changes_made_after_the_load_started() {
        let parse = |path: &str, text: &str| LocaleFile::parse(path, "en", text.to_string(), ".").unwrap();
        let mut current = LoadedFiles::default();
        current.insert(parse("/ws/en/a.json", r#"{"a": "old"}"#));
        current.mark_changed(Path::new("/ws/en/a.json"));
        let started = current.commits;
        current.insert(parse("/ws/en/b.json", r#"{"b": "written"}"#));
        current.mark_changed(Path::new("/ws/en/b.json"));
        current.remove(Path::new("/ws/en/c.json"));
        current.mark_changed(Path::new("/ws/en/c.json"));

        let mut loaded = LoadedFiles::default();
        loaded.insert(parse("/ws/en/a.json", r#"{"a": "read"}"#));
        loaded.insert(parse("/ws/en/b.json", r#"{"b": "stale"}"#));
        loaded.insert(parse("/ws/en/c.json", r#"{"c": "deleted"}"#));
        loaded.carry_over(&current, started);

        assert_that!(loaded.files[Path::new("/ws/en/a.json")].value("a"), some(eq("read")));
        assert_that!(loaded.files[Path::new("/ws/en/b.json")].value("b"), some(eq("written")));
        assert_that!(loaded.files.contains_key(Path::new("/ws/en/c.json")), eq(false));
        assert_that!(loaded.commits, eq(current.commits));
    }

    #[tokio::test]
    async fn write_of_shadow_without_value_is_rejected() {
        let temp_dir = workspace(&[("locales/en.json", r#"{"k": "K"}"#)]);
        let loader = loader(&temp_dir);
        loader.load().await;

        let result = loader
            .write_to_file(&LocaleRecord::shadow("k", "fr", temp_dir.path().join("locales/fr.json")))
            .await;

        assert!(matches!(result, Err(LoaderError::MissingValue { .. })));
    }

    #[rstest]
    #[case::ignored("src/app.ts", 1)]
    #[case::reloaded("locales/fr.json", 2)]
    #[tokio::test]
    async fn file_changed_trigger_only_reloads_locale_files(#[case] changed: &str, #[case] files: usize) {
        let temp_dir = workspace(&[("locales/en.json", r#"{"k": "K"}"#), ("src/app.ts", "")]);
        let loader = loader(&temp_dir);
        loader.load().await;
        fs::write(temp_dir.path().join("locales/fr.json"), r#"{"k": "Ka"}"#).unwrap();

        let report = loader.handle_trigger(LoaderTrigger::FileChanged(temp_dir.path().join(changed))).await;

        assert_that!(report.files, eq(files));
    }
}
