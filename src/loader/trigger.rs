//! Reload triggers from outside the loader, such as a file watcher.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::locale_loader::LocaleLoader;

/// A request to bring the loader back in sync with the disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoaderTrigger {
    /// A file was created or modified.
    FileChanged(PathBuf),
    FileRemoved(PathBuf),
    ReloadAll,
}

/// Applies triggers one at a time until every sender is dropped.
pub fn spawn_trigger_loop(
    loader: Arc<LocaleLoader>,
    mut triggers: mpsc::Receiver<LoaderTrigger>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(trigger) = triggers.recv().await {
            tracing::debug!(?trigger, "Handling loader trigger");
            let report = loader.handle_trigger(trigger).await;
            for issue in &report.issues {
                tracing::warn!(%issue, "Locale load issue");
            }
        }
        tracing::debug!("Trigger channel closed");
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::fs;

    use googletest::prelude::*;
    use tempfile::TempDir;

    use super::*;
    use crate::config::LocaleSettings;

    #[tokio::test]
    async fn triggers_drive_reloads() {
        let temp_dir = TempDir::new().unwrap();
        let locales = temp_dir.path().join("locales");
        fs::create_dir_all(&locales).unwrap();
        fs::write(locales.join("en.json"), r#"{"k": "K"}"#).unwrap();
        let loader = Arc::new(
            LocaleLoader::new(LocaleSettings::default(), temp_dir.path().to_path_buf()).unwrap(),
        );
        let (sender, receiver) = mpsc::channel(8);
        let handle = spawn_trigger_loop(Arc::clone(&loader), receiver);

        fs::write(locales.join("fr.json"), r#"{"k": "Ka"}"#).unwrap();
        sender.send(LoaderTrigger::ReloadAll).await.unwrap();
        sender.send(LoaderTrigger::FileRemoved(locales.join("en.json"))).await.unwrap();
        drop(sender);
        handle.await.unwrap();

        let snapshot = loader.snapshot();
        assert_that!(snapshot.get_value_by_key("k", "fr", 0), some(eq("Ka")));
        assert_that!(snapshot.get_value_by_key("k", "en", 0), none());
        assert_that!(snapshot.files().len(), eq(1));
    }
}
