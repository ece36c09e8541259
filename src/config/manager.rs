//! 設定管理を行うモジュール

use std::path::{
    Path,
    PathBuf,
};

use super::{
    ConfigError,
    LocaleSettings,
    loader,
};

/// 設定管理を行う
#[derive(Default, Debug, Clone)]
pub struct ConfigManager {
    /// 現在の設定
    current_settings: LocaleSettings,

    /// ワークスペースのルートパス
    workspace_root: Option<PathBuf>,
}

impl ConfigManager {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// 設定を読み込む
    ///
    /// 設定ファイルがなければデフォルト値を使う。
    ///
    /// # Errors
    /// - ファイル読み込みエラー
    /// - JSON パースエラー
    /// - バリデーションエラー
    pub fn load_settings(&mut self, workspace_root: Option<PathBuf>) -> Result<(), ConfigError> {
        let settings = match &workspace_root {
            Some(root) => loader::load_from_workspace(root)?.unwrap_or_default(),
            None => LocaleSettings::default(),
        };

        settings.validate().map_err(ConfigError::ValidationErrors)?;

        tracing::debug!(?settings, "Settings loaded");
        self.current_settings = settings;
        self.workspace_root = workspace_root;

        Ok(())
    }

    /// 設定を更新する
    ///
    /// 無効な設定の場合は現在の設定を保持する。
    ///
    /// # Errors
    /// - バリデーションエラー
    pub fn update_settings(&mut self, new_settings: LocaleSettings) -> Result<(), ConfigError> {
        new_settings.validate().map_err(ConfigError::ValidationErrors)?;

        self.current_settings = new_settings;
        tracing::debug!("Settings updated");

        Ok(())
    }

    #[must_use]
    pub const fn get_settings(&self) -> &LocaleSettings {
        &self.current_settings
    }

    #[must_use]
    pub fn workspace_root(&self) -> Option<&Path> {
        self.workspace_root.as_deref()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::fs;

    use googletest::prelude::*;
    use rstest::rstest;
    use tempfile::TempDir;

    use super::*;
    use crate::config::CONFIG_FILE_NAME;

    /// new: デフォルト値で作成される
    #[rstest]
    fn new_creates_default_settings() {
        let manager = ConfigManager::new();

        assert_that!(manager.get_settings().key_separator, eq("."));
        assert_that!(manager.get_settings().source_language, eq("en"));
        assert_that!(manager.workspace_root(), none());
    }

    /// load_settings: 設定ファイルがある場合
    #[rstest]
    fn load_settings_with_config_file() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join(CONFIG_FILE_NAME), r#"{"keySeparator": "/"}"#).unwrap();

        let mut manager = ConfigManager::new();
        let result = manager.load_settings(Some(temp_dir.path().to_path_buf()));

        assert_that!(result, ok(anything()));
        assert_that!(manager.get_settings().key_separator, eq("/"));
        assert_that!(manager.workspace_root(), some(eq(temp_dir.path())));
    }

    /// load_settings: 設定ファイルがない場合はデフォルト値
    #[rstest]
    fn load_settings_without_config_file() {
        let temp_dir = TempDir::new().unwrap();

        let mut manager = ConfigManager::new();
        manager.load_settings(Some(temp_dir.path().to_path_buf())).unwrap();

        assert_that!(manager.get_settings(), eq(&LocaleSettings::default()));
    }

    /// load_settings: 無効な設定ファイル
    #[rstest]
    fn load_settings_rejects_invalid_file() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join(CONFIG_FILE_NAME), r#"{"keySeparator": ""}"#).unwrap();

        let mut manager = ConfigManager::new();
        let result = manager.load_settings(Some(temp_dir.path().to_path_buf()));

        assert!(matches!(result, Err(ConfigError::ValidationErrors(_))));
        assert_that!(manager.workspace_root(), none());
    }

    /// update_settings: 無効な設定でエラー、現在の設定は維持
    #[rstest]
    fn update_settings_invalid_keeps_current() {
        let mut manager = ConfigManager::new();
        let new_settings =
            LocaleSettings { key_separator: String::new(), ..LocaleSettings::default() };

        let result = manager.update_settings(new_settings);

        assert!(result.is_err());
        assert_that!(manager.get_settings().key_separator, eq("."));
    }

    #[rstest]
    fn update_settings_valid() {
        let mut manager = ConfigManager::new();
        let new_settings =
            LocaleSettings { source_language: "fr".to_string(), ..LocaleSettings::default() };

        manager.update_settings(new_settings).unwrap();

        assert_that!(manager.get_settings().source_language, eq("fr"));
    }
}
