//! Loads the locale files of a workspace and writes the locale tree to stdout as JSON.
//!
//! Usage: `locale-tree [WORKSPACE] [--flat]`

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use locale_tree::config::{
    ConfigError,
    ConfigManager,
};
use locale_tree::loader::{
    LoadIssue,
    LoaderError,
    LocaleLoader,
};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

/// Errors that end the program.
#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Loader(#[from] LoaderError),

    #[error("Failed to write output: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to serialize output: {0}")]
    Json(#[from] serde_json::Error),
}

/// JSON document written to stdout.
#[derive(Serialize)]
struct Output<'a, T: Serialize> {
    /// Configured locales, source language first.
    locales: &'a [String],
    /// The tree, or key path → node with `--flat`.
    tree: T,
    /// Files that failed to load and structural conflicts.
    issues: &'a [LoadIssue],
}

#[tokio::main]
async fn main() -> ExitCode {
    let (writer, _guard) = tracing_appender::non_blocking(std::io::stderr());
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(writer)
        .init();

    let mut flat = false;
    let mut workspace_root = None;
    for arg in std::env::args_os().skip(1) {
        if arg == "--flat" {
            flat = true;
        } else {
            workspace_root = Some(PathBuf::from(arg));
        }
    }

    match run(workspace_root, flat).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            tracing::error!(%error, "locale-tree failed");
            ExitCode::FAILURE
        }
    }
}

/// Loads the workspace and writes the JSON document.
async fn run(workspace_root: Option<PathBuf>, flat: bool) -> Result<(), CliError> {
    let workspace_root = match workspace_root {
        Some(root) => root,
        None => std::env::current_dir()?,
    };

    let mut config_manager = ConfigManager::new();
    config_manager.load_settings(Some(workspace_root.clone()))?;

    let loader = LocaleLoader::new(config_manager.get_settings().clone(), workspace_root)?;
    let report = loader.load().await;
    for issue in &report.issues {
        tracing::warn!(%issue, "Locale load issue");
    }

    let snapshot = loader.snapshot();
    let mut stdout = std::io::stdout().lock();
    if flat {
        let output = Output {
            locales: snapshot.locales(),
            tree: snapshot.flatten_locale_tree(),
            issues: snapshot.issues(),
        };
        serde_json::to_writer_pretty(&mut stdout, &output)?;
    } else {
        let output = Output {
            locales: snapshot.locales(),
            tree: snapshot.locale_tree(),
            issues: snapshot.issues(),
        };
        serde_json::to_writer_pretty(&mut stdout, &output)?;
    }
    writeln!(stdout)?;

    Ok(())
}
