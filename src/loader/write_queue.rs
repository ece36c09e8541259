//! Per-file write serialization.

use std::collections::HashMap;
use std::path::{
    Path,
    PathBuf,
};
use std::sync::{
    Arc,
    Mutex,
    PoisonError,
};

use tokio::sync::{
    Mutex as AsyncMutex,
    OwnedMutexGuard,
};

/// One async lock per file path.
///
/// Waiters on the same path are served in the order they started waiting,
/// so writes to one file land in issue order. Different paths never contend.
#[derive(Debug, Default)]
pub struct WriteQueue {
    locks: Mutex<HashMap<PathBuf, Arc<AsyncMutex<()>>>>,
}

impl WriteQueue {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits for exclusive access to `path`. Access ends when the guard drops.
    pub async fn acquire(&self, path: &Path) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(locks.entry(path.to_path_buf()).or_default())
        };
        lock.lock_owned().await
    }

    /// Acquires several paths in sorted order.
    pub async fn acquire_all(&self, paths: &[PathBuf]) -> Vec<OwnedMutexGuard<()>> {
        let mut sorted = paths.to_vec();
        sorted.sort();
        sorted.dedup();

        let mut guards = Vec::with_capacity(sorted.len());
        for path in &sorted {
            guards.push(self.acquire(path).await);
        }
        guards
    }
}
