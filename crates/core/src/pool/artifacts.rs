use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::Mutex;

/// Shared list of scratch files to remove when the pool shuts down.
///
/// Runners register byproducts they cannot remove while their job is live
/// (helper scripts, partial outputs). The sweep is best effort: files
/// already gone are skipped and removal failures are logged, never fatal.
#[derive(Debug, Clone, Default)]
pub struct ArtifactTracker {
    paths: Arc<Mutex<Vec<PathBuf>>>,
}

impl ArtifactTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remember a file for the next sweep.
    pub async fn track(&self, path: impl Into<PathBuf>) {
        self.paths.lock().await.push(path.into());
    }

    /// Paths currently registered, in registration order.
    pub async fn tracked(&self) -> Vec<PathBuf> {
        self.paths.lock().await.clone()
    }

    /// Remove every registered file that still exists. Returns how many
    /// files were actually removed.
    pub async fn sweep(&self) -> usize {
        let mut paths = self.paths.lock().await;
        let mut removed = 0;
        for path in paths.drain(..) {
            match std::fs::remove_file(&path) {
                Ok(()) => {
                    tracing::debug!("Removed job artifact {}", path.display());
                    removed += 1;
                }
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => {
                    tracing::warn!("Failed to remove job artifact {}: {}", path.display(), e);
                }
            }
        }
        removed
    }
}
