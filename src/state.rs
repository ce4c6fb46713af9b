use std::path::PathBuf;

use async_trait::async_trait;
use tokio::fs;
use tracing::warn;

use crate::models::NotificationWindowState;
use crate::utils::error::Result;

/// Persistence seam for the notification window record. The storage
/// medium is an external concern; the debouncer only needs get/set with
/// "absent" as a valid value.
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Load the persisted state. Unreadable or corrupt state is not an
    /// error: it recovers to Idle so the next availability sighting still
    /// notifies, and the anomaly is surfaced through the log.
    async fn load(&self) -> NotificationWindowState;

    /// Persist the state. Callers treat failure as a warning: the current
    /// cycle's decision already happened in memory, the next cycle may
    /// just read a stale record.
    async fn save(&self, state: &NotificationWindowState) -> Result<()>;
}

/// JSON file holding the single window-state record, one monitor process
/// per file. Each polling cycle may be a fresh process, so the record
/// lives on disk between invocations.
pub struct FileStateStore {
    path: PathBuf,
}

impl FileStateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

#[async_trait]
impl StateStore for FileStateStore {
    async fn load(&self) -> NotificationWindowState {
        let contents = match fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return NotificationWindowState::idle();
            }
            Err(e) => {
                warn!(
                    path = %self.path.display(),
                    error = %e,
                    "window state unreadable, treating as idle"
                );
                return NotificationWindowState::idle();
            }
        };

        match serde_json::from_str(&contents) {
            Ok(state) => state,
            Err(e) => {
                warn!(
                    path = %self.path.display(),
                    error = %e,
                    "window state corrupt, treating as idle"
                );
                NotificationWindowState::idle()
            }
        }
    }

    async fn save(&self, state: &NotificationWindowState) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }
        let json = serde_json::to_string_pretty(state)?;
        fs::write(&self.path, json).await?;
        Ok(())
    }
}
