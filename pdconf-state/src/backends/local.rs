//! Local file backend for state storage
//!
//! State lives in a pretty-printed JSON file (default: pdconf.state.json)
//! next to a `.lock` file holding the current LockInfo.

use async_trait::async_trait;
use log::{debug, warn};
use std::io::ErrorKind;
use std::path::PathBuf;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::backend::{BackendConfig, BackendError, BackendResult, StateBackend};
use crate::lock::LockInfo;
use crate::state::StateFile;

/// Stores state in a JSON file and serializes runs with a sibling lock file
pub struct LocalBackend {
    state_path: PathBuf,
    lock_path: PathBuf,
}

impl LocalBackend {
    pub const DEFAULT_STATE_FILE: &'static str = "pdconf.state.json";

    /// The lock file sits next to the state file, with a `.lock` extension
    pub fn with_path(state_path: PathBuf) -> Self {
        let lock_path = state_path.with_extension("lock");
        Self {
            state_path,
            lock_path,
        }
    }

    /// Build from the `backend` block; `path` is optional but must be a string
    pub fn from_config(config: &BackendConfig) -> BackendResult<Self> {
        if let Some(value) = config.attributes.get("path")
            && !value.is_string()
        {
            return Err(BackendError::configuration(
                "local backend 'path' must be a string",
            ));
        }
        let path = config
            .get_string("path")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(Self::DEFAULT_STATE_FILE));

        Ok(Self::with_path(path))
    }

    /// `None` when no lock file exists
    async fn read_lock(&self) -> BackendResult<Option<LockInfo>> {
        let content = match fs::read_to_string(&self.lock_path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(BackendError::Io(format!("Failed to read lock file: {}", e))),
        };
        serde_json::from_str(&content)
            .map(Some)
            .map_err(|e| BackendError::InvalidState(format!("Failed to parse lock file: {}", e)))
    }

    async fn remove_lock(&self) -> BackendResult<()> {
        fs::remove_file(&self.lock_path)
            .await
            .map_err(|e| BackendError::Io(format!("Failed to remove lock file: {}", e)))
    }
}

#[async_trait]
impl StateBackend for LocalBackend {
    async fn read_state(&self) -> BackendResult<Option<StateFile>> {
        let content = match fs::read_to_string(&self.state_path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(BackendError::Io(format!("Failed to read state file: {}", e))),
        };

        let state: StateFile = serde_json::from_str(&content).map_err(|e| {
            BackendError::InvalidState(format!("Failed to parse state file: {}", e))
        })?;

        Ok(Some(state))
    }

    /// Checks lineage and serial against the stored copy, then swaps the file in
    async fn write_state(&self, state: &StateFile) -> BackendResult<()> {
        if let Some(stored) = self.read_state().await? {
            if stored.lineage != state.lineage {
                return Err(BackendError::LineageMismatch {
                    expected: stored.lineage,
                    actual: state.lineage.clone(),
                });
            }
            if stored.serial > state.serial {
                return Err(BackendError::StaleSerial {
                    stored: stored.serial,
                    writing: state.serial,
                });
            }
        }

        let content = serde_json::to_string_pretty(state).map_err(|e| {
            BackendError::Serialization(format!("Failed to serialize state: {}", e))
        })?;

        // Write next to the target, then rename over it
        let tmp_path = self.state_path.with_extension("json.tmp");
        fs::write(&tmp_path, content)
            .await
            .map_err(|e| BackendError::Io(format!("Failed to write state file: {}", e)))?;
        fs::rename(&tmp_path, &self.state_path)
            .await
            .map_err(|e| BackendError::Io(format!("Failed to replace state file: {}", e)))?;

        debug!(
            "Wrote state serial {} to {}",
            state.serial,
            self.state_path.display()
        );
        Ok(())
    }

    /// An expired lock is taken over with a warning
    async fn acquire_lock(&self, operation: &str) -> BackendResult<LockInfo> {
        if let Some(existing) = self.read_lock().await? {
            if !existing.is_expired() {
                return Err(BackendError::locked(&existing));
            }
            warn!("Taking over expired lock {}", existing);
            self.remove_lock().await?;
        }

        let lock = LockInfo::new(operation);
        let content = serde_json::to_vec_pretty(&lock)
            .map_err(|e| BackendError::Serialization(format!("Failed to serialize lock: {}", e)))?;

        // create_new makes a concurrent acquire lose instead of overwrite
        let mut file = match fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&self.lock_path)
            .await
        {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                return match self.read_lock().await? {
                    Some(holder) => Err(BackendError::locked(&holder)),
                    None => Err(BackendError::Io("Lock file appeared and vanished".to_string())),
                };
            }
            Err(e) => return Err(BackendError::Io(format!("Failed to create lock file: {}", e))),
        };
        file.write_all(&content)
            .await
            .map_err(|e| BackendError::Io(format!("Failed to write lock file: {}", e)))?;
        file.flush()
            .await
            .map_err(|e| BackendError::Io(format!("Failed to write lock file: {}", e)))?;

        Ok(lock)
    }

    async fn release_lock(&self, lock: &LockInfo) -> BackendResult<()> {
        let existing = self
            .read_lock()
            .await?
            .ok_or_else(|| BackendError::LockNotFound(lock.id.clone()))?;

        if existing.id != lock.id {
            return Err(BackendError::LockMismatch {
                expected: lock.id.clone(),
                actual: existing.id,
            });
        }

        self.remove_lock().await
    }

    async fn force_unlock(&self, lock_id: &str) -> BackendResult<()> {
        let existing = self
            .read_lock()
            .await?
            .ok_or_else(|| BackendError::LockNotFound(lock_id.to_string()))?;

        if existing.id != lock_id {
            return Err(BackendError::LockMismatch {
                expected: lock_id.to_string(),
                actual: existing.id,
            });
        }

        self.remove_lock().await
    }

    /// Creates the state file's parent directory
    async fn init(&self) -> BackendResult<()> {
        if let Some(parent) = self.state_path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| BackendError::Io(format!("Failed to create state directory: {}", e)))?;
        }
        Ok(())
    }
}
