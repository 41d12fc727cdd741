//! Storage seam for the state file

use std::collections::HashMap;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

use crate::lock::LockInfo;
use crate::state::StateFile;

#[derive(Debug, Error)]
pub enum BackendError {
    /// Another run holds the lock
    #[error("State is locked: {holder} (expires in {} min)", .holder.time_remaining().num_minutes().max(0))]
    Locked { holder: Box<LockInfo> },

    #[error("No lock with ID {0} is held")]
    LockNotFound(String),

    #[error("Lock {actual} is held, not {expected}")]
    LockMismatch { expected: String, actual: String },

    #[error("Backend type '{0}' is not supported (available: local)")]
    UnsupportedBackend(String),

    #[error("Invalid backend block: {0}")]
    Configuration(String),

    #[error("State file is unreadable: {0}")]
    InvalidState(String),

    /// The stored state belongs to another state history
    #[error("State lineage {actual} does not match the stored lineage {expected}")]
    LineageMismatch { expected: String, actual: String },

    /// A concurrent writer already stored a newer state
    #[error("Refusing to write serial {writing} over newer stored serial {stored}")]
    StaleSerial { stored: u64, writing: u64 },

    #[error("State storage I/O failed: {0}")]
    Io(String),

    #[error("State encoding failed: {0}")]
    Serialization(String),
}

impl BackendError {
    pub fn locked(holder: &LockInfo) -> Self {
        Self::Locked {
            holder: Box::new(holder.clone()),
        }
    }

    pub fn unsupported_backend(backend_type: impl Into<String>) -> Self {
        Self::UnsupportedBackend(backend_type.into())
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }
}

pub type BackendResult<T> = Result<T, BackendError>;

/// Where the state file lives and how runs are serialized
///
/// `apply`, `destroy` and `import` hold the lock for their whole run;
/// `plan` only reads.
#[async_trait]
pub trait StateBackend: Send + Sync {
    /// `None` until the first state is written
    async fn read_state(&self) -> BackendResult<Option<StateFile>>;

    /// Store a state whose serial was already incremented
    ///
    /// Fails on a lineage change or when the stored serial is newer.
    async fn write_state(&self, state: &StateFile) -> BackendResult<()>;

    /// Take the lock, unless a live lock is already held
    async fn acquire_lock(&self, operation: &str) -> BackendResult<LockInfo>;

    async fn release_lock(&self, lock: &LockInfo) -> BackendResult<()>;

    /// Release a lock left behind by a crashed run
    async fn force_unlock(&self, lock_id: &str) -> BackendResult<()>;

    async fn init(&self) -> BackendResult<()>;
}

/// The `backend` block of the configuration file
///
/// `type` selects the backend; every other key is passed to it.
#[derive(Debug, Clone, Deserialize)]
pub struct BackendConfig {
    #[serde(rename = "type", default = "default_backend_type")]
    pub backend_type: String,
    #[serde(flatten)]
    pub attributes: HashMap<String, serde_json::Value>,
}

fn default_backend_type() -> String {
    "local".to_string()
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            backend_type: default_backend_type(),
            attributes: HashMap::new(),
        }
    }
}

impl BackendConfig {
    pub fn get_string(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).and_then(|v| v.as_str())
    }
}
