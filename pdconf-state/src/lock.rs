//! State lock records

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// A lock older than this is treated as abandoned and may be taken over
pub const DEFAULT_LOCK_TIMEOUT_SECS: i64 = 900;

/// Who holds the state, for which command, and until when
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LockInfo {
    pub id: String,
    /// Command holding the lock: "apply", "destroy" or "import"
    pub operation: String,
    /// user@host of the holder
    pub who: String,
    pub created: DateTime<Utc>,
    pub expires: DateTime<Utc>,
}

impl LockInfo {
    pub fn new(operation: impl Into<String>) -> Self {
        Self::with_timeout(operation, Duration::seconds(DEFAULT_LOCK_TIMEOUT_SECS))
    }

    pub fn with_timeout(operation: impl Into<String>, timeout: Duration) -> Self {
        let created = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            operation: operation.into(),
            who: lock_owner(),
            created,
            expires: created + timeout,
        }
    }

    pub fn is_expired(&self) -> bool {
        self.expires < Utc::now()
    }

    /// Negative once expired
    pub fn time_remaining(&self) -> Duration {
        self.expires - Utc::now()
    }
}

impl std::fmt::Display for LockInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "lock {} held by {} for {} since {}",
            self.id,
            self.who,
            self.operation,
            self.created.format("%Y-%m-%d %H:%M:%S UTC")
        )
    }
}

fn lock_owner() -> String {
    let user = ["USER", "USERNAME"]
        .iter()
        .find_map(|var| std::env::var(var).ok())
        .unwrap_or_else(|| "unknown".to_string());
    let host = hostname::get()
        .ok()
        .and_then(|h| h.into_string().ok())
        .unwrap_or_else(|| "unknown".to_string());
    format!("{}@{}", user, host)
}
