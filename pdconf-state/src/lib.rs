//! pdconf State Management
//!
//! Records which External Servers pdconf manages, under which object name,
//! and what their attributes looked like after the last successful call.
//!
//! # Overview
//!
//! - **StateFile**: the persisted document holding every recorded resource
//! - **StateBackend**: a trait for state storage backends
//! - **LockInfo**: who holds the state lock, and until when
//!
//! # Example
//!
//! ```ignore
//! use pdconf_state::{create_backend, BackendConfig};
//!
//! let backend = create_backend(&BackendConfig::default())?;
//!
//! let lock = backend.acquire_lock("apply").await?;
//! let mut state = backend.read_state().await?.unwrap_or_default();
//!
//! // ... record provider outcomes ...
//!
//! state.increment_serial();
//! backend.write_state(&state).await?;
//! backend.release_lock(&lock).await?;
//! ```

pub mod backend;
pub mod backends;
pub mod lock;
pub mod state;

// Re-export main types for convenience
pub use backend::{BackendConfig, BackendError, BackendResult, StateBackend};
pub use backends::{LocalBackend, create_backend};
pub use lock::LockInfo;
pub use state::{ResourceState, StateFile};
