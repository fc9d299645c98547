//! Policy storage capability.
//!
//! The bandit only needs `load` and `save`. Backends must give at least
//! last-writer-wins semantics; failures propagate to the caller unchanged.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use super::policy::PolicyState;

/// Error type for policy store operations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Deserialization error in {path}: {reason}")]
    Deserialization { path: PathBuf, reason: String },

    #[error("Lock poisoned")]
    LockPoisoned,
}

/// Result type for policy store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Load/save capability for [`PolicyState`].
pub trait PolicyStore: Send + Sync {
    /// Read the current state. An empty backend yields `PolicyState::default()`.
    fn load(&self) -> StoreResult<PolicyState>;

    /// Replace the persisted state.
    fn save(&self, state: &PolicyState) -> StoreResult<()>;
}

impl<S: PolicyStore + ?Sized> PolicyStore for Arc<S> {
    fn load(&self) -> StoreResult<PolicyState> {
        (**self).load()
    }

    fn save(&self, state: &PolicyState) -> StoreResult<()> {
        (**self).save(state)
    }
}

/// Pretty-printed JSON file, conventionally `<data_dir>/rl_memory.json`.
#[derive(Debug, Clone)]
pub struct JsonFilePolicyStore {
    path: PathBuf,
}

impl JsonFilePolicyStore {
    /// File name used inside a data directory.
    pub const FILE_NAME: &'static str = "rl_memory.json";

    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at `<data_dir>/rl_memory.json`.
    pub fn in_dir(data_dir: impl AsRef<Path>) -> Self {
        Self::new(data_dir.as_ref().join(Self::FILE_NAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Sibling file each save is written to before being renamed into place.
    pub fn temp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn io_err(&self, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl PolicyStore for JsonFilePolicyStore {
    fn load(&self) -> StoreResult<PolicyState> {
        if !self.path.exists() {
            return Ok(PolicyState::default());
        }

        let json = std::fs::read_to_string(&self.path).map_err(|e| self.io_err(e))?;
        if json.trim().is_empty() {
            return Ok(PolicyState::default());
        }

        serde_json::from_str(&json).map_err(|e| StoreError::Deserialization {
            path: self.path.clone(),
            reason: e.to_string(),
        })
    }

    fn save(&self, state: &PolicyState) -> StoreResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| self.io_err(e))?;
            }
        }

        let json = serde_json::to_string_pretty(state)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;

        // Write to temp file, then rename over the target so readers never
        // see a partial policy.
        let temp_path = self.temp_path();
        std::fs::write(&temp_path, json).map_err(|source| StoreError::Io {
            path: temp_path.clone(),
            source,
        })?;
        std::fs::rename(&temp_path, &self.path).map_err(|e| self.io_err(e))?;
        Ok(())
    }
}

/// In-process store. Each `load`/`save` is serialized by a mutex.
#[derive(Debug, Default)]
pub struct MemoryPolicyStore {
    state: Mutex<PolicyState>,
}

impl MemoryPolicyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing state.
    pub fn with_state(state: PolicyState) -> Self {
        Self {
            state: Mutex::new(state),
        }
    }

    /// Create a shared reference to this store
    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }
}

impl PolicyStore for MemoryPolicyStore {
    fn load(&self) -> StoreResult<PolicyState> {
        let state = self.state.lock().map_err(|_| StoreError::LockPoisoned)?;
        Ok(state.clone())
    }

    fn save(&self, state: &PolicyState) -> StoreResult<()> {
        let mut guard = self.state.lock().map_err(|_| StoreError::LockPoisoned)?;
        *guard = state.clone();
        Ok(())
    }
}
