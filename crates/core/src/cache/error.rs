use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by a [`StateStore`](super::StateStore) implementation.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The state file exists but does not parse as a JSON document.
    #[error("state file {} is corrupt: {source}", .path.display())]
    CorruptState {
        path: PathBuf,
        source: serde_json::Error,
    },

    /// Reading or writing the state file failed.
    #[error("state file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The in-memory document could not be encoded for persistence.
    #[error("failed to encode state document: {0}")]
    Encode(#[from] serde_json::Error),
}

impl StoreError {
    pub fn corrupt(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        Self::CorruptState {
            path: path.into(),
            source,
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Errors surfaced by state cache operations and the registry.
#[derive(Debug, Error)]
pub enum CacheError {
    /// The requested key is not present in the cache document.
    #[error("key '{key}' not found in state cache '{name}'")]
    KeyNotFound { name: String, key: String },

    /// The registry holds no cache under the requested name.
    #[error("no state cache registered under '{name}'")]
    UnregisteredCache { name: String },

    /// A cache was looked up before any registration happened.
    #[error("state cache registry has not been initialized")]
    RegistryUninitialized,

    /// A registration tried to reuse a name that is already live.
    #[error("state cache '{name}' is already registered")]
    AlreadyRegistered { name: String },

    /// The cache instance was stopped and no longer accepts this operation.
    #[error("state cache '{name}' is stopped")]
    Stopped { name: String },

    /// The backing store failed.
    #[error("state store error: {0}")]
    Store(#[from] StoreError),
}

impl CacheError {
    pub fn key_not_found(name: impl Into<String>, key: impl Into<String>) -> Self {
        Self::KeyNotFound {
            name: name.into(),
            key: key.into(),
        }
    }

    pub fn stopped(name: impl Into<String>) -> Self {
        Self::Stopped { name: name.into() }
    }
}
