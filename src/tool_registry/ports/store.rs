//! Storage port for tool server configuration.

use crate::tool_registry::domain::PersistedServerData;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for server store operations.
pub type ServerStoreResult<T> = Result<T, ServerStoreError>;

/// Persistence contract for the configured server set.
///
/// Only identity and configuration fields cross this boundary; connection
/// state is never stored.
#[async_trait]
pub trait ServerStore: Send + Sync {
    /// Loads every persisted server in stored order.
    ///
    /// Implementations return an empty set when nothing has been stored yet.
    ///
    /// # Errors
    ///
    /// Returns [`ServerStoreError::Corrupt`] when stored data cannot be
    /// decoded, or [`ServerStoreError::Io`] when storage is unreadable.
    async fn load(&self) -> ServerStoreResult<Vec<PersistedServerData>>;

    /// Replaces the whole stored set.
    ///
    /// # Errors
    ///
    /// Returns [`ServerStoreError::Io`] when the write fails. A failed save
    /// leaves the previously stored set intact.
    async fn save(&self, servers: &[PersistedServerData]) -> ServerStoreResult<()>;
}

/// Errors returned by server store implementations.
#[derive(Debug, Clone, Error)]
pub enum ServerStoreError {
    /// Stored data exists but cannot be decoded or validated.
    #[error("corrupt server store: {0}")]
    Corrupt(Arc<dyn std::error::Error + Send + Sync>),

    /// Storage could not be read or written.
    #[error("server store I/O error: {0}")]
    Io(Arc<dyn std::error::Error + Send + Sync>),
}

impl ServerStoreError {
    /// Wraps a decoding or validation failure.
    pub fn corrupt(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Corrupt(Arc::new(err))
    }

    /// Wraps a storage I/O failure.
    pub fn io(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Io(Arc::new(err))
    }
}
