//! In-memory server store.

use crate::tool_registry::{
    domain::PersistedServerData,
    ports::{ServerStore, ServerStoreError, ServerStoreResult},
};
use async_trait::async_trait;
use std::sync::{Arc, RwLock};

/// Thread-safe in-memory server store.
#[derive(Debug, Clone, Default)]
pub struct InMemoryServerStore {
    state: Arc<RwLock<InMemoryStoreState>>,
}

#[derive(Debug, Default)]
struct InMemoryStoreState {
    servers: Vec<PersistedServerData>,
    corrupt: bool,
    save_count: usize,
}

impl InMemoryServerStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-populated with `servers`.
    #[must_use]
    pub fn with_servers(servers: Vec<PersistedServerData>) -> Self {
        let store = Self::default();
        if let Ok(mut state) = store.state.write() {
            state.servers = servers;
        }
        store
    }

    /// Makes subsequent loads fail as if stored data were unreadable.
    ///
    /// # Errors
    ///
    /// Returns store errors when lock acquisition fails.
    pub fn set_corrupt(&self, corrupt: bool) -> ServerStoreResult<()> {
        let mut state = self
            .state
            .write()
            .map_err(|err| ServerStoreError::io(std::io::Error::other(err.to_string())))?;
        state.corrupt = corrupt;
        Ok(())
    }

    /// Returns the currently stored set.
    ///
    /// # Errors
    ///
    /// Returns store errors when lock acquisition fails.
    pub fn snapshot(&self) -> ServerStoreResult<Vec<PersistedServerData>> {
        let state = self
            .state
            .read()
            .map_err(|err| ServerStoreError::io(std::io::Error::other(err.to_string())))?;
        Ok(state.servers.clone())
    }

    /// Returns how many times the set has been saved.
    ///
    /// # Errors
    ///
    /// Returns store errors when lock acquisition fails.
    pub fn save_count(&self) -> ServerStoreResult<usize> {
        let state = self
            .state
            .read()
            .map_err(|err| ServerStoreError::io(std::io::Error::other(err.to_string())))?;
        Ok(state.save_count)
    }
}

#[async_trait]
impl ServerStore for InMemoryServerStore {
    async fn load(&self) -> ServerStoreResult<Vec<PersistedServerData>> {
        let state = self
            .state
            .read()
            .map_err(|err| ServerStoreError::io(std::io::Error::other(err.to_string())))?;
        if state.corrupt {
            return Err(ServerStoreError::corrupt(std::io::Error::other(
                "stored server set is unreadable",
            )));
        }
        Ok(state.servers.clone())
    }

    async fn save(&self, servers: &[PersistedServerData]) -> ServerStoreResult<()> {
        let mut state = self
            .state
            .write()
            .map_err(|err| ServerStoreError::io(std::io::Error::other(err.to_string())))?;
        state.servers = servers.to_vec();
        state.save_count = state.save_count.saturating_add(1);
        Ok(())
    }
}
