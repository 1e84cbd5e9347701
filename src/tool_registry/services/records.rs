//! Loading and saving the configured server set.

use super::registry::ServerRegistry;
use crate::tool_registry::{
    domain::{PersistedServerData, ServerRecord, ToolRegistryDomainError},
    ports::{ServerStore, ServerStoreError, ServerStoreResult},
};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{info, warn};

/// Server record persistence on top of a [`ServerStore`].
#[derive(Debug)]
pub struct ServerRecordStore<S: ServerStore> {
    store: Arc<S>,
}

impl<S: ServerStore> Clone for ServerRecordStore<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: ServerStore> ServerRecordStore<S> {
    /// Wraps a store.
    #[must_use]
    pub const fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Loads every stored server as an offline record.
    ///
    /// Unreadable or corrupt storage degrades to an empty set so the process
    /// can still start; the failure is logged. A set in which two servers
    /// share an identifier counts as corrupt.
    pub async fn load(&self) -> Vec<ServerRecord> {
        let loaded = self
            .store
            .load()
            .await
            .and_then(|stored| ensure_unique_ids(&stored).map(|()| stored));
        match loaded {
            Ok(stored) => {
                let records: Vec<ServerRecord> =
                    stored.into_iter().map(ServerRecord::from_persisted).collect();
                info!(count = records.len(), "loaded tool server records");
                records
            }
            Err(err) => {
                warn!(error = %err, "server store unreadable, starting with no servers");
                Vec::new()
            }
        }
    }

    /// Writes `records` to the store.
    ///
    /// # Errors
    ///
    /// Returns the store error when the write fails.
    pub async fn save(&self, records: &[ServerRecord]) -> ServerStoreResult<()> {
        let persisted: Vec<_> = records.iter().map(ServerRecord::to_persisted).collect();
        self.store.save(&persisted).await
    }

    /// Writes the registry's current set, logging rather than returning a
    /// failure. The in-memory set stays authoritative until the next save.
    pub(crate) async fn persist(&self, registry: &ServerRegistry) {
        if let Err(err) = self.store.save(&registry.persisted()).await {
            warn!(error = %err, "failed to persist tool server records");
        }
    }
}

fn ensure_unique_ids(stored: &[PersistedServerData]) -> ServerStoreResult<()> {
    let mut seen = HashSet::with_capacity(stored.len());
    stored
        .iter()
        .find(|server| !seen.insert(server.id))
        .map_or(Ok(()), |duplicate| {
            Err(ServerStoreError::corrupt(
                ToolRegistryDomainError::DuplicateServerId(duplicate.id.value()),
            ))
        })
}
