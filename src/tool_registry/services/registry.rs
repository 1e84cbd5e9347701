//! Shared in-process state for registered servers.

use crate::tool_registry::{
    domain::{
        PersistedServerData, ServerId, ServerRecord, ToolDescriptor, ToolRegistryDomainError,
    },
    ports::ToolClient,
};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Server records, live clients, and cached catalogs.
///
/// Each map sits behind its own lock and no guard is ever held across an
/// `.await`. A poisoned lock is recovered rather than propagated: every
/// write leaves the guarded value consistent, so the data is still valid.
#[derive(Default)]
pub struct ServerRegistry {
    records: RwLock<Vec<ServerRecord>>,
    clients: RwLock<HashMap<ServerId, Arc<dyn ToolClient>>>,
    catalogs: RwLock<HashMap<ServerId, Vec<ToolDescriptor>>>,
}

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

impl fmt::Debug for ServerRegistry {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("ServerRegistry")
            .field("records", &*read(&self.records))
            .field("clients", &read(&self.clients).len())
            .field("catalogs", &read(&self.catalogs).len())
            .finish()
    }
}

impl ServerRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns every record in registration order.
    #[must_use]
    pub fn records(&self) -> Vec<ServerRecord> {
        read(&self.records).clone()
    }

    /// Returns the online records in registration order.
    #[must_use]
    pub fn online_records(&self) -> Vec<ServerRecord> {
        read(&self.records)
            .iter()
            .filter(|record| record.is_online())
            .cloned()
            .collect()
    }

    /// Returns the record for `id`.
    #[must_use]
    pub fn find(&self, id: ServerId) -> Option<ServerRecord> {
        read(&self.records)
            .iter()
            .find(|record| record.id() == id)
            .cloned()
    }

    /// Returns the persisted view of every record.
    #[must_use]
    pub fn persisted(&self) -> Vec<PersistedServerData> {
        read(&self.records)
            .iter()
            .map(ServerRecord::to_persisted)
            .collect()
    }

    /// Replaces every record and drops all catalogs.
    ///
    /// Returns the clients that were live, which the caller must close.
    pub(crate) fn replace_all(
        &self,
        records: Vec<ServerRecord>,
    ) -> Vec<(ServerId, Arc<dyn ToolClient>)> {
        *write(&self.records) = records;
        write(&self.catalogs).clear();
        write(&self.clients).drain().collect()
    }

    /// Appends a record built for the next free identifier.
    ///
    /// The identifier is chosen under the write lock, so concurrent
    /// registrations never share one.
    ///
    /// # Errors
    ///
    /// Returns [`ToolRegistryDomainError::IdSpaceExhausted`] when the
    /// highest registered identifier is `u64::MAX`.
    pub(crate) fn register_with(
        &self,
        build: impl FnOnce(ServerId) -> ServerRecord,
    ) -> Result<ServerRecord, ToolRegistryDomainError> {
        let mut records = write(&self.records);
        let id = ServerId::next_after(records.iter().map(ServerRecord::id))?;
        let record = build(id);
        records.push(record.clone());
        Ok(record)
    }

    /// Applies `update` to the record for `id` and returns the result.
    pub(crate) fn modify(
        &self,
        id: ServerId,
        update: impl FnOnce(&mut ServerRecord),
    ) -> Option<ServerRecord> {
        let mut records = write(&self.records);
        let record = records.iter_mut().find(|record| record.id() == id)?;
        update(record);
        Some(record.clone())
    }

    /// Removes and returns the record for `id`.
    pub(crate) fn remove(&self, id: ServerId) -> Option<ServerRecord> {
        let mut records = write(&self.records);
        let position = records.iter().position(|record| record.id() == id)?;
        Some(records.remove(position))
    }

    /// Returns the live client for `id`.
    #[must_use]
    pub fn client(&self, id: ServerId) -> Option<Arc<dyn ToolClient>> {
        read(&self.clients).get(&id).cloned()
    }

    /// Stores `client` for `id`, returning any client it replaced.
    pub(crate) fn set_client(
        &self,
        id: ServerId,
        client: Arc<dyn ToolClient>,
    ) -> Option<Arc<dyn ToolClient>> {
        write(&self.clients).insert(id, client)
    }

    /// Removes and returns the client for `id`.
    pub(crate) fn take_client(&self, id: ServerId) -> Option<Arc<dyn ToolClient>> {
        write(&self.clients).remove(&id)
    }

    /// Returns the cached catalog for `id`.
    #[must_use]
    pub fn catalog(&self, id: ServerId) -> Option<Vec<ToolDescriptor>> {
        read(&self.catalogs).get(&id).cloned()
    }

    pub(crate) fn set_catalog(&self, id: ServerId, tools: Vec<ToolDescriptor>) {
        write(&self.catalogs).insert(id, tools);
    }

    pub(crate) fn remove_catalog(&self, id: ServerId) {
        write(&self.catalogs).remove(&id);
    }

    pub(crate) fn clear_catalogs(&self) {
        write(&self.catalogs).clear();
    }
}
