//! Connection lifecycle for registered tool servers.

use super::catalog::normalize_for;
use super::deadline::within;
use super::error::{ToolHubError, ToolHubResult};
use super::registry::ServerRegistry;
use crate::tool_registry::{
    domain::{ServerId, ServerRecord, ToolDescriptor},
    ports::{ToolClient, ToolClientConnector, ToolClientError},
};
use mockable::Clock;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Result of a connection attempt.
///
/// A failed attempt is an outcome, not an error: the record is updated
/// either way and the caller decides what to do with the reason.
#[derive(Debug, Clone)]
pub enum ConnectOutcome {
    /// The server is online and its catalog is cached.
    Connected {
        /// Updated record.
        server: ServerRecord,
        /// Normalized catalog returned by the server.
        tools: Vec<ToolDescriptor>,
    },
    /// The attempt failed and the server is offline.
    Failed {
        /// Updated record.
        server: ServerRecord,
        /// Why the attempt failed.
        reason: ToolClientError,
    },
}

impl ConnectOutcome {
    /// Returns the record as updated by the attempt.
    #[must_use]
    pub const fn server(&self) -> &ServerRecord {
        match self {
            Self::Connected { server, .. } | Self::Failed { server, .. } => server,
        }
    }

    /// Returns whether the attempt succeeded.
    #[must_use]
    pub const fn is_connected(&self) -> bool {
        matches!(self, Self::Connected { .. })
    }
}

/// Opens, replaces, and closes live client sessions.
pub struct ConnectionManager<K, C>
where
    K: ToolClientConnector,
    C: Clock + Send + Sync,
{
    registry: Arc<ServerRegistry>,
    connector: Arc<K>,
    clock: Arc<C>,
    connect_timeout: Duration,
}

impl<K, C> Clone for ConnectionManager<K, C>
where
    K: ToolClientConnector,
    C: Clock + Send + Sync,
{
    fn clone(&self) -> Self {
        Self {
            registry: Arc::clone(&self.registry),
            connector: Arc::clone(&self.connector),
            clock: Arc::clone(&self.clock),
            connect_timeout: self.connect_timeout,
        }
    }
}

impl<K, C> ConnectionManager<K, C>
where
    K: ToolClientConnector,
    C: Clock + Send + Sync,
{
    /// Creates a connection manager.
    #[must_use]
    pub const fn new(
        registry: Arc<ServerRegistry>,
        connector: Arc<K>,
        clock: Arc<C>,
        connect_timeout: Duration,
    ) -> Self {
        Self {
            registry,
            connector,
            clock,
            connect_timeout,
        }
    }

    /// Opens a fresh session to `server_id`.
    ///
    /// On success the record goes online with the measured latency, the new
    /// client replaces any previous one, and the normalized catalog is
    /// cached. On failure the record goes offline, any previous client and
    /// catalog are dropped, and the reason is returned in the outcome.
    ///
    /// # Errors
    ///
    /// Returns [`ToolHubError::NotFound`] when the server is not registered.
    pub async fn connect(&self, server_id: ServerId) -> ToolHubResult<ConnectOutcome> {
        let record = self
            .registry
            .find(server_id)
            .ok_or(ToolHubError::NotFound(server_id))?;
        let client = self
            .connector
            .client_for(record.endpoint(), record.credential());

        let started = Instant::now();
        let attempt = within("connect", self.connect_timeout, client.connect()).await;
        let latency = started.elapsed();

        match attempt {
            Ok(raw_tools) => {
                let tools = normalize_for(server_id, &raw_tools);
                self.install(server_id, client, tools, latency).await
            }
            Err(reason) => {
                warn!(
                    server_id = %server_id,
                    endpoint = %record.endpoint(),
                    error = %reason,
                    "failed to connect to tool server"
                );
                self.release(server_id).await;
                let server = self
                    .registry
                    .modify(server_id, |server| server.mark_connect_failed(&*self.clock))
                    .ok_or(ToolHubError::NotFound(server_id))?;
                Ok(ConnectOutcome::Failed { server, reason })
            }
        }
    }

    async fn install(
        &self,
        server_id: ServerId,
        client: Arc<dyn ToolClient>,
        tools: Vec<ToolDescriptor>,
        latency: Duration,
    ) -> ToolHubResult<ConnectOutcome> {
        let previous = self.registry.set_client(server_id, client);
        self.registry.set_catalog(server_id, tools.clone());
        let updated = self
            .registry
            .modify(server_id, |server| server.mark_online(latency, &*self.clock));
        if let Some(stale) = previous {
            close(server_id, stale.as_ref()).await;
        }

        let Some(server) = updated else {
            // Deregistered while the session was opening.
            self.release(server_id).await;
            return Err(ToolHubError::NotFound(server_id));
        };
        info!(
            server_id = %server_id,
            latency = ?latency,
            tools = tools.len(),
            "connected to tool server"
        );
        Ok(ConnectOutcome::Connected { server, tools })
    }

    /// Closes the session for `server_id` and marks it offline.
    ///
    /// Disconnecting an offline server is a no-op that still succeeds.
    ///
    /// # Errors
    ///
    /// Returns [`ToolHubError::NotFound`] when the server is not registered.
    pub async fn disconnect(&self, server_id: ServerId) -> ToolHubResult<ServerRecord> {
        let server = self
            .registry
            .modify(server_id, ServerRecord::mark_offline)
            .ok_or(ToolHubError::NotFound(server_id))?;
        self.release(server_id).await;
        info!(server_id = %server_id, "disconnected tool server");
        Ok(server)
    }

    /// Marks `server_id` offline without touching its session.
    pub(crate) fn mark_offline(&self, server_id: ServerId) {
        self.registry.modify(server_id, ServerRecord::mark_offline);
    }

    /// Marks `server_id` offline and drops its client and catalog without
    /// talking to the session again.
    pub(crate) fn abandon(&self, server_id: ServerId) {
        self.mark_offline(server_id);
        self.registry.remove_catalog(server_id);
        drop(self.registry.take_client(server_id));
    }

    /// Drops the client and catalog for `server_id`, closing the session.
    pub(crate) async fn release(&self, server_id: ServerId) {
        self.registry.remove_catalog(server_id);
        if let Some(client) = self.registry.take_client(server_id) {
            close(server_id, client.as_ref()).await;
        }
    }

    /// Replaces the registered set with `records`, closing every session
    /// that was open.
    pub(crate) async fn reset(&self, records: Vec<ServerRecord>) {
        for (server_id, client) in self.registry.replace_all(records) {
            close(server_id, client.as_ref()).await;
        }
    }

    /// Returns the live client for `server_id`.
    #[must_use]
    pub fn client(&self, server_id: ServerId) -> Option<Arc<dyn ToolClient>> {
        self.registry.client(server_id)
    }
}

async fn close(server_id: ServerId, client: &dyn ToolClient) {
    if let Err(err) = client.disconnect().await {
        debug!(server_id = %server_id, error = %err, "error while closing tool server session");
    }
}
