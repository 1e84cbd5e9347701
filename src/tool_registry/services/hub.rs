//! Operation surface for managing tool servers and calling their tools.

use super::catalog::ToolCatalogCache;
use super::connection::{ConnectOutcome, ConnectionManager};
use super::deadline::CallDeadlines;
use super::dispatch::{Dispatcher, ToolDispatch};
use super::error::{ToolHubError, ToolHubResult};
use super::health::{HealthMonitor, HealthMonitorHandle};
use super::records::ServerRecordStore;
use super::registry::ServerRegistry;
use crate::config::ToolRegistryConfig;
use crate::tool_registry::{
    domain::{
        Credential, ServerEndpoint, ServerId, ServerName, ServerRecord, ToolCallResult,
        ToolDescriptor,
    },
    ports::{ServerStore, ToolClientConnector},
};
use mockable::Clock;
use serde_json::Value;
use std::sync::Arc;
use tracing::info;

/// Request payload for registering a tool server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterServerRequest {
    /// Display name.
    pub name: String,
    /// Connection endpoint.
    pub endpoint: String,
    /// Credential presented on connect; empty for none.
    pub credential: String,
    /// Whether to connect immediately after registering.
    pub auto_connect: bool,
}

impl RegisterServerRequest {
    /// Creates a request with no credential that connects immediately.
    #[must_use]
    pub fn new(name: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            endpoint: endpoint.into(),
            credential: String::new(),
            auto_connect: true,
        }
    }

    /// Sets the credential.
    #[must_use]
    pub fn with_credential(mut self, credential: impl Into<String>) -> Self {
        self.credential = credential.into();
        self
    }

    /// Sets whether to connect immediately.
    #[must_use]
    pub const fn with_auto_connect(mut self, auto_connect: bool) -> Self {
        self.auto_connect = auto_connect;
        self
    }
}

/// Request payload for editing a server's configuration.
///
/// Absent fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateServerRequest {
    /// New display name.
    pub name: Option<String>,
    /// New connection endpoint.
    pub endpoint: Option<String>,
    /// New credential.
    pub credential: Option<String>,
}

/// Result of a registration.
#[derive(Debug, Clone)]
pub struct Registration {
    /// The registered record, online if auto-connect succeeded.
    pub server: ServerRecord,
    /// Catalog returned on connect; empty when not connected.
    pub tools: Vec<ToolDescriptor>,
}

impl From<ConnectOutcome> for Registration {
    fn from(outcome: ConnectOutcome) -> Self {
        match outcome {
            ConnectOutcome::Connected { server, tools } => Self { server, tools },
            ConnectOutcome::Failed { server, .. } => Self {
                server,
                tools: Vec::new(),
            },
        }
    }
}

/// Tool server registry with connection management, catalog caching, and
/// tool dispatch.
///
/// Every operation that changes a server's configuration or connection time
/// writes the full set back to the store.
pub struct ToolHubService<S, K, C>
where
    S: ServerStore,
    K: ToolClientConnector,
    C: Clock + Send + Sync,
{
    registry: Arc<ServerRegistry>,
    records: ServerRecordStore<S>,
    connections: ConnectionManager<K, C>,
    catalog: ToolCatalogCache,
    dispatcher: Dispatcher,
    clock: Arc<C>,
    config: ToolRegistryConfig,
}

impl<S, K, C> ToolHubService<S, K, C>
where
    S: ServerStore,
    K: ToolClientConnector,
    C: Clock + Send + Sync,
{
    /// Creates a service with an empty registry. Call [`Self::bootstrap`]
    /// to load the stored set.
    #[must_use]
    pub fn new(
        config: ToolRegistryConfig,
        store: Arc<S>,
        connector: Arc<K>,
        clock: Arc<C>,
    ) -> Self {
        let registry = Arc::new(ServerRegistry::new());
        let deadlines = CallDeadlines::from_config(&config);
        let catalog = ToolCatalogCache::new(Arc::clone(&registry), deadlines.list_tools);
        Self {
            records: ServerRecordStore::new(store),
            connections: ConnectionManager::new(
                Arc::clone(&registry),
                connector,
                Arc::clone(&clock),
                deadlines.connect,
            ),
            dispatcher: Dispatcher::new(Arc::clone(&registry), catalog.clone(), deadlines.call),
            catalog,
            registry,
            clock,
            config,
        }
    }

    /// Loads the stored server set, replacing whatever is registered.
    ///
    /// Every loaded server starts offline and any open session is closed.
    /// Returns the number loaded.
    pub async fn bootstrap(&self) -> usize {
        let records = self.records.load().await;
        let count = records.len();
        self.connections.reset(records).await;
        count
    }

    /// Returns the shared registry.
    #[must_use]
    pub const fn registry(&self) -> &Arc<ServerRegistry> {
        &self.registry
    }

    /// Returns the active configuration.
    #[must_use]
    pub const fn config(&self) -> &ToolRegistryConfig {
        &self.config
    }

    /// Registers a server under the next free identifier and persists it.
    ///
    /// With `auto_connect` set, a connection is attempted straight away; a
    /// failed attempt still registers the server, offline.
    ///
    /// # Errors
    ///
    /// Returns [`ToolHubError::Domain`] when the name or endpoint is
    /// invalid or no identifier is left to assign.
    pub async fn register_server(
        &self,
        request: RegisterServerRequest,
    ) -> ToolHubResult<Registration> {
        let name = ServerName::new(request.name)?;
        let endpoint = ServerEndpoint::new(request.endpoint)?;
        let credential = Credential::new(request.credential);

        let server = self.registry.register_with(|id| {
            ServerRecord::new(id, name, endpoint, credential, &*self.clock)
        })?;
        info!(server_id = %server.id(), name = %server.name(), "registered tool server");
        self.records.persist(&self.registry).await;

        if !request.auto_connect {
            return Ok(Registration {
                server,
                tools: Vec::new(),
            });
        }
        let outcome = self.connections.connect(server.id()).await?;
        self.records.persist(&self.registry).await;
        Ok(outcome.into())
    }

    /// Lists every registered server in registration order.
    #[must_use]
    pub fn list_servers(&self) -> Vec<ServerRecord> {
        self.registry.records()
    }

    /// Returns the server registered under `server_id`.
    #[must_use]
    pub fn find_server(&self, server_id: ServerId) -> Option<ServerRecord> {
        self.registry.find(server_id)
    }

    /// Connects or reconnects a server and persists its connection time.
    ///
    /// # Errors
    ///
    /// Returns [`ToolHubError::NotFound`] for unknown servers.
    pub async fn connect_server(&self, server_id: ServerId) -> ToolHubResult<ConnectOutcome> {
        let outcome = self.connections.connect(server_id).await?;
        self.records.persist(&self.registry).await;
        Ok(outcome)
    }

    /// Disconnects a server and drops its cached catalog.
    ///
    /// # Errors
    ///
    /// Returns [`ToolHubError::NotFound`] for unknown servers.
    pub async fn disconnect_server(&self, server_id: ServerId) -> ToolHubResult<ServerRecord> {
        let server = self.connections.disconnect(server_id).await?;
        self.records.persist(&self.registry).await;
        Ok(server)
    }

    /// Disconnects and removes a server, then persists the remaining set.
    ///
    /// # Errors
    ///
    /// Returns [`ToolHubError::NotFound`] for unknown servers.
    pub async fn deregister_server(&self, server_id: ServerId) -> ToolHubResult<ServerRecord> {
        let mut server = self
            .registry
            .remove(server_id)
            .ok_or(ToolHubError::NotFound(server_id))?;
        server.mark_offline();
        self.connections.release(server_id).await;
        info!(server_id = %server_id, "deregistered tool server");
        self.records.persist(&self.registry).await;
        Ok(server)
    }

    /// Edits a server's name, endpoint, or credential and persists it.
    ///
    /// Connection state is untouched; a changed endpoint or credential
    /// takes effect on the next connect.
    ///
    /// # Errors
    ///
    /// Returns [`ToolHubError::Domain`] for invalid values and
    /// [`ToolHubError::NotFound`] for unknown servers.
    pub async fn update_server(
        &self,
        server_id: ServerId,
        request: UpdateServerRequest,
    ) -> ToolHubResult<ServerRecord> {
        let name = request.name.map(ServerName::new).transpose()?;
        let endpoint = request.endpoint.map(ServerEndpoint::new).transpose()?;
        let credential = request.credential.map(Credential::new);

        let server = self
            .registry
            .modify(server_id, |record| record.reconfigure(name, endpoint, credential))
            .ok_or(ToolHubError::NotFound(server_id))?;
        self.records.persist(&self.registry).await;
        Ok(server)
    }

    /// Returns the tools of an online server.
    ///
    /// # Errors
    ///
    /// Returns [`ToolHubError::NotFound`], [`ToolHubError::Offline`], or a
    /// fetch failure.
    pub async fn list_tools(&self, server_id: ServerId) -> ToolHubResult<Vec<ToolDescriptor>> {
        self.catalog.get(server_id).await
    }

    /// Returns the union of tools across online servers, unique by name.
    pub async fn list_all_online_tools(&self) -> Vec<ToolDescriptor> {
        self.catalog.list_all_online().await
    }

    /// Invokes `method` on a specific server.
    ///
    /// # Errors
    ///
    /// Returns [`ToolHubError::NotFound`], [`ToolHubError::NotConnected`],
    /// or [`ToolHubError::InvokeFailure`].
    pub async fn invoke(
        &self,
        server_id: ServerId,
        method: &str,
        params: Value,
    ) -> ToolHubResult<ToolCallResult> {
        self.dispatcher
            .invoke_by_server(server_id, method, params)
            .await
    }

    /// Invokes `tool` on the first online server able to run it.
    ///
    /// # Errors
    ///
    /// Returns [`ToolHubError::NoCapableServer`] when no server completes
    /// the call.
    pub async fn invoke_by_tool(&self, tool: &str, params: &Value) -> ToolHubResult<ToolDispatch> {
        self.dispatcher.invoke_by_tool(tool, params).await
    }

    /// Builds a health monitor sharing this service's state.
    #[must_use]
    pub fn health_monitor(&self) -> HealthMonitor<K, C> {
        HealthMonitor::new(
            Arc::clone(&self.registry),
            self.connections.clone(),
            self.catalog.clone(),
            &self.config,
        )
    }
}

impl<S, K, C> ToolHubService<S, K, C>
where
    S: ServerStore,
    K: ToolClientConnector + 'static,
    C: Clock + Send + Sync + 'static,
{
    /// Starts the periodic health monitor.
    #[must_use]
    pub fn start_health_monitor(&self) -> HealthMonitorHandle {
        self.health_monitor().spawn()
    }
}
