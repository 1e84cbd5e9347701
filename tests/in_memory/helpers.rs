//! Shared test helpers for in-memory tool hub integration tests.

use std::sync::Arc;

use mockable::DefaultClock;
use rstest::fixture;
use serde_json::{Value, json};
use switchyard::config::ToolRegistryConfig;
use switchyard::tool_registry::{
    adapters::{InMemoryToolNetwork, memory::InMemoryServerStore},
    domain::{ServerId, ToolDescriptor},
    services::{RegisterServerRequest, ToolHubError, ToolHubService},
};

/// Tool hub wired to in-memory adapters.
pub type TestHub = ToolHubService<InMemoryServerStore, InMemoryToolNetwork, DefaultClock>;

/// Hub plus handles on the adapters behind it.
pub struct HubContext {
    /// Backing server store.
    pub store: Arc<InMemoryServerStore>,
    /// Scripted tool server network.
    pub network: InMemoryToolNetwork,
    /// Service under test.
    pub hub: TestHub,
}

/// Provides a hub with an empty store and network.
#[fixture]
pub fn hub_context() -> HubContext {
    build_context(ToolRegistryConfig::default())
}

/// Routes hub logs to the test harness, filtered by `RUST_LOG`.
///
/// Safe to call from every test; only the first call installs a subscriber.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "switchyard=debug".into()),
        )
        .with_test_writer()
        .try_init();
}

/// Builds a hub from `config` with an empty store and network.
#[must_use]
pub fn build_context(config: ToolRegistryConfig) -> HubContext {
    init_tracing();
    let store = Arc::new(InMemoryServerStore::new());
    let network = InMemoryToolNetwork::new();
    let hub = ToolHubService::new(
        config,
        Arc::clone(&store),
        Arc::new(network.clone()),
        Arc::new(DefaultClock),
    );
    HubContext {
        store,
        network,
        hub,
    }
}

/// Returns the endpoint used for a server named `name`.
#[must_use]
pub fn endpoint_for(name: &str) -> String {
    format!("mem://{name}")
}

/// Builds raw MCP-style catalog entries for `names`.
#[must_use]
pub fn raw_tools(names: &[&str]) -> Vec<Value> {
    names
        .iter()
        .map(|name| {
            json!({
                "name": name,
                "description": format!("{name} tool"),
                "inputSchema": {"type": "object"}
            })
        })
        .collect()
}

/// Returns the names of `tools` in order.
#[must_use]
pub fn tool_names(tools: &[ToolDescriptor]) -> Vec<String> {
    tools.iter().map(|tool| tool.name().to_owned()).collect()
}

impl HubContext {
    /// Scripts a reachable server and registers it with auto-connect.
    ///
    /// # Errors
    ///
    /// Returns an error when scripting or registration fails.
    pub async fn online_server(
        &self,
        name: &str,
        tools: &[&str],
    ) -> Result<ServerId, Box<dyn std::error::Error + Send + Sync>> {
        let endpoint = endpoint_for(name);
        self.network.add_server(&endpoint, raw_tools(tools))?;
        let registration = self
            .hub
            .register_server(RegisterServerRequest::new(name, endpoint))
            .await?;
        if !registration.server.is_online() {
            return Err(format!("server {name} did not come online").into());
        }
        Ok(registration.server.id())
    }

    /// Registers a server without connecting it.
    ///
    /// # Errors
    ///
    /// Returns an error when registration fails.
    pub async fn offline_server(&self, name: &str) -> Result<ServerId, ToolHubError> {
        let registration = self
            .hub
            .register_server(
                RegisterServerRequest::new(name, endpoint_for(name)).with_auto_connect(false),
            )
            .await?;
        Ok(registration.server.id())
    }
}
