//! Per-server tool catalog cache.

use super::deadline::within;
use super::error::{ToolHubError, ToolHubResult};
use super::registry::ServerRegistry;
use crate::tool_registry::domain::{ServerId, ToolDescriptor, normalize_catalog};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Normalizes a raw catalog fetched from `server_id`, logging every entry
/// that was dropped.
pub(crate) fn normalize_for(server_id: ServerId, raw_tools: &[Value]) -> Vec<ToolDescriptor> {
    let catalog = normalize_catalog(raw_tools);
    for rejected in &catalog.rejected {
        warn!(server_id = %server_id, error = %rejected, "ignoring unusable tool entry");
    }
    for name in &catalog.duplicates {
        debug!(server_id = %server_id, tool = %name, "ignoring repeated tool name");
    }
    catalog.tools
}

/// Cached tool catalogs, fetched lazily from online servers.
#[derive(Debug, Clone)]
pub struct ToolCatalogCache {
    registry: Arc<ServerRegistry>,
    list_tools_timeout: Duration,
}

impl ToolCatalogCache {
    /// Creates a cache over `registry`.
    #[must_use]
    pub const fn new(registry: Arc<ServerRegistry>, list_tools_timeout: Duration) -> Self {
        Self {
            registry,
            list_tools_timeout,
        }
    }

    /// Returns the tools of an online server, fetching them on a miss.
    ///
    /// An empty cached catalog counts as a miss.
    ///
    /// # Errors
    ///
    /// Returns [`ToolHubError::NotFound`] for unknown servers,
    /// [`ToolHubError::Offline`] for offline ones, and
    /// [`ToolHubError::CatalogFetch`] when the fetch fails.
    pub async fn get(&self, server_id: ServerId) -> ToolHubResult<Vec<ToolDescriptor>> {
        let record = self
            .registry
            .find(server_id)
            .ok_or(ToolHubError::NotFound(server_id))?;
        if !record.is_online() {
            return Err(ToolHubError::Offline(server_id));
        }
        if let Some(cached) = self
            .registry
            .catalog(server_id)
            .filter(|tools| !tools.is_empty())
        {
            return Ok(cached);
        }

        let client = self
            .registry
            .client(server_id)
            .ok_or(ToolHubError::NotConnected(server_id))?;
        let raw = within("list_tools", self.list_tools_timeout, client.list_tools())
            .await
            .map_err(|source| ToolHubError::CatalogFetch { server_id, source })?;
        let tools = normalize_for(server_id, &raw);
        self.store(server_id, tools.clone());
        Ok(tools)
    }

    /// Replaces the cached catalog for `server_id`.
    pub fn store(&self, server_id: ServerId, tools: Vec<ToolDescriptor>) {
        self.registry.set_catalog(server_id, tools);
    }

    /// Drops the cached catalog for `server_id`.
    pub fn invalidate(&self, server_id: ServerId) {
        self.registry.remove_catalog(server_id);
    }

    /// Drops every cached catalog.
    pub fn clear(&self) {
        self.registry.clear_catalogs();
    }

    /// Returns the union of tools across online servers.
    ///
    /// Servers are visited in registration order and the first server to
    /// advertise a name keeps it. Servers whose catalog cannot be fetched
    /// are skipped.
    pub async fn list_all_online(&self) -> Vec<ToolDescriptor> {
        let mut owners: HashMap<String, ServerId> = HashMap::new();
        let mut merged = Vec::new();

        for record in self.registry.online_records() {
            let server_id = record.id();
            let tools = match self.get(server_id).await {
                Ok(tools) => tools,
                Err(err) => {
                    warn!(
                        server_id = %server_id,
                        error = %err,
                        "skipping server while merging tools"
                    );
                    continue;
                }
            };
            for tool in tools {
                if let Some(owner) = owners.get(tool.name()) {
                    debug!(
                        tool = tool.name(),
                        kept = %owner,
                        dropped = %server_id,
                        "tool name already provided by another server"
                    );
                    continue;
                }
                owners.insert(tool.name().to_owned(), server_id);
                merged.push(tool);
            }
        }

        merged
    }
}
