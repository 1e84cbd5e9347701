//! Tool invocation routing with failover.

use super::catalog::ToolCatalogCache;
use super::deadline::within;
use super::error::{ToolHubError, ToolHubResult};
use super::registry::ServerRegistry;
use crate::tool_registry::domain::{ServerId, ServerName, ToolCallResult};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// A successful call routed by tool name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDispatch {
    /// Result returned by the server.
    pub result: ToolCallResult,
    /// Server that produced the result.
    pub server_id: ServerId,
    /// Name of that server.
    pub server_name: ServerName,
}

/// Routes invocations to a named server or to any server offering a tool.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    registry: Arc<ServerRegistry>,
    catalog: ToolCatalogCache,
    call_timeout: Duration,
}

impl Dispatcher {
    /// Creates a dispatcher.
    #[must_use]
    pub const fn new(
        registry: Arc<ServerRegistry>,
        catalog: ToolCatalogCache,
        call_timeout: Duration,
    ) -> Self {
        Self {
            registry,
            catalog,
            call_timeout,
        }
    }

    /// Invokes `method` on one server.
    ///
    /// A tool that runs and reports failure is returned as-is.
    ///
    /// # Errors
    ///
    /// Returns [`ToolHubError::NotFound`], [`ToolHubError::NotConnected`]
    /// when no session is open, or [`ToolHubError::InvokeFailure`] when the
    /// call does not reach a working server.
    pub async fn invoke_by_server(
        &self,
        server_id: ServerId,
        method: &str,
        params: Value,
    ) -> ToolHubResult<ToolCallResult> {
        self.registry
            .find(server_id)
            .ok_or(ToolHubError::NotFound(server_id))?;
        let client = self
            .registry
            .client(server_id)
            .ok_or(ToolHubError::NotConnected(server_id))?;

        within("invoke", self.call_timeout, client.invoke(method, params))
            .await
            .map_err(|source| ToolHubError::InvokeFailure { server_id, source })
    }

    /// Invokes `tool` on the first online server that advertises it and
    /// completes the call.
    ///
    /// Servers are tried in registration order. A server whose call fails
    /// in transport or whose tool reports an error is skipped in favour of
    /// the next capable one.
    ///
    /// # Errors
    ///
    /// Returns [`ToolHubError::NoCapableServer`] when every capable server
    /// failed or none advertises the tool.
    pub async fn invoke_by_tool(&self, tool: &str, params: &Value) -> ToolHubResult<ToolDispatch> {
        let mut attempted = 0_usize;

        for record in self.registry.online_records() {
            let server_id = record.id();
            let advertised = match self.catalog.get(server_id).await {
                Ok(tools) => tools.iter().any(|candidate| candidate.name() == tool),
                Err(err) => {
                    debug!(
                        server_id = %server_id,
                        error = %err,
                        "catalog unavailable, skipping server"
                    );
                    false
                }
            };
            if !advertised {
                continue;
            }
            let Some(client) = self.registry.client(server_id) else {
                continue;
            };

            attempted = attempted.saturating_add(1);
            match within("invoke", self.call_timeout, client.invoke(tool, params.clone())).await {
                Ok(result) if !result.is_error() => {
                    return Ok(ToolDispatch {
                        result,
                        server_id,
                        server_name: record.name().clone(),
                    });
                }
                Ok(result) => warn!(
                    server_id = %server_id,
                    tool,
                    content = %result.content(),
                    "tool reported an error, trying next server"
                ),
                Err(err) => warn!(
                    server_id = %server_id,
                    tool,
                    error = %err,
                    "tool call failed, trying next server"
                ),
            }
        }

        Err(ToolHubError::NoCapableServer {
            tool: tool.to_owned(),
            attempted,
        })
    }
}
