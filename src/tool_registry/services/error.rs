//! Service-level errors for tool registry operations.

use crate::tool_registry::{
    domain::{ServerId, ToolRegistryDomainError},
    ports::ToolClientError,
};
use thiserror::Error;

/// Errors returned by the tool hub and its component services.
#[derive(Debug, Clone, Error)]
pub enum ToolHubError {
    /// Request validation failed.
    #[error(transparent)]
    Domain(#[from] ToolRegistryDomainError),

    /// No server is registered under the identifier.
    #[error("tool server {0} not found")]
    NotFound(ServerId),

    /// The server exists but is not online.
    #[error("tool server {0} is offline")]
    Offline(ServerId),

    /// The server has no live client session.
    #[error("tool server {0} has no live connection")]
    NotConnected(ServerId),

    /// The tool catalog could not be fetched.
    #[error("failed to fetch tools from server {server_id}: {source}")]
    CatalogFetch {
        /// Server that was queried.
        server_id: ServerId,
        /// Transport failure.
        source: ToolClientError,
    },

    /// A direct invocation did not reach a working server.
    #[error("invocation on tool server {server_id} failed: {source}")]
    InvokeFailure {
        /// Server that was called.
        server_id: ServerId,
        /// Transport failure.
        source: ToolClientError,
    },

    /// No online server advertising the tool completed the call.
    #[error("no online tool server could run '{tool}' ({attempted} attempted)")]
    NoCapableServer {
        /// Requested tool name.
        tool: String,
        /// Number of capable servers that were tried.
        attempted: usize,
    },
}

/// Result type for tool hub operations.
pub type ToolHubResult<T> = Result<T, ToolHubError>;
