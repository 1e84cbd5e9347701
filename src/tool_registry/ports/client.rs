//! Transport port for live tool server connections.

use crate::tool_registry::domain::{Credential, ServerEndpoint, ToolCallResult};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Result type for tool client operations.
pub type ToolClientResult<T> = Result<T, ToolClientError>;

/// A live connection handle for one tool server.
///
/// The wire protocol is owned by the implementation. Tool catalogs are
/// returned raw, in whatever shape the server emits; the registry
/// normalizes them.
#[async_trait]
pub trait ToolClient: Send + Sync {
    /// Opens the transport session and returns the advertised tool catalog.
    async fn connect(&self) -> ToolClientResult<Vec<Value>>;

    /// Closes the transport session.
    async fn disconnect(&self) -> ToolClientResult<()>;

    /// Invokes a remote method.
    ///
    /// A tool that runs and reports failure yields
    /// `Ok(ToolCallResult { is_error: true, .. })`; `Err` means the call
    /// did not reach a working server.
    async fn invoke(&self, method: &str, params: Value) -> ToolClientResult<ToolCallResult>;

    /// Fetches the current raw tool catalog.
    async fn list_tools(&self) -> ToolClientResult<Vec<Value>>;

    /// Returns whether the transport session believes it is still live.
    fn is_connected(&self) -> bool;
}

/// Builds clients for configured servers.
pub trait ToolClientConnector: Send + Sync {
    /// Creates an unconnected client for `endpoint`.
    fn client_for(&self, endpoint: &ServerEndpoint, credential: &Credential)
    -> Arc<dyn ToolClient>;
}

/// Errors returned by tool client implementations.
#[derive(Debug, Clone, Error)]
pub enum ToolClientError {
    /// The transport failed: network, authentication, or protocol error.
    #[error("tool server transport error: {0}")]
    Transport(Arc<dyn std::error::Error + Send + Sync>),

    /// The operation did not complete within its deadline.
    #[error("tool server {operation} timed out after {after:?}")]
    Timeout {
        /// Operation that timed out.
        operation: &'static str,
        /// Deadline that elapsed.
        after: Duration,
    },

    /// The session is not connected.
    #[error("tool server session is closed")]
    Closed,
}

impl ToolClientError {
    /// Wraps a transport failure.
    pub fn transport(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Transport(Arc::new(err))
    }

    /// Creates a transport failure from a message.
    pub fn message(message: impl Into<String>) -> Self {
        Self::transport(std::io::Error::other(message.into()))
    }
}
