//! Per-operation deadlines for tool client calls.

use crate::config::ToolRegistryConfig;
use crate::tool_registry::ports::{ToolClientError, ToolClientResult};
use std::future::Future;
use std::time::Duration;

/// Deadlines applied to remote operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallDeadlines {
    /// Deadline for opening a session.
    pub connect: Duration,
    /// Deadline for one tool invocation or liveness probe.
    pub call: Duration,
    /// Deadline for fetching a tool catalog.
    pub list_tools: Duration,
}

impl CallDeadlines {
    /// Reads deadlines from configuration.
    #[must_use]
    pub const fn from_config(config: &ToolRegistryConfig) -> Self {
        Self {
            connect: config.connect_timeout(),
            call: config.call_timeout(),
            list_tools: config.list_tools_timeout(),
        }
    }
}

impl Default for CallDeadlines {
    fn default() -> Self {
        Self::from_config(&ToolRegistryConfig::default())
    }
}

/// Awaits `call`, failing with [`ToolClientError::Timeout`] after `after`.
pub(crate) async fn within<T>(
    operation: &'static str,
    after: Duration,
    call: impl Future<Output = ToolClientResult<T>>,
) -> ToolClientResult<T> {
    match tokio::time::timeout(after, call).await {
        Ok(result) => result,
        Err(_elapsed) => Err(ToolClientError::Timeout { operation, after }),
    }
}
