//! Port contracts for tool server persistence and transport.

mod client;
mod store;

pub use client::{ToolClient, ToolClientConnector, ToolClientError, ToolClientResult};
pub use store::{ServerStore, ServerStoreError, ServerStoreResult};
