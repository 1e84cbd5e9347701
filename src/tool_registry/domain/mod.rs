//! Domain model for tool server records and tool discovery.
//!
//! The tool registry domain models server identity and configuration,
//! observed connection state, and normalized tool metadata. Transport and
//! storage concerns remain outside this boundary.

mod error;
mod ids;
mod server;
pub mod timestamp;
mod tool;

pub use error::{ToolRegistryDomainError, ToolShapeError};
pub use ids::{Credential, ServerEndpoint, ServerId, ServerName};
pub use server::{PersistedServerData, ServerRecord, ServerStatus};
pub use tool::{NormalizedCatalog, ToolCallResult, ToolDescriptor, normalize_catalog};
