//! Application services for server records, connections, tool catalogs,
//! health monitoring, and dispatch.

mod catalog;
mod connection;
mod deadline;
mod dispatch;
mod error;
mod health;
mod hub;
mod records;
mod registry;

pub use catalog::ToolCatalogCache;
pub use connection::{ConnectOutcome, ConnectionManager};
pub use deadline::CallDeadlines;
pub use dispatch::{Dispatcher, ToolDispatch};
pub use error::{ToolHubError, ToolHubResult};
pub use health::{HealthMonitor, HealthMonitorHandle, HealthReport};
pub use hub::{RegisterServerRequest, Registration, ToolHubService, UpdateServerRequest};
pub use records::ServerRecordStore;
pub use registry::ServerRegistry;
