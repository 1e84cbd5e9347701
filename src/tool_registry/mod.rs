//! Tool server registry, connection supervision, and tool dispatch.
//!
//! The module follows hexagonal architecture:
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Orchestration services in [`services`]
//!
//! [`services::ToolHubService`] is the entry point. It owns the shared
//! [`services::ServerRegistry`] and hands it to the connection manager,
//! catalog cache, dispatcher, and health monitor.

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;
