//! Switchyard: a registry and dispatcher for remote tool servers.
//!
//! The crate keeps a persisted set of tool servers, opens and supervises
//! live sessions to them, caches what tools each one advertises, and routes
//! tool calls to whichever online server can run them.
//!
//! # Modules
//!
//! - [`config`]: TOML-backed runtime settings
//! - [`tool_registry`]: server records, connections, catalogs, health
//!   monitoring, and dispatch

pub mod config;
pub mod tool_registry;
