//! Adapter implementations for server store and tool client ports.

pub mod json_file;
pub mod memory;

mod runtime;

pub use runtime::{InMemoryToolClient, InMemoryToolNetwork};
