//! JSON file adapter for the server store.

mod models;
mod repository;

pub use models::StoredServerRow;
pub use repository::JsonFileServerStore;
