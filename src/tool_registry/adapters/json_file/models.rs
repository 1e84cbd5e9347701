//! On-disk row model for stored server configuration.

use crate::tool_registry::domain::{
    Credential, PersistedServerData, ServerEndpoint, ServerId, ServerName,
    ToolRegistryDomainError, timestamp,
};
use serde::{Deserialize, Serialize};

/// One element of the stored server array.
///
/// Runtime fields such as `status` or `latency` found in older files are
/// ignored on read and never written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredServerRow {
    /// Server identifier.
    pub id: u64,
    /// Display name.
    pub name: String,
    /// Connection endpoint.
    #[serde(alias = "ip")]
    pub endpoint: String,
    /// Last connection time as `YYYY-MM-DD HH:MM:SS`; empty when never
    /// connected.
    #[serde(default)]
    pub connection_time: String,
    /// Credential presented on connect.
    #[serde(default)]
    pub key: String,
}

impl StoredServerRow {
    /// Validates the row into persisted domain data.
    ///
    /// # Errors
    ///
    /// Returns [`ToolRegistryDomainError`] when the name or endpoint is
    /// blank.
    pub fn into_persisted(self) -> Result<PersistedServerData, ToolRegistryDomainError> {
        Ok(PersistedServerData {
            id: ServerId::new(self.id),
            name: ServerName::new(self.name)?,
            endpoint: ServerEndpoint::new(self.endpoint)?,
            credential: Credential::new(self.key),
            connection_time: timestamp::parse_connection_time(&self.connection_time),
        })
    }
}

impl From<&PersistedServerData> for StoredServerRow {
    fn from(data: &PersistedServerData) -> Self {
        Self {
            id: data.id.value(),
            name: data.name.as_str().to_owned(),
            endpoint: data.endpoint.as_str().to_owned(),
            connection_time: timestamp::format_connection_time(data.connection_time),
            key: data.credential.expose().to_owned(),
        }
    }
}
