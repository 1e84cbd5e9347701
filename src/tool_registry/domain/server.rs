//! Tool server record aggregate.

use super::{Credential, ServerEndpoint, ServerId, ServerName, timestamp};
use chrono::NaiveDateTime;
use mockable::Clock;
use serde::{Serialize, Serializer};
use std::fmt;
use std::time::Duration;

/// Connection status of a tool server.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ServerStatus {
    /// No live client exists, or the last connection attempt failed.
    #[default]
    Offline,
    /// A live client is held for the server.
    Online,
}

impl ServerStatus {
    /// Returns the canonical string representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Offline => "offline",
            Self::Online => "online",
        }
    }
}

impl fmt::Display for ServerStatus {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Identity, configuration, and observed connection state of a tool server.
///
/// Status, latency, and connection time can only be changed from inside the
/// crate, by the connection manager and the health monitor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServerRecord {
    id: ServerId,
    name: ServerName,
    endpoint: ServerEndpoint,
    #[serde(skip)]
    credential: Credential,
    status: ServerStatus,
    #[serde(rename = "latency_ms", serialize_with = "serialize_millis")]
    latency: Duration,
    #[serde(serialize_with = "serialize_connection_time")]
    connection_time: Option<NaiveDateTime>,
}

/// Parameter object for reconstructing a record from storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedServerData {
    /// Persisted server identifier.
    pub id: ServerId,
    /// Persisted server name.
    pub name: ServerName,
    /// Persisted endpoint.
    pub endpoint: ServerEndpoint,
    /// Persisted credential.
    pub credential: Credential,
    /// Persisted last-connection time.
    pub connection_time: Option<NaiveDateTime>,
}

impl ServerRecord {
    /// Creates a new, offline record stamped with the registration time.
    #[must_use]
    pub fn new(
        id: ServerId,
        name: ServerName,
        endpoint: ServerEndpoint,
        credential: Credential,
        clock: &impl Clock,
    ) -> Self {
        Self {
            id,
            name,
            endpoint,
            credential,
            status: ServerStatus::Offline,
            latency: Duration::ZERO,
            connection_time: Some(clock.local().naive_local()),
        }
    }

    /// Reconstructs a record from storage.
    ///
    /// Persisted liveness is never trusted: the record always starts
    /// offline with zero latency.
    #[must_use]
    pub fn from_persisted(data: PersistedServerData) -> Self {
        Self {
            id: data.id,
            name: data.name,
            endpoint: data.endpoint,
            credential: data.credential,
            status: ServerStatus::Offline,
            latency: Duration::ZERO,
            connection_time: data.connection_time,
        }
    }

    /// Returns the configuration fields that are written to storage.
    #[must_use]
    pub fn to_persisted(&self) -> PersistedServerData {
        PersistedServerData {
            id: self.id,
            name: self.name.clone(),
            endpoint: self.endpoint.clone(),
            credential: self.credential.clone(),
            connection_time: self.connection_time,
        }
    }

    /// Returns the server identifier.
    #[must_use]
    pub const fn id(&self) -> ServerId {
        self.id
    }

    /// Returns the server name.
    #[must_use]
    pub const fn name(&self) -> &ServerName {
        &self.name
    }

    /// Returns the connection endpoint.
    #[must_use]
    pub const fn endpoint(&self) -> &ServerEndpoint {
        &self.endpoint
    }

    /// Returns the credential presented on connect.
    #[must_use]
    pub const fn credential(&self) -> &Credential {
        &self.credential
    }

    /// Returns the connection status.
    #[must_use]
    pub const fn status(&self) -> ServerStatus {
        self.status
    }

    /// Returns whether the server is online.
    #[must_use]
    pub const fn is_online(&self) -> bool {
        matches!(self.status, ServerStatus::Online)
    }

    /// Returns the latency measured by the last successful connect.
    #[must_use]
    pub const fn latency(&self) -> Duration {
        self.latency
    }

    /// Returns the time of the last connection attempt, if any.
    #[must_use]
    pub const fn connection_time(&self) -> Option<NaiveDateTime> {
        self.connection_time
    }

    /// Replaces configuration fields. Connection state is left untouched.
    pub(crate) fn reconfigure(
        &mut self,
        name: Option<ServerName>,
        endpoint: Option<ServerEndpoint>,
        credential: Option<Credential>,
    ) {
        if let Some(value) = name {
            self.name = value;
        }
        if let Some(value) = endpoint {
            self.endpoint = value;
        }
        if let Some(value) = credential {
            self.credential = value;
        }
    }

    /// Records a successful connection.
    pub(crate) fn mark_online(&mut self, latency: Duration, clock: &impl Clock) {
        self.status = ServerStatus::Online;
        self.latency = latency;
        self.connection_time = Some(clock.local().naive_local());
    }

    /// Records a failed connection attempt.
    pub(crate) fn mark_connect_failed(&mut self, clock: &impl Clock) {
        self.mark_offline();
        self.connection_time = Some(clock.local().naive_local());
    }

    /// Forces the record offline and resets latency.
    pub(crate) const fn mark_offline(&mut self) {
        self.status = ServerStatus::Offline;
        self.latency = Duration::ZERO;
    }
}

fn serialize_millis<S: Serializer>(latency: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    let millis = u64::try_from(latency.as_millis()).unwrap_or(u64::MAX);
    serializer.serialize_u64(millis)
}

fn serialize_connection_time<S: Serializer>(
    value: &Option<NaiveDateTime>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&timestamp::format_connection_time(*value))
}
