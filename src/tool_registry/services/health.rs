//! Periodic liveness checking and reconnection.

use super::catalog::{ToolCatalogCache, normalize_for};
use super::connection::{ConnectOutcome, ConnectionManager};
use super::deadline::{CallDeadlines, within};
use super::registry::ServerRegistry;
use crate::config::ToolRegistryConfig;
use crate::tool_registry::{
    domain::{ServerId, ToolDescriptor},
    ports::{ToolClientConnector, ToolClientError},
};
use mockable::Clock;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::{debug, error, info, warn};

/// Servers touched by one health-check cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HealthReport {
    /// Servers that were online when the cycle started.
    pub checked: Vec<ServerId>,
    /// Servers that passed every check.
    pub healthy: Vec<ServerId>,
    /// Servers that failed a check and reconnected.
    pub reconnected: Vec<ServerId>,
    /// Servers that failed a check and could not reconnect.
    pub failed: Vec<ServerId>,
}

enum Verdict {
    Healthy,
    Reconnected,
    Failed,
    Removed,
}

enum Probe {
    Healthy(Vec<ToolDescriptor>),
    Stale(&'static str),
    Broken(ToolClientError),
}

/// Checks every online server and reconnects the ones that stopped
/// answering.
///
/// A check passes when the session still reports itself connected, the
/// liveness probe succeeds, and the server returns a non-empty catalog. A
/// passing check refreshes the cached catalog.
pub struct HealthMonitor<K, C>
where
    K: ToolClientConnector,
    C: Clock + Send + Sync,
{
    registry: Arc<ServerRegistry>,
    connections: ConnectionManager<K, C>,
    catalog: ToolCatalogCache,
    deadlines: CallDeadlines,
    interval: Duration,
    probe_method: Arc<str>,
}

impl<K, C> Clone for HealthMonitor<K, C>
where
    K: ToolClientConnector,
    C: Clock + Send + Sync,
{
    fn clone(&self) -> Self {
        Self {
            registry: Arc::clone(&self.registry),
            connections: self.connections.clone(),
            catalog: self.catalog.clone(),
            deadlines: self.deadlines,
            interval: self.interval,
            probe_method: Arc::clone(&self.probe_method),
        }
    }
}

impl<K, C> HealthMonitor<K, C>
where
    K: ToolClientConnector,
    C: Clock + Send + Sync,
{
    /// Creates a monitor using the interval, probe, and deadlines in
    /// `config`.
    #[must_use]
    pub fn new(
        registry: Arc<ServerRegistry>,
        connections: ConnectionManager<K, C>,
        catalog: ToolCatalogCache,
        config: &ToolRegistryConfig,
    ) -> Self {
        Self {
            registry,
            connections,
            catalog,
            deadlines: CallDeadlines::from_config(config),
            interval: config.health_check_interval(),
            probe_method: Arc::from(config.probe_method.as_str()),
        }
    }

    /// Returns the pause between cycles.
    #[must_use]
    pub const fn interval(&self) -> Duration {
        self.interval
    }

    async fn check_server(&self, server_id: ServerId) -> Verdict {
        match self.probe(server_id).await {
            Probe::Healthy(tools) => {
                self.catalog.store(server_id, tools);
                Verdict::Healthy
            }
            Probe::Stale(reason) => {
                warn!(server_id = %server_id, reason, "tool server unhealthy, reconnecting");
                self.reconnect(server_id).await
            }
            Probe::Broken(err) => {
                warn!(
                    server_id = %server_id,
                    error = %err,
                    "health check failed, reconnecting"
                );
                self.connections.mark_offline(server_id);
                self.reconnect(server_id).await
            }
        }
    }

    async fn probe(&self, server_id: ServerId) -> Probe {
        let Some(client) = self
            .connections
            .client(server_id)
            .filter(|client| client.is_connected())
        else {
            return Probe::Stale("session closed");
        };

        match within(
            "probe",
            self.deadlines.call,
            client.invoke(&self.probe_method, json!({})),
        )
        .await
        {
            Ok(result) if result.is_error() => {
                return Probe::Stale("liveness probe reported an error");
            }
            Ok(_) => {}
            Err(err) => return Probe::Broken(err),
        }

        match within("list_tools", self.deadlines.list_tools, client.list_tools()).await {
            Ok(raw_tools) => {
                let tools = normalize_for(server_id, &raw_tools);
                if tools.is_empty() {
                    Probe::Stale("empty tool catalog")
                } else {
                    Probe::Healthy(tools)
                }
            }
            Err(err) => Probe::Broken(err),
        }
    }

    async fn reconnect(&self, server_id: ServerId) -> Verdict {
        match self.connections.connect(server_id).await {
            Ok(ConnectOutcome::Connected { .. }) => Verdict::Reconnected,
            Ok(ConnectOutcome::Failed { .. }) => Verdict::Failed,
            Err(err) => {
                debug!(
                    server_id = %server_id,
                    error = %err,
                    "server removed during health check"
                );
                Verdict::Removed
            }
        }
    }
}

impl<K, C> HealthMonitor<K, C>
where
    K: ToolClientConnector + 'static,
    C: Clock + Send + Sync + 'static,
{
    /// Runs one check over every server that is online right now.
    ///
    /// Servers are checked one at a time, each in its own task. A failing
    /// server is reconnected before the next one is checked; a server whose
    /// check panics is forced offline and its session abandoned.
    pub async fn check_once(&self) -> HealthReport {
        let mut report = HealthReport::default();

        for record in self.registry.online_records() {
            let server_id = record.id();
            report.checked.push(server_id);
            let monitor = self.clone();
            let verdict = tokio::spawn(async move { monitor.check_server(server_id).await })
                .await
                .unwrap_or_else(|err| {
                    error!(server_id = %server_id, error = %err, "health check aborted");
                    self.connections.abandon(server_id);
                    Verdict::Failed
                });
            match verdict {
                Verdict::Healthy => report.healthy.push(server_id),
                Verdict::Reconnected => report.reconnected.push(server_id),
                Verdict::Failed => report.failed.push(server_id),
                Verdict::Removed => {}
            }
        }

        debug!(
            checked = report.checked.len(),
            healthy = report.healthy.len(),
            reconnected = report.reconnected.len(),
            failed = report.failed.len(),
            "health check cycle finished"
        );
        report
    }

    /// Starts the periodic loop on the current Tokio runtime.
    ///
    /// The first cycle runs one interval after start. Each cycle runs in
    /// its own task so a failure outside a single server check cannot stop
    /// the loop.
    #[must_use]
    pub fn spawn(self) -> HealthMonitorHandle {
        let token = CancellationToken::new();
        let cancelled = token.clone();
        let task = tokio::spawn(self.run(cancelled));
        HealthMonitorHandle {
            guard: token.drop_guard(),
            task,
        }
    }

    async fn run(self, token: CancellationToken) {
        info!(interval = ?self.interval, "tool server health monitor started");
        loop {
            tokio::select! {
                () = token.cancelled() => break,
                () = tokio::time::sleep(self.interval) => {}
            }
            let monitor = self.clone();
            let cycle = tokio::spawn(async move { monitor.check_once().await });
            if let Err(err) = cycle.await {
                error!(error = %err, "health check cycle aborted");
            }
        }
        info!("tool server health monitor stopped");
    }
}

/// Handle to a running [`HealthMonitor`].
///
/// Dropping the handle cancels the loop; [`Self::shutdown`] also waits for
/// the in-flight cycle to finish.
#[derive(Debug)]
pub struct HealthMonitorHandle {
    guard: DropGuard,
    task: JoinHandle<()>,
}

impl HealthMonitorHandle {
    /// Stops the loop and waits for it to exit.
    pub async fn shutdown(self) {
        let Self { guard, task } = self;
        drop(guard);
        if let Err(err) = task.await {
            warn!(error = %err, "health monitor task ended abnormally");
        }
    }

    /// Returns whether the loop has exited.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}
