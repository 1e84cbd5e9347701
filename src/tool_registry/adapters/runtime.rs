//! In-memory tool server network for tests and local orchestration.

use crate::tool_registry::{
    domain::{Credential, ServerEndpoint, ToolCallResult, ToolDescriptor},
    ports::{ToolClient, ToolClientConnector, ToolClientError, ToolClientResult},
};
use async_trait::async_trait;
use serde_json::{Value, json};
use std::collections::{HashMap, HashSet};
use std::fmt::Display;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock, RwLockWriteGuard};
use std::time::Duration;

/// Method answered by every scripted server as a liveness probe.
const PROBE_METHOD: &str = "ping";

/// Scripted network of tool servers keyed by endpoint.
///
/// This adapter models connection, liveness, and invocation behaviour
/// without any wire protocol. Tests script each endpoint (reachability,
/// credential, catalog, per-tool responses) and then hand the network to
/// the registry as its [`ToolClientConnector`].
#[derive(Debug, Clone, Default)]
pub struct InMemoryToolNetwork {
    state: Arc<RwLock<NetworkState>>,
}

#[derive(Debug, Default)]
struct NetworkState {
    servers: HashMap<String, ScriptedServer>,
}

#[derive(Debug, Default)]
struct ScriptedServer {
    reachable: bool,
    required_credential: Option<String>,
    tools: Vec<Value>,
    responses: HashMap<String, Value>,
    failing_tools: HashSet<String>,
    probe_fails: bool,
    connect_delay: Duration,
    connect_attempts: usize,
    invocations: Vec<String>,
    sessions: Vec<Arc<AtomicBool>>,
}

fn lock_error(err: impl Display) -> ToolClientError {
    ToolClientError::message(err.to_string())
}

fn refused(endpoint: &str) -> ToolClientError {
    ToolClientError::message(format!("connection refused by {endpoint}"))
}

impl InMemoryToolNetwork {
    /// Creates an empty network; every endpoint refuses connections.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn with_server<T>(
        &self,
        endpoint: &str,
        update: impl FnOnce(&mut ScriptedServer) -> T,
    ) -> ToolClientResult<T> {
        let mut state = self.state.write().map_err(lock_error)?;
        let server = state.servers.entry(endpoint.to_owned()).or_default();
        Ok(update(server))
    }

    /// Adds a reachable server at `endpoint` advertising `tools`.
    ///
    /// An existing script for the endpoint is replaced, but live sessions
    /// are kept.
    ///
    /// # Errors
    ///
    /// Returns runtime errors when lock acquisition fails.
    pub fn add_server(&self, endpoint: &str, tools: Vec<Value>) -> ToolClientResult<()> {
        self.with_server(endpoint, |server| {
            let sessions = std::mem::take(&mut server.sessions);
            *server = ScriptedServer {
                reachable: true,
                tools,
                sessions,
                ..ScriptedServer::default()
            };
        })
    }

    /// Makes the server accept or refuse traffic.
    ///
    /// Existing sessions keep reporting themselves live; their calls fail.
    ///
    /// # Errors
    ///
    /// Returns runtime errors when lock acquisition fails.
    pub fn set_reachable(&self, endpoint: &str, reachable: bool) -> ToolClientResult<()> {
        self.with_server(endpoint, |server| server.reachable = reachable)
    }

    /// Marks every live session to the endpoint as disconnected.
    ///
    /// # Errors
    ///
    /// Returns runtime errors when lock acquisition fails.
    pub fn sever_sessions(&self, endpoint: &str) -> ToolClientResult<()> {
        self.with_server(endpoint, |server| {
            for session in server.sessions.drain(..) {
                session.store(false, Ordering::SeqCst);
            }
        })
    }

    /// Replaces the advertised tool catalog.
    ///
    /// # Errors
    ///
    /// Returns runtime errors when lock acquisition fails.
    pub fn set_tools(&self, endpoint: &str, tools: Vec<Value>) -> ToolClientResult<()> {
        self.with_server(endpoint, |server| server.tools = tools)
    }

    /// Requires `credential` on connect.
    ///
    /// # Errors
    ///
    /// Returns runtime errors when lock acquisition fails.
    pub fn require_credential(&self, endpoint: &str, credential: &str) -> ToolClientResult<()> {
        self.with_server(endpoint, |server| {
            server.required_credential = Some(credential.to_owned());
        })
    }

    /// Sets the payload returned when `tool` is invoked.
    ///
    /// # Errors
    ///
    /// Returns runtime errors when lock acquisition fails.
    pub fn set_response(
        &self,
        endpoint: &str,
        tool: &str,
        response: Value,
    ) -> ToolClientResult<()> {
        self.with_server(endpoint, |server| {
            server.responses.insert(tool.to_owned(), response);
        })
    }

    /// Makes `tool` run and report an error.
    ///
    /// # Errors
    ///
    /// Returns runtime errors when lock acquisition fails.
    pub fn fail_tool(&self, endpoint: &str, tool: &str) -> ToolClientResult<()> {
        self.with_server(endpoint, |server| {
            server.failing_tools.insert(tool.to_owned());
        })
    }

    /// Makes the liveness probe fail while the server stays reachable.
    ///
    /// # Errors
    ///
    /// Returns runtime errors when lock acquisition fails.
    pub fn set_probe_failing(&self, endpoint: &str, failing: bool) -> ToolClientResult<()> {
        self.with_server(endpoint, |server| server.probe_fails = failing)
    }

    /// Delays every connect to the endpoint.
    ///
    /// # Errors
    ///
    /// Returns runtime errors when lock acquisition fails.
    pub fn set_connect_delay(&self, endpoint: &str, delay: Duration) -> ToolClientResult<()> {
        self.with_server(endpoint, |server| server.connect_delay = delay)
    }

    /// Returns how many connects have been attempted against the endpoint.
    ///
    /// # Errors
    ///
    /// Returns runtime errors when lock acquisition fails.
    pub fn connect_attempts(&self, endpoint: &str) -> ToolClientResult<usize> {
        let state = self.state.read().map_err(lock_error)?;
        Ok(state
            .servers
            .get(endpoint)
            .map_or(0, |server| server.connect_attempts))
    }

    /// Returns the methods invoked on the endpoint, in call order.
    ///
    /// # Errors
    ///
    /// Returns runtime errors when lock acquisition fails.
    pub fn invocations(&self, endpoint: &str) -> ToolClientResult<Vec<String>> {
        let state = self.state.read().map_err(lock_error)?;
        Ok(state
            .servers
            .get(endpoint)
            .map(|server| server.invocations.clone())
            .unwrap_or_default())
    }
}

impl ToolClientConnector for InMemoryToolNetwork {
    fn client_for(
        &self,
        endpoint: &ServerEndpoint,
        credential: &Credential,
    ) -> Arc<dyn ToolClient> {
        Arc::new(InMemoryToolClient {
            endpoint: endpoint.as_str().to_owned(),
            credential: credential.expose().to_owned(),
            state: Arc::clone(&self.state),
            connected: Arc::new(AtomicBool::new(false)),
        })
    }
}

/// Client handed out by [`InMemoryToolNetwork`].
#[derive(Debug)]
pub struct InMemoryToolClient {
    endpoint: String,
    credential: String,
    state: Arc<RwLock<NetworkState>>,
    connected: Arc<AtomicBool>,
}

impl InMemoryToolClient {
    fn write_state(&self) -> ToolClientResult<RwLockWriteGuard<'_, NetworkState>> {
        self.state.write().map_err(lock_error)
    }

    fn ensure_connected(&self) -> ToolClientResult<()> {
        if self.connected.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(ToolClientError::Closed)
        }
    }

    fn live_server<'state>(
        &self,
        state: &'state mut NetworkState,
    ) -> ToolClientResult<&'state mut ScriptedServer> {
        state
            .servers
            .get_mut(&self.endpoint)
            .filter(|server| server.reachable)
            .ok_or_else(|| refused(&self.endpoint))
    }
}

#[async_trait]
impl ToolClient for InMemoryToolClient {
    async fn connect(&self) -> ToolClientResult<Vec<Value>> {
        let delay = {
            let mut state = self.write_state()?;
            let server = state
                .servers
                .get_mut(&self.endpoint)
                .ok_or_else(|| refused(&self.endpoint))?;
            server.connect_attempts = server.connect_attempts.saturating_add(1);
            server.connect_delay
        };
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let mut state = self.write_state()?;
        let server = self.live_server(&mut state)?;
        if let Some(required) = server.required_credential.as_deref()
            && required != self.credential
        {
            return Err(ToolClientError::message(format!(
                "credential rejected by {}",
                self.endpoint
            )));
        }

        self.connected.store(true, Ordering::SeqCst);
        server.sessions.push(Arc::clone(&self.connected));
        Ok(server.tools.clone())
    }

    async fn disconnect(&self) -> ToolClientResult<()> {
        self.connected.store(false, Ordering::SeqCst);
        let mut state = self.write_state()?;
        if let Some(server) = state.servers.get_mut(&self.endpoint) {
            server
                .sessions
                .retain(|session| !Arc::ptr_eq(session, &self.connected));
        }
        Ok(())
    }

    async fn invoke(&self, method: &str, params: Value) -> ToolClientResult<ToolCallResult> {
        self.ensure_connected()?;
        let mut state = self.write_state()?;
        let server = self.live_server(&mut state)?;
        server.invocations.push(method.to_owned());

        if method == PROBE_METHOD {
            if server.probe_fails {
                return Err(ToolClientError::message("liveness probe failed"));
            }
            return Ok(ToolCallResult::success(json!({"pong": true})));
        }

        if server.failing_tools.contains(method) {
            return Ok(ToolCallResult::error(json!({
                "message": format!("tool {method} failed"),
            })));
        }

        let advertised = server.tools.iter().any(|raw| {
            ToolDescriptor::from_raw(raw).is_ok_and(|tool| tool.name() == method)
        });
        if !advertised {
            return Err(ToolClientError::message(format!("unknown tool: {method}")));
        }

        let content = server.responses.get(method).cloned().unwrap_or_else(|| {
            json!({"tool": method, "params": params, "endpoint": self.endpoint})
        });
        Ok(ToolCallResult::success(content))
    }

    async fn list_tools(&self) -> ToolClientResult<Vec<Value>> {
        self.ensure_connected()?;
        let mut state = self.write_state()?;
        let server = self.live_server(&mut state)?;
        Ok(server.tools.clone())
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }
}
