//! Restart behaviour of the tool hub against the JSON file store.

use camino::Utf8PathBuf;
use mockable::DefaultClock;
use serde_json::json;
use std::sync::Arc;
use switchyard::config::ToolRegistryConfig;
use switchyard::tool_registry::{
    adapters::{InMemoryToolNetwork, json_file::JsonFileServerStore},
    domain::{ServerId, ServerStatus},
    services::{RegisterServerRequest, ToolHubService},
};
use tempfile::TempDir;

use super::helpers::{endpoint_for, raw_tools};

type FileHub = ToolHubService<JsonFileServerStore, InMemoryToolNetwork, DefaultClock>;

fn store_path(temp: &TempDir) -> Utf8PathBuf {
    Utf8PathBuf::from_path_buf(temp.path().join("data").join("mcp_servers.json"))
        .expect("utf-8 temp path")
}

fn open_hub(path: &Utf8PathBuf, network: &InMemoryToolNetwork) -> FileHub {
    let config = ToolRegistryConfig::default().with_store_path(path.clone());
    let store = JsonFileServerStore::from_config(&config).expect("store opens");
    ToolHubService::new(
        config,
        Arc::new(store),
        Arc::new(network.clone()),
        Arc::new(DefaultClock),
    )
}

#[tokio::test(flavor = "multi_thread")]
async fn registered_servers_survive_a_restart_offline() {
    let temp = tempfile::tempdir().expect("temp dir");
    let path = store_path(&temp);
    let network = InMemoryToolNetwork::new();
    network
        .add_server(&endpoint_for("alpha"), raw_tools(&["search"]))
        .expect("script server");

    let first = open_hub(&path, &network);
    first.bootstrap().await;
    first
        .register_server(
            RegisterServerRequest::new("alpha", endpoint_for("alpha")).with_credential("k1"),
        )
        .await
        .expect("registration succeeds");

    let restarted = open_hub(&path, &network);
    let loaded = restarted.bootstrap().await;
    let servers = restarted.list_servers();

    assert_eq!(loaded, 1);
    let alpha = servers.first().expect("alpha restored");
    assert_eq!(alpha.id(), ServerId::new(1));
    assert_eq!(alpha.status(), ServerStatus::Offline);
    assert_eq!(alpha.credential().expose(), "k1");
    assert!(alpha.connection_time().is_some());
}

#[tokio::test(flavor = "multi_thread")]
async fn corrupt_file_starts_with_no_servers() {
    let temp = tempfile::tempdir().expect("temp dir");
    let path = store_path(&temp);
    let network = InMemoryToolNetwork::new();
    let hub = open_hub(&path, &network);
    std::fs::write(&path, "{ definitely not a server list").expect("seed file");

    let loaded = hub.bootstrap().await;

    assert_eq!(loaded, 0);
    assert!(hub.list_servers().is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn saved_file_hides_runtime_state() {
    let temp = tempfile::tempdir().expect("temp dir");
    let path = store_path(&temp);
    let network = InMemoryToolNetwork::new();
    network
        .add_server(&endpoint_for("alpha"), raw_tools(&["search"]))
        .expect("script server");
    let hub = open_hub(&path, &network);
    hub.bootstrap().await;

    hub.register_server(RegisterServerRequest::new("alpha", endpoint_for("alpha")))
        .await
        .expect("registration succeeds");

    let written: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).expect("file written"))
            .expect("valid json");
    let row = written.get(0).expect("one row");
    assert_eq!(row.get("endpoint"), Some(&json!("mem://alpha")));
    assert!(row.get("status").is_none());
    assert!(row.get("latency").is_none());
}

#[tokio::test(flavor = "multi_thread")]
async fn configured_store_path_locates_the_server_file() {
    let temp = tempfile::tempdir().expect("temp dir");
    let path = store_path(&temp);
    let config_path = Utf8PathBuf::from_path_buf(temp.path().join("switchyard.toml"))
        .expect("utf-8 temp path");
    std::fs::write(&config_path, format!("store_path = \"{path}\"\n")).expect("write config");
    let config = ToolRegistryConfig::load(&config_path).expect("config loads");
    let store = JsonFileServerStore::from_config(&config).expect("store opens");
    let hub = ToolHubService::new(
        config,
        Arc::new(store),
        Arc::new(InMemoryToolNetwork::new()),
        Arc::new(DefaultClock),
    );
    hub.bootstrap().await;

    hub.register_server(
        RegisterServerRequest::new("alpha", endpoint_for("alpha")).with_auto_connect(false),
    )
    .await
    .expect("registration succeeds");

    let written: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).expect("file written"))
            .expect("valid json");
    assert_eq!(written.get(0).and_then(|row| row.get("name")), Some(&json!("alpha")));
}
