//! In-memory integration tests for server registration and connection
//! lifecycle.

use super::helpers::{
    HubContext, build_context, endpoint_for, hub_context, raw_tools, tool_names,
};
use rstest::rstest;
use std::sync::Arc;
use std::time::Duration;
use switchyard::config::ToolRegistryConfig;
use switchyard::tool_registry::{
    domain::{ServerId, ServerStatus},
    services::{ConnectOutcome, RegisterServerRequest, ToolHubError},
};
use tokio::task::JoinSet;

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn identifiers_continue_from_the_highest_registered(hub_context: HubContext) {
    let first = hub_context.offline_server("alpha").await.expect("register alpha");
    let second = hub_context.offline_server("beta").await.expect("register beta");
    hub_context
        .hub
        .deregister_server(first)
        .await
        .expect("deregister alpha");

    let third = hub_context.offline_server("gamma").await.expect("register gamma");

    assert_eq!(first, ServerId::new(1));
    assert_eq!(second, ServerId::new(2));
    assert_eq!(third, ServerId::new(3));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn servers_are_listed_in_registration_order(hub_context: HubContext) {
    for name in ["gamma", "alpha", "beta"] {
        hub_context.offline_server(name).await.expect("register server");
    }

    let names: Vec<String> = hub_context
        .hub
        .list_servers()
        .iter()
        .map(|server| server.name().as_str().to_owned())
        .collect();

    assert_eq!(names, vec!["gamma", "alpha", "beta"]);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn successful_connect_records_online_state(hub_context: HubContext) {
    hub_context
        .network
        .add_server(&endpoint_for("alpha"), raw_tools(&["search", "fetch"]))
        .expect("script server");
    let id = hub_context.offline_server("alpha").await.expect("register alpha");

    let outcome = hub_context.hub.connect_server(id).await.expect("server exists");

    let ConnectOutcome::Connected { server, tools } = outcome else {
        panic!("expected alpha to connect");
    };
    assert_eq!(server.status(), ServerStatus::Online);
    assert!(server.latency() >= Duration::ZERO);
    assert_eq!(tool_names(&tools), vec!["search", "fetch"]);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn failed_connect_records_offline_state(hub_context: HubContext) {
    let id = hub_context.offline_server("ghost").await.expect("register ghost");

    let outcome = hub_context.hub.connect_server(id).await.expect("server exists");

    let ConnectOutcome::Failed { server, .. } = outcome else {
        panic!("expected ghost to fail");
    };
    assert_eq!(server.status(), ServerStatus::Offline);
    assert_eq!(server.latency(), Duration::ZERO);
    assert!(server.connection_time().is_some());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn auto_connect_failure_still_registers(hub_context: HubContext) {
    hub_context
        .network
        .add_server(&endpoint_for("locked"), raw_tools(&["search"]))
        .expect("script server");
    hub_context
        .network
        .require_credential(&endpoint_for("locked"), "right")
        .expect("script server");

    let registration = hub_context
        .hub
        .register_server(
            RegisterServerRequest::new("locked", endpoint_for("locked")).with_credential("wrong"),
        )
        .await
        .expect("registration succeeds");

    assert!(!registration.server.is_online());
    assert!(registration.tools.is_empty());
    assert_eq!(hub_context.hub.list_servers().len(), 1);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn disconnect_then_list_tools_reports_offline(hub_context: HubContext) {
    let id = hub_context
        .online_server("alpha", &["search"])
        .await
        .expect("alpha online");
    hub_context.hub.list_tools(id).await.expect("catalog cached");

    hub_context.hub.disconnect_server(id).await.expect("server exists");
    let result = hub_context.hub.list_tools(id).await;

    assert!(matches!(result, Err(ToolHubError::Offline(offline)) if offline == id));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn every_change_is_persisted(hub_context: HubContext) {
    let id = hub_context
        .online_server("alpha", &["search"])
        .await
        .expect("alpha online");
    let after_register = hub_context.store.save_count().expect("store lock");

    hub_context.hub.disconnect_server(id).await.expect("server exists");
    hub_context.hub.deregister_server(id).await.expect("server exists");

    assert_eq!(
        hub_context.store.save_count().expect("store lock"),
        after_register + 2
    );
    assert!(hub_context.store.snapshot().expect("store lock").is_empty());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn unknown_servers_are_reported(hub_context: HubContext) {
    let missing = ServerId::new(99);

    assert!(matches!(
        hub_context.hub.connect_server(missing).await,
        Err(ToolHubError::NotFound(_))
    ));
    assert!(matches!(
        hub_context.hub.disconnect_server(missing).await,
        Err(ToolHubError::NotFound(_))
    ));
    assert!(matches!(
        hub_context.hub.list_tools(missing).await,
        Err(ToolHubError::NotFound(_))
    ));
    assert!(hub_context.hub.find_server(missing).is_none());
}

#[tokio::test(flavor = "multi_thread")]
async fn concurrent_registrations_get_distinct_identifiers() {
    let hub = Arc::new(build_context(ToolRegistryConfig::default()).hub);
    let mut pending = JoinSet::new();
    for index in 0..8 {
        let shared = Arc::clone(&hub);
        pending.spawn(async move {
            let name = format!("server-{index}");
            shared
                .register_server(
                    RegisterServerRequest::new(name.clone(), endpoint_for(&name))
                        .with_auto_connect(false),
                )
                .await
                .map(|registration| registration.server.id().value())
        });
    }

    let mut ids = Vec::new();
    while let Some(joined) = pending.join_next().await {
        ids.push(
            joined
                .expect("task completes")
                .expect("registration succeeds"),
        );
    }
    ids.sort_unstable();

    assert_eq!(ids, (1..=8).collect::<Vec<u64>>());
}
