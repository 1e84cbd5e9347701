//! In-memory integration tests for health monitoring and reconnection.

use super::helpers::{HubContext, build_context, endpoint_for, hub_context, raw_tools};
use rstest::rstest;
use serde_json::json;
use std::time::Duration;
use switchyard::config::ToolRegistryConfig;
use switchyard::tool_registry::services::HealthReport;

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn dead_session_is_reconnected_within_one_cycle(hub_context: HubContext) {
    let id = hub_context
        .online_server("alpha", &["search"])
        .await
        .expect("alpha online");
    hub_context
        .network
        .sever_sessions(&endpoint_for("alpha"))
        .expect("script server");

    let report = hub_context.hub.health_monitor().check_once().await;

    assert_eq!(report.checked, vec![id]);
    assert_eq!(report.reconnected, vec![id]);
    let dispatch = hub_context
        .hub
        .invoke_by_tool("search", &json!({}))
        .await
        .expect("dispatch succeeds after reconnect");
    assert_eq!(dispatch.server_id, id);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn unreachable_server_is_taken_offline(hub_context: HubContext) {
    let alpha = hub_context
        .online_server("alpha", &["search"])
        .await
        .expect("alpha online");
    let beta = hub_context
        .online_server("beta", &["fetch"])
        .await
        .expect("beta online");
    hub_context
        .network
        .set_reachable(&endpoint_for("alpha"), false)
        .expect("script server");

    let report = hub_context.hub.health_monitor().check_once().await;

    assert_eq!(report.failed, vec![alpha]);
    assert_eq!(report.healthy, vec![beta]);
    assert!(
        hub_context
            .hub
            .find_server(alpha)
            .is_some_and(|server| !server.is_online())
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn recovered_server_rejoins_on_manual_connect(hub_context: HubContext) {
    let alpha = hub_context
        .online_server("alpha", &["search"])
        .await
        .expect("alpha online");
    hub_context
        .network
        .set_reachable(&endpoint_for("alpha"), false)
        .expect("script server");
    hub_context.hub.health_monitor().check_once().await;

    hub_context
        .network
        .set_reachable(&endpoint_for("alpha"), true)
        .expect("script server");
    let second = hub_context.hub.health_monitor().check_once().await;
    let outcome = hub_context.hub.connect_server(alpha).await.expect("server exists");

    assert_eq!(second, HealthReport::default());
    assert!(outcome.is_connected());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn healthy_cycle_picks_up_catalog_changes(hub_context: HubContext) {
    let alpha = hub_context
        .online_server("alpha", &["search"])
        .await
        .expect("alpha online");
    hub_context
        .network
        .set_tools(&endpoint_for("alpha"), raw_tools(&["search", "translate"]))
        .expect("script server");

    hub_context.hub.health_monitor().check_once().await;
    let dispatch = hub_context
        .hub
        .invoke_by_tool("translate", &json!({}))
        .await
        .expect("new tool is routable");

    assert_eq!(dispatch.server_id, alpha);
}

#[tokio::test(start_paused = true)]
async fn started_monitor_runs_on_its_interval() {
    let context = build_context(ToolRegistryConfig::default().with_health_check_interval_secs(30));
    context
        .online_server("alpha", &["search"])
        .await
        .expect("alpha online");
    context
        .network
        .sever_sessions(&endpoint_for("alpha"))
        .expect("script server");

    let handle = context.hub.start_health_monitor();
    tokio::time::sleep(Duration::from_secs(10)).await;
    let before_first_cycle = context
        .network
        .connect_attempts(&endpoint_for("alpha"))
        .expect("network lock");
    tokio::time::sleep(Duration::from_secs(25)).await;
    handle.shutdown().await;

    assert_eq!(before_first_cycle, 1);
    assert_eq!(
        context
            .network
            .connect_attempts(&endpoint_for("alpha"))
            .expect("network lock"),
        2
    );
}
