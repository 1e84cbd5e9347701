//! In-memory integration tests for tool routing and failover.

use super::helpers::{HubContext, endpoint_for, hub_context};
use rstest::rstest;
use serde_json::json;
use switchyard::tool_registry::services::ToolHubError;

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn routing_only_selects_servers_advertising_the_tool(hub_context: HubContext) {
    hub_context
        .online_server("alpha", &["fetch"])
        .await
        .expect("alpha online");
    let beta = hub_context
        .online_server("beta", &["search"])
        .await
        .expect("beta online");

    let dispatch = hub_context
        .hub
        .invoke_by_tool("search", &json!({"q": "tokio"}))
        .await
        .expect("dispatch succeeds");

    assert_eq!(dispatch.server_id, beta);
    assert_eq!(dispatch.server_name.as_str(), "beta");
    assert!(
        hub_context
            .network
            .invocations(&endpoint_for("alpha"))
            .expect("network lock")
            .is_empty()
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn failover_skips_a_server_that_stopped_answering(hub_context: HubContext) {
    hub_context
        .online_server("alpha", &["search"])
        .await
        .expect("alpha online");
    let beta = hub_context
        .online_server("beta", &["search"])
        .await
        .expect("beta online");
    hub_context
        .network
        .set_reachable(&endpoint_for("alpha"), false)
        .expect("script server");

    let dispatch = hub_context
        .hub
        .invoke_by_tool("search", &json!({}))
        .await
        .expect("dispatch succeeds");

    assert_eq!(dispatch.server_id, beta);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn configured_responses_are_returned(hub_context: HubContext) {
    let alpha = hub_context
        .online_server("alpha", &["weather"])
        .await
        .expect("alpha online");
    hub_context
        .network
        .set_response(&endpoint_for("alpha"), "weather", json!({"forecast": "sunny"}))
        .expect("script server");

    let result = hub_context
        .hub
        .invoke(alpha, "weather", json!({"city": "Lisbon"}))
        .await
        .expect("call reaches server");

    assert_eq!(result.content(), &json!({"forecast": "sunny"}));
    assert!(!result.is_error());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn direct_invoke_on_offline_server_is_rejected(hub_context: HubContext) {
    let id = hub_context.offline_server("alpha").await.expect("register alpha");

    let result = hub_context.hub.invoke(id, "search", json!({})).await;

    assert!(matches!(result, Err(ToolHubError::NotConnected(_))));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn direct_invoke_transport_failure_is_an_error(hub_context: HubContext) {
    let alpha = hub_context
        .online_server("alpha", &["search"])
        .await
        .expect("alpha online");
    hub_context
        .network
        .set_reachable(&endpoint_for("alpha"), false)
        .expect("script server");

    let result = hub_context.hub.invoke(alpha, "search", json!({})).await;

    assert!(matches!(
        result,
        Err(ToolHubError::InvokeFailure { server_id, .. }) if server_id == alpha
    ));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn no_online_servers_means_no_capable_server(hub_context: HubContext) {
    hub_context.offline_server("alpha").await.expect("register alpha");

    let result = hub_context.hub.invoke_by_tool("search", &json!({})).await;

    assert!(matches!(
        result,
        Err(ToolHubError::NoCapableServer { ref tool, attempted: 0 }) if tool == "search"
    ));
}
