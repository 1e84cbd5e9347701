//! In-memory integration tests for catalog caching and cross-server tool
//! listing.

use super::helpers::{HubContext, endpoint_for, hub_context, raw_tools, tool_names};
use rstest::rstest;
use serde_json::json;
use std::collections::HashSet;
use switchyard::tool_registry::services::RegisterServerRequest;

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn catalog_is_served_from_cache_until_reconnect(hub_context: HubContext) {
    let id = hub_context
        .online_server("alpha", &["search"])
        .await
        .expect("alpha online");
    hub_context
        .network
        .set_tools(&endpoint_for("alpha"), raw_tools(&["search", "fetch"]))
        .expect("script server");

    let cached = hub_context.hub.list_tools(id).await.expect("cached catalog");
    hub_context.hub.connect_server(id).await.expect("server exists");
    let refreshed = hub_context.hub.list_tools(id).await.expect("fresh catalog");

    assert_eq!(tool_names(&cached), vec!["search"]);
    assert_eq!(tool_names(&refreshed), vec!["search", "fetch"]);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn mixed_tool_shapes_are_normalized(hub_context: HubContext) {
    hub_context
        .network
        .add_server(
            &endpoint_for("mixed"),
            vec![
                json!({"name": "search", "inputSchema": {"type": "object"}}),
                json!({"name": "weather", "parameters": {"type": "object"}}),
                json!({"type": "function", "function": {"name": "chart"}}),
                json!("bare-string"),
                json!({"description": "no name"}),
            ],
        )
        .expect("script server");
    let registration = hub_context
        .hub
        .register_server(RegisterServerRequest::new("mixed", endpoint_for("mixed")))
        .await
        .expect("registration succeeds");

    let tools = hub_context
        .hub
        .list_tools(registration.server.id())
        .await
        .expect("catalog available");

    assert_eq!(tool_names(&tools), vec!["search", "weather", "chart"]);
    assert!(tools.iter().all(|tool| tool.input_schema().is_object()));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn merged_listing_never_repeats_a_name(hub_context: HubContext) {
    hub_context
        .online_server("alpha", &["search", "fetch"])
        .await
        .expect("alpha online");
    hub_context
        .online_server("beta", &["fetch", "translate"])
        .await
        .expect("beta online");
    hub_context
        .online_server("gamma", &["search", "translate", "summarize"])
        .await
        .expect("gamma online");

    let merged = hub_context.hub.list_all_online_tools().await;

    let names = tool_names(&merged);
    let unique: HashSet<&String> = names.iter().collect();
    assert_eq!(unique.len(), names.len());
    assert_eq!(names, vec!["search", "fetch", "translate", "summarize"]);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn merged_listing_prefers_earlier_registration(hub_context: HubContext) {
    hub_context
        .online_server("alpha", &["search"])
        .await
        .expect("alpha online");
    hub_context
        .online_server("beta", &["search"])
        .await
        .expect("beta online");

    let merged = hub_context.hub.list_all_online_tools().await;

    assert_eq!(
        merged.first().map(|tool| tool.description().to_owned()),
        Some("search tool".to_owned())
    );
    assert_eq!(merged.len(), 1);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn merged_listing_ignores_offline_servers(hub_context: HubContext) {
    let alpha = hub_context
        .online_server("alpha", &["search"])
        .await
        .expect("alpha online");
    hub_context
        .online_server("beta", &["fetch"])
        .await
        .expect("beta online");
    hub_context.offline_server("gamma").await.expect("register gamma");

    hub_context.hub.disconnect_server(alpha).await.expect("server exists");
    let merged = hub_context.hub.list_all_online_tools().await;

    assert_eq!(tool_names(&merged), vec!["fetch"]);
}
