mod common;

use common::{api, context, docs, verbose, verbose_results};
use serde_json::json;
use spquery_client::{ClientError, ClientObject, View};
use spquery_core::RestResponse;

const VIEW_QUERY: &str = r#"<OrderBy><FieldRef Name="ID"/></OrderBy>"#;

#[tokio::test]
async fn test_get_items_loads_view_query_first() {
    let (ctx, transport) = context();
    transport
        .respond(RestResponse::ok(verbose(json!({"ViewQuery": VIEW_QUERY}))))
        .respond(RestResponse::ok(verbose_results(json!([
            {"__metadata": {"type": "SP.ListItem"}, "Id": 1, "Title": "Q1"},
            {"__metadata": {"type": "SP.ListItem"}, "Id": 2, "Title": "Q2"}
        ]))));
    let view = docs(&ctx).views().unwrap().get_by_title("All Items");

    let items = view.get_items().await.unwrap();
    assert_eq!(transport.request_count(), 1);
    assert_eq!(ctx.pending_count(), 1);
    assert!(!items.is_loaded());

    ctx.execute_query().await.unwrap();

    let requests = transport.requests();
    assert_eq!(
        requests[0].url,
        api("Web/Lists/GetByTitle('Docs')/Views/GetByTitle('All Items')?$select=ViewQuery")
    );
    assert_eq!(requests[1].url, api("Web/Lists/GetByTitle('Docs')/GetItems()"));
    assert_eq!(
        requests[1].body,
        Some(json!({
            "query": {
                "__metadata": {"type": "SP.CamlQuery"},
                "ViewXml": format!("<View><Query>{}</Query></View>", VIEW_QUERY)
            }
        }))
    );

    assert_eq!(items.len(), 2);
    let titles: Vec<Option<String>> = items.to_vec().iter().map(|i| i.title()).collect();
    assert_eq!(titles, vec![Some("Q1".to_string()), Some("Q2".to_string())]);
    assert_eq!(
        items.get(1).unwrap().resource_path().unwrap().to_relative_url(),
        "Web/Lists/GetByTitle('Docs')/items/GetById(2)"
    );
}

#[tokio::test]
async fn test_get_items_fills_parent_list_items() {
    let (ctx, transport) = context();
    transport
        .respond(RestResponse::ok(verbose(json!({"ViewQuery": ""}))))
        .respond(RestResponse::ok(verbose_results(json!([{"Id": 1, "Title": "Q1"}]))));
    let list = docs(&ctx);
    let view = list.views().unwrap().get_by_title("All Items");

    let returned = view.get_items().await.unwrap();
    ctx.execute_query().await.unwrap();

    assert_eq!(returned.len(), 1);
    assert_eq!(view.parent_list().unwrap().items().unwrap().len(), 1);
    assert_eq!(list.items().unwrap().len(), 1);
    assert_eq!(
        list.items().unwrap().get(0).and_then(|item| item.title()).as_deref(),
        Some("Q1")
    );
}

#[tokio::test]
async fn test_view_query_flush_sends_queued_update() {
    let (ctx, transport) = context();
    transport
        .respond(RestResponse::no_content())
        .respond(RestResponse::ok(verbose(json!({"ViewQuery": ""}))));
    let view = docs(&ctx).views().unwrap().get_by_title("All Items");

    view.set_row_limit(50);
    view.update().unwrap();
    view.get_items().await.unwrap();

    let requests = transport.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].header("X-HTTP-Method"), Some("MERGE"));
    assert_eq!(ctx.pending_count(), 1);

    ctx.execute_query().await.unwrap();
    let requests = transport.requests();
    assert_eq!(requests.len(), 3);
    assert_eq!(requests[2].url, api("Web/Lists/GetByTitle('Docs')/GetItems()"));
}

#[tokio::test]
async fn test_loaded_views_stay_on_list() {
    let (ctx, transport) = context();
    transport.respond(RestResponse::ok(verbose_results(json!([
        {"Id": "a", "Title": "All Items"},
        {"Id": "b", "Title": "Recent"}
    ]))));
    let list = docs(&ctx);

    list.views().unwrap().load();
    ctx.execute_query().await.unwrap();

    assert_eq!(list.views().unwrap().len(), 2);
    assert!(list.views().unwrap().is_loaded());
}

#[tokio::test]
async fn test_get_items_with_loaded_view_query() {
    let (ctx, transport) = context();
    let view = docs(&ctx).views().unwrap().get_by_title("All Items");
    view.core()
        .merge_payload(&json!({"ViewQuery": VIEW_QUERY}))
        .unwrap();

    view.get_items().await.unwrap();

    assert_eq!(transport.request_count(), 0);
    assert_eq!(ctx.pending_count(), 1);
}

#[tokio::test]
async fn test_get_items_requires_parent_list() {
    let (ctx, _transport) = context();
    let attached = docs(&ctx).views().unwrap().get_by_title("All Items");
    let detached = View::from_core(attached.core().clone());

    let err = detached.get_items().await.unwrap_err();
    assert!(matches!(err, ClientError::Addressing(_)));
    assert!(!ctx.has_pending());
}

#[tokio::test]
async fn test_get_items_fails_without_view_query() {
    let (ctx, transport) = context();
    transport.respond(RestResponse::ok(verbose(json!({"Title": "All Items"}))));
    let view = docs(&ctx).views().unwrap().get_by_title("All Items");

    let err = view.get_items().await.unwrap_err();
    assert_eq!(err, ClientError::not_loaded("ViewQuery"));
    assert!(!ctx.has_pending());
}

#[tokio::test]
async fn test_default_view_items() {
    let (ctx, transport) = context();
    transport.respond(RestResponse::ok(verbose(json!({"ViewQuery": ""}))));
    let view = docs(&ctx).default_view().unwrap();

    view.get_items().await.unwrap();
    assert_eq!(
        transport.requests()[0].url,
        api("Web/Lists/GetByTitle('Docs')/DefaultView?$select=ViewQuery")
    );
}
