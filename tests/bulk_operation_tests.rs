//! Integration tests for bulk operations against a mock service.
//!
//! These run on real time with short poll and backoff intervals.

use std::time::Duration;

use serde::Deserialize;
use serde_json::{json, Value};
use shopify_graphql::bulk::{
    BulkError, BulkErrorCode, BulkOperationStatus, BulkOptions, BulkShape, ReconstructError,
};
use shopify_graphql::retry::{FinalErrorKind, ShopifyErrorClassifier};
use shopify_graphql::{
    AccessToken, ApiVersion, Credentials, GraphqlClient, GraphqlError, HostUrl, RetryPolicy,
    ShopDomain, ShopifyConfig,
};
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const OPERATION_ID: &str = "gid://shopify/BulkOperation/1";
const ORDERS_QUERY: &str =
    "{ orders { edges { node { id name lineItems { edges { node { id title } } } } } } }";

#[derive(Debug, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
struct Order {
    id: String,
    name: String,
    line_items: Vec<LineItem>,
}

#[derive(Debug, Deserialize, PartialEq)]
struct LineItem {
    id: String,
    title: String,
}

fn client_with(server: &MockServer, bulk: BulkOptions) -> GraphqlClient {
    let config = ShopifyConfig::builder()
        .shop(ShopDomain::new("test-shop").unwrap())
        .credentials(Credentials::AccessToken(AccessToken::new("shpat_test").unwrap()))
        .api_version(ApiVersion::V2024_10)
        .api_host(HostUrl::new(server.uri()).unwrap())
        .retry(RetryPolicy::new(2).with_backoff_unit(Duration::from_millis(5)))
        .bulk(bulk)
        .build()
        .unwrap();
    GraphqlClient::new(&config)
}

fn client(server: &MockServer) -> GraphqlClient {
    client_with(
        server,
        BulkOptions::default().with_poll_interval(Duration::from_millis(10)),
    )
}

fn line_items() -> BulkShape {
    BulkShape::new().collection("lineItems", "LineItem")
}

fn operation(status: &str, extra: &Value) -> Value {
    let mut node = json!({
        "id": OPERATION_ID,
        "status": status,
        "errorCode": null,
        "createdAt": "2024-06-01T12:00:00Z",
        "completedAt": null,
        "objectCount": "0",
        "fileSize": null,
        "url": null,
        "partialDataUrl": null,
        "query": ORDERS_QUERY
    });
    if let (Some(node), Some(extra)) = (node.as_object_mut(), extra.as_object()) {
        for (key, value) in extra {
            node.insert(key.clone(), value.clone());
        }
    }
    node
}

fn poll_response(status: &str, extra: &Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({"data": {"node": operation(status, extra)}}))
}

async fn mount_submit(server: &MockServer, expected_calls: u64) {
    Mock::given(method("POST"))
        .and(body_string_contains("bulkOperationRunQuery"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"bulkOperationRunQuery": {
                "bulkOperation": {"id": OPERATION_ID, "status": "CREATED"},
                "userErrors": []
            }}
        })))
        .expect(expected_calls)
        .mount(server)
        .await;
}

fn poll_mock() -> wiremock::MockBuilder {
    Mock::given(method("POST")).and(body_string_contains("node(id:"))
}

// ============================================================================
// Full Run Tests
// ============================================================================

#[tokio::test]
async fn test_run_bulk_query_polls_downloads_and_reconstructs() {
    let server = MockServer::start().await;
    mount_submit(&server, 1).await;
    poll_mock()
        .respond_with(poll_response("RUNNING", &json!({"objectCount": "2"})))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    poll_mock()
        .respond_with(poll_response(
            "COMPLETED",
            &json!({
                "objectCount": "4",
                "url": format!("{}/results/bulk.jsonl", server.uri()),
                "completedAt": "2024-06-01T12:05:00Z"
            }),
        ))
        .expect(1)
        .mount(&server)
        .await;

    let file = [
        r##"{"id":"gid://shopify/Order/1","name":"#1001"}"##,
        r#"{"id":"gid://shopify/LineItem/2","title":"Hat","__parentId":"gid://shopify/Order/1"}"#,
        r#"{"id":"gid://shopify/LineItem/3","title":"Scarf","__parentId":"gid://shopify/Order/1"}"#,
        r##"{"id":"gid://shopify/Order/4","name":"#1002"}"##,
    ]
    .join("\n");
    Mock::given(method("GET"))
        .and(path("/results/bulk.jsonl"))
        .respond_with(ResponseTemplate::new(200).set_body_string(file + "\n"))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server);
    let orders: Vec<Order> = client
        .bulk()
        .run_bulk_query(ORDERS_QUERY, &line_items())
        .await
        .unwrap();

    assert_eq!(
        orders,
        vec![
            Order {
                id: "gid://shopify/Order/1".to_string(),
                name: "#1001".to_string(),
                line_items: vec![
                    LineItem {
                        id: "gid://shopify/LineItem/2".to_string(),
                        title: "Hat".to_string(),
                    },
                    LineItem {
                        id: "gid://shopify/LineItem/3".to_string(),
                        title: "Scarf".to_string(),
                    },
                ],
            },
            Order {
                id: "gid://shopify/Order/4".to_string(),
                name: "#1002".to_string(),
                line_items: vec![],
            },
        ]
    );
}

#[tokio::test]
async fn test_completed_with_zero_objects_returns_empty_result() {
    let server = MockServer::start().await;
    mount_submit(&server, 1).await;
    poll_mock()
        .respond_with(poll_response("COMPLETED", &json!({"objectCount": "0"})))
        .mount(&server)
        .await;

    let client = client(&server);
    let orders: Vec<Order> = client
        .bulk()
        .run_bulk_query(ORDERS_QUERY, &line_items())
        .await
        .unwrap();

    assert!(orders.is_empty());
}

#[tokio::test]
async fn test_completed_with_objects_but_no_url_is_final_error() {
    let server = MockServer::start().await;
    mount_submit(&server, 1).await;
    poll_mock()
        .respond_with(poll_response("COMPLETED", &json!({"objectCount": "12", "url": ""})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server);
    let error = client
        .bulk()
        .run_bulk_query::<Order>(ORDERS_QUERY, &line_items())
        .await
        .unwrap_err();

    assert!(matches!(error, BulkError::EmptyResultUrl { ref id } if id == OPERATION_ID));
    assert_eq!(
        ShopifyErrorClassifier::kind_of(&error.to_string()),
        Some(FinalErrorKind::EmptyResultLocation)
    );
}

// ============================================================================
// Failure Tests
// ============================================================================

#[tokio::test]
async fn test_failed_job_reports_error_code_and_is_not_resubmitted() {
    let server = MockServer::start().await;
    mount_submit(&server, 1).await;
    poll_mock()
        .respond_with(poll_response(
            "FAILED",
            &json!({"errorCode": "ACCESS_DENIED", "partialDataUrl": null}),
        ))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server);
    let error = client
        .bulk()
        .run_bulk_query::<Order>(ORDERS_QUERY, &line_items())
        .await
        .unwrap_err();

    match &error {
        BulkError::JobFailed {
            status, error_code, ..
        } => {
            assert_eq!(*status, BulkOperationStatus::Failed);
            assert_eq!(error_code, &Some(BulkErrorCode::AccessDenied));
        }
        other => panic!("expected JobFailed, got {other:?}"),
    }
    assert_eq!(
        error.to_string(),
        "bulk operation gid://shopify/BulkOperation/1 finished with status FAILED (error code: ACCESS_DENIED)"
    );
}

#[tokio::test]
async fn test_submit_user_errors_create_no_job() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_string_contains("bulkOperationRunQuery"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"bulkOperationRunQuery": {
                "bulkOperation": null,
                "userErrors": [{"field": ["query"], "message": "Invalid bulk query: syntax error"}]
            }}
        })))
        .expect(1)
        .mount(&server)
        .await;
    poll_mock()
        .respond_with(poll_response("RUNNING", &json!({})))
        .expect(0)
        .mount(&server)
        .await;

    let client = client(&server);
    let error = client
        .bulk()
        .run_bulk_query::<Order>("{ broken", &line_items())
        .await
        .unwrap_err();

    assert!(matches!(
        error,
        BulkError::Submit(GraphqlError::UserErrors(ref errors)) if errors.len() == 1
    ));
}

#[tokio::test]
async fn test_transient_poll_failure_is_retried() {
    let server = MockServer::start().await;
    mount_submit(&server, 1).await;
    poll_mock()
        .respond_with(ResponseTemplate::new(500).set_body_string("try again"))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    poll_mock()
        .respond_with(poll_response("COMPLETED", &json!({"objectCount": "0"})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server);
    let orders: Vec<Order> = client
        .bulk()
        .run_bulk_query(ORDERS_QUERY, &line_items())
        .await
        .unwrap();
    assert!(orders.is_empty());
}

#[tokio::test]
async fn test_unrecognized_status_keeps_polling() {
    let server = MockServer::start().await;
    mount_submit(&server, 1).await;
    poll_mock()
        .respond_with(poll_response("PAUSED", &json!({})))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    poll_mock()
        .respond_with(poll_response("COMPLETED", &json!({"objectCount": "0"})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server);
    let orders: Vec<Order> = client
        .bulk()
        .run_bulk_query(ORDERS_QUERY, &line_items())
        .await
        .unwrap();
    assert!(orders.is_empty());
}

#[tokio::test]
async fn test_poll_gives_up_after_retries() {
    let server = MockServer::start().await;
    mount_submit(&server, 1).await;
    poll_mock()
        .respond_with(ResponseTemplate::new(503).set_body_string("unavailable"))
        .expect(3)
        .mount(&server)
        .await;

    let client = client(&server);
    let error = client
        .bulk()
        .run_bulk_query::<Order>(ORDERS_QUERY, &line_items())
        .await
        .unwrap_err();

    match error {
        BulkError::Poll { id, source } => {
            assert_eq!(id, OPERATION_ID);
            assert!(source.is_exhausted());
        }
        other => panic!("expected Poll error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_orphan_record_in_result_file() {
    let server = MockServer::start().await;
    mount_submit(&server, 1).await;
    poll_mock()
        .respond_with(poll_response(
            "COMPLETED",
            &json!({"objectCount": "1", "url": format!("{}/results/orphan.jsonl", server.uri())}),
        ))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/results/orphan.jsonl"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"{"id":"gid://shopify/LineItem/9","title":"Hat","__parentId":"gid://shopify/Order/8"}"#,
        ))
        .mount(&server)
        .await;

    let client = client(&server);
    let error = client
        .bulk()
        .run_bulk_query::<Order>(ORDERS_QUERY, &line_items())
        .await
        .unwrap_err();

    assert!(matches!(
        error,
        BulkError::Reconstruct(ReconstructError::OrphanRecord { line: 1, ref parent_id, .. })
            if parent_id == "gid://shopify/Order/8"
    ));
}

#[tokio::test]
async fn test_expired_result_file_is_download_error() {
    let server = MockServer::start().await;
    mount_submit(&server, 1).await;
    poll_mock()
        .respond_with(poll_response(
            "COMPLETED",
            &json!({"objectCount": "1", "url": format!("{}/results/gone.jsonl", server.uri())}),
        ))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/results/gone.jsonl"))
        .respond_with(ResponseTemplate::new(404).set_body_string("expired"))
        .mount(&server)
        .await;

    let client = client(&server);
    let error = client
        .bulk()
        .run_bulk_query::<Order>(ORDERS_QUERY, &line_items())
        .await
        .unwrap_err();

    assert!(matches!(error, BulkError::Download(_)));
}

// ============================================================================
// Deadline and Cancellation Tests
// ============================================================================

#[tokio::test]
async fn test_deadline_stops_waiting_without_remote_cancel() {
    let server = MockServer::start().await;
    mount_submit(&server, 1).await;
    poll_mock()
        .respond_with(poll_response("RUNNING", &json!({})))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(body_string_contains("bulkOperationCancel"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let client = client_with(
        &server,
        BulkOptions::default()
            .with_poll_interval(Duration::from_millis(10))
            .with_timeout(Duration::from_millis(200)),
    );
    let error = client
        .bulk()
        .run_bulk_query::<Order>(ORDERS_QUERY, &line_items())
        .await
        .unwrap_err();

    assert!(matches!(error, BulkError::DeadlineExceeded { ref id } if id == OPERATION_ID));
    assert_eq!(
        ShopifyErrorClassifier::kind_of(&error.to_string()),
        Some(FinalErrorKind::Cancelled)
    );
}

#[tokio::test]
async fn test_cancellation_token_stops_waiting() {
    let server = MockServer::start().await;
    mount_submit(&server, 1).await;
    poll_mock()
        .respond_with(poll_response("RUNNING", &json!({})))
        .mount(&server)
        .await;

    let token = CancellationToken::new();
    let trigger = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        trigger.cancel();
    });

    let client = client(&server);
    let error = client
        .bulk()
        .run_bulk_query_until::<Order>(ORDERS_QUERY, &line_items(), None, &token)
        .await
        .unwrap_err();

    assert!(matches!(error, BulkError::Cancelled { .. }));
    assert!(error.to_string().ends_with("operation cancelled"));
}

// ============================================================================
// Single Request Tests
// ============================================================================

#[tokio::test]
async fn test_poll_returns_operation_details() {
    let server = MockServer::start().await;
    poll_mock()
        .and(body_string_contains(OPERATION_ID))
        .respond_with(poll_response(
            "RUNNING",
            &json!({"objectCount": "1500", "fileSize": "20480"}),
        ))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server);
    let operation = client.bulk().poll(OPERATION_ID).await.unwrap();

    assert_eq!(operation.status, BulkOperationStatus::Running);
    assert_eq!(operation.object_count(), Some(1500));
    assert_eq!(operation.file_size.as_deref(), Some("20480"));
    assert!(operation.created_at.is_some());
}

#[tokio::test]
async fn test_poll_unknown_operation_is_not_found() {
    let server = MockServer::start().await;
    poll_mock()
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": {"node": null}})))
        .mount(&server)
        .await;

    let client = client(&server);
    let error = client.bulk().poll("gid://shopify/BulkOperation/404").await.unwrap_err();
    assert!(matches!(error, BulkError::NotFound { .. }));
}

#[tokio::test]
async fn test_cancel_requests_remote_cancellation() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_string_contains("bulkOperationCancel"))
        .and(body_string_contains(OPERATION_ID))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"bulkOperationCancel": {
                "bulkOperation": operation("CANCELING", &json!({})),
                "userErrors": []
            }}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server);
    let operation = client.bulk().cancel(OPERATION_ID).await.unwrap();
    assert_eq!(operation.status, BulkOperationStatus::Canceling);
}

#[tokio::test]
async fn test_wait_for_current_returns_when_shop_is_idle() {
    let server = MockServer::start().await;
    let current = |status: &str| {
        ResponseTemplate::new(200).set_body_json(json!({
            "data": {"currentBulkOperation": operation(status, &json!({}))}
        }))
    };
    Mock::given(method("POST"))
        .and(body_string_contains("currentBulkOperation"))
        .respond_with(current("RUNNING"))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(body_string_contains("currentBulkOperation"))
        .respond_with(current("COMPLETED"))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server);
    let operation = client
        .bulk()
        .wait_for_current(&CancellationToken::new())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(operation.status, BulkOperationStatus::Completed);
}

#[tokio::test]
async fn test_current_bulk_operation_none() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_string_contains("currentBulkOperation"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"data": {"currentBulkOperation": null}})),
        )
        .mount(&server)
        .await;

    let client = client(&server);
    assert!(client.bulk().current_bulk_operation().await.unwrap().is_none());
    assert!(client
        .bulk()
        .wait_for_current(&CancellationToken::new())
        .await
        .unwrap()
        .is_none());
}
