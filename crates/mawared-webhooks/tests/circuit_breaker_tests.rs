//! Circuit-breaker behavior: suspension after consecutive failures,
//! manual reactivation, and recovery through a successful test delivery.

mod common;

use std::sync::Arc;

use common::{make_dispatcher, make_webhook, test_key, MemoryStore};
use serde_json::json;
use uuid::Uuid;
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

use mawared_webhooks::models::UpdateWebhookRequest;
use mawared_webhooks::{WebhookService, DEFAULT_FAILURE_THRESHOLD};

fn make_service(store: Arc<MemoryStore>) -> WebhookService {
    WebhookService::new(store.clone(), store, test_key()).with_allow_http(true)
}

#[tokio::test]
async fn test_webhook_suspended_after_ten_consecutive_failures() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let tenant = Uuid::new_v4();
    let store = MemoryStore::new();
    let webhook = make_webhook(tenant, &format!("{}/hook", server.uri()), &["task.created"]);
    let webhook_id = webhook.id;
    store.insert(webhook);

    let dispatcher = make_dispatcher(store.clone());
    for i in 1..=DEFAULT_FAILURE_THRESHOLD {
        let summary = dispatcher
            .dispatch(tenant, "task.created", json!({}))
            .await
            .unwrap();
        assert_eq!(summary.attempted, 1, "attempt {i} should still be eligible");
        assert_eq!(summary.failed, 1);
        assert_eq!(store.get(webhook_id).unwrap().failure_count, i);
    }

    // The eleventh dispatch never reaches the endpoint
    let summary = dispatcher
        .dispatch(tenant, "task.created", json!({}))
        .await
        .unwrap();
    assert_eq!(summary.attempted, 0);
    assert_eq!(store.logs_for(webhook_id).len(), 10);
    assert_eq!(
        server.received_requests().await.unwrap().len(),
        10,
        "no delivery after suspension"
    );
}

#[tokio::test]
async fn test_success_resets_failure_count_before_threshold() {
    let server = MockServer::start().await;
    // First two requests fail, the rest succeed
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let tenant = Uuid::new_v4();
    let store = MemoryStore::new();
    let webhook = make_webhook(tenant, &format!("{}/hook", server.uri()), &["task.created"]);
    let webhook_id = webhook.id;
    store.insert(webhook);

    let dispatcher = make_dispatcher(store.clone());
    for _ in 0..2 {
        dispatcher
            .dispatch(tenant, "task.created", json!({}))
            .await
            .unwrap();
    }
    assert_eq!(store.get(webhook_id).unwrap().failure_count, 2);

    dispatcher
        .dispatch(tenant, "task.created", json!({}))
        .await
        .unwrap();

    let after = store.get(webhook_id).unwrap();
    assert_eq!(after.failure_count, 0);
    assert!(after.last_error.is_none());
}

#[tokio::test]
async fn test_reactivation_resets_failure_bookkeeping() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let tenant = Uuid::new_v4();
    let store = MemoryStore::new();
    let mut webhook = make_webhook(tenant, &format!("{}/hook", server.uri()), &["task.created"]);
    webhook.failure_count = 10;
    webhook.last_error = Some("HTTP 500".to_string());
    let webhook_id = webhook.id;
    store.insert(webhook);

    let service = make_service(store.clone());
    let updated = service
        .update_webhook(
            tenant,
            webhook_id,
            UpdateWebhookRequest {
                active: Some(true),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.failure_count, 0);
    assert!(updated.last_error.is_none());

    // Eligible for automatic dispatch again
    let dispatcher = make_dispatcher(store.clone());
    let summary = dispatcher
        .dispatch(tenant, "task.created", json!({}))
        .await
        .unwrap();
    assert_eq!(summary.attempted, 1);
    assert_eq!(summary.succeeded, 1);
}

#[tokio::test]
async fn test_successful_test_delivery_restores_suspended_webhook() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let tenant = Uuid::new_v4();
    let store = MemoryStore::new();
    let mut webhook = make_webhook(tenant, &format!("{}/hook", server.uri()), &["task.created"]);
    webhook.failure_count = 10;
    let webhook_id = webhook.id;
    store.insert(webhook);

    let dispatcher = make_dispatcher(store.clone());

    // Suspended webhooks still accept test deliveries
    let result = dispatcher.test_delivery(tenant, webhook_id).await.unwrap();
    assert!(result.success);
    assert_eq!(result.status_code, Some(200));
    assert_eq!(store.get(webhook_id).unwrap().failure_count, 0);

    // The test payload is the documented diagnostic shape
    let requests = server.received_requests().await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(body["event"], "test");
    assert_eq!(body["data"]["test"], true);
    assert!(body["data"]["message"].is_string());

    // Back in rotation for automatic dispatch
    let summary = dispatcher
        .dispatch(tenant, "task.created", json!({}))
        .await
        .unwrap();
    assert_eq!(summary.attempted, 1);
}

#[tokio::test]
async fn test_failed_test_delivery_keeps_counting() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let tenant = Uuid::new_v4();
    let store = MemoryStore::new();
    let mut webhook = make_webhook(tenant, &format!("{}/hook", server.uri()), &["task.created"]);
    webhook.failure_count = 10;
    let webhook_id = webhook.id;
    store.insert(webhook);

    let dispatcher = make_dispatcher(store.clone());
    let result = dispatcher.test_delivery(tenant, webhook_id).await.unwrap();

    assert!(!result.success);
    assert_eq!(result.status_code, Some(503));
    assert_eq!(store.get(webhook_id).unwrap().failure_count, 11);
    assert_eq!(store.logs_for(webhook_id).len(), 1);
}

#[tokio::test]
async fn test_test_delivery_for_unknown_webhook_is_not_found() {
    let store = MemoryStore::new();
    let dispatcher = make_dispatcher(store);

    let err = dispatcher
        .test_delivery(Uuid::new_v4(), Uuid::new_v4())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        mawared_webhooks::WebhookError::WebhookNotFound
    ));
}
