//! Concurrent operations and cancellation.

use futures_util::future::join_all;
use serde_json::json;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use resource_client::client::{OperationKind, OperationState};
use resource_client::mock::Fault;
use resource_client::{RecordId, ResourceClient};

mod common;

use common::{client_for, fast_config, fields, start_mock};

#[tokio::test]
async fn test_concurrent_creates_yield_unique_ids() {
    let server = start_mock("users").await;
    let client = client_for(&server, "users");
    client.list().await.unwrap();

    let creates = (0..20).map(|i| {
        let client = &client;
        async move { client.create(&fields(json!({"name": format!("user-{}", i)}))).await }
    });
    let results = join_all(creates).await;

    let ids: HashSet<RecordId> = results.into_iter().map(|r| r.unwrap().id).collect();
    assert_eq!(ids.len(), 20);

    let cached = client.snapshot().unwrap();
    assert_eq!(cached.len(), 20);
    let cached_ids: HashSet<RecordId> = cached.iter().map(|r| r.id.clone()).collect();
    assert_eq!(cached_ids, ids);
}

#[tokio::test]
async fn test_mixed_concurrent_operations() {
    let server = start_mock("users").await;
    server
        .state()
        .seed((0..5).map(|i| fields(json!({"name": format!("user-{}", i)}))))
        .await;
    let client = client_for(&server, "users");
    client.list().await.unwrap();

    let a = RecordId::new("1").unwrap();
    let b = RecordId::new("2").unwrap();
    let update_body = json!({"name": "renamed"});
    let create_body = fields(json!({"name": "new"}));
    let (updated, removed, created) = tokio::join!(
        client.update(&a, &update_body),
        client.remove(&b),
        client.create(&create_body),
    );
    let updated = updated.unwrap();
    removed.unwrap();
    let created = created.unwrap();

    let cached = client.snapshot().unwrap();
    assert_eq!(cached.len(), 5);
    assert_eq!(client.cached(&a), Some(updated));
    assert!(client.cached(&b).is_none());
    assert_eq!(client.cached(&created.id), Some(created));
    assert!(client.in_flight().is_empty());
}

#[tokio::test]
async fn test_pending_operation_visible_while_running() {
    let server = start_mock("users").await;
    server.state().seed([fields(json!({"name": "Ada"}))]).await;
    let mut config = fast_config(&server.base_url(), "users");
    config.timeouts.request_ms = 2_000;
    let client: Arc<ResourceClient> = Arc::new(ResourceClient::new(config).unwrap());

    server
        .state()
        .push_faults([Fault::Delay(Duration::from_millis(300))])
        .await;
    let task = {
        let client = client.clone();
        tokio::spawn(async move {
            client
                .update(&RecordId::new("1").unwrap(), &json!({"name": "Bob"}))
                .await
        })
    };

    tokio::time::sleep(Duration::from_millis(100)).await;
    let pending = client.in_flight();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].kind, OperationKind::Update);
    assert_eq!(pending[0].target_id.as_ref().map(RecordId::as_str), Some("1"));
    assert_eq!(pending[0].state, OperationState::Pending);

    task.await.unwrap().unwrap();
    assert!(client.in_flight().is_empty());
}

#[tokio::test]
async fn test_cancelled_update_leaves_cache_untouched() {
    let server = start_mock("users").await;
    server.state().seed([fields(json!({"name": "Ada"}))]).await;
    let mut config = fast_config(&server.base_url(), "users");
    config.timeouts.request_ms = 2_000;
    let client: ResourceClient = ResourceClient::new(config).unwrap();
    let before = client.list().await.unwrap();

    server
        .state()
        .push_faults([Fault::Delay(Duration::from_millis(500))])
        .await;
    let id = RecordId::new("1").unwrap();
    let outcome = tokio::time::timeout(
        Duration::from_millis(50),
        client.update(&id, &json!({"name": "Bob"})),
    )
    .await;
    assert!(outcome.is_err(), "update should have been cancelled");

    assert_eq!(client.snapshot().unwrap().as_slice(), before.as_slice());
    assert!(client.in_flight().is_empty());

    // Still usable afterwards.
    let updated = client.update(&id, &json!({"name": "Cy"})).await.unwrap();
    assert_eq!(client.cached(&id), Some(updated));
}
