//! Tests for the HTTP remote source against a mock endpoint.

use quotesync_engine::{Error, MemoryPersistence, QuoteRecord, Store, SyncResult};
use quotesync_server::remote::{HttpFetcher, RemoteFetcher};
use quotesync_server::scheduler::{Scheduler, SchedulerConfig, SyncOutcome};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn fetcher_for(server: &MockServer) -> HttpFetcher {
    HttpFetcher::new(format!("{}/posts", server.uri()), Duration::from_secs(5)).unwrap()
}

fn posts() -> serde_json::Value {
    json!([
        {"userId": 1, "id": 1, "title": "sunt aut facere", "body": "quia et suscipit"},
        {"userId": 1, "id": 2, "title": "qui est esse", "body": "est rerum tempore"},
        {"userId": 2, "id": 3, "title": "   ", "body": "dropped"},
        {"id": 4, "title": "eum et est occaecati", "body": "ullam et saepe"}
    ])
}

#[tokio::test]
async fn fetches_and_maps_posts() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/posts"))
        .and(query_param("_limit", "10"))
        .respond_with(ResponseTemplate::new(200).set_body_json(posts()))
        .expect(1)
        .mount(&server)
        .await;

    let batch = fetcher_for(&server).await.fetch_batch(10).await.unwrap();

    assert_eq!(
        batch,
        vec![
            QuoteRecord::new("sunt aut facere", "Category 1").unwrap(),
            QuoteRecord::new("qui est esse", "Category 1").unwrap(),
            QuoteRecord::new("eum et est occaecati", "Category Server").unwrap(),
        ]
    );
}

#[tokio::test]
async fn non_success_status_is_remote_unavailable() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let err = fetcher_for(&server).await.fetch_batch(10).await.unwrap_err();

    match err {
        Error::RemoteUnavailable(msg) => assert!(msg.contains("503"), "{}", msg),
        other => panic!("expected RemoteUnavailable, got {:?}", other),
    }
}

#[tokio::test]
async fn malformed_payload_is_remote_unavailable() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"posts": []})))
        .mount(&server)
        .await;

    let err = fetcher_for(&server).await.fetch_batch(10).await.unwrap_err();

    match err {
        Error::RemoteUnavailable(msg) => assert!(msg.starts_with("malformed payload"), "{}", msg),
        other => panic!("expected RemoteUnavailable, got {:?}", other),
    }
}

#[tokio::test]
async fn slow_remote_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(posts())
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let fetcher =
        HttpFetcher::new(format!("{}/posts", server.uri()), Duration::from_millis(100)).unwrap();

    assert!(matches!(
        fetcher.fetch_batch(10).await,
        Err(Error::RemoteUnavailable(_))
    ));
}

#[tokio::test]
async fn publish_posts_title_and_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/posts"))
        .and(body_json(json!({"title": "Stay curious", "body": "Life"})))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    let quote = QuoteRecord::new("Stay curious", "Life").unwrap();
    fetcher_for(&server).await.publish(&quote).await.unwrap();
}

#[tokio::test]
async fn scheduler_sync_against_mock_remote() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/posts"))
        .and(query_param("_limit", "3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"userId": 1, "title": "Be bold"},
            {"userId": 2, "title": "Stay curious"}
        ])))
        .mount(&server)
        .await;

    let persistence = MemoryPersistence::new();
    let store = Arc::new(tokio::sync::Mutex::new(Store::with_quotes(
        vec![QuoteRecord::new("Be bold", "Wisdom").unwrap()],
        persistence.clone(),
    )));
    let scheduler = Scheduler::new(
        store.clone(),
        Arc::new(fetcher_for(&server).await),
        SchedulerConfig {
            interval: Duration::from_secs(30),
            batch_limit: 3,
        },
    );

    let first = scheduler.trigger().await;
    let second = scheduler.trigger().await;

    match first {
        SyncOutcome::Completed { result, .. } => assert_eq!(
            result,
            SyncResult {
                added_count: 1,
                conflict_count: 1
            }
        ),
        other => panic!("expected completed sync, got {:?}", other),
    }
    match second {
        SyncOutcome::Completed { result, .. } => assert_eq!(result, SyncResult::default()),
        other => panic!("expected completed sync, got {:?}", other),
    }

    assert_eq!(persistence.save_count(), 1);
    assert_eq!(
        store.lock().await.list(None)[0].category(),
        "Category 1"
    );
}
