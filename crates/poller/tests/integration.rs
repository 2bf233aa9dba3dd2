//! Integration tests for the GitHub feed client and the full relay cycle.
//!
//! A fake GitHub API and a fake webhook receiver run in-process on ephemeral
//! ports; state is written to a temporary directory.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{TimeZone, Utc};
use serde_json::{Value, json};

use octoping_common::error::FetchError;
use octoping_common::traits::NotificationFeed;
use octoping_engine::pipeline::DeliveryPipeline;
use octoping_engine::relay::Relay;
use octoping_engine::render::Renderer;
use octoping_engine::state::StateStore;
use octoping_notifier::WebhookNotifier;
use octoping_poller::github::GithubFeed;

const TOKEN: &str = "ghp_test_token";

// ============================================================
// Fake GitHub
// ============================================================

#[derive(Clone, Default)]
struct FakeGithub {
    items: Arc<Mutex<Vec<Value>>>,
    requests: Arc<Mutex<Vec<(HeaderMap, HashMap<String, String>)>>>,
}

async fn list_notifications(
    State(gh): State<FakeGithub>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Result<Json<Value>, StatusCode> {
    gh.requests
        .lock()
        .unwrap()
        .push((headers.clone(), query.clone()));

    let authorized = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == format!("Bearer {}", TOKEN));
    if !authorized {
        return Err(StatusCode::UNAUTHORIZED);
    }

    Ok(Json(Value::Array(gh.items.lock().unwrap().clone())))
}

async fn spawn_server(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

async fn spawn_github(items: Vec<Value>) -> (String, FakeGithub) {
    let gh = FakeGithub::default();
    *gh.items.lock().unwrap() = items;
    let router = Router::new()
        .route("/notifications", get(list_notifications))
        .with_state(gh.clone());
    (spawn_server(router).await, gh)
}

type Received = Arc<Mutex<Vec<Value>>>;

async fn record_delivery(State(received): State<Received>, Json(body): Json<Value>) -> StatusCode {
    received.lock().unwrap().push(body);
    StatusCode::NO_CONTENT
}

async fn spawn_webhook() -> (String, Received) {
    let received: Received = Arc::default();
    let router = Router::new()
        .route("/hook", post(record_delivery))
        .with_state(received.clone());
    (format!("{}/hook", spawn_server(router).await), received)
}

fn thread(id: &str, updated_at: &str, reason: &str) -> Value {
    json!({
        "id": id,
        "unread": true,
        "reason": reason,
        "updated_at": updated_at,
        "last_read_at": null,
        "repository": { "id": 1296269, "full_name": "octocat/Hello-World" },
        "subject": {
            "title": format!("Thread {}", id),
            "url": format!("__API__/repos/octocat/Hello-World/issues/{}", id),
            "latest_comment_url": null,
            "type": "Issue"
        },
        "url": format!("__API__/notifications/threads/{}", id)
    })
}

/// Substitute the fake server's base URL into subject links.
fn with_api_base(items: Vec<Value>, base: &str) -> Vec<Value> {
    items
        .into_iter()
        .map(|v| serde_json::from_str(&v.to_string().replace("__API__", base)).unwrap())
        .collect()
}

// ============================================================
// Feed client
// ============================================================

#[tokio::test]
async fn test_fetch_sends_expected_request() {
    let (base, gh) = spawn_github(vec![]).await;
    *gh.items.lock().unwrap() = with_api_base(
        vec![
            thread("2", "2024-05-01T10:05:00Z", "mention"),
            thread("1", "2024-05-01T10:00:00Z", "comment"),
        ],
        &base,
    );

    let feed = GithubFeed::new(base.clone(), TOKEN);
    let notifications = feed.fetch().await.unwrap();

    // Order preserved as returned by the API
    let ids: Vec<_> = notifications.iter().map(|n| n.id.as_str()).collect();
    assert_eq!(ids, vec!["2", "1"]);
    assert_eq!(notifications[0].repository.full_name, "octocat/Hello-World");

    let requests = gh.requests.lock().unwrap();
    assert_eq!(requests.len(), 1);
    let (headers, query) = &requests[0];
    assert_eq!(query.get("all").map(String::as_str), Some("false"));
    assert_eq!(headers["accept"], "application/vnd.github+json");
    assert_eq!(headers["user-agent"], "octoping");
    assert_eq!(headers["x-github-api-version"], "2022-11-28");
}

#[tokio::test]
async fn test_fetch_maps_http_error() {
    let (base, _gh) = spawn_github(vec![]).await;
    let feed = GithubFeed::new(base, "wrong-token");

    let err = feed.fetch().await.unwrap_err();
    assert!(matches!(err, FetchError::Http { status: 401, .. }));
}

#[tokio::test]
async fn test_fetch_maps_undecodable_body() {
    let router = Router::new().route("/notifications", get(|| async { "definitely not json" }));
    let base = spawn_server(router).await;

    let err = GithubFeed::new(base, TOKEN).fetch().await.unwrap_err();
    assert!(matches!(err, FetchError::Decode(_)));
}

#[tokio::test]
async fn test_fetch_maps_transport_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = GithubFeed::new(format!("http://{}", addr), TOKEN)
        .fetch()
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::Network(_)));
}

#[tokio::test]
async fn test_fetch_times_out_on_stalled_api() {
    let router = Router::new().route(
        "/notifications",
        get(|| async {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Json(json!([]))
        }),
    );
    let base = spawn_server(router).await;
    let feed = GithubFeed::new(base, TOKEN).with_timeout(Duration::from_millis(200));

    let result = tokio::time::timeout(Duration::from_secs(10), feed.fetch())
        .await
        .expect("fetch should be bounded by its own timeout");

    match result {
        Err(FetchError::Network(e)) => assert!(e.is_timeout(), "expected timeout, got {e}"),
        other => panic!("expected network timeout, got {other:?}"),
    }
}

#[tokio::test]
async fn test_fetch_skips_malformed_records() {
    let (base, gh) = spawn_github(vec![]).await;
    let mut items = with_api_base(
        vec![
            thread("3", "2024-05-01T10:03:00Z", "mention"),
            thread("2", "2024-05-01T10:02:00Z", "comment"),
            thread("1", "2024-05-01T10:01:00Z", "assign"),
        ],
        &base,
    );
    items[0]["subject"]["title"] = Value::Null;
    items[1].as_object_mut().unwrap().remove("repository");
    *gh.items.lock().unwrap() = items;

    let notifications = GithubFeed::new(base, TOKEN).fetch().await.unwrap();

    let ids: Vec<_> = notifications.iter().map(|n| n.id.as_str()).collect();
    assert_eq!(ids, vec!["1"]);
}

// ============================================================
// End to end
// ============================================================

#[tokio::test]
async fn test_relay_cycle_end_to_end() {
    let (api_base, gh) = spawn_github(vec![]).await;
    *gh.items.lock().unwrap() = with_api_base(
        vec![
            thread("3", "2024-05-01T10:03:00Z", "mention"),
            thread("2", "2024-05-01T10:02:00Z", "review_requested"),
            thread("1", "2024-05-01T10:01:00Z", "brand_new_reason"),
        ],
        &api_base,
    );
    let (hook_url, received) = spawn_webhook().await;

    let dir = tempfile::tempdir().unwrap();
    let store = StateStore::new(dir.path().join("state/state.json"));

    let mut relay = Relay::start(
        GithubFeed::new(api_base.clone(), TOKEN),
        DeliveryPipeline::new(
            WebhookNotifier::new(hook_url),
            Renderer::new(&api_base, "https://github.example"),
        ),
        store.clone(),
        Duration::from_secs(60),
    )
    .await
    .unwrap();

    let outcome = relay.run_cycle().await.unwrap();
    assert_eq!(outcome.delivered, 3);

    {
        let bodies = received.lock().unwrap();
        let ids: Vec<_> = bodies.iter().map(|b| b["id"].as_str().unwrap()).collect();
        assert_eq!(ids, vec!["1", "2", "3"]);

        assert_eq!(bodies[0]["url"], "https://github.example/octocat/Hello-World/issues/1");
        assert!(
            bodies[0]["summary"]
                .as_str()
                .unwrap()
                .contains("You have a notification.")
        );
        assert!(
            bodies[2]["summary"]
                .as_str()
                .unwrap()
                .contains("You were specifically @mentioned in the content.")
        );
        assert_eq!(bodies[2]["raw"]["unread"], true);
    }

    let expected = Utc.with_ymd_and_hms(2024, 5, 1, 10, 3, 0).unwrap();
    assert_eq!(store.load().await.unwrap(), Some(expected));

    // Same feed again: nothing new to deliver
    let outcome = relay.run_cycle().await.unwrap();
    assert_eq!(outcome.delivered, 0);
    assert_eq!(received.lock().unwrap().len(), 3);

    // A newer thread shows up at the top of the feed
    gh.items.lock().unwrap().insert(
        0,
        with_api_base(vec![thread("4", "2024-05-01T10:04:00Z", "assign")], &api_base).remove(0),
    );
    let outcome = relay.run_cycle().await.unwrap();
    assert_eq!(outcome.delivered, 1);
    assert_eq!(received.lock().unwrap()[3]["id"], "4");
}
