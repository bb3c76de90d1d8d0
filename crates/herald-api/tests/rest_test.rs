mod common;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::{Value, json};
use tower::ServiceExt;

use herald_core::types::id::{NotificationId, UserId};

use common::{TestApp, connect_ready, next_json};

async fn call(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.expect("response");
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("json body")
    };
    (status, body)
}

fn get(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header("authorization", format!("Bearer {token}"))
        .body(Body::empty())
        .expect("request")
}

fn post(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("authorization", format!("Bearer {token}"))
        .body(Body::empty())
        .expect("request")
}

async fn seed_comments(app: &TestApp, recipient: UserId, count: usize) -> Vec<NotificationId> {
    let actor = app.store.insert_user("commenter", None).await;
    let post = app.store.insert_post("Post", "Body").await;
    let mut ids = Vec::new();
    for i in 0..count {
        let comment = app.store.insert_comment(post, &format!("comment {i}")).await;
        let n = app
            .state
            .realtime
            .publisher()
            .comment_created(recipient, actor, comment)
            .await
            .expect("publish")
            .expect("not suppressed");
        ids.push(n.id);
    }
    ids
}

#[tokio::test]
async fn test_requests_without_credentials_are_unauthorized() {
    let app = TestApp::new();
    let router = app.router();

    let request = Request::builder()
        .uri("/api/notifications/unread-count")
        .body(Body::empty())
        .expect("request");
    let (status, body) = call(&router, request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "UNAUTHORIZED");

    let (status, _) = call(&router, get("/api/notifications", "garbage")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_unread_count_and_mark_all_viewed() {
    let app = TestApp::new();
    let router = app.router();
    let (alice, token) = app.user("alice").await;
    seed_comments(&app, alice, 3).await;

    let (status, body) = call(&router, get("/api/notifications/unread-count", &token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["count"], 3);

    let (status, body) = call(&router, post("/api/notifications/viewed", &token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["count"], 0);

    let (_, body) = call(&router, get("/api/notifications/unread-count", &token)).await;
    assert_eq!(body["data"]["count"], 0);
}

#[tokio::test]
async fn test_list_is_paginated_newest_first() {
    let app = TestApp::new();
    let router = app.router();
    let (alice, token) = app.user("alice").await;
    let ids = seed_comments(&app, alice, 5).await;

    let (status, body) = call(
        &router,
        get("/api/notifications?page=1&per_page=2", &token),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let data = &body["data"];
    assert_eq!(data["total_items"], 5);
    assert_eq!(data["total_pages"], 3);
    assert_eq!(data["items"][0]["id"], json!(ids[4]));
    assert_eq!(data["items"][1]["id"], json!(ids[3]));
    assert_eq!(data["items"][0]["post_title"], "Post");
}

#[tokio::test]
async fn test_page_past_the_end_is_empty() {
    let app = TestApp::new();
    let router = app.router();
    let (alice, token) = app.user("alice").await;
    seed_comments(&app, alice, 2).await;

    let (status, body) = call(
        &router,
        get(&format!("/api/notifications?page={}", u64::MAX), &token),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["items"], json!([]));
    assert_eq!(body["data"]["total_items"], 2);
    assert_eq!(body["data"]["has_next"], false);
}

#[tokio::test]
async fn test_mark_opened_is_scoped_to_caller() {
    let app = TestApp::new();
    let router = app.router();
    let (alice, _) = app.user("alice").await;
    let (_, bob_token) = app.user("bob").await;
    let ids = seed_comments(&app, alice, 1).await;

    let (status, _) = call(
        &router,
        post(&format!("/api/notifications/{}/opened", ids[0]), &bob_token),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let alice_token = app.token_for(alice, "alice");
    let (status, body) = call(
        &router,
        post(&format!("/api/notifications/{}/opened", ids[0]), &alice_token),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["opened"], true);
}

#[tokio::test]
async fn test_preferences_replace_and_read_back() {
    let app = TestApp::new();
    let router = app.router();
    let (_, token) = app.user("alice").await;

    let (_, body) = call(&router, get("/api/notifications/preferences", &token)).await;
    assert_eq!(
        body["data"],
        json!({"email_notifications": true, "push_notifications": true})
    );

    let request = Request::builder()
        .method("PUT")
        .uri("/api/notifications/preferences")
        .header("authorization", format!("Bearer {token}"))
        .header("content-type", "application/json")
        .body(Body::from(
            json!({"email_notifications": false, "push_notifications": false}).to_string(),
        ))
        .expect("request");
    let (status, body) = call(&router, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["data"],
        json!({"email_notifications": false, "push_notifications": false})
    );
}

#[tokio::test]
async fn test_rest_mark_all_viewed_updates_live_connection() {
    let app = TestApp::new();
    let addr = app.spawn().await;
    let router = app.router();
    let (alice, token) = app.user("alice").await;
    let mut ws = connect_ready(addr, &token).await;

    seed_comments(&app, alice, 1).await;
    assert_eq!(next_json(&mut ws).await["type"], "new_notification");
    assert_eq!(next_json(&mut ws).await["count"], 1);

    let (status, _) = call(&router, post("/api/notifications/viewed", &token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        next_json(&mut ws).await,
        json!({"type": "unread_count", "count": 0})
    );
}

#[tokio::test]
async fn test_health_reports_connections() {
    let app = TestApp::new();
    let router = app.router();

    let request = Request::builder()
        .uri("/api/health")
        .body(Body::empty())
        .expect("request");
    let (status, body) = call(&router, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "ok");
    assert_eq!(body["data"]["connections"], 0);
}
