mod common;

use serde_json::json;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Error as WsError;

use common::{TestApp, connect, connect_ready, next_close, next_json, send_json};

#[tokio::test]
async fn test_connected_author_receives_comment_then_unread_count() {
    let app = TestApp::new();
    let addr = app.spawn().await;
    let (alice, token) = app.user("alice").await;
    let (bob, _) = app.user("bob").await;
    let post = app.store.insert_post("Alice's post", "Body").await;
    let comment = app.store.insert_comment(post, "Nice one").await;

    let mut ws = connect_ready(addr, &token).await;
    app.state
        .realtime
        .publisher()
        .comment_created(alice, bob, comment)
        .await
        .expect("publish");

    let frame = next_json(&mut ws).await;
    assert_eq!(frame["type"], "new_notification");
    assert_eq!(frame["notification"]["type"], "comment");
    assert_eq!(frame["notification"]["post_id"], json!(post));
    assert_eq!(frame["notification"]["viewed"], false);
    assert_eq!(frame["notification"]["actors"][0]["username"], "bob");

    let frame = next_json(&mut ws).await;
    assert_eq!(frame, json!({"type": "unread_count", "count": 1}));
}

#[tokio::test]
async fn test_each_new_connection_supersedes_the_previous() {
    let app = TestApp::new();
    let addr = app.spawn().await;
    let (_, token) = app.user("alice").await;

    let mut current = connect_ready(addr, &token).await;
    for _ in 0..3 {
        let next = connect_ready(addr, &token).await;
        let mut previous = std::mem::replace(&mut current, next);

        let (code, reason) = next_close(&mut previous).await.expect("close frame");
        assert_eq!(code, 1000);
        assert_eq!(reason, "superseded by new connection");
        assert_eq!(app.state.realtime.registry().connection_count(), 1);
    }

    send_json(&mut current, json!({"type": "ping"})).await;
    assert_eq!(next_json(&mut current).await["type"], "pong");
    assert_eq!(app.state.realtime.registry().connection_count(), 1);
}

#[tokio::test]
async fn test_invalid_token_closed_with_policy_violation() {
    let app = TestApp::new();
    let addr = app.spawn().await;

    let mut ws = connect(addr, "not-a-token").await;
    let (code, _) = next_close(&mut ws).await.expect("close frame");
    assert_eq!(code, 1008);
    assert_eq!(app.state.realtime.registry().connection_count(), 0);
}

#[tokio::test]
async fn test_token_for_deleted_user_closed_with_policy_violation() {
    let app = TestApp::new();
    let addr = app.spawn().await;
    let token = app.token_for(herald_core::types::id::UserId::new(), "ghost");

    let mut ws = connect(addr, &token).await;
    let (code, _) = next_close(&mut ws).await.expect("close frame");
    assert_eq!(code, 1008);
}

#[tokio::test]
async fn test_missing_token_rejected_before_upgrade() {
    let app = TestApp::new();
    let addr = app.spawn().await;

    match connect_async(format!("ws://{addr}/ws")).await {
        Err(WsError::Http(response)) => assert_eq!(response.status(), 401),
        other => panic!("expected HTTP 401, got {:?}", other.map(|_| ())),
    }
}

#[tokio::test]
async fn test_offline_notification_listed_after_reconnect() {
    let app = TestApp::new();
    let addr = app.spawn().await;
    let (alice, token) = app.user("alice").await;
    let (bob, _) = app.user("bob").await;
    let post = app.store.insert_post("Post", "Body").await;
    let comment = app.store.insert_comment(post, "While you were away").await;

    let created = app
        .state
        .realtime
        .publisher()
        .comment_created(alice, bob, comment)
        .await
        .expect("publish")
        .expect("not suppressed");

    let mut ws = connect_ready(addr, &token).await;
    send_json(&mut ws, json!({"type": "get_notifications"})).await;
    let frame = next_json(&mut ws).await;
    assert_eq!(frame["type"], "notifications_list");
    assert_eq!(frame["notifications"][0]["id"], json!(created.id));
    assert_eq!(frame["notifications"][0]["viewed"], false);

    send_json(
        &mut ws,
        json!({"type": "mark_viewed", "notificationIds": [created.id]}),
    )
    .await;
    assert_eq!(
        next_json(&mut ws).await,
        json!({"type": "unread_count", "count": 0})
    );
}

#[tokio::test]
async fn test_malformed_frame_keeps_connection_open() {
    let app = TestApp::new();
    let addr = app.spawn().await;
    let (_, token) = app.user("alice").await;
    let mut ws = connect_ready(addr, &token).await;

    ws_send_text(&mut ws, "{not json").await;
    let frame = next_json(&mut ws).await;
    assert_eq!(frame["type"], "error");
    assert_eq!(frame["code"], "INVALID_MESSAGE");

    send_json(&mut ws, json!({"type": "subscribe", "channel": "x"})).await;
    send_json(&mut ws, json!({"type": "ping"})).await;
    assert_eq!(next_json(&mut ws).await["type"], "pong");
}

#[tokio::test]
async fn test_preferences_round_trip_over_live_connection() {
    let app = TestApp::new();
    let addr = app.spawn().await;
    let (_, token) = app.user("alice").await;
    let mut ws = connect_ready(addr, &token).await;

    send_json(&mut ws, json!({"type": "get_preferences"})).await;
    assert_eq!(
        next_json(&mut ws).await,
        json!({
            "type": "notification_preferences",
            "preferences": {"email_notifications": true, "push_notifications": true}
        })
    );

    send_json(
        &mut ws,
        json!({
            "type": "update_preferences",
            "preferences": {"email_notifications": false, "push_notifications": true}
        }),
    )
    .await;
    assert_eq!(
        next_json(&mut ws).await["preferences"],
        json!({"email_notifications": false, "push_notifications": true})
    );
}

#[tokio::test]
async fn test_shutdown_closes_with_going_away() {
    let app = TestApp::new();
    let addr = app.spawn().await;
    let (_, token) = app.user("alice").await;
    let mut ws = connect_ready(addr, &token).await;

    assert_eq!(app.state.realtime.shutdown(), 1);
    let (code, _) = next_close(&mut ws).await.expect("close frame");
    assert_eq!(code, 1001);
}

async fn ws_send_text(ws: &mut common::Client, text: &str) {
    use futures::SinkExt;
    use tokio_tungstenite::tungstenite::Message;
    ws.send(Message::text(text)).await.expect("send");
}
