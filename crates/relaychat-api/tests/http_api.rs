//! Router-level integration tests.
//!
//! Each test assembles the full HTTP surface against a throwaway SQLite
//! database and a scripted provider, then drives it with `oneshot` requests.

use std::sync::Arc;
use std::sync::Mutex;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use futures_util::stream;
use tower::util::ServiceExt;

use relaychat_api::http::router::build_router;
use relaychat_api::state::AppState;
use relaychat_core::llm::provider::{FragmentStream, TextProvider};
use relaychat_infra::sqlite::chat::SqliteSessionStore;
use relaychat_infra::sqlite::pool::DatabasePool;
use relaychat_types::config::AppConfig;
use relaychat_types::provider::{GenerateRequest, ProviderError};

/// Provider that replays pre-scripted fragment sequences, newest-first pop.
struct ScriptedProvider {
    scripts: Mutex<Vec<Vec<Result<String, ProviderError>>>>,
}

impl ScriptedProvider {
    fn new(scripts: Vec<Vec<Result<String, ProviderError>>>) -> Self {
        Self {
            scripts: Mutex::new(scripts),
        }
    }

    fn replying(fragments: &[&str]) -> Self {
        Self::new(vec![fragments.iter().map(|f| Ok(f.to_string())).collect()])
    }
}

impl TextProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    fn stream(&self, _request: GenerateRequest) -> FragmentStream {
        let script = self.scripts.lock().unwrap().pop().unwrap_or_default();
        Box::pin(stream::iter(script))
    }
}

async fn test_app(provider: ScriptedProvider) -> Router {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("test.db");
    let url = format!("sqlite://{}?mode=rwc", db_path.display());
    // Leak tempdir so the database survives the whole test
    std::mem::forget(dir);

    let pool = DatabasePool::new(&url).await.unwrap();
    let store = Arc::new(SqliteSessionStore::new(pool));
    let state = AppState::from_parts(store, Arc::new(provider), AppConfig::default());
    build_router(state)
}

fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_stream_chat_delivers_and_persists_turn() {
    let app = test_app(ScriptedProvider::replying(&["Hel", "lo!"])).await;

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/v1/chat/stream",
            serde_json::json!({ "prompt": "hi", "sessionId": "s1" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(content_type.starts_with("text/plain"));

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(&bytes[..], b"Hello!");

    // History shows [user "hi", model "Hello!"] in order.
    let response = app.oneshot(get("/api/v1/chat/history/s1")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    let messages = json["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0]["role"], "user");
    assert_eq!(messages[0]["content"], "hi");
    assert!(messages[0]["timestamp"].is_string());
    assert_eq!(messages[1]["role"], "model");
    assert_eq!(messages[1]["content"], "Hello!");
}

#[tokio::test]
async fn test_stream_chat_rejects_empty_prompt() {
    let app = test_app(ScriptedProvider::replying(&["unused"])).await;

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/v1/chat/stream",
            serde_json::json!({ "prompt": "", "sessionId": "s1" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["error"]["code"], "VALIDATION_ERROR");

    // No session was created, no provider call was made.
    let response = app.oneshot(get("/api/v1/chat/history/s1")).await.unwrap();
    let json = body_json(response).await;
    assert_eq!(json["messages"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_stream_chat_provider_rejection_is_structured() {
    let app = test_app(ScriptedProvider::new(vec![vec![Err(
        ProviderError::Rejected {
            message: "quota exhausted".to_string(),
        },
    )]]))
    .await;

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/v1/chat/stream",
            serde_json::json!({ "prompt": "hi", "sessionId": "s1" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let json = body_json(response).await;
    assert_eq!(json["error"]["code"], "PROVIDER_ERROR");

    // Write-ahead: the user message survived the failed call.
    let response = app.oneshot(get("/api/v1/chat/history/s1")).await.unwrap();
    let json = body_json(response).await;
    let messages = json["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0]["role"], "user");
}

#[tokio::test]
async fn test_stream_chat_mid_stream_failure_aborts_body() {
    let app = test_app(ScriptedProvider::new(vec![vec![
        Ok("partial".to_string()),
        Err(ProviderError::Stream("connection reset".to_string())),
    ]]))
    .await;

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/v1/chat/stream",
            serde_json::json!({ "prompt": "hi", "sessionId": "s1" }),
        ))
        .await
        .unwrap();

    // Streaming already started, so the status is 200 but the body errors
    // out instead of ending cleanly.
    assert_eq!(response.status(), StatusCode::OK);
    let result = axum::body::to_bytes(response.into_body(), usize::MAX).await;
    assert!(result.is_err());

    // Nothing but the user message was persisted.
    let response = app.oneshot(get("/api/v1/chat/history/s1")).await.unwrap();
    let json = body_json(response).await;
    assert_eq!(json["messages"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_history_unknown_session_is_empty_not_404() {
    let app = test_app(ScriptedProvider::replying(&[])).await;

    let response = app.oneshot(get("/api/v1/chat/history/ghost")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["messages"], serde_json::json!([]));
}

#[tokio::test]
async fn test_history_is_owner_scoped() {
    let app = test_app(ScriptedProvider::replying(&["Hello!"])).await;

    app.clone()
        .oneshot(post_json(
            "/api/v1/chat/stream",
            serde_json::json!({ "prompt": "hi", "sessionId": "s1" }),
        ))
        .await
        .unwrap();

    // A different caller probing the same id sees an empty history.
    let request = Request::builder()
        .uri("/api/v1/chat/history/s1")
        .header("x-user-id", "bob")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["messages"], serde_json::json!([]));
}

#[tokio::test]
async fn test_sessions_list_orders_and_derives_titles() {
    let app = test_app(ScriptedProvider::new(vec![
        vec![Ok("third".to_string())],
        vec![Ok("second".to_string())],
        vec![Ok("first".to_string())],
    ]))
    .await;

    // Touch a, then b, then a again.
    for (session, prompt) in [("a", "plan my trip"), ("b", "write a poem"), ("a", "more")] {
        app.clone()
            .oneshot(post_json(
                "/api/v1/chat/stream",
                serde_json::json!({ "prompt": prompt, "sessionId": session }),
            ))
            .await
            .unwrap();
        // Let the spawned drive task finish persisting before the next turn.
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    }

    let response = app.oneshot(get("/api/v1/chat/sessions")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    let sessions = json.as_array().unwrap();
    assert_eq!(sessions.len(), 2);
    assert_eq!(sessions[0]["sessionId"], "a");
    assert_eq!(sessions[1]["sessionId"], "b");
    // Derived from each session's first user message.
    assert_eq!(sessions[0]["title"], "plan my trip");
    assert_eq!(sessions[1]["title"], "write a poem");
    assert!(sessions[0]["createdAt"].is_string());
    assert!(sessions[0]["updatedAt"].is_string());
}

#[tokio::test]
async fn test_rename_updates_listed_title() {
    let app = test_app(ScriptedProvider::replying(&["Hello!"])).await;

    app.clone()
        .oneshot(post_json(
            "/api/v1/chat/stream",
            serde_json::json!({ "prompt": "hi", "sessionId": "s1" }),
        ))
        .await
        .unwrap();
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;

    let request = Request::builder()
        .method("PUT")
        .uri("/api/v1/chat/rename/s1")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            serde_json::json!({ "title": "Greetings" }).to_string(),
        ))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["renamed"], true);

    let response = app.oneshot(get("/api/v1/chat/sessions")).await.unwrap();
    let json = body_json(response).await;
    assert_eq!(json[0]["title"], "Greetings");
}

#[tokio::test]
async fn test_rename_unknown_session_is_404() {
    let app = test_app(ScriptedProvider::replying(&[])).await;

    let request = Request::builder()
        .method("PUT")
        .uri("/api/v1/chat/rename/ghost")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            serde_json::json!({ "title": "nope" }).to_string(),
        ))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_session_then_404() {
    let app = test_app(ScriptedProvider::replying(&["Hello!"])).await;

    app.clone()
        .oneshot(post_json(
            "/api/v1/chat/stream",
            serde_json::json!({ "prompt": "hi", "sessionId": "s1" }),
        ))
        .await
        .unwrap();
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;

    let delete = |uri: &str| {
        Request::builder()
            .method("DELETE")
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    };

    let response = app.clone().oneshot(delete("/api/v1/chat/s1")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["deleted"], true);

    let response = app.clone().oneshot(delete("/api/v1/chat/s1")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = body_json(response).await;
    assert_eq!(json["error"]["code"], "SESSION_NOT_FOUND");

    // History of the deleted session is empty again.
    let response = app.oneshot(get("/api/v1/chat/history/s1")).await.unwrap();
    let json = body_json(response).await;
    assert_eq!(json["messages"], serde_json::json!([]));
}

#[tokio::test]
async fn test_health() {
    let app = test_app(ScriptedProvider::replying(&[])).await;

    let response = app.oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
}
