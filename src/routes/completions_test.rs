use std::sync::Arc;

use axum::Router;
use axum::body::to_bytes;
use axum::http::Request;
use axum::http::header::COOKIE;
use axum::routing::post;
use tower::ServiceExt;

use super::*;
use crate::backend::completions::CompletionsClient;
use crate::config::{CompletionsConfig, HttpTimeouts};
use crate::routes::app;
use crate::state::test_helpers::{self, MockAuthProvider, MockBackend};

fn sse_chunk(content: &str) -> String {
    format!(
        "data: {}\n\n",
        serde_json::json!({ "choices": [{ "index": 0, "delta": { "content": content } }] })
    )
}

/// Serve a fixed SSE body at `/chat/completions` and return the base URL.
async fn spawn_upstream(status: StatusCode, body: String) -> String {
    let upstream = Router::new().route(
        "/chat/completions",
        post(move || {
            let body = body.clone();
            async move { (status, [(CONTENT_TYPE, "text/event-stream")], body) }
        }),
    );
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, upstream).await.unwrap();
    });
    format!("http://{addr}")
}

fn state_with_completions(base_url: Option<String>) -> AppState {
    let state = test_helpers::test_app_state_with(
        Arc::new(MockAuthProvider::new().with_session("good", "user-1")),
        Arc::new(MockBackend::new()),
    );
    let client = base_url.map(|base_url| {
        let config = CompletionsConfig { api_key: "sk-test".into(), base_url, model: "gpt-test".into() };
        Arc::new(CompletionsClient::new(&config, HttpTimeouts::default()).unwrap())
    });
    state.with_completions(client)
}

async fn post_chat(state: AppState) -> Response {
    let body = serde_json::json!({ "messages": [{ "role": "user", "content": "hi" }] });
    let request = Request::builder()
        .method("POST")
        .uri("/api/chat")
        .header(COOKIE, "session_token=good")
        .header(CONTENT_TYPE, "application/json")
        .body(axum::body::Body::from(body.to_string()))
        .unwrap();
    app(state).oneshot(request).await.unwrap()
}

#[test]
fn completion_error_statuses() {
    assert_eq!(completion_error_to_status(&CompletionError::Request("x".into())), StatusCode::BAD_GATEWAY);
    assert_eq!(
        completion_error_to_status(&CompletionError::Response { status: 401, body: String::new() }),
        StatusCode::BAD_GATEWAY
    );
    assert_eq!(
        completion_error_to_status(&CompletionError::HttpClientBuild("x".into())),
        StatusCode::INTERNAL_SERVER_ERROR
    );
}

#[tokio::test]
async fn unconfigured_is_service_unavailable() {
    let response = post_chat(state_with_completions(None)).await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn streams_concatenated_deltas() {
    let body = format!("{}{}data: [DONE]\n\n", sse_chunk("Hello, "), sse_chunk("world"));
    let base_url = spawn_upstream(StatusCode::OK, body).await;

    let response = post_chat(state_with_completions(Some(base_url))).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(CONTENT_TYPE).and_then(|v| v.to_str().ok()),
        Some("text/plain; charset=utf-8")
    );
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..], b"Hello, world");
}

#[tokio::test]
async fn upstream_error_is_bad_gateway() {
    let base_url = spawn_upstream(StatusCode::UNAUTHORIZED, "{\"error\":\"bad key\"}".into()).await;
    let response = post_chat(state_with_completions(Some(base_url))).await;
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn requires_session() {
    let state = state_with_completions(None);
    let request = Request::builder()
        .method("POST")
        .uri("/api/chat")
        .header(CONTENT_TYPE, "application/json")
        .body(axum::body::Body::from("{\"messages\":[]}"))
        .unwrap();
    let response = app(state).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
