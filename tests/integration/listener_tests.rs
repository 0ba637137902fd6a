//! Listener-mode tests over a real TCP socket.
//!
//! Tests verify the same pipeline behaves identically when served by
//! `serve_listener` rather than invoked directly.

use std::net::SocketAddr;

use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use medilink_api::serve_listener;

use super::test_utils::{test_router, TEST_ORIGIN};

async fn start_server() -> (SocketAddr, JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let handle = tokio::spawn(async move {
        serve_listener(listener, test_router()).await.unwrap();
    });

    (addr, handle)
}

#[tokio::test]
async fn test_listener_serves_health() {
    let (addr, server) = start_server().await;

    let response = reqwest::get(format!("http://{}/api/health", addr))
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::OK);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body, json!({"status": "OK", "message": "Server is running"}));

    server.abort();
}

#[tokio::test]
async fn test_listener_matches_direct_invocation() {
    let (addr, server) = start_server().await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("http://{}/api/v1/album", addr))
        .header("origin", TEST_ORIGIN)
        .header("cookie", "token=abc")
        .json(&json!({"title": "Ultrasound"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::OK);
    assert_eq!(
        response
            .headers()
            .get("access-control-allow-origin")
            .unwrap(),
        TEST_ORIGIN
    );
    let body: Value = response.json().await.unwrap();
    assert_eq!(body, json!({"payload": {"title": "Ultrasound"}}));

    let response = client
        .get(format!("http://{}/does/not/exist", addr))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::NOT_FOUND);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body, json!({"message": "Route not found"}));

    server.abort();
}

#[tokio::test]
async fn test_listener_survives_handler_panic() {
    let (addr, server) = start_server().await;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("http://{}/api/v1/album/panic", addr))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["message"], "Internal server error");

    let response = client
        .get(format!("http://{}/api/health", addr))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::OK);

    server.abort();
}
