//! Routing integration tests.
//!
//! Tests verify:
//! - Literal routes (`/`, `/api/health`)
//! - Dispatch to each of the four mounts
//! - The not-found fallback for every unmatched path

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::json;

use medilink_api::{create_router, Mounts};

use super::test_utils::{body_bytes, body_json, get_request, send, test_config, test_router};

// =============================================================================
// Literal Routes
// =============================================================================

#[tokio::test]
async fn test_root_reports_service_identity() {
    let router = test_router();

    let response = send(&router, get_request("/")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("content-type").unwrap(),
        "application/json"
    );

    let body = body_json(response).await;
    for field in ["message", "version", "status"] {
        let value = body[field].as_str().unwrap_or_default();
        assert!(!value.is_empty(), "field {} should be non-empty", field);
    }
    assert_eq!(body["message"], "Medi-Link API Server");
    assert_eq!(body["status"], "Running");
}

#[tokio::test]
async fn test_health_exact_body() {
    let router = test_router();

    let response = send(&router, get_request("/api/health")).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_bytes(response).await;
    assert_eq!(&body[..], br#"{"status":"OK","message":"Server is running"}"#);
}

#[tokio::test]
async fn test_literal_routes_only_answer_get() {
    let router = test_router();

    for uri in ["/", "/api/health"] {
        let request = Request::builder()
            .method("DELETE")
            .uri(uri)
            .body(Body::empty())
            .unwrap();
        let response = send(&router, request).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "DELETE {}", uri);
        assert_eq!(
            body_json(response).await,
            json!({"message": "Route not found"})
        );
    }
}

// =============================================================================
// Mount Dispatch
// =============================================================================

#[tokio::test]
async fn test_each_mount_receives_its_prefix() {
    let router = test_router();

    let response = send(&router, get_request("/api/v1/album/7")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["mount"], "album");
    assert_eq!(body["id"], "7");
    assert_eq!(body["path"], "/api/v1/album/7");

    let response = send(&router, get_request("/api/v1/image/scan-1")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["mount"], "image");
    assert_eq!(body["id"], "scan-1");

    let response = send(&router, get_request("/api/v1/dashboard/stats")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!({"albums": 0, "images": 0}));

    let response = send(&router, get_request("/api/v1/google/session")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!({"credentials": {}}));
}

#[tokio::test]
async fn test_mount_remainder_routed_inside_mount() {
    let router = test_router();

    // Unknown sub-route inside a mount falls through to the global 404
    let response = send(&router, get_request("/api/v1/image/a/b/c")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        body_json(response).await,
        json!({"message": "Route not found"})
    );
}

#[tokio::test]
async fn test_wrong_method_inside_mount_gets_404() {
    let router = test_router();

    for (method, uri) in [
        ("DELETE", "/api/v1/dashboard/stats"),
        ("PUT", "/api/v1/image/scan-1"),
        ("PUT", "/api/v1/google/session"),
    ] {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap();
        let response = send(&router, request).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{} {}", method, uri);
        assert_eq!(
            response.headers().get("content-type").unwrap(),
            "application/json"
        );
        assert_eq!(
            body_json(response).await,
            json!({"message": "Route not found"})
        );
    }
}

// =============================================================================
// Not Found
// =============================================================================

#[tokio::test]
async fn test_unmatched_paths_get_exact_404() {
    let router = test_router();

    for uri in [
        "/unknown",
        "/api",
        "/api/v1",
        "/api/v2/album/1",
        "/api/v1/albums",
        "/api/v1/images/1",
        "/api/v1/googles",
        "/api/health/extra",
        "/API/HEALTH",
    ] {
        let response = send(&router, get_request(uri)).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "GET {}", uri);
        let body = body_bytes(response).await;
        assert_eq!(&body[..], br#"{"message":"Route not found"}"#, "GET {}", uri);
    }
}

#[tokio::test]
async fn test_default_mounts_fall_through_to_404() {
    let router = create_router(Mounts::default(), test_config());

    for uri in [
        "/api/v1/google/login",
        "/api/v1/album",
        "/api/v1/image/1",
        "/api/v1/dashboard/stats",
    ] {
        let response = send(&router, get_request(uri)).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "GET {}", uri);
        assert_eq!(
            body_json(response).await,
            json!({"message": "Route not found"})
        );
    }

    // Literal routes still work without any feature routes
    let response = send(&router, get_request("/api/health")).await;
    assert_eq!(response.status(), StatusCode::OK);
}
