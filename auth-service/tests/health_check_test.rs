mod common;

use axum::{body::Body, http::{Request, StatusCode}};
use common::TestApp;

#[tokio::test]
async fn test_health_check() {
    let app = TestApp::new();

    let (status, body) = app
        .send(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["service"], "knowbase-auth-test");
}

#[tokio::test]
async fn test_openapi_document_lists_auth_routes() {
    let app = TestApp::new();

    let (status, body) = app
        .send(
            Request::builder()
                .uri("/.well-known/openapi.json")
                .body(Body::empty())
                .unwrap(),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    for path in ["/auth/register", "/auth/login", "/auth/refresh", "/users/me"] {
        assert!(body["paths"].get(path).is_some(), "missing {}", path);
    }
    assert!(body["components"]["securitySchemes"]["bearer_auth"].is_object());
}
