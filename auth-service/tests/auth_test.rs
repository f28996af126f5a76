mod common;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use common::{TestApp, TEST_PASSWORD};
use knowbase_auth::services::{TokenKind, UserStore};
use serde_json::json;

#[tokio::test]
async fn test_register_returns_token_pair() {
    let app = TestApp::new();

    let (status, body) = app
        .post_json(
            "/auth/register",
            json!({
                "email": "alice@example.com",
                "password": TEST_PASSWORD,
                "full_name": "Alice",
            }),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["token_type"], "bearer");
    assert_eq!(body["expires_in"], 1800);

    let user = app
        .store
        .find_by_email("alice@example.com")
        .await
        .unwrap()
        .unwrap();
    let access = app.jwt().decode(body["access_token"].as_str().unwrap()).unwrap();
    let refresh = app.jwt().decode(body["refresh_token"].as_str().unwrap()).unwrap();

    assert_eq!(access.sub, user.id.to_string());
    assert_eq!(access.kind, TokenKind::Access);
    assert_eq!(refresh.sub, user.id.to_string());
    assert_eq!(refresh.kind, TokenKind::Refresh);
}

#[tokio::test]
async fn test_duplicate_registration_conflicts() {
    let app = TestApp::new();
    app.register("alice@example.com").await;

    let (status, body) = app
        .post_json(
            "/auth/register",
            json!({
                "email": "Alice@Example.com",
                "password": TEST_PASSWORD,
                "full_name": "Impostor",
            }),
        )
        .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "Email already registered");
    assert_eq!(app.store.user_count(), 1);
}

#[tokio::test]
async fn test_register_validation_errors() {
    let app = TestApp::new();

    let (status, _) = app
        .post_json(
            "/auth/register",
            json!({ "email": "not-an-email", "password": "short", "full_name": "" }),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, _) = app
        .send(
            Request::builder()
                .method("POST")
                .uri("/auth/register")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(app.store.user_count(), 0);
}

#[tokio::test]
async fn test_login_success() {
    let app = TestApp::new();
    app.register("alice@example.com").await;

    let (status, body) = app
        .post_json(
            "/auth/login",
            json!({ "email": "alice@example.com", "password": TEST_PASSWORD }),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["token_type"], "bearer");
    assert!(body["access_token"].is_string());
    assert!(body["refresh_token"].is_string());
}

#[tokio::test]
async fn test_login_failures_are_indistinguishable() {
    let app = TestApp::new();
    app.register("alice@example.com").await;

    let wrong_password = app
        .post_json(
            "/auth/login",
            json!({ "email": "alice@example.com", "password": "wrong-password" }),
        )
        .await;
    let unknown_email = app
        .post_json(
            "/auth/login",
            json!({ "email": "nobody@example.com", "password": TEST_PASSWORD }),
        )
        .await;

    assert_eq!(wrong_password.0, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_password, unknown_email);
}

#[tokio::test]
async fn test_deactivated_user_cannot_login() {
    let app = TestApp::new();
    let (user, _) = app.register_user("alice@example.com").await;
    app.deactivate(user.id).await;

    let (status, body) = app
        .post_json(
            "/auth/login",
            json!({ "email": "alice@example.com", "password": TEST_PASSWORD }),
        )
        .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Incorrect email or password");
}

#[tokio::test]
async fn test_routes_are_also_served_under_api_v1() {
    let app = TestApp::new();

    let (status, _) = app
        .post_json(
            "/api/v1/auth/register",
            json!({
                "email": "versioned@example.com",
                "password": TEST_PASSWORD,
                "full_name": "Versioned",
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = app
        .post_json(
            "/api/v1/auth/login",
            json!({ "email": "versioned@example.com", "password": TEST_PASSWORD }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
}
