//! Shared setup for auth-service integration tests.
//!
//! Builds the full router over an in-memory store and drives it with
//! `tower::ServiceExt::oneshot`; no database or network needed.

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use knowbase_auth::{
    build_router,
    config::{
        AuthConfig, DatabaseConfig, Environment, HashingConfig, JwtConfig, SecurityConfig,
    },
    models::{Membership, Role, User},
    services::{JwtService, MemoryStore, MembershipStore, UserStore},
    AppState,
};
use serde_json::Value;
use std::sync::Arc;
use tower::util::ServiceExt;
use uuid::Uuid;

pub const TEST_PASSWORD: &str = "correct-horse-battery";

pub fn test_config() -> AuthConfig {
    AuthConfig {
        common: service_core::config::Config::default(),
        environment: Environment::Dev,
        service_name: "knowbase-auth-test".to_string(),
        service_version: "0.0.0".to_string(),
        log_level: "error".to_string(),
        database: DatabaseConfig {
            url: "postgres://unused".to_string(),
            max_connections: 1,
            min_connections: 1,
        },
        jwt: JwtConfig {
            secret: "integration-test-secret-0123456789abcdef".to_string(),
            algorithm: "HS256".to_string(),
            access_token_expiry_minutes: 30,
            refresh_token_expiry_days: 7,
            leeway_seconds: 0,
        },
        // Cheap parameters keep the suite fast.
        hashing: HashingConfig {
            memory_kib: 1024,
            iterations: 1,
            parallelism: 1,
        },
        security: SecurityConfig {
            allowed_origins: vec!["http://localhost:3000".to_string()],
        },
    }
}

pub struct TestApp {
    pub router: Router,
    pub store: MemoryStore,
    pub state: AppState,
}

impl TestApp {
    pub fn new() -> Self {
        let store = MemoryStore::new();
        let state = AppState::new(
            test_config(),
            Arc::new(store.clone()),
            Arc::new(store.clone()),
        )
        .expect("Failed to build app state");
        let router = build_router(state.clone()).expect("Failed to build router");

        Self {
            router,
            store,
            state,
        }
    }

    pub fn jwt(&self) -> &JwtService {
        &self.state.jwt
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if body.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body).unwrap_or(Value::Null)
        };
        (status, json)
    }

    pub async fn post_json(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
    }

    pub async fn get_authed(&self, uri: &str, token: &str) -> (StatusCode, Value) {
        self.send(
            Request::builder()
                .uri(uri)
                .header(header::AUTHORIZATION, format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
    }

    /// Register through the API and return the token body.
    pub async fn register(&self, email: &str) -> Value {
        let (status, body) = self
            .post_json(
                "/auth/register",
                serde_json::json!({
                    "email": email,
                    "password": TEST_PASSWORD,
                    "full_name": "Test User",
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "register failed: {}", body);
        body
    }

    /// Register and return `(user, access_token)`.
    pub async fn register_user(&self, email: &str) -> (User, String) {
        let tokens = self.register(email).await;
        let user = self.store.find_by_email(email).await.unwrap().unwrap();
        let access = tokens["access_token"].as_str().unwrap().to_string();
        (user, access)
    }

    pub async fn add_membership(&self, user_id: Uuid, org_id: Uuid, role: Role) {
        MembershipStore::insert(&self.store, Membership::new(user_id, org_id, role))
            .await
            .unwrap();
    }

    pub async fn deactivate(&self, user_id: Uuid) {
        let mut user = self.store.find_by_id(user_id).await.unwrap().unwrap();
        user.is_active = false;
        self.store.update(user).await.unwrap();
    }
}
