pub mod config;
pub mod db;
pub mod dtos;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod utils;

use service_core::axum::{
    extract::State,
    http::{header, HeaderName, HeaderValue, Method, Request},
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
    Json, Router,
};
use service_core::error::AppError;
use service_core::middleware::{security_headers_middleware, request_id_middleware, REQUEST_ID_HEADER};
use std::sync::Arc;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};

use crate::config::AuthConfig;
use crate::middleware::RoleGuard;
use crate::models::Role;
use crate::services::{
    AuthService, IdentityResolver, JwtService, MembershipGate, MembershipStore, RoleRequirement,
    UserService, UserStore,
};
use crate::utils::CredentialHasher;

/// Every route is served both at the root and under this prefix.
pub const API_V1_PREFIX: &str = "/api/v1";

#[derive(OpenApi)]
#[openapi(
    paths(
        health_check,
        handlers::auth::registration::register,
        handlers::auth::session::login,
        handlers::auth::session::refresh,
        handlers::user::get_me,
        handlers::user::update_me,
        handlers::user::get_user,
        handlers::org::get_my_membership,
        handlers::org::get_member,
    ),
    components(
        schemas(
            dtos::auth::RegisterRequest,
            dtos::auth::LoginRequest,
            dtos::auth::RefreshRequest,
            dtos::auth::TokenResponse,
            dtos::user::UpdateUserRequest,
            dtos::ErrorResponse,
            models::UserResponse,
            models::MembershipResponse,
            models::Role,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Authentication", description = "Registration, login and token refresh"),
        (name = "User", description = "User profile management"),
        (name = "Organization", description = "Tenant-scoped membership reads"),
        (name = "Observability", description = "Service health"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub config: AuthConfig,
    pub jwt: JwtService,
    pub users: Arc<dyn UserStore>,
    pub memberships: Arc<dyn MembershipStore>,
    pub auth_service: AuthService,
    pub user_service: UserService,
    pub identity: IdentityResolver,
    pub gate: MembershipGate,
}

impl AppState {
    /// Wire the auth components over the given stores.
    pub fn new(
        config: AuthConfig,
        users: Arc<dyn UserStore>,
        memberships: Arc<dyn MembershipStore>,
    ) -> Result<Self, AppError> {
        let jwt = JwtService::new(&config.jwt)?;
        let hasher = CredentialHasher::new(&config.hashing).map_err(AppError::ConfigError)?;

        let auth_service = AuthService::new(users.clone(), jwt.clone(), hasher)?;
        let user_service = UserService::new(users.clone());
        let identity = IdentityResolver::new(jwt.clone(), users.clone());
        let gate = MembershipGate::new(memberships.clone());

        Ok(Self {
            config,
            jwt,
            users,
            memberships,
            auth_service,
            user_service,
            identity,
            gate,
        })
    }
}

/// Routes shared by the root and the versioned prefix.
fn api_routes(state: &AppState) -> Router<AppState> {
    let auth_routes = Router::new()
        .route("/auth/register", post(handlers::auth::register))
        .route("/auth/login", post(handlers::auth::login))
        .route("/auth/refresh", post(handlers::auth::refresh));

    let user_routes = Router::new()
        .route(
            "/users/me",
            get(handlers::user::get_me).patch(handlers::user::update_me),
        )
        .route("/users/:user_id", get(handlers::user::get_user))
        .route_layer(from_fn_with_state(state.clone(), middleware::auth_middleware));

    // Layers added later run first: authentication, then the tenant gate.
    let membership_routes = Router::new()
        .route(
            "/orgs/:org_id/membership",
            get(handlers::org::get_my_membership),
        )
        .route_layer(from_fn_with_state(
            state.clone(),
            middleware::require_membership_middleware,
        ))
        .route_layer(from_fn_with_state(state.clone(), middleware::auth_middleware));

    let manager_routes = Router::new()
        .route(
            "/orgs/:org_id/members/:user_id",
            get(handlers::org::get_member),
        )
        .route_layer(from_fn_with_state(
            RoleGuard::new(state.clone(), RoleRequirement::new([Role::Owner, Role::Admin])),
            middleware::require_role_middleware,
        ))
        .route_layer(from_fn_with_state(state.clone(), middleware::auth_middleware));

    Router::new()
        .merge(auth_routes)
        .merge(user_routes)
        .merge(membership_routes)
        .merge(manager_routes)
}

fn cors_layer(config: &AuthConfig) -> Result<CorsLayer, AppError> {
    let origins = &config.security.allowed_origins;

    // `*` is rejected at config load in prod; a list may not contain it.
    let allow_origin = if origins.iter().any(|o| o == "*") {
        AllowOrigin::any()
    } else {
        let parsed = origins
            .iter()
            .map(|o| {
                o.parse::<HeaderValue>().map_err(|e| {
                    AppError::ConfigError(anyhow::anyhow!("Invalid CORS origin '{}': {}", o, e))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        AllowOrigin::list(parsed)
    };

    Ok(CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::OPTIONS])
        .allow_headers([
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            HeaderName::from_static(REQUEST_ID_HEADER),
        ]))
}

pub fn build_router(state: AppState) -> Result<Router, AppError> {
    let api = api_routes(&state);
    let cors = cors_layer(&state.config)?;

    let app = Router::new()
        .route("/health", get(health_check))
        .route(
            "/.well-known/openapi.json",
            get(|| async { Json(ApiDoc::openapi()) }),
        )
        .merge(api.clone())
        .nest(API_V1_PREFIX, api)
        .with_state(state)
        .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<_>| {
            let request_id = request
                .headers()
                .get(REQUEST_ID_HEADER)
                .and_then(|value| value.to_str().ok())
                .unwrap_or("-");

            tracing::info_span!(
                "http_request",
                request_id = %request_id,
                method = %request.method(),
                uri = %request.uri(),
                version = ?request.version(),
            )
        }))
        .layer(from_fn(request_id_middleware))
        .layer(from_fn(security_headers_middleware))
        .layer(cors);

    Ok(app)
}

/// Service health check
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy"),
        (status = 503, description = "Store is unreachable")
    ),
    tag = "Observability"
)]
pub async fn health_check(
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, AppError> {
    state.users.health_check().await.map_err(|e| {
        tracing::error!(error = %e, "Store health check failed");
        AppError::ServiceUnavailable
    })?;

    Ok(Json(serde_json::json!({
        "status": "healthy",
        "service": state.config.service_name,
        "version": state.config.service_version,
    })))
}
