//! Tenant gate middleware.
//!
//! Runs after [`auth_middleware`](super::auth_middleware) on routes with an
//! `:org_id` path segment. The caller's membership in that organization is
//! checked and, on success, a [`TenantContext`] is stored in the request
//! extensions for the handler.

use std::collections::HashMap;

use service_core::{
    axum::{
        async_trait,
        extract::{FromRequestParts, Path, Request, State},
        http::request::Parts,
        middleware::Next,
        response::Response,
    },
    error::AppError,
};
use uuid::Uuid;

use crate::{
    models::{Membership, User},
    services::RoleRequirement,
    AppState,
};

/// The organization a request is scoped to, and the caller's place in it.
#[derive(Debug, Clone)]
pub struct TenantContext {
    pub org_id: Uuid,
    pub membership: Membership,
}

/// Middleware state for role-gated routes: one requirement per route.
#[derive(Clone)]
pub struct RoleGuard {
    pub state: AppState,
    pub requirement: RoleRequirement,
}

impl RoleGuard {
    pub fn new(state: AppState, requirement: RoleRequirement) -> Self {
        Self { state, requirement }
    }
}

fn org_id_from(params: &HashMap<String, String>) -> Result<Uuid, AppError> {
    let raw = params
        .get("org_id")
        .ok_or_else(|| AppError::InternalError(anyhow::anyhow!("Route has no :org_id segment")))?;

    Uuid::parse_str(raw).map_err(|_| AppError::BadRequest(anyhow::anyhow!("Invalid organization id")))
}

fn current_user(req: &Request) -> Result<User, AppError> {
    req.extensions().get::<User>().cloned().ok_or_else(|| {
        AppError::InternalError(anyhow::anyhow!("Tenant gate ran before authentication"))
    })
}

/// Any membership in `:org_id` is enough.
pub async fn require_membership_middleware(
    State(state): State<AppState>,
    Path(params): Path<HashMap<String, String>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let org_id = org_id_from(&params)?;
    let user = current_user(&req)?;

    let membership = state.gate.require_membership(&user, org_id).await?;

    req.extensions_mut().insert(TenantContext { org_id, membership });
    Ok(next.run(req).await)
}

/// The membership's role must be in the guard's requirement.
pub async fn require_role_middleware(
    State(guard): State<RoleGuard>,
    Path(params): Path<HashMap<String, String>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let org_id = org_id_from(&params)?;
    let user = current_user(&req)?;

    let membership = guard
        .state
        .gate
        .require_role(&user, org_id, &guard.requirement)
        .await?;

    req.extensions_mut().insert(TenantContext { org_id, membership });
    Ok(next.run(req).await)
}

#[async_trait]
impl<S> FromRequestParts<S> for TenantContext
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<TenantContext>()
            .cloned()
            .ok_or_else(|| AppError::Forbidden(anyhow::anyhow!("Tenant context not found")))
    }
}
