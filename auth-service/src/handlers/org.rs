//! Tenant-scoped reads. Access is decided by the gate middleware on each
//! route; handlers only see requests that already passed it.

use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use service_core::error::AppError;
use uuid::Uuid;

use crate::{
    middleware::TenantContext,
    models::MembershipResponse,
    services::{MembershipStore, ServiceError},
    AppState,
};

/// The caller's own membership in an organization
#[utoipa::path(
    get,
    path = "/orgs/{org_id}/membership",
    params(("org_id" = Uuid, Path, description = "Organization id")),
    responses(
        (status = 200, description = "Caller's membership", body = MembershipResponse),
        (status = 400, description = "Malformed organization id", body = ErrorResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 403, description = "Not a member", body = ErrorResponse)
    ),
    tag = "Organization",
    security(("bearer_auth" = []))
)]
pub async fn get_my_membership(tenant: TenantContext) -> impl IntoResponse {
    Json(MembershipResponse::from(tenant.membership))
}

/// Another member's membership. Owners and admins only.
#[utoipa::path(
    get,
    path = "/orgs/{org_id}/members/{user_id}",
    params(
        ("org_id" = Uuid, Path, description = "Organization id"),
        ("user_id" = Uuid, Path, description = "Member's user id")
    ),
    responses(
        (status = 200, description = "Member's membership", body = MembershipResponse),
        (status = 400, description = "Malformed id", body = ErrorResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 403, description = "Caller is not an owner or admin", body = ErrorResponse),
        (status = 404, description = "User is not a member", body = ErrorResponse)
    ),
    tag = "Organization",
    security(("bearer_auth" = []))
)]
pub async fn get_member(
    State(state): State<AppState>,
    tenant: TenantContext,
    Path((_org_id, user_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, AppError> {
    let membership = state
        .memberships
        .find(user_id, tenant.org_id)
        .await
        .map_err(ServiceError::from)?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Membership not found")))?;

    Ok(Json(MembershipResponse::from(membership)))
}
