pub mod auth;
pub mod tenant;

pub use auth::{auth_middleware, AuthUser};
pub use tenant::{
    require_membership_middleware, require_role_middleware, RoleGuard, TenantContext,
};
