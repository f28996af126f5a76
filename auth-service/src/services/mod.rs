//! Services layer for the auth core.
//!
//! Token codec, identity resolution, the membership gate and the
//! account flows, plus the stores they read and write through.

mod access;
mod auth;
mod database;
pub mod error;
mod identity;
mod jwt;
mod memory;
mod store;
mod users;

pub use access::{MembershipGate, RoleRequirement};
pub use auth::AuthService;
pub use database::PgStore;
pub use error::ServiceError;
pub use identity::IdentityResolver;
pub use jwt::{JwtService, TokenClaims, TokenError, TokenKind, TokenPair};
pub use memory::MemoryStore;
pub use store::{MembershipStore, StoreError, UserStore};
pub use users::UserService;
