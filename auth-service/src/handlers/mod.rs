//! HTTP handlers.

pub mod auth;
pub mod org;
pub mod user;

pub use auth::*;
pub use org::*;
pub use user::*;
