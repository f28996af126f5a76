pub mod membership;
pub mod user;

pub use membership::{Membership, MembershipResponse, Role};
pub use user::{normalize_email, User, UserResponse};
