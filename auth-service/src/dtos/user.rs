use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

/// Partial profile update. Absent fields are left unchanged.
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateUserRequest {
    #[validate(email(message = "Invalid email format"))]
    #[schema(example = "alice@new.example.com")]
    pub email: Option<String>,

    #[validate(length(min = 1, max = 255, message = "Full name cannot be empty"))]
    #[schema(example = "Alice Example")]
    pub full_name: Option<String>,
}
