use serde::Deserialize;
use utoipa::ToSchema;

#[derive(Debug, Deserialize, ToSchema)]
pub struct PasswordResetRequest {
    pub email: String,
}

/// Profile fields plus an optional password change; the three password
/// fields must be sent together.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct ProfileUpdateRequest {
    pub email: Option<String>,
    pub avatar: Option<String>,
    pub phone: Option<String>,
    pub country: Option<String>,
    pub old_password: Option<String>,
    pub new_password1: Option<String>,
    pub new_password2: Option<String>,
}

impl ProfileUpdateRequest {
    pub fn changes_password(&self) -> bool {
        self.old_password.is_some() || self.new_password1.is_some() || self.new_password2.is_some()
    }
}
