use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::User;

#[derive(Deserialize, Debug, ToSchema)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Deserialize, Debug, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize, Debug, ToSchema)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

#[derive(Deserialize, Debug, ToSchema)]
pub struct UpdateProfileRequest {
    pub email: String,
    pub username: String,
    pub old_password: Option<String>,
    pub password: Option<String>,
    /// Stored path of an already-uploaded picture; replaces (and deletes) the
    /// previous one when present.
    pub profile_picture: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RegisterData {
    pub user: User,
    pub access_token: String,
    pub token_type: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UserSummary {
    pub user_id: Uuid,
    pub username: String,
    pub email: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LoginData {
    pub user: UserSummary,
    pub access_token: String,
    pub token_type: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TwoFactorChallenge {
    pub user_id: Uuid,
    pub tfa_method: String,
    pub requires_2fa: bool,
}

/// Login either completes with a token or stops at the 2FA gate.
#[derive(Debug)]
pub enum LoginOutcome {
    LoggedIn(LoginData),
    TwoFactorRequired(TwoFactorChallenge),
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CurrentUserData {
    pub user: User,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProfileSummary {
    pub user_id: Uuid,
    pub email: String,
    pub username: String,
    /// Fully qualified; falls back to the default placeholder URL.
    pub profile_picture: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProfileData {
    pub user: ProfileSummary,
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct Claims {
    pub sub: String,
    pub sid: String,
    pub exp: usize,
}
