use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{Generic, User};

// -- Session claims --

/// Session credential claims. Shared by the core (issuing/verifying) and the
/// HTTP layer (request context).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub handle: String,
    pub iat: usize,
    pub exp: usize,
}

// -- Users --

/// Missing fields deserialize empty so validation can report all of them.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RegisterRequest {
    pub handle: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// The subset of a user returned alongside session and follow responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: Uuid,
    pub handle: String,
    pub email: String,
    pub profile_photo: String,
    pub is_admin: bool,
    pub is_verified: bool,
    pub is_blocked: bool,
    pub following: Vec<Uuid>,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            handle: user.handle.clone(),
            email: user.email.clone(),
            profile_photo: user.profile_photo.clone(),
            is_admin: user.is_admin,
            is_verified: user.is_verified,
            is_blocked: user.is_blocked,
            following: user.following.iter().copied().collect(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionResponse {
    #[serde(flatten)]
    pub user: UserSummary,
    pub token: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    pub handle: Option<String>,
    pub email: Option<String>,
    pub bio: Option<String>,
    pub profile_photo: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ProfileUpdateResponse {
    pub user: UserSummary,
    pub profile: User,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowRequest {
    pub follow_id: Uuid,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnfollowRequest {
    pub unfollow_id: Uuid,
}

// -- Tokens --

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct TokenRequest {
    pub token: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ResetPasswordRequest {
    pub token: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

// -- Generics --

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CreateGenericRequest {
    pub title: String,
    pub description: String,
    pub category: String,
    pub media: Option<String>,
    pub blog_type: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateGenericRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub media: Option<String>,
    pub blog_type: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct GenericQuery {
    pub category: Option<String>,
    pub handle: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReactRequest {
    pub generic_id: Uuid,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnonReactRequest {
    pub generic_id: Uuid,
    pub anon_id: String,
}

/// The reacted item plus a fresh most-recent-first listing for UI refresh.
#[derive(Debug, Serialize, Deserialize)]
pub struct ReactionResponse {
    pub generic: Generic,
    pub generics: Vec<Generic>,
}
