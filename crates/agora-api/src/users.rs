use axum::{
    Extension, Json,
    extract::State,
};

use agora_core::ProfileChanges;
use agora_types::api::{
    FollowRequest, ProfileUpdateResponse, UnfollowRequest, UpdateProfileRequest, UserSummary,
};
use agora_types::models::User;

use crate::auth::AppState;
use crate::blocking;
use crate::error::ApiError;
use crate::extract::{IdPath, JsonBody};

pub async fn list_users(State(state): State<AppState>) -> Result<Json<Vec<User>>, ApiError> {
    let users = blocking(move || state.accounts.list_users()).await?;
    Ok(Json(users))
}

pub async fn get_user(
    State(state): State<AppState>,
    IdPath(id): IdPath,
) -> Result<Json<User>, ApiError> {
    let user = blocking(move || state.accounts.get_user(id)).await?;
    Ok(Json(user))
}

/// Profile page fetch. Records the caller as a viewer the first time.
pub async fn get_profile(
    State(state): State<AppState>,
    IdPath(id): IdPath,
    Extension(viewer): Extension<User>,
) -> Result<Json<User>, ApiError> {
    let profile = blocking(move || state.views.fetch_profile(&viewer, id)).await?;
    Ok(Json(profile))
}

pub async fn update_profile(
    State(state): State<AppState>,
    IdPath(id): IdPath,
    Extension(actor): Extension<User>,
    JsonBody(req): JsonBody<UpdateProfileRequest>,
) -> Result<Json<ProfileUpdateResponse>, ApiError> {
    let changes = ProfileChanges {
        handle: req.handle,
        email: req.email,
        bio: req.bio,
        profile_photo: req.profile_photo,
        password: req.password,
    };

    let profile = blocking(move || state.accounts.update_profile(&actor, id, changes)).await?;

    Ok(Json(ProfileUpdateResponse {
        user: UserSummary::from(&profile),
        profile,
    }))
}

pub async fn follow(
    State(state): State<AppState>,
    Extension(actor): Extension<User>,
    JsonBody(req): JsonBody<FollowRequest>,
) -> Result<Json<UserSummary>, ApiError> {
    let actor = blocking(move || state.graph.follow(&actor, req.follow_id)).await?;
    Ok(Json(UserSummary::from(&actor)))
}

pub async fn unfollow(
    State(state): State<AppState>,
    Extension(actor): Extension<User>,
    JsonBody(req): JsonBody<UnfollowRequest>,
) -> Result<Json<UserSummary>, ApiError> {
    let actor = blocking(move || state.graph.unfollow(&actor, req.unfollow_id)).await?;
    Ok(Json(UserSummary::from(&actor)))
}

pub async fn block_user(
    State(state): State<AppState>,
    IdPath(id): IdPath,
    Extension(admin): Extension<User>,
) -> Result<Json<Vec<User>>, ApiError> {
    let users = blocking(move || state.accounts.set_blocked(&admin, id, true)).await?;
    Ok(Json(users))
}

pub async fn unblock_user(
    State(state): State<AppState>,
    IdPath(id): IdPath,
    Extension(admin): Extension<User>,
) -> Result<Json<Vec<User>>, ApiError> {
    let users = blocking(move || state.accounts.set_blocked(&admin, id, false)).await?;
    Ok(Json(users))
}
