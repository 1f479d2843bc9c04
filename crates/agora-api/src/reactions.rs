use axum::{Extension, Json, extract::State};

use agora_core::Actor;
use agora_core::store::GenericFilter;
use agora_types::api::{AnonReactRequest, ReactRequest, ReactionResponse};
use agora_types::models::{GenericId, Reaction, User};

use crate::auth::AppState;
use crate::blocking;
use crate::error::ApiError;
use crate::extract::JsonBody;

pub async fn like(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    JsonBody(req): JsonBody<ReactRequest>,
) -> Result<Json<ReactionResponse>, ApiError> {
    react(state, Actor::User(user.id), req.generic_id, Reaction::Like).await
}

pub async fn dislike(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    JsonBody(req): JsonBody<ReactRequest>,
) -> Result<Json<ReactionResponse>, ApiError> {
    react(state, Actor::User(user.id), req.generic_id, Reaction::Dislike).await
}

pub async fn like_anonymous(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<AnonReactRequest>,
) -> Result<Json<ReactionResponse>, ApiError> {
    let actor = Actor::anonymous(&req.anon_id)?;
    react(state, actor, req.generic_id, Reaction::Like).await
}

pub async fn dislike_anonymous(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<AnonReactRequest>,
) -> Result<Json<ReactionResponse>, ApiError> {
    let actor = Actor::anonymous(&req.anon_id)?;
    react(state, actor, req.generic_id, Reaction::Dislike).await
}

/// Toggle and answer with the refreshed item plus a fresh listing.
async fn react(
    state: AppState,
    actor: Actor,
    id: GenericId,
    reaction: Reaction,
) -> Result<Json<ReactionResponse>, ApiError> {
    let response = blocking(move || {
        let generic = state.reactions.react(&actor, id, reaction)?;
        let generics = state.content.list(&GenericFilter::default())?;
        Ok(ReactionResponse { generic, generics })
    })
    .await?;

    Ok(Json(response))
}
