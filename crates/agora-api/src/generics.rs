use axum::{
    Extension, Json,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
};

use agora_core::store::GenericFilter;
use agora_core::{ContentChanges, NewContent};
use agora_types::api::{CreateGenericRequest, GenericQuery, UpdateGenericRequest};
use agora_types::models::{Generic, User};

use crate::auth::AppState;
use crate::blocking;
use crate::error::ApiError;
use crate::extract::{IdPath, JsonBody};

pub async fn create_generic(
    State(state): State<AppState>,
    Extension(author): Extension<User>,
    JsonBody(req): JsonBody<CreateGenericRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let content = NewContent {
        title: req.title,
        description: req.description,
        category: req.category,
        media: req.media,
        blog_type: req.blog_type,
    };

    let generic = blocking(move || state.content.create(&author, content)).await?;
    Ok((StatusCode::CREATED, Json(generic)))
}

pub async fn list_generics(
    State(state): State<AppState>,
    Query(query): Query<GenericQuery>,
) -> Result<Json<Vec<Generic>>, ApiError> {
    let filter = GenericFilter {
        category: query.category.filter(|c| !c.is_empty()),
        handle: query.handle.filter(|h| !h.is_empty()),
    };

    let generics = blocking(move || state.content.list(&filter)).await?;
    Ok(Json(generics))
}

/// Every fetch counts as a view.
pub async fn get_generic(
    State(state): State<AppState>,
    IdPath(id): IdPath,
) -> Result<Json<Generic>, ApiError> {
    let generic = blocking(move || state.views.fetch_generic(id)).await?;
    Ok(Json(generic))
}

pub async fn update_generic(
    State(state): State<AppState>,
    IdPath(id): IdPath,
    Extension(actor): Extension<User>,
    JsonBody(req): JsonBody<UpdateGenericRequest>,
) -> Result<Json<Generic>, ApiError> {
    let changes = ContentChanges {
        title: req.title,
        description: req.description,
        category: req.category,
        media: req.media,
        blog_type: req.blog_type,
    };

    let generic = blocking(move || state.content.update(&actor, id, changes)).await?;
    Ok(Json(generic))
}

pub async fn delete_generic(
    State(state): State<AppState>,
    IdPath(id): IdPath,
    Extension(actor): Extension<User>,
) -> Result<Json<Generic>, ApiError> {
    let generic = blocking(move || state.content.delete(&actor, id)).await?;
    Ok(Json(generic))
}
