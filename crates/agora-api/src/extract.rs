//! Extractors whose rejections come back as field-keyed validation errors
//! instead of axum's plain-text 4xx bodies.

use axum::{
    Json,
    extract::{FromRequest, FromRequestParts, Path, Request},
    http::request::Parts,
};
use serde::de::DeserializeOwned;
use tracing::debug;
use uuid::Uuid;

use agora_core::ValidationErrors;

use crate::error::ApiError;

/// JSON request body. Malformed or mistyped bodies are reported under `body`.
pub struct JsonBody<T>(pub T);

impl<T, S> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => {
                debug!("rejected request body: {}", rejection.body_text());
                Err(ApiError(ValidationErrors::single("body", rejection.body_text()).into()))
            }
        }
    }
}

/// The `{id}` path segment of a user or generic route.
pub struct IdPath(pub Uuid);

impl<S> FromRequestParts<S> for IdPath
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Path::<Uuid>::from_request_parts(parts, state).await {
            Ok(Path(id)) => Ok(Self(id)),
            Err(_) => Err(ApiError(ValidationErrors::single("id", "Invalid id").into())),
        }
    }
}
