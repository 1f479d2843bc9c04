use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::headers::{Authorization, HeaderMapExt, authorization::Bearer};

use agora_core::error::AuthError;

use crate::auth::AppState;
use crate::blocking;
use crate::error::ApiError;

/// Resolve the bearer session to a live, unblocked user and hand it to the
/// handler as an `Extension<User>`.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let bearer = req
        .headers()
        .typed_get::<Authorization<Bearer>>()
        .ok_or(ApiError(AuthError::InvalidToken.into()))?;

    let token = bearer.0.token().to_string();
    let user = blocking(move || state.gate.authenticate(&token)).await?;

    req.extensions_mut().insert(user);
    Ok(next.run(req).await)
}
