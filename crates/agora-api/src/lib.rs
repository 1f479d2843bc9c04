pub mod account;
pub mod auth;
pub mod error;
pub mod extract;
pub mod generics;
pub mod mail;
pub mod middleware;
pub mod reactions;
pub mod users;

use axum::{
    Router, middleware as axum_middleware,
    routing::{get, post, put},
};
use tracing::error;

use crate::auth::AppState;
use crate::error::ApiError;
use crate::middleware::require_auth;

/// Full HTTP surface. Layers (CORS, tracing) are added by the binary.
pub fn router(state: AppState) -> Router {
    let auth_layer = axum_middleware::from_fn_with_state(state.clone(), require_auth);

    let public_routes = Router::new()
        .route("/api/users/register", post(auth::register))
        .route("/api/users/login", post(auth::login))
        .route("/api/users/forgot-password-token", post(account::forgot_password))
        .route("/api/users/reset-password", put(account::reset_password))
        .route("/api/generics/like/anon", put(reactions::like_anonymous))
        .route("/api/generics/dislike/anon", put(reactions::dislike_anonymous))
        .route("/health", get(health));

    let protected_routes = Router::new()
        .route("/api/users", get(users::list_users))
        .route("/api/users/follow", put(users::follow))
        .route("/api/users/unfollow", put(users::unfollow))
        .route("/api/users/block-user/{id}", put(users::block_user))
        .route("/api/users/unblock-user/{id}", put(users::unblock_user))
        .route("/api/users/send-verification-request", post(account::send_verification))
        .route("/api/users/verify-account", put(account::verify_account))
        .route("/api/users/profile/{id}", get(users::get_profile))
        .route("/api/users/{id}", get(users::get_user).put(users::update_profile))
        .route("/api/generics/like", put(reactions::like))
        .route("/api/generics/dislike", put(reactions::dislike))
        .route_layer(auth_layer.clone());

    // Generic reads are public; writes need a session.
    let generic_routes = Router::new()
        .route(
            "/api/generics",
            get(generics::list_generics)
                .merge(post(generics::create_generic).route_layer(auth_layer.clone())),
        )
        .route(
            "/api/generics/{id}",
            get(generics::get_generic).merge(
                put(generics::update_generic)
                    .delete(generics::delete_generic)
                    .route_layer(auth_layer),
            ),
        );

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .merge(generic_routes)
        .with_state(state)
}

pub async fn health() -> &'static str {
    "ok"
}

/// Run core work (SQLite, Argon2) off the async reactor.
pub(crate) async fn blocking<F, T>(f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> agora_core::Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            ApiError::internal(format!("blocking task failed: {e}"))
        })?
        .map_err(ApiError::from)
}
