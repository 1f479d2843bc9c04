//! Token-backed account flows. Raw tokens only ever leave through the mailer.

use axum::{Extension, Json, extract::State};
use tracing::info;

use agora_core::Error;
use agora_types::api::{ForgotPasswordRequest, MessageResponse, ResetPasswordRequest, TokenRequest};
use agora_types::models::User;

use crate::auth::AppState;
use crate::blocking;
use crate::error::ApiError;
use crate::extract::JsonBody;
use crate::mail::{reset_mail, verification_mail};

pub async fn send_verification(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> Result<Json<MessageResponse>, ApiError> {
    let email = user.email.clone();
    blocking(move || {
        let raw = state.accounts.request_verification(&user)?;
        let mail = verification_mail(&user.email, &state.public_url, &raw, state.accounts.token_ttl());
        state
            .mailer
            .send(&mail)
            .map_err(|e| Error::Internal(format!("failed to send verification mail: {e}")))
    })
    .await?;

    info!("Verification mail sent to {}", email);
    Ok(Json(MessageResponse {
        message: format!("Verification email sent to {email}"),
    }))
}

pub async fn verify_account(
    State(state): State<AppState>,
    Extension(_user): Extension<User>,
    JsonBody(req): JsonBody<TokenRequest>,
) -> Result<Json<User>, ApiError> {
    let user = blocking(move || state.accounts.verify_account(&req.token)).await?;
    Ok(Json(user))
}

pub async fn forgot_password(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<ForgotPasswordRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let email = blocking(move || {
        let (user, raw) = state.accounts.request_password_reset(&req.email)?;
        let mail = reset_mail(&user.email, &state.public_url, &raw, state.accounts.token_ttl());
        state
            .mailer
            .send(&mail)
            .map_err(|e| Error::Internal(format!("failed to send reset mail: {e}")))?;
        Ok(user.email)
    })
    .await?;

    info!("Password reset mail sent to {}", email);
    Ok(Json(MessageResponse {
        message: format!("A password reset link was sent to {email}"),
    }))
}

pub async fn reset_password(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<ResetPasswordRequest>,
) -> Result<Json<User>, ApiError> {
    let user = blocking(move || state.accounts.reset_password(&req.token, &req.password)).await?;
    Ok(Json(user))
}
