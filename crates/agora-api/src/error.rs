use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::{Map, Value};
use tracing::error;

use agora_core::error::{AuthError, Error, ErrorKind, GraphError};

/// Boundary wrapper turning core failures into field-keyed JSON responses.
#[derive(Debug)]
pub struct ApiError(pub Error);

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        Self(err)
    }
}

impl ApiError {
    pub fn internal(message: impl Into<String>) -> Self {
        Self(Error::Internal(message.into()))
    }

    pub fn status(&self) -> StatusCode {
        match &self.0 {
            Error::Auth(AuthError::Forbidden | AuthError::AccountBlocked) => StatusCode::FORBIDDEN,
            Error::Token(_) => StatusCode::BAD_REQUEST,
            Error::Graph(GraphError::AlreadyFollowing | GraphError::NotFollowing) => {
                StatusCode::BAD_REQUEST
            }
            err => match err.kind() {
                ErrorKind::Validation => StatusCode::BAD_REQUEST,
                ErrorKind::Conflict => StatusCode::CONFLICT,
                ErrorKind::Auth => StatusCode::UNAUTHORIZED,
                ErrorKind::NotFound => StatusCode::NOT_FOUND,
                ErrorKind::Moderation => StatusCode::FORBIDDEN,
                ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    fn body(&self) -> Value {
        let mut body = Map::new();
        match &self.0 {
            Error::Validation(errors) => {
                for (field, message) in errors.fields() {
                    body.insert(field.to_string(), message.into());
                }
            }
            err if err.kind() == ErrorKind::Internal => {
                error!("Request failed: {}", err);
                body.insert(err.field().to_string(), "Something went wrong".into());
            }
            err => {
                body.insert(err.field().to_string(), err.to_string().into());
            }
        }
        Value::Object(body)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(self.body())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agora_core::error::{
        ConflictError, ModerationError, NotFoundError, TokenError, ValidationErrors,
    };

    #[test]
    fn statuses_follow_the_boundary_table() {
        let status = |err: Error| ApiError(err).status();

        assert_eq!(status(ValidationErrors::single("email", "bad").into()), StatusCode::BAD_REQUEST);
        assert_eq!(status(AuthError::InvalidCredentials.into()), StatusCode::UNAUTHORIZED);
        assert_eq!(status(AuthError::AccountBlocked.into()), StatusCode::FORBIDDEN);
        assert_eq!(status(AuthError::Forbidden.into()), StatusCode::FORBIDDEN);
        assert_eq!(status(TokenError::TokenNotFound.into()), StatusCode::BAD_REQUEST);
        assert_eq!(status(GraphError::AlreadyFollowing.into()), StatusCode::BAD_REQUEST);
        assert_eq!(status(GraphError::SelfFollowNotAllowed.into()), StatusCode::BAD_REQUEST);
        assert_eq!(status(ConflictError::DuplicateEmail.into()), StatusCode::CONFLICT);
        assert_eq!(status(NotFoundError::ContentNotFound.into()), StatusCode::NOT_FOUND);
        assert_eq!(
            status(ModerationError::ProfanityRejected { author_blocked: true }.into()),
            StatusCode::FORBIDDEN
        );
        assert_eq!(status(Error::Internal("boom".into())), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn bodies_are_field_keyed() {
        let body = ApiError(ConflictError::DuplicateEmail.into()).body();
        assert_eq!(body, serde_json::json!({ "email": "Email already in use" }));

        let mut errors = ValidationErrors::new();
        errors.add("handle", "Handle is required");
        errors.add("password", "Password is too short");
        let body = ApiError(errors.into()).body();
        assert_eq!(body["handle"], "Handle is required");
        assert_eq!(body["password"], "Password is too short");
    }

    #[test]
    fn internal_details_stay_out_of_the_body() {
        let body = ApiError::internal("disk on fire").body();
        assert_eq!(body, serde_json::json!({ "general": "Something went wrong" }));
    }
}
