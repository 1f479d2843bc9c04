use std::collections::BTreeMap;
use std::fmt;

use thiserror::Error;

use crate::store::{StoreError, UniqueField};

/// Coarse failure classes the HTTP boundary maps to status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Conflict,
    Auth,
    NotFound,
    Moderation,
    Internal,
}

/// Field-keyed input validation failures.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors(BTreeMap<&'static str, String>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(field: &'static str, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.entry(field).or_insert_with(|| message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn fields(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.0.iter().map(|(k, v)| (*k, v.as_str()))
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    /// `Ok(())` when nothing was recorded.
    pub fn into_result(self) -> Result<(), Error> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(Error::Validation(self))
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, message) in &self.0 {
            if !first {
                f.write_str("; ")?;
            }
            write!(f, "{field}: {message}")?;
            first = false;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("Invalid email or password")]
    InvalidCredentials,
    #[error("Invalid session token")]
    InvalidToken,
    #[error("Session expired, please log in again")]
    TokenExpired,
    #[error("Account no longer exists")]
    UserNotFound,
    #[error("Account has been blocked")]
    AccountBlocked,
    #[error("Not allowed to perform this action")]
    Forbidden,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TokenError {
    /// Unknown, already consumed and expired tokens are indistinguishable.
    #[error("Token expired, try again later")]
    TokenNotFound,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum GraphError {
    #[error("You cannot follow yourself")]
    SelfFollowNotAllowed,
    #[error("You are already following this user")]
    AlreadyFollowing,
    #[error("You are not following this user")]
    NotFollowing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ConflictError {
    #[error("Handle already in use")]
    DuplicateHandle,
    #[error("Email already in use")]
    DuplicateEmail,
    #[error("A generic with this title already exists")]
    DuplicateTitle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum NotFoundError {
    #[error("Error, user not found")]
    UserNotFound,
    #[error("Error, generic not found")]
    ContentNotFound,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ModerationError {
    /// `author_blocked` is true when the rejection escalated to a block.
    #[error("{}", profanity_message(.author_blocked))]
    ProfanityRejected { author_blocked: bool },
}

fn profanity_message(author_blocked: &bool) -> &'static str {
    if *author_blocked {
        "Generic creation failed due to the use of profanity and you have been blocked."
    } else {
        "Generic update failed due to use of profanity"
    }
}

/// Every failure a core operation can surface.
#[derive(Debug, Error)]
pub enum Error {
    #[error("{0}")]
    Validation(ValidationErrors),
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Token(#[from] TokenError),
    #[error(transparent)]
    Graph(#[from] GraphError),
    #[error(transparent)]
    Conflict(#[from] ConflictError),
    #[error(transparent)]
    NotFound(#[from] NotFoundError),
    #[error(transparent)]
    Moderation(#[from] ModerationError),
    #[error(transparent)]
    Store(StoreError),
    #[error("internal error: {0}")]
    Internal(String),
}

/// Unique-constraint violations become conflicts; everything else stays a
/// store failure.
impl From<StoreError> for Error {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Duplicate(UniqueField::Handle) => ConflictError::DuplicateHandle.into(),
            StoreError::Duplicate(UniqueField::Email) => ConflictError::DuplicateEmail.into(),
            StoreError::Duplicate(UniqueField::Title) => ConflictError::DuplicateTitle.into(),
            other => Self::Store(other),
        }
    }
}

impl From<ValidationErrors> for Error {
    fn from(errors: ValidationErrors) -> Self {
        Self::Validation(errors)
    }
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::Auth(_) | Self::Token(_) => ErrorKind::Auth,
            Self::Graph(GraphError::SelfFollowNotAllowed) => ErrorKind::Validation,
            Self::Graph(_) | Self::Conflict(_) => ErrorKind::Conflict,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Moderation(_) => ErrorKind::Moderation,
            Self::Store(_) | Self::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Key under which the boundary layer reports this failure.
    pub fn field(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::Auth(AuthError::InvalidCredentials) => "password",
            Self::Auth(_) => "auth",
            Self::Token(_) => "token",
            Self::Graph(GraphError::NotFollowing) => "unfollow",
            Self::Graph(_) => "follow",
            Self::Conflict(ConflictError::DuplicateHandle) => "handle",
            Self::Conflict(ConflictError::DuplicateEmail) => "email",
            Self::Conflict(ConflictError::DuplicateTitle) => "title",
            Self::NotFound(NotFoundError::UserNotFound) => "user",
            Self::NotFound(NotFoundError::ContentNotFound) => "generics",
            Self::Moderation(_) => "generics",
            Self::Store(_) | Self::Internal(_) => "general",
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
