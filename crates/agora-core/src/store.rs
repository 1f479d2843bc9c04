//! Repository seams over a document store.
//!
//! Every method touches exactly one document (a user or a generic together
//! with its set fields) and is atomic with respect to that document. Nothing
//! here spans two documents; callers that need that compensate themselves.

use std::fmt;

use chrono::{DateTime, Utc};
use thiserror::Error;

use agora_types::models::{Generic, GenericId, Reaction, StoredToken, User, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniqueField {
    Handle,
    Email,
    Title,
}

impl fmt::Display for UniqueField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Handle => "handle",
            Self::Email => "email",
            Self::Title => "title",
        })
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("unique constraint violated on {0}")]
    Duplicate(UniqueField),
    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

/// Which single-use token field pair an operation addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Verification,
    Reset,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub id: UserId,
    pub handle: String,
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// Fields a profile update may set. `None` leaves the field untouched.
#[derive(Debug, Clone, Default)]
pub struct ProfilePatch {
    pub handle: Option<String>,
    pub email: Option<String>,
    pub bio: Option<String>,
    pub profile_photo: Option<String>,
    pub password_hash: Option<String>,
    pub password_changed_at: Option<DateTime<Utc>>,
}

impl ProfilePatch {
    pub fn is_empty(&self) -> bool {
        self.handle.is_none()
            && self.email.is_none()
            && self.bio.is_none()
            && self.profile_photo.is_none()
            && self.password_hash.is_none()
    }
}

pub trait UserStore: Send + Sync {
    fn insert_user(&self, user: &NewUser) -> Result<(), StoreError>;

    fn user_by_id(&self, id: UserId) -> Result<Option<User>, StoreError>;

    fn user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    fn list_users(&self) -> Result<Vec<User>, StoreError>;

    /// Returns `false` when no such user exists.
    fn update_profile(&self, id: UserId, patch: &ProfilePatch) -> Result<bool, StoreError>;

    fn set_blocked(&self, id: UserId, blocked: bool) -> Result<bool, StoreError>;

    fn mark_verified(&self, id: UserId) -> Result<bool, StoreError>;

    /// Conditional set-add on `user.followers`; `false` if already present.
    fn add_follower(&self, user: UserId, follower: UserId) -> Result<bool, StoreError>;

    /// Conditional set-remove on `user.followers`; `false` if absent.
    fn remove_follower(&self, user: UserId, follower: UserId) -> Result<bool, StoreError>;

    fn add_following(&self, user: UserId, followee: UserId) -> Result<bool, StoreError>;

    fn remove_following(&self, user: UserId, followee: UserId) -> Result<bool, StoreError>;

    /// Conditional set-add on `user.viewedBy`; `false` if already present.
    fn add_profile_view(&self, user: UserId, viewer: UserId) -> Result<bool, StoreError>;

    /// Overwrites the `kind` field pair. `false` when no such user exists.
    fn store_token(
        &self,
        user: UserId,
        kind: TokenKind,
        token: &StoredToken,
    ) -> Result<bool, StoreError>;

    /// Clears the `kind` field pair of the user whose stored hash equals
    /// `hash` and whose expiry is after `now`, in one conditional update.
    /// Returns the matched user, or `None` if nothing matched.
    fn take_token(
        &self,
        kind: TokenKind,
        hash: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<UserId>, StoreError>;
}

#[derive(Debug, Clone)]
pub struct NewGeneric {
    pub id: GenericId,
    pub title: String,
    pub category: String,
    pub description: String,
    pub handle: String,
    pub author_id: UserId,
    pub media: String,
    pub blog_type: String,
    pub created_at: DateTime<Utc>,
}

/// Editable generic fields. Author and handle are deliberately absent.
#[derive(Debug, Clone, Default)]
pub struct GenericPatch {
    pub title: Option<String>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub media: Option<String>,
    pub blog_type: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct GenericFilter {
    pub category: Option<String>,
    pub handle: Option<String>,
}

/// A single-document reaction mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReactionUpdate {
    /// Pull the actor from the given set.
    Withdraw(Reaction),
    /// Pull the actor from the opposite set and push it onto the given set,
    /// both in the same update.
    Cast(Reaction),
}

pub trait GenericStore: Send + Sync {
    fn insert_generic(&self, generic: &NewGeneric) -> Result<(), StoreError>;

    fn generic_by_id(&self, id: GenericId) -> Result<Option<Generic>, StoreError>;

    /// Most recent first.
    fn list_generics(&self, filter: &GenericFilter) -> Result<Vec<Generic>, StoreError>;

    fn update_generic(&self, id: GenericId, patch: &GenericPatch) -> Result<bool, StoreError>;

    fn delete_generic(&self, id: GenericId) -> Result<bool, StoreError>;

    /// Atomic `numViews += 1`; `false` when no such generic exists.
    fn increment_views(&self, id: GenericId) -> Result<bool, StoreError>;

    fn apply_reaction(
        &self,
        id: GenericId,
        actor: &str,
        update: ReactionUpdate,
    ) -> Result<bool, StoreError>;
}
