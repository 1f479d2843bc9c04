use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type UserId = Uuid;
pub type GenericId = Uuid;

pub const DEFAULT_PROFILE_PHOTO: &str =
    "https://res.cloudinary.com/hllcxfhvx/image/upload/v1640128010/woft1anujwd052kwocaj.jpg";
pub const DEFAULT_MEDIA: &str =
    "https://res.cloudinary.com/dcxmdnu2h/image/upload/v1638247712/epnc8zh9wab8x31vbqjq.jpg";
pub const DEFAULT_BLOG_TYPE: &str = "blog";

/// A hashed single-use token and the instant it stops being accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredToken {
    pub hash: String,
    pub expires_at: DateTime<Utc>,
}

/// Identity record. Secrets are never serialized.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub handle: String,
    pub email: String,
    #[serde(skip)]
    pub password_hash: String,
    pub bio: Option<String>,
    pub profile_photo: String,
    pub is_blocked: bool,
    pub is_admin: bool,
    pub is_verified: bool,
    pub followers: BTreeSet<UserId>,
    pub following: BTreeSet<UserId>,
    pub viewed_by: BTreeSet<UserId>,
    #[serde(skip)]
    pub verification_token: Option<StoredToken>,
    #[serde(skip)]
    pub reset_token: Option<StoredToken>,
    pub password_changed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn is_followed_by(&self, id: UserId) -> bool {
        self.followers.contains(&id)
    }
}

/// A post authored by a user. `likes` and `dislikes` hold actor keys, which
/// are either user ids or anonymous client ids.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Generic {
    pub id: GenericId,
    pub title: String,
    pub category: String,
    pub description: String,
    pub handle: String,
    pub author_id: UserId,
    pub media: String,
    pub blog_type: String,
    pub num_views: u64,
    pub likes: BTreeSet<String>,
    pub dislikes: BTreeSet<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Generic {
    pub fn reactions_of(&self, reaction: Reaction) -> &BTreeSet<String> {
        match reaction {
            Reaction::Like => &self.likes,
            Reaction::Dislike => &self.dislikes,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Reaction {
    Like,
    Dislike,
}

impl Reaction {
    pub fn opposite(self) -> Self {
        match self {
            Self::Like => Self::Dislike,
            Self::Dislike => Self::Like,
        }
    }
}
