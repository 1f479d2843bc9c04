//! Database row types. These map directly to SQLite rows and are kept
//! distinct from the agora-types models so the DB layer owns its encoding.

use std::collections::BTreeSet;

use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::Row;
use uuid::Uuid;

use agora_types::models::{Generic, Reaction, StoredToken, User, UserId};

pub const USER_COLUMNS: &str = "id, handle, email, password_hash, bio, profile_photo, \
     is_blocked, is_admin, is_verified, verification_token_hash, verification_token_expires, \
     reset_token_hash, reset_token_expires, password_changed_at, created_at, updated_at";

pub const GENERIC_COLUMNS: &str = "id, title, category, description, handle, author_id, \
     media, blog_type, num_views, created_at, updated_at";

pub struct UserRow {
    pub id: String,
    pub handle: String,
    pub email: String,
    pub password_hash: String,
    pub bio: Option<String>,
    pub profile_photo: String,
    pub is_blocked: bool,
    pub is_admin: bool,
    pub is_verified: bool,
    pub verification_token_hash: Option<String>,
    pub verification_token_expires: Option<i64>,
    pub reset_token_hash: Option<String>,
    pub reset_token_expires: Option<i64>,
    pub password_changed_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl UserRow {
    /// Expects the columns in `USER_COLUMNS` order.
    pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            handle: row.get(1)?,
            email: row.get(2)?,
            password_hash: row.get(3)?,
            bio: row.get(4)?,
            profile_photo: row.get(5)?,
            is_blocked: row.get(6)?,
            is_admin: row.get(7)?,
            is_verified: row.get(8)?,
            verification_token_hash: row.get(9)?,
            verification_token_expires: row.get(10)?,
            reset_token_hash: row.get(11)?,
            reset_token_expires: row.get(12)?,
            password_changed_at: row.get(13)?,
            created_at: row.get(14)?,
            updated_at: row.get(15)?,
        })
    }

    pub fn into_user(self, sets: UserSets) -> Result<User> {
        Ok(User {
            id: parse_id(&self.id)?,
            handle: self.handle,
            email: self.email,
            password_hash: self.password_hash,
            bio: self.bio,
            profile_photo: self.profile_photo,
            is_blocked: self.is_blocked,
            is_admin: self.is_admin,
            is_verified: self.is_verified,
            followers: sets.followers,
            following: sets.following,
            viewed_by: sets.viewed_by,
            verification_token: stored_token(
                self.verification_token_hash,
                self.verification_token_expires,
            )?,
            reset_token: stored_token(self.reset_token_hash, self.reset_token_expires)?,
            password_changed_at: self
                .password_changed_at
                .as_deref()
                .map(parse_time)
                .transpose()?,
            created_at: parse_time(&self.created_at)?,
            updated_at: parse_time(&self.updated_at)?,
        })
    }
}

/// The set-valued fields of a user document.
#[derive(Default)]
pub struct UserSets {
    pub followers: BTreeSet<UserId>,
    pub following: BTreeSet<UserId>,
    pub viewed_by: BTreeSet<UserId>,
}

pub struct GenericRow {
    pub id: String,
    pub title: String,
    pub category: String,
    pub description: String,
    pub handle: String,
    pub author_id: String,
    pub media: String,
    pub blog_type: String,
    pub num_views: i64,
    pub created_at: String,
    pub updated_at: String,
}

impl GenericRow {
    /// Expects the columns in `GENERIC_COLUMNS` order.
    pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            title: row.get(1)?,
            category: row.get(2)?,
            description: row.get(3)?,
            handle: row.get(4)?,
            author_id: row.get(5)?,
            media: row.get(6)?,
            blog_type: row.get(7)?,
            num_views: row.get(8)?,
            created_at: row.get(9)?,
            updated_at: row.get(10)?,
        })
    }

    pub fn into_generic(self, reactions: ReactionSets) -> Result<Generic> {
        Ok(Generic {
            id: parse_id(&self.id)?,
            title: self.title,
            category: self.category,
            description: self.description,
            handle: self.handle,
            author_id: parse_id(&self.author_id)?,
            media: self.media,
            blog_type: self.blog_type,
            num_views: u64::try_from(self.num_views).unwrap_or_default(),
            likes: reactions.likes,
            dislikes: reactions.dislikes,
            created_at: parse_time(&self.created_at)?,
            updated_at: parse_time(&self.updated_at)?,
        })
    }
}

#[derive(Default)]
pub struct ReactionSets {
    pub likes: BTreeSet<String>,
    pub dislikes: BTreeSet<String>,
}

impl ReactionSets {
    pub fn insert(&mut self, reaction: &str, actor: String) {
        match parse_reaction(reaction) {
            Some(Reaction::Like) => {
                self.likes.insert(actor);
            }
            Some(Reaction::Dislike) => {
                self.dislikes.insert(actor);
            }
            None => {}
        }
    }
}

pub fn reaction_name(reaction: Reaction) -> &'static str {
    match reaction {
        Reaction::Like => "like",
        Reaction::Dislike => "dislike",
    }
}

fn parse_reaction(name: &str) -> Option<Reaction> {
    match name {
        "like" => Some(Reaction::Like),
        "dislike" => Some(Reaction::Dislike),
        _ => None,
    }
}

/// Fixed-width RFC 3339 so that text ordering matches time ordering.
pub fn format_time(time: DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn parse_time(text: &str) -> Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(text)
        .with_context(|| format!("bad timestamp in database: {text}"))?
        .with_timezone(&Utc))
}

pub fn parse_id(text: &str) -> Result<Uuid> {
    Uuid::parse_str(text).with_context(|| format!("bad id in database: {text}"))
}

fn stored_token(hash: Option<String>, expires: Option<i64>) -> Result<Option<StoredToken>> {
    match (hash, expires) {
        (Some(hash), Some(expires)) => {
            let expires_at = DateTime::from_timestamp_micros(expires)
                .with_context(|| format!("bad token expiry in database: {expires}"))?;
            Ok(Some(StoredToken { hash, expires_at }))
        }
        _ => Ok(None),
    }
}
