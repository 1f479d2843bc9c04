//! Single-use verification and password-reset tokens.
//!
//! Only a digest of each raw token is persisted. The raw value leaves this
//! module exactly once, as the return value of [`TokenManager::issue`].

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use sha2::{Digest, Sha256};
use tracing::debug;

use agora_types::models::{StoredToken, User, UserId};

pub use crate::store::TokenKind;
use crate::error::{NotFoundError, Result, TokenError};
use crate::store::UserStore;

pub const TOKEN_BYTES: usize = 32;
pub const DEFAULT_TOKEN_TTL_MINUTES: i64 = 30;

/// One-way digest applied to raw tokens before they are stored or looked up.
pub trait TokenDigest: Send + Sync {
    fn digest(&self, raw: &str) -> String;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Sha256Digest;

impl TokenDigest for Sha256Digest {
    fn digest(&self, raw: &str) -> String {
        hex::encode(Sha256::digest(raw.as_bytes()))
    }
}

#[derive(Clone)]
pub struct TokenManager {
    users: Arc<dyn UserStore>,
    digest: Arc<dyn TokenDigest>,
    ttl: Duration,
}

impl TokenManager {
    pub fn new(users: Arc<dyn UserStore>) -> Self {
        Self {
            users,
            digest: Arc::new(Sha256Digest),
            ttl: Duration::minutes(DEFAULT_TOKEN_TTL_MINUTES),
        }
    }

    pub fn with_digest(mut self, digest: Arc<dyn TokenDigest>) -> Self {
        self.digest = digest;
        self
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Generate a token of `kind` for `user`, replacing any previous one, and
    /// return the raw value for out-of-band delivery.
    pub fn issue(&self, user: UserId, kind: TokenKind) -> Result<String> {
        self.issue_at(user, kind, Utc::now())
    }

    pub fn issue_at(&self, user: UserId, kind: TokenKind, now: DateTime<Utc>) -> Result<String> {
        let raw = generate_raw();
        let stored = StoredToken {
            hash: self.digest.digest(&raw),
            expires_at: now + self.ttl,
        };

        if !self.users.store_token(user, kind, &stored)? {
            return Err(NotFoundError::UserNotFound.into());
        }

        debug!(%user, ?kind, expires_at = %stored.expires_at, "issued single-use token");
        Ok(raw)
    }

    /// Redeem a raw token. Unknown, expired and already-used tokens all fail
    /// with [`TokenError::TokenNotFound`].
    pub fn consume(&self, raw: &str, kind: TokenKind) -> Result<User> {
        self.consume_at(raw, kind, Utc::now())
    }

    pub fn consume_at(&self, raw: &str, kind: TokenKind, now: DateTime<Utc>) -> Result<User> {
        let hash = self.digest.digest(raw.trim());

        let user_id = self
            .users
            .take_token(kind, &hash, now)?
            .ok_or(TokenError::TokenNotFound)?;

        debug!(user = %user_id, ?kind, "consumed single-use token");

        self.users
            .user_by_id(user_id)?
            .ok_or_else(|| TokenError::TokenNotFound.into())
    }
}

fn generate_raw() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}
