use std::sync::Arc;

use tracing::debug;

use agora_types::models::User;

use crate::error::{AuthError, Result};
use crate::session::SessionCodec;
use crate::store::UserStore;

/// Resolves a presented session credential to a live, unblocked user.
#[derive(Clone)]
pub struct AuthGate {
    users: Arc<dyn UserStore>,
    sessions: Arc<dyn SessionCodec>,
}

impl AuthGate {
    pub fn new(users: Arc<dyn UserStore>, sessions: Arc<dyn SessionCodec>) -> Self {
        Self { users, sessions }
    }

    pub fn authenticate(&self, credential: &str) -> Result<User> {
        let claims = self.sessions.verify(credential)?;

        let user = self
            .users
            .user_by_id(claims.sub)?
            .ok_or(AuthError::UserNotFound)?;

        if user.is_blocked {
            debug!(user = %user.id, "rejected session of blocked account");
            return Err(AuthError::AccountBlocked.into());
        }

        Ok(user)
    }
}
