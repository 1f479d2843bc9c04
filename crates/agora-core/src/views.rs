use std::sync::Arc;

use tracing::debug;

use agora_types::models::{Generic, GenericId, User, UserId};

use crate::error::{NotFoundError, Result};
use crate::store::{GenericStore, UserStore};

/// Item fetches count every time; profile views count once per viewer.
#[derive(Clone)]
pub struct ViewTracker {
    users: Arc<dyn UserStore>,
    generics: Arc<dyn GenericStore>,
}

impl ViewTracker {
    pub fn new(users: Arc<dyn UserStore>, generics: Arc<dyn GenericStore>) -> Self {
        Self { users, generics }
    }

    pub fn fetch_generic(&self, id: GenericId) -> Result<Generic> {
        if !self.generics.increment_views(id)? {
            return Err(NotFoundError::ContentNotFound.into());
        }

        self.generics
            .generic_by_id(id)?
            .ok_or_else(|| NotFoundError::ContentNotFound.into())
    }

    pub fn fetch_profile(&self, viewer: &User, id: UserId) -> Result<User> {
        let profile = self
            .users
            .user_by_id(id)?
            .ok_or(NotFoundError::UserNotFound)?;

        if viewer.id == profile.id || profile.viewed_by.contains(&viewer.id) {
            return Ok(profile);
        }

        if self.users.add_profile_view(id, viewer.id)? {
            debug!(profile = %id, viewer = %viewer.id, "recorded profile view");
        }

        self.users
            .user_by_id(id)?
            .ok_or_else(|| NotFoundError::UserNotFound.into())
    }
}
