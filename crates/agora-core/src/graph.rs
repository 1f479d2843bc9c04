//! Follow / unfollow across two user documents.
//!
//! The store only guarantees atomicity per document, so each operation is two
//! conditional writes: the target's `followers` first, then the actor's
//! `following`. A failed second write is compensated by reversing the first.

use std::sync::Arc;

use tracing::{error, info, warn};

use agora_types::models::{User, UserId};

use crate::error::{Error, GraphError, NotFoundError, Result};
use crate::store::UserStore;

#[derive(Clone)]
pub struct SocialGraph {
    users: Arc<dyn UserStore>,
}

impl SocialGraph {
    pub fn new(users: Arc<dyn UserStore>) -> Self {
        Self { users }
    }

    /// Returns the actor's refreshed record.
    pub fn follow(&self, actor: &User, target_id: UserId) -> Result<User> {
        if actor.id == target_id {
            return Err(GraphError::SelfFollowNotAllowed.into());
        }

        let target = self.target(target_id)?;
        if target.is_followed_by(actor.id) {
            return Err(GraphError::AlreadyFollowing.into());
        }

        if !self.users.add_follower(target_id, actor.id)? {
            // A concurrent follow got there first.
            return Err(GraphError::AlreadyFollowing.into());
        }

        if let Err(e) = self.users.add_following(actor.id, target_id) {
            self.compensate("follow", actor.id, target_id, || {
                self.users.remove_follower(target_id, actor.id)
            });
            return Err(e.into());
        }

        info!(actor = %actor.id, target = %target_id, "followed user");
        self.refreshed(actor.id)
    }

    /// Returns the actor's refreshed record.
    pub fn unfollow(&self, actor: &User, target_id: UserId) -> Result<User> {
        let target = self.target(target_id)?;
        if !target.is_followed_by(actor.id) {
            return Err(GraphError::NotFollowing.into());
        }

        if !self.users.remove_follower(target_id, actor.id)? {
            return Err(GraphError::NotFollowing.into());
        }

        if let Err(e) = self.users.remove_following(actor.id, target_id) {
            self.compensate("unfollow", actor.id, target_id, || {
                self.users.add_follower(target_id, actor.id)
            });
            return Err(e.into());
        }

        info!(actor = %actor.id, target = %target_id, "unfollowed user");
        self.refreshed(actor.id)
    }

    fn target(&self, id: UserId) -> Result<User> {
        self.users
            .user_by_id(id)?
            .ok_or_else(|| NotFoundError::UserNotFound.into())
    }

    fn refreshed(&self, id: UserId) -> Result<User> {
        self.users
            .user_by_id(id)?
            .ok_or_else(|| Error::from(NotFoundError::UserNotFound))
    }

    fn compensate<F, E>(&self, op: &str, actor: UserId, target: UserId, undo: F)
    where
        F: FnOnce() -> std::result::Result<bool, E>,
        E: std::fmt::Display,
    {
        warn!(%actor, %target, "{op}: second write failed, reverting first");
        if let Err(e) = undo() {
            error!(%actor, %target, "{op}: compensation failed, graph is one-sided: {e}");
        }
    }
}
