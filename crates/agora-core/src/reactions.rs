use std::sync::Arc;

use tracing::debug;

use agora_types::models::{Generic, GenericId, Reaction, UserId};

use crate::error::{NotFoundError, Result, ValidationErrors};
use crate::store::{GenericStore, ReactionUpdate};

pub const MAX_ANONYMOUS_ID_LEN: usize = 128;

/// Who is reacting. Anonymous ids are client supplied and unverified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Actor {
    User(UserId),
    Anonymous(String),
}

impl Actor {
    pub fn anonymous(id: &str) -> Result<Self> {
        let id = id.trim();
        if id.is_empty() {
            return Err(ValidationErrors::single("anonId", "Anonymous id is required").into());
        }
        if id.chars().count() > MAX_ANONYMOUS_ID_LEN {
            return Err(ValidationErrors::single("anonId", "Anonymous id is too long").into());
        }
        Ok(Self::Anonymous(id.to_string()))
    }

    /// The value recorded in a generic's `likes` / `dislikes` sets.
    pub fn key(&self) -> String {
        match self {
            Self::User(id) => id.to_string(),
            Self::Anonymous(id) => id.clone(),
        }
    }
}

#[derive(Clone)]
pub struct Reactions {
    generics: Arc<dyn GenericStore>,
}

impl Reactions {
    pub fn new(generics: Arc<dyn GenericStore>) -> Self {
        Self { generics }
    }

    /// Toggle `actor`'s `reaction` on a generic, clearing the opposite
    /// reaction when one is cast. Returns the refreshed generic.
    pub fn react(&self, actor: &Actor, id: GenericId, reaction: Reaction) -> Result<Generic> {
        let generic = self.find(id)?;
        let key = actor.key();

        let update = if generic.reactions_of(reaction).contains(&key) {
            ReactionUpdate::Withdraw(reaction)
        } else {
            ReactionUpdate::Cast(reaction)
        };

        if !self.generics.apply_reaction(id, &key, update)? {
            return Err(NotFoundError::ContentNotFound.into());
        }

        debug!(generic = %id, actor = %key, ?update, "applied reaction");
        self.find(id)
    }

    fn find(&self, id: GenericId) -> Result<Generic> {
        self.generics
            .generic_by_id(id)?
            .ok_or_else(|| NotFoundError::ContentNotFound.into())
    }
}
