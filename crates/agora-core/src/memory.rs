//! In-memory store with fault injection, used by the core's unit tests.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::anyhow;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use agora_types::models::{
    DEFAULT_BLOG_TYPE, DEFAULT_MEDIA, DEFAULT_PROFILE_PHOTO, Generic, GenericId, Reaction,
    StoredToken, User, UserId,
};

use crate::store::{
    GenericFilter, GenericPatch, GenericStore, NewGeneric, NewUser, ProfilePatch,
    ReactionUpdate, StoreError, TokenKind, UniqueField, UserStore,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Fault {
    AddFollower,
    RemoveFollower,
    AddFollowing,
    RemoveFollowing,
    SetBlocked,
}

#[derive(Default)]
struct State {
    users: HashMap<UserId, User>,
    generics: HashMap<GenericId, Generic>,
    faults: HashSet<Fault>,
}

#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    /// Make every later call of `op` fail with a backend error.
    pub fn fail(&self, op: Fault) {
        self.lock().faults.insert(op);
    }

    pub fn seed_user(&self, handle: &str) -> User {
        let user = NewUser {
            id: Uuid::new_v4(),
            handle: handle.into(),
            email: format!("{handle}@example.com"),
            password_hash: "unused".into(),
            created_at: Utc::now(),
        };
        self.insert_user(&user).unwrap();
        self.user(user.id)
    }

    pub fn seed_generic(&self, author: &User, title: &str) -> Generic {
        let generic = NewGeneric {
            id: Uuid::new_v4(),
            title: title.into(),
            category: "general".into(),
            description: "a perfectly polite description".into(),
            handle: author.handle.clone(),
            author_id: author.id,
            media: DEFAULT_MEDIA.into(),
            blog_type: DEFAULT_BLOG_TYPE.into(),
            created_at: Utc::now(),
        };
        self.insert_generic(&generic).unwrap();
        self.generic(generic.id)
    }

    pub fn make_admin(&self, id: UserId) {
        self.lock().users.get_mut(&id).unwrap().is_admin = true;
    }

    pub fn user(&self, id: UserId) -> User {
        self.lock().users[&id].clone()
    }

    pub fn generic(&self, id: GenericId) -> Generic {
        self.lock().generics[&id].clone()
    }

    pub fn try_generic(&self, id: GenericId) -> Option<Generic> {
        self.lock().generics.get(&id).cloned()
    }
}

fn check(state: &State, op: Fault) -> Result<(), StoreError> {
    if state.faults.contains(&op) {
        Err(StoreError::Backend(anyhow!("injected failure in {op:?}")))
    } else {
        Ok(())
    }
}

fn token_slot(user: &mut User, kind: TokenKind) -> &mut Option<StoredToken> {
    match kind {
        TokenKind::Verification => &mut user.verification_token,
        TokenKind::Reset => &mut user.reset_token,
    }
}

fn reaction_set(generic: &mut Generic, reaction: Reaction) -> &mut BTreeSet<String> {
    match reaction {
        Reaction::Like => &mut generic.likes,
        Reaction::Dislike => &mut generic.dislikes,
    }
}

fn with_user(
    state: &mut State,
    id: UserId,
    f: impl FnOnce(&mut User) -> bool,
) -> Result<bool, StoreError> {
    Ok(match state.users.get_mut(&id) {
        Some(user) => {
            let changed = f(user);
            user.updated_at = Utc::now();
            changed
        }
        None => false,
    })
}

impl UserStore for MemoryStore {
    fn insert_user(&self, user: &NewUser) -> Result<(), StoreError> {
        let mut state = self.lock();
        if state.users.values().any(|u| u.handle == user.handle) {
            return Err(StoreError::Duplicate(UniqueField::Handle));
        }
        if state.users.values().any(|u| u.email == user.email) {
            return Err(StoreError::Duplicate(UniqueField::Email));
        }
        state.users.insert(
            user.id,
            User {
                id: user.id,
                handle: user.handle.clone(),
                email: user.email.clone(),
                password_hash: user.password_hash.clone(),
                bio: None,
                profile_photo: DEFAULT_PROFILE_PHOTO.into(),
                is_blocked: false,
                is_admin: false,
                is_verified: false,
                followers: BTreeSet::new(),
                following: BTreeSet::new(),
                viewed_by: BTreeSet::new(),
                verification_token: None,
                reset_token: None,
                password_changed_at: None,
                created_at: user.created_at,
                updated_at: user.created_at,
            },
        );
        Ok(())
    }

    fn user_by_id(&self, id: UserId) -> Result<Option<User>, StoreError> {
        Ok(self.lock().users.get(&id).cloned())
    }

    fn user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(self.lock().users.values().find(|u| u.email == email).cloned())
    }

    fn list_users(&self) -> Result<Vec<User>, StoreError> {
        let mut users: Vec<User> = self.lock().users.values().cloned().collect();
        users.sort_by_key(|u| u.created_at);
        Ok(users)
    }

    fn update_profile(&self, id: UserId, patch: &ProfilePatch) -> Result<bool, StoreError> {
        let mut state = self.lock();
        let others = || state.users.values().filter(|u| u.id != id);
        if let Some(handle) = &patch.handle {
            if others().any(|u| &u.handle == handle) {
                return Err(StoreError::Duplicate(UniqueField::Handle));
            }
        }
        if let Some(email) = &patch.email {
            if others().any(|u| &u.email == email) {
                return Err(StoreError::Duplicate(UniqueField::Email));
            }
        }
        with_user(&mut state, id, |user| {
            if let Some(handle) = &patch.handle {
                user.handle = handle.clone();
            }
            if let Some(email) = &patch.email {
                user.email = email.clone();
            }
            if let Some(bio) = &patch.bio {
                user.bio = Some(bio.clone());
            }
            if let Some(photo) = &patch.profile_photo {
                user.profile_photo = photo.clone();
            }
            if let Some(hash) = &patch.password_hash {
                user.password_hash = hash.clone();
                user.password_changed_at = patch.password_changed_at;
            }
            true
        })
    }

    fn set_blocked(&self, id: UserId, blocked: bool) -> Result<bool, StoreError> {
        let mut state = self.lock();
        check(&state, Fault::SetBlocked)?;
        with_user(&mut state, id, |user| {
            user.is_blocked = blocked;
            true
        })
    }

    fn mark_verified(&self, id: UserId) -> Result<bool, StoreError> {
        with_user(&mut self.lock(), id, |user| {
            user.is_verified = true;
            true
        })
    }

    fn add_follower(&self, user: UserId, follower: UserId) -> Result<bool, StoreError> {
        let mut state = self.lock();
        check(&state, Fault::AddFollower)?;
        with_user(&mut state, user, |u| u.followers.insert(follower))
    }

    fn remove_follower(&self, user: UserId, follower: UserId) -> Result<bool, StoreError> {
        let mut state = self.lock();
        check(&state, Fault::RemoveFollower)?;
        with_user(&mut state, user, |u| u.followers.remove(&follower))
    }

    fn add_following(&self, user: UserId, followee: UserId) -> Result<bool, StoreError> {
        let mut state = self.lock();
        check(&state, Fault::AddFollowing)?;
        with_user(&mut state, user, |u| u.following.insert(followee))
    }

    fn remove_following(&self, user: UserId, followee: UserId) -> Result<bool, StoreError> {
        let mut state = self.lock();
        check(&state, Fault::RemoveFollowing)?;
        with_user(&mut state, user, |u| u.following.remove(&followee))
    }

    fn add_profile_view(&self, user: UserId, viewer: UserId) -> Result<bool, StoreError> {
        with_user(&mut self.lock(), user, |u| u.viewed_by.insert(viewer))
    }

    fn store_token(
        &self,
        user: UserId,
        kind: TokenKind,
        token: &StoredToken,
    ) -> Result<bool, StoreError> {
        with_user(&mut self.lock(), user, |u| {
            *token_slot(u, kind) = Some(token.clone());
            true
        })
    }

    fn take_token(
        &self,
        kind: TokenKind,
        hash: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<UserId>, StoreError> {
        let mut state = self.lock();
        for user in state.users.values_mut() {
            let slot = token_slot(user, kind);
            let live = slot
                .as_ref()
                .is_some_and(|t| t.hash == hash && t.expires_at > now);
            if live {
                *slot = None;
                return Ok(Some(user.id));
            }
        }
        Ok(None)
    }
}

impl GenericStore for MemoryStore {
    fn insert_generic(&self, generic: &NewGeneric) -> Result<(), StoreError> {
        let mut state = self.lock();
        if state.generics.values().any(|g| g.title == generic.title) {
            return Err(StoreError::Duplicate(UniqueField::Title));
        }
        state.generics.insert(
            generic.id,
            Generic {
                id: generic.id,
                title: generic.title.clone(),
                category: generic.category.clone(),
                description: generic.description.clone(),
                handle: generic.handle.clone(),
                author_id: generic.author_id,
                media: generic.media.clone(),
                blog_type: generic.blog_type.clone(),
                num_views: 0,
                likes: BTreeSet::new(),
                dislikes: BTreeSet::new(),
                created_at: generic.created_at,
                updated_at: generic.created_at,
            },
        );
        Ok(())
    }

    fn generic_by_id(&self, id: GenericId) -> Result<Option<Generic>, StoreError> {
        Ok(self.try_generic(id))
    }

    fn list_generics(&self, filter: &GenericFilter) -> Result<Vec<Generic>, StoreError> {
        let mut generics: Vec<Generic> = self
            .lock()
            .generics
            .values()
            .filter(|g| filter.category.as_ref().is_none_or(|c| &g.category == c))
            .filter(|g| filter.handle.as_ref().is_none_or(|h| &g.handle == h))
            .cloned()
            .collect();
        generics.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(generics)
    }

    fn update_generic(&self, id: GenericId, patch: &GenericPatch) -> Result<bool, StoreError> {
        let mut state = self.lock();
        if let Some(title) = &patch.title {
            if state.generics.values().any(|g| g.id != id && &g.title == title) {
                return Err(StoreError::Duplicate(UniqueField::Title));
            }
        }
        let Some(generic) = state.generics.get_mut(&id) else {
            return Ok(false);
        };
        if let Some(v) = &patch.title {
            generic.title = v.clone();
        }
        if let Some(v) = &patch.category {
            generic.category = v.clone();
        }
        if let Some(v) = &patch.description {
            generic.description = v.clone();
        }
        if let Some(v) = &patch.media {
            generic.media = v.clone();
        }
        if let Some(v) = &patch.blog_type {
            generic.blog_type = v.clone();
        }
        generic.updated_at = Utc::now();
        Ok(true)
    }

    fn delete_generic(&self, id: GenericId) -> Result<bool, StoreError> {
        Ok(self.lock().generics.remove(&id).is_some())
    }

    fn increment_views(&self, id: GenericId) -> Result<bool, StoreError> {
        Ok(match self.lock().generics.get_mut(&id) {
            Some(generic) => {
                generic.num_views += 1;
                true
            }
            None => false,
        })
    }

    fn apply_reaction(
        &self,
        id: GenericId,
        actor: &str,
        update: ReactionUpdate,
    ) -> Result<bool, StoreError> {
        let mut state = self.lock();
        let Some(generic) = state.generics.get_mut(&id) else {
            return Ok(false);
        };
        match update {
            ReactionUpdate::Withdraw(reaction) => {
                reaction_set(generic, reaction).remove(actor);
            }
            ReactionUpdate::Cast(reaction) => {
                reaction_set(generic, reaction.opposite()).remove(actor);
                reaction_set(generic, reaction).insert(actor.to_string());
            }
        }
        generic.updated_at = Utc::now();
        Ok(true)
    }
}
