use std::sync::Arc;

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use agora_types::models::{DEFAULT_BLOG_TYPE, DEFAULT_MEDIA, Generic, GenericId, User};

use crate::error::{AuthError, NotFoundError, Result, ValidationErrors};
use crate::moderation::ModerationGate;
use crate::store::{GenericFilter, GenericPatch, GenericStore, NewGeneric};

#[derive(Debug, Clone, Default)]
pub struct NewContent {
    pub title: String,
    pub description: String,
    pub category: String,
    pub media: Option<String>,
    pub blog_type: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ContentChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub media: Option<String>,
    pub blog_type: Option<String>,
}

/// Generic lifecycle: moderated create/update, owner-authorised delete, and
/// listings.
#[derive(Clone)]
pub struct Content {
    generics: Arc<dyn GenericStore>,
    moderation: ModerationGate,
}

impl Content {
    pub fn new(generics: Arc<dyn GenericStore>, moderation: ModerationGate) -> Self {
        Self { generics, moderation }
    }

    pub fn create(&self, author: &User, content: NewContent) -> Result<Generic> {
        let title = content.title.trim();

        let mut errors = ValidationErrors::new();
        required(&mut errors, "title", "Post title is required", title);
        required(&mut errors, "category", "Post category is required", &content.category);
        required(&mut errors, "description", "Description is required", &content.description);
        errors.into_result()?;

        self.moderation
            .screen_creation(author, title, &content.description)?;

        let generic = NewGeneric {
            id: Uuid::new_v4(),
            title: title.to_string(),
            category: content.category.trim().to_string(),
            description: content.description,
            handle: author.handle.clone(),
            author_id: author.id,
            media: content.media.unwrap_or_else(|| DEFAULT_MEDIA.to_string()),
            blog_type: content
                .blog_type
                .unwrap_or_else(|| DEFAULT_BLOG_TYPE.to_string()),
            created_at: Utc::now(),
        };
        self.generics.insert_generic(&generic)?;

        info!(generic = %generic.id, author = %author.id, "created generic");
        self.get(generic.id)
    }

    pub fn update(&self, actor: &User, id: GenericId, changes: ContentChanges) -> Result<Generic> {
        let current = self.get(id)?;
        authorize(actor, &current)?;

        let title = changes.title.as_deref().map(str::trim);

        let mut errors = ValidationErrors::new();
        if let Some(title) = title {
            required(&mut errors, "title", "Post title is required", title);
        }
        if let Some(category) = &changes.category {
            required(&mut errors, "category", "Post category is required", category);
        }
        if let Some(description) = &changes.description {
            required(&mut errors, "description", "Description is required", description);
        }
        errors.into_result()?;

        self.moderation.screen_update(
            actor,
            title.unwrap_or(&current.title),
            changes.description.as_deref().unwrap_or(&current.description),
        )?;

        let patch = GenericPatch {
            title: title.map(str::to_string),
            category: changes.category.map(|c| c.trim().to_string()),
            description: changes.description,
            media: changes.media,
            blog_type: changes.blog_type,
        };
        if !self.generics.update_generic(id, &patch)? {
            return Err(NotFoundError::ContentNotFound.into());
        }

        info!(generic = %id, actor = %actor.id, "updated generic");
        self.get(id)
    }

    /// Returns the deleted generic.
    pub fn delete(&self, actor: &User, id: GenericId) -> Result<Generic> {
        let current = self.get(id)?;
        authorize(actor, &current)?;

        if !self.generics.delete_generic(id)? {
            return Err(NotFoundError::ContentNotFound.into());
        }

        info!(generic = %id, actor = %actor.id, "deleted generic");
        Ok(current)
    }

    /// Reads without counting a view.
    pub fn get(&self, id: GenericId) -> Result<Generic> {
        self.generics
            .generic_by_id(id)?
            .ok_or_else(|| NotFoundError::ContentNotFound.into())
    }

    /// Most recent first.
    pub fn list(&self, filter: &GenericFilter) -> Result<Vec<Generic>> {
        Ok(self.generics.list_generics(filter)?)
    }
}

fn authorize(actor: &User, generic: &Generic) -> Result<()> {
    if actor.id == generic.author_id || actor.is_admin {
        Ok(())
    } else {
        Err(AuthError::Forbidden.into())
    }
}

fn required(errors: &mut ValidationErrors, field: &'static str, message: &str, value: &str) {
    if value.trim().is_empty() {
        errors.add(field, message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ConflictError, Error, ModerationError};
    use crate::memory::MemoryStore;
    use crate::moderation::WordListFilter;
    use crate::store::UserStore;

    fn setup() -> (Arc<MemoryStore>, Content) {
        let store = MemoryStore::new();
        let moderation = ModerationGate::new(store.clone(), Arc::new(WordListFilter::new()));
        (store.clone(), Content::new(store, moderation))
    }

    fn post(title: &str, description: &str) -> NewContent {
        NewContent {
            title: title.into(),
            description: description.into(),
            category: "life".into(),
            ..NewContent::default()
        }
    }

    #[test]
    fn create_applies_defaults_and_trims_title() {
        let (store, content) = setup();
        let alice = store.seed_user("alice");

        let generic = content.create(&alice, post("  Hello  ", "first post")).unwrap();
        assert_eq!(generic.title, "Hello");
        assert_eq!(generic.handle, "alice");
        assert_eq!(generic.author_id, alice.id);
        assert_eq!(generic.media, DEFAULT_MEDIA);
        assert_eq!(generic.blog_type, DEFAULT_BLOG_TYPE);
        assert_eq!(generic.num_views, 0);
    }

    #[test]
    fn duplicate_title_is_conflict() {
        let (store, content) = setup();
        let alice = store.seed_user("alice");
        content.create(&alice, post("Hello", "one")).unwrap();

        let again = content.create(&alice, post("Hello", "two"));
        assert!(matches!(again, Err(Error::Conflict(ConflictError::DuplicateTitle))));
    }

    #[test]
    fn missing_fields_are_reported() {
        let (store, content) = setup();
        let alice = store.seed_user("alice");

        match content.create(&alice, NewContent::default()) {
            Err(Error::Validation(errors)) => {
                assert!(errors.contains("title"));
                assert!(errors.contains("category"));
                assert!(errors.contains("description"));
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn profane_create_blocks_and_profane_edit_only_rejects() {
        let (store, content) = setup();
        let bob = store.seed_user("bob");
        let existing = content.create(&bob, post("Clean", "nice words")).unwrap();

        let rejected = content.create(&bob, post("Rant", "what a load of shit"));
        assert!(matches!(
            rejected,
            Err(Error::Moderation(ModerationError::ProfanityRejected { author_blocked: true }))
        ));
        assert!(store.user(bob.id).is_blocked);
        assert_eq!(content.list(&GenericFilter::default()).unwrap().len(), 1);

        let bob = store.user(bob.id);
        let edit = ContentChanges {
            description: Some("shit".into()),
            ..ContentChanges::default()
        };
        let rejected = content.update(&bob, existing.id, edit);
        assert!(matches!(
            rejected,
            Err(Error::Moderation(ModerationError::ProfanityRejected { author_blocked: false }))
        ));
        assert!(store.user(bob.id).is_blocked);
        assert_eq!(content.get(existing.id).unwrap().description, "nice words");
    }

    #[test]
    fn profane_edit_does_not_block_clean_author() {
        let (store, content) = setup();
        let carol = store.seed_user("carol");
        let existing = content.create(&carol, post("Clean", "nice words")).unwrap();

        let edit = ContentChanges {
            title: Some("Bullshit".into()),
            ..ContentChanges::default()
        };
        assert!(content.update(&carol, existing.id, edit).is_err());
        assert!(!store.user(carol.id).is_blocked);
    }

    #[test]
    fn update_keeps_author_and_applies_changes() {
        let (store, content) = setup();
        let alice = store.seed_user("alice");
        let generic = content.create(&alice, post("Hello", "first")).unwrap();

        let edit = ContentChanges {
            title: Some("Hello again".into()),
            category: Some("news".into()),
            ..ContentChanges::default()
        };
        let updated = content.update(&alice, generic.id, edit).unwrap();
        assert_eq!(updated.title, "Hello again");
        assert_eq!(updated.category, "news");
        assert_eq!(updated.description, "first");
        assert_eq!(updated.author_id, alice.id);
    }

    #[test]
    fn only_author_or_admin_may_edit_or_delete() {
        let (store, content) = setup();
        let alice = store.seed_user("alice");
        let eve = store.seed_user("eve");
        let generic = content.create(&alice, post("Hello", "first")).unwrap();

        let edit = ContentChanges {
            title: Some("Mine now".into()),
            ..ContentChanges::default()
        };
        assert!(matches!(
            content.update(&eve, generic.id, edit),
            Err(Error::Auth(AuthError::Forbidden))
        ));
        assert!(matches!(
            content.delete(&eve, generic.id),
            Err(Error::Auth(AuthError::Forbidden))
        ));

        store.make_admin(eve.id);
        let eve = store.user(eve.id);
        let deleted = content.delete(&eve, generic.id).unwrap();
        assert_eq!(deleted.id, generic.id);
        assert!(store.try_generic(generic.id).is_none());
    }

    #[test]
    fn list_filters_by_category_and_handle() {
        let (store, content) = setup();
        let alice = store.seed_user("alice");
        let bob = store.seed_user("bob");
        content.create(&alice, post("A1", "x")).unwrap();
        content
            .create(
                &bob,
                NewContent {
                    category: "news".into(),
                    ..post("B1", "y")
                },
            )
            .unwrap();

        let by_handle = GenericFilter {
            handle: Some("alice".into()),
            ..GenericFilter::default()
        };
        let titles: Vec<_> = content.list(&by_handle).unwrap().into_iter().map(|g| g.title).collect();
        assert_eq!(titles, vec!["A1"]);

        let by_category = GenericFilter {
            category: Some("news".into()),
            ..GenericFilter::default()
        };
        let titles: Vec<_> = content.list(&by_category).unwrap().into_iter().map(|g| g.title).collect();
        assert_eq!(titles, vec!["B1"]);
    }

    #[test]
    fn blocked_status_is_unchanged_by_clean_create() {
        let (store, content) = setup();
        let dan = store.seed_user("dan");
        content.create(&dan, post("Fine", "all good")).unwrap();
        assert!(!store.user_by_id(dan.id).unwrap().unwrap().is_blocked);
    }
}
