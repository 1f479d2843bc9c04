//! Profanity screening for generic submissions.
//!
//! Creation-time profanity blocks the author; update-time profanity only
//! rejects the edit.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{error, warn};

use agora_types::models::User;

use crate::error::{AuthError, ModerationError, Result};
use crate::store::UserStore;

const DEFAULT_WORDS: &[&str] = &[
    "arse", "arsehole", "asshole", "bastard", "bitch", "bollocks", "bullshit", "cock", "crap",
    "cunt", "damn", "dick", "dickhead", "fuck", "fucked", "fucker", "fucking", "motherfucker",
    "piss", "prick", "pussy", "shit", "shitty", "slut", "twat", "wanker", "whore",
];

pub trait ProfanityFilter: Send + Sync {
    fn is_profane(&self, text: &str) -> bool;
}

/// Case-insensitive whole-word match against a word list.
#[derive(Debug, Clone)]
pub struct WordListFilter {
    words: HashSet<String>,
}

impl Default for WordListFilter {
    fn default() -> Self {
        Self {
            words: DEFAULT_WORDS.iter().map(|w| w.to_string()).collect(),
        }
    }
}

impl WordListFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_words<I, S>(mut self, extra: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.words.extend(
            extra
                .into_iter()
                .map(|w| w.as_ref().trim().to_lowercase())
                .filter(|w| !w.is_empty()),
        );
        self
    }
}

impl ProfanityFilter for WordListFilter {
    fn is_profane(&self, text: &str) -> bool {
        text.split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .any(|w| self.words.contains(&w.to_lowercase()))
    }
}

#[derive(Clone)]
pub struct ModerationGate {
    users: Arc<dyn UserStore>,
    filter: Arc<dyn ProfanityFilter>,
}

impl ModerationGate {
    pub fn new(users: Arc<dyn UserStore>, filter: Arc<dyn ProfanityFilter>) -> Self {
        Self { users, filter }
    }

    fn is_profane(&self, title: &str, description: &str) -> bool {
        self.filter.is_profane(&format!("{title} {description}"))
    }

    /// Rejects profane new content and blocks its author.
    pub fn screen_creation(&self, author: &User, title: &str, description: &str) -> Result<()> {
        if !self.is_profane(title, description) {
            return Ok(());
        }

        warn!(user = %author.id, handle = %author.handle, "profane generic submitted, blocking author");
        match self.users.set_blocked(author.id, true) {
            Ok(true) => Err(ModerationError::ProfanityRejected { author_blocked: true }.into()),
            Ok(false) => {
                error!(user = %author.id, "author vanished before the block was written");
                Err(AuthError::UserNotFound.into())
            }
            Err(e) => {
                error!(user = %author.id, "failed to block author after profane submission: {e}");
                Err(e.into())
            }
        }
    }

    /// Rejects a profane edit. Never touches the author's block status.
    pub fn screen_update(&self, actor: &User, title: &str, description: &str) -> Result<()> {
        if !self.is_profane(title, description) {
            return Ok(());
        }

        warn!(user = %actor.id, "profane generic update rejected");
        Err(ModerationError::ProfanityRejected { author_blocked: false }.into())
    }
}
