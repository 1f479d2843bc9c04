pub mod accounts;
pub mod content;
pub mod error;
pub mod gate;
pub mod graph;
pub mod moderation;
pub mod password;
pub mod reactions;
pub mod session;
pub mod store;
pub mod tokens;
pub mod views;

#[cfg(test)]
mod memory;

pub use accounts::{Accounts, ProfileChanges, Session};
pub use content::{Content, ContentChanges, NewContent};
pub use error::{Error, ErrorKind, Result, ValidationErrors};
pub use gate::AuthGate;
pub use graph::SocialGraph;
pub use moderation::{ModerationGate, ProfanityFilter, WordListFilter};
pub use password::Passwords;
pub use reactions::{Actor, Reactions};
pub use session::{JwtSessions, SessionCodec};
pub use store::{GenericStore, StoreError, UserStore};
pub use tokens::{TokenKind, TokenManager};
pub use views::ViewTracker;
