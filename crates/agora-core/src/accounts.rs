//! Registration, login, profile management and the token-backed account
//! flows (email verification, password reset).

use std::sync::Arc;

use chrono::{Duration, Utc};
use tracing::info;
use uuid::Uuid;

use agora_types::models::{User, UserId};

use crate::error::{AuthError, Error, NotFoundError, Result, ValidationErrors};
use crate::password::Passwords;
use crate::session::SessionCodec;
use crate::store::{NewUser, ProfilePatch, UserStore};
use crate::tokens::{TokenKind, TokenManager};

pub const HANDLE_MIN_LEN: usize = 3;
pub const HANDLE_MAX_LEN: usize = 32;
pub const PASSWORD_MIN_LEN: usize = 8;

/// An authenticated user and a freshly issued session credential.
#[derive(Debug, Clone)]
pub struct Session {
    pub user: User,
    pub token: String,
}

#[derive(Debug, Clone, Default)]
pub struct ProfileChanges {
    pub handle: Option<String>,
    pub email: Option<String>,
    pub bio: Option<String>,
    pub profile_photo: Option<String>,
    pub password: Option<String>,
}

#[derive(Clone)]
pub struct Accounts {
    users: Arc<dyn UserStore>,
    sessions: Arc<dyn SessionCodec>,
    tokens: TokenManager,
    passwords: Passwords,
}

impl Accounts {
    pub fn new(
        users: Arc<dyn UserStore>,
        sessions: Arc<dyn SessionCodec>,
        tokens: TokenManager,
    ) -> Self {
        Self {
            users,
            sessions,
            tokens,
            passwords: Passwords::new(),
        }
    }

    pub fn with_passwords(mut self, passwords: Passwords) -> Self {
        self.passwords = passwords;
        self
    }

    pub fn register(&self, handle: &str, email: &str, password: &str) -> Result<Session> {
        let handle = handle.trim();
        let email = normalize_email(email);

        let mut errors = ValidationErrors::new();
        check_handle(&mut errors, handle);
        check_email(&mut errors, &email);
        check_password(&mut errors, password);
        errors.into_result()?;

        let new_user = NewUser {
            id: Uuid::new_v4(),
            handle: handle.to_string(),
            email,
            password_hash: self.passwords.hash(password)?,
            created_at: Utc::now(),
        };
        self.users.insert_user(&new_user)?;

        let user = self.get_user(new_user.id)?;
        info!(user = %user.id, handle = %user.handle, "registered user");
        self.start_session(user)
    }

    /// Unknown email and wrong password fail identically.
    pub fn login(&self, email: &str, password: &str) -> Result<Session> {
        let user = self
            .users
            .user_by_email(&normalize_email(email))?
            .ok_or(AuthError::InvalidCredentials)?;

        if !self.passwords.verify(password, &user.password_hash)? {
            return Err(AuthError::InvalidCredentials.into());
        }

        info!(user = %user.id, "user logged in");
        self.start_session(user)
    }

    fn start_session(&self, user: User) -> Result<Session> {
        let token = self.sessions.issue(&user)?;
        Ok(Session { user, token })
    }

    pub fn get_user(&self, id: UserId) -> Result<User> {
        self.users
            .user_by_id(id)?
            .ok_or_else(|| NotFoundError::UserNotFound.into())
    }

    pub fn list_users(&self) -> Result<Vec<User>> {
        Ok(self.users.list_users()?)
    }

    /// Owners edit their own profile; admins may edit any. The password is
    /// hashed only when the change set carries one.
    pub fn update_profile(&self, actor: &User, id: UserId, changes: ProfileChanges) -> Result<User> {
        if actor.id != id && !actor.is_admin {
            return Err(AuthError::Forbidden.into());
        }

        let handle = changes.handle.as_deref().map(str::trim);
        let email = changes.email.as_deref().map(normalize_email);

        let mut errors = ValidationErrors::new();
        if let Some(handle) = handle {
            check_handle(&mut errors, handle);
        }
        if let Some(email) = &email {
            check_email(&mut errors, email);
        }
        if let Some(password) = &changes.password {
            check_password(&mut errors, password);
        }
        errors.into_result()?;

        let mut patch = ProfilePatch {
            handle: handle.map(str::to_string),
            email,
            bio: changes.bio,
            profile_photo: changes.profile_photo,
            ..ProfilePatch::default()
        };
        if let Some(password) = &changes.password {
            patch.password_hash = Some(self.passwords.hash(password)?);
            patch.password_changed_at = Some(Utc::now());
        }

        if !patch.is_empty() && !self.users.update_profile(id, &patch)? {
            return Err(NotFoundError::UserNotFound.into());
        }

        self.get_user(id)
    }

    /// Admin only. Returns the refreshed user listing.
    pub fn set_blocked(&self, actor: &User, id: UserId, blocked: bool) -> Result<Vec<User>> {
        if !actor.is_admin {
            return Err(AuthError::Forbidden.into());
        }

        if !self.users.set_blocked(id, blocked)? {
            return Err(NotFoundError::UserNotFound.into());
        }

        info!(admin = %actor.id, user = %id, blocked, "changed block status");
        self.list_users()
    }

    /// How long an issued verification or reset token stays valid.
    pub fn token_ttl(&self) -> Duration {
        self.tokens.ttl()
    }

    /// Raw verification token for out-of-band delivery.
    pub fn request_verification(&self, user: &User) -> Result<String> {
        self.tokens.issue(user.id, TokenKind::Verification)
    }

    pub fn verify_account(&self, raw_token: &str) -> Result<User> {
        let user = self.tokens.consume(raw_token, TokenKind::Verification)?;
        self.users.mark_verified(user.id)?;

        info!(user = %user.id, "account verified");
        self.get_user(user.id)
    }

    /// Returns the account and a raw reset token for out-of-band delivery.
    pub fn request_password_reset(&self, email: &str) -> Result<(User, String)> {
        let user = self
            .users
            .user_by_email(&normalize_email(email))?
            .ok_or(NotFoundError::UserNotFound)?;

        let raw = self.tokens.issue(user.id, TokenKind::Reset)?;
        Ok((user, raw))
    }

    /// The new password is validated and hashed before the token is
    /// consumed, so a rejected password leaves the token usable.
    pub fn reset_password(&self, raw_token: &str, new_password: &str) -> Result<User> {
        let mut errors = ValidationErrors::new();
        check_password(&mut errors, new_password);
        errors.into_result()?;

        let patch = ProfilePatch {
            password_hash: Some(self.passwords.hash(new_password)?),
            password_changed_at: Some(Utc::now()),
            ..ProfilePatch::default()
        };

        let user = self.tokens.consume(raw_token, TokenKind::Reset)?;
        if !self.users.update_profile(user.id, &patch)? {
            return Err(Error::from(NotFoundError::UserNotFound));
        }

        info!(user = %user.id, "password reset");
        self.get_user(user.id)
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn check_handle(errors: &mut ValidationErrors, handle: &str) {
    let len = handle.chars().count();
    if len == 0 {
        errors.add("handle", "Handle is required");
    } else if !(HANDLE_MIN_LEN..=HANDLE_MAX_LEN).contains(&len) {
        errors.add(
            "handle",
            format!("Handle must be between {HANDLE_MIN_LEN} and {HANDLE_MAX_LEN} characters"),
        );
    }
}

fn check_email(errors: &mut ValidationErrors, email: &str) {
    if email.is_empty() {
        errors.add("email", "Email is required");
        return;
    }
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !email.contains(char::is_whitespace)
        }
        None => false,
    };
    if !valid {
        errors.add("email", "Email must be a valid email address");
    }
}

fn check_password(errors: &mut ValidationErrors, password: &str) {
    if password.is_empty() {
        errors.add("password", "Password is required");
    } else if password.chars().count() < PASSWORD_MIN_LEN {
        errors.add(
            "password",
            format!("Password must be at least {PASSWORD_MIN_LEN} characters"),
        );
    }
}
