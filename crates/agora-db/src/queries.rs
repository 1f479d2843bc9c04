use std::collections::HashMap;

use anyhow::Result;
use chrono::{DateTime, Utc};
use rusqlite::{Connection, ErrorCode, params};
use tracing::info;

use agora_core::store::{
    GenericFilter, GenericPatch, GenericStore, NewGeneric, NewUser, ProfilePatch,
    ReactionUpdate, StoreError, TokenKind, UniqueField, UserStore,
};
use agora_types::models::{
    DEFAULT_PROFILE_PHOTO, Generic, GenericId, StoredToken, User, UserId,
};

use crate::Database;
use crate::models::{
    GENERIC_COLUMNS, GenericRow, ReactionSets, USER_COLUMNS, UserRow, UserSets, format_time,
    parse_id, reaction_name,
};

impl Database {
    /// Promote the account registered under `email`. `false` if there is none.
    pub fn grant_admin(&self, email: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE users SET is_admin = 1, updated_at = ?1 WHERE email = ?2",
                params![format_time(Utc::now()), email],
            )?;
            if changed > 0 {
                info!("Granted admin rights to {}", email);
            }
            Ok(changed > 0)
        })
    }

    fn add_edge(&self, table: &str, column: &str, user: UserId, other: UserId) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            let user = user.to_string();
            if !user_exists(&tx, &user)? {
                return Ok(false);
            }

            let sql = format!("INSERT OR IGNORE INTO {table} (user_id, {column}) VALUES (?1, ?2)");
            let added = tx.execute(&sql, params![user, other.to_string()])? > 0;
            if added {
                touch_user(&tx, &user)?;
            }
            tx.commit()?;
            Ok(added)
        })
    }

    fn remove_edge(&self, table: &str, column: &str, user: UserId, other: UserId) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            let user = user.to_string();

            let sql = format!("DELETE FROM {table} WHERE user_id = ?1 AND {column} = ?2");
            let removed = tx.execute(&sql, params![user, other.to_string()])? > 0;
            if removed {
                touch_user(&tx, &user)?;
            }
            tx.commit()?;
            Ok(removed)
        })
    }
}

impl UserStore for Database {
    fn insert_user(&self, user: &NewUser) -> Result<(), StoreError> {
        store(self.with_conn(|conn| {
            let created = format_time(user.created_at);
            conn.execute(
                "INSERT INTO users (id, handle, email, password_hash, profile_photo, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
                params![
                    user.id.to_string(),
                    user.handle,
                    user.email,
                    user.password_hash,
                    DEFAULT_PROFILE_PHOTO,
                    created
                ],
            )
            .map_err(unique_violation)?;
            Ok(())
        }))
    }

    fn user_by_id(&self, id: UserId) -> Result<Option<User>, StoreError> {
        store(self.with_conn(|conn| query_user(conn, "id", &id.to_string())))
    }

    fn user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        store(self.with_conn(|conn| query_user(conn, "email", email)))
    }

    fn list_users(&self) -> Result<Vec<User>, StoreError> {
        store(self.with_conn(|conn| {
            let sql = format!("SELECT {USER_COLUMNS} FROM users ORDER BY created_at, rowid");
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([], UserRow::from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            let mut sets = user_sets(conn, None)?;
            rows.into_iter()
                .map(|row| {
                    let owned = sets.remove(&row.id).unwrap_or_default();
                    row.into_user(owned)
                })
                .collect()
        }))
    }

    fn update_profile(&self, id: UserId, patch: &ProfilePatch) -> Result<bool, StoreError> {
        store(self.with_conn(|conn| {
            let changed = conn
                .execute(
                    "UPDATE users SET
                        handle = COALESCE(?1, handle),
                        email = COALESCE(?2, email),
                        bio = COALESCE(?3, bio),
                        profile_photo = COALESCE(?4, profile_photo),
                        password_hash = COALESCE(?5, password_hash),
                        password_changed_at = CASE WHEN ?5 IS NULL THEN password_changed_at ELSE ?6 END,
                        updated_at = ?7
                     WHERE id = ?8",
                    params![
                        patch.handle,
                        patch.email,
                        patch.bio,
                        patch.profile_photo,
                        patch.password_hash,
                        patch.password_changed_at.map(format_time),
                        format_time(Utc::now()),
                        id.to_string()
                    ],
                )
                .map_err(unique_violation)?;
            Ok(changed > 0)
        }))
    }

    fn set_blocked(&self, id: UserId, blocked: bool) -> Result<bool, StoreError> {
        store(self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE users SET is_blocked = ?1, updated_at = ?2 WHERE id = ?3",
                params![blocked, format_time(Utc::now()), id.to_string()],
            )?;
            Ok(changed > 0)
        }))
    }

    fn mark_verified(&self, id: UserId) -> Result<bool, StoreError> {
        store(self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE users SET is_verified = 1, updated_at = ?1 WHERE id = ?2",
                params![format_time(Utc::now()), id.to_string()],
            )?;
            Ok(changed > 0)
        }))
    }

    fn add_follower(&self, user: UserId, follower: UserId) -> Result<bool, StoreError> {
        store(self.add_edge("user_followers", "follower_id", user, follower))
    }

    fn remove_follower(&self, user: UserId, follower: UserId) -> Result<bool, StoreError> {
        store(self.remove_edge("user_followers", "follower_id", user, follower))
    }

    fn add_following(&self, user: UserId, followee: UserId) -> Result<bool, StoreError> {
        store(self.add_edge("user_following", "followee_id", user, followee))
    }

    fn remove_following(&self, user: UserId, followee: UserId) -> Result<bool, StoreError> {
        store(self.remove_edge("user_following", "followee_id", user, followee))
    }

    fn add_profile_view(&self, user: UserId, viewer: UserId) -> Result<bool, StoreError> {
        store(self.add_edge("profile_views", "viewer_id", user, viewer))
    }

    fn store_token(
        &self,
        user: UserId,
        kind: TokenKind,
        token: &StoredToken,
    ) -> Result<bool, StoreError> {
        let (hash_col, expires_col) = token_columns(kind);
        store(self.with_conn(|conn| {
            let sql = format!(
                "UPDATE users SET {hash_col} = ?1, {expires_col} = ?2, updated_at = ?3 WHERE id = ?4"
            );
            let changed = conn.execute(
                &sql,
                params![
                    token.hash,
                    token.expires_at.timestamp_micros(),
                    format_time(Utc::now()),
                    user.to_string()
                ],
            )?;
            Ok(changed > 0)
        }))
    }

    fn take_token(
        &self,
        kind: TokenKind,
        hash: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<UserId>, StoreError> {
        let (hash_col, expires_col) = token_columns(kind);
        store(self.with_conn(|conn| {
            // Match and clear in one statement so a token cannot be spent twice.
            let sql = format!(
                "UPDATE users SET {hash_col} = NULL, {expires_col} = NULL, updated_at = ?1
                 WHERE {hash_col} = ?2 AND {expires_col} > ?3
                 RETURNING id"
            );
            let id: Option<String> = conn
                .query_row(
                    &sql,
                    params![format_time(Utc::now()), hash, now.timestamp_micros()],
                    |row| row.get(0),
                )
                .optional()?;
            id.as_deref().map(parse_id).transpose()
        }))
    }
}

impl GenericStore for Database {
    fn insert_generic(&self, generic: &NewGeneric) -> Result<(), StoreError> {
        store(self.with_conn(|conn| {
            let created = format_time(generic.created_at);
            conn.execute(
                "INSERT INTO generics (id, title, category, description, handle, author_id, media, blog_type, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9)",
                params![
                    generic.id.to_string(),
                    generic.title,
                    generic.category,
                    generic.description,
                    generic.handle,
                    generic.author_id.to_string(),
                    generic.media,
                    generic.blog_type,
                    created
                ],
            )
            .map_err(unique_violation)?;
            Ok(())
        }))
    }

    fn generic_by_id(&self, id: GenericId) -> Result<Option<Generic>, StoreError> {
        store(self.with_conn(|conn| query_generic(conn, &id.to_string())))
    }

    fn list_generics(&self, filter: &GenericFilter) -> Result<Vec<Generic>, StoreError> {
        store(self.with_conn(|conn| {
            let sql = format!(
                "SELECT {GENERIC_COLUMNS} FROM generics
                 WHERE (?1 IS NULL OR category = ?1) AND (?2 IS NULL OR handle = ?2)
                 ORDER BY created_at DESC, rowid DESC"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(params![filter.category, filter.handle], GenericRow::from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            let mut reactions = reaction_sets(conn, None)?;
            rows.into_iter()
                .map(|row| {
                    let owned = reactions.remove(&row.id).unwrap_or_default();
                    row.into_generic(owned)
                })
                .collect()
        }))
    }

    fn update_generic(&self, id: GenericId, patch: &GenericPatch) -> Result<bool, StoreError> {
        store(self.with_conn(|conn| {
            let changed = conn
                .execute(
                    "UPDATE generics SET
                        title = COALESCE(?1, title),
                        category = COALESCE(?2, category),
                        description = COALESCE(?3, description),
                        media = COALESCE(?4, media),
                        blog_type = COALESCE(?5, blog_type),
                        updated_at = ?6
                     WHERE id = ?7",
                    params![
                        patch.title,
                        patch.category,
                        patch.description,
                        patch.media,
                        patch.blog_type,
                        format_time(Utc::now()),
                        id.to_string()
                    ],
                )
                .map_err(unique_violation)?;
            Ok(changed > 0)
        }))
    }

    fn delete_generic(&self, id: GenericId) -> Result<bool, StoreError> {
        store(self.with_conn(|conn| {
            let changed = conn.execute("DELETE FROM generics WHERE id = ?1", [id.to_string()])?;
            Ok(changed > 0)
        }))
    }

    fn increment_views(&self, id: GenericId) -> Result<bool, StoreError> {
        store(self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE generics SET num_views = num_views + 1 WHERE id = ?1",
                [id.to_string()],
            )?;
            Ok(changed > 0)
        }))
    }

    fn apply_reaction(
        &self,
        id: GenericId,
        actor: &str,
        update: ReactionUpdate,
    ) -> Result<bool, StoreError> {
        store(self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            let id = id.to_string();

            let found = tx.execute(
                "UPDATE generics SET updated_at = ?1 WHERE id = ?2",
                params![format_time(Utc::now()), id],
            )? > 0;
            if !found {
                return Ok(false);
            }

            match update {
                ReactionUpdate::Withdraw(reaction) => tx.execute(
                    "DELETE FROM generic_reactions
                     WHERE generic_id = ?1 AND actor = ?2 AND reaction = ?3",
                    params![id, actor, reaction_name(reaction)],
                )?,
                // The (generic_id, actor) key makes the switch a single upsert.
                ReactionUpdate::Cast(reaction) => tx.execute(
                    "INSERT INTO generic_reactions (generic_id, actor, reaction) VALUES (?1, ?2, ?3)
                     ON CONFLICT (generic_id, actor) DO UPDATE SET reaction = excluded.reaction",
                    params![id, actor, reaction_name(reaction)],
                )?,
            };

            tx.commit()?;
            Ok(true)
        }))
    }
}

fn query_user(conn: &Connection, column: &str, value: &str) -> Result<Option<User>> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE {column} = ?1");
    let Some(row) = conn.query_row(&sql, [value], UserRow::from_row).optional()? else {
        return Ok(None);
    };

    let sets = user_sets(conn, Some(&row.id))?
        .remove(&row.id)
        .unwrap_or_default();
    Ok(Some(row.into_user(sets)?))
}

fn query_generic(conn: &Connection, id: &str) -> Result<Option<Generic>> {
    let sql = format!("SELECT {GENERIC_COLUMNS} FROM generics WHERE id = ?1");
    let Some(row) = conn.query_row(&sql, [id], GenericRow::from_row).optional()? else {
        return Ok(None);
    };

    let reactions = reaction_sets(conn, Some(id))?
        .remove(id)
        .unwrap_or_default();
    Ok(Some(row.into_generic(reactions)?))
}

/// Set fields keyed by owning user id. `None` loads every user's sets.
fn user_sets(conn: &Connection, user: Option<&str>) -> Result<HashMap<String, UserSets>> {
    let mut sets: HashMap<String, UserSets> = HashMap::new();

    for (owner, id) in query_edges(conn, "user_followers", "follower_id", user)? {
        sets.entry(owner).or_default().followers.insert(id);
    }
    for (owner, id) in query_edges(conn, "user_following", "followee_id", user)? {
        sets.entry(owner).or_default().following.insert(id);
    }
    for (owner, id) in query_edges(conn, "profile_views", "viewer_id", user)? {
        sets.entry(owner).or_default().viewed_by.insert(id);
    }

    Ok(sets)
}

fn query_edges(
    conn: &Connection,
    table: &str,
    column: &str,
    user: Option<&str>,
) -> Result<Vec<(String, UserId)>> {
    let sql = format!("SELECT user_id, {column} FROM {table} WHERE ?1 IS NULL OR user_id = ?1");
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([user], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    rows.into_iter()
        .map(|(owner, other)| Ok((owner, parse_id(&other)?)))
        .collect()
}

/// Likes and dislikes keyed by generic id. `None` loads every generic's.
fn reaction_sets(conn: &Connection, generic: Option<&str>) -> Result<HashMap<String, ReactionSets>> {
    let mut stmt = conn.prepare(
        "SELECT generic_id, actor, reaction FROM generic_reactions
         WHERE ?1 IS NULL OR generic_id = ?1",
    )?;
    let rows = stmt
        .query_map([generic], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
            ))
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let mut sets: HashMap<String, ReactionSets> = HashMap::new();
    for (generic_id, actor, reaction) in rows {
        sets.entry(generic_id).or_default().insert(&reaction, actor);
    }
    Ok(sets)
}

fn user_exists(conn: &Connection, id: &str) -> Result<bool> {
    let found = conn
        .query_row("SELECT 1 FROM users WHERE id = ?1", [id], |_| Ok(()))
        .optional()?;
    Ok(found.is_some())
}

fn touch_user(conn: &Connection, id: &str) -> Result<()> {
    conn.execute(
        "UPDATE users SET updated_at = ?1 WHERE id = ?2",
        params![format_time(Utc::now()), id],
    )?;
    Ok(())
}

fn token_columns(kind: TokenKind) -> (&'static str, &'static str) {
    match kind {
        TokenKind::Verification => ("verification_token_hash", "verification_token_expires"),
        TokenKind::Reset => ("reset_token_hash", "reset_token_expires"),
    }
}

/// Turn a UNIQUE constraint failure into the matching `StoreError::Duplicate`.
fn unique_violation(err: rusqlite::Error) -> anyhow::Error {
    if let rusqlite::Error::SqliteFailure(failure, Some(message)) = &err {
        if failure.code == ErrorCode::ConstraintViolation {
            let field = if message.contains("users.handle") {
                Some(UniqueField::Handle)
            } else if message.contains("users.email") {
                Some(UniqueField::Email)
            } else if message.contains("generics.title") {
                Some(UniqueField::Title)
            } else {
                None
            };
            if let Some(field) = field {
                return StoreError::Duplicate(field).into();
            }
        }
    }
    err.into()
}

/// Recover a `StoreError` raised inside a connection closure.
fn store<T>(result: Result<T>) -> std::result::Result<T, StoreError> {
    result.map_err(|e| match e.downcast::<StoreError>() {
        Ok(err) => err,
        Err(e) => StoreError::Backend(e),
    })
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
