use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);")?;

    let version: i64 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |r| r.get(0),
    )?;

    if version < 1 {
        info!("Running migration v1 (initial schema)");
        conn.execute_batch(
            "
            CREATE TABLE users (
                id                          TEXT PRIMARY KEY,
                handle                      TEXT NOT NULL UNIQUE,
                email                       TEXT NOT NULL UNIQUE,
                password_hash               TEXT NOT NULL,
                bio                         TEXT,
                profile_photo               TEXT NOT NULL,
                is_blocked                  INTEGER NOT NULL DEFAULT 0,
                is_admin                    INTEGER NOT NULL DEFAULT 0,
                is_verified                 INTEGER NOT NULL DEFAULT 0,
                verification_token_hash     TEXT,
                verification_token_expires  INTEGER,
                reset_token_hash            TEXT,
                reset_token_expires         INTEGER,
                password_changed_at         TEXT,
                created_at                  TEXT NOT NULL,
                updated_at                  TEXT NOT NULL
            );

            CREATE INDEX idx_users_verification_token ON users(verification_token_hash);
            CREATE INDEX idx_users_reset_token ON users(reset_token_hash);

            -- Each user's followers, following and viewedBy sets. Rows belong
            -- to the document named by user_id.
            CREATE TABLE user_followers (
                user_id     TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                follower_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                PRIMARY KEY (user_id, follower_id)
            );

            CREATE TABLE user_following (
                user_id     TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                followee_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                PRIMARY KEY (user_id, followee_id)
            );

            CREATE TABLE profile_views (
                user_id     TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                viewer_id   TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                PRIMARY KEY (user_id, viewer_id)
            );

            CREATE TABLE generics (
                id          TEXT PRIMARY KEY,
                title       TEXT NOT NULL UNIQUE,
                category    TEXT NOT NULL,
                description TEXT NOT NULL,
                handle      TEXT NOT NULL,
                author_id   TEXT NOT NULL REFERENCES users(id),
                media       TEXT NOT NULL,
                blog_type   TEXT NOT NULL,
                num_views   INTEGER NOT NULL DEFAULT 0,
                created_at  TEXT NOT NULL,
                updated_at  TEXT NOT NULL
            );

            CREATE INDEX idx_generics_created ON generics(created_at);
            CREATE INDEX idx_generics_category ON generics(category);
            CREATE INDEX idx_generics_handle ON generics(handle);

            -- One row per (generic, actor): an actor cannot sit in both the
            -- likes and dislikes set.
            CREATE TABLE generic_reactions (
                generic_id  TEXT NOT NULL REFERENCES generics(id) ON DELETE CASCADE,
                actor       TEXT NOT NULL,
                reaction    TEXT NOT NULL CHECK (reaction IN ('like', 'dislike')),
                PRIMARY KEY (generic_id, actor)
            );

            INSERT INTO schema_version (version) VALUES (1);
            ",
        )?;
    }

    info!("Database migrations complete");
    Ok(())
}
