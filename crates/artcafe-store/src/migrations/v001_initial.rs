//! v001 -- Initial schema creation.
//!
//! Creates the social core: `users`, `sessions`, `posts`, `comments` and
//! `likes`.

use rusqlite::Connection;

/// SQL executed when upgrading from version 0 to version 1.
const UP_SQL: &str = r#"
-- ----------------------------------------------------------------
-- Users
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS users (
    id              TEXT PRIMARY KEY NOT NULL,   -- UUID v4
    username        TEXT NOT NULL UNIQUE,
    email           TEXT NOT NULL UNIQUE,
    password_hash   TEXT NOT NULL,               -- Argon2id PHC string
    full_name       TEXT,
    bio             TEXT,
    profile_picture TEXT,                        -- public /images/profile/... path
    created_at      TEXT NOT NULL                -- RFC-3339 UTC, microseconds
);

-- ----------------------------------------------------------------
-- Sessions (bearer tokens, stored as digests only)
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS sessions (
    token_digest TEXT PRIMARY KEY NOT NULL,
    user_id      TEXT NOT NULL,
    created_at   TEXT NOT NULL,
    expires_at   TEXT NOT NULL,

    FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_sessions_expires ON sessions(expires_at);

-- ----------------------------------------------------------------
-- Posts
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS posts (
    id            TEXT PRIMARY KEY NOT NULL,     -- UUID v4
    user_id       TEXT NOT NULL,                 -- FK -> users(id)
    title         TEXT NOT NULL,
    content       TEXT NOT NULL,
    image_url     TEXT,
    image_name    TEXT,
    image_stored  INTEGER NOT NULL DEFAULT 0,    -- 1 when image_url names a file we wrote
    comment_count INTEGER NOT NULL DEFAULT 0 CHECK (comment_count >= 0),
    like_count    INTEGER NOT NULL DEFAULT 0 CHECK (like_count >= 0),
    created_at    TEXT NOT NULL,
    updated_at    TEXT,

    FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_posts_created ON posts(created_at DESC);
CREATE INDEX IF NOT EXISTS idx_posts_user_created ON posts(user_id, created_at DESC);

-- ----------------------------------------------------------------
-- Comments
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS comments (
    id         TEXT PRIMARY KEY NOT NULL,        -- UUID v4
    post_id    TEXT NOT NULL,                    -- FK -> posts(id)
    user_id    TEXT NOT NULL,                    -- FK -> users(id)
    content    TEXT NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT,

    FOREIGN KEY (post_id) REFERENCES posts(id) ON DELETE CASCADE,
    FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_comments_post_created
    ON comments(post_id, created_at DESC);

-- ----------------------------------------------------------------
-- Likes
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS likes (
    id         TEXT PRIMARY KEY NOT NULL,        -- UUID v4
    post_id    TEXT NOT NULL,                    -- FK -> posts(id)
    user_id    TEXT NOT NULL,                    -- FK -> users(id)
    created_at TEXT NOT NULL,

    FOREIGN KEY (post_id) REFERENCES posts(id) ON DELETE CASCADE,
    FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
);

CREATE UNIQUE INDEX IF NOT EXISTS idx_likes_post_user ON likes(post_id, user_id);
CREATE INDEX IF NOT EXISTS idx_likes_user ON likes(user_id);
"#;

/// Apply the initial migration.
pub fn up(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(UP_SQL)
}
