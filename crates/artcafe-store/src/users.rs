//! CRUD operations for [`User`] records.

use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use crate::database::Database;
use crate::error::{conflict_on_unique, Result, StoreError};
use crate::models::{NewUser, User, UserSummary};
use crate::rows::{fmt_ts, now, ts_at, uuid_at};

const USER_COLUMNS: &str =
    "id, username, email, password_hash, full_name, bio, profile_picture, created_at";

impl Database {
    // ------------------------------------------------------------------
    // Create
    // ------------------------------------------------------------------

    /// Register a new account. Fails with [`StoreError::Conflict`] when the
    /// username or e-mail is already taken.
    pub fn create_user(&self, new: &NewUser) -> Result<User> {
        let user = User {
            id: Uuid::new_v4(),
            username: new.username.clone(),
            email: new.email.clone(),
            password_hash: new.password_hash.clone(),
            full_name: new.full_name.clone(),
            bio: None,
            profile_picture: None,
            created_at: now(),
        };

        self.conn()
            .execute(
                "INSERT INTO users (id, username, email, password_hash, full_name, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    user.id.to_string(),
                    user.username,
                    user.email,
                    user.password_hash,
                    user.full_name,
                    fmt_ts(&user.created_at),
                ],
            )
            .map_err(|e| conflict_on_unique(e, "User"))?;

        tracing::debug!(user = %user.id, username = %user.username, "user created");
        Ok(user)
    }

    // ------------------------------------------------------------------
    // Read
    // ------------------------------------------------------------------

    pub fn get_user(&self, id: Uuid) -> Result<User> {
        fetch_user(self.conn(), id)?.ok_or(StoreError::NotFound("User"))
    }

    pub fn find_user_by_username(&self, username: &str) -> Result<Option<User>> {
        Ok(self
            .conn()
            .query_row(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE username = ?1"),
                params![username],
                row_to_user,
            )
            .optional()?)
    }

    /// Look a user up by either username or e-mail, username first.
    pub fn find_user_by_login(&self, username_or_email: &str) -> Result<Option<User>> {
        Ok(self
            .conn()
            .query_row(
                &format!(
                    "SELECT {USER_COLUMNS} FROM users
                     WHERE username = ?1 OR email = ?1
                     ORDER BY username = ?1 DESC
                     LIMIT 1"
                ),
                params![username_or_email],
                row_to_user,
            )
            .optional()?)
    }

    pub fn username_exists(&self, username: &str) -> Result<bool> {
        Ok(self.conn().query_row(
            "SELECT EXISTS(SELECT 1 FROM users WHERE username = ?1)",
            params![username],
            |row| row.get(0),
        )?)
    }

    pub fn email_exists(&self, email: &str) -> Result<bool> {
        Ok(self.conn().query_row(
            "SELECT EXISTS(SELECT 1 FROM users WHERE email = ?1)",
            params![email],
            |row| row.get(0),
        )?)
    }

    // ------------------------------------------------------------------
    // Update
    // ------------------------------------------------------------------

    /// Update the editable profile fields. `None` leaves a field unchanged.
    pub fn update_user_profile(
        &self,
        id: Uuid,
        full_name: Option<&str>,
        bio: Option<&str>,
    ) -> Result<User> {
        let affected = self.conn().execute(
            "UPDATE users SET full_name = COALESCE(?2, full_name), bio = COALESCE(?3, bio)
             WHERE id = ?1",
            params![id.to_string(), full_name, bio],
        )?;
        if affected == 0 {
            return Err(StoreError::NotFound("User"));
        }
        self.get_user(id)
    }

    pub fn set_profile_picture(&self, id: Uuid, picture: Option<&str>) -> Result<()> {
        let affected = self.conn().execute(
            "UPDATE users SET profile_picture = ?2 WHERE id = ?1",
            params![id.to_string(), picture],
        )?;
        if affected == 0 {
            return Err(StoreError::NotFound("User"));
        }
        Ok(())
    }

    pub fn set_password(&self, id: Uuid, password_hash: &str) -> Result<()> {
        let affected = self.conn().execute(
            "UPDATE users SET password_hash = ?2 WHERE id = ?1",
            params![id.to_string(), password_hash],
        )?;
        if affected == 0 {
            return Err(StoreError::NotFound("User"));
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Delete
    // ------------------------------------------------------------------

    /// Delete an account and everything it owns.
    ///
    /// Likes and comments the user left on *other* users' posts disappear by
    /// cascade, so those posts' counters are decremented first, in the same
    /// transaction.
    pub fn delete_user(&mut self, id: Uuid) -> Result<bool> {
        let id = id.to_string();
        let tx = self.write_tx()?;

        tx.execute(
            "UPDATE posts SET like_count = MAX(like_count - (
                 SELECT COUNT(*) FROM likes l WHERE l.post_id = posts.id AND l.user_id = ?1
             ), 0)
             WHERE id IN (SELECT post_id FROM likes WHERE user_id = ?1)",
            params![id],
        )?;
        tx.execute(
            "UPDATE posts SET comment_count = MAX(comment_count - (
                 SELECT COUNT(*) FROM comments c WHERE c.post_id = posts.id AND c.user_id = ?1
             ), 0)
             WHERE id IN (SELECT post_id FROM comments WHERE user_id = ?1)",
            params![id],
        )?;
        let affected = tx.execute("DELETE FROM users WHERE id = ?1", params![id])?;

        tx.commit()?;

        if affected > 0 {
            tracing::info!(user = %id, "user deleted");
        }
        Ok(affected > 0)
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

pub(crate) fn fetch_user(conn: &Connection, id: Uuid) -> Result<Option<User>> {
    Ok(conn
        .query_row(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
            params![id.to_string()],
            row_to_user,
        )
        .optional()?)
}

pub(crate) fn row_to_user(row: &rusqlite::Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: uuid_at(row, 0)?,
        username: row.get(1)?,
        email: row.get(2)?,
        password_hash: row.get(3)?,
        full_name: row.get(4)?,
        bio: row.get(5)?,
        profile_picture: row.get(6)?,
        created_at: ts_at(row, 7)?,
    })
}

/// Columns read by [`summary_at`], for a `users` table aliased as `alias`.
pub(crate) fn summary_columns(alias: &str) -> String {
    format!("{alias}.id, {alias}.username, {alias}.full_name, {alias}.profile_picture")
}

/// Read a [`UserSummary`] starting at column `start`.
pub(crate) fn summary_at(row: &rusqlite::Row<'_>, start: usize) -> rusqlite::Result<UserSummary> {
    Ok(UserSummary {
        id: uuid_at(row, start)?,
        username: row.get(start + 1)?,
        full_name: row.get(start + 2)?,
        profile_picture: row.get(start + 3)?,
    })
}
