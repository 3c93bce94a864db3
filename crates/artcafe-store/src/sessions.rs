//! Bearer sessions.

use chrono::{DateTime, Duration, Utc};
use rusqlite::{params, OptionalExtension};
use uuid::Uuid;

use crate::database::Database;
use crate::error::Result;
use crate::models::{Session, User};
use crate::rows::{fmt_ts, now};
use crate::users::row_to_user;

impl Database {
    /// Persist a session for `token_digest`, valid for `ttl`.
    pub fn create_session(&self, token_digest: &str, user_id: Uuid, ttl: Duration) -> Result<Session> {
        let created_at = now();
        let session = Session {
            token_digest: token_digest.to_string(),
            user_id,
            created_at,
            expires_at: created_at + ttl,
        };

        self.conn().execute(
            "INSERT INTO sessions (token_digest, user_id, created_at, expires_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                session.token_digest,
                session.user_id.to_string(),
                fmt_ts(&session.created_at),
                fmt_ts(&session.expires_at),
            ],
        )?;
        Ok(session)
    }

    /// Resolve a token digest to its user, ignoring sessions that expired
    /// before `at`.
    pub fn find_session_user(&self, token_digest: &str, at: DateTime<Utc>) -> Result<Option<User>> {
        Ok(self
            .conn()
            .query_row(
                "SELECT u.id, u.username, u.email, u.password_hash,
                        u.full_name, u.bio, u.profile_picture, u.created_at
                 FROM sessions s JOIN users u ON u.id = s.user_id
                 WHERE s.token_digest = ?1 AND s.expires_at > ?2",
                params![token_digest, fmt_ts(&at)],
                row_to_user,
            )
            .optional()?)
    }

    pub fn delete_session(&self, token_digest: &str) -> Result<bool> {
        let affected = self.conn().execute(
            "DELETE FROM sessions WHERE token_digest = ?1",
            params![token_digest],
        )?;
        Ok(affected > 0)
    }

    /// Drop every session that expired before `at`. Returns how many went.
    pub fn purge_expired_sessions(&self, at: DateTime<Utc>) -> Result<usize> {
        Ok(self.conn().execute(
            "DELETE FROM sessions WHERE expires_at <= ?1",
            params![fmt_ts(&at)],
        )?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{db, user};

    #[test]
    fn session_resolves_until_expiry() {
        let db = db();
        let alice = user(&db, "alice");
        let session = db.create_session("digest-1", alice.id, Duration::hours(1)).unwrap();

        let found = db.find_session_user("digest-1", Utc::now()).unwrap();
        assert_eq!(found.map(|u| u.id), Some(alice.id));

        let later = session.expires_at + Duration::seconds(1);
        assert!(db.find_session_user("digest-1", later).unwrap().is_none());
        assert!(db.find_session_user("unknown", Utc::now()).unwrap().is_none());
    }

    #[test]
    fn purge_and_delete() {
        let db = db();
        let alice = user(&db, "alice");
        db.create_session("old", alice.id, Duration::seconds(-10)).unwrap();
        db.create_session("fresh", alice.id, Duration::hours(1)).unwrap();

        assert_eq!(db.purge_expired_sessions(Utc::now()).unwrap(), 1);
        assert!(db.delete_session("fresh").unwrap());
        assert!(!db.delete_session("fresh").unwrap());
    }
}
