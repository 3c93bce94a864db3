//! Like toggling.
//!
//! A toggle is one write transaction: the like row, the post's `like_count`
//! and the optional `LIKE` notification either all land or none do.

use artcafe_shared::{notify, NotificationKind};
use rusqlite::{params, OptionalExtension};
use uuid::Uuid;

use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::models::{Like, LikeToggle, NotificationDraft};
use crate::notifications::insert_unless_recent;
use crate::posts::{adjust_counter, fetch_post, Counter};
use crate::rows::{fmt_ts, now, ts_at, uuid_at};
use crate::users::fetch_user;

impl Database {
    /// Like the post if `user_id` has not liked it yet, otherwise unlike it.
    ///
    /// Liking someone else's post notifies the owner, subject to the
    /// notification dedup window.
    pub fn toggle_like(&mut self, post_id: Uuid, user_id: Uuid) -> Result<LikeToggle> {
        let at = now();
        let tx = self.write_tx()?;

        let sender = fetch_user(&tx, user_id)?.ok_or(StoreError::NotFound("User"))?;
        let post = fetch_post(&tx, post_id)?.ok_or(StoreError::NotFound("Post"))?;

        let removed = tx.execute(
            "DELETE FROM likes WHERE post_id = ?1 AND user_id = ?2",
            params![post_id.to_string(), user_id.to_string()],
        )?;

        let toggle = if removed > 0 {
            let like_count = adjust_counter(&tx, post_id, Counter::Likes, -1)?;
            LikeToggle {
                liked: false,
                like_count,
                notification: None,
            }
        } else {
            tx.execute(
                "INSERT INTO likes (id, post_id, user_id, created_at) VALUES (?1, ?2, ?3, ?4)",
                params![
                    Uuid::new_v4().to_string(),
                    post_id.to_string(),
                    user_id.to_string(),
                    fmt_ts(&at),
                ],
            )?;
            let like_count = adjust_counter(&tx, post_id, Counter::Likes, 1)?;

            let notification = if post.user_id != user_id {
                let draft = NotificationDraft {
                    recipient_id: post.user_id,
                    sender_id: user_id,
                    kind: NotificationKind::Like,
                    reference_id: post.id,
                    content: notify::like_content(&sender.username, &post.title),
                    link: notify::post_link(&post.id.to_string()),
                };
                insert_unless_recent(&tx, &draft, at)?
            } else {
                None
            };

            LikeToggle {
                liked: true,
                like_count,
                notification,
            }
        };

        tx.commit()?;

        tracing::debug!(
            post = %post_id,
            user = %user_id,
            liked = toggle.liked,
            like_count = toggle.like_count,
            "like toggled"
        );
        Ok(toggle)
    }

    pub fn find_like(&self, post_id: Uuid, user_id: Uuid) -> Result<Option<Like>> {
        Ok(self
            .conn()
            .query_row(
                "SELECT id, post_id, user_id, created_at FROM likes
                 WHERE post_id = ?1 AND user_id = ?2",
                params![post_id.to_string(), user_id.to_string()],
                |row| {
                    Ok(Like {
                        id: uuid_at(row, 0)?,
                        post_id: uuid_at(row, 1)?,
                        user_id: uuid_at(row, 2)?,
                        created_at: ts_at(row, 3)?,
                    })
                },
            )
            .optional()?)
    }
}
