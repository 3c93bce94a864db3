//! Comments and the post `comment_count` they drive.

use artcafe_shared::{notify, NotificationKind};
use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::models::{Comment, CommentView, NotificationDraft, Page, PageRequest};
use crate::notifications::insert_unless_recent;
use crate::posts::{adjust_counter, fetch_post, Counter};
use crate::rows::{fmt_ts, now, opt_ts_at, ts_at, uuid_at};
use crate::users::{fetch_user, summary_at, summary_columns};

const COMMENT_COLUMNS: &str = "c.id, c.post_id, c.user_id, c.content, c.created_at, c.updated_at";

impl Database {
    /// Add a comment and bump the post's counter in one transaction. The
    /// post owner is notified unless they wrote the comment themselves.
    pub fn create_comment(&mut self, post_id: Uuid, user_id: Uuid, content: &str) -> Result<Comment> {
        let at = now();
        let tx = self.write_tx()?;

        let author = fetch_user(&tx, user_id)?.ok_or(StoreError::NotFound("User"))?;
        let post = fetch_post(&tx, post_id)?.ok_or(StoreError::NotFound("Post"))?;

        let comment = Comment {
            id: Uuid::new_v4(),
            post_id,
            user_id,
            content: content.to_string(),
            created_at: at,
            updated_at: None,
        };
        tx.execute(
            "INSERT INTO comments (id, post_id, user_id, content, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                comment.id.to_string(),
                post_id.to_string(),
                user_id.to_string(),
                comment.content,
                fmt_ts(&at),
            ],
        )?;
        adjust_counter(&tx, post_id, Counter::Comments, 1)?;

        if post.user_id != user_id {
            let draft = NotificationDraft {
                recipient_id: post.user_id,
                sender_id: user_id,
                kind: NotificationKind::Comment,
                reference_id: post.id,
                content: notify::comment_content(&author.username, &post.title),
                link: notify::post_link(&post.id.to_string()),
            };
            insert_unless_recent(&tx, &draft, at)?;
        }

        tx.commit()?;

        tracing::debug!(comment = %comment.id, post = %post_id, author = %user_id, "comment created");
        Ok(comment)
    }

    pub fn get_comment(&self, id: Uuid) -> Result<Comment> {
        fetch_comment(self.conn(), id)?.ok_or(StoreError::NotFound("Comment"))
    }

    /// Comments on a post with their authors, newest first.
    pub fn list_comments_for_post(&self, post_id: Uuid, page: PageRequest) -> Result<Page<CommentView>> {
        let total: i64 = self.conn().query_row(
            "SELECT COUNT(*) FROM comments WHERE post_id = ?1",
            params![post_id.to_string()],
            |row| row.get(0),
        )?;

        let mut stmt = self.conn().prepare(&format!(
            "SELECT {COMMENT_COLUMNS}, {}
             FROM comments c JOIN users u ON u.id = c.user_id
             WHERE c.post_id = ?1
             ORDER BY c.created_at DESC, c.rowid DESC
             LIMIT ?2 OFFSET ?3",
            summary_columns("u")
        ))?;
        let rows = stmt.query_map(
            params![post_id.to_string(), page.size, page.offset()],
            |row| {
                Ok(CommentView {
                    comment: row_to_comment(row)?,
                    author: summary_at(row, 6)?,
                })
            },
        )?;

        let mut items = Vec::new();
        for row in rows {
            items.push(row?);
        }
        Ok(Page {
            items,
            page: page.page,
            size: page.size,
            total,
        })
    }

    pub fn update_comment_content(&self, id: Uuid, content: &str) -> Result<Comment> {
        let affected = self.conn().execute(
            "UPDATE comments SET content = ?2, updated_at = ?3 WHERE id = ?1",
            params![id.to_string(), content, fmt_ts(&now())],
        )?;
        if affected == 0 {
            return Err(StoreError::NotFound("Comment"));
        }
        self.get_comment(id)
    }

    /// Remove a comment and decrement its post's counter in one transaction.
    pub fn delete_comment(&mut self, id: Uuid) -> Result<bool> {
        let tx = self.write_tx()?;

        let Some(comment) = fetch_comment(&tx, id)? else {
            return Ok(false);
        };
        tx.execute("DELETE FROM comments WHERE id = ?1", params![id.to_string()])?;
        adjust_counter(&tx, comment.post_id, Counter::Comments, -1)?;

        tx.commit()?;

        tracing::debug!(comment = %id, post = %comment.post_id, "comment deleted");
        Ok(true)
    }
}

fn fetch_comment(conn: &Connection, id: Uuid) -> Result<Option<Comment>> {
    Ok(conn
        .query_row(
            &format!("SELECT {COMMENT_COLUMNS} FROM comments c WHERE c.id = ?1"),
            params![id.to_string()],
            row_to_comment,
        )
        .optional()?)
}

fn row_to_comment(row: &rusqlite::Row<'_>) -> rusqlite::Result<Comment> {
    Ok(Comment {
        id: uuid_at(row, 0)?,
        post_id: uuid_at(row, 1)?,
        user_id: uuid_at(row, 2)?,
        content: row.get(3)?,
        created_at: ts_at(row, 4)?,
        updated_at: opt_ts_at(row, 5)?,
    })
}
