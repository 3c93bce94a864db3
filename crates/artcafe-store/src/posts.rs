//! CRUD operations for [`Post`] records and their denormalized counters.

use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::models::{NewPost, Page, PageRequest, Post, PostView};
use crate::rows::{fmt_ts, now, opt_ts_at, ts_at, uuid_at};
use crate::users::{summary_at, summary_columns};

const POST_COLUMNS: &str = "p.id, p.user_id, p.title, p.content, p.image_url, p.image_name, \
                            p.comment_count, p.like_count, p.created_at, p.updated_at, \
                            p.image_stored";

/// A denormalized counter column on `posts`.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Counter {
    Likes,
    Comments,
}

impl Counter {
    fn column(self) -> &'static str {
        match self {
            Counter::Likes => "like_count",
            Counter::Comments => "comment_count",
        }
    }
}

impl Database {
    // ------------------------------------------------------------------
    // Create
    // ------------------------------------------------------------------

    pub fn create_post(&self, new: &NewPost) -> Result<Post> {
        let post = Post {
            id: Uuid::new_v4(),
            user_id: new.user_id,
            title: new.title.clone(),
            content: new.content.clone(),
            image_url: new.image_url.clone(),
            image_name: new.image_name.clone(),
            image_stored: new.image_stored && new.image_url.is_some(),
            comment_count: 0,
            like_count: 0,
            created_at: now(),
            updated_at: None,
        };

        self.conn().execute(
            "INSERT INTO posts (id, user_id, title, content, image_url, image_name, image_stored, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                post.id.to_string(),
                post.user_id.to_string(),
                post.title,
                post.content,
                post.image_url,
                post.image_name,
                post.image_stored,
                fmt_ts(&post.created_at),
            ],
        )?;

        tracing::debug!(post = %post.id, owner = %post.user_id, "post created");
        Ok(post)
    }

    // ------------------------------------------------------------------
    // Read
    // ------------------------------------------------------------------

    pub fn get_post(&self, id: Uuid) -> Result<Post> {
        fetch_post(self.conn(), id)?.ok_or(StoreError::NotFound("Post"))
    }

    /// Fetch one post with its author and whether `viewer` liked it.
    pub fn get_post_view(&self, id: Uuid, viewer: Uuid) -> Result<PostView> {
        self.conn()
            .query_row(
                &format!(
                    "SELECT {POST_COLUMNS}, {}, {}
                     FROM posts p JOIN users u ON u.id = p.user_id
                     WHERE p.id = ?1",
                    summary_columns("u"),
                    liked_by_viewer("?2")
                ),
                params![id.to_string(), viewer.to_string()],
                row_to_post_view,
            )
            .optional()?
            .ok_or(StoreError::NotFound("Post"))
    }

    /// All posts, newest first.
    pub fn list_feed(&self, viewer: Uuid, page: PageRequest) -> Result<Page<PostView>> {
        let total: i64 = self
            .conn()
            .query_row("SELECT COUNT(*) FROM posts", [], |row| row.get(0))?;

        let mut stmt = self.conn().prepare(&format!(
            "SELECT {POST_COLUMNS}, {}, {}
             FROM posts p JOIN users u ON u.id = p.user_id
             ORDER BY p.created_at DESC, p.rowid DESC
             LIMIT ?2 OFFSET ?3",
            summary_columns("u"),
            liked_by_viewer("?1")
        ))?;
        let rows = stmt.query_map(
            params![viewer.to_string(), page.size, page.offset()],
            row_to_post_view,
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

    /// Posts owned by `author`, newest first.
    pub fn list_posts_by_user(
        &self,
        author: Uuid,
        viewer: Uuid,
        page: PageRequest,
    ) -> Result<Page<PostView>> {
        let total: i64 = self.conn().query_row(
            "SELECT COUNT(*) FROM posts WHERE user_id = ?1",
            params![author.to_string()],
            |row| row.get(0),
        )?;

        let mut stmt = self.conn().prepare(&format!(
            "SELECT {POST_COLUMNS}, {}, {}
             FROM posts p JOIN users u ON u.id = p.user_id
             WHERE p.user_id = ?1
             ORDER BY p.created_at DESC, p.rowid DESC
             LIMIT ?3 OFFSET ?4",
            summary_columns("u"),
            liked_by_viewer("?2")
        ))?;
        let rows = stmt.query_map(
            params![author.to_string(), viewer.to_string(), page.size, page.offset()],
            row_to_post_view,
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

    pub fn count_likes_for_post(&self, post_id: Uuid) -> Result<i64> {
        Ok(self.conn().query_row(
            "SELECT COUNT(*) FROM likes WHERE post_id = ?1",
            params![post_id.to_string()],
            |row| row.get(0),
        )?)
    }

    pub fn count_comments_for_post(&self, post_id: Uuid) -> Result<i64> {
        Ok(self.conn().query_row(
            "SELECT COUNT(*) FROM comments WHERE post_id = ?1",
            params![post_id.to_string()],
            |row| row.get(0),
        )?)
    }

    /// Image paths of every post `user_id` owns, so their files can be
    /// removed alongside the account.
    /// Image files written for `user_id`'s posts. Externally supplied URLs
    /// are never included.
    pub fn stored_image_urls_owned_by(&self, user_id: Uuid) -> Result<Vec<String>> {
        let mut stmt = self.conn().prepare(
            "SELECT image_url FROM posts
             WHERE user_id = ?1 AND image_stored = 1 AND image_url IS NOT NULL",
        )?;
        let rows = stmt.query_map(params![user_id.to_string()], |row| row.get(0))?;

        let mut urls = Vec::new();
        for row in rows {
            urls.push(row?);
        }
        Ok(urls)
    }

    // ------------------------------------------------------------------
    // Update
    // ------------------------------------------------------------------

    /// Replace title and content. Image fields are never touched here.
    pub fn update_post_text(&self, id: Uuid, title: &str, content: &str) -> Result<Post> {
        let affected = self.conn().execute(
            "UPDATE posts SET title = ?2, content = ?3, updated_at = ?4 WHERE id = ?1",
            params![id.to_string(), title, content, fmt_ts(&now())],
        )?;
        if affected == 0 {
            return Err(StoreError::NotFound("Post"));
        }
        self.get_post(id)
    }

    // ------------------------------------------------------------------
    // Delete
    // ------------------------------------------------------------------

    /// Delete a post. Its comments and likes go with it.
    pub fn delete_post(&self, id: Uuid) -> Result<bool> {
        let affected = self
            .conn()
            .execute("DELETE FROM posts WHERE id = ?1", params![id.to_string()])?;
        Ok(affected > 0)
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Boolean column: has the user bound at `viewer_param` liked post `p`?
fn liked_by_viewer(viewer_param: &str) -> String {
    format!("EXISTS(SELECT 1 FROM likes l WHERE l.post_id = p.id AND l.user_id = {viewer_param})")
}

pub(crate) fn fetch_post(conn: &Connection, id: Uuid) -> Result<Option<Post>> {
    Ok(conn
        .query_row(
            &format!("SELECT {POST_COLUMNS} FROM posts p WHERE p.id = ?1"),
            params![id.to_string()],
            row_to_post,
        )
        .optional()?)
}

/// Add `delta` to a post counter, never going below zero. Returns the new
/// value.
pub(crate) fn adjust_counter(
    conn: &Connection,
    post_id: Uuid,
    counter: Counter,
    delta: i64,
) -> Result<i64> {
    let column = counter.column();
    conn.execute(
        &format!("UPDATE posts SET {column} = MAX({column} + ?2, 0) WHERE id = ?1"),
        params![post_id.to_string(), delta],
    )?;
    Ok(conn.query_row(
        &format!("SELECT {column} FROM posts WHERE id = ?1"),
        params![post_id.to_string()],
        |row| row.get(0),
    )?)
}

fn row_to_post(row: &rusqlite::Row<'_>) -> rusqlite::Result<Post> {
    Ok(Post {
        id: uuid_at(row, 0)?,
        user_id: uuid_at(row, 1)?,
        title: row.get(2)?,
        content: row.get(3)?,
        image_url: row.get(4)?,
        image_name: row.get(5)?,
        comment_count: row.get(6)?,
        like_count: row.get(7)?,
        created_at: ts_at(row, 8)?,
        updated_at: opt_ts_at(row, 9)?,
        image_stored: row.get(10)?,
    })
}

fn row_to_post_view(row: &rusqlite::Row<'_>) -> rusqlite::Result<PostView> {
    Ok(PostView {
        post: row_to_post(row)?,
        author: summary_at(row, 11)?,
        liked_by_viewer: row.get(15)?,
    })
}
