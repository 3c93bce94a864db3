//! Domain model structs persisted in the SQLite database.
//!
//! Every struct derives `Serialize` so the server can project it into its
//! response DTOs without an intermediate copy.

use artcafe_shared::constants::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
use artcafe_shared::NotificationKind;
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// User
// ---------------------------------------------------------------------------

/// A registered account.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct User {
    pub id: Uuid,
    /// Unique login name.
    pub username: String,
    /// Unique e-mail address.
    pub email: String,
    /// Argon2id PHC string. Never serialized.
    #[serde(skip)]
    pub password_hash: String,
    pub full_name: Option<String>,
    pub bio: Option<String>,
    /// Public `/images/profile/...` path of the avatar, if any.
    pub profile_picture: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Input for [`Database::create_user`](crate::Database::create_user).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub full_name: Option<String>,
}

/// The public projection of a user embedded in posts, comments and
/// notifications.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct UserSummary {
    pub id: Uuid,
    pub username: String,
    pub full_name: Option<String>,
    pub profile_picture: Option<String>,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            full_name: user.full_name.clone(),
            profile_picture: user.profile_picture.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// A bearer session. Only the token digest is stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub token_digest: String,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Post
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Post {
    pub id: Uuid,
    /// Owner of the post.
    pub user_id: Uuid,
    pub title: String,
    pub content: String,
    /// Public `/images/posts/...` path.
    pub image_url: Option<String>,
    /// Original file name of the uploaded image.
    pub image_name: Option<String>,
    /// True when `image_url` points at a file this post uploaded. Only such
    /// files are removed when the post or its owner goes away.
    #[serde(skip)]
    pub image_stored: bool,
    /// Number of comments referencing this post. Maintained in the same
    /// transaction as every comment insert/delete.
    pub comment_count: i64,
    /// Number of likes referencing this post. Maintained in the same
    /// transaction as every like insert/delete.
    pub like_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Input for [`Database::create_post`](crate::Database::create_post).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPost {
    pub user_id: Uuid,
    pub title: String,
    pub content: String,
    pub image_url: Option<String>,
    pub image_name: Option<String>,
    pub image_stored: bool,
}

/// A post as seen by a particular viewer.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct PostView {
    pub post: Post,
    pub author: UserSummary,
    pub liked_by_viewer: bool,
}

// ---------------------------------------------------------------------------
// Comment
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Comment {
    pub id: Uuid,
    pub post_id: Uuid,
    /// Author of the comment.
    pub user_id: Uuid,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CommentView {
    pub comment: Comment,
    pub author: UserSummary,
}

// ---------------------------------------------------------------------------
// Like
// ---------------------------------------------------------------------------

/// One user's like on one post. Unique per (post, user).
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Like {
    pub id: Uuid,
    pub post_id: Uuid,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Outcome of [`Database::toggle_like`](crate::Database::toggle_like).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LikeToggle {
    /// State after the toggle.
    pub liked: bool,
    /// The post's like counter after the toggle.
    pub like_count: i64,
    /// Notification emitted to the post owner, if one was created.
    pub notification: Option<Notification>,
}

// ---------------------------------------------------------------------------
// Notification
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Notification {
    pub id: Uuid,
    pub recipient_id: Uuid,
    /// `None` once the sending account has been deleted.
    pub sender_id: Option<Uuid>,
    pub kind: NotificationKind,
    /// The entity (post) this notification concerns.
    pub reference_id: Uuid,
    pub content: String,
    pub link: String,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct NotificationView {
    pub notification: Notification,
    pub sender: Option<UserSummary>,
}

/// Everything needed to emit a notification; id and timestamp are assigned
/// on insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationDraft {
    pub recipient_id: Uuid,
    pub sender_id: Uuid,
    pub kind: NotificationKind,
    pub reference_id: Uuid,
    pub content: String,
    pub link: String,
}

// ---------------------------------------------------------------------------
// Learning plans
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct LearningPlan {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub target_completion_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    /// Ordered by position.
    pub topics: Vec<PlanTopic>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct PlanTopic {
    pub id: Uuid,
    pub plan_id: Uuid,
    pub position: i64,
    pub topic_name: String,
    pub completed: bool,
}

/// Input for a topic that does not exist yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPlanTopic {
    pub topic_name: String,
    pub completed: bool,
}

/// Fields accepted when creating or editing a plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanFields {
    pub title: String,
    pub description: Option<String>,
    pub target_completion_date: Option<NaiveDate>,
}

// ---------------------------------------------------------------------------
// Paging
// ---------------------------------------------------------------------------

/// Zero-based page request. `size` is clamped to `1..=MAX_PAGE_SIZE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub size: u32,
}

impl PageRequest {
    pub fn new(page: u32, size: u32) -> Self {
        Self {
            page,
            size: size.clamp(1, MAX_PAGE_SIZE),
        }
    }

    pub fn offset(&self) -> u32 {
        self.page.saturating_mul(self.size)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(0, DEFAULT_PAGE_SIZE)
    }
}

/// One page of results plus the total row count.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub size: u32,
    pub total: i64,
}

impl<T> Page<T> {
    pub fn total_pages(&self) -> i64 {
        let size = i64::from(self.size.max(1));
        (self.total + size - 1) / size
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            page: self.page,
            size: self.size,
            total: self.total,
        }
    }
}
