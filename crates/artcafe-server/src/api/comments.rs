//! `/api/posts/{id}/comments`

use artcafe_store::{Comment, CommentView, UserSummary};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, put};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{message, paged, required, PageQuery, UserDto};
use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::state::AppState;

pub(super) fn routes() -> Router<AppState> {
    Router::new()
        .route("/{id}/comments", get(list_comments).post(create_comment))
        .route(
            "/{id}/comments/{comment_id}",
            put(update_comment).delete(delete_comment),
        )
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CommentDto {
    id: Uuid,
    content: String,
    created_at: DateTime<Utc>,
    updated_at: Option<DateTime<Utc>>,
    user: UserDto,
    post_id: Uuid,
}

impl CommentDto {
    fn new(c: Comment, author: UserSummary) -> Self {
        Self {
            id: c.id,
            content: c.content,
            created_at: c.created_at,
            updated_at: c.updated_at,
            user: author.into(),
            post_id: c.post_id,
        }
    }
}

impl From<CommentView> for CommentDto {
    fn from(v: CommentView) -> Self {
        Self::new(v.comment, v.author)
    }
}

#[derive(Deserialize)]
struct CommentBody {
    content: Option<String>,
}

/// Checks shared by update and delete, in this order: the comment exists,
/// it belongs to the post in the path, the caller wrote it, the post exists.
fn authorize_comment_edit(
    db: &artcafe_store::Database,
    post_id: Uuid,
    comment_id: Uuid,
    caller: Uuid,
) -> Result<Comment, ApiError> {
    let comment = db.get_comment(comment_id)?;
    if comment.post_id != post_id {
        return Err(ApiError::BadRequest(
            "Comment does not belong to this post".into(),
        ));
    }
    if comment.user_id != caller {
        return Err(ApiError::Forbidden(
            "You can only modify your own comments".into(),
        ));
    }
    db.get_post(post_id)?;
    Ok(comment)
}

/// Public: no session required.
async fn list_comments(
    State(state): State<AppState>,
    Path(post_id): Path<Uuid>,
    Query(q): Query<PageQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let page = state
        .db
        .call(move |db| {
            db.get_post(post_id)?;
            Ok(db.list_comments_for_post(post_id, q.into())?)
        })
        .await?;
    paged("comments", page.map(CommentDto::from))
}

async fn create_comment(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(post_id): Path<Uuid>,
    Json(body): Json<CommentBody>,
) -> Result<(StatusCode, Json<CommentDto>), ApiError> {
    let content = required(body.content, "Content")?;
    let author = UserSummary::from(&auth.user);
    let caller = author.id;

    let comment = state
        .db
        .call(move |db| Ok(db.create_comment(post_id, caller, &content)?))
        .await?;

    Ok((StatusCode::CREATED, Json(CommentDto::new(comment, author))))
}

async fn update_comment(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((post_id, comment_id)): Path<(Uuid, Uuid)>,
    Json(body): Json<CommentBody>,
) -> Result<Json<CommentDto>, ApiError> {
    let content = required(body.content, "Content")?;
    let author = UserSummary::from(&auth.user);
    let caller = author.id;

    let comment = state
        .db
        .call(move |db| {
            authorize_comment_edit(db, post_id, comment_id, caller)?;
            Ok(db.update_comment_content(comment_id, &content)?)
        })
        .await?;

    Ok(Json(CommentDto::new(comment, author)))
}

async fn delete_comment(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((post_id, comment_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let caller = auth.user.id;
    state
        .db
        .call(move |db| {
            authorize_comment_edit(db, post_id, comment_id, caller)?;
            Ok(db.delete_comment(comment_id)?)
        })
        .await?;

    Ok(message("Comment deleted successfully"))
}
