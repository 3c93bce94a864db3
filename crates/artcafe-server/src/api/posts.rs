//! `/api/posts`: feed, post CRUD and like toggling.

use artcafe_shared::ImageFolder;
use artcafe_store::{NewPost, PostView};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use super::upload::PostForm;
use super::{message, paged, required, PageQuery, UserDto};
use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::state::AppState;

pub(super) fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_posts).post(create_post))
        .route("/byUsername/{username}", get(list_posts_by_username))
        .route(
            "/{id}",
            get(get_post).put(update_post).delete(delete_post),
        )
        .route("/{id}/like", post(toggle_like))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PostDto {
    id: Uuid,
    title: String,
    content: String,
    image_url: Option<String>,
    image_name: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: Option<DateTime<Utc>>,
    user: UserDto,
    comment_count: i64,
    like_count: i64,
    liked_by_current_user: bool,
}

impl From<PostView> for PostDto {
    fn from(v: PostView) -> Self {
        let p = v.post;
        Self {
            id: p.id,
            title: p.title,
            content: p.content,
            image_url: p.image_url,
            image_name: p.image_name,
            created_at: p.created_at,
            updated_at: p.updated_at,
            user: v.author.into(),
            comment_count: p.comment_count,
            like_count: p.like_count,
            liked_by_current_user: v.liked_by_viewer,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LikeResponse {
    liked: bool,
    message: &'static str,
    like_count: i64,
}

async fn list_posts(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(q): Query<PageQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let viewer = auth.user.id;
    let page = state
        .db
        .call(move |db| Ok(db.list_feed(viewer, q.into())?))
        .await?;
    paged("posts", page.map(PostDto::from))
}

async fn list_posts_by_username(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(username): Path<String>,
    Query(q): Query<PageQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let viewer = auth.user.id;
    let page = state
        .db
        .call(move |db| {
            let author = db
                .find_user_by_username(&username)?
                .ok_or_else(|| ApiError::NotFound("User not found".into()))?;
            Ok(db.list_posts_by_user(author.id, viewer, q.into())?)
        })
        .await?;
    paged("posts", page.map(PostDto::from))
}

async fn get_post(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<PostDto>, ApiError> {
    let viewer = auth.user.id;
    let view = state.db.call(move |db| Ok(db.get_post_view(id, viewer)?)).await?;
    Ok(Json(view.into()))
}

/// JSON `{title, content, imageUrl?, imageName?}` or multipart with an
/// optional `image` part.
async fn create_post(
    State(state): State<AppState>,
    auth: AuthUser,
    form: PostForm,
) -> Result<(StatusCode, Json<PostDto>), ApiError> {
    let title = required(form.title, "Title")?;
    let content = required(form.content, "Content")?;

    // A JSON `imageUrl` is only a reference; the post never owns that file.
    let (image_url, image_name, stored) = match form.image {
        Some(file) => {
            let public = state
                .images
                .save(ImageFolder::Posts, &file.file_name, &file.data)
                .await?;
            (Some(public.clone()), Some(file.file_name), Some(public))
        }
        None => (form.image_url, form.image_name, None),
    };

    let new = NewPost {
        user_id: auth.user.id,
        title,
        content,
        image_url,
        image_name,
        image_stored: stored.is_some(),
    };
    let viewer = auth.user.id;
    let created = state
        .db
        .call(move |db| {
            let post = db.create_post(&new)?;
            Ok(db.get_post_view(post.id, viewer)?)
        })
        .await;

    let view = match created {
        Ok(view) => view,
        Err(e) => {
            state.images.delete_best_effort(stored.as_deref()).await;
            return Err(e);
        }
    };

    info!(post = %view.post.id, owner = %viewer, "Post created");
    Ok((StatusCode::CREATED, Json(view.into())))
}

/// Only title and content change; image fields are ignored.
async fn update_post(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    form: PostForm,
) -> Result<Json<PostDto>, ApiError> {
    let caller = auth.user.id;
    let view = state
        .db
        .call(move |db| {
            let post = db.get_post(id)?;
            if post.user_id != caller {
                return Err(ApiError::Forbidden(
                    "You can only update your own posts".into(),
                ));
            }
            let title = form.title.unwrap_or(post.title);
            let content = form.content.unwrap_or(post.content);
            db.update_post_text(id, &title, &content)?;
            Ok(db.get_post_view(id, caller)?)
        })
        .await?;
    Ok(Json(view.into()))
}

async fn delete_post(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let caller = auth.user.id;
    let image_url = state
        .db
        .call(move |db| {
            let post = db.get_post(id)?;
            if post.user_id != caller {
                return Err(ApiError::Forbidden(
                    "You can only delete your own posts".into(),
                ));
            }
            db.delete_post(id)?;
            Ok(post.image_url.filter(|_| post.image_stored))
        })
        .await?;

    state.images.delete_best_effort(image_url.as_deref()).await;

    info!(post = %id, "Post deleted");
    Ok(message("Post deleted successfully"))
}

async fn toggle_like(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<LikeResponse>, ApiError> {
    let caller = auth.user.id;
    let toggle = state.db.call(move |db| Ok(db.toggle_like(id, caller)?)).await?;

    Ok(Json(LikeResponse {
        liked: toggle.liked,
        message: if toggle.liked {
            "Post liked successfully"
        } else {
            "Post unliked successfully"
        },
        like_count: toggle.like_count,
    }))
}
