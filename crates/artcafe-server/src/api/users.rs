//! `/api/users`: profiles, avatars, passwords and account deletion.

use artcafe_shared::ImageFolder;
use artcafe_store::User;
use axum::extract::{Multipart, Path, Query, State};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use super::auth::{check_password_length, hash_password_blocking, verify_password_blocking};
use super::message;
use super::upload::read_file_field;
use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::state::AppState;

pub(super) fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/profile",
            get(get_profile).put(update_profile).delete(delete_account),
        )
        .route("/profile/picture", post(upload_picture))
        .route("/profile/change-password", put(change_password))
        .route("/check-username", get(check_username))
        .route("/check-email", get(check_email))
        .route("/{id}", get(get_user))
}

/// Full profile of an account.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ProfileDto {
    id: Uuid,
    username: String,
    email: String,
    full_name: Option<String>,
    bio: Option<String>,
    profile_picture: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<User> for ProfileDto {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            username: u.username,
            email: u.email,
            full_name: u.full_name,
            bio: u.bio,
            profile_picture: u.profile_picture,
            created_at: u.created_at,
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProfileUpdate {
    full_name: Option<String>,
    bio: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PasswordChange {
    current_password: String,
    new_password: String,
}

#[derive(Deserialize)]
struct UsernameQuery {
    username: String,
}

#[derive(Deserialize)]
struct EmailQuery {
    email: String,
}

#[derive(Serialize)]
struct Availability {
    available: bool,
}

async fn get_profile(auth: AuthUser) -> Json<ProfileDto> {
    Json(auth.user.into())
}

async fn get_user(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ProfileDto>, ApiError> {
    let user = state.db.call(move |db| Ok(db.get_user(id)?)).await?;
    Ok(Json(user.into()))
}

async fn update_profile(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(update): Json<ProfileUpdate>,
) -> Result<Json<ProfileDto>, ApiError> {
    let id = auth.user.id;
    let user = state
        .db
        .call(move |db| {
            Ok(db.update_user_profile(id, update.full_name.as_deref(), update.bio.as_deref())?)
        })
        .await?;
    Ok(Json(user.into()))
}

/// Replace the avatar with the multipart `file` part.
async fn upload_picture(
    State(state): State<AppState>,
    auth: AuthUser,
    mut multipart: Multipart,
) -> Result<Json<ProfileDto>, ApiError> {
    let file = read_file_field(&mut multipart, "file")
        .await?
        .ok_or_else(|| ApiError::BadRequest("Missing 'file' field in multipart form".into()))?;

    let public = state
        .images
        .save(ImageFolder::Profile, &file.file_name, &file.data)
        .await?;

    let id = auth.user.id;
    let path = public.clone();
    let user = match state
        .db
        .call(move |db| {
            db.set_profile_picture(id, Some(&path))?;
            Ok(db.get_user(id)?)
        })
        .await
    {
        Ok(user) => user,
        Err(e) => {
            state.images.delete_best_effort(Some(&public)).await;
            return Err(e);
        }
    };

    state
        .images
        .delete_best_effort(auth.user.profile_picture.as_deref())
        .await;

    info!(user = %id, picture = %public, "Profile picture updated");
    Ok(Json(user.into()))
}

async fn change_password(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<PasswordChange>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let PasswordChange {
        current_password,
        new_password,
    } = req;
    let matches = verify_password_blocking(current_password, auth.user.password_hash.clone()).await?;
    if !matches {
        return Err(ApiError::BadRequest("Current password is incorrect".into()));
    }
    check_password_length(&new_password)?;

    let password_hash = hash_password_blocking(new_password).await?;
    let id = auth.user.id;
    state
        .db
        .call(move |db| Ok(db.set_password(id, &password_hash)?))
        .await?;

    info!(user = %id, "Password changed");
    Ok(message("Password changed successfully"))
}

/// Delete the caller's account, their content, and the images it used.
async fn delete_account(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<serde_json::Value>, ApiError> {
    let id = auth.user.id;
    let post_images = state
        .db
        .call(move |db| {
            let images = db.stored_image_urls_owned_by(id)?;
            db.delete_user(id)?;
            Ok(images)
        })
        .await?;

    state
        .images
        .delete_best_effort(auth.user.profile_picture.as_deref())
        .await;
    for image in &post_images {
        state.images.delete_best_effort(Some(image)).await;
    }

    info!(user = %id, "Account deleted");
    Ok(message("Account deleted successfully"))
}

async fn check_username(
    State(state): State<AppState>,
    Query(q): Query<UsernameQuery>,
) -> Result<Json<Availability>, ApiError> {
    let taken = state
        .db
        .call(move |db| Ok(db.username_exists(q.username.trim())?))
        .await?;
    Ok(Json(Availability { available: !taken }))
}

async fn check_email(
    State(state): State<AppState>,
    Query(q): Query<EmailQuery>,
) -> Result<Json<Availability>, ApiError> {
    let taken = state
        .db
        .call(move |db| Ok(db.email_exists(q.email.trim())?))
        .await?;
    Ok(Json(Availability { available: !taken }))
}
