//! `/api/auth`: signup, login and session management.

use artcafe_shared::constants::{MIN_PASSWORD_LEN, ROLE_USER};
use artcafe_shared::credentials::{
    generate_session_token, hash_password, session_token_digest, verify_password,
};
use artcafe_store::NewUser;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use super::{message, required};
use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::state::AppState;

pub(super) fn routes() -> Router<AppState> {
    Router::new()
        .route("/signup", post(signup))
        .route("/login", post(login))
        .route("/validate-credentials", post(validate_credentials))
        .route("/logout", post(logout))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignupRequest {
    username: Option<String>,
    email: Option<String>,
    password: Option<String>,
    full_name: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoginRequest {
    #[serde(alias = "username", alias = "email")]
    username_or_email: String,
    password: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LoginResponse {
    token: String,
    #[serde(rename = "type")]
    token_type: &'static str,
    id: Uuid,
    username: String,
    email: String,
    full_name: Option<String>,
    profile_picture: Option<String>,
    roles: Vec<&'static str>,
}

pub(super) fn check_password_length(password: &str) -> Result<(), ApiError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ApiError::BadRequest(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

/// Argon2 is CPU-bound, so hashing runs on the blocking pool.
pub(super) async fn hash_password_blocking(password: String) -> Result<String, ApiError> {
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| ApiError::Internal(format!("hash task failed: {e}")))?
        .map_err(|e| ApiError::Internal(e.to_string()))
}

pub(super) async fn verify_password_blocking(
    password: String,
    stored: String,
) -> Result<bool, ApiError> {
    tokio::task::spawn_blocking(move || verify_password(&password, &stored))
        .await
        .map_err(|e| ApiError::Internal(format!("verify task failed: {e}")))?
        .map_err(|e| ApiError::Internal(e.to_string()))
}

async fn signup(
    State(state): State<AppState>,
    Json(req): Json<SignupRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let username = required(req.username, "Username")?.trim().to_string();
    let email = required(req.email, "Email")?.trim().to_string();
    let password = required(req.password, "Password")?;
    check_password_length(&password)?;

    let password_hash = hash_password_blocking(password).await?;
    let new = NewUser {
        username,
        email,
        password_hash,
        full_name: req.full_name.filter(|n| !n.trim().is_empty()),
    };

    let user = state
        .db
        .call(move |db| {
            if db.username_exists(&new.username)? {
                return Err(ApiError::BadRequest("Error: Username is already taken!".into()));
            }
            if db.email_exists(&new.email)? {
                return Err(ApiError::BadRequest("Error: Email is already in use!".into()));
            }
            Ok(db.create_user(&new)?)
        })
        .await?;

    info!(user = %user.id, username = %user.username, "User registered");
    Ok(message("User registered successfully!"))
}

async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let ttl = state.config.session_ttl();
    let token = generate_session_token();
    let digest = session_token_digest(&token);

    let bad_credentials = || ApiError::Unauthorized("Invalid username or password".into());
    let LoginRequest {
        username_or_email,
        password,
    } = req;

    let user = state
        .db
        .call(move |db| Ok(db.find_user_by_login(username_or_email.trim())?))
        .await?
        .ok_or_else(bad_credentials)?;
    if !verify_password_blocking(password, user.password_hash.clone()).await? {
        return Err(bad_credentials());
    }

    let user_id = user.id;
    state
        .db
        .call(move |db| Ok(db.create_session(&digest, user_id, ttl)?))
        .await?;

    info!(user = %user.id, "User logged in");
    Ok(Json(LoginResponse {
        token,
        token_type: "Bearer",
        id: user.id,
        username: user.username,
        email: user.email,
        full_name: user.full_name,
        profile_picture: user.profile_picture,
        roles: vec![ROLE_USER],
    }))
}

/// Check credentials without opening a session.
async fn validate_credentials(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<(StatusCode, Json<serde_json::Value>), ApiError> {
    let LoginRequest {
        username_or_email,
        password,
    } = req;
    let user = state
        .db
        .call(move |db| Ok(db.find_user_by_login(username_or_email.trim())?))
        .await?;

    let Some(user) = user else {
        return Ok((
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({ "valid": false, "message": "User not found" })),
        ));
    };

    if !verify_password_blocking(password, user.password_hash.clone()).await? {
        return Ok((
            StatusCode::UNAUTHORIZED,
            Json(serde_json::json!({ "valid": false, "message": "Invalid password" })),
        ));
    }

    Ok((
        StatusCode::OK,
        Json(serde_json::json!({ "valid": true, "message": "Credentials are valid" })),
    ))
}

async fn logout(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<serde_json::Value>, ApiError> {
    let digest = auth.token_digest;
    state.db.call(move |db| Ok(db.delete_session(&digest)?)).await?;

    info!(user = %auth.user.id, "User logged out");
    Ok(message("Logged out successfully"))
}
