//! Bearer-token authentication.

use artcafe_shared::credentials::session_token_digest;
use artcafe_store::User;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use chrono::Utc;

use crate::error::ApiError;
use crate::state::AppState;

/// The caller, resolved from `Authorization: Bearer <token>`.
///
/// Missing, unknown and expired tokens are all rejected with 401.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user: User,
    /// Digest of the presented token, used by logout.
    pub token_digest: String,
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)
            .ok_or_else(|| ApiError::Unauthorized("Authentication required".to_string()))?;
        let digest = session_token_digest(token);

        let lookup = digest.clone();
        let user = state
            .db
            .call(move |db| Ok(db.find_session_user(&lookup, Utc::now())?))
            .await?
            .ok_or_else(|| ApiError::Unauthorized("Invalid or expired session".to_string()))?;

        Ok(AuthUser {
            user,
            token_digest: digest,
        })
    }
}

fn bearer_token(parts: &Parts) -> Option<&str> {
    let value = parts.headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}
