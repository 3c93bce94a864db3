//! HTTP routes.

mod auth;
mod comments;
mod learning_plans;
mod notifications;
mod posts;
mod upload;
mod users;

#[cfg(test)]
mod tests;

use std::time::Duration;

use artcafe_store::{Page, PageRequest, UserSummary};
use axum::extract::DefaultBodyLimit;
use axum::http::{header, Method};
use axum::routing::get;
use axum::{middleware, Json, Router};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::info;
use uuid::Uuid;

use crate::error::ApiError;
use crate::rate_limit::rate_limit_middleware;
use crate::state::AppState;

/// Multipart framing allowance on top of the image size cap.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .max_age(Duration::from_secs(state.config.cors_max_age_secs));

    let api = Router::new()
        .nest("/auth", auth::routes())
        .nest("/users", users::routes())
        .nest("/posts", posts::routes().merge(comments::routes()))
        .nest("/notifications", notifications::routes())
        .nest("/learning-plans", learning_plans::routes());

    Router::new()
        .route("/health", get(health_check))
        .nest("/api", api)
        .nest_service("/images", ServeDir::new(state.images.root()))
        .layer(DefaultBodyLimit::max(
            state.config.max_upload_size + MULTIPART_OVERHEAD,
        ))
        .layer(middleware::from_fn_with_state(
            state.rate_limiter.clone(),
            rate_limit_middleware,
        ))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn serve(state: AppState, addr: std::net::SocketAddr) -> anyhow::Result<()> {
    let app = build_router(state);

    info!(addr = %addr, "Starting HTTP API server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<std::net::SocketAddr>(),
    )
    .await?;

    Ok(())
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

// ---------------------------------------------------------------------------
// Shared wire types
// ---------------------------------------------------------------------------

/// `?page=&size=` query, zero-based.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct PageQuery {
    page: Option<u32>,
    size: Option<u32>,
}

impl From<PageQuery> for PageRequest {
    fn from(q: PageQuery) -> Self {
        let default = PageRequest::default();
        PageRequest::new(q.page.unwrap_or(default.page), q.size.unwrap_or(default.size))
    }
}

/// `{ <key>: [...], currentPage, totalItems, totalPages }`
pub(crate) fn paged<T: Serialize>(
    key: &'static str,
    page: Page<T>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let total_pages = page.total_pages();
    let items = serde_json::to_value(&page.items)
        .map_err(|e| ApiError::Internal(format!("serialize {key}: {e}")))?;

    let mut body = serde_json::Map::new();
    body.insert(key.to_string(), items);
    body.insert("currentPage".into(), page.page.into());
    body.insert("totalItems".into(), page.total.into());
    body.insert("totalPages".into(), total_pages.into());
    Ok(Json(serde_json::Value::Object(body)))
}

/// `{ "message": ... }`
pub(crate) fn message(text: &str) -> Json<serde_json::Value> {
    Json(serde_json::json!({ "message": text }))
}

/// Public projection of a user embedded in other resources.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct UserDto {
    id: Uuid,
    username: String,
    full_name: Option<String>,
    profile_picture: Option<String>,
}

impl From<UserSummary> for UserDto {
    fn from(s: UserSummary) -> Self {
        Self {
            id: s.id,
            username: s.username,
            full_name: s.full_name,
            profile_picture: s.profile_picture,
        }
    }
}

/// Field must be present and non-blank.
pub(crate) fn required(value: Option<String>, field: &str) -> Result<String, ApiError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(ApiError::BadRequest(format!("{field} is required"))),
    }
}
