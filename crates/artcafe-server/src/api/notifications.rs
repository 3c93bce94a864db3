//! `/api/notifications`: the caller's inbox.

use artcafe_shared::constants::{CLEAR_READ_BATCH, MARK_ALL_READ_BATCH};
use artcafe_shared::NotificationKind;
use artcafe_store::{Database, Notification, NotificationView, StoreError, UserSummary};
use axum::extract::{Path, Query, State};
use axum::routing::{delete, get, put};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::{paged, PageQuery, UserDto};
use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::state::AppState;

pub(super) fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_notifications))
        .route("/unread-count", get(unread_count))
        .route("/{id}/read", put(mark_read))
        .route("/read-all", put(mark_all_read))
        .route("/clear-read", delete(clear_read))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct NotificationDto {
    id: Uuid,
    content: String,
    link: String,
    read: bool,
    created_at: DateTime<Utc>,
    sender: Option<UserDto>,
    #[serde(rename = "type")]
    kind: NotificationKind,
    reference_id: Uuid,
}

impl NotificationDto {
    fn new(n: Notification, sender: Option<UserSummary>) -> Self {
        Self {
            id: n.id,
            content: n.content,
            link: n.link,
            read: n.read,
            created_at: n.created_at,
            sender: sender.map(UserDto::from),
            kind: n.kind,
            reference_id: n.reference_id,
        }
    }
}

impl From<NotificationView> for NotificationDto {
    fn from(v: NotificationView) -> Self {
        Self::new(v.notification, v.sender)
    }
}

#[derive(Serialize)]
struct CountResponse {
    count: i64,
}

#[derive(Serialize)]
struct BulkResponse {
    message: &'static str,
    count: usize,
}

async fn list_notifications(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(q): Query<PageQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let recipient = auth.user.id;
    let page = state
        .db
        .call(move |db| Ok(db.list_notifications(recipient, q.into())?))
        .await?;
    paged("notifications", page.map(NotificationDto::from))
}

async fn unread_count(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<CountResponse>, ApiError> {
    let recipient = auth.user.id;
    let count = state
        .db
        .call(move |db| Ok(db.count_unread_notifications(recipient)?))
        .await?;
    Ok(Json(CountResponse { count }))
}

/// Idempotent; only the recipient may mark a notification read.
async fn mark_read(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<NotificationDto>, ApiError> {
    let caller = auth.user.id;
    let (notification, sender) = state
        .db
        .call(move |db| {
            let existing = db.get_notification(id)?;
            if existing.recipient_id != caller {
                return Err(ApiError::Forbidden(
                    "You can only update your own notifications".into(),
                ));
            }
            let updated = db.mark_notification_read(id)?;
            let sender = sender_summary(db, updated.sender_id)?;
            Ok((updated, sender))
        })
        .await?;

    Ok(Json(NotificationDto::new(notification, sender)))
}

/// Flips at most [`MARK_ALL_READ_BATCH`] notifications per call.
async fn mark_all_read(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<BulkResponse>, ApiError> {
    let recipient = auth.user.id;
    let count = state
        .db
        .call(move |db| Ok(db.mark_all_notifications_read(recipient, MARK_ALL_READ_BATCH)?))
        .await?;
    Ok(Json(BulkResponse {
        message: "All notifications marked as read",
        count,
    }))
}

/// Deletes at most [`CLEAR_READ_BATCH`] read notifications per call.
async fn clear_read(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<BulkResponse>, ApiError> {
    let recipient = auth.user.id;
    let count = state
        .db
        .call(move |db| Ok(db.clear_read_notifications(recipient, CLEAR_READ_BATCH)?))
        .await?;
    Ok(Json(BulkResponse {
        message: "All read notifications cleared",
        count,
    }))
}

/// A sender that has since been deleted is reported as absent.
fn sender_summary(
    db: &Database,
    sender_id: Option<Uuid>,
) -> Result<Option<UserSummary>, StoreError> {
    let Some(id) = sender_id else {
        return Ok(None);
    };
    match db.get_user(id) {
        Ok(user) => Ok(Some(UserSummary::from(&user))),
        Err(StoreError::NotFound(_)) => Ok(None),
        Err(e) => Err(e),
    }
}
