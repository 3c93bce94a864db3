//! Notification storage, deduplication and read-state transitions.
//!
//! A notification is suppressed when one with the same
//! (sender, recipient, type, reference) tuple was created within the trailing
//! [`NOTIFICATION_DEDUP_WINDOW_SECS`]. The check and the insert are one
//! conditional `INSERT ... SELECT ... WHERE NOT EXISTS` statement, so two
//! concurrent triggers cannot both pass the check.

use artcafe_shared::constants::NOTIFICATION_DEDUP_WINDOW_SECS;
use artcafe_shared::NotificationKind;
use chrono::{DateTime, Duration, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::models::{Notification, NotificationDraft, NotificationView, Page, PageRequest};
use crate::rows::{fmt_ts, now, opt_uuid_at, ts_at, uuid_at};
use crate::users::{summary_at, summary_columns};

const NOTIFICATION_COLUMNS: &str = "n.id, n.recipient_id, n.sender_id, n.type, n.reference_id, \
                                    n.content, n.link, n.is_read, n.created_at";

impl Database {
    // ------------------------------------------------------------------
    // Create
    // ------------------------------------------------------------------

    /// Insert a fully-formed notification, bypassing deduplication.
    pub fn insert_notification(&self, n: &Notification) -> Result<()> {
        self.conn().execute(
            "INSERT INTO notifications
                 (id, recipient_id, sender_id, type, reference_id, content, link, is_read, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                n.id.to_string(),
                n.recipient_id.to_string(),
                n.sender_id.map(|s| s.to_string()),
                n.kind.as_str(),
                n.reference_id.to_string(),
                n.content,
                n.link,
                n.read,
                fmt_ts(&n.created_at),
            ],
        )?;
        Ok(())
    }

    /// Emit `draft` unless an identical notification is still inside the
    /// dedup window. Returns the created notification, if any.
    pub fn notify_unless_recent(&mut self, draft: &NotificationDraft) -> Result<Option<Notification>> {
        let tx = self.write_tx()?;
        let created = insert_unless_recent(&tx, draft, now())?;
        tx.commit()?;
        Ok(created)
    }

    // ------------------------------------------------------------------
    // Read
    // ------------------------------------------------------------------

    /// Was a notification with this exact tuple created within the dedup
    /// window, counted back from now?
    pub fn has_recent_notification(
        &self,
        recipient_id: Uuid,
        sender_id: Uuid,
        kind: NotificationKind,
        reference_id: Uuid,
    ) -> Result<bool> {
        Ok(self.conn().query_row(
            "SELECT EXISTS(
                 SELECT 1 FROM notifications
                 WHERE sender_id = ?1 AND recipient_id = ?2 AND type = ?3
                   AND reference_id = ?4 AND created_at > ?5
             )",
            params![
                sender_id.to_string(),
                recipient_id.to_string(),
                kind.as_str(),
                reference_id.to_string(),
                fmt_ts(&dedup_cutoff(now())),
            ],
            |row| row.get(0),
        )?)
    }

    pub fn get_notification(&self, id: Uuid) -> Result<Notification> {
        self.conn()
            .query_row(
                &format!("SELECT {NOTIFICATION_COLUMNS} FROM notifications n WHERE n.id = ?1"),
                params![id.to_string()],
                row_to_notification,
            )
            .optional()?
            .ok_or(StoreError::NotFound("Notification"))
    }

    /// A recipient's notifications, newest first, with sender summaries.
    pub fn list_notifications(
        &self,
        recipient_id: Uuid,
        page: PageRequest,
    ) -> Result<Page<NotificationView>> {
        let total: i64 = self.conn().query_row(
            "SELECT COUNT(*) FROM notifications WHERE recipient_id = ?1",
            params![recipient_id.to_string()],
            |row| row.get(0),
        )?;

        let mut stmt = self.conn().prepare(&format!(
            "SELECT {NOTIFICATION_COLUMNS}, {}
             FROM notifications n LEFT JOIN users u ON u.id = n.sender_id
             WHERE n.recipient_id = ?1
             ORDER BY n.created_at DESC, n.rowid DESC
             LIMIT ?2 OFFSET ?3",
            summary_columns("u")
        ))?;
        let rows = stmt.query_map(
            params![recipient_id.to_string(), page.size, page.offset()],
            |row| {
                let notification = row_to_notification(row)?;
                let sender_id: Option<String> = row.get(9)?;
                let sender = match sender_id {
                    Some(_) => Some(summary_at(row, 9)?),
                    None => None,
                };
                Ok(NotificationView {
                    notification,
                    sender,
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

    pub fn count_unread_notifications(&self, recipient_id: Uuid) -> Result<i64> {
        Ok(self.conn().query_row(
            "SELECT COUNT(*) FROM notifications WHERE recipient_id = ?1 AND is_read = 0",
            params![recipient_id.to_string()],
            |row| row.get(0),
        )?)
    }

    // ------------------------------------------------------------------
    // Read-state transitions
    // ------------------------------------------------------------------

    /// Flip one notification to read. Reading an already-read notification
    /// is a no-op.
    pub fn mark_notification_read(&self, id: Uuid) -> Result<Notification> {
        let affected = self.conn().execute(
            "UPDATE notifications SET is_read = 1 WHERE id = ?1",
            params![id.to_string()],
        )?;
        if affected == 0 {
            return Err(StoreError::NotFound("Notification"));
        }
        self.get_notification(id)
    }

    /// Mark up to `limit` of the recipient's unread notifications as read,
    /// one row at a time. Returns how many were flipped; callers with a
    /// larger backlog call again.
    pub fn mark_all_notifications_read(&mut self, recipient_id: Uuid, limit: u32) -> Result<usize> {
        let tx = self.write_tx()?;
        let ids = select_ids(&tx, recipient_id, false, limit)?;
        for id in &ids {
            tx.execute(
                "UPDATE notifications SET is_read = 1 WHERE id = ?1",
                params![id],
            )?;
        }
        tx.commit()?;

        tracing::debug!(recipient = %recipient_id, count = ids.len(), "notifications marked read");
        Ok(ids.len())
    }

    /// Delete up to `limit` of the recipient's read notifications, one row at
    /// a time. Returns how many were deleted.
    pub fn clear_read_notifications(&mut self, recipient_id: Uuid, limit: u32) -> Result<usize> {
        let tx = self.write_tx()?;
        let ids = select_ids(&tx, recipient_id, true, limit)?;
        for id in &ids {
            tx.execute("DELETE FROM notifications WHERE id = ?1", params![id])?;
        }
        tx.commit()?;

        tracing::debug!(recipient = %recipient_id, count = ids.len(), "read notifications cleared");
        Ok(ids.len())
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn dedup_cutoff(at: DateTime<Utc>) -> DateTime<Utc> {
    at - Duration::seconds(NOTIFICATION_DEDUP_WINDOW_SECS)
}

/// Conditionally insert `draft` as of `at`. Must run inside the caller's
/// write transaction.
pub(crate) fn insert_unless_recent(
    conn: &Connection,
    draft: &NotificationDraft,
    at: DateTime<Utc>,
) -> Result<Option<Notification>> {
    let notification = Notification {
        id: Uuid::new_v4(),
        recipient_id: draft.recipient_id,
        sender_id: Some(draft.sender_id),
        kind: draft.kind,
        reference_id: draft.reference_id,
        content: draft.content.clone(),
        link: draft.link.clone(),
        read: false,
        created_at: at,
    };

    let inserted = conn.execute(
        "INSERT INTO notifications
             (id, recipient_id, sender_id, type, reference_id, content, link, is_read, created_at)
         SELECT ?1, ?2, ?3, ?4, ?5, ?6, ?7, 0, ?8
         WHERE NOT EXISTS (
             SELECT 1 FROM notifications
             WHERE sender_id = ?3 AND recipient_id = ?2 AND type = ?4
               AND reference_id = ?5 AND created_at > ?9
         )",
        params![
            notification.id.to_string(),
            notification.recipient_id.to_string(),
            draft.sender_id.to_string(),
            notification.kind.as_str(),
            notification.reference_id.to_string(),
            notification.content,
            notification.link,
            fmt_ts(&at),
            fmt_ts(&dedup_cutoff(at)),
        ],
    )?;

    if inserted == 0 {
        tracing::debug!(
            recipient = %draft.recipient_id,
            sender = %draft.sender_id,
            kind = %draft.kind,
            reference = %draft.reference_id,
            "duplicate notification suppressed"
        );
        return Ok(None);
    }
    Ok(Some(notification))
}

fn select_ids(conn: &Connection, recipient_id: Uuid, read: bool, limit: u32) -> Result<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT id FROM notifications
         WHERE recipient_id = ?1 AND is_read = ?2
         ORDER BY created_at ASC
         LIMIT ?3",
    )?;
    let rows = stmt.query_map(params![recipient_id.to_string(), read, limit], |row| row.get(0))?;

    let mut ids = Vec::new();
    for row in rows {
        ids.push(row?);
    }
    Ok(ids)
}

fn row_to_notification(row: &rusqlite::Row<'_>) -> rusqlite::Result<Notification> {
    let kind: String = row.get(3)?;
    let kind = kind.parse::<NotificationKind>().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(3, rusqlite::types::Type::Text, Box::new(e))
    })?;

    Ok(Notification {
        id: uuid_at(row, 0)?,
        recipient_id: uuid_at(row, 1)?,
        sender_id: opt_uuid_at(row, 2)?,
        kind,
        reference_id: uuid_at(row, 4)?,
        content: row.get(5)?,
        link: row.get(6)?,
        read: row.get(7)?,
        created_at: ts_at(row, 8)?,
    })
}
