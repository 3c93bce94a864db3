use rusqlite::Connection;

const UP_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS notifications (
    id           TEXT PRIMARY KEY NOT NULL,   -- UUID v4
    recipient_id TEXT NOT NULL,               -- FK -> users(id)
    sender_id    TEXT,                        -- FK -> users(id), NULL once the sender is gone
    type         TEXT NOT NULL,               -- LIKE | COMMENT
    reference_id TEXT NOT NULL,               -- entity the notification is about
    content      TEXT NOT NULL,
    link         TEXT NOT NULL,
    is_read      INTEGER NOT NULL DEFAULT 0,  -- boolean 0/1
    created_at   TEXT NOT NULL,

    FOREIGN KEY (recipient_id) REFERENCES users(id) ON DELETE CASCADE,
    FOREIGN KEY (sender_id) REFERENCES users(id) ON DELETE SET NULL
);

CREATE INDEX IF NOT EXISTS idx_notifications_recipient
    ON notifications(recipient_id, created_at DESC);
CREATE INDEX IF NOT EXISTS idx_notifications_recipient_read
    ON notifications(recipient_id, is_read);
CREATE INDEX IF NOT EXISTS idx_notifications_dedup
    ON notifications(sender_id, recipient_id, type, reference_id, created_at);
"#;

pub fn up(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(UP_SQL)
}
