use rusqlite::Connection;

const UP_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS learning_plans (
    id                     TEXT PRIMARY KEY NOT NULL,  -- UUID v4
    owner_id               TEXT NOT NULL,              -- FK -> users(id)
    title                  TEXT NOT NULL,
    description            TEXT,
    target_completion_date TEXT,                       -- YYYY-MM-DD
    created_at             TEXT NOT NULL,
    updated_at             TEXT,

    FOREIGN KEY (owner_id) REFERENCES users(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_learning_plans_owner ON learning_plans(owner_id, created_at DESC);

CREATE TABLE IF NOT EXISTS plan_topics (
    id         TEXT PRIMARY KEY NOT NULL,      -- UUID v4
    plan_id    TEXT NOT NULL,                  -- FK -> learning_plans(id)
    position   INTEGER NOT NULL,
    topic_name TEXT NOT NULL,
    completed  INTEGER NOT NULL DEFAULT 0,     -- boolean 0/1

    FOREIGN KEY (plan_id) REFERENCES learning_plans(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_plan_topics_plan ON plan_topics(plan_id, position);
"#;

pub fn up(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(UP_SQL)
}
