//! Learning plans and their ordered topic lists.

use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::models::{LearningPlan, NewPlanTopic, PlanFields, PlanTopic};
use crate::rows::{fmt_date, fmt_ts, now, opt_date_at, opt_ts_at, ts_at, uuid_at};

const PLAN_COLUMNS: &str =
    "id, owner_id, title, description, target_completion_date, created_at, updated_at";

impl Database {
    pub fn create_plan(
        &mut self,
        owner_id: Uuid,
        fields: &PlanFields,
        topics: &[NewPlanTopic],
    ) -> Result<LearningPlan> {
        let id = Uuid::new_v4();
        let tx = self.write_tx()?;

        tx.execute(
            "INSERT INTO learning_plans
                 (id, owner_id, title, description, target_completion_date, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                id.to_string(),
                owner_id.to_string(),
                fields.title,
                fields.description,
                fields.target_completion_date.as_ref().map(fmt_date),
                fmt_ts(&now()),
            ],
        )?;
        insert_topics(&tx, id, topics)?;
        let plan = fetch_plan(&tx, id)?.ok_or(StoreError::NotFound("Learning plan"))?;

        tx.commit()?;

        tracing::debug!(plan = %id, owner = %owner_id, topics = topics.len(), "learning plan created");
        Ok(plan)
    }

    pub fn get_plan(&self, id: Uuid) -> Result<LearningPlan> {
        fetch_plan(self.conn(), id)?.ok_or(StoreError::NotFound("Learning plan"))
    }

    /// All plans owned by `owner_id`, newest first.
    pub fn list_plans_for_owner(&self, owner_id: Uuid) -> Result<Vec<LearningPlan>> {
        let mut stmt = self.conn().prepare(&format!(
            "SELECT {PLAN_COLUMNS} FROM learning_plans
             WHERE owner_id = ?1
             ORDER BY created_at DESC, rowid DESC"
        ))?;
        let rows = stmt.query_map(params![owner_id.to_string()], row_to_plan)?;

        let mut plans = Vec::new();
        for row in rows {
            let mut plan = row?;
            plan.topics = fetch_topics(self.conn(), plan.id)?;
            plans.push(plan);
        }
        Ok(plans)
    }

    /// Overwrite the plan's fields. When `topics` is `Some`, the topic list is
    /// replaced wholesale.
    pub fn update_plan(
        &mut self,
        id: Uuid,
        fields: &PlanFields,
        topics: Option<&[NewPlanTopic]>,
    ) -> Result<LearningPlan> {
        let tx = self.write_tx()?;

        let affected = tx.execute(
            "UPDATE learning_plans
             SET title = ?2, description = ?3, target_completion_date = ?4, updated_at = ?5
             WHERE id = ?1",
            params![
                id.to_string(),
                fields.title,
                fields.description,
                fields.target_completion_date.as_ref().map(fmt_date),
                fmt_ts(&now()),
            ],
        )?;
        if affected == 0 {
            return Err(StoreError::NotFound("Learning plan"));
        }

        if let Some(topics) = topics {
            tx.execute("DELETE FROM plan_topics WHERE plan_id = ?1", params![id.to_string()])?;
            insert_topics(&tx, id, topics)?;
        }
        let plan = fetch_plan(&tx, id)?.ok_or(StoreError::NotFound("Learning plan"))?;

        tx.commit()?;
        Ok(plan)
    }

    /// Delete a plan. Its topics go with it.
    pub fn delete_plan(&self, id: Uuid) -> Result<bool> {
        let affected = self
            .conn()
            .execute("DELETE FROM learning_plans WHERE id = ?1", params![id.to_string()])?;
        Ok(affected > 0)
    }

    pub fn get_topic(&self, id: Uuid) -> Result<PlanTopic> {
        self.conn()
            .query_row(
                "SELECT id, plan_id, position, topic_name, completed FROM plan_topics WHERE id = ?1",
                params![id.to_string()],
                row_to_topic,
            )
            .optional()?
            .ok_or(StoreError::NotFound("Topic"))
    }

    /// Mark a topic completed. Completion is one-way; repeating it is a no-op.
    pub fn complete_topic(&self, id: Uuid) -> Result<PlanTopic> {
        let affected = self.conn().execute(
            "UPDATE plan_topics SET completed = 1 WHERE id = ?1",
            params![id.to_string()],
        )?;
        if affected == 0 {
            return Err(StoreError::NotFound("Topic"));
        }
        self.get_topic(id)
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn insert_topics(conn: &Connection, plan_id: Uuid, topics: &[NewPlanTopic]) -> Result<()> {
    let mut stmt = conn.prepare(
        "INSERT INTO plan_topics (id, plan_id, position, topic_name, completed)
         VALUES (?1, ?2, ?3, ?4, ?5)",
    )?;
    for (position, topic) in topics.iter().enumerate() {
        stmt.execute(params![
            Uuid::new_v4().to_string(),
            plan_id.to_string(),
            position as i64,
            topic.topic_name,
            topic.completed,
        ])?;
    }
    Ok(())
}

fn fetch_plan(conn: &Connection, id: Uuid) -> Result<Option<LearningPlan>> {
    let plan = conn
        .query_row(
            &format!("SELECT {PLAN_COLUMNS} FROM learning_plans WHERE id = ?1"),
            params![id.to_string()],
            row_to_plan,
        )
        .optional()?;

    match plan {
        Some(mut plan) => {
            plan.topics = fetch_topics(conn, plan.id)?;
            Ok(Some(plan))
        }
        None => Ok(None),
    }
}

fn fetch_topics(conn: &Connection, plan_id: Uuid) -> Result<Vec<PlanTopic>> {
    let mut stmt = conn.prepare(
        "SELECT id, plan_id, position, topic_name, completed FROM plan_topics
         WHERE plan_id = ?1
         ORDER BY position ASC",
    )?;
    let rows = stmt.query_map(params![plan_id.to_string()], row_to_topic)?;

    let mut topics = Vec::new();
    for row in rows {
        topics.push(row?);
    }
    Ok(topics)
}

/// Topics are filled in separately.
fn row_to_plan(row: &rusqlite::Row<'_>) -> rusqlite::Result<LearningPlan> {
    Ok(LearningPlan {
        id: uuid_at(row, 0)?,
        owner_id: uuid_at(row, 1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        target_completion_date: opt_date_at(row, 4)?,
        created_at: ts_at(row, 5)?,
        updated_at: opt_ts_at(row, 6)?,
        topics: Vec::new(),
    })
}

fn row_to_topic(row: &rusqlite::Row<'_>) -> rusqlite::Result<PlanTopic> {
    Ok(PlanTopic {
        id: uuid_at(row, 0)?,
        plan_id: uuid_at(row, 1)?,
        position: row.get(2)?,
        topic_name: row.get(3)?,
        completed: row.get(4)?,
    })
}
