//! `/api/learning-plans`

use artcafe_store::{LearningPlan, NewPlanTopic, PlanFields, PlanTopic};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, put};
use axum::{Json, Router};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{message, required};
use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::state::AppState;

/// `{id}` is a user id for GET/POST and a plan id for PUT/DELETE.
pub(super) fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/{id}",
            get(list_plans)
                .post(create_plan)
                .put(update_plan)
                .delete(delete_plan),
        )
        .route("/single/{id}", get(get_plan))
        .route("/topics/{id}/complete", put(complete_topic))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PlanTopicDto {
    id: Uuid,
    topic_name: String,
    completed: bool,
}

impl From<PlanTopic> for PlanTopicDto {
    fn from(t: PlanTopic) -> Self {
        Self {
            id: t.id,
            topic_name: t.topic_name,
            completed: t.completed,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct LearningPlanDto {
    id: Uuid,
    title: String,
    description: Option<String>,
    target_completion_date: Option<NaiveDate>,
    created_by: Uuid,
    created_at: DateTime<Utc>,
    updated_at: Option<DateTime<Utc>>,
    topics: Vec<PlanTopicDto>,
}

impl From<LearningPlan> for LearningPlanDto {
    fn from(p: LearningPlan) -> Self {
        Self {
            id: p.id,
            title: p.title,
            description: p.description,
            target_completion_date: p.target_completion_date,
            created_by: p.owner_id,
            created_at: p.created_at,
            updated_at: p.updated_at,
            topics: p.topics.into_iter().map(PlanTopicDto::from).collect(),
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TopicInput {
    topic_name: String,
    #[serde(default)]
    completed: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlanInput {
    title: Option<String>,
    description: Option<String>,
    target_completion_date: Option<NaiveDate>,
    topics: Option<Vec<TopicInput>>,
}

impl PlanInput {
    fn split(self) -> Result<(PlanFields, Option<Vec<NewPlanTopic>>), ApiError> {
        let fields = PlanFields {
            title: required(self.title, "Title")?,
            description: self.description,
            target_completion_date: self.target_completion_date,
        };
        let topics = self.topics.map(|topics| {
            topics
                .into_iter()
                .map(|t| NewPlanTopic {
                    topic_name: t.topic_name,
                    completed: t.completed,
                })
                .collect()
        });
        Ok((fields, topics))
    }
}

fn ensure_owner(plan: &LearningPlan, caller: Uuid) -> Result<(), ApiError> {
    if plan.owner_id != caller {
        return Err(ApiError::Forbidden(
            "You can only modify your own learning plans".into(),
        ));
    }
    Ok(())
}

async fn create_plan(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(user_id): Path<Uuid>,
    Json(input): Json<PlanInput>,
) -> Result<(StatusCode, Json<LearningPlanDto>), ApiError> {
    if user_id != auth.user.id {
        return Err(ApiError::Forbidden(
            "You can only create learning plans for yourself".into(),
        ));
    }
    let (fields, topics) = input.split()?;
    let topics = topics.unwrap_or_default();

    let plan = state
        .db
        .call(move |db| Ok(db.create_plan(user_id, &fields, &topics)?))
        .await?;

    tracing::info!(plan = %plan.id, owner = %user_id, "Learning plan created");
    Ok((StatusCode::CREATED, Json(plan.into())))
}

async fn list_plans(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(user_id): Path<Uuid>,
) -> Result<Json<Vec<LearningPlanDto>>, ApiError> {
    let plans = state
        .db
        .call(move |db| Ok(db.list_plans_for_owner(user_id)?))
        .await?;
    Ok(Json(plans.into_iter().map(LearningPlanDto::from).collect()))
}

async fn get_plan(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(plan_id): Path<Uuid>,
) -> Result<Json<LearningPlanDto>, ApiError> {
    let plan = state.db.call(move |db| Ok(db.get_plan(plan_id)?)).await?;
    Ok(Json(plan.into()))
}

/// Replaces the topic list only when `topics` is present in the body.
async fn update_plan(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(plan_id): Path<Uuid>,
    Json(input): Json<PlanInput>,
) -> Result<Json<LearningPlanDto>, ApiError> {
    let (fields, topics) = input.split()?;
    let caller = auth.user.id;

    let plan = state
        .db
        .call(move |db| {
            ensure_owner(&db.get_plan(plan_id)?, caller)?;
            Ok(db.update_plan(plan_id, &fields, topics.as_deref())?)
        })
        .await?;
    Ok(Json(plan.into()))
}

async fn delete_plan(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(plan_id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let caller = auth.user.id;
    state
        .db
        .call(move |db| {
            ensure_owner(&db.get_plan(plan_id)?, caller)?;
            Ok(db.delete_plan(plan_id)?)
        })
        .await?;
    Ok(message("Learning plan deleted successfully"))
}

/// One-way; completing an already completed topic is a no-op. Returns the
/// enclosing plan.
async fn complete_topic(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(topic_id): Path<Uuid>,
) -> Result<Json<LearningPlanDto>, ApiError> {
    let caller = auth.user.id;
    let plan = state
        .db
        .call(move |db| {
            let topic = db.get_topic(topic_id)?;
            ensure_owner(&db.get_plan(topic.plan_id)?, caller)?;
            db.complete_topic(topic_id)?;
            Ok(db.get_plan(topic.plan_id)?)
        })
        .await?;
    Ok(Json(plan.into()))
}
