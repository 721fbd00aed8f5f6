use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Json, Router};
use uuid::Uuid;

use crate::db;
use crate::models::{
    NewPublishQuestionnaire, NewQuestionnaireTemplate, PublishQuestionnaire,
    PublishQuestionnairePatch, PublishType, QuestionnaireTemplate, QuestionnaireTemplatePatch,
};

use super::error::{require, ApiError};
use super::org::StatusQuery;
use super::{Actor, AppState};

pub(crate) fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/questionnaire-templates",
            get(list_templates).post(create_template),
        )
        .route(
            "/api/questionnaire-templates/{id}",
            get(get_template).put(update_template).delete(delete_template),
        )
        .route(
            "/api/publish-questionnaires",
            get(list_publishes).post(create_publish),
        )
        .route(
            "/api/publish-questionnaires/{id}",
            get(get_publish).put(update_publish).delete(delete_publish),
        )
}

async fn list_templates(
    State(state): State<AppState>,
    actor: Actor,
    Query(query): Query<StatusQuery>,
) -> Result<Json<Vec<QuestionnaireTemplate>>, ApiError> {
    Ok(Json(
        db::templates::list_templates(&state.pool, actor.owner_id(), query.status).await?,
    ))
}

async fn get_template(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<Uuid>,
) -> Result<Json<QuestionnaireTemplate>, ApiError> {
    let template = db::templates::get_template(&state.pool, actor.owner_id(), id)
        .await?
        .ok_or(ApiError::NotFound("questionnaire template"))?;
    Ok(Json(template))
}

async fn create_template(
    State(state): State<AppState>,
    actor: Actor,
    Json(new): Json<NewQuestionnaireTemplate>,
) -> Result<Json<QuestionnaireTemplate>, ApiError> {
    require(!new.name.trim().is_empty(), "template name is required")?;
    Ok(Json(
        db::templates::create_template(&state.pool, actor.owner_id(), &new).await?,
    ))
}

async fn update_template(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<Uuid>,
    Json(patch): Json<QuestionnaireTemplatePatch>,
) -> Result<Json<QuestionnaireTemplate>, ApiError> {
    let template = db::templates::update_template(&state.pool, actor.owner_id(), id, &patch)
        .await?
        .ok_or(ApiError::NotFound("questionnaire template"))?;
    Ok(Json(template))
}

async fn delete_template(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if !db::templates::delete_template(&state.pool, actor.owner_id(), id).await? {
        return Err(ApiError::NotFound("questionnaire template"));
    }
    Ok(Json(serde_json::json!({ "deleted": true })))
}

async fn list_publishes(
    State(state): State<AppState>,
    actor: Actor,
    Query(query): Query<StatusQuery>,
) -> Result<Json<Vec<PublishQuestionnaire>>, ApiError> {
    Ok(Json(
        db::templates::list_publishes(&state.pool, actor.owner_id(), query.status).await?,
    ))
}

async fn get_publish(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<Uuid>,
) -> Result<Json<PublishQuestionnaire>, ApiError> {
    let publish = db::templates::get_publish(&state.pool, actor.owner_id(), id)
        .await?
        .ok_or(ApiError::NotFound("publish questionnaire"))?;
    Ok(Json(publish))
}

async fn create_publish(
    State(state): State<AppState>,
    actor: Actor,
    Json(new): Json<NewPublishQuestionnaire>,
) -> Result<Json<PublishQuestionnaire>, ApiError> {
    require(!new.code.trim().is_empty(), "publish code is required")?;
    require(!new.display_name.trim().is_empty(), "display name is required")?;
    // Calendar-driven publishes are meaningless without a calendar.
    if new.publish_type == Some(PublishType::AsPerCalendar) {
        require(
            new.frequency_calendar_id.is_some(),
            "a frequency calendar is required when publishing per calendar",
        )?;
    }
    // The template must be visible to this owner.
    db::templates::get_template(&state.pool, actor.owner_id(), new.template_id)
        .await?
        .ok_or_else(|| ApiError::Unprocessable("template does not exist".to_string()))?;
    Ok(Json(
        db::templates::create_publish(&state.pool, actor.owner_id(), &new).await?,
    ))
}

async fn update_publish(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<Uuid>,
    Json(patch): Json<PublishQuestionnairePatch>,
) -> Result<Json<PublishQuestionnaire>, ApiError> {
    let publish = db::templates::update_publish(&state.pool, actor.owner_id(), id, &patch)
        .await?
        .ok_or(ApiError::NotFound("publish questionnaire"))?;
    Ok(Json(publish))
}

async fn delete_publish(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if !db::templates::delete_publish(&state.pool, actor.owner_id(), id).await? {
        return Err(ApiError::NotFound("publish questionnaire"));
    }
    Ok(Json(serde_json::json!({ "deleted": true })))
}
