use std::collections::HashMap;

use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use crate::db;
use crate::models::{
    AppraisalStatus, DetailTiming, EvaluationFilter, InitiatedAppraisal, InitiatedAppraisalPatch,
    NewDetailTiming, NewInitiatedAppraisal, PublishType, ScheduledAppraisalTask,
};
use crate::report::{self, CompletionSummary};
use crate::schedule;
use crate::sweep;

use super::error::{require, ApiError};
use super::{Actor, AppState};

pub(crate) fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/initiated-appraisals",
            get(list_appraisals).post(create_appraisal),
        )
        .route(
            "/api/initiated-appraisals/{id}",
            get(get_appraisal).put(update_appraisal),
        )
        .route("/api/initiated-appraisals/{id}/activate", post(activate))
        .route("/api/initiated-appraisals/{id}/cancel", post(cancel))
        .route("/api/initiated-appraisals/{id}/close", post(close))
        .route("/api/initiated-appraisals/{id}/tasks", get(list_tasks))
        .route(
            "/api/initiated-appraisals/{id}/timings",
            get(list_timings).put(upsert_timing),
        )
        .route("/api/initiated-appraisals/{id}/completion", get(completion))
        .route("/api/initiated-appraisals/{id}/remind", post(manual_remind))
}

#[derive(Debug, Default, Deserialize)]
struct AppraisalStatusQuery {
    status: Option<AppraisalStatus>,
}

async fn list_appraisals(
    State(state): State<AppState>,
    actor: Actor,
    Query(query): Query<AppraisalStatusQuery>,
) -> Result<Json<Vec<InitiatedAppraisal>>, ApiError> {
    Ok(Json(
        db::appraisals::list_appraisals(&state.pool, actor.owner_id(), query.status).await?,
    ))
}

async fn get_appraisal(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<Uuid>,
) -> Result<Json<InitiatedAppraisal>, ApiError> {
    let appraisal = db::appraisals::get_appraisal(&state.pool, actor.owner_id(), id)
        .await?
        .ok_or(ApiError::NotFound("initiated appraisal"))?;
    Ok(Json(appraisal))
}

async fn create_appraisal(
    State(state): State<AppState>,
    actor: Actor,
    Json(new): Json<NewInitiatedAppraisal>,
) -> Result<Json<InitiatedAppraisal>, ApiError> {
    db::groups::get_group(&state.pool, actor.owner_id(), new.appraisal_group_id)
        .await?
        .ok_or_else(|| ApiError::Unprocessable("appraisal group does not exist".to_string()))?;
    if new.publish_type == Some(PublishType::AsPerCalendar) {
        require(
            new.frequency_calendar_id.is_some(),
            "a frequency calendar is required when publishing per calendar",
        )?;
    }
    Ok(Json(
        db::appraisals::create_appraisal(&state.pool, actor.owner_id(), &new).await?,
    ))
}

async fn update_appraisal(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<Uuid>,
    Json(patch): Json<InitiatedAppraisalPatch>,
) -> Result<Json<InitiatedAppraisal>, ApiError> {
    let current = db::appraisals::get_appraisal(&state.pool, actor.owner_id(), id)
        .await?
        .ok_or(ApiError::NotFound("initiated appraisal"))?;
    if current.status != AppraisalStatus::Draft {
        return Err(ApiError::Conflict(
            "only draft appraisals can be edited".to_string(),
        ));
    }
    let appraisal = db::appraisals::update_appraisal(&state.pool, actor.owner_id(), id, &patch)
        .await?
        .ok_or(ApiError::NotFound("initiated appraisal"))?;
    Ok(Json(appraisal))
}

/// Materialize the task plan and flip the appraisal to active. The status
/// gate makes double activation impossible.
async fn activate(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<ScheduledAppraisalTask>>, ApiError> {
    let appraisal = db::appraisals::get_appraisal(&state.pool, actor.owner_id(), id)
        .await?
        .ok_or(ApiError::NotFound("initiated appraisal"))?;
    if appraisal.status != AppraisalStatus::Draft {
        return Err(ApiError::Conflict(
            "only draft appraisals can be activated".to_string(),
        ));
    }

    let calendar_driven = appraisal.publish_type == PublishType::AsPerCalendar
        && appraisal.frequency_calendar_id.is_some();
    let details_with_timings = if calendar_driven {
        let calendar_id = appraisal
            .frequency_calendar_id
            .ok_or_else(|| ApiError::Unprocessable("appraisal has no frequency calendar".to_string()))?;
        let details = db::cycles::active_details_for_calendar(&state.pool, calendar_id).await?;
        if details.is_empty() {
            return Err(ApiError::Unprocessable(
                "frequency calendar has no active periods".to_string(),
            ));
        }
        let timings: HashMap<Uuid, DetailTiming> =
            db::appraisals::list_detail_timings(&state.pool, appraisal.id)
                .await?
                .into_iter()
                .map(|t| (t.frequency_calendar_detail_id, t))
                .collect();
        details
            .into_iter()
            .map(|detail| {
                let timing = timings.get(&detail.id).cloned();
                (detail, timing)
            })
            .collect()
    } else {
        Vec::new()
    };

    let today = Utc::now().date_naive();
    let planned = schedule::plan_appraisal(&appraisal, &details_with_timings, today);
    db::appraisals::insert_tasks(&state.pool, appraisal.id, &planned).await?;

    if !db::appraisals::transition_appraisal(
        &state.pool,
        appraisal.id,
        &[AppraisalStatus::Draft],
        AppraisalStatus::Active,
    )
    .await?
    {
        return Err(ApiError::Conflict(
            "appraisal changed state during activation".to_string(),
        ));
    }

    Ok(Json(db::appraisals::list_tasks(&state.pool, appraisal.id).await?))
}

async fn cancel(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<Uuid>,
) -> Result<Json<InitiatedAppraisal>, ApiError> {
    db::appraisals::get_appraisal(&state.pool, actor.owner_id(), id)
        .await?
        .ok_or(ApiError::NotFound("initiated appraisal"))?;
    if !db::appraisals::transition_appraisal(
        &state.pool,
        id,
        &[AppraisalStatus::Draft, AppraisalStatus::Active],
        AppraisalStatus::Cancelled,
    )
    .await?
    {
        return Err(ApiError::Conflict(
            "appraisal is already closed or cancelled".to_string(),
        ));
    }
    let appraisal = db::appraisals::get_appraisal(&state.pool, actor.owner_id(), id)
        .await?
        .ok_or(ApiError::NotFound("initiated appraisal"))?;
    Ok(Json(appraisal))
}

/// Manual close: expire everything unfinished across all periods.
async fn close(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<Uuid>,
) -> Result<Json<InitiatedAppraisal>, ApiError> {
    db::appraisals::get_appraisal(&state.pool, actor.owner_id(), id)
        .await?
        .ok_or(ApiError::NotFound("initiated appraisal"))?;
    if !db::appraisals::transition_appraisal(
        &state.pool,
        id,
        &[AppraisalStatus::Active],
        AppraisalStatus::Closed,
    )
    .await?
    {
        return Err(ApiError::Conflict("only active appraisals can be closed".to_string()));
    }
    db::evaluations::expire_all_unfinished(&state.pool, id).await?;
    let appraisal = db::appraisals::get_appraisal(&state.pool, actor.owner_id(), id)
        .await?
        .ok_or(ApiError::NotFound("initiated appraisal"))?;
    Ok(Json(appraisal))
}

async fn list_tasks(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<ScheduledAppraisalTask>>, ApiError> {
    db::appraisals::get_appraisal(&state.pool, actor.owner_id(), id)
        .await?
        .ok_or(ApiError::NotFound("initiated appraisal"))?;
    Ok(Json(db::appraisals::list_tasks(&state.pool, id).await?))
}

async fn list_timings(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<DetailTiming>>, ApiError> {
    db::appraisals::get_appraisal(&state.pool, actor.owner_id(), id)
        .await?
        .ok_or(ApiError::NotFound("initiated appraisal"))?;
    Ok(Json(db::appraisals::list_detail_timings(&state.pool, id).await?))
}

async fn upsert_timing(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<Uuid>,
    Json(new): Json<NewDetailTiming>,
) -> Result<Json<DetailTiming>, ApiError> {
    let appraisal = db::appraisals::get_appraisal(&state.pool, actor.owner_id(), id)
        .await?
        .ok_or(ApiError::NotFound("initiated appraisal"))?;
    if appraisal.status != AppraisalStatus::Draft {
        return Err(ApiError::Conflict(
            "timings can only change while the appraisal is a draft".to_string(),
        ));
    }
    Ok(Json(
        db::appraisals::upsert_detail_timing(&state.pool, id, &new).await?,
    ))
}

async fn completion(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<Uuid>,
) -> Result<Json<CompletionSummary>, ApiError> {
    let appraisal = db::appraisals::get_appraisal(&state.pool, actor.owner_id(), id)
        .await?
        .ok_or(ApiError::NotFound("initiated appraisal"))?;

    let evaluations = db::evaluations::list_evaluations(
        &state.pool,
        &EvaluationFilter {
            initiated_appraisal_id: Some(appraisal.id),
            ..EvaluationFilter::default()
        },
    )
    .await?;

    let mut period_names = HashMap::new();
    if let Some(calendar_id) = appraisal.frequency_calendar_id {
        for detail in db::cycles::active_details_for_calendar(&state.pool, calendar_id).await? {
            period_names.insert(detail.id, detail.display_name);
        }
    }

    Ok(Json(report::summarize(appraisal.id, &evaluations, &period_names)))
}

#[derive(Debug, Deserialize)]
struct ManualReminder {
    employee_id: Uuid,
}

async fn manual_remind(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<Uuid>,
    Json(request): Json<ManualReminder>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let appraisal = db::appraisals::get_appraisal(&state.pool, actor.owner_id(), id)
        .await?
        .ok_or(ApiError::NotFound("initiated appraisal"))?;
    let employee = db::people::get_user(&state.pool, request.employee_id)
        .await?
        .ok_or(ApiError::NotFound("user"))?;

    let sent = sweep::send_manual_reminder(
        &state.pool,
        state.config.smtp.as_ref(),
        &appraisal,
        &employee,
    )
    .await?;
    Ok(Json(serde_json::json!({ "sent": sent })))
}
