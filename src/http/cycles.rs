use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use uuid::Uuid;

use crate::db;
use crate::models::{
    AppraisalCycle, AppraisalCyclePatch, FrequencyCalendar, FrequencyCalendarDetail,
    FrequencyCalendarDetailPatch, FrequencyCalendarPatch, NewAppraisalCycle, NewFrequencyCalendar,
    NewFrequencyCalendarDetail,
};

use super::error::{require, ApiError};
use super::org::StatusQuery;
use super::{Actor, AppState};

pub(crate) fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/appraisal-cycles", get(list_cycles).post(create_cycle))
        .route(
            "/api/appraisal-cycles/{id}",
            get(get_cycle).put(update_cycle).delete(delete_cycle),
        )
        .route(
            "/api/frequency-calendars",
            get(list_calendars).post(create_calendar),
        )
        .route(
            "/api/frequency-calendars/{id}",
            get(get_calendar).put(update_calendar).delete(delete_calendar),
        )
        .route(
            "/api/frequency-calendar-details",
            get(list_details).post(create_detail),
        )
        .route(
            "/api/frequency-calendar-details/{id}",
            get(get_detail).put(update_detail).delete(delete_detail),
        )
}

async fn list_cycles(
    State(state): State<AppState>,
    actor: Actor,
    Query(query): Query<StatusQuery>,
) -> Result<Json<Vec<AppraisalCycle>>, ApiError> {
    Ok(Json(
        db::cycles::list_cycles(&state.pool, actor.owner_id(), query.status).await?,
    ))
}

async fn get_cycle(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<Uuid>,
) -> Result<Json<AppraisalCycle>, ApiError> {
    let cycle = db::cycles::get_cycle(&state.pool, actor.owner_id(), id)
        .await?
        .ok_or(ApiError::NotFound("appraisal cycle"))?;
    Ok(Json(cycle))
}

async fn create_cycle(
    State(state): State<AppState>,
    actor: Actor,
    Json(new): Json<NewAppraisalCycle>,
) -> Result<Json<AppraisalCycle>, ApiError> {
    require(!new.code.trim().is_empty(), "appraisal cycle code is required")?;
    require(!new.description.trim().is_empty(), "description is required")?;
    require(new.to_date >= new.from_date, "to_date must not precede from_date")?;
    Ok(Json(
        db::cycles::create_cycle(&state.pool, actor.owner_id(), &new).await?,
    ))
}

async fn update_cycle(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<Uuid>,
    Json(patch): Json<AppraisalCyclePatch>,
) -> Result<Json<AppraisalCycle>, ApiError> {
    if let (Some(from), Some(to)) = (patch.from_date, patch.to_date) {
        require(to >= from, "to_date must not precede from_date")?;
    }
    let cycle = db::cycles::update_cycle(&state.pool, actor.owner_id(), id, &patch)
        .await?
        .ok_or(ApiError::NotFound("appraisal cycle"))?;
    Ok(Json(cycle))
}

async fn delete_cycle(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if !db::cycles::delete_cycle(&state.pool, actor.owner_id(), id).await? {
        return Err(ApiError::NotFound("appraisal cycle"));
    }
    Ok(Json(serde_json::json!({ "deleted": true })))
}

async fn list_calendars(
    State(state): State<AppState>,
    actor: Actor,
    Query(query): Query<StatusQuery>,
) -> Result<Json<Vec<FrequencyCalendar>>, ApiError> {
    Ok(Json(
        db::cycles::list_calendars(&state.pool, actor.owner_id(), query.status).await?,
    ))
}

async fn get_calendar(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<Uuid>,
) -> Result<Json<FrequencyCalendar>, ApiError> {
    let calendar = db::cycles::get_calendar(&state.pool, actor.owner_id(), id)
        .await?
        .ok_or(ApiError::NotFound("frequency calendar"))?;
    Ok(Json(calendar))
}

async fn create_calendar(
    State(state): State<AppState>,
    actor: Actor,
    Json(new): Json<NewFrequencyCalendar>,
) -> Result<Json<FrequencyCalendar>, ApiError> {
    require(!new.code.trim().is_empty(), "frequency calendar code is required")?;
    require(!new.description.trim().is_empty(), "description is required")?;
    Ok(Json(
        db::cycles::create_calendar(&state.pool, actor.owner_id(), &new).await?,
    ))
}

async fn update_calendar(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<Uuid>,
    Json(patch): Json<FrequencyCalendarPatch>,
) -> Result<Json<FrequencyCalendar>, ApiError> {
    let calendar = db::cycles::update_calendar(&state.pool, actor.owner_id(), id, &patch)
        .await?
        .ok_or(ApiError::NotFound("frequency calendar"))?;
    Ok(Json(calendar))
}

async fn delete_calendar(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if !db::cycles::delete_calendar(&state.pool, actor.owner_id(), id).await? {
        return Err(ApiError::NotFound("frequency calendar"));
    }
    Ok(Json(serde_json::json!({ "deleted": true })))
}

#[derive(Debug, Default, Deserialize)]
struct DetailQuery {
    calendar_id: Option<Uuid>,
}

async fn list_details(
    State(state): State<AppState>,
    actor: Actor,
    Query(query): Query<DetailQuery>,
) -> Result<Json<Vec<FrequencyCalendarDetail>>, ApiError> {
    Ok(Json(
        db::cycles::list_details(&state.pool, actor.owner_id(), query.calendar_id).await?,
    ))
}

async fn get_detail(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<Uuid>,
) -> Result<Json<FrequencyCalendarDetail>, ApiError> {
    let detail = db::cycles::get_detail(&state.pool, actor.owner_id(), id)
        .await?
        .ok_or(ApiError::NotFound("frequency calendar detail"))?;
    Ok(Json(detail))
}

async fn create_detail(
    State(state): State<AppState>,
    actor: Actor,
    Json(new): Json<NewFrequencyCalendarDetail>,
) -> Result<Json<FrequencyCalendarDetail>, ApiError> {
    require(!new.display_name.trim().is_empty(), "display name is required")?;
    require(new.end_date >= new.start_date, "end_date must not precede start_date")?;
    Ok(Json(
        db::cycles::create_detail(&state.pool, actor.owner_id(), &new).await?,
    ))
}

async fn update_detail(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<Uuid>,
    Json(patch): Json<FrequencyCalendarDetailPatch>,
) -> Result<Json<FrequencyCalendarDetail>, ApiError> {
    if let (Some(start), Some(end)) = (patch.start_date, patch.end_date) {
        require(end >= start, "end_date must not precede start_date")?;
    }
    let detail = db::cycles::update_detail(&state.pool, actor.owner_id(), id, &patch)
        .await?
        .ok_or(ApiError::NotFound("frequency calendar detail"))?;
    Ok(Json(detail))
}

async fn delete_detail(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if !db::cycles::delete_detail(&state.pool, actor.owner_id(), id).await? {
        return Err(ApiError::NotFound("frequency calendar detail"));
    }
    Ok(Json(serde_json::json!({ "deleted": true })))
}
