use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Json, Router};
use uuid::Uuid;

use crate::db;
use crate::models::{
    AppraisalGroup, AppraisalGroupMember, GroupPatch, GroupWithMembers, NewGroup, NewGroupMember,
    User,
};

use super::error::{require, ApiError};
use super::org::StatusQuery;
use super::{Actor, AppState};

pub(crate) fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/appraisal-groups", get(list_groups).post(create_group))
        .route("/api/appraisal-groups/with-members", get(list_with_members))
        .route(
            "/api/appraisal-groups/{id}",
            get(get_group).put(update_group).delete(delete_group),
        )
        .route(
            "/api/appraisal-groups/{id}/members",
            get(list_members).post(add_member),
        )
        .route(
            "/api/appraisal-groups/{id}/members/{user_id}",
            axum::routing::delete(remove_member),
        )
}

async fn list_groups(
    State(state): State<AppState>,
    actor: Actor,
    Query(query): Query<StatusQuery>,
) -> Result<Json<Vec<AppraisalGroup>>, ApiError> {
    Ok(Json(
        db::groups::list_groups(&state.pool, actor.owner_id(), query.status).await?,
    ))
}

async fn list_with_members(
    State(state): State<AppState>,
    actor: Actor,
) -> Result<Json<Vec<GroupWithMembers>>, ApiError> {
    Ok(Json(
        db::groups::groups_with_members(&state.pool, actor.owner_id()).await?,
    ))
}

async fn get_group(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<Uuid>,
) -> Result<Json<AppraisalGroup>, ApiError> {
    let group = db::groups::get_group(&state.pool, actor.owner_id(), id)
        .await?
        .ok_or(ApiError::NotFound("appraisal group"))?;
    Ok(Json(group))
}

async fn create_group(
    State(state): State<AppState>,
    actor: Actor,
    Json(mut new): Json<NewGroup>,
) -> Result<Json<AppraisalGroup>, ApiError> {
    require(!new.name.trim().is_empty(), "group name is required")?;
    if new.company_id.is_none() {
        new.company_id = actor.company_id();
    }
    Ok(Json(
        db::groups::create_group(&state.pool, actor.owner_id(), &new).await?,
    ))
}

async fn update_group(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<Uuid>,
    Json(patch): Json<GroupPatch>,
) -> Result<Json<AppraisalGroup>, ApiError> {
    let group = db::groups::update_group(&state.pool, actor.owner_id(), id, &patch)
        .await?
        .ok_or(ApiError::NotFound("appraisal group"))?;
    Ok(Json(group))
}

async fn delete_group(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if !db::groups::delete_group(&state.pool, actor.owner_id(), id).await? {
        return Err(ApiError::NotFound("appraisal group"));
    }
    Ok(Json(serde_json::json!({ "deleted": true })))
}

async fn list_members(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<User>>, ApiError> {
    db::groups::get_group(&state.pool, actor.owner_id(), id)
        .await?
        .ok_or(ApiError::NotFound("appraisal group"))?;
    Ok(Json(db::groups::list_member_users(&state.pool, id).await?))
}

async fn add_member(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<Uuid>,
    Json(new): Json<NewGroupMember>,
) -> Result<Json<AppraisalGroupMember>, ApiError> {
    db::groups::get_group(&state.pool, actor.owner_id(), id)
        .await?
        .ok_or(ApiError::NotFound("appraisal group"))?;
    db::people::get_user(&state.pool, new.user_id)
        .await?
        .ok_or_else(|| ApiError::Unprocessable("user does not exist".to_string()))?;

    let member = db::groups::add_member(&state.pool, id, new.user_id, actor.owner_id())
        .await?
        .ok_or_else(|| ApiError::Conflict("user is already a member of this group".to_string()))?;
    Ok(Json(member))
}

async fn remove_member(
    State(state): State<AppState>,
    actor: Actor,
    Path((id, user_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<serde_json::Value>, ApiError> {
    db::groups::get_group(&state.pool, actor.owner_id(), id)
        .await?
        .ok_or(ApiError::NotFound("appraisal group"))?;
    if !db::groups::remove_member(&state.pool, id, user_id).await? {
        return Err(ApiError::NotFound("group member"));
    }
    Ok(Json(serde_json::json!({ "deleted": true })))
}
