use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use uuid::Uuid;

use crate::db;
use crate::models::{NewUser, User, UserFilter, UserPatch};

use super::error::ApiError;
use super::{Actor, AppState};

pub(crate) fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/users", get(list_users).post(create_user))
        .route("/api/users/lookup", get(lookup_user))
        .route(
            "/api/users/{id}",
            get(get_user).put(update_user).delete(delete_user),
        )
        .route("/api/users/{id}/reports", get(list_reports))
}

async fn list_users(
    State(state): State<AppState>,
    actor: Actor,
    Query(mut filter): Query<UserFilter>,
) -> Result<Json<Vec<User>>, ApiError> {
    // An actor attached to a company only ever sees that company's people;
    // the query-string company filter is for company-less operators.
    if let Some(company_id) = actor.company_id() {
        filter.company_id = Some(company_id);
    }
    Ok(Json(db::people::list_users(&state.pool, &filter).await?))
}

#[derive(Debug, Deserialize)]
struct LookupQuery {
    email: String,
}

async fn lookup_user(
    State(state): State<AppState>,
    _actor: Actor,
    Query(query): Query<LookupQuery>,
) -> Result<Json<User>, ApiError> {
    let user = db::people::get_user_by_email(&state.pool, &query.email)
        .await?
        .ok_or(ApiError::NotFound("user"))?;
    Ok(Json(user))
}

async fn get_user(
    State(state): State<AppState>,
    _actor: Actor,
    Path(id): Path<Uuid>,
) -> Result<Json<User>, ApiError> {
    let user = db::people::get_user(&state.pool, id)
        .await?
        .ok_or(ApiError::NotFound("user"))?;
    Ok(Json(user))
}

async fn list_reports(
    State(state): State<AppState>,
    _actor: Actor,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<User>>, ApiError> {
    Ok(Json(db::people::list_users_by_manager(&state.pool, id).await?))
}

async fn create_user(
    State(state): State<AppState>,
    actor: Actor,
    Json(mut new): Json<NewUser>,
) -> Result<Json<User>, ApiError> {
    // New people land in the creator's company unless one is given.
    if new.company_id.is_none() {
        new.company_id = actor.company_id();
    }
    Ok(Json(db::people::create_user(&state.pool, &new, actor.owner_id()).await?))
}

async fn update_user(
    State(state): State<AppState>,
    _actor: Actor,
    Path(id): Path<Uuid>,
    Json(patch): Json<UserPatch>,
) -> Result<Json<User>, ApiError> {
    let user = db::people::update_user(&state.pool, id, &patch)
        .await?
        .ok_or(ApiError::NotFound("user"))?;
    Ok(Json(user))
}

async fn delete_user(
    State(state): State<AppState>,
    _actor: Actor,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if !db::people::delete_user(&state.pool, id).await? {
        return Err(ApiError::NotFound("user"));
    }
    Ok(Json(serde_json::json!({ "deleted": true })))
}
