use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use uuid::Uuid;

use crate::db;
use crate::models::{
    CodeEntryPatch, CodeKind, Company, CompanyPatch, Location, LocationPatch, NewCodeEntry,
    NewCompany, NewLocation, Status,
};

use super::error::{require, ApiError};
use super::{Actor, AppState};

#[derive(Debug, Default, Deserialize)]
pub(crate) struct StatusQuery {
    pub status: Option<Status>,
}

pub(crate) fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/companies", get(list_companies).post(create_company))
        .route("/api/companies/by-url/{slug}", get(get_company_by_url))
        .route(
            "/api/companies/{id}",
            get(get_company).put(update_company).delete(delete_company),
        )
        .route("/api/locations", get(list_locations).post(create_location))
        .route(
            "/api/locations/{id}",
            get(get_location).put(update_location).delete(delete_location),
        )
        .merge(code_entry_routes("/api/levels", CodeKind::Level))
        .merge(code_entry_routes("/api/grades", CodeKind::Grade))
        .merge(code_entry_routes("/api/departments", CodeKind::Department))
        .merge(code_entry_routes(
            "/api/review-frequencies",
            CodeKind::ReviewFrequency,
        ))
}

async fn list_companies(
    State(state): State<AppState>,
    Query(query): Query<StatusQuery>,
) -> Result<Json<Vec<Company>>, ApiError> {
    Ok(Json(db::org::list_companies(&state.pool, query.status).await?))
}

async fn get_company(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Company>, ApiError> {
    let company = db::org::get_company(&state.pool, id)
        .await?
        .ok_or(ApiError::NotFound("company"))?;
    Ok(Json(company))
}

async fn get_company_by_url(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<Company>, ApiError> {
    let company = db::org::get_company_by_url(&state.pool, &slug)
        .await?
        .ok_or(ApiError::NotFound("company"))?;
    Ok(Json(company))
}

async fn create_company(
    State(state): State<AppState>,
    Json(new): Json<NewCompany>,
) -> Result<Json<Company>, ApiError> {
    require(!new.name.trim().is_empty(), "company name is required")?;
    Ok(Json(db::org::create_company(&state.pool, &new).await?))
}

async fn update_company(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(patch): Json<CompanyPatch>,
) -> Result<Json<Company>, ApiError> {
    let company = db::org::update_company(&state.pool, id, &patch)
        .await?
        .ok_or(ApiError::NotFound("company"))?;
    Ok(Json(company))
}

async fn delete_company(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if !db::org::delete_company(&state.pool, id).await? {
        return Err(ApiError::NotFound("company"));
    }
    Ok(Json(serde_json::json!({ "deleted": true })))
}

async fn list_locations(
    State(state): State<AppState>,
    Query(query): Query<StatusQuery>,
) -> Result<Json<Vec<Location>>, ApiError> {
    Ok(Json(db::org::list_locations(&state.pool, query.status).await?))
}

async fn get_location(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Location>, ApiError> {
    let location = db::org::get_location(&state.pool, id)
        .await?
        .ok_or(ApiError::NotFound("location"))?;
    Ok(Json(location))
}

async fn create_location(
    State(state): State<AppState>,
    Json(new): Json<NewLocation>,
) -> Result<Json<Location>, ApiError> {
    require(!new.code.trim().is_empty(), "location code is required")?;
    require(!new.name.trim().is_empty(), "location name is required")?;
    Ok(Json(db::org::create_location(&state.pool, &new).await?))
}

async fn update_location(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(patch): Json<LocationPatch>,
) -> Result<Json<Location>, ApiError> {
    let location = db::org::update_location(&state.pool, id, &patch)
        .await?
        .ok_or(ApiError::NotFound("location"))?;
    Ok(Json(location))
}

async fn delete_location(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if !db::org::delete_location(&state.pool, id).await? {
        return Err(ApiError::NotFound("location"));
    }
    Ok(Json(serde_json::json!({ "deleted": true })))
}

/// Levels, grades, departments, and review frequencies share one owner-scoped
/// handler set; only the backing table differs.
fn code_entry_routes(prefix: &str, kind: CodeKind) -> Router<AppState> {
    let list = move |State(state): State<AppState>, actor: Actor, Query(query): Query<StatusQuery>| async move {
        let entries =
            db::org::list_code_entries(&state.pool, kind, actor.owner_id(), query.status).await?;
        Ok::<_, ApiError>(Json(entries))
    };
    let create = move |State(state): State<AppState>, actor: Actor, Json(new): Json<NewCodeEntry>| async move {
        require(
            !new.code.trim().is_empty(),
            &format!("{} code is required", kind.label()),
        )?;
        require(
            !new.description.trim().is_empty(),
            &format!("{} description is required", kind.label()),
        )?;
        let entry = db::org::create_code_entry(&state.pool, kind, actor.owner_id(), &new).await?;
        Ok::<_, ApiError>(Json(entry))
    };
    let get_one = move |State(state): State<AppState>, actor: Actor, Path(id): Path<Uuid>| async move {
        let entry = db::org::get_code_entry(&state.pool, kind, actor.owner_id(), id)
            .await?
            .ok_or(ApiError::NotFound(kind.label()))?;
        Ok::<_, ApiError>(Json(entry))
    };
    let update = move |State(state): State<AppState>,
                       actor: Actor,
                       Path(id): Path<Uuid>,
                       Json(patch): Json<CodeEntryPatch>| async move {
        let entry = db::org::update_code_entry(&state.pool, kind, actor.owner_id(), id, &patch)
            .await?
            .ok_or(ApiError::NotFound(kind.label()))?;
        Ok::<_, ApiError>(Json(entry))
    };
    let delete = move |State(state): State<AppState>, actor: Actor, Path(id): Path<Uuid>| async move {
        if !db::org::delete_code_entry(&state.pool, kind, actor.owner_id(), id).await? {
            return Err(ApiError::NotFound(kind.label()));
        }
        Ok::<_, ApiError>(Json(serde_json::json!({ "deleted": true })))
    };

    Router::new()
        .route(prefix, get(list).post(create))
        .route(
            &format!("{prefix}/{{id}}"),
            get(get_one).put(update).delete(delete),
        )
}
