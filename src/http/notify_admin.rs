use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use uuid::Uuid;

use crate::db;
use crate::models::{
    CalendarCredential, CalendarCredentialPatch, EmailConfig, EmailConfigPatch, EmailTemplate,
    EmailTemplatePatch, NewCalendarCredential, NewEmailConfig, NewEmailTemplate,
};

use super::error::{require, ApiError};
use super::{Actor, AppState};

pub(crate) fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/email-configs", get(list_configs).post(create_config))
        .route(
            "/api/email-configs/{id}",
            get(get_config).put(update_config).delete(delete_config),
        )
        .route("/api/email-templates", get(list_templates).post(create_template))
        .route(
            "/api/email-templates/{id}",
            get(get_template).put(update_template).delete(delete_template),
        )
        .route(
            "/api/calendar-credentials",
            get(list_credentials).post(upsert_credential),
        )
        .route(
            "/api/calendar-credentials/{id}",
            axum::routing::put(update_credential).delete(delete_credential),
        )
}

async fn list_configs(
    State(state): State<AppState>,
    _actor: Actor,
) -> Result<Json<Vec<EmailConfig>>, ApiError> {
    Ok(Json(db::notify::list_email_configs(&state.pool).await?))
}

async fn get_config(
    State(state): State<AppState>,
    _actor: Actor,
    Path(id): Path<Uuid>,
) -> Result<Json<EmailConfig>, ApiError> {
    let config = db::notify::get_email_config(&state.pool, id)
        .await?
        .ok_or(ApiError::NotFound("email config"))?;
    Ok(Json(config))
}

async fn create_config(
    State(state): State<AppState>,
    actor: Actor,
    Json(mut new): Json<NewEmailConfig>,
) -> Result<Json<EmailConfig>, ApiError> {
    require(!new.smtp_host.trim().is_empty(), "SMTP host is required")?;
    require(new.smtp_port > 0, "SMTP port is required")?;
    require(new.from_email.contains('@'), "a valid from address is required")?;
    if new.company_id.is_none() {
        new.company_id = actor.company_id();
    }
    Ok(Json(db::notify::create_email_config(&state.pool, &new).await?))
}

async fn update_config(
    State(state): State<AppState>,
    _actor: Actor,
    Path(id): Path<Uuid>,
    Json(patch): Json<EmailConfigPatch>,
) -> Result<Json<EmailConfig>, ApiError> {
    let config = db::notify::update_email_config(&state.pool, id, &patch)
        .await?
        .ok_or(ApiError::NotFound("email config"))?;
    Ok(Json(config))
}

async fn delete_config(
    State(state): State<AppState>,
    _actor: Actor,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if !db::notify::delete_email_config(&state.pool, id).await? {
        return Err(ApiError::NotFound("email config"));
    }
    Ok(Json(serde_json::json!({ "deleted": true })))
}

async fn list_templates(
    State(state): State<AppState>,
    _actor: Actor,
) -> Result<Json<Vec<EmailTemplate>>, ApiError> {
    Ok(Json(db::notify::list_email_templates(&state.pool).await?))
}

async fn get_template(
    State(state): State<AppState>,
    _actor: Actor,
    Path(id): Path<Uuid>,
) -> Result<Json<EmailTemplate>, ApiError> {
    let template = db::notify::get_email_template(&state.pool, id)
        .await?
        .ok_or(ApiError::NotFound("email template"))?;
    Ok(Json(template))
}

async fn create_template(
    State(state): State<AppState>,
    _actor: Actor,
    Json(new): Json<NewEmailTemplate>,
) -> Result<Json<EmailTemplate>, ApiError> {
    require(!new.name.trim().is_empty(), "template name is required")?;
    require(!new.subject.trim().is_empty(), "subject is required")?;
    require(!new.body.trim().is_empty(), "body is required")?;
    require(!new.template_type.trim().is_empty(), "template type is required")?;
    Ok(Json(db::notify::create_email_template(&state.pool, &new).await?))
}

async fn update_template(
    State(state): State<AppState>,
    _actor: Actor,
    Path(id): Path<Uuid>,
    Json(patch): Json<EmailTemplatePatch>,
) -> Result<Json<EmailTemplate>, ApiError> {
    let template = db::notify::update_email_template(&state.pool, id, &patch)
        .await?
        .ok_or(ApiError::NotFound("email template"))?;
    Ok(Json(template))
}

async fn delete_template(
    State(state): State<AppState>,
    _actor: Actor,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if !db::notify::delete_email_template(&state.pool, id).await? {
        return Err(ApiError::NotFound("email template"));
    }
    Ok(Json(serde_json::json!({ "deleted": true })))
}

#[derive(Debug, Deserialize)]
struct CredentialQuery {
    company_id: Option<Uuid>,
}

async fn list_credentials(
    State(state): State<AppState>,
    actor: Actor,
    Query(query): Query<CredentialQuery>,
) -> Result<Json<Vec<CalendarCredential>>, ApiError> {
    let company_id = actor
        .company_id()
        .or(query.company_id)
        .ok_or_else(|| ApiError::Validation("company_id is required".to_string()))?;
    Ok(Json(db::notify::list_credentials(&state.pool, company_id).await?))
}

/// One credential per (company, provider); posting again rotates it.
async fn upsert_credential(
    State(state): State<AppState>,
    _actor: Actor,
    Json(new): Json<NewCalendarCredential>,
) -> Result<Json<CalendarCredential>, ApiError> {
    require(!new.client_id.trim().is_empty(), "client id is required")?;
    require(!new.client_secret.trim().is_empty(), "client secret is required")?;
    require(!new.refresh_token.trim().is_empty(), "refresh token is required")?;
    Ok(Json(db::notify::upsert_credential(&state.pool, &new).await?))
}

async fn update_credential(
    State(state): State<AppState>,
    _actor: Actor,
    Path(id): Path<Uuid>,
    Json(patch): Json<CalendarCredentialPatch>,
) -> Result<Json<CalendarCredential>, ApiError> {
    let credential = db::notify::update_credential(&state.pool, id, &patch)
        .await?
        .ok_or(ApiError::NotFound("calendar credential"))?;
    Ok(Json(credential))
}

async fn delete_credential(
    State(state): State<AppState>,
    _actor: Actor,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if !db::notify::delete_credential(&state.pool, id).await? {
        return Err(ApiError::NotFound("calendar credential"));
    }
    Ok(Json(serde_json::json!({ "deleted": true })))
}
