use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde::Serialize;
use tracing::warn;
use uuid::Uuid;

use crate::db;
use crate::models::{
    Evaluation, EvaluationFilter, EvaluationStatus, FinalizeRequest, ManagerSubmission,
    MeetingCompletion, MeetingRequest, SelfSubmission, User,
};
use crate::notify::{self, ics, EventOutcome, MeetingEvent, OutboundMail};
use crate::sweep;

use super::error::ApiError;
use super::{Actor, AppState};

pub(crate) fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/evaluations", get(list_evaluations))
        .route("/api/evaluations/{id}", get(get_evaluation))
        .route("/api/evaluations/{id}/self", post(submit_self))
        .route("/api/evaluations/{id}/manager", post(submit_manager))
        .route("/api/evaluations/{id}/meeting", post(schedule_meeting))
        .route("/api/evaluations/{id}/meeting/complete", post(complete_meeting))
        .route("/api/evaluations/{id}/finalize", post(finalize))
}

async fn list_evaluations(
    State(state): State<AppState>,
    _actor: Actor,
    Query(filter): Query<EvaluationFilter>,
) -> Result<Json<Vec<Evaluation>>, ApiError> {
    Ok(Json(db::evaluations::list_evaluations(&state.pool, &filter).await?))
}

async fn get_evaluation(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<Uuid>,
) -> Result<Json<Evaluation>, ApiError> {
    let evaluation = db::evaluations::get_evaluation(&state.pool, id)
        .await?
        .ok_or(ApiError::NotFound("evaluation"))?;
    // The employee's own view hides manager-only material.
    let evaluation = if evaluation.employee_id == actor.user.id {
        evaluation.redacted_for_employee()
    } else {
        evaluation
    };
    Ok(Json(evaluation))
}

fn expect_status(evaluation: &Evaluation, allowed: &[EvaluationStatus]) -> Result<(), ApiError> {
    if allowed.contains(&evaluation.status) {
        return Ok(());
    }
    Err(ApiError::Conflict(format!(
        "evaluation is {}, expected {}",
        evaluation.status,
        allowed
            .iter()
            .map(|s| s.as_str())
            .collect::<Vec<_>>()
            .join(" or ")
    )))
}

async fn load(state: &AppState, id: Uuid) -> Result<Evaluation, ApiError> {
    db::evaluations::get_evaluation(&state.pool, id)
        .await?
        .ok_or(ApiError::NotFound("evaluation"))
}

async fn submit_self(
    State(state): State<AppState>,
    _actor: Actor,
    Path(id): Path<Uuid>,
    Json(submission): Json<SelfSubmission>,
) -> Result<Json<Evaluation>, ApiError> {
    let evaluation = load(&state, id).await?;
    expect_status(&evaluation, &[EvaluationStatus::Pending])?;
    let updated = db::evaluations::submit_self(&state.pool, id, &submission.answers)
        .await?
        .ok_or(ApiError::NotFound("evaluation"))?;
    Ok(Json(updated))
}

async fn submit_manager(
    State(state): State<AppState>,
    _actor: Actor,
    Path(id): Path<Uuid>,
    Json(submission): Json<ManagerSubmission>,
) -> Result<Json<Evaluation>, ApiError> {
    let evaluation = load(&state, id).await?;
    expect_status(&evaluation, &[EvaluationStatus::SelfSubmitted])?;
    let updated = db::evaluations::submit_manager(
        &state.pool,
        id,
        &submission.answers,
        submission.overall_rating,
    )
    .await?
    .ok_or(ApiError::NotFound("evaluation"))?;
    Ok(Json(updated))
}

#[derive(Debug, Serialize)]
struct CalendarInfo {
    provider: &'static str,
    event_id: Option<String>,
    error: Option<String>,
}

#[derive(Debug, Serialize)]
struct MeetingOutcome {
    evaluation: Evaluation,
    calendar: CalendarInfo,
}

/// Book the one-on-one. The evaluation row is updated first; the calendar
/// invite is best-effort and its result is reported alongside.
async fn schedule_meeting(
    State(state): State<AppState>,
    _actor: Actor,
    Path(id): Path<Uuid>,
    Json(request): Json<MeetingRequest>,
) -> Result<Json<MeetingOutcome>, ApiError> {
    let evaluation = load(&state, id).await?;
    expect_status(
        &evaluation,
        &[EvaluationStatus::ManagerSubmitted, EvaluationStatus::MeetingScheduled],
    )?;

    let updated = db::evaluations::schedule_meeting(
        &state.pool,
        id,
        request.scheduled_at,
        request.notes.as_deref(),
    )
    .await?
    .ok_or(ApiError::NotFound("evaluation"))?;

    let calendar = send_meeting_invite(&state, &updated, &request).await;
    Ok(Json(MeetingOutcome {
        evaluation: updated,
        calendar,
    }))
}

async fn send_meeting_invite(
    state: &AppState,
    evaluation: &Evaluation,
    request: &MeetingRequest,
) -> CalendarInfo {
    match try_meeting_invite(state, evaluation, request).await {
        Ok(info) => info,
        Err(err) => {
            warn!(evaluation = %evaluation.id, error = %err, "meeting invite failed");
            CalendarInfo {
                provider: "none",
                event_id: None,
                error: Some(err.to_string()),
            }
        }
    }
}

async fn try_meeting_invite(
    state: &AppState,
    evaluation: &Evaluation,
    request: &MeetingRequest,
) -> anyhow::Result<CalendarInfo> {
    let employee = db::people::get_user(&state.pool, evaluation.employee_id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("employee record is gone"))?;
    let Some(manager) = load_manager(state, evaluation).await? else {
        return Ok(CalendarInfo {
            provider: "none",
            event_id: None,
            error: Some("no manager with an e-mail address on record".to_string()),
        });
    };
    let Some(employee_email) = employee.email.clone() else {
        return Ok(CalendarInfo {
            provider: "none",
            event_id: None,
            error: Some("employee has no e-mail address".to_string()),
        });
    };
    let manager_email = manager.email.clone().unwrap_or_default();

    let event = MeetingEvent::review_meeting(
        &employee.display_name(),
        &employee_email,
        &manager.display_name(),
        &manager_email,
        request.scheduled_at,
        request.duration_minutes.unwrap_or(60),
        request.location.clone(),
        request.notes.as_deref(),
    );

    let company_id = db::appraisals::company_for_appraisal(&state.pool, evaluation.initiated_appraisal_id)
        .await?;
    let Some(company_id) = company_id else {
        return mail_ics_invite(state, evaluation, &event, None).await;
    };

    match state.calendar.create_meeting(&state.pool, company_id, &event).await? {
        EventOutcome::Created { provider, event_id } => Ok(CalendarInfo {
            provider: provider.as_str(),
            event_id,
            error: None,
        }),
        EventOutcome::IcsFallback => mail_ics_invite(state, evaluation, &event, Some(company_id)).await,
    }
}

async fn load_manager(state: &AppState, evaluation: &Evaluation) -> anyhow::Result<Option<User>> {
    let Some(manager_id) = evaluation.manager_id else {
        return Ok(None);
    };
    let manager = db::people::get_user(&state.pool, manager_id).await?;
    Ok(manager.filter(|m| m.email.is_some()))
}

/// ICS fallback: the invite goes out as a mail attachment to both attendees.
async fn mail_ics_invite(
    state: &AppState,
    evaluation: &Evaluation,
    event: &MeetingEvent,
    company_id: Option<Uuid>,
) -> anyhow::Result<CalendarInfo> {
    let settings =
        sweep::smtp_for_company(&state.pool, state.config.smtp.as_ref(), company_id).await?;
    let Some(settings) = settings else {
        return Ok(CalendarInfo {
            provider: "none",
            event_id: None,
            error: Some("no SMTP configuration for the ICS fallback".to_string()),
        });
    };

    let uid = format!("{}@perfcycle", evaluation.id);
    let invite = ics::meeting_invite(event, &uid, Utc::now());
    for (email, name) in &event.attendees {
        if email.is_empty() {
            continue;
        }
        let mail = OutboundMail {
            to_email: email.clone(),
            to_name: name.clone(),
            subject: event.subject.clone(),
            body: event.description.clone(),
            ics_attachment: Some(invite.clone()),
        };
        notify::send_mail(&settings, &mail).await?;
    }
    Ok(CalendarInfo {
        provider: "ics",
        event_id: None,
        error: None,
    })
}

async fn complete_meeting(
    State(state): State<AppState>,
    _actor: Actor,
    Path(id): Path<Uuid>,
    Json(completion): Json<MeetingCompletion>,
) -> Result<Json<Evaluation>, ApiError> {
    let evaluation = load(&state, id).await?;
    expect_status(&evaluation, &[EvaluationStatus::MeetingScheduled])?;
    let updated = db::evaluations::complete_meeting(
        &state.pool,
        id,
        completion.notes.as_deref(),
        completion.show_notes_to_employee,
    )
    .await?
    .ok_or(ApiError::NotFound("evaluation"))?;
    Ok(Json(updated))
}

async fn finalize(
    State(state): State<AppState>,
    _actor: Actor,
    Path(id): Path<Uuid>,
    Json(request): Json<FinalizeRequest>,
) -> Result<Json<Evaluation>, ApiError> {
    let evaluation = load(&state, id).await?;
    expect_status(&evaluation, &[EvaluationStatus::MeetingCompleted])?;
    let updated = db::evaluations::finalize(&state.pool, id, request.overall_rating)
        .await?
        .ok_or(ApiError::NotFound("evaluation"))?;
    Ok(Json(updated))
}
