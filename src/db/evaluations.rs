use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, QueryBuilder, Row};
use uuid::Uuid;

use crate::models::{Evaluation, EvaluationFilter, EvaluationStatus, User};

use super::parse_text;
use super::people::user_from_row;

fn evaluation_from_row(row: &PgRow) -> Result<Evaluation, sqlx::Error> {
    Ok(Evaluation {
        id: row.try_get("id")?,
        employee_id: row.try_get("employee_id")?,
        manager_id: row.try_get("manager_id")?,
        initiated_appraisal_id: row.try_get("initiated_appraisal_id")?,
        frequency_calendar_detail_id: row.try_get("frequency_calendar_detail_id")?,
        self_evaluation: row.try_get("self_evaluation")?,
        self_submitted_at: row.try_get("self_submitted_at")?,
        manager_evaluation: row.try_get("manager_evaluation")?,
        manager_submitted_at: row.try_get("manager_submitted_at")?,
        overall_rating: row.try_get("overall_rating")?,
        status: parse_text(row, "status")?,
        meeting_scheduled_at: row.try_get("meeting_scheduled_at")?,
        meeting_notes: row.try_get("meeting_notes")?,
        show_notes_to_employee: row.try_get("show_notes_to_employee")?,
        meeting_completed_at: row.try_get("meeting_completed_at")?,
        finalized_at: row.try_get("finalized_at")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

pub async fn list_evaluations(
    pool: &PgPool,
    filter: &EvaluationFilter,
) -> sqlx::Result<Vec<Evaluation>> {
    let mut builder =
        QueryBuilder::<sqlx::Postgres>::new("SELECT * FROM perfcycle.evaluations WHERE 1 = 1");
    if let Some(appraisal_id) = filter.initiated_appraisal_id {
        builder
            .push(" AND initiated_appraisal_id = ")
            .push_bind(appraisal_id);
    }
    if let Some(employee_id) = filter.employee_id {
        builder.push(" AND employee_id = ").push_bind(employee_id);
    }
    if let Some(manager_id) = filter.manager_id {
        builder.push(" AND manager_id = ").push_bind(manager_id);
    }
    if let Some(status) = filter.status {
        builder.push(" AND status = ").push_bind(status.as_str());
    }
    builder.push(" ORDER BY created_at DESC");

    let rows = builder.build().fetch_all(pool).await?;
    rows.iter().map(evaluation_from_row).collect()
}

pub async fn get_evaluation(pool: &PgPool, id: Uuid) -> sqlx::Result<Option<Evaluation>> {
    let row = sqlx::query("SELECT * FROM perfcycle.evaluations WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    row.as_ref().map(evaluation_from_row).transpose()
}

/// Idempotent creation keyed on (appraisal, employee, period). Returns the
/// new row, or `None` when one already existed.
pub async fn create_evaluation_if_absent(
    pool: &PgPool,
    employee_id: Uuid,
    manager_id: Option<Uuid>,
    appraisal_id: Uuid,
    detail_id: Option<Uuid>,
) -> sqlx::Result<Option<Evaluation>> {
    let row = sqlx::query(
        r#"
        INSERT INTO perfcycle.evaluations
        (id, employee_id, manager_id, initiated_appraisal_id, frequency_calendar_detail_id, status)
        VALUES ($1, $2, $3, $4, $5, $6)
        ON CONFLICT DO NOTHING
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(employee_id)
    .bind(manager_id)
    .bind(appraisal_id)
    .bind(detail_id)
    .bind(EvaluationStatus::Pending.as_str())
    .fetch_optional(pool)
    .await?;
    row.as_ref().map(evaluation_from_row).transpose()
}

pub async fn submit_self(
    pool: &PgPool,
    id: Uuid,
    answers: &Value,
) -> sqlx::Result<Option<Evaluation>> {
    let row = sqlx::query(
        r#"
        UPDATE perfcycle.evaluations SET
            self_evaluation = $2,
            self_submitted_at = now(),
            status = $3,
            updated_at = now()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(answers)
    .bind(EvaluationStatus::SelfSubmitted.as_str())
    .fetch_optional(pool)
    .await?;
    row.as_ref().map(evaluation_from_row).transpose()
}

pub async fn submit_manager(
    pool: &PgPool,
    id: Uuid,
    answers: &Value,
    overall_rating: Option<f64>,
) -> sqlx::Result<Option<Evaluation>> {
    let row = sqlx::query(
        r#"
        UPDATE perfcycle.evaluations SET
            manager_evaluation = $2,
            manager_submitted_at = now(),
            overall_rating = COALESCE($3, overall_rating),
            status = $4,
            updated_at = now()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(answers)
    .bind(overall_rating)
    .bind(EvaluationStatus::ManagerSubmitted.as_str())
    .fetch_optional(pool)
    .await?;
    row.as_ref().map(evaluation_from_row).transpose()
}

pub async fn schedule_meeting(
    pool: &PgPool,
    id: Uuid,
    scheduled_at: DateTime<Utc>,
    notes: Option<&str>,
) -> sqlx::Result<Option<Evaluation>> {
    let row = sqlx::query(
        r#"
        UPDATE perfcycle.evaluations SET
            meeting_scheduled_at = $2,
            meeting_notes = COALESCE($3, meeting_notes),
            status = $4,
            updated_at = now()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(scheduled_at)
    .bind(notes)
    .bind(EvaluationStatus::MeetingScheduled.as_str())
    .fetch_optional(pool)
    .await?;
    row.as_ref().map(evaluation_from_row).transpose()
}

pub async fn complete_meeting(
    pool: &PgPool,
    id: Uuid,
    notes: Option<&str>,
    show_notes_to_employee: Option<bool>,
) -> sqlx::Result<Option<Evaluation>> {
    let row = sqlx::query(
        r#"
        UPDATE perfcycle.evaluations SET
            meeting_completed_at = now(),
            meeting_notes = COALESCE($2, meeting_notes),
            show_notes_to_employee = COALESCE($3, show_notes_to_employee),
            status = $4,
            updated_at = now()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(notes)
    .bind(show_notes_to_employee)
    .bind(EvaluationStatus::MeetingCompleted.as_str())
    .fetch_optional(pool)
    .await?;
    row.as_ref().map(evaluation_from_row).transpose()
}

pub async fn finalize(
    pool: &PgPool,
    id: Uuid,
    overall_rating: Option<f64>,
) -> sqlx::Result<Option<Evaluation>> {
    let row = sqlx::query(
        r#"
        UPDATE perfcycle.evaluations SET
            overall_rating = COALESCE($2, overall_rating),
            finalized_at = now(),
            status = $3,
            updated_at = now()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(overall_rating)
    .bind(EvaluationStatus::Finalized.as_str())
    .fetch_optional(pool)
    .await?;
    row.as_ref().map(evaluation_from_row).transpose()
}

/// Employees of one appraisal period who have not yet submitted a self
/// evaluation. Drives reminder mail.
pub async fn unsubmitted_employees(
    pool: &PgPool,
    appraisal_id: Uuid,
    detail_id: Option<Uuid>,
) -> sqlx::Result<Vec<User>> {
    let mut builder = QueryBuilder::<sqlx::Postgres>::new(
        "SELECT u.* FROM perfcycle.users u \
         JOIN perfcycle.evaluations e ON e.employee_id = u.id \
         WHERE e.initiated_appraisal_id = ",
    );
    builder.push_bind(appraisal_id);
    builder.push(" AND e.status = 'pending'");
    match detail_id {
        Some(detail_id) => {
            builder
                .push(" AND e.frequency_calendar_detail_id = ")
                .push_bind(detail_id);
        }
        None => {
            builder.push(" AND e.frequency_calendar_detail_id IS NULL");
        }
    }

    let rows = builder.build().fetch_all(pool).await?;
    rows.iter().map(user_from_row).collect()
}

/// Everyone with an untouched evaluation anywhere in the appraisal, for the
/// completion report.
pub async fn pending_employees(pool: &PgPool, appraisal_id: Uuid) -> sqlx::Result<Vec<User>> {
    let rows = sqlx::query(
        r#"
        SELECT DISTINCT ON (u.id) u.* FROM perfcycle.users u
        JOIN perfcycle.evaluations e ON e.employee_id = u.id
        WHERE e.initiated_appraisal_id = $1 AND e.status = 'pending'
        ORDER BY u.id
        "#,
    )
    .bind(appraisal_id)
    .fetch_all(pool)
    .await?;
    rows.iter().map(user_from_row).collect()
}

/// Expire everything not yet finalized across all periods of an appraisal,
/// for a manual close.
pub async fn expire_all_unfinished(pool: &PgPool, appraisal_id: Uuid) -> sqlx::Result<u64> {
    let result = sqlx::query(
        "UPDATE perfcycle.evaluations SET status = 'expired', updated_at = now() \
         WHERE initiated_appraisal_id = $1 AND status NOT IN ('finalized', 'expired')",
    )
    .bind(appraisal_id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}

/// Expire everything not yet finalized for one appraisal period. Returns the
/// number of evaluations affected.
pub async fn expire_unfinished(
    pool: &PgPool,
    appraisal_id: Uuid,
    detail_id: Option<Uuid>,
) -> sqlx::Result<u64> {
    let mut builder = QueryBuilder::<sqlx::Postgres>::new(
        "UPDATE perfcycle.evaluations SET status = 'expired', updated_at = now() \
         WHERE initiated_appraisal_id = ",
    );
    builder.push_bind(appraisal_id);
    builder.push(" AND status NOT IN ('finalized', 'expired')");
    match detail_id {
        Some(detail_id) => {
            builder
                .push(" AND frequency_calendar_detail_id = ")
                .push_bind(detail_id);
        }
        None => {
            builder.push(" AND frequency_calendar_detail_id IS NULL");
        }
    }

    let result = builder.build().execute(pool).await?;
    Ok(result.rows_affected())
}
