use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::models::{
    AppraisalStatus, DetailTiming, InitiatedAppraisal, InitiatedAppraisalPatch, NewDetailTiming,
    NewInitiatedAppraisal, PublishType, ScheduledAppraisalTask, TaskStatus,
};
use crate::schedule::PlannedTask;

use super::parse_text;

fn appraisal_from_row(row: &PgRow) -> Result<InitiatedAppraisal, sqlx::Error> {
    Ok(InitiatedAppraisal {
        id: row.try_get("id")?,
        appraisal_group_id: row.try_get("appraisal_group_id")?,
        appraisal_type: parse_text(row, "appraisal_type")?,
        questionnaire_template_ids: row.try_get("questionnaire_template_ids")?,
        document_url: row.try_get("document_url")?,
        frequency_calendar_id: row.try_get("frequency_calendar_id")?,
        days_to_initiate: row.try_get("days_to_initiate")?,
        days_to_close: row.try_get("days_to_close")?,
        number_of_reminders: row.try_get("number_of_reminders")?,
        exclude_tenure_under_year: row.try_get("exclude_tenure_under_year")?,
        excluded_employee_ids: row.try_get("excluded_employee_ids")?,
        status: parse_text(row, "status")?,
        make_public: row.try_get("make_public")?,
        publish_type: parse_text(row, "publish_type")?,
        created_by: row.try_get("created_by")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn timing_from_row(row: &PgRow) -> Result<DetailTiming, sqlx::Error> {
    Ok(DetailTiming {
        id: row.try_get("id")?,
        initiated_appraisal_id: row.try_get("initiated_appraisal_id")?,
        frequency_calendar_detail_id: row.try_get("frequency_calendar_detail_id")?,
        days_to_initiate: row.try_get("days_to_initiate")?,
        days_to_close: row.try_get("days_to_close")?,
        number_of_reminders: row.try_get("number_of_reminders")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn task_from_row(row: &PgRow) -> Result<ScheduledAppraisalTask, sqlx::Error> {
    Ok(ScheduledAppraisalTask {
        id: row.try_get("id")?,
        initiated_appraisal_id: row.try_get("initiated_appraisal_id")?,
        frequency_calendar_detail_id: row.try_get("frequency_calendar_detail_id")?,
        kind: parse_text(row, "kind")?,
        scheduled_on: row.try_get("scheduled_on")?,
        status: parse_text(row, "status")?,
        executed_at: row.try_get("executed_at")?,
        error: row.try_get("error")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

pub async fn list_appraisals(
    pool: &PgPool,
    owner: Uuid,
    status: Option<AppraisalStatus>,
) -> sqlx::Result<Vec<InitiatedAppraisal>> {
    let mut sql = String::from("SELECT * FROM perfcycle.initiated_appraisals WHERE created_by = $1");
    if status.is_some() {
        sql.push_str(" AND status = $2");
    }
    sql.push_str(" ORDER BY created_at DESC");

    let mut query = sqlx::query(&sql).bind(owner);
    if let Some(status) = status {
        query = query.bind(status.as_str());
    }

    let rows = query.fetch_all(pool).await?;
    rows.iter().map(appraisal_from_row).collect()
}

pub async fn get_appraisal(
    pool: &PgPool,
    owner: Uuid,
    id: Uuid,
) -> sqlx::Result<Option<InitiatedAppraisal>> {
    let row =
        sqlx::query("SELECT * FROM perfcycle.initiated_appraisals WHERE id = $1 AND created_by = $2")
            .bind(id)
            .bind(owner)
            .fetch_optional(pool)
            .await?;
    row.as_ref().map(appraisal_from_row).transpose()
}

pub async fn get_appraisal_unscoped(
    pool: &PgPool,
    id: Uuid,
) -> sqlx::Result<Option<InitiatedAppraisal>> {
    let row = sqlx::query("SELECT * FROM perfcycle.initiated_appraisals WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    row.as_ref().map(appraisal_from_row).transpose()
}

pub async fn create_appraisal(
    pool: &PgPool,
    owner: Uuid,
    new: &NewInitiatedAppraisal,
) -> sqlx::Result<InitiatedAppraisal> {
    let row = sqlx::query(
        r#"
        INSERT INTO perfcycle.initiated_appraisals
        (id, appraisal_group_id, appraisal_type, questionnaire_template_ids, document_url,
         frequency_calendar_id, days_to_initiate, days_to_close, number_of_reminders,
         exclude_tenure_under_year, excluded_employee_ids, status, make_public,
         publish_type, created_by)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(new.appraisal_group_id)
    .bind(new.appraisal_type.as_str())
    .bind(new.questionnaire_template_ids.clone().unwrap_or_default())
    .bind(&new.document_url)
    .bind(new.frequency_calendar_id)
    .bind(new.days_to_initiate.unwrap_or(0))
    .bind(new.days_to_close.unwrap_or(30))
    .bind(new.number_of_reminders.unwrap_or(3))
    .bind(new.exclude_tenure_under_year.unwrap_or(false))
    .bind(new.excluded_employee_ids.clone().unwrap_or_default())
    .bind(AppraisalStatus::Draft.as_str())
    .bind(new.make_public.unwrap_or(false))
    .bind(new.publish_type.unwrap_or(PublishType::Now).as_str())
    .bind(owner)
    .fetch_one(pool)
    .await?;
    appraisal_from_row(&row)
}

pub async fn update_appraisal(
    pool: &PgPool,
    owner: Uuid,
    id: Uuid,
    patch: &InitiatedAppraisalPatch,
) -> sqlx::Result<Option<InitiatedAppraisal>> {
    let row = sqlx::query(
        r#"
        UPDATE perfcycle.initiated_appraisals SET
            appraisal_group_id = COALESCE($3, appraisal_group_id),
            appraisal_type = COALESCE($4, appraisal_type),
            questionnaire_template_ids = COALESCE($5, questionnaire_template_ids),
            document_url = COALESCE($6, document_url),
            frequency_calendar_id = COALESCE($7, frequency_calendar_id),
            days_to_initiate = COALESCE($8, days_to_initiate),
            days_to_close = COALESCE($9, days_to_close),
            number_of_reminders = COALESCE($10, number_of_reminders),
            exclude_tenure_under_year = COALESCE($11, exclude_tenure_under_year),
            excluded_employee_ids = COALESCE($12, excluded_employee_ids),
            make_public = COALESCE($13, make_public),
            publish_type = COALESCE($14, publish_type),
            updated_at = now()
        WHERE id = $1 AND created_by = $2
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(owner)
    .bind(patch.appraisal_group_id)
    .bind(patch.appraisal_type.map(|t| t.as_str()))
    .bind(patch.questionnaire_template_ids.clone())
    .bind(&patch.document_url)
    .bind(patch.frequency_calendar_id)
    .bind(patch.days_to_initiate)
    .bind(patch.days_to_close)
    .bind(patch.number_of_reminders)
    .bind(patch.exclude_tenure_under_year)
    .bind(patch.excluded_employee_ids.clone())
    .bind(patch.make_public)
    .bind(patch.publish_type.map(|p| p.as_str()))
    .fetch_optional(pool)
    .await?;
    row.as_ref().map(appraisal_from_row).transpose()
}

/// Status transition with an explicit gate on the current status; returns
/// `false` when the row was not in `from`.
pub async fn transition_appraisal(
    pool: &PgPool,
    id: Uuid,
    from: &[AppraisalStatus],
    to: AppraisalStatus,
) -> sqlx::Result<bool> {
    let from: Vec<&str> = from.iter().map(|s| s.as_str()).collect();
    let result = sqlx::query(
        "UPDATE perfcycle.initiated_appraisals \
         SET status = $2, updated_at = now() \
         WHERE id = $1 AND status = ANY($3)",
    )
    .bind(id)
    .bind(to.as_str())
    .bind(&from)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn upsert_detail_timing(
    pool: &PgPool,
    appraisal_id: Uuid,
    new: &NewDetailTiming,
) -> sqlx::Result<DetailTiming> {
    let row = sqlx::query(
        r#"
        INSERT INTO perfcycle.initiated_appraisal_detail_timings
        (id, initiated_appraisal_id, frequency_calendar_detail_id,
         days_to_initiate, days_to_close, number_of_reminders)
        VALUES ($1, $2, $3, $4, $5, $6)
        ON CONFLICT (initiated_appraisal_id, frequency_calendar_detail_id) DO UPDATE SET
            days_to_initiate = EXCLUDED.days_to_initiate,
            days_to_close = EXCLUDED.days_to_close,
            number_of_reminders = EXCLUDED.number_of_reminders,
            updated_at = now()
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(appraisal_id)
    .bind(new.frequency_calendar_detail_id)
    .bind(new.days_to_initiate.unwrap_or(0))
    .bind(new.days_to_close.unwrap_or(30))
    .bind(new.number_of_reminders.unwrap_or(3))
    .fetch_one(pool)
    .await?;
    timing_from_row(&row)
}

pub async fn list_detail_timings(pool: &PgPool, appraisal_id: Uuid) -> sqlx::Result<Vec<DetailTiming>> {
    let rows = sqlx::query(
        "SELECT * FROM perfcycle.initiated_appraisal_detail_timings \
         WHERE initiated_appraisal_id = $1",
    )
    .bind(appraisal_id)
    .fetch_all(pool)
    .await?;
    rows.iter().map(timing_from_row).collect()
}

pub async fn insert_tasks(
    pool: &PgPool,
    appraisal_id: Uuid,
    planned: &[PlannedTask],
) -> sqlx::Result<usize> {
    for task in planned {
        sqlx::query(
            r#"
            INSERT INTO perfcycle.scheduled_appraisal_tasks
            (id, initiated_appraisal_id, frequency_calendar_detail_id, kind, scheduled_on, status)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(appraisal_id)
        .bind(task.frequency_calendar_detail_id)
        .bind(task.kind.as_str())
        .bind(task.scheduled_on)
        .bind(TaskStatus::Pending.as_str())
        .execute(pool)
        .await?;
    }
    Ok(planned.len())
}

pub async fn list_tasks(pool: &PgPool, appraisal_id: Uuid) -> sqlx::Result<Vec<ScheduledAppraisalTask>> {
    let rows = sqlx::query(
        "SELECT * FROM perfcycle.scheduled_appraisal_tasks \
         WHERE initiated_appraisal_id = $1 ORDER BY scheduled_on, kind",
    )
    .bind(appraisal_id)
    .fetch_all(pool)
    .await?;
    rows.iter().map(task_from_row).collect()
}

/// Pending tasks due as of a date whose parent appraisal is still active.
pub async fn due_tasks(
    pool: &PgPool,
    as_of: chrono::NaiveDate,
) -> sqlx::Result<Vec<ScheduledAppraisalTask>> {
    // Same-day tasks must run initiate before remind before close.
    let rows = sqlx::query(
        r#"
        SELECT t.* FROM perfcycle.scheduled_appraisal_tasks t
        JOIN perfcycle.initiated_appraisals a ON a.id = t.initiated_appraisal_id
        WHERE t.status = 'pending' AND t.scheduled_on <= $1 AND a.status = 'active'
        ORDER BY t.scheduled_on,
                 CASE t.kind WHEN 'initiate' THEN 0 WHEN 'remind' THEN 1 ELSE 2 END
        "#,
    )
    .bind(as_of)
    .fetch_all(pool)
    .await?;
    rows.iter().map(task_from_row).collect()
}

pub async fn mark_task_completed(pool: &PgPool, task_id: Uuid) -> sqlx::Result<bool> {
    let result = sqlx::query(
        "UPDATE perfcycle.scheduled_appraisal_tasks \
         SET status = 'completed', executed_at = now(), error = NULL, updated_at = now() \
         WHERE id = $1 AND status = 'pending'",
    )
    .bind(task_id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn mark_task_failed(pool: &PgPool, task_id: Uuid, error: &str) -> sqlx::Result<bool> {
    let result = sqlx::query(
        "UPDATE perfcycle.scheduled_appraisal_tasks \
         SET status = 'failed', executed_at = now(), error = $2, updated_at = now() \
         WHERE id = $1 AND status = 'pending'",
    )
    .bind(task_id)
    .bind(error)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Company scope of an appraisal, resolved through its group.
pub async fn company_for_appraisal(pool: &PgPool, appraisal_id: Uuid) -> sqlx::Result<Option<Uuid>> {
    let row = sqlx::query(
        r#"
        SELECT g.company_id FROM perfcycle.appraisal_groups g
        JOIN perfcycle.initiated_appraisals a ON a.appraisal_group_id = g.id
        WHERE a.id = $1
        "#,
    )
    .bind(appraisal_id)
    .fetch_optional(pool)
    .await?;
    match row {
        Some(row) => row.try_get("company_id"),
        None => Ok(None),
    }
}

/// Close tasks still pending for an appraisal; zero means every period has
/// been closed and the appraisal itself can be closed.
pub async fn count_pending_close_tasks(pool: &PgPool, appraisal_id: Uuid) -> sqlx::Result<i64> {
    let row = sqlx::query(
        "SELECT COUNT(*) AS pending FROM perfcycle.scheduled_appraisal_tasks \
         WHERE initiated_appraisal_id = $1 AND kind = 'close' AND status = 'pending'",
    )
    .bind(appraisal_id)
    .fetch_one(pool)
    .await?;
    row.try_get("pending")
}
