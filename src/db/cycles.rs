use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::models::{
    AppraisalCycle, AppraisalCyclePatch, FrequencyCalendar, FrequencyCalendarDetail,
    FrequencyCalendarDetailPatch, FrequencyCalendarPatch, NewAppraisalCycle, NewFrequencyCalendar,
    NewFrequencyCalendarDetail, Status,
};

use super::parse_text;

fn cycle_from_row(row: &PgRow) -> Result<AppraisalCycle, sqlx::Error> {
    Ok(AppraisalCycle {
        id: row.try_get("id")?,
        code: row.try_get("code")?,
        description: row.try_get("description")?,
        from_date: row.try_get("from_date")?,
        to_date: row.try_get("to_date")?,
        status: parse_text(row, "status")?,
        created_by: row.try_get("created_by")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

pub async fn list_cycles(
    pool: &PgPool,
    owner: Uuid,
    status: Option<Status>,
) -> sqlx::Result<Vec<AppraisalCycle>> {
    let mut sql = String::from("SELECT * FROM perfcycle.appraisal_cycles WHERE created_by = $1");
    if status.is_some() {
        sql.push_str(" AND status = $2");
    }
    sql.push_str(" ORDER BY from_date DESC");

    let mut query = sqlx::query(&sql).bind(owner);
    if let Some(status) = status {
        query = query.bind(status.as_str());
    }

    let rows = query.fetch_all(pool).await?;
    rows.iter().map(cycle_from_row).collect()
}

pub async fn get_cycle(pool: &PgPool, owner: Uuid, id: Uuid) -> sqlx::Result<Option<AppraisalCycle>> {
    let row = sqlx::query("SELECT * FROM perfcycle.appraisal_cycles WHERE id = $1 AND created_by = $2")
        .bind(id)
        .bind(owner)
        .fetch_optional(pool)
        .await?;
    row.as_ref().map(cycle_from_row).transpose()
}

pub async fn create_cycle(
    pool: &PgPool,
    owner: Uuid,
    new: &NewAppraisalCycle,
) -> sqlx::Result<AppraisalCycle> {
    let row = sqlx::query(
        r#"
        INSERT INTO perfcycle.appraisal_cycles
        (id, code, description, from_date, to_date, status, created_by)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(&new.code)
    .bind(&new.description)
    .bind(new.from_date)
    .bind(new.to_date)
    .bind(new.status.unwrap_or_default().as_str())
    .bind(owner)
    .fetch_one(pool)
    .await?;
    cycle_from_row(&row)
}

pub async fn update_cycle(
    pool: &PgPool,
    owner: Uuid,
    id: Uuid,
    patch: &AppraisalCyclePatch,
) -> sqlx::Result<Option<AppraisalCycle>> {
    let row = sqlx::query(
        r#"
        UPDATE perfcycle.appraisal_cycles SET
            code = COALESCE($3, code),
            description = COALESCE($4, description),
            from_date = COALESCE($5, from_date),
            to_date = COALESCE($6, to_date),
            status = COALESCE($7, status),
            updated_at = now()
        WHERE id = $1 AND created_by = $2
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(owner)
    .bind(&patch.code)
    .bind(&patch.description)
    .bind(patch.from_date)
    .bind(patch.to_date)
    .bind(patch.status.map(|s| s.as_str()))
    .fetch_optional(pool)
    .await?;
    row.as_ref().map(cycle_from_row).transpose()
}

pub async fn delete_cycle(pool: &PgPool, owner: Uuid, id: Uuid) -> sqlx::Result<bool> {
    let result = sqlx::query("DELETE FROM perfcycle.appraisal_cycles WHERE id = $1 AND created_by = $2")
        .bind(id)
        .bind(owner)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

fn calendar_from_row(row: &PgRow) -> Result<FrequencyCalendar, sqlx::Error> {
    Ok(FrequencyCalendar {
        id: row.try_get("id")?,
        code: row.try_get("code")?,
        description: row.try_get("description")?,
        appraisal_cycle_id: row.try_get("appraisal_cycle_id")?,
        review_frequency_id: row.try_get("review_frequency_id")?,
        status: parse_text(row, "status")?,
        created_by: row.try_get("created_by")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

pub async fn list_calendars(
    pool: &PgPool,
    owner: Uuid,
    status: Option<Status>,
) -> sqlx::Result<Vec<FrequencyCalendar>> {
    let mut sql = String::from("SELECT * FROM perfcycle.frequency_calendars WHERE created_by = $1");
    if status.is_some() {
        sql.push_str(" AND status = $2");
    }
    sql.push_str(" ORDER BY code");

    let mut query = sqlx::query(&sql).bind(owner);
    if let Some(status) = status {
        query = query.bind(status.as_str());
    }

    let rows = query.fetch_all(pool).await?;
    rows.iter().map(calendar_from_row).collect()
}

pub async fn get_calendar(
    pool: &PgPool,
    owner: Uuid,
    id: Uuid,
) -> sqlx::Result<Option<FrequencyCalendar>> {
    let row =
        sqlx::query("SELECT * FROM perfcycle.frequency_calendars WHERE id = $1 AND created_by = $2")
            .bind(id)
            .bind(owner)
            .fetch_optional(pool)
            .await?;
    row.as_ref().map(calendar_from_row).transpose()
}

pub async fn create_calendar(
    pool: &PgPool,
    owner: Uuid,
    new: &NewFrequencyCalendar,
) -> sqlx::Result<FrequencyCalendar> {
    let row = sqlx::query(
        r#"
        INSERT INTO perfcycle.frequency_calendars
        (id, code, description, appraisal_cycle_id, review_frequency_id, status, created_by)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(&new.code)
    .bind(&new.description)
    .bind(new.appraisal_cycle_id)
    .bind(new.review_frequency_id)
    .bind(new.status.unwrap_or_default().as_str())
    .bind(owner)
    .fetch_one(pool)
    .await?;
    calendar_from_row(&row)
}

pub async fn update_calendar(
    pool: &PgPool,
    owner: Uuid,
    id: Uuid,
    patch: &FrequencyCalendarPatch,
) -> sqlx::Result<Option<FrequencyCalendar>> {
    let row = sqlx::query(
        r#"
        UPDATE perfcycle.frequency_calendars SET
            code = COALESCE($3, code),
            description = COALESCE($4, description),
            appraisal_cycle_id = COALESCE($5, appraisal_cycle_id),
            review_frequency_id = COALESCE($6, review_frequency_id),
            status = COALESCE($7, status),
            updated_at = now()
        WHERE id = $1 AND created_by = $2
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(owner)
    .bind(&patch.code)
    .bind(&patch.description)
    .bind(patch.appraisal_cycle_id)
    .bind(patch.review_frequency_id)
    .bind(patch.status.map(|s| s.as_str()))
    .fetch_optional(pool)
    .await?;
    row.as_ref().map(calendar_from_row).transpose()
}

pub async fn delete_calendar(pool: &PgPool, owner: Uuid, id: Uuid) -> sqlx::Result<bool> {
    let result =
        sqlx::query("DELETE FROM perfcycle.frequency_calendars WHERE id = $1 AND created_by = $2")
            .bind(id)
            .bind(owner)
            .execute(pool)
            .await?;
    Ok(result.rows_affected() > 0)
}

fn detail_from_row(row: &PgRow) -> Result<FrequencyCalendarDetail, sqlx::Error> {
    Ok(FrequencyCalendarDetail {
        id: row.try_get("id")?,
        frequency_calendar_id: row.try_get("frequency_calendar_id")?,
        display_name: row.try_get("display_name")?,
        start_date: row.try_get("start_date")?,
        end_date: row.try_get("end_date")?,
        status: parse_text(row, "status")?,
        created_by: row.try_get("created_by")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

pub async fn list_details(
    pool: &PgPool,
    owner: Uuid,
    calendar_id: Option<Uuid>,
) -> sqlx::Result<Vec<FrequencyCalendarDetail>> {
    let mut sql =
        String::from("SELECT * FROM perfcycle.frequency_calendar_details WHERE created_by = $1");
    if calendar_id.is_some() {
        sql.push_str(" AND frequency_calendar_id = $2");
    }
    sql.push_str(" ORDER BY start_date");

    let mut query = sqlx::query(&sql).bind(owner);
    if let Some(calendar_id) = calendar_id {
        query = query.bind(calendar_id);
    }

    let rows = query.fetch_all(pool).await?;
    rows.iter().map(detail_from_row).collect()
}

/// Active period windows of one calendar, ordered by start date. Used by
/// appraisal activation, which must see every window regardless of owner.
pub async fn active_details_for_calendar(
    pool: &PgPool,
    calendar_id: Uuid,
) -> sqlx::Result<Vec<FrequencyCalendarDetail>> {
    let rows = sqlx::query(
        "SELECT * FROM perfcycle.frequency_calendar_details \
         WHERE frequency_calendar_id = $1 AND status = 'active' ORDER BY start_date",
    )
    .bind(calendar_id)
    .fetch_all(pool)
    .await?;
    rows.iter().map(detail_from_row).collect()
}

pub async fn get_detail(
    pool: &PgPool,
    owner: Uuid,
    id: Uuid,
) -> sqlx::Result<Option<FrequencyCalendarDetail>> {
    let row = sqlx::query(
        "SELECT * FROM perfcycle.frequency_calendar_details WHERE id = $1 AND created_by = $2",
    )
    .bind(id)
    .bind(owner)
    .fetch_optional(pool)
    .await?;
    row.as_ref().map(detail_from_row).transpose()
}

pub async fn create_detail(
    pool: &PgPool,
    owner: Uuid,
    new: &NewFrequencyCalendarDetail,
) -> sqlx::Result<FrequencyCalendarDetail> {
    let row = sqlx::query(
        r#"
        INSERT INTO perfcycle.frequency_calendar_details
        (id, frequency_calendar_id, display_name, start_date, end_date, status, created_by)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(new.frequency_calendar_id)
    .bind(&new.display_name)
    .bind(new.start_date)
    .bind(new.end_date)
    .bind(new.status.unwrap_or_default().as_str())
    .bind(owner)
    .fetch_one(pool)
    .await?;
    detail_from_row(&row)
}

pub async fn update_detail(
    pool: &PgPool,
    owner: Uuid,
    id: Uuid,
    patch: &FrequencyCalendarDetailPatch,
) -> sqlx::Result<Option<FrequencyCalendarDetail>> {
    let row = sqlx::query(
        r#"
        UPDATE perfcycle.frequency_calendar_details SET
            display_name = COALESCE($3, display_name),
            start_date = COALESCE($4, start_date),
            end_date = COALESCE($5, end_date),
            status = COALESCE($6, status),
            updated_at = now()
        WHERE id = $1 AND created_by = $2
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(owner)
    .bind(&patch.display_name)
    .bind(patch.start_date)
    .bind(patch.end_date)
    .bind(patch.status.map(|s| s.as_str()))
    .fetch_optional(pool)
    .await?;
    row.as_ref().map(detail_from_row).transpose()
}

pub async fn delete_detail(pool: &PgPool, owner: Uuid, id: Uuid) -> sqlx::Result<bool> {
    let result = sqlx::query(
        "DELETE FROM perfcycle.frequency_calendar_details WHERE id = $1 AND created_by = $2",
    )
    .bind(id)
    .bind(owner)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}
