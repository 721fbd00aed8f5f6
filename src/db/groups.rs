use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::models::{
    AppraisalGroup, AppraisalGroupMember, GroupPatch, GroupWithMembers, NewGroup, Status, User,
};

use super::parse_text;
use super::people::user_from_row;

fn group_from_row(row: &PgRow) -> Result<AppraisalGroup, sqlx::Error> {
    Ok(AppraisalGroup {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        company_id: row.try_get("company_id")?,
        status: parse_text(row, "status")?,
        created_by: row.try_get("created_by")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn member_from_row(row: &PgRow) -> Result<AppraisalGroupMember, sqlx::Error> {
    Ok(AppraisalGroupMember {
        id: row.try_get("id")?,
        appraisal_group_id: row.try_get("appraisal_group_id")?,
        user_id: row.try_get("user_id")?,
        added_by: row.try_get("added_by")?,
        added_at: row.try_get("added_at")?,
    })
}

pub async fn list_groups(
    pool: &PgPool,
    owner: Uuid,
    status: Option<Status>,
) -> sqlx::Result<Vec<AppraisalGroup>> {
    let mut sql = String::from("SELECT * FROM perfcycle.appraisal_groups WHERE created_by = $1");
    if status.is_some() {
        sql.push_str(" AND status = $2");
    }
    sql.push_str(" ORDER BY name");

    let mut query = sqlx::query(&sql).bind(owner);
    if let Some(status) = status {
        query = query.bind(status.as_str());
    }

    let rows = query.fetch_all(pool).await?;
    rows.iter().map(group_from_row).collect()
}

pub async fn get_group(pool: &PgPool, owner: Uuid, id: Uuid) -> sqlx::Result<Option<AppraisalGroup>> {
    let row = sqlx::query("SELECT * FROM perfcycle.appraisal_groups WHERE id = $1 AND created_by = $2")
        .bind(id)
        .bind(owner)
        .fetch_optional(pool)
        .await?;
    row.as_ref().map(group_from_row).transpose()
}

pub async fn create_group(pool: &PgPool, owner: Uuid, new: &NewGroup) -> sqlx::Result<AppraisalGroup> {
    let row = sqlx::query(
        r#"
        INSERT INTO perfcycle.appraisal_groups (id, name, description, company_id, status, created_by)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(&new.name)
    .bind(&new.description)
    .bind(new.company_id)
    .bind(new.status.unwrap_or_default().as_str())
    .bind(owner)
    .fetch_one(pool)
    .await?;
    group_from_row(&row)
}

pub async fn update_group(
    pool: &PgPool,
    owner: Uuid,
    id: Uuid,
    patch: &GroupPatch,
) -> sqlx::Result<Option<AppraisalGroup>> {
    let row = sqlx::query(
        r#"
        UPDATE perfcycle.appraisal_groups SET
            name = COALESCE($3, name),
            description = COALESCE($4, description),
            company_id = COALESCE($5, company_id),
            status = COALESCE($6, status),
            updated_at = now()
        WHERE id = $1 AND created_by = $2
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(owner)
    .bind(&patch.name)
    .bind(&patch.description)
    .bind(patch.company_id)
    .bind(patch.status.map(|s| s.as_str()))
    .fetch_optional(pool)
    .await?;
    row.as_ref().map(group_from_row).transpose()
}

pub async fn delete_group(pool: &PgPool, owner: Uuid, id: Uuid) -> sqlx::Result<bool> {
    let result = sqlx::query("DELETE FROM perfcycle.appraisal_groups WHERE id = $1 AND created_by = $2")
        .bind(id)
        .bind(owner)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Returns `None` when the pair was already present.
pub async fn add_member(
    pool: &PgPool,
    group_id: Uuid,
    user_id: Uuid,
    added_by: Uuid,
) -> sqlx::Result<Option<AppraisalGroupMember>> {
    let row = sqlx::query(
        r#"
        INSERT INTO perfcycle.appraisal_group_members (id, appraisal_group_id, user_id, added_by)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (appraisal_group_id, user_id) DO NOTHING
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(group_id)
    .bind(user_id)
    .bind(added_by)
    .fetch_optional(pool)
    .await?;
    row.as_ref().map(member_from_row).transpose()
}

pub async fn remove_member(pool: &PgPool, group_id: Uuid, user_id: Uuid) -> sqlx::Result<bool> {
    let result = sqlx::query(
        "DELETE FROM perfcycle.appraisal_group_members \
         WHERE appraisal_group_id = $1 AND user_id = $2",
    )
    .bind(group_id)
    .bind(user_id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn list_member_users(pool: &PgPool, group_id: Uuid) -> sqlx::Result<Vec<User>> {
    let rows = sqlx::query(
        r#"
        SELECT u.* FROM perfcycle.users u
        JOIN perfcycle.appraisal_group_members m ON m.user_id = u.id
        WHERE m.appraisal_group_id = $1
        ORDER BY u.first_name, u.last_name
        "#,
    )
    .bind(group_id)
    .fetch_all(pool)
    .await?;
    rows.iter().map(user_from_row).collect()
}

pub async fn groups_with_members(pool: &PgPool, owner: Uuid) -> sqlx::Result<Vec<GroupWithMembers>> {
    let groups = list_groups(pool, owner, None).await?;
    let mut out = Vec::with_capacity(groups.len());
    for group in groups {
        let members = list_member_users(pool, group.id).await?;
        out.push(GroupWithMembers { group, members });
    }
    Ok(out)
}
