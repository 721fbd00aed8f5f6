use std::path::Path;

use chrono::NaiveDate;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, QueryBuilder, Row};
use uuid::Uuid;

use crate::models::{NewUser, Status, User, UserFilter, UserPatch, UserRole};

use super::parse_text;

pub(crate) fn user_from_row(row: &PgRow) -> Result<User, sqlx::Error> {
    Ok(User {
        id: row.try_get("id")?,
        email: row.try_get("email")?,
        first_name: row.try_get("first_name")?,
        last_name: row.try_get("last_name")?,
        code: row.try_get("code")?,
        designation: row.try_get("designation")?,
        department: row.try_get("department")?,
        date_of_joining: row.try_get("date_of_joining")?,
        mobile_number: row.try_get("mobile_number")?,
        reporting_manager_id: row.try_get("reporting_manager_id")?,
        location_id: row.try_get("location_id")?,
        company_id: row.try_get("company_id")?,
        level_id: row.try_get("level_id")?,
        grade_id: row.try_get("grade_id")?,
        role: parse_text(row, "role")?,
        status: parse_text(row, "status")?,
        created_by: row.try_get("created_by")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

pub async fn get_user(pool: &PgPool, id: Uuid) -> sqlx::Result<Option<User>> {
    let row = sqlx::query("SELECT * FROM perfcycle.users WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    row.as_ref().map(user_from_row).transpose()
}

pub async fn get_user_by_email(pool: &PgPool, email: &str) -> sqlx::Result<Option<User>> {
    let row = sqlx::query("SELECT * FROM perfcycle.users WHERE email = $1")
        .bind(email)
        .fetch_optional(pool)
        .await?;
    row.as_ref().map(user_from_row).transpose()
}

pub async fn list_users(pool: &PgPool, filter: &UserFilter) -> sqlx::Result<Vec<User>> {
    let mut builder = QueryBuilder::<sqlx::Postgres>::new("SELECT * FROM perfcycle.users WHERE 1 = 1");
    if let Some(role) = filter.role {
        builder.push(" AND role = ").push_bind(role.as_str());
    }
    if let Some(department) = &filter.department {
        builder.push(" AND department = ").push_bind(department.clone());
    }
    if let Some(status) = filter.status {
        builder.push(" AND status = ").push_bind(status.as_str());
    }
    if let Some(company_id) = filter.company_id {
        builder.push(" AND company_id = ").push_bind(company_id);
    }
    builder.push(" ORDER BY first_name, last_name");

    let rows = builder.build().fetch_all(pool).await?;
    rows.iter().map(user_from_row).collect()
}

pub async fn list_users_by_manager(pool: &PgPool, manager_id: Uuid) -> sqlx::Result<Vec<User>> {
    let rows = sqlx::query(
        "SELECT * FROM perfcycle.users WHERE reporting_manager_id = $1 ORDER BY first_name",
    )
    .bind(manager_id)
    .fetch_all(pool)
    .await?;
    rows.iter().map(user_from_row).collect()
}

pub async fn create_user(pool: &PgPool, new: &NewUser, created_by: Uuid) -> sqlx::Result<User> {
    let row = sqlx::query(
        r#"
        INSERT INTO perfcycle.users
        (id, email, first_name, last_name, code, designation, department,
         date_of_joining, mobile_number, reporting_manager_id, location_id,
         company_id, level_id, grade_id, role, status, created_by)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(&new.email)
    .bind(&new.first_name)
    .bind(&new.last_name)
    .bind(&new.code)
    .bind(&new.designation)
    .bind(&new.department)
    .bind(new.date_of_joining)
    .bind(&new.mobile_number)
    .bind(new.reporting_manager_id)
    .bind(new.location_id)
    .bind(new.company_id)
    .bind(new.level_id)
    .bind(new.grade_id)
    .bind(new.role.unwrap_or(UserRole::Employee).as_str())
    .bind(new.status.unwrap_or_default().as_str())
    .bind(created_by)
    .fetch_one(pool)
    .await?;
    user_from_row(&row)
}

pub async fn update_user(pool: &PgPool, id: Uuid, patch: &UserPatch) -> sqlx::Result<Option<User>> {
    let row = sqlx::query(
        r#"
        UPDATE perfcycle.users SET
            email = COALESCE($2, email),
            first_name = COALESCE($3, first_name),
            last_name = COALESCE($4, last_name),
            code = COALESCE($5, code),
            designation = COALESCE($6, designation),
            department = COALESCE($7, department),
            date_of_joining = COALESCE($8, date_of_joining),
            mobile_number = COALESCE($9, mobile_number),
            reporting_manager_id = COALESCE($10, reporting_manager_id),
            location_id = COALESCE($11, location_id),
            company_id = COALESCE($12, company_id),
            level_id = COALESCE($13, level_id),
            grade_id = COALESCE($14, grade_id),
            role = COALESCE($15, role),
            status = COALESCE($16, status),
            updated_at = now()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(&patch.email)
    .bind(&patch.first_name)
    .bind(&patch.last_name)
    .bind(&patch.code)
    .bind(&patch.designation)
    .bind(&patch.department)
    .bind(patch.date_of_joining)
    .bind(&patch.mobile_number)
    .bind(patch.reporting_manager_id)
    .bind(patch.location_id)
    .bind(patch.company_id)
    .bind(patch.level_id)
    .bind(patch.grade_id)
    .bind(patch.role.map(|r| r.as_str()))
    .bind(patch.status.map(|s| s.as_str()))
    .fetch_optional(pool)
    .await?;
    row.as_ref().map(user_from_row).transpose()
}

pub async fn delete_user(pool: &PgPool, id: Uuid) -> sqlx::Result<bool> {
    let result = sqlx::query("DELETE FROM perfcycle.users WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

#[derive(Debug, serde::Deserialize)]
struct CsvEmployee {
    email: String,
    first_name: String,
    last_name: Option<String>,
    code: Option<String>,
    designation: Option<String>,
    department: Option<String>,
    date_of_joining: Option<NaiveDate>,
    mobile_number: Option<String>,
    manager_email: Option<String>,
}

/// Bulk employee import, idempotent on e-mail. Managers are wired in a
/// second pass so row order in the file does not matter.
pub async fn import_employees_csv(
    pool: &PgPool,
    csv_path: &Path,
    company_id: Option<Uuid>,
    created_by: Uuid,
) -> anyhow::Result<usize> {
    let mut reader = csv::Reader::from_path(csv_path)?;
    let mut imported = 0usize;
    let mut manager_links: Vec<(String, String)> = Vec::new();

    for result in reader.deserialize::<CsvEmployee>() {
        let row = result?;
        sqlx::query(
            r#"
            INSERT INTO perfcycle.users
            (id, email, first_name, last_name, code, designation, department,
             date_of_joining, mobile_number, company_id, role, status, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            ON CONFLICT (email) DO UPDATE SET
                first_name = EXCLUDED.first_name,
                last_name = EXCLUDED.last_name,
                code = EXCLUDED.code,
                designation = EXCLUDED.designation,
                department = EXCLUDED.department,
                date_of_joining = EXCLUDED.date_of_joining,
                mobile_number = EXCLUDED.mobile_number,
                updated_at = now()
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&row.email)
        .bind(&row.first_name)
        .bind(&row.last_name)
        .bind(&row.code)
        .bind(&row.designation)
        .bind(&row.department)
        .bind(row.date_of_joining)
        .bind(&row.mobile_number)
        .bind(company_id)
        .bind(UserRole::Employee.as_str())
        .bind(Status::Active.as_str())
        .bind(created_by)
        .execute(pool)
        .await?;
        imported += 1;

        if let Some(manager_email) = row.manager_email.filter(|m| !m.is_empty()) {
            manager_links.push((row.email, manager_email));
        }
    }

    for (email, manager_email) in manager_links {
        sqlx::query(
            r#"
            UPDATE perfcycle.users
            SET reporting_manager_id = m.id, updated_at = now()
            FROM perfcycle.users m
            WHERE perfcycle.users.email = $1 AND m.email = $2
            "#,
        )
        .bind(&email)
        .bind(&manager_email)
        .execute(pool)
        .await?;
    }

    Ok(imported)
}
