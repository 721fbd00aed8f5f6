use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::models::{
    CodeEntry, CodeEntryPatch, CodeKind, Company, CompanyPatch, Location, LocationPatch,
    NewCodeEntry, NewCompany, NewLocation, Status,
};

use super::parse_text;

fn company_from_row(row: &PgRow) -> Result<Company, sqlx::Error> {
    Ok(Company {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        address: row.try_get("address")?,
        client_contact: row.try_get("client_contact")?,
        email: row.try_get("email")?,
        contact_number: row.try_get("contact_number")?,
        gst_number: row.try_get("gst_number")?,
        logo_url: row.try_get("logo_url")?,
        url: row.try_get("url")?,
        company_url: row.try_get("company_url")?,
        status: parse_text(row, "status")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

pub async fn list_companies(pool: &PgPool, status: Option<Status>) -> sqlx::Result<Vec<Company>> {
    let mut sql = String::from("SELECT * FROM perfcycle.companies");
    if status.is_some() {
        sql.push_str(" WHERE status = $1");
    }
    sql.push_str(" ORDER BY name");

    let mut query = sqlx::query(&sql);
    if let Some(status) = status {
        query = query.bind(status.as_str());
    }

    let rows = query.fetch_all(pool).await?;
    rows.iter().map(company_from_row).collect()
}

pub async fn get_company(pool: &PgPool, id: Uuid) -> sqlx::Result<Option<Company>> {
    let row = sqlx::query("SELECT * FROM perfcycle.companies WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    row.as_ref().map(company_from_row).transpose()
}

pub async fn get_company_by_url(pool: &PgPool, company_url: &str) -> sqlx::Result<Option<Company>> {
    let row = sqlx::query("SELECT * FROM perfcycle.companies WHERE company_url = $1")
        .bind(company_url)
        .fetch_optional(pool)
        .await?;
    row.as_ref().map(company_from_row).transpose()
}

pub async fn create_company(pool: &PgPool, new: &NewCompany) -> sqlx::Result<Company> {
    let row = sqlx::query(
        r#"
        INSERT INTO perfcycle.companies
        (id, name, address, client_contact, email, contact_number, gst_number,
         logo_url, url, company_url, status)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(&new.name)
    .bind(&new.address)
    .bind(&new.client_contact)
    .bind(&new.email)
    .bind(&new.contact_number)
    .bind(&new.gst_number)
    .bind(&new.logo_url)
    .bind(&new.url)
    .bind(&new.company_url)
    .bind(new.status.unwrap_or_default().as_str())
    .fetch_one(pool)
    .await?;
    company_from_row(&row)
}

pub async fn update_company(
    pool: &PgPool,
    id: Uuid,
    patch: &CompanyPatch,
) -> sqlx::Result<Option<Company>> {
    let row = sqlx::query(
        r#"
        UPDATE perfcycle.companies SET
            name = COALESCE($2, name),
            address = COALESCE($3, address),
            client_contact = COALESCE($4, client_contact),
            email = COALESCE($5, email),
            contact_number = COALESCE($6, contact_number),
            gst_number = COALESCE($7, gst_number),
            logo_url = COALESCE($8, logo_url),
            url = COALESCE($9, url),
            company_url = COALESCE($10, company_url),
            status = COALESCE($11, status),
            updated_at = now()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(&patch.name)
    .bind(&patch.address)
    .bind(&patch.client_contact)
    .bind(&patch.email)
    .bind(&patch.contact_number)
    .bind(&patch.gst_number)
    .bind(&patch.logo_url)
    .bind(&patch.url)
    .bind(&patch.company_url)
    .bind(patch.status.map(|s| s.as_str()))
    .fetch_optional(pool)
    .await?;
    row.as_ref().map(company_from_row).transpose()
}

pub async fn delete_company(pool: &PgPool, id: Uuid) -> sqlx::Result<bool> {
    let result = sqlx::query("DELETE FROM perfcycle.companies WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

fn location_from_row(row: &PgRow) -> Result<Location, sqlx::Error> {
    Ok(Location {
        id: row.try_get("id")?,
        code: row.try_get("code")?,
        name: row.try_get("name")?,
        state: row.try_get("state")?,
        country: row.try_get("country")?,
        status: parse_text(row, "status")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

pub async fn list_locations(pool: &PgPool, status: Option<Status>) -> sqlx::Result<Vec<Location>> {
    let mut sql = String::from("SELECT * FROM perfcycle.locations");
    if status.is_some() {
        sql.push_str(" WHERE status = $1");
    }
    sql.push_str(" ORDER BY code");

    let mut query = sqlx::query(&sql);
    if let Some(status) = status {
        query = query.bind(status.as_str());
    }

    let rows = query.fetch_all(pool).await?;
    rows.iter().map(location_from_row).collect()
}

pub async fn get_location(pool: &PgPool, id: Uuid) -> sqlx::Result<Option<Location>> {
    let row = sqlx::query("SELECT * FROM perfcycle.locations WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    row.as_ref().map(location_from_row).transpose()
}

pub async fn create_location(pool: &PgPool, new: &NewLocation) -> sqlx::Result<Location> {
    let row = sqlx::query(
        r#"
        INSERT INTO perfcycle.locations (id, code, name, state, country, status)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(&new.code)
    .bind(&new.name)
    .bind(&new.state)
    .bind(&new.country)
    .bind(new.status.unwrap_or_default().as_str())
    .fetch_one(pool)
    .await?;
    location_from_row(&row)
}

pub async fn update_location(
    pool: &PgPool,
    id: Uuid,
    patch: &LocationPatch,
) -> sqlx::Result<Option<Location>> {
    let row = sqlx::query(
        r#"
        UPDATE perfcycle.locations SET
            code = COALESCE($2, code),
            name = COALESCE($3, name),
            state = COALESCE($4, state),
            country = COALESCE($5, country),
            status = COALESCE($6, status),
            updated_at = now()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(&patch.code)
    .bind(&patch.name)
    .bind(&patch.state)
    .bind(&patch.country)
    .bind(patch.status.map(|s| s.as_str()))
    .fetch_optional(pool)
    .await?;
    row.as_ref().map(location_from_row).transpose()
}

pub async fn delete_location(pool: &PgPool, id: Uuid) -> sqlx::Result<bool> {
    let result = sqlx::query("DELETE FROM perfcycle.locations WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

fn code_entry_from_row(row: &PgRow) -> Result<CodeEntry, sqlx::Error> {
    Ok(CodeEntry {
        id: row.try_get("id")?,
        code: row.try_get("code")?,
        description: row.try_get("description")?,
        status: parse_text(row, "status")?,
        created_by: row.try_get("created_by")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

pub async fn list_code_entries(
    pool: &PgPool,
    kind: CodeKind,
    owner: Uuid,
    status: Option<Status>,
) -> sqlx::Result<Vec<CodeEntry>> {
    let mut sql = format!("SELECT * FROM {} WHERE created_by = $1", kind.table());
    if status.is_some() {
        sql.push_str(" AND status = $2");
    }
    sql.push_str(" ORDER BY code");

    let mut query = sqlx::query(&sql).bind(owner);
    if let Some(status) = status {
        query = query.bind(status.as_str());
    }

    let rows = query.fetch_all(pool).await?;
    rows.iter().map(code_entry_from_row).collect()
}

pub async fn get_code_entry(
    pool: &PgPool,
    kind: CodeKind,
    owner: Uuid,
    id: Uuid,
) -> sqlx::Result<Option<CodeEntry>> {
    let sql = format!(
        "SELECT * FROM {} WHERE id = $1 AND created_by = $2",
        kind.table()
    );
    let row = sqlx::query(&sql)
        .bind(id)
        .bind(owner)
        .fetch_optional(pool)
        .await?;
    row.as_ref().map(code_entry_from_row).transpose()
}

pub async fn create_code_entry(
    pool: &PgPool,
    kind: CodeKind,
    owner: Uuid,
    new: &NewCodeEntry,
) -> sqlx::Result<CodeEntry> {
    let sql = format!(
        "INSERT INTO {} (id, code, description, status, created_by) \
         VALUES ($1, $2, $3, $4, $5) RETURNING *",
        kind.table()
    );
    let row = sqlx::query(&sql)
        .bind(Uuid::new_v4())
        .bind(&new.code)
        .bind(&new.description)
        .bind(new.status.unwrap_or_default().as_str())
        .bind(owner)
        .fetch_one(pool)
        .await?;
    code_entry_from_row(&row)
}

pub async fn update_code_entry(
    pool: &PgPool,
    kind: CodeKind,
    owner: Uuid,
    id: Uuid,
    patch: &CodeEntryPatch,
) -> sqlx::Result<Option<CodeEntry>> {
    let sql = format!(
        "UPDATE {} SET \
            code = COALESCE($3, code), \
            description = COALESCE($4, description), \
            status = COALESCE($5, status), \
            updated_at = now() \
         WHERE id = $1 AND created_by = $2 RETURNING *",
        kind.table()
    );
    let row = sqlx::query(&sql)
        .bind(id)
        .bind(owner)
        .bind(&patch.code)
        .bind(&patch.description)
        .bind(patch.status.map(|s| s.as_str()))
        .fetch_optional(pool)
        .await?;
    row.as_ref().map(code_entry_from_row).transpose()
}

pub async fn delete_code_entry(
    pool: &PgPool,
    kind: CodeKind,
    owner: Uuid,
    id: Uuid,
) -> sqlx::Result<bool> {
    let sql = format!(
        "DELETE FROM {} WHERE id = $1 AND created_by = $2",
        kind.table()
    );
    let result = sqlx::query(&sql).bind(id).bind(owner).execute(pool).await?;
    Ok(result.rows_affected() > 0)
}
