use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::models::{
    CalendarCredential, CalendarCredentialPatch, CalendarProviderKind, EmailConfig,
    EmailConfigPatch, EmailTemplate, EmailTemplatePatch, NewCalendarCredential, NewEmailConfig,
    NewEmailTemplate,
};

use super::parse_text;

fn email_config_from_row(row: &PgRow) -> Result<EmailConfig, sqlx::Error> {
    Ok(EmailConfig {
        id: row.try_get("id")?,
        company_id: row.try_get("company_id")?,
        smtp_host: row.try_get("smtp_host")?,
        smtp_port: row.try_get("smtp_port")?,
        smtp_username: row.try_get("smtp_username")?,
        smtp_password: row.try_get("smtp_password")?,
        from_email: row.try_get("from_email")?,
        from_name: row.try_get("from_name")?,
        is_active: row.try_get("is_active")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

pub async fn list_email_configs(pool: &PgPool) -> sqlx::Result<Vec<EmailConfig>> {
    let rows = sqlx::query("SELECT * FROM perfcycle.email_configs ORDER BY created_at")
        .fetch_all(pool)
        .await?;
    rows.iter().map(email_config_from_row).collect()
}

pub async fn get_email_config(pool: &PgPool, id: Uuid) -> sqlx::Result<Option<EmailConfig>> {
    let row = sqlx::query("SELECT * FROM perfcycle.email_configs WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    row.as_ref().map(email_config_from_row).transpose()
}

/// The active SMTP config for a company, falling back to a company-less
/// (global) row when the tenant has none of its own.
pub async fn active_email_config(
    pool: &PgPool,
    company_id: Option<Uuid>,
) -> sqlx::Result<Option<EmailConfig>> {
    let row = sqlx::query(
        r#"
        SELECT * FROM perfcycle.email_configs
        WHERE is_active AND (company_id = $1 OR company_id IS NULL)
        ORDER BY company_id NULLS LAST, created_at DESC
        LIMIT 1
        "#,
    )
    .bind(company_id)
    .fetch_optional(pool)
    .await?;
    row.as_ref().map(email_config_from_row).transpose()
}

pub async fn create_email_config(pool: &PgPool, new: &NewEmailConfig) -> sqlx::Result<EmailConfig> {
    let row = sqlx::query(
        r#"
        INSERT INTO perfcycle.email_configs
        (id, company_id, smtp_host, smtp_port, smtp_username, smtp_password,
         from_email, from_name, is_active)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(new.company_id)
    .bind(&new.smtp_host)
    .bind(new.smtp_port)
    .bind(&new.smtp_username)
    .bind(&new.smtp_password)
    .bind(&new.from_email)
    .bind(&new.from_name)
    .bind(new.is_active.unwrap_or(true))
    .fetch_one(pool)
    .await?;
    email_config_from_row(&row)
}

pub async fn update_email_config(
    pool: &PgPool,
    id: Uuid,
    patch: &EmailConfigPatch,
) -> sqlx::Result<Option<EmailConfig>> {
    let row = sqlx::query(
        r#"
        UPDATE perfcycle.email_configs SET
            smtp_host = COALESCE($2, smtp_host),
            smtp_port = COALESCE($3, smtp_port),
            smtp_username = COALESCE($4, smtp_username),
            smtp_password = COALESCE($5, smtp_password),
            from_email = COALESCE($6, from_email),
            from_name = COALESCE($7, from_name),
            is_active = COALESCE($8, is_active),
            updated_at = now()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(&patch.smtp_host)
    .bind(patch.smtp_port)
    .bind(&patch.smtp_username)
    .bind(&patch.smtp_password)
    .bind(&patch.from_email)
    .bind(&patch.from_name)
    .bind(patch.is_active)
    .fetch_optional(pool)
    .await?;
    row.as_ref().map(email_config_from_row).transpose()
}

pub async fn delete_email_config(pool: &PgPool, id: Uuid) -> sqlx::Result<bool> {
    let result = sqlx::query("DELETE FROM perfcycle.email_configs WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

fn email_template_from_row(row: &PgRow) -> Result<EmailTemplate, sqlx::Error> {
    Ok(EmailTemplate {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        subject: row.try_get("subject")?,
        body: row.try_get("body")?,
        template_type: row.try_get("template_type")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

pub async fn list_email_templates(pool: &PgPool) -> sqlx::Result<Vec<EmailTemplate>> {
    let rows = sqlx::query("SELECT * FROM perfcycle.email_templates ORDER BY name")
        .fetch_all(pool)
        .await?;
    rows.iter().map(email_template_from_row).collect()
}

pub async fn get_email_template(pool: &PgPool, id: Uuid) -> sqlx::Result<Option<EmailTemplate>> {
    let row = sqlx::query("SELECT * FROM perfcycle.email_templates WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    row.as_ref().map(email_template_from_row).transpose()
}

pub async fn email_template_by_type(
    pool: &PgPool,
    template_type: &str,
) -> sqlx::Result<Option<EmailTemplate>> {
    let row = sqlx::query(
        "SELECT * FROM perfcycle.email_templates WHERE template_type = $1 \
         ORDER BY updated_at DESC LIMIT 1",
    )
    .bind(template_type)
    .fetch_optional(pool)
    .await?;
    row.as_ref().map(email_template_from_row).transpose()
}

pub async fn create_email_template(
    pool: &PgPool,
    new: &NewEmailTemplate,
) -> sqlx::Result<EmailTemplate> {
    let row = sqlx::query(
        r#"
        INSERT INTO perfcycle.email_templates (id, name, subject, body, template_type)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(&new.name)
    .bind(&new.subject)
    .bind(&new.body)
    .bind(&new.template_type)
    .fetch_one(pool)
    .await?;
    email_template_from_row(&row)
}

pub async fn update_email_template(
    pool: &PgPool,
    id: Uuid,
    patch: &EmailTemplatePatch,
) -> sqlx::Result<Option<EmailTemplate>> {
    let row = sqlx::query(
        r#"
        UPDATE perfcycle.email_templates SET
            name = COALESCE($2, name),
            subject = COALESCE($3, subject),
            body = COALESCE($4, body),
            template_type = COALESCE($5, template_type),
            updated_at = now()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(&patch.name)
    .bind(&patch.subject)
    .bind(&patch.body)
    .bind(&patch.template_type)
    .fetch_optional(pool)
    .await?;
    row.as_ref().map(email_template_from_row).transpose()
}

pub async fn delete_email_template(pool: &PgPool, id: Uuid) -> sqlx::Result<bool> {
    let result = sqlx::query("DELETE FROM perfcycle.email_templates WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

fn credential_from_row(row: &PgRow) -> Result<CalendarCredential, sqlx::Error> {
    Ok(CalendarCredential {
        id: row.try_get("id")?,
        company_id: row.try_get("company_id")?,
        provider: parse_text(row, "provider")?,
        client_id: row.try_get("client_id")?,
        client_secret: row.try_get("client_secret")?,
        access_token: row.try_get("access_token")?,
        refresh_token: row.try_get("refresh_token")?,
        expires_at: row.try_get("expires_at")?,
        scope: row.try_get("scope")?,
        is_active: row.try_get("is_active")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

pub async fn list_credentials(pool: &PgPool, company_id: Uuid) -> sqlx::Result<Vec<CalendarCredential>> {
    let rows = sqlx::query(
        "SELECT * FROM perfcycle.calendar_credentials WHERE company_id = $1 ORDER BY provider",
    )
    .bind(company_id)
    .fetch_all(pool)
    .await?;
    rows.iter().map(credential_from_row).collect()
}

pub async fn get_credential(
    pool: &PgPool,
    company_id: Uuid,
    provider: CalendarProviderKind,
) -> sqlx::Result<Option<CalendarCredential>> {
    let row = sqlx::query(
        "SELECT * FROM perfcycle.calendar_credentials \
         WHERE company_id = $1 AND provider = $2 AND is_active",
    )
    .bind(company_id)
    .bind(provider.as_str())
    .fetch_optional(pool)
    .await?;
    row.as_ref().map(credential_from_row).transpose()
}

pub async fn upsert_credential(
    pool: &PgPool,
    new: &NewCalendarCredential,
) -> sqlx::Result<CalendarCredential> {
    let row = sqlx::query(
        r#"
        INSERT INTO perfcycle.calendar_credentials
        (id, company_id, provider, client_id, client_secret, access_token,
         refresh_token, expires_at, scope, is_active)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        ON CONFLICT (company_id, provider) DO UPDATE SET
            client_id = EXCLUDED.client_id,
            client_secret = EXCLUDED.client_secret,
            access_token = EXCLUDED.access_token,
            refresh_token = EXCLUDED.refresh_token,
            expires_at = EXCLUDED.expires_at,
            scope = EXCLUDED.scope,
            is_active = EXCLUDED.is_active,
            updated_at = now()
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(new.company_id)
    .bind(new.provider.as_str())
    .bind(&new.client_id)
    .bind(&new.client_secret)
    .bind(&new.access_token)
    .bind(&new.refresh_token)
    .bind(new.expires_at)
    .bind(&new.scope)
    .bind(new.is_active.unwrap_or(true))
    .fetch_one(pool)
    .await?;
    credential_from_row(&row)
}

pub async fn update_credential(
    pool: &PgPool,
    id: Uuid,
    patch: &CalendarCredentialPatch,
) -> sqlx::Result<Option<CalendarCredential>> {
    let row = sqlx::query(
        r#"
        UPDATE perfcycle.calendar_credentials SET
            client_id = COALESCE($2, client_id),
            client_secret = COALESCE($3, client_secret),
            access_token = COALESCE($4, access_token),
            refresh_token = COALESCE($5, refresh_token),
            expires_at = COALESCE($6, expires_at),
            scope = COALESCE($7, scope),
            is_active = COALESCE($8, is_active),
            updated_at = now()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(&patch.client_id)
    .bind(&patch.client_secret)
    .bind(&patch.access_token)
    .bind(&patch.refresh_token)
    .bind(patch.expires_at)
    .bind(&patch.scope)
    .bind(patch.is_active)
    .fetch_optional(pool)
    .await?;
    row.as_ref().map(credential_from_row).transpose()
}

pub async fn delete_credential(pool: &PgPool, id: Uuid) -> sqlx::Result<bool> {
    let result = sqlx::query("DELETE FROM perfcycle.calendar_credentials WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Persist refreshed provider tokens. Outlook rotates the refresh token on
/// every refresh; Google does not, so `refresh_token` stays untouched when
/// `None`.
pub async fn update_credential_tokens(
    pool: &PgPool,
    company_id: Uuid,
    provider: CalendarProviderKind,
    access_token: &str,
    refresh_token: Option<&str>,
    expires_at: Option<DateTime<Utc>>,
) -> sqlx::Result<bool> {
    let result = sqlx::query(
        r#"
        UPDATE perfcycle.calendar_credentials SET
            access_token = $3,
            refresh_token = COALESCE($4, refresh_token),
            expires_at = $5,
            updated_at = now()
        WHERE company_id = $1 AND provider = $2
        "#,
    )
    .bind(company_id)
    .bind(provider.as_str())
    .bind(access_token)
    .bind(refresh_token)
    .bind(expires_at)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}
