use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::models::{
    NewPublishQuestionnaire, NewQuestionnaireTemplate, PublishQuestionnaire,
    PublishQuestionnairePatch, PublishType, QuestionnaireTemplate, QuestionnaireTemplatePatch,
    Status,
};

use super::{parse_text, parse_text_opt};

fn template_from_row(row: &PgRow) -> Result<QuestionnaireTemplate, sqlx::Error> {
    Ok(QuestionnaireTemplate {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        target_role: parse_text(row, "target_role")?,
        applicable_category: parse_text_opt(row, "applicable_category")?,
        applicable_level_id: row.try_get("applicable_level_id")?,
        applicable_grade_id: row.try_get("applicable_grade_id")?,
        applicable_location_id: row.try_get("applicable_location_id")?,
        send_on_mail: row.try_get("send_on_mail")?,
        questions: row.try_get("questions")?,
        year: row.try_get("year")?,
        status: parse_text(row, "status")?,
        created_by: row.try_get("created_by")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

pub async fn list_templates(
    pool: &PgPool,
    owner: Uuid,
    status: Option<Status>,
) -> sqlx::Result<Vec<QuestionnaireTemplate>> {
    let mut sql =
        String::from("SELECT * FROM perfcycle.questionnaire_templates WHERE created_by = $1");
    if status.is_some() {
        sql.push_str(" AND status = $2");
    }
    sql.push_str(" ORDER BY name");

    let mut query = sqlx::query(&sql).bind(owner);
    if let Some(status) = status {
        query = query.bind(status.as_str());
    }

    let rows = query.fetch_all(pool).await?;
    rows.iter().map(template_from_row).collect()
}

pub async fn get_template(
    pool: &PgPool,
    owner: Uuid,
    id: Uuid,
) -> sqlx::Result<Option<QuestionnaireTemplate>> {
    let row = sqlx::query(
        "SELECT * FROM perfcycle.questionnaire_templates WHERE id = $1 AND created_by = $2",
    )
    .bind(id)
    .bind(owner)
    .fetch_optional(pool)
    .await?;
    row.as_ref().map(template_from_row).transpose()
}

pub async fn create_template(
    pool: &PgPool,
    owner: Uuid,
    new: &NewQuestionnaireTemplate,
) -> sqlx::Result<QuestionnaireTemplate> {
    let questions = new.questions.clone().unwrap_or_else(|| serde_json::json!([]));
    let row = sqlx::query(
        r#"
        INSERT INTO perfcycle.questionnaire_templates
        (id, name, description, target_role, applicable_category, applicable_level_id,
         applicable_grade_id, applicable_location_id, send_on_mail, questions, year,
         status, created_by)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(&new.name)
    .bind(&new.description)
    .bind(new.target_role.as_str())
    .bind(new.applicable_category.map(|c| c.as_str()))
    .bind(new.applicable_level_id)
    .bind(new.applicable_grade_id)
    .bind(new.applicable_location_id)
    .bind(new.send_on_mail.unwrap_or(false))
    .bind(questions)
    .bind(new.year)
    .bind(new.status.unwrap_or_default().as_str())
    .bind(owner)
    .fetch_one(pool)
    .await?;
    template_from_row(&row)
}

pub async fn update_template(
    pool: &PgPool,
    owner: Uuid,
    id: Uuid,
    patch: &QuestionnaireTemplatePatch,
) -> sqlx::Result<Option<QuestionnaireTemplate>> {
    let row = sqlx::query(
        r#"
        UPDATE perfcycle.questionnaire_templates SET
            name = COALESCE($3, name),
            description = COALESCE($4, description),
            target_role = COALESCE($5, target_role),
            applicable_category = COALESCE($6, applicable_category),
            applicable_level_id = COALESCE($7, applicable_level_id),
            applicable_grade_id = COALESCE($8, applicable_grade_id),
            applicable_location_id = COALESCE($9, applicable_location_id),
            send_on_mail = COALESCE($10, send_on_mail),
            questions = COALESCE($11, questions),
            year = COALESCE($12, year),
            status = COALESCE($13, status),
            updated_at = now()
        WHERE id = $1 AND created_by = $2
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(owner)
    .bind(&patch.name)
    .bind(&patch.description)
    .bind(patch.target_role.map(|r| r.as_str()))
    .bind(patch.applicable_category.map(|c| c.as_str()))
    .bind(patch.applicable_level_id)
    .bind(patch.applicable_grade_id)
    .bind(patch.applicable_location_id)
    .bind(patch.send_on_mail)
    .bind(&patch.questions)
    .bind(patch.year)
    .bind(patch.status.map(|s| s.as_str()))
    .fetch_optional(pool)
    .await?;
    row.as_ref().map(template_from_row).transpose()
}

pub async fn delete_template(pool: &PgPool, owner: Uuid, id: Uuid) -> sqlx::Result<bool> {
    let result = sqlx::query(
        "DELETE FROM perfcycle.questionnaire_templates WHERE id = $1 AND created_by = $2",
    )
    .bind(id)
    .bind(owner)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

fn publish_from_row(row: &PgRow) -> Result<PublishQuestionnaire, sqlx::Error> {
    Ok(PublishQuestionnaire {
        id: row.try_get("id")?,
        code: row.try_get("code")?,
        display_name: row.try_get("display_name")?,
        template_id: row.try_get("template_id")?,
        frequency_calendar_id: row.try_get("frequency_calendar_id")?,
        status: parse_text(row, "status")?,
        publish_type: parse_text(row, "publish_type")?,
        created_by: row.try_get("created_by")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

pub async fn list_publishes(
    pool: &PgPool,
    owner: Uuid,
    status: Option<Status>,
) -> sqlx::Result<Vec<PublishQuestionnaire>> {
    let mut sql =
        String::from("SELECT * FROM perfcycle.publish_questionnaires WHERE created_by = $1");
    if status.is_some() {
        sql.push_str(" AND status = $2");
    }
    sql.push_str(" ORDER BY code");

    let mut query = sqlx::query(&sql).bind(owner);
    if let Some(status) = status {
        query = query.bind(status.as_str());
    }

    let rows = query.fetch_all(pool).await?;
    rows.iter().map(publish_from_row).collect()
}

pub async fn get_publish(
    pool: &PgPool,
    owner: Uuid,
    id: Uuid,
) -> sqlx::Result<Option<PublishQuestionnaire>> {
    let row = sqlx::query(
        "SELECT * FROM perfcycle.publish_questionnaires WHERE id = $1 AND created_by = $2",
    )
    .bind(id)
    .bind(owner)
    .fetch_optional(pool)
    .await?;
    row.as_ref().map(publish_from_row).transpose()
}

pub async fn create_publish(
    pool: &PgPool,
    owner: Uuid,
    new: &NewPublishQuestionnaire,
) -> sqlx::Result<PublishQuestionnaire> {
    let row = sqlx::query(
        r#"
        INSERT INTO perfcycle.publish_questionnaires
        (id, code, display_name, template_id, frequency_calendar_id, status, publish_type, created_by)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(&new.code)
    .bind(&new.display_name)
    .bind(new.template_id)
    .bind(new.frequency_calendar_id)
    .bind(new.status.unwrap_or_default().as_str())
    .bind(new.publish_type.unwrap_or(PublishType::Now).as_str())
    .bind(owner)
    .fetch_one(pool)
    .await?;
    publish_from_row(&row)
}

pub async fn update_publish(
    pool: &PgPool,
    owner: Uuid,
    id: Uuid,
    patch: &PublishQuestionnairePatch,
) -> sqlx::Result<Option<PublishQuestionnaire>> {
    let row = sqlx::query(
        r#"
        UPDATE perfcycle.publish_questionnaires SET
            code = COALESCE($3, code),
            display_name = COALESCE($4, display_name),
            template_id = COALESCE($5, template_id),
            frequency_calendar_id = COALESCE($6, frequency_calendar_id),
            status = COALESCE($7, status),
            publish_type = COALESCE($8, publish_type),
            updated_at = now()
        WHERE id = $1 AND created_by = $2
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(owner)
    .bind(&patch.code)
    .bind(&patch.display_name)
    .bind(patch.template_id)
    .bind(patch.frequency_calendar_id)
    .bind(patch.status.map(|s| s.as_str()))
    .bind(patch.publish_type.map(|p| p.as_str()))
    .fetch_optional(pool)
    .await?;
    row.as_ref().map(publish_from_row).transpose()
}

pub async fn delete_publish(pool: &PgPool, owner: Uuid, id: Uuid) -> sqlx::Result<bool> {
    let result =
        sqlx::query("DELETE FROM perfcycle.publish_questionnaires WHERE id = $1 AND created_by = $2")
            .bind(id)
            .bind(owner)
            .execute(pool)
            .await?;
    Ok(result.rows_affected() > 0)
}
