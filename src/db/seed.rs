use anyhow::Context;
use chrono::NaiveDate;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{CodeKind, Status, UserRole};

/// Insert a realistic demo tenant: one company, an HR manager with two
/// reports, reference data, a quarterly calendar for FY2026, a questionnaire
/// template, an appraisal group, and a default invitation template. Safe to
/// run repeatedly.
pub async fn seed(pool: &PgPool) -> anyhow::Result<()> {
    let company_id = Uuid::parse_str("5f1c5d80-64a1-4b02-9faf-5a52a44b3a10")?;
    let hr_id = Uuid::parse_str("6e8a4b1c-9d2f-4e37-a5c8-1f0b3d7e9a21")?;
    let avery_id = Uuid::parse_str("2b9d6f3a-5c81-4e07-9a4d-8e2c1f6b0d35")?;
    let kiara_id = Uuid::parse_str("8c1e5a7b-3f92-4d68-b0a7-4d9e2c8f1b46")?;

    sqlx::query(
        r#"
        INSERT INTO perfcycle.companies (id, name, email, company_url, status)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (company_url) DO UPDATE
        SET name = EXCLUDED.name, email = EXCLUDED.email
        "#,
    )
    .bind(company_id)
    .bind("Acme Industrial")
    .bind("hello@acme.example")
    .bind("acme")
    .bind(Status::Active.as_str())
    .execute(pool)
    .await?;

    let people = [
        (hr_id, "jordan.kim@acme.example", "Jordan", "Kim", UserRole::HrManager, None, "2020-02-03"),
        (avery_id, "avery.lee@acme.example", "Avery", "Lee", UserRole::Employee, Some(hr_id), "2023-06-12"),
        (kiara_id, "kiara.patel@acme.example", "Kiara", "Patel", UserRole::Employee, Some(hr_id), "2025-11-24"),
    ];
    for (id, email, first, last, role, manager, joined) in people {
        let joined: NaiveDate = joined.parse().context("invalid seed joining date")?;
        sqlx::query(
            r#"
            INSERT INTO perfcycle.users
            (id, email, first_name, last_name, date_of_joining, reporting_manager_id,
             company_id, role, status, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ON CONFLICT (email) DO UPDATE SET
                first_name = EXCLUDED.first_name,
                last_name = EXCLUDED.last_name,
                reporting_manager_id = EXCLUDED.reporting_manager_id,
                role = EXCLUDED.role
            "#,
        )
        .bind(id)
        .bind(email)
        .bind(first)
        .bind(last)
        .bind(joined)
        .bind(manager)
        .bind(company_id)
        .bind(role.as_str())
        .bind(Status::Active.as_str())
        .bind(hr_id)
        .execute(pool)
        .await?;
    }

    let code_entries = [
        (CodeKind::Level, "L1", "Individual contributor"),
        (CodeKind::Level, "L2", "Senior individual contributor"),
        (CodeKind::Grade, "G1", "Standard grade"),
        (CodeKind::Department, "ENG", "Engineering"),
        (CodeKind::ReviewFrequency, "QTR", "Quarterly reviews"),
    ];
    for (kind, code, description) in code_entries {
        let sql = format!(
            "INSERT INTO {} (id, code, description, status, created_by) \
             VALUES ($1, $2, $3, $4, $5) \
             ON CONFLICT (created_by, code) DO UPDATE SET description = EXCLUDED.description",
            kind.table()
        );
        sqlx::query(&sql)
            .bind(Uuid::new_v4())
            .bind(code)
            .bind(description)
            .bind(Status::Active.as_str())
            .bind(hr_id)
            .execute(pool)
            .await?;
    }

    let cycle_id = Uuid::parse_str("9b1a2c3d-4e5f-4a6b-8c7d-0e1f2a3b4c5d")?;
    sqlx::query(
        r#"
        INSERT INTO perfcycle.appraisal_cycles
        (id, code, description, from_date, to_date, status, created_by)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        ON CONFLICT (created_by, code) DO UPDATE SET description = EXCLUDED.description
        "#,
    )
    .bind(cycle_id)
    .bind("FY2026")
    .bind("Financial year 2026 appraisals")
    .bind(NaiveDate::from_ymd_opt(2026, 4, 1).context("invalid date")?)
    .bind(NaiveDate::from_ymd_opt(2027, 3, 31).context("invalid date")?)
    .bind(Status::Active.as_str())
    .bind(hr_id)
    .execute(pool)
    .await?;

    let frequency_id: Uuid = sqlx::query_scalar(
        "SELECT id FROM perfcycle.review_frequencies WHERE created_by = $1 AND code = 'QTR'",
    )
    .bind(hr_id)
    .fetch_one(pool)
    .await?;

    let calendar_id = Uuid::parse_str("7c8d9e0f-1a2b-4c3d-9e5f-6a7b8c9d0e1f")?;
    sqlx::query(
        r#"
        INSERT INTO perfcycle.frequency_calendars
        (id, code, description, appraisal_cycle_id, review_frequency_id, status, created_by)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        ON CONFLICT (created_by, code) DO UPDATE SET description = EXCLUDED.description
        "#,
    )
    .bind(calendar_id)
    .bind("FY2026-QTR")
    .bind("Quarterly windows for FY2026")
    .bind(cycle_id)
    .bind(frequency_id)
    .bind(Status::Active.as_str())
    .bind(hr_id)
    .execute(pool)
    .await?;

    let calendar_row_id: Uuid = sqlx::query_scalar(
        "SELECT id FROM perfcycle.frequency_calendars WHERE created_by = $1 AND code = 'FY2026-QTR'",
    )
    .bind(hr_id)
    .fetch_one(pool)
    .await?;

    let quarters = [
        ("a1b2c3d4-0001-4000-8000-000000000001", "Q1 2026", (2026, 4, 1), (2026, 6, 30)),
        ("a1b2c3d4-0002-4000-8000-000000000002", "Q2 2026", (2026, 7, 1), (2026, 9, 30)),
        ("a1b2c3d4-0003-4000-8000-000000000003", "Q3 2026", (2026, 10, 1), (2026, 12, 31)),
        ("a1b2c3d4-0004-4000-8000-000000000004", "Q4 2026", (2027, 1, 1), (2027, 3, 31)),
    ];
    for (id, name, (sy, sm, sd), (ey, em, ed)) in quarters {
        sqlx::query(
            r#"
            INSERT INTO perfcycle.frequency_calendar_details
            (id, frequency_calendar_id, display_name, start_date, end_date, status, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (id) DO UPDATE SET display_name = EXCLUDED.display_name
            "#,
        )
        .bind(Uuid::parse_str(id)?)
        .bind(calendar_row_id)
        .bind(name)
        .bind(NaiveDate::from_ymd_opt(sy, sm, sd).context("invalid date")?)
        .bind(NaiveDate::from_ymd_opt(ey, em, ed).context("invalid date")?)
        .bind(Status::Active.as_str())
        .bind(hr_id)
        .execute(pool)
        .await?;
    }

    let template_id = Uuid::parse_str("b2c3d4e5-6f70-4a81-9b92-a3b4c5d6e7f8")?;
    let questions = serde_json::json!([
        { "id": 1, "text": "What were your main accomplishments this quarter?", "kind": "text" },
        { "id": 2, "text": "Rate your overall delivery", "kind": "rating", "scale": 5 },
        { "id": 3, "text": "Where do you want to grow next?", "kind": "text" }
    ]);
    sqlx::query(
        r#"
        INSERT INTO perfcycle.questionnaire_templates
        (id, name, target_role, questions, year, status, created_by)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        ON CONFLICT (id) DO UPDATE SET questions = EXCLUDED.questions
        "#,
    )
    .bind(template_id)
    .bind("Quarterly self review")
    .bind(UserRole::Employee.as_str())
    .bind(questions)
    .bind(2026)
    .bind(Status::Active.as_str())
    .bind(hr_id)
    .execute(pool)
    .await?;

    let group_id = Uuid::parse_str("c3d4e5f6-7a80-4b91-8ca2-b3c4d5e6f708")?;
    sqlx::query(
        r#"
        INSERT INTO perfcycle.appraisal_groups (id, name, description, company_id, status, created_by)
        VALUES ($1, $2, $3, $4, $5, $6)
        ON CONFLICT (id) DO UPDATE SET name = EXCLUDED.name
        "#,
    )
    .bind(group_id)
    .bind("Engineering")
    .bind("Everyone reporting into engineering")
    .bind(company_id)
    .bind(Status::Active.as_str())
    .bind(hr_id)
    .execute(pool)
    .await?;

    for user_id in [avery_id, kiara_id] {
        sqlx::query(
            r#"
            INSERT INTO perfcycle.appraisal_group_members (id, appraisal_group_id, user_id, added_by)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (appraisal_group_id, user_id) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(group_id)
        .bind(user_id)
        .bind(hr_id)
        .execute(pool)
        .await?;
    }

    sqlx::query(
        r#"
        INSERT INTO perfcycle.email_templates (id, name, subject, body, template_type)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (id) DO UPDATE SET subject = EXCLUDED.subject, body = EXCLUDED.body
        "#,
    )
    .bind(Uuid::parse_str("d4e5f6a7-8b90-4ca1-9db2-c3d4e5f6a708")?)
    .bind("Appraisal invitation")
    .bind("Your {{appraisal_type}} review has started")
    .bind("Hello {{employee_name}},\n\nYour review is ready. Please sign in and complete your self evaluation.\n")
    .bind("appraisal_invitation")
    .execute(pool)
    .await?;

    Ok(())
}
